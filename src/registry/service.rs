//! Aggregation service orchestration
//!
//! [`RegistryService`] is the entry point for callers. It resolves a stage to
//! its registry URL, fetches and normalizes the registry document, and keeps
//! the normalized result in a per-stage cache.
//!
//! # Failure policy
//!
//! - Offline mode: every stage, known or not, yields an empty result without
//!   touching the network or the cache.
//! - [`RegistryError::UnknownStage`] and [`RegistryError::MalformedDocument`]
//!   propagate to the caller.
//! - [`RegistryError::Transport`] is logged and degrades to an empty result.
//!   Nothing is cached, so the next call retries the registry. Callers that
//!   were waiting on the failed fetch share its outcome instead of each
//!   retrying in turn.
//!
//! # Example
//!
//! ```no_run
//! use svcatlas::registry::RegistryService;
//! use svcatlas::SvcatlasConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SvcatlasConfig::default();
//! let service = RegistryService::new(&config)?;
//!
//! for stage in service.get_all_stage_names() {
//!     let apps = service.get_all_microservices(&stage).await?;
//!     println!("{}: {} applications", stage, apps.len());
//! }
//! # Ok(())
//! # }
//! ```

use super::cache::StageCache;
use super::error::RegistryError;
use super::fetcher::{HttpRegistryFetcher, RegistryFetcher};
use super::model::StageResultSet;
use super::normalizer::normalize;
use super::stages::StageRegistry;
use crate::config::SvcatlasConfig;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Per-stage registry aggregation with caching and offline short-circuit
///
/// # Thread Safety
///
/// This service is thread-safe and can be shared across tasks using `Arc`.
pub struct RegistryService {
    stages: StageRegistry,
    fetcher: Arc<dyn RegistryFetcher>,
    cache: StageCache<RegistryError>,
    offline_mode: bool,
}

impl std::fmt::Debug for RegistryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryService")
            .field("stages", &self.stages.list_stages())
            .field("fetcher", &self.fetcher.name())
            .field("offline_mode", &self.offline_mode)
            .finish()
    }
}

impl RegistryService {
    /// Creates a service from configuration using the HTTP fetcher
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &SvcatlasConfig) -> Result<Self, RegistryError> {
        let fetcher =
            HttpRegistryFetcher::with_timeout(Duration::from_secs(config.request_timeout_secs))?;

        Ok(Self::with_fetcher(
            StageRegistry::new(config.stages.clone()),
            Arc::new(fetcher),
            config.offline_mode,
        ))
    }

    /// Creates a service with a pre-configured fetcher
    ///
    /// Useful for tests and for callers that bring their own transport.
    pub fn with_fetcher(
        stages: StageRegistry,
        fetcher: Arc<dyn RegistryFetcher>,
        offline_mode: bool,
    ) -> Self {
        info!(
            stages = stages.len(),
            fetcher = fetcher.name(),
            offline_mode,
            "Registry service initialized"
        );

        Self {
            stages,
            fetcher,
            cache: StageCache::new(),
            offline_mode,
        }
    }

    /// Returns the normalized applications registered for `stage`
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownStage`] if the stage is not configured
    /// and [`RegistryError::MalformedDocument`] if the registry payload is
    /// structurally broken. Transport failures never surface here.
    pub async fn get_all_microservices(
        &self,
        stage: &str,
    ) -> Result<Arc<StageResultSet>, RegistryError> {
        if self.offline_mode {
            info!(
                stage,
                "Offline mode: not fetching microservices from registry, returning empty map"
            );
            return Ok(Arc::default());
        }

        let url = self.stages.resolve_url(stage)?;

        let result = self
            .cache
            .get_or_try_compute(stage, || async {
                info!(stage, "Loading services from registry");
                let document = self.fetcher.fetch(url).await?;
                normalize(&document)
            })
            .await;

        match result {
            Ok(applications) => Ok(applications),
            Err(RegistryError::Transport { url, message }) => {
                warn!(
                    stage,
                    url = %url,
                    error = %message,
                    "Error fetching microservices from registry, returning empty map"
                );
                Ok(Arc::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Returns every configured stage name; never touches the network
    pub fn get_all_stage_names(&self) -> BTreeSet<String> {
        self.stages.list_stages()
    }

    /// Drops the cached result for `stage` so the next call refetches
    pub fn invalidate(&self, stage: &str) -> bool {
        self.cache.invalidate(stage)
    }

    /// Drops all cached results
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Stages with a cached result
    pub fn cached_stages(&self) -> Vec<String> {
        self.cache.cached_stages()
    }

    pub fn is_offline(&self) -> bool {
        self.offline_mode
    }
}
