//! svcatlas - per-stage service registry aggregation
//!
//! This library reads Eureka-style service registries, one per deployment
//! stage, and normalizes their content into stable per-application records
//! suitable for display or querying.
//!
//! # Core Concepts
//!
//! - **Stage**: a named deployment environment ("dev", "prod") with its own
//!   registry endpoint
//! - **Normalized Application**: hosts with enabled ports, declared consumers
//!   and whitelisted metadata of one application in one stage
//! - **Stage Cache**: memoized result per stage, computed at most once even
//!   under concurrent requests
//!
//! # Example Usage
//!
//! ```no_run
//! use svcatlas::{RegistryService, SvcatlasConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SvcatlasConfig::from_env()?;
//! let service = RegistryService::new(&config)?;
//!
//! let apps = service.get_all_microservices("prod").await?;
//! for (name, app) in apps.iter() {
//!     println!("{}: {} hosts, consumes {:?}", name, app.hosts.len(), app.consumes);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`registry`]: stage resolution, fetching, normalization, caching
//! - [`config`]: environment and file configuration
//! - [`cli`]: command-line interface
//! - [`util`]: logging setup

pub mod cli;
pub mod config;
pub mod registry;
pub mod util;

pub use config::{ConfigError, SvcatlasConfig};
pub use registry::{
    normalize, ConsumerDescriptor, HostDescriptor, NormalizedApplication, RawRegistryDocument,
    RegistryError, RegistryFetcher, RegistryService, StageRegistry, StageResultSet,
};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
