//! Command handlers; each returns the process exit code

use super::commands::{CliArgs, ConfigArgs, ServicesArgs, StagesArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::{ConfigError, SvcatlasConfig};
use crate::registry::{RegistryError, RegistryService, StageResultSet};
use anyhow::{Context, Result};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Resolves the effective configuration: file or environment, then CLI overrides
pub fn load_config(args: &CliArgs) -> Result<SvcatlasConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => SvcatlasConfig::from_file(path)?,
        None => SvcatlasConfig::from_env()?,
    };

    if args.offline {
        config.offline_mode = true;
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.to_lowercase();
    }

    config.validate()?;
    Ok(config)
}

pub async fn handle_services(args: &ServicesArgs, config: &SvcatlasConfig) -> i32 {
    let service = match RegistryService::new(config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("{}", e.help_message());
            return EXIT_FAILURE;
        }
    };

    let results = fetch_stages(&service, &args.stages).await;

    let mut by_stage: BTreeMap<String, Arc<StageResultSet>> = BTreeMap::new();
    let mut failed = false;
    for (stage, result) in args.stages.iter().zip(results) {
        match result {
            Ok(applications) => {
                by_stage.insert(stage.clone(), applications);
            }
            Err(e) => {
                error!(stage = %stage, error = %e, "Failed to load stage");
                eprintln!("{}", e.help_message());
                failed = true;
            }
        }
    }

    if failed {
        return EXIT_FAILURE;
    }

    let view: BTreeMap<String, &StageResultSet> = by_stage
        .iter()
        .map(|(stage, applications)| (stage.clone(), applications.as_ref()))
        .collect();

    let formatter = OutputFormatter::new(args.format.into());
    match formatter
        .format_services(&view)
        .and_then(|output| emit(&output, args.output.as_deref()))
    {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

/// Fetches every stage concurrently, preserving input order
async fn fetch_stages(
    service: &RegistryService,
    stages: &[String],
) -> Vec<Result<Arc<StageResultSet>, RegistryError>> {
    debug!(count = stages.len(), "Fetching stages");
    join_all(
        stages
            .iter()
            .map(|stage| service.get_all_microservices(stage)),
    )
    .await
}

pub fn handle_stages(args: &StagesArgs, config: &SvcatlasConfig) -> i32 {
    let stages = match RegistryService::new(config) {
        Ok(service) => service.get_all_stage_names(),
        Err(e) => {
            eprintln!("{}", e.help_message());
            return EXIT_FAILURE;
        }
    };

    print_or_fail(OutputFormatter::new(args.format.into()).format_stages(&stages))
}

pub fn handle_config(args: &ConfigArgs, config: &SvcatlasConfig) -> i32 {
    let format: OutputFormat = args.format.into();
    print_or_fail(OutputFormatter::new(format).format_config(config))
}

fn print_or_fail(output: Result<String>) -> i32 {
    match output.and_then(|text| emit(&text, None)) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

fn emit(output: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write output to {}", path.display())),
        None => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}
