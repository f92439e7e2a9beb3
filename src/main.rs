use svcatlas::cli::commands::{CliArgs, Commands};
use svcatlas::cli::handlers::{
    handle_config, handle_services, handle_stages, load_config, EXIT_CONFIG_ERROR,
};
use svcatlas::util::logging::{init_logging, parse_level, LoggingConfig};
use svcatlas::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("svcatlas v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let exit_code = match &args.command {
        Commands::Services(services_args) => handle_services(services_args, &config).await,
        Commands::Stages(stages_args) => handle_stages(stages_args, &config),
        Commands::Config(config_args) => handle_config(config_args, &config),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();

    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }

    init_logging(config);
}
