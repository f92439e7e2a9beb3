use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Service registry aggregation across deployment stages
#[derive(Parser, Debug)]
#[command(
    name = "svcatlas",
    about = "Service registry aggregation across deployment stages",
    version,
    author,
    long_about = "svcatlas reads Eureka-style service registries, one per deployment stage, \
                  and prints a normalized view of every registered application: hosts, \
                  enabled ports, declared consumers and selected metadata."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "Read configuration from a TOML file instead of the environment"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Offline mode - never contact a registry, report empty stages"
    )]
    pub offline: bool,

    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "Registry request timeout in seconds"
    )]
    pub timeout: Option<u64>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Show normalized applications for one or more stages",
        long_about = "Fetches the registry of each given stage and prints its applications.\n\
                      Stages are fetched concurrently.\n\n\
                      Examples:\n  \
                      svcatlas services prod\n  \
                      svcatlas services dev prod --format json\n  \
                      svcatlas --config stages.toml services qa -o qa.yaml -f yaml"
    )]
    Services(ServicesArgs),

    #[command(
        about = "List configured stages",
        long_about = "Lists every configured stage name. Never contacts a registry.\n\n\
                      Examples:\n  \
                      svcatlas stages\n  \
                      svcatlas stages --format json"
    )]
    Stages(StagesArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ServicesArgs {
    #[arg(value_name = "STAGE", required = true, num_args = 1.., help = "Stage names")]
    pub stages: Vec<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct StagesArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
