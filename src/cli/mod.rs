pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, OutputFormatArg, ServicesArgs, StagesArgs};
pub use output::{OutputFormat, OutputFormatter};
