mod args;
mod config;
mod fetch;

pub use args::{Cli, CliCommand, ConfigCliArgs, ConfigCommand, FetchCliArgs, ServeCliArgs};
pub use config::handle_config_command;
pub use fetch::handle_fetch_command;
