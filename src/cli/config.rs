use anyhow::{Context, Result};

use super::args::{ConfigCliArgs, ConfigCommand};
use crate::config::Config;

const REDACTED: &str = "<redacted>";

pub fn handle_config_command(args: ConfigCliArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", render_redacted(&config)?);
        }
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

fn render_redacted(config: &Config) -> Result<String> {
    let mut shown = config.clone();
    if shown.graph.client_secret.is_some() {
        shown.graph.client_secret = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown).context("Failed to serialize config")
}
