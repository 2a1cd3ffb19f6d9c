use crate::config::{ConfigLoader, CrmConfig};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration file paths
    Path,
}

pub fn run(args: ConfigArgs, config: &CrmConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(config),
        ConfigCommands::Path => show_paths(),
    }
}

fn show_config(config: &CrmConfig) -> Result<()> {
    println!("{}", render(config)?);
    Ok(())
}

/// TOML view of `config` with API keys masked
fn render(config: &CrmConfig) -> Result<String> {
    let mut masked = config.clone();
    for key in &mut masked.auth.keys {
        key.key = "********".to_string();
    }
    Ok(toml::to_string_pretty(&masked)?)
}

fn show_paths() -> Result<()> {
    println!("User config:    {}", ConfigLoader::user_config_path().display());
    println!("Project config: {}", ConfigLoader::project_config_path().display());
    Ok(())
}
