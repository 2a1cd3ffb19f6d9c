//! Plugin management commands

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use crm_core::PluginManager;
use crm_core::plugins::external_backup;
use crm_plugin_api::{ActionOutcome, BackupKind, PluginAction};

use super::open_manager;
use crate::config::CrmConfig;

/// Plugin management arguments
#[derive(Args)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List installed plugins
    List,
    /// Show plugin details and settings
    Info {
        /// Plugin id
        id: String,
    },
    /// Enable a plugin
    Enable {
        /// Plugin id to enable
        id: String,
    },
    /// Disable a plugin
    Disable {
        /// Plugin id to disable
        id: String,
    },
    /// Store a setting value
    Set {
        /// Plugin id
        id: String,
        /// Setting key
        key: String,
        /// New value (empty clears it)
        value: String,
    },
    /// Run the plugin's connection test
    Test {
        /// Plugin id
        id: String,
        /// Override a stored setting for this test only
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        overrides: Vec<(String, String)>,
    },
    /// Clear every setting of a plugin
    Reset {
        /// Plugin id
        id: String,
    },
    /// Copy the newest local backup to the external backup target
    Backup {
        /// Backup type: 0 = sql.gz, 1 = zip, 2 = sql, 3 = full
        #[arg(long, default_value_t = 3)]
        kind: u8,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Run plugin command
pub async fn run(args: PluginArgs, config: &CrmConfig) -> Result<()> {
    let mut manager = open_manager(config)?;

    match args.command {
        PluginCommands::List => list_plugins(&manager, config),
        PluginCommands::Info { id } => show_plugin_info(&manager, &id),
        PluginCommands::Enable { id } => {
            manager.enable_plugin(&id)?;
            println!("Enabled plugin: {id}");
            Ok(())
        }
        PluginCommands::Disable { id } => {
            manager.disable_plugin(&id)?;
            println!("Disabled plugin: {id}");
            Ok(())
        }
        PluginCommands::Set { id, key, value } => set_setting(&mut manager, &id, &key, &value),
        PluginCommands::Test { id, overrides } => test_plugin(&manager, &id, overrides).await,
        PluginCommands::Reset { id } => reset_settings(&mut manager, &id),
        PluginCommands::Backup { kind } => backup(&manager, kind).await,
    }
}

fn list_plugins(manager: &PluginManager, config: &CrmConfig) -> Result<()> {
    let plugins = manager.get_all_plugins();

    if plugins.is_empty() {
        println!("No plugins installed");
        println!();
        println!("Plugin directory: {}", config.plugins.dir.display());
        println!("Each plugin lives in its own subdirectory with a plugin.json descriptor.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Version").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ]);

    for p in plugins {
        let status = if p.is_active {
            Cell::new("active").fg(Color::Green)
        } else {
            Cell::new("inactive")
        };
        table.add_row(vec![
            Cell::new(&p.metadata.id),
            Cell::new(&p.metadata.name),
            Cell::new(p.metadata.version.to_string()),
            status,
            Cell::new(&p.metadata.description),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn show_plugin_info(manager: &PluginManager, id: &str) -> Result<()> {
    let details = manager.plugin_details(id)?;
    let m = &details.metadata;

    println!("Id:          {}", m.id);
    println!("Name:        {}", m.name);
    println!("Version:     {}", m.version);
    println!(
        "Author:      {}",
        if m.author.is_empty() { "Unknown" } else { &m.author }
    );
    println!(
        "Description: {}",
        if m.description.is_empty() {
            "No description"
        } else {
            &m.description
        }
    );
    println!(
        "Status:      {}{}",
        if details.is_active { "Active" } else { "Inactive" },
        if details.is_configured { "" } else { " (not configured)" }
    );

    if !m.dependencies.is_empty() {
        println!();
        println!("Dependencies:");
        for dep in &m.dependencies {
            println!("  {} {}", dep.plugin_id, dep.version);
        }
    }

    if !details.settings.is_empty() {
        println!();
        println!("Settings:");
        for s in &details.settings {
            let shown = match &s.value {
                Some(v) if !v.is_empty() => v.clone(),
                _ if s.has_value => "(set)".to_string(),
                _ => match &s.default {
                    Some(d) => format!("(default: {d})"),
                    None => "(not set)".to_string(),
                },
            };
            let required = if s.required { " *" } else { "" };
            println!("  {}{required} = {shown}", s.key);
        }
    }

    Ok(())
}

fn set_setting(manager: &mut PluginManager, id: &str, key: &str, value: &str) -> Result<()> {
    if manager.get_plugin_metadata(id).is_none() {
        bail!("Plugin '{id}' not found");
    }
    if !manager.update_plugin_setting(id, key, value) {
        bail!("Could not update setting '{key}' of plugin '{id}'");
    }
    println!("Updated {id}.{key}");
    Ok(())
}

fn reset_settings(manager: &mut PluginManager, id: &str) -> Result<()> {
    let report = manager.reset_plugin_settings(id)?;
    if !report.is_complete() {
        bail!(
            "Some settings could not be reset: {}",
            report.failed.join(", ")
        );
    }
    println!("Cleared {} setting(s) of {id}", report.cleared.len());
    Ok(())
}

async fn test_plugin(
    manager: &PluginManager,
    id: &str,
    overrides: Vec<(String, String)>,
) -> Result<()> {
    let plugin = manager
        .get_plugin(id)
        .ok_or_else(|| anyhow!("Plugin '{id}' not found or not active"))?;

    let overrides: HashMap<String, String> = overrides.into_iter().collect();
    let outcome = plugin.test_with_settings(&overrides).await;

    let mark = if outcome.success { "✓" } else { "✗" };
    println!("{mark} {}", outcome.message);
    if let Some(details) = &outcome.details {
        println!("{}", serde_json::to_string_pretty(details)?);
    }

    if !outcome.success {
        bail!("Connection test failed");
    }
    Ok(())
}

async fn backup(manager: &PluginManager, kind: u8) -> Result<()> {
    let kind = BackupKind::try_from(kind).map_err(|e| anyhow!(e))?;

    let plugin = manager
        .get_plugin(external_backup::PLUGIN_ID)
        .ok_or_else(|| anyhow!("External Backup plugin is not enabled"))?;
    if !plugin.is_configured() {
        bail!("External Backup plugin is not configured");
    }

    let ActionOutcome::ManualBackup(status) = plugin
        .execute(PluginAction::ManualBackup { kind })
        .await?;
    println!(
        "Copied {} ({} bytes) to {}",
        status.file_name, status.bytes, status.remote_url
    );
    Ok(())
}
