//! Plugin descriptors - discovery and schema validation
//!
//! Each plugin lives in its own subdirectory of the plugins directory and
//! describes itself in `plugin.json`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crm_plugin_api::{PluginDependency, PluginMetadata, SettingSpec, SettingType};
use semver::Version;
use serde::Deserialize;

use super::error::DescriptorError;

/// Descriptor file name inside a plugin directory
pub const DESCRIPTOR_FILE: &str = "plugin.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawDescriptor {
    id: String,
    #[serde(default)]
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
    #[serde(default)]
    settings: Vec<RawSetting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawDependency {
    plugin_id: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSetting {
    key: String,
    #[serde(default)]
    label: String,
    #[serde(rename = "type")]
    kind: SettingType,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    options: Vec<String>,
}

impl From<RawSetting> for SettingSpec {
    fn from(raw: RawSetting) -> Self {
        Self {
            key: raw.key,
            label: raw.label,
            kind: raw.kind,
            default: raw.default,
            required: raw.required,
            options: raw.options,
        }
    }
}

/// Load and validate a single descriptor file
pub fn load_descriptor(path: &Path) -> Result<PluginMetadata, DescriptorError> {
    let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawDescriptor =
        serde_json::from_str(&content).map_err(|source| DescriptorError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    validate(raw).map_err(|reason| DescriptorError::Invalid {
        path: path.to_path_buf(),
        reason,
    })
}

fn validate(raw: RawDescriptor) -> Result<PluginMetadata, String> {
    if !is_valid_id(&raw.id) {
        return Err(format!("invalid plugin id '{}'", raw.id));
    }

    let version = Version::parse(raw.version.trim())
        .map_err(|e| format!("invalid version '{}': {e}", raw.version))?;

    let mut dependencies = Vec::with_capacity(raw.dependencies.len());
    for dep in raw.dependencies {
        if dep.plugin_id == raw.id {
            return Err("plugin cannot depend on itself".to_string());
        }
        if !is_valid_id(&dep.plugin_id) {
            return Err(format!("invalid dependency id '{}'", dep.plugin_id));
        }
        let parsed = PluginDependency::parse(&dep.plugin_id, &dep.version).map_err(|e| {
            format!(
                "invalid version constraint '{}' for '{}': {e}",
                dep.version, dep.plugin_id
            )
        })?;
        dependencies.push(parsed);
    }

    let settings: Vec<SettingSpec> = raw.settings.into_iter().map(SettingSpec::from).collect();
    let mut seen = HashSet::new();
    for setting in &settings {
        if setting.key.trim().is_empty() {
            return Err("setting with empty key".to_string());
        }
        if !seen.insert(setting.key.as_str()) {
            return Err(format!("duplicate setting key '{}'", setting.key));
        }
        if setting.kind == SettingType::Select && setting.options.is_empty() {
            return Err(format!("select setting '{}' has no options", setting.key));
        }
        if let Some(default) = &setting.default {
            setting
                .validate(default)
                .map_err(|e| format!("bad default: {e}"))?;
        }
    }

    let name = if raw.name.trim().is_empty() {
        raw.id.clone()
    } else {
        raw.name
    };

    Ok(PluginMetadata {
        id: raw.id,
        name,
        version,
        description: raw.description,
        author: raw.author,
        dependencies,
        settings,
    })
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Scan `dir` for plugin directories and load their descriptors.
///
/// A missing directory yields no plugins. Directories without a descriptor,
/// malformed descriptors and duplicate ids are logged and skipped. Results
/// are sorted by id.
pub fn discover(dir: &Path) -> Result<Vec<PluginMetadata>, DescriptorError> {
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "Plugin directory does not exist");
        return Ok(Vec::new());
    }

    let io_err = |source: std::io::Error| DescriptorError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut plugin_dirs: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            plugin_dirs.push(path);
        }
    }
    plugin_dirs.sort();

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for plugin_dir in plugin_dirs {
        let descriptor = plugin_dir.join(DESCRIPTOR_FILE);
        if !descriptor.exists() {
            tracing::debug!(dir = %plugin_dir.display(), "No plugin descriptor, skipping");
            continue;
        }

        match load_descriptor(&descriptor) {
            Ok(metadata) => {
                if !seen.insert(metadata.id.clone()) {
                    tracing::warn!(
                        plugin = %metadata.id,
                        path = %descriptor.display(),
                        "Duplicate plugin id, skipping"
                    );
                    continue;
                }
                found.push(metadata);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed plugin descriptor");
            }
        }
    }

    found.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(found)
}
