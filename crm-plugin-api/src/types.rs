//! Plugin metadata structures

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

/// Metadata describing an installed plugin.
///
/// Built once from the plugin's descriptor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
    /// Unique plugin identifier (also the directory name by convention)
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Installed version
    pub version: Version,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Plugin author
    #[serde(default)]
    pub author: String,
    /// Plugins that must be active before this one can be enabled
    #[serde(default)]
    pub dependencies: Vec<PluginDependency>,
    /// Ordered settings schema
    #[serde(default)]
    pub settings: Vec<SettingSpec>,
}

impl PluginMetadata {
    /// Look up a setting by key
    pub fn setting(&self, key: &str) -> Option<&SettingSpec> {
        self.settings.iter().find(|s| s.key == key)
    }

    /// Whether this plugin declares a dependency on `plugin_id`
    pub fn depends_on(&self, plugin_id: &str) -> bool {
        self.dependencies.iter().any(|d| d.plugin_id == plugin_id)
    }
}

/// A dependency on another plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDependency {
    /// Required plugin id
    pub plugin_id: String,
    /// Version constraint the installed dependency must satisfy
    pub version: VersionReq,
}

impl PluginDependency {
    /// Parse a dependency constraint.
    ///
    /// A bare version (`2.0`, `1.4.2`) is a minimum version (`>=2.0`); an
    /// empty constraint accepts any version. Anything else is parsed as a
    /// semver requirement.
    pub fn parse(plugin_id: impl Into<String>, constraint: &str) -> Result<Self, semver::Error> {
        let constraint = constraint.trim();
        let version = if constraint.is_empty() {
            VersionReq::STAR
        } else if constraint.starts_with(|c: char| c.is_ascii_digit()) {
            VersionReq::parse(&format!(">={constraint}"))?
        } else {
            VersionReq::parse(constraint)?
        };
        Ok(Self {
            plugin_id: plugin_id.into(),
            version,
        })
    }

    /// Whether `installed` satisfies this dependency's constraint
    pub fn is_satisfied_by(&self, installed: &Version) -> bool {
        self.version.matches(installed)
    }
}

/// Declared type of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Text,
    Password,
    Url,
    Number,
    Boolean,
    Select,
}

/// One entry of a plugin's settings schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingSpec {
    /// Setting key, unique within the plugin
    pub key: String,
    /// Label shown in the admin UI
    #[serde(default)]
    pub label: String,
    /// Value type
    #[serde(rename = "type")]
    pub kind: SettingType,
    /// Value used while nothing is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Must be non-empty for the plugin to count as configured
    #[serde(default)]
    pub required: bool,
    /// Allowed values for `select` settings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl SettingSpec {
    /// Create a setting of the given type with no default
    pub fn new(key: impl Into<String>, kind: SettingType) -> Self {
        Self {
            key: key.into(),
            label: String::new(),
            kind,
            default: None,
            required: false,
            options: Vec::new(),
        }
    }

    /// Builder: mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Builder: set the default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Builder: set allowed options
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_secret(&self) -> bool {
        self.kind == SettingType::Password
    }

    /// Check a candidate value against the declared type.
    ///
    /// The empty string is always valid: it clears the setting.
    pub fn validate(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        match self.kind {
            SettingType::Text | SettingType::Password => Ok(()),
            SettingType::Url => {
                if value.starts_with("http://") || value.starts_with("https://") {
                    Ok(())
                } else {
                    Err(format!("'{}' must be an http(s) URL", self.key))
                }
            }
            SettingType::Number => value
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| format!("'{}' must be a number", self.key)),
            SettingType::Boolean => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("'{}' must be true or false", self.key)),
            },
            SettingType::Select => {
                if self.options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' must be one of: {}",
                        self.key,
                        self.options.join(", ")
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_version_is_minimum() {
        let dep = PluginDependency::parse("core", "2.0").unwrap();
        assert!(dep.is_satisfied_by(&Version::new(2, 0, 0)));
        assert!(dep.is_satisfied_by(&Version::new(3, 1, 0)));
        assert!(!dep.is_satisfied_by(&Version::new(1, 9, 9)));
    }

    #[test]
    fn test_empty_constraint_accepts_anything() {
        let dep = PluginDependency::parse("core", "").unwrap();
        assert!(dep.is_satisfied_by(&Version::new(0, 0, 1)));
    }

    #[test]
    fn test_explicit_requirement() {
        let dep = PluginDependency::parse("core", "^1.2").unwrap();
        assert!(dep.is_satisfied_by(&Version::new(1, 4, 0)));
        assert!(!dep.is_satisfied_by(&Version::new(2, 0, 0)));
    }

    #[test]
    fn test_invalid_constraint() {
        assert!(PluginDependency::parse("core", ">>nope").is_err());
    }

    #[test]
    fn test_validate_by_type() {
        let url = SettingSpec::new("webdavUrl", SettingType::Url);
        assert!(url.validate("https://dav.example.org").is_ok());
        assert!(url.validate("ftp://example.org").is_err());

        let num = SettingSpec::new("interval", SettingType::Number);
        assert!(num.validate("12.5").is_ok());
        assert!(num.validate("twelve").is_err());

        let flag = SettingSpec::new("enabled", SettingType::Boolean);
        assert!(flag.validate("true").is_ok());
        assert!(flag.validate("yes").is_err());

        let mode = SettingSpec::new("mode", SettingType::Select).with_options(["daily", "weekly"]);
        assert!(mode.validate("weekly").is_ok());
        assert!(mode.validate("hourly").is_err());
    }

    #[test]
    fn test_empty_value_always_valid() {
        let num = SettingSpec::new("interval", SettingType::Number);
        assert!(num.validate("").is_ok());
    }

    #[test]
    fn test_metadata_json_shape() {
        let metadata = PluginMetadata {
            id: "external-backup".into(),
            name: "External Backup".into(),
            version: Version::new(1, 0, 0),
            description: String::new(),
            author: String::new(),
            dependencies: vec![PluginDependency::parse("core", "2.0").unwrap()],
            settings: vec![SettingSpec::new("password", SettingType::Password).required()],
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["dependencies"][0]["pluginId"], "core");
        assert_eq!(json["dependencies"][0]["version"], ">=2.0");
        assert_eq!(json["settings"][0]["type"], "password");
        assert!(metadata.depends_on("core"));
        assert!(metadata.setting("password").unwrap().is_secret());
    }
}
