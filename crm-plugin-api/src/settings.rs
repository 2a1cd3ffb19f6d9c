//! Effective settings handed to plugin instances

use std::collections::{BTreeMap, HashMap};

use crate::types::SettingSpec;

/// Effective settings for one plugin: stored values (or schema defaults),
/// optionally layered with caller overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSettings {
    values: BTreeMap<String, String>,
    required: Vec<String>,
}

impl PluginSettings {
    /// Build from persisted values.
    ///
    /// Keys outside `schema` are dropped; schema keys with nothing stored take
    /// their declared default, else the empty string.
    pub fn from_stored(schema: &[SettingSpec], stored: &HashMap<String, String>) -> Self {
        Self::layered(schema, stored, &HashMap::new())
    }

    /// Build from persisted values with `overrides` on top.
    ///
    /// Overrides win, except for password settings: an empty password
    /// override is treated as omitted so a stored secret is never blanked.
    pub fn layered(
        schema: &[SettingSpec],
        stored: &HashMap<String, String>,
        overrides: &HashMap<String, String>,
    ) -> Self {
        let mut values = BTreeMap::new();
        let mut required = Vec::new();

        for spec in schema {
            let base = stored
                .get(&spec.key)
                .filter(|v| !v.is_empty())
                .or(spec.default.as_ref())
                .cloned()
                .unwrap_or_default();

            let value = match overrides.get(&spec.key) {
                Some(v) if v.is_empty() && spec.is_secret() => base,
                Some(v) => v.clone(),
                None => base,
            };

            if spec.required {
                required.push(spec.key.clone());
            }
            values.insert(spec.key.clone(), value);
        }

        Self { values, required }
    }

    /// Value for `key`, or `""` when unknown
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    /// Whether `key` has a non-empty value
    pub fn is_set(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }

    /// Required keys that are still empty
    pub fn missing_required(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|k| !self.is_set(k))
            .map(String::as_str)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
