//! Setting value coercion, per-key reports and the admin-facing view

use std::collections::HashMap;

use crm_plugin_api::{SettingSpec, SettingType};
use serde::Serialize;
use serde_json::Value;

/// Convert a JSON scalar into the stored string form.
///
/// Arrays and objects are rejected.
pub fn coerce_value(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err("value must be a string, number or boolean".into()),
    }
}

/// Coerce a map of override values, dropping the ones that aren't scalars
pub fn coerce_overrides(overrides: &serde_json::Map<String, Value>) -> HashMap<String, String> {
    overrides
        .iter()
        .filter_map(|(k, v)| match coerce_value(v) {
            Ok(s) => Some((k.clone(), s)),
            Err(e) => {
                tracing::debug!(key = %k, error = %e, "Ignoring non-scalar override");
                None
            }
        })
        .collect()
}

/// Outcome of a multi-key settings update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdateReport {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
}

impl SettingsUpdateReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of clearing every setting of a plugin
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResetReport {
    pub cleared: Vec<String>,
    pub failed: Vec<String>,
}

impl ResetReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One setting as shown to administrators.
///
/// Secret values are never echoed back; only `has_value` is reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingView {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: SettingType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub has_value: bool,
}

impl SettingView {
    pub fn new(spec: &SettingSpec, stored: Option<&str>) -> Self {
        let stored = stored.unwrap_or("");
        Self {
            key: spec.key.clone(),
            label: spec.label.clone(),
            kind: spec.kind,
            required: spec.required,
            default: spec.default.clone(),
            options: spec.options.clone(),
            value: (!spec.is_secret()).then(|| stored.to_string()),
            has_value: !stored.is_empty(),
        }
    }
}
