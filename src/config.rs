//! Registry configuration.
//!
//! Everything has a sensible default; hosts override through `CURATOR_*`
//! environment variables or by constructing the struct directly.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde_json::Value;

/// Configuration for a registry core instance.
#[derive(Debug, Clone)]
pub struct CuratorConfig {
    /// Realm assigned to registrations that do not declare one.
    pub default_realm: String,
    /// Directories searched by manifest seeding.
    pub manifest_paths: Vec<PathBuf>,
    /// Whether operation telemetry is recorded.
    pub telemetry_enabled: bool,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            default_realm: "unknown".to_string(),
            manifest_paths: vec![
                PathBuf::from("manifests"),
                PathBuf::from("/etc/curator/manifests"),
            ],
            telemetry_enabled: true,
        }
    }
}

impl CuratorConfig {
    /// Build a config from the environment.
    ///
    /// * `CURATOR_DEFAULT_REALM` — default realm string.
    /// * `CURATOR_MANIFEST_PATH` — colon-separated manifest directories,
    ///   replacing the defaults.
    /// * `CURATOR_TELEMETRY_OPT_OUT` — "true"/"1" disables telemetry.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(realm) = env::var("CURATOR_DEFAULT_REALM") {
            if !realm.trim().is_empty() {
                config.default_realm = realm;
            }
        }
        if let Ok(paths) = env::var("CURATOR_MANIFEST_PATH") {
            let parsed: Vec<PathBuf> = paths
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
            if !parsed.is_empty() {
                config.manifest_paths = parsed;
            }
        }
        if let Ok(opt_out) = env::var("CURATOR_TELEMETRY_OPT_OUT") {
            if matches!(opt_out.to_lowercase().as_str(), "true" | "1") {
                config.telemetry_enabled = false;
            }
        }
        config
    }
}

/// Merge a configuration map over defaults: every key in `overrides`
/// replaces the default value, everything else is kept.
pub fn process_config(
    overrides: &HashMap<String, Value>,
    defaults: &HashMap<String, Value>,
) -> HashMap<String, Value> {
    let mut result = defaults.clone();
    for (key, value) in overrides {
        result.insert(key.clone(), value.clone());
    }
    result
}
