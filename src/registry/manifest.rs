//! Manifest seeding — registering services from YAML files.
//!
//! Deployments can seed the registry at startup from manifest files
//! instead of (or before) in-process registration calls. A manifest
//! holds a single `service:` entry or a `services:` list, plus optional
//! `defaults:` merged under every entry:
//!
//! ```yaml
//! defaults:
//!   realm: smart_city
//! services:
//!   - service_name: Librarian
//!     capabilities: [search, index]
//!   - service_name: FileParser
//!     capabilities:
//!       - name: file_parsing
//!         endpoints:
//!           - path: /api/v1/content-pillar/upload
//!             method: POST
//! ```
//!
//! Nothing is ever written back: the registry stays in-memory and is
//! rebuilt from manifests (and live registrations) at each startup.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::process_config;

use super::ServiceRegistryCore;

type ManifestError = Box<dyn std::error::Error + Send + Sync>;

impl ServiceRegistryCore {
    /// Register every service described by a manifest document. Returns
    /// the number of services registered; entries that fail registration
    /// are logged and skipped.
    pub fn register_from_manifest(&self, content: &str) -> Result<usize, ManifestError> {
        let doc: Value = serde_yaml::from_str(content)?;
        let defaults: HashMap<String, Value> = match doc.get("defaults") {
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            _ => HashMap::new(),
        };

        let entries: Vec<Value> = if let Some(single) = doc.get("service") {
            vec![single.clone()]
        } else if let Some(Value::Array(list)) = doc.get("services") {
            list.clone()
        } else {
            return Err("manifest must contain a 'service' entry or a 'services' list".into());
        };

        let mut registered = 0;
        for entry in entries {
            let Value::Object(record) = entry else {
                log::warn!("skipping manifest entry: not a map");
                continue;
            };
            let overrides: HashMap<String, Value> = record.into_iter().collect();
            let merged = process_config(&overrides, &defaults);
            let service_name = merged
                .get("service_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let realm = merged
                .get("realm")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let envelope = Value::Object(Map::from_iter(merged));
            match self.register_service(&service_name, &realm, envelope) {
                Ok(_) => registered += 1,
                Err(e) => log::warn!("manifest entry '{service_name}' rejected: {e}"),
            }
        }
        Ok(registered)
    }

    /// Load one manifest file.
    pub fn load_manifest_file(&self, path: &Path) -> Result<usize, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        let count = self.register_from_manifest(&content)?;
        log::info!("loaded {count} service(s) from {}", path.display());
        Ok(count)
    }

    /// Load all manifest files from a directory, recursively. Individual
    /// files that fail to parse are logged and skipped; a missing
    /// directory counts as zero.
    pub fn load_manifest_dir(&self, dir: &Path) -> Result<usize, ManifestError> {
        let mut count = 0;
        if !dir.exists() {
            return Ok(0);
        }
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                count += self.load_manifest_dir(&path)?;
            } else if path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                match self.load_manifest_file(&path) {
                    Ok(n) => count += n,
                    Err(e) => {
                        log::warn!("failed to load manifest {}: {e}", path.display());
                    }
                }
            }
        }
        Ok(count)
    }

    /// Load manifests from every configured search path.
    pub fn load_all_manifests(&self) -> Result<usize, ManifestError> {
        let mut count = 0;
        for dir in self.manifest_paths() {
            count += self.load_manifest_dir(&dir)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CuratorConfig;
    use crate::routes::RouteFilter;
    use std::io::Write;

    fn registry() -> ServiceRegistryCore {
        let mut config = CuratorConfig::default();
        config.telemetry_enabled = false;
        ServiceRegistryCore::with_config(config)
    }

    #[test]
    fn test_manifest_single_service() {
        let core = registry();
        let count = core
            .register_from_manifest(
                r#"
service:
  service_name: Librarian
  realm: smart_city
  capabilities:
    - search
    - index
"#,
            )
            .unwrap();
        assert_eq!(count, 1);
        let registration = core.get_service("Librarian").unwrap();
        assert_eq!(registration.capabilities.len(), 2);
        assert_eq!(registration.realm, "smart_city");
    }

    #[test]
    fn test_manifest_defaults_apply_to_every_entry() {
        let core = registry();
        let count = core
            .register_from_manifest(
                r#"
defaults:
  realm: smart_city
services:
  - service_name: Librarian
    capabilities: [search]
  - service_name: FileParser
    capabilities:
      - name: file_parsing
        endpoints:
          - path: /api/v1/content-pillar/upload
            method: POST
"#,
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(core.get_service("Librarian").unwrap().realm, "smart_city");
        let routes = core.discover_routes(&RouteFilter {
            pillar: Some("content-pillar".to_string()),
            ..RouteFilter::default()
        });
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_manifest_bad_entry_skipped() {
        let core = registry();
        let count = core
            .register_from_manifest(
                r#"
services:
  - service_name: Good
  - realm: no_name_here
"#,
            )
            .unwrap();
        assert_eq!(count, 1);
        assert!(core.get_service("Good").is_some());
    }

    #[test]
    fn test_manifest_without_services_is_an_error() {
        let core = registry();
        assert!(core.register_from_manifest("defaults:\n  realm: x\n").is_err());
    }

    #[test]
    fn test_load_manifest_dir_recursive_and_missing() {
        let core = registry();
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();

        let mut f = std::fs::File::create(nested.join("librarian.yaml")).unwrap();
        writeln!(f, "service:\n  service_name: Librarian\n  capabilities: [search]").unwrap();
        let mut broken = std::fs::File::create(dir.path().join("broken.yml")).unwrap();
        writeln!(broken, ": not yaml :").unwrap();

        let count = core.load_manifest_dir(dir.path()).unwrap();
        assert_eq!(count, 1);
        assert!(core.get_service("Librarian").is_some());

        assert_eq!(
            core.load_manifest_dir(Path::new("/nonexistent/curator")).unwrap(),
            0
        );
    }
}
