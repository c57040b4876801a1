//! The authoritative registration store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::capability::{bump_patch_version, normalize_all, CapabilityDefinition, ContractKind};
use crate::config::CuratorConfig;
use crate::errors::{RegistrationError, SoaInvocationError};
use crate::routes::{HttpMethod, RouteEntry, RouteFilter, RouteRegistry};
use crate::telemetry::TelemetryRecorder;
use crate::validation::validate_service_metadata;

use super::service::{
    HealthReport, McpToolEntry, RegistryStatus, ServiceRegistration, ServiceStatus, SoaApiEntry,
    SoaHandler,
};

/// Internal record for one registered service. Public snapshots are
/// assembled from this plus the parallel SOA/MCP registries at read
/// time, so readers never observe a half-applied registration.
#[derive(Debug, Clone)]
struct StoredService {
    service_name: String,
    realm: String,
    service_type: Option<String>,
    capabilities: Vec<CapabilityDefinition>,
    status: ServiceStatus,
    registered_at: DateTime<Utc>,
}

/// The service registry core.
///
/// All mutating operations are internally synchronized: the service map
/// sits behind a writer lock with short, bounded critical sections (no
/// I/O or handler invocation under the lock), the SOA API and MCP tool
/// registries are sharded concurrent maps. Constructed explicitly and
/// passed by handle to subsystems at startup; there is no process-wide
/// instance.
pub struct ServiceRegistryCore {
    config: CuratorConfig,
    telemetry: TelemetryRecorder,
    services: RwLock<HashMap<String, StoredService>>,
    routes: Arc<RouteRegistry>,
    soa_apis: DashMap<String, SoaApiEntry>,
    mcp_tools: DashMap<String, McpToolEntry>,
}

impl ServiceRegistryCore {
    /// Create a registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(CuratorConfig::default())
    }

    /// Create a registry with the given configuration.
    pub fn with_config(config: CuratorConfig) -> Self {
        let telemetry = if config.telemetry_enabled {
            TelemetryRecorder::new()
        } else {
            TelemetryRecorder::disabled()
        };
        log::info!("service registry core initialized (default realm: {})", config.default_realm);
        Self {
            telemetry,
            config,
            services: RwLock::new(HashMap::new()),
            routes: Arc::new(RouteRegistry::new()),
            soa_apis: DashMap::new(),
            mcp_tools: DashMap::new(),
        }
    }

    /// The route registry this core feeds.
    pub fn routes(&self) -> &Arc<RouteRegistry> {
        &self.routes
    }

    /// Telemetry recorded by this registry instance.
    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    /// Manifest search paths from the configuration.
    pub(crate) fn manifest_paths(&self) -> Vec<std::path::PathBuf> {
        self.config.manifest_paths.clone()
    }

    // -----------------------------------------------------------------
    // Service registration
    // -----------------------------------------------------------------

    /// Register a service and its capabilities.
    ///
    /// The metadata envelope is validated first (only `service_name` is
    /// strictly required; the explicit parameters win over envelope
    /// fields). Each capability entry is then normalized individually:
    /// malformed entries are logged and skipped, never aborting the
    /// whole registration. Route-bearing contracts are registered with
    /// the route registry; a same-name re-registration is treated as a
    /// hot reload and bumps the version of carried-over capabilities.
    pub fn register_service(
        &self,
        service_name: &str,
        realm: &str,
        metadata: Value,
    ) -> Result<ServiceRegistration, RegistrationError> {
        let mut envelope = match metadata {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                self.telemetry.record_operation("register_service", false);
                return Err(RegistrationError::InvalidMetadata {
                    errors: vec![format!(
                        "service metadata must be a map, got {}",
                        match other {
                            Value::Bool(_) => "bool",
                            Value::Number(_) => "number",
                            Value::String(_) => "string",
                            Value::Array(_) => "array",
                            _ => "null",
                        }
                    )],
                });
            }
        };
        if !service_name.trim().is_empty() {
            envelope.insert(
                "service_name".to_string(),
                Value::String(service_name.to_string()),
            );
        }
        if !realm.trim().is_empty() && !envelope.contains_key("realm") {
            envelope.insert("realm".to_string(), Value::String(realm.to_string()));
        }

        let result = validate_service_metadata(&envelope);
        for warning in &result.warnings {
            log::warn!("service metadata warning: {warning}");
        }
        if !result.valid {
            self.telemetry.record_operation("register_service", false);
            return Err(RegistrationError::InvalidMetadata {
                errors: result.errors,
            });
        }

        // Validation guarantees a non-empty string from here on.
        let service_name = envelope
            .get("service_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let effective_realm = envelope
            .get("realm")
            .and_then(Value::as_str)
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.config.default_realm)
            .to_string();
        let service_type = envelope
            .get("service_type")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut capabilities = Vec::new();
        if let Some(raw) = envelope.get("capabilities") {
            match normalize_all(&service_name, &effective_realm, raw) {
                Ok(outcome) => {
                    for rejected in &outcome.rejected {
                        log::warn!("{service_name}: skipping malformed capability: {rejected}");
                    }
                    capabilities = outcome.capabilities;
                }
                // The envelope validator has already vetted the shape;
                // anything left is logged and skipped wholesale.
                Err(e) => log::warn!("{service_name}: capabilities payload rejected: {e}"),
            }
        }

        // Hot reload: carry version history forward for capabilities the
        // service still exposes.
        let previous_versions: HashMap<String, String> = {
            let services = self.services.read();
            services
                .get(&service_name)
                .map(|existing| {
                    existing
                        .capabilities
                        .iter()
                        .map(|c| (c.capability_name.clone(), c.version.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        for cap in &mut capabilities {
            if let Some(previous) = previous_versions.get(&cap.capability_name) {
                cap.version = bump_patch_version(previous);
            }
        }

        for cap in &capabilities {
            self.register_capability_routes(cap);
        }

        let stored = StoredService {
            service_name: service_name.clone(),
            realm: effective_realm,
            service_type,
            capabilities,
            status: ServiceStatus::Active,
            registered_at: Utc::now(),
        };
        let snapshot = stored.clone();
        let reregistration = {
            let mut services = self.services.write();
            services.insert(service_name.clone(), stored).is_some()
        };

        if reregistration {
            log::info!("service {service_name} re-registered");
        } else {
            log::info!("service {service_name} registered");
        }
        self.telemetry.record_operation("register_service", true);
        self.telemetry
            .record_health_metric("services_registered", self.services.read().len() as f64);

        Ok(self.assemble(snapshot))
    }

    /// Register every route contributed by a capability's contracts.
    /// Conflicts are logged and skipped; the capability itself still
    /// registers.
    fn register_capability_routes(&self, cap: &CapabilityDefinition) {
        for (kind, contract) in &cap.contracts {
            let specs: Vec<(String, Option<String>, Option<String>)> = match kind {
                ContractKind::McpTool => continue,
                _ => {
                    let mut specs: Vec<(String, Option<String>, Option<String>)> = contract
                        .endpoints
                        .iter()
                        .map(|e| {
                            (
                                e.path().to_string(),
                                e.method().map(str::to_string),
                                e.pillar().map(str::to_string),
                            )
                        })
                        .collect();
                    if let Some(endpoint) = &contract.endpoint {
                        specs.push((endpoint.clone(), None, None));
                    }
                    specs
                }
            };
            for (path, method, pillar) in specs {
                // Bare paths default to POST (SOA invocation style).
                let method = method
                    .as_deref()
                    .and_then(|m| m.parse::<HttpMethod>().ok())
                    .unwrap_or(HttpMethod::Post);
                let mut route = RouteEntry::new(path, method, cap.service_name.clone());
                if let Some(pillar) = pillar {
                    route.pillar = pillar;
                }
                route.realm = cap.realm.clone();
                route.description = cap.description.clone();
                route.version = cap.version.clone();
                if let Err(e) = self.routes.register_route(route) {
                    log::warn!(
                        "{}: route from capability '{}' not tracked: {e}",
                        cap.service_name,
                        cap.capability_name
                    );
                }
            }
        }
    }

    /// Register a route directly (for domains that author route metadata
    /// without going through a capability contract).
    pub fn register_route(&self, route: RouteEntry) -> Result<String, RegistrationError> {
        self.routes.register_route(route)
    }

    /// Discover tracked routes.
    pub fn discover_routes(&self, filter: &RouteFilter) -> Vec<RouteEntry> {
        self.routes.discover_routes(filter)
    }

    // -----------------------------------------------------------------
    // SOA API registry (parallel, lighter-weight)
    // -----------------------------------------------------------------

    /// Register a SOA API under `"{service_name}.{api_name}"`.
    ///
    /// Deliberately skips capability validation: SOA APIs are
    /// high-frequency registrations namespaced per service. The endpoint
    /// is still tracked in the route registry.
    pub fn register_soa_api(
        &self,
        service_name: &str,
        api_name: &str,
        endpoint: &str,
        handler: Arc<dyn SoaHandler>,
        metadata: HashMap<String, Value>,
    ) -> bool {
        if service_name.trim().is_empty() || api_name.trim().is_empty() {
            log::warn!("SOA API registration requires service and API names");
            self.telemetry.record_operation("register_soa_api", false);
            return false;
        }
        let entry = SoaApiEntry {
            service_name: service_name.to_string(),
            api_name: api_name.to_string(),
            endpoint: endpoint.to_string(),
            handler: Some(handler),
            metadata,
            registered_at: Utc::now(),
        };
        let key = entry.key();

        if !endpoint.trim().is_empty() {
            let route = RouteEntry::new(endpoint, HttpMethod::Post, service_name);
            if let Err(e) = self.routes.register_route(route) {
                log::warn!("SOA API {key}: endpoint not tracked: {e}");
            }
        }

        self.soa_apis.insert(key.clone(), entry);
        log::info!("SOA API registered: {key} at {endpoint}");
        self.telemetry.record_operation("register_soa_api", true);
        true
    }

    /// Look up a SOA API by service and API name.
    pub fn get_soa_api(&self, service_name: &str, api_name: &str) -> Option<SoaApiEntry> {
        self.soa_apis
            .get(&format!("{service_name}.{api_name}"))
            .map(|e| e.value().clone())
    }

    /// List SOA APIs, optionally restricted to one service.
    pub fn list_soa_apis(&self, service_name: Option<&str>) -> Vec<SoaApiEntry> {
        let mut apis: Vec<SoaApiEntry> = self
            .soa_apis
            .iter()
            .filter(|e| service_name.is_none_or(|s| e.service_name == s))
            .map(|e| e.value().clone())
            .collect();
        apis.sort_by(|a, b| a.key().cmp(&b.key()));
        apis
    }

    /// Invoke a registered SOA API handler.
    pub async fn invoke_soa_api(
        &self,
        service_name: &str,
        api_name: &str,
        payload: Value,
    ) -> Result<Value, SoaInvocationError> {
        let key = format!("{service_name}.{api_name}");
        // Clone the handler out so the shard lock is released before the
        // await.
        let handler = {
            let entry = self
                .soa_apis
                .get(&key)
                .ok_or_else(|| SoaInvocationError::NotFound { key: key.clone() })?;
            entry
                .handler
                .clone()
                .ok_or_else(|| SoaInvocationError::NoHandler { key: key.clone() })?
        };
        handler
            .call(payload)
            .await
            .map_err(|source| SoaInvocationError::Handler { key, source })
    }

    // -----------------------------------------------------------------
    // MCP tool registry (parallel, global namespace)
    // -----------------------------------------------------------------

    /// Register an MCP tool. Tool names are unique platform-wide: a
    /// claim on a name held by a *different* service is refused, while
    /// the same service may overwrite its own tool (hot reload).
    pub fn register_mcp_tool(
        &self,
        tool_name: &str,
        tool_definition: Value,
        metadata: HashMap<String, Value>,
    ) -> bool {
        if tool_name.trim().is_empty() {
            log::warn!("MCP tool registration requires a tool name");
            self.telemetry.record_operation("register_mcp_tool", false);
            return false;
        }
        let service_name = metadata
            .get("service_name")
            .and_then(Value::as_str)
            .or_else(|| tool_definition.get("wraps_service").and_then(Value::as_str))
            .unwrap_or("unknown")
            .to_string();

        if let Some(existing) = self.mcp_tools.get(tool_name) {
            if existing.service_name != service_name {
                let err = RegistrationError::DuplicateToolName {
                    tool_name: tool_name.to_string(),
                    owner: existing.service_name.clone(),
                };
                log::warn!("{err}");
                self.telemetry.record_operation("register_mcp_tool", false);
                return false;
            }
        }

        self.mcp_tools.insert(
            tool_name.to_string(),
            McpToolEntry {
                tool_name: tool_name.to_string(),
                tool_definition,
                metadata,
                service_name,
                registered_at: Utc::now(),
            },
        );
        log::info!("MCP tool registered: {tool_name}");
        self.telemetry.record_operation("register_mcp_tool", true);
        true
    }

    /// Look up an MCP tool by its global name.
    pub fn get_mcp_tool(&self, tool_name: &str) -> Option<McpToolEntry> {
        self.mcp_tools.get(tool_name).map(|e| e.value().clone())
    }

    /// List all MCP tools, sorted by name.
    pub fn list_mcp_tools(&self) -> Vec<McpToolEntry> {
        let mut tools: Vec<McpToolEntry> =
            self.mcp_tools.iter().map(|e| e.value().clone()).collect();
        tools.sort_by(|a, b| a.tool_name.cmp(&b.tool_name));
        tools
    }

    // -----------------------------------------------------------------
    // Deregistration and status
    // -----------------------------------------------------------------

    /// Deregister a service, cascading to its capabilities, routes, SOA
    /// APIs, and MCP tools. Idempotent: an unknown service returns
    /// `false`, not an error.
    pub fn deregister_service(&self, service_name: &str) -> bool {
        let removed = self.services.write().remove(service_name);
        if removed.is_none() {
            log::warn!("deregister: service {service_name} not found in registry");
            return false;
        }
        let routes_removed = self.routes.deregister_routes_for_service(service_name);
        let prefix = format!("{service_name}.");
        self.soa_apis.retain(|key, _| !key.starts_with(&prefix));
        self.mcp_tools
            .retain(|_, entry| entry.service_name != service_name);
        log::info!(
            "service {service_name} deregistered ({routes_removed} route(s) removed)"
        );
        self.telemetry.record_operation("deregister_service", true);
        true
    }

    /// Update a service's lifecycle status (e.g. Degraded after a failed
    /// health check). Returns `false` for unknown services.
    pub fn update_service_status(&self, service_name: &str, status: ServiceStatus) -> bool {
        let mut services = self.services.write();
        match services.get_mut(service_name) {
            Some(stored) => {
                log::info!(
                    "service {service_name} status: {} -> {status}",
                    stored.status
                );
                stored.status = status;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------
    // Read side (consumed by the discovery API)
    // -----------------------------------------------------------------

    /// Snapshot of one service, any status.
    pub fn get_service(&self, service_name: &str) -> Option<ServiceRegistration> {
        let stored = self.services.read().get(service_name).cloned()?;
        Some(self.assemble(stored))
    }

    /// Snapshots of all registered services, any status.
    pub(crate) fn snapshot_all(&self) -> Vec<ServiceRegistration> {
        let stored: Vec<StoredService> = self.services.read().values().cloned().collect();
        stored.into_iter().map(|s| self.assemble(s)).collect()
    }

    fn assemble(&self, stored: StoredService) -> ServiceRegistration {
        let soa_apis: HashMap<String, SoaApiEntry> = self
            .soa_apis
            .iter()
            .filter(|e| e.service_name == stored.service_name)
            .map(|e| (e.api_name.clone(), e.value().clone()))
            .collect();
        let mcp_tools: HashMap<String, McpToolEntry> = self
            .mcp_tools
            .iter()
            .filter(|e| e.service_name == stored.service_name)
            .map(|e| (e.tool_name.clone(), e.value().clone()))
            .collect();
        ServiceRegistration {
            service_name: stored.service_name,
            realm: stored.realm,
            service_type: stored.service_type,
            capabilities: stored.capabilities,
            soa_apis,
            mcp_tools,
            status: stored.status,
            registered_at: stored.registered_at,
        }
    }

    // -----------------------------------------------------------------
    // Statistics, health, shutdown
    // -----------------------------------------------------------------

    /// Registry statistics.
    pub fn registry_status(&self) -> RegistryStatus {
        let services = self.services.read();
        let mut capabilities_by_realm: HashMap<String, usize> = HashMap::new();
        let mut total_capabilities = 0;
        let mut active_services = 0;
        for stored in services.values() {
            if stored.status == ServiceStatus::Active {
                active_services += 1;
            }
            for cap in &stored.capabilities {
                total_capabilities += 1;
                *capabilities_by_realm.entry(cap.realm.clone()).or_default() += 1;
            }
        }
        RegistryStatus {
            total_services: services.len(),
            active_services,
            total_capabilities,
            capabilities_by_realm,
            soa_api_count: self.soa_apis.len(),
            mcp_tool_count: self.mcp_tools.len(),
            route_count: self.routes.len(),
            last_updated: Utc::now(),
        }
    }

    /// Aggregate health check: healthy while no service is Degraded.
    pub fn run_health_check(&self) -> HealthReport {
        let services = self.services.read();
        let degraded_services: Vec<String> = services
            .values()
            .filter(|s| s.status == ServiceStatus::Degraded)
            .map(|s| s.service_name.clone())
            .collect();
        let report = HealthReport {
            healthy: degraded_services.is_empty(),
            total_services: services.len(),
            degraded_services,
            telemetry: self.telemetry.snapshot(),
            checked_at: Utc::now(),
        };
        drop(services);
        self.telemetry.record_health_metric(
            "registry_healthy",
            if report.healthy { 1.0 } else { 0.0 },
        );
        report
    }

    /// Clear every registry. The platform rebuilds all registrations at
    /// the next startup; nothing is persisted.
    pub fn shutdown(&self) {
        log::info!("shutting down service registry core");
        self.services.write().clear();
        self.soa_apis.clear();
        self.mcp_tools.clear();
        self.routes.clear();
        log::info!("service registry core shutdown complete");
    }
}

impl Default for ServiceRegistryCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait::async_trait]
    impl SoaHandler for EchoHandler {
        async fn call(
            &self,
            payload: Value,
        ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
            Ok(json!({"echo": payload}))
        }
    }

    struct FailingHandler;

    #[async_trait::async_trait]
    impl SoaHandler for FailingHandler {
        async fn call(
            &self,
            _payload: Value,
        ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
            Err("backend unavailable".into())
        }
    }

    fn registry() -> ServiceRegistryCore {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut config = CuratorConfig::default();
        config.telemetry_enabled = false;
        ServiceRegistryCore::with_config(config)
    }

    #[test]
    fn test_register_service_with_string_capabilities() {
        let core = registry();
        let registration = core
            .register_service(
                "Librarian",
                "smart_city",
                json!({"capabilities": ["search", "index"]}),
            )
            .unwrap();
        assert_eq!(registration.service_name, "Librarian");
        assert_eq!(registration.status, ServiceStatus::Active);
        assert_eq!(registration.capabilities.len(), 2);
        let search = &registration.capabilities[0];
        assert_eq!(search.interface_name(), "ILibrarian");
        assert!(search.contracts[&ContractKind::RestApi].endpoints.is_empty());
        assert!(!search.contracts.is_empty());
    }

    #[test]
    fn test_missing_service_name_is_hard_failure() {
        let core = registry();
        let err = core
            .register_service("", "smart_city", json!({"capabilities": ["x"]}))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidMetadata { .. }));
    }

    #[test]
    fn test_partial_success_keeps_well_formed_capabilities() {
        let core = registry();
        let registration = core
            .register_service(
                "Steward",
                "smart_city",
                json!({"capabilities": [
                    "lineage",
                    {"name": "quality"},
                    {"name": "profiling", "description": "Profile datasets"},
                    1234
                ]}),
            )
            .unwrap();
        assert_eq!(registration.capabilities.len(), 3);
    }

    #[test]
    fn test_reregistration_bumps_capability_versions() {
        let core = registry();
        let first = core
            .register_service("Librarian", "smart_city", json!({"capabilities": ["search"]}))
            .unwrap();
        assert_eq!(first.capabilities[0].version, "1.0.0");

        let second = core
            .register_service("Librarian", "smart_city", json!({"capabilities": ["search"]}))
            .unwrap();
        assert_eq!(second.capabilities[0].version, "1.0.1");
        assert_eq!(second.capabilities.len(), 1);
        // Still a single registration.
        assert_eq!(core.registry_status().total_services, 1);
    }

    #[test]
    fn test_capability_endpoints_become_routes() {
        let core = registry();
        core.register_service(
            "FileParser",
            "smart_city",
            json!({"capabilities": [{
                "name": "file_parsing",
                "endpoints": [{"path": "/api/v1/content-pillar/upload", "method": "POST"}]
            }]}),
        )
        .unwrap();
        let found = core.discover_routes(&RouteFilter {
            pillar: Some("content-pillar".to_string()),
            ..RouteFilter::default()
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].owning_service, "FileParser");
    }

    #[tokio::test]
    async fn test_soa_api_register_and_invoke() {
        let core = registry();
        assert!(core.register_soa_api(
            "Librarian",
            "search",
            "/api/v1/librarian/search",
            Arc::new(EchoHandler),
            HashMap::new(),
        ));
        let result = core
            .invoke_soa_api("Librarian", "search", json!({"q": "city plans"}))
            .await
            .unwrap();
        assert_eq!(result["echo"]["q"], "city plans");

        let err = core
            .invoke_soa_api("Librarian", "missing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SoaInvocationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_soa_handler_failure_is_wrapped() {
        let core = registry();
        core.register_soa_api("Nurse", "collect", "", Arc::new(FailingHandler), HashMap::new());
        let err = core.invoke_soa_api("Nurse", "collect", json!({})).await.unwrap_err();
        assert!(matches!(err, SoaInvocationError::Handler { .. }));
        assert!(err.to_string().contains("Nurse.collect"));
    }

    #[test]
    fn test_mcp_tool_global_namespace() {
        let core = registry();
        assert!(core.register_mcp_tool(
            "parse_file",
            json!({"wraps_service": "FileParser"}),
            HashMap::new(),
        ));
        // Same service overwrites.
        assert!(core.register_mcp_tool(
            "parse_file",
            json!({"wraps_service": "FileParser", "v": 2}),
            HashMap::new(),
        ));
        // Different service is refused.
        assert!(!core.register_mcp_tool(
            "parse_file",
            json!({"wraps_service": "Imposter"}),
            HashMap::new(),
        ));
        let entry = core.get_mcp_tool("parse_file").unwrap();
        assert_eq!(entry.service_name, "FileParser");
        assert_eq!(entry.tool_definition["v"], 2);
    }

    #[test]
    fn test_deregister_cascades() {
        let core = registry();
        core.register_service(
            "FileParser",
            "smart_city",
            json!({"capabilities": [{
                "name": "file_parsing",
                "endpoints": ["/api/v1/content-pillar/upload"]
            }]}),
        )
        .unwrap();
        core.register_soa_api(
            "FileParser",
            "parse",
            "/api/v1/content-pillar/parse",
            Arc::new(EchoHandler),
            HashMap::new(),
        );
        core.register_mcp_tool(
            "parse_file",
            json!({"wraps_service": "FileParser"}),
            HashMap::new(),
        );

        assert!(core.deregister_service("FileParser"));
        assert!(core.get_service("FileParser").is_none());
        assert!(core.get_soa_api("FileParser", "parse").is_none());
        assert!(core.get_mcp_tool("parse_file").is_none());
        assert!(core.discover_routes(&RouteFilter::default()).is_empty());
        // Idempotent.
        assert!(!core.deregister_service("FileParser"));
    }

    #[test]
    fn test_registry_status_counts() {
        let core = registry();
        core.register_service("A", "smart_city", json!({"capabilities": ["one", "two"]}))
            .unwrap();
        core.register_service("B", "agentic", json!({"capabilities": ["three"]}))
            .unwrap();
        core.update_service_status("B", ServiceStatus::Degraded);

        let status = core.registry_status();
        assert_eq!(status.total_services, 2);
        assert_eq!(status.active_services, 1);
        assert_eq!(status.total_capabilities, 3);
        assert_eq!(status.capabilities_by_realm["smart_city"], 2);
        assert_eq!(status.capabilities_by_realm["agentic"], 1);

        let health = core.run_health_check();
        assert!(!health.healthy);
        assert_eq!(health.degraded_services, vec!["B".to_string()]);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let core = registry();
        core.register_service("A", "smart_city", json!({"capabilities": ["one"]}))
            .unwrap();
        core.register_mcp_tool("t", json!({}), HashMap::new());
        core.shutdown();
        assert_eq!(core.registry_status().total_services, 0);
        assert!(core.list_mcp_tools().is_empty());
    }

    #[test]
    fn test_concurrent_registrations_never_interleave() {
        let core = Arc::new(registry());
        let mut handles = Vec::new();
        for i in 0..8 {
            let core = Arc::clone(&core);
            handles.push(std::thread::spawn(move || {
                for j in 0..10 {
                    core.register_service(
                        &format!("Service{i}"),
                        "smart_city",
                        json!({"capabilities": [format!("cap{j}")]}),
                    )
                    .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let status = core.registry_status();
        assert_eq!(status.total_services, 8);
        // Last write per service wins; each ends with exactly one capability.
        assert_eq!(status.total_capabilities, 8);
    }
}
