//! Registration records and handler contracts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::CapabilityDefinition;
use crate::telemetry::TelemetrySnapshot;

/// Lifecycle status of a registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Registration accepted, validation in flight.
    Registering,
    /// Validated and discoverable.
    Active,
    /// A later health check failed; excluded from default discovery.
    Degraded,
    /// Explicitly deregistered or shut down.
    Removed,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registering => "registering",
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Removed => "removed",
        };
        f.write_str(name)
    }
}

/// Handler for an invocable SOA API.
///
/// Registered alongside the API entry and awaited by
/// [`crate::registry::ServiceRegistryCore::invoke_soa_api`]. Handlers
/// must be cheap to clone behind an `Arc` and safe to call from any
/// task.
#[async_trait]
pub trait SoaHandler: Send + Sync {
    /// Invoke the API with a JSON payload.
    async fn call(
        &self,
        payload: Value,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// A registered SOA API, keyed `"{service_name}.{api_name}"`.
#[derive(Clone, Serialize)]
pub struct SoaApiEntry {
    pub service_name: String,
    pub api_name: String,
    /// Endpoint path the API is served on.
    pub endpoint: String,
    /// The in-process handler. Absent for entries seeded from manifests.
    #[serde(skip)]
    pub handler: Option<Arc<dyn SoaHandler>>,
    pub metadata: HashMap<String, Value>,
    pub registered_at: DateTime<Utc>,
}

impl SoaApiEntry {
    /// Registry key: `"{service_name}.{api_name}"`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.service_name, self.api_name)
    }
}

impl fmt::Debug for SoaApiEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoaApiEntry")
            .field("service_name", &self.service_name)
            .field("api_name", &self.api_name)
            .field("endpoint", &self.endpoint)
            .field("has_handler", &self.handler.is_some())
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// A registered MCP tool. Tool names are unique platform-wide.
#[derive(Debug, Clone, Serialize)]
pub struct McpToolEntry {
    pub tool_name: String,
    /// Full tool definition (schema, endpoint, handler hints).
    pub tool_definition: Value,
    pub metadata: HashMap<String, Value>,
    /// The service this tool wraps, when declared.
    pub service_name: String,
    pub registered_at: DateTime<Utc>,
}

/// Snapshot of one registered service, as handed out by the read side.
///
/// Assembled from the registry's internal stores at read time, so a
/// snapshot never shows a partially-applied registration.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRegistration {
    pub service_name: String,
    pub realm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// Capabilities in registration order.
    pub capabilities: Vec<CapabilityDefinition>,
    pub soa_apis: HashMap<String, SoaApiEntry>,
    pub mcp_tools: HashMap<String, McpToolEntry>,
    pub status: ServiceStatus,
    pub registered_at: DateTime<Utc>,
}

impl ServiceRegistration {
    /// Whether the service exposes a capability with this name.
    pub fn has_capability(&self, capability_name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.capability_name == capability_name)
    }
}

/// Registry statistics for operators and health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub total_services: usize,
    pub active_services: usize,
    pub total_capabilities: usize,
    pub capabilities_by_realm: HashMap<String, usize>,
    pub soa_api_count: usize,
    pub mcp_tool_count: usize,
    pub route_count: usize,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate health snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// True when no registered service is Degraded.
    pub healthy: bool,
    pub total_services: usize,
    pub degraded_services: Vec<String>,
    pub telemetry: TelemetrySnapshot,
    pub checked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UppercaseHandler;

    #[async_trait]
    impl SoaHandler for UppercaseHandler {
        async fn call(
            &self,
            payload: Value,
        ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
            let text = payload
                .get("text")
                .and_then(Value::as_str)
                .ok_or("payload missing 'text'")?;
            Ok(Value::String(text.to_uppercase()))
        }
    }

    #[test]
    fn test_handler_trait_is_directly_invocable() {
        let handler = UppercaseHandler;
        let result =
            tokio_test::block_on(handler.call(serde_json::json!({"text": "ready"}))).unwrap();
        assert_eq!(result, Value::String("READY".to_string()));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ServiceStatus::Active.to_string(), "active");
        assert_eq!(ServiceStatus::Degraded.to_string(), "degraded");
    }

    #[test]
    fn test_soa_entry_key_and_debug_hides_handler() {
        let entry = SoaApiEntry {
            service_name: "Librarian".into(),
            api_name: "search".into(),
            endpoint: "/api/v1/librarian/search".into(),
            handler: None,
            metadata: HashMap::new(),
            registered_at: Utc::now(),
        };
        assert_eq!(entry.key(), "Librarian.search");
        let debug = format!("{entry:?}");
        assert!(debug.contains("has_handler: false"));
    }
}
