//! Discovery API — the read-only query surface over the registry core.
//!
//! Dependent subsystems (the communication layer above all) find their
//! collaborators here without coupling to registration internals. Every
//! call copies a consistent snapshot out of the core, so discovery made
//! during bootstrap is never starved by a burst of concurrent
//! registrations and never observes a partially-applied write.
//!
//! Absent entities come back as `None` or an empty list, never as an
//! error: a service whose registration failed is simply not found.

use std::sync::Arc;

use crate::registry::{McpToolEntry, ServiceRegistration, ServiceRegistryCore, ServiceStatus, SoaApiEntry};
use crate::routes::{RouteEntry, RouteFilter};

/// Read-side handle over a shared registry core.
#[derive(Clone)]
pub struct DiscoveryApi {
    core: Arc<ServiceRegistryCore>,
}

impl DiscoveryApi {
    /// Wrap a registry core.
    pub fn new(core: Arc<ServiceRegistryCore>) -> Self {
        Self { core }
    }

    /// Look up one service by name, whatever its status.
    pub fn get_service(&self, service_name: &str) -> Option<ServiceRegistration> {
        self.core.get_service(service_name)
    }

    /// All Active services exposing a capability with this name, ordered
    /// by registration time ascending — the oldest, most established
    /// registrant first.
    pub fn discover_by_capability(&self, capability_name: &str) -> Vec<ServiceRegistration> {
        let mut services: Vec<ServiceRegistration> = self
            .core
            .snapshot_all()
            .into_iter()
            .filter(|s| s.status == ServiceStatus::Active && s.has_capability(capability_name))
            .collect();
        services.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.service_name.cmp(&b.service_name))
        });
        services
    }

    /// Active services, optionally filtered by realm. Degraded and
    /// Removed services are excluded.
    pub fn list_services(&self, realm: Option<&str>) -> Vec<ServiceRegistration> {
        let mut services: Vec<ServiceRegistration> = self
            .core
            .snapshot_all()
            .into_iter()
            .filter(|s| s.status == ServiceStatus::Active)
            .filter(|s| realm.is_none_or(|r| s.realm == r))
            .collect();
        services.sort_by(|a, b| a.service_name.cmp(&b.service_name));
        services
    }

    /// Discover tracked routes.
    pub fn discover_routes(&self, filter: &RouteFilter) -> Vec<RouteEntry> {
        self.core.discover_routes(filter)
    }

    /// Look up a SOA API for realm consumption.
    pub fn get_soa_api(&self, service_name: &str, api_name: &str) -> Option<SoaApiEntry> {
        self.core.get_soa_api(service_name, api_name)
    }

    /// List SOA APIs, optionally restricted to one service.
    pub fn list_soa_apis(&self, service_name: Option<&str>) -> Vec<SoaApiEntry> {
        self.core.list_soa_apis(service_name)
    }

    /// Look up an MCP tool for agent access.
    pub fn get_mcp_tool(&self, tool_name: &str) -> Option<McpToolEntry> {
        self.core.get_mcp_tool(tool_name)
    }

    /// List all MCP tools.
    pub fn list_mcp_tools(&self) -> Vec<McpToolEntry> {
        self.core.list_mcp_tools()
    }
}
