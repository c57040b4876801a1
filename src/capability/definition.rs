//! Capability definition — the unit of registrable service functionality.
//!
//! A `CapabilityDefinition` is what the registry stores and what the
//! discovery API hands back: who provides it, how it is invoked
//! (contracts), and how it is named toward the rest of the platform
//! (protocol name, semantic mapping).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default semantic version assigned to freshly registered capabilities.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// A registered capability.
///
/// Immutable once registered, except for the version bump applied when
/// the owning service re-registers (hot reload / restart).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    /// Capability name, unique per service (e.g. "search").
    pub capability_name: String,

    /// Name of the service providing this capability.
    pub service_name: String,

    /// Identifies the structural contract the service implements
    /// (e.g. "LibrarianProtocol"). Checked by name at registration
    /// time, never by runtime attribute probing.
    pub protocol_name: String,

    /// Human-readable description.
    pub description: String,

    /// Logical domain/tenant grouping (e.g. "smart_city").
    pub realm: String,

    /// Invocation contracts, keyed by kind. Non-empty: a capability
    /// with no way to invoke it is invalid.
    pub contracts: HashMap<ContractKind, Contract>,

    /// Optional domain-facing naming map ("what the platform calls this").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_mapping: Option<HashMap<String, Value>>,

    /// Semantic version, bumped on re-registration.
    #[serde(default = "default_version")]
    pub version: String,

    /// Registration timestamp, auto-set.
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Invocation kinds a contract can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Service-to-service callable operation.
    SoaApi,
    /// HTTP endpoint(s).
    RestApi,
    /// Tool definition for agent/tool-calling consumption.
    McpTool,
}

impl ContractKind {
    /// Parse a contract-kind key as it appears in registration payloads.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "soa_api" => Some(Self::SoaApi),
            "rest_api" => Some(Self::RestApi),
            "mcp_tool" => Some(Self::McpTool),
            _ => None,
        }
    }

    /// The key used for this kind in registration payloads.
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::SoaApi => "soa_api",
            Self::RestApi => "rest_api",
            Self::McpTool => "mcp_tool",
        }
    }
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

/// A specific way to invoke a capability.
///
/// One flexible shape covers all kinds: REST contracts fill `endpoints`,
/// SOA contracts fill `api_name`/`endpoint`, MCP contracts fill
/// `tool_name`/`tool_definition` or `tools`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contract {
    /// Endpoint specs for route-bearing contracts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointSpec>,

    /// Tool names for MCP contracts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    /// SOA API name, when the contract is a single callable operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,

    /// Single endpoint path for SOA contracts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Tool name for MCP contracts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Full tool definition (schema, handler hints) for MCP contracts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_definition: Option<Value>,

    /// Contract-level metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Contract {
    /// A REST contract over the given endpoint specs.
    pub fn rest(endpoints: Vec<EndpointSpec>) -> Self {
        Self {
            endpoints,
            ..Self::default()
        }
    }

    /// An MCP contract over the given tool names.
    pub fn mcp(tools: Vec<String>) -> Self {
        Self {
            tools,
            ..Self::default()
        }
    }

    /// All endpoint paths this contract contributes, explicit `endpoint`
    /// included.
    pub fn endpoint_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.endpoints.iter().map(|e| e.path()).collect();
        if let Some(ep) = &self.endpoint {
            paths.push(ep.as_str());
        }
        paths
    }
}

/// An endpoint as declared in a registration payload: either a bare path
/// string or a detailed record with method/pillar metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointSpec {
    /// Bare path; the registry assumes POST (SOA invocation style).
    Path(String),
    /// Detailed endpoint record.
    Detailed {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pillar: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl EndpointSpec {
    /// The endpoint path.
    pub fn path(&self) -> &str {
        match self {
            Self::Path(p) => p,
            Self::Detailed { path, .. } => path,
        }
    }

    /// Declared HTTP method, if any.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { method, .. } => method.as_deref(),
        }
    }

    /// Declared pillar grouping, if any.
    pub fn pillar(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { pillar, .. } => pillar.as_deref(),
        }
    }
}

impl CapabilityDefinition {
    /// Create a definition with synthesized defaults for everything but
    /// the names. Contracts start with a single empty REST contract so
    /// the record is valid and queryable until the service fills it in.
    pub fn new(capability_name: impl Into<String>, service_name: impl Into<String>) -> Self {
        let capability_name = capability_name.into();
        let service_name = service_name.into();
        let mut contracts = HashMap::new();
        contracts.insert(ContractKind::RestApi, Contract::default());
        Self {
            protocol_name: format!("{service_name}Protocol"),
            description: format!("{service_name} service capability"),
            realm: "unknown".to_string(),
            contracts,
            semantic_mapping: None,
            version: DEFAULT_VERSION.to_string(),
            registered_at: Utc::now(),
            capability_name,
            service_name,
        }
    }

    /// Unique registry key: `"{service_name}.{capability_name}"`.
    pub fn capability_key(&self) -> String {
        format!("{}.{}", self.service_name, self.capability_name)
    }

    /// The synthesized interface name for this capability's service
    /// (e.g. "ILibrarian" for service "Librarian").
    pub fn interface_name(&self) -> String {
        synthesize_interface(&self.service_name)
    }

    /// Whether any contract contributes HTTP routes.
    pub fn has_route_contracts(&self) -> bool {
        self.contracts
            .values()
            .any(|c| !c.endpoint_paths().is_empty())
    }
}

/// Synthesize the interface name for a service: `"I" + service_name`.
pub(crate) fn synthesize_interface(service_name: &str) -> String {
    format!("I{service_name}")
}

/// Bump the patch component of a semver string. Unparseable versions
/// reset to [`DEFAULT_VERSION`].
pub fn bump_patch_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() == 3 {
        if let (Ok(major), Ok(minor), Ok(patch)) = (
            parts[0].parse::<u64>(),
            parts[1].parse::<u64>(),
            parts[2].parse::<u64>(),
        ) {
            return format!("{major}.{minor}.{}", patch + 1);
        }
    }
    DEFAULT_VERSION.to_string()
}
