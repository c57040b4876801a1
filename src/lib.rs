//! # Curator — capability registry and discovery core
//!
//! The central registry of the Symphainy platform. Services register
//! themselves, their capabilities, SOA APIs, and MCP tools here;
//! dependent subsystems discover collaborators through the read-side
//! [`discovery::DiscoveryApi`]; the bootstrap orchestrator drives
//! dependency-ordered startup through the
//! [`lifecycle::LifecycleCoordinator`].
//!
//! Everything is in-memory and in-process: registries expose, the
//! foundation creates, and a restart rebuilds the whole picture from
//! live registrations (and optional YAML manifests). There is no
//! network surface and no persistence.
//!
//! ```
//! use curator::registry::ServiceRegistryCore;
//! use curator::discovery::DiscoveryApi;
//! use std::sync::Arc;
//!
//! let core = Arc::new(ServiceRegistryCore::new());
//! core.register_service(
//!     "Librarian",
//!     "smart_city",
//!     serde_json::json!({"capabilities": ["search", "index"]}),
//! )
//! .unwrap();
//!
//! let discovery = DiscoveryApi::new(core);
//! assert_eq!(discovery.discover_by_capability("search").len(), 1);
//! ```

pub mod capability;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod lifecycle;
pub mod registry;
pub mod routes;
pub mod telemetry;
pub mod validation;

pub use capability::{CapabilityDefinition, Contract, ContractKind};
pub use config::CuratorConfig;
pub use discovery::DiscoveryApi;
pub use errors::{
    DependencyOrderViolation, RegistrationError, SoaInvocationError, ValidationError,
};
pub use lifecycle::{LifecycleCoordinator, OverallStatus, SubsystemState};
pub use registry::{ServiceRegistration, ServiceRegistryCore, ServiceStatus, SoaHandler};
pub use routes::{HttpMethod, RouteEntry, RouteFilter, RouteRegistry};
pub use validation::{validate_service_metadata, ValidationResult};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
