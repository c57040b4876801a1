//! Capability model — the normalized shape of registered functionality.
//!
//! A capability is a named unit of functionality a service exposes, with
//! one or more invocation contracts (SOA API, REST endpoint, MCP tool).
//! Heterogeneous registration payloads from independently-built services
//! are funneled through [`normalize`] so that partial inputs still
//! produce valid, queryable records.

pub mod definition;
pub mod normalize;

pub use definition::{
    bump_patch_version, CapabilityDefinition, Contract, ContractKind, EndpointSpec,
    DEFAULT_VERSION,
};
pub use normalize::{normalize, normalize_all, NormalizeOutcome};
