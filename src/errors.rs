//! Error types for the Curator registry core.
//!
//! Every error in this taxonomy is *returned*, never panicked across a
//! component boundary. The permissive validation path does not even use
//! these: it reports through [`crate::validation::ValidationResult`] so
//! callers can choose to log-and-continue or hard-fail.

use thiserror::Error;

/// Errors from capability normalization.
///
/// Carries human-readable reasons so registration callers can surface
/// them verbatim in logs and registration results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The raw capability payload is not a shape the normalizer accepts
    /// (string, list, or map), or no invocation contract could be
    /// synthesized from it.
    #[error("malformed capability input: {}", reasons.join("; "))]
    MalformedInput {
        /// Human-readable reasons for the rejection.
        reasons: Vec<String>,
    },

    /// A strictly required field is absent or empty.
    #[error("missing required field '{field}': {reason}")]
    MissingRequiredField {
        /// Name of the missing field.
        field: String,
        /// Why the field is required.
        reason: String,
    },
}

impl ValidationError {
    /// Shorthand for a single-reason [`ValidationError::MalformedInput`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reasons: vec![reason.into()],
        }
    }
}

/// Errors from the registry write paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The service metadata envelope failed validation.
    #[error("invalid service metadata: {}", errors.join("; "))]
    InvalidMetadata {
        /// Validation errors reported by the validation engine.
        errors: Vec<String>,
    },

    /// A (`path`, `method`) pair is already owned by a different service.
    /// Prevents silent route hijacking between domains.
    #[error("route {method} {path} is already owned by service '{owner}'")]
    ConflictingRoute {
        path: String,
        method: String,
        /// The service currently holding the route.
        owner: String,
    },

    /// An MCP tool name is already claimed by a different service. Tool
    /// names are unique platform-wide, unlike SOA APIs which are
    /// namespaced by service.
    #[error("MCP tool '{tool_name}' is already registered by service '{owner}'")]
    DuplicateToolName { tool_name: String, owner: String },
}

/// Fatal bootstrap-ordering error from the lifecycle coordinator.
///
/// Indicates a programming error in the bootstrap sequence, not a
/// transient condition; the coordinator never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyOrderViolation {
    /// The named subsystem was never registered with the coordinator.
    #[error("unknown subsystem '{name}'")]
    UnknownSubsystem { name: String },

    /// A declared dependency of the subsystem is not Ready yet.
    #[error("subsystem '{name}' cannot initialize: dependency '{dependency}' is {dependency_state}")]
    DependenciesNotReady {
        name: String,
        dependency: String,
        /// State the blocking dependency is currently in.
        dependency_state: String,
    },

    /// The lifecycle state is frozen after overall platform readiness;
    /// only an explicit reset may reopen it.
    #[error("lifecycle state is frozen after platform readiness; reset before re-initializing")]
    Frozen,
}

/// Errors from invoking a registered SOA API handler.
#[derive(Debug, Error)]
pub enum SoaInvocationError {
    /// No SOA API registered under the given `"{service}.{api}"` key.
    #[error("SOA API not found: {key}")]
    NotFound { key: String },

    /// The entry exists but carries no invocable handler (e.g. it was
    /// seeded from a manifest rather than registered in-process).
    #[error("SOA API '{key}' has no invocable handler")]
    NoHandler { key: String },

    /// The handler itself failed.
    #[error("handler for '{key}' failed: {source}")]
    Handler {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_joins_reasons() {
        let err = ValidationError::MalformedInput {
            reasons: vec!["not a map".into(), "no contracts".into()],
        };
        assert_eq!(
            err.to_string(),
            "malformed capability input: not a map; no contracts"
        );
    }

    #[test]
    fn test_conflicting_route_message_names_owner() {
        let err = RegistrationError::ConflictingRoute {
            path: "/api/v1/content-pillar/upload".into(),
            method: "POST".into(),
            owner: "FileParser".into(),
        };
        assert!(err.to_string().contains("FileParser"));
        assert!(err.to_string().contains("POST"));
    }
}
