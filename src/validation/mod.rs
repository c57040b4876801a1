//! Validation engine — the gate in front of all registration traffic.
//!
//! Deliberately permissive: every previously observed legacy payload
//! shape must pass, while structurally nonsensical input (wrong types,
//! missing service name) is rejected. Validation never panics and never
//! returns `Err`; it reports through [`ValidationResult`] so callers can
//! choose to log-and-continue or hard-fail.
//!
//! Nested capability structure is validated during normalization
//! ([`crate::capability::normalize`]), not here — this module only
//! checks the top-level envelope.

mod engine;

pub use engine::{
    is_identifying_field, validate_capability_structure, validate_service_metadata,
    ValidationResult, KNOWN_REALMS,
};
