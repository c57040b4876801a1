//! Lifecycle coordinator — dependency-ordered subsystem startup.
//!
//! The platform's foundations initialize in a strict order
//! (infrastructure adapters, infrastructure abstractions, registries,
//! capability registration, communication, realm services). The
//! coordinator enforces that order through a declared dependency graph
//! and reports aggregate readiness. Initializing out of order is a
//! bootstrap bug and fails fast; the coordinator never retries on its
//! own.

mod coordinator;

pub use self::coordinator::{
    InitStep, LifecycleCoordinator, OverallStatus, SubsystemState, PLATFORM_SUBSYSTEMS,
};
