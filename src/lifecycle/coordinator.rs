//! The lifecycle coordinator proper.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::errors::DependencyOrderViolation;

/// State of one subsystem in the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemState {
    Pending,
    Initializing,
    Ready,
    Failed,
}

impl std::fmt::Display for SubsystemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One completed transition in the monotonic sequence log.
#[derive(Debug, Clone, Serialize)]
pub struct InitStep {
    /// Monotonic sequence number, starting at 1.
    pub sequence: u64,
    pub subsystem: String,
    pub state: SubsystemState,
    pub at: DateTime<Utc>,
}

/// Aggregate readiness report.
#[derive(Debug, Clone, Serialize)]
pub struct OverallStatus {
    /// True when every subsystem is Ready.
    pub ready: bool,
    pub failed: Vec<String>,
    /// Subsystems still Pending or Initializing, in registration order.
    pub pending: Vec<String>,
}

/// The documented platform startup order, as (name, dependencies) pairs.
pub const PLATFORM_SUBSYSTEMS: &[(&str, &[&str])] = &[
    ("infrastructure_adapters", &[]),
    ("infrastructure_abstractions", &["infrastructure_adapters"]),
    ("registries", &["infrastructure_abstractions"]),
    ("capability_registration", &["registries"]),
    ("communication", &["capability_registration"]),
    ("realm_services", &["communication"]),
];

#[derive(Debug, Clone)]
struct Subsystem {
    name: String,
    depends_on: Vec<String>,
    state: SubsystemState,
    failure_reason: Option<String>,
}

#[derive(Debug, Default)]
struct LifecycleState {
    /// Registration order preserved; the set is small (a handful of
    /// foundations), so linear lookup by name is fine.
    subsystems: Vec<Subsystem>,
    sequence_log: Vec<InitStep>,
    next_sequence: u64,
    /// Set once overall readiness is reported; cleared only by reset.
    frozen: bool,
}

impl LifecycleState {
    fn find(&self, name: &str) -> Option<usize> {
        self.subsystems.iter().position(|s| s.name == name)
    }

    fn log_step(&mut self, subsystem: &str, state: SubsystemState) {
        self.next_sequence += 1;
        self.sequence_log.push(InitStep {
            sequence: self.next_sequence,
            subsystem: subsystem.to_string(),
            state,
            at: Utc::now(),
        });
    }
}

/// Coordinator enforcing the subsystem initialization order.
///
/// Constructed once at process start and handed to the bootstrap
/// orchestrator; retries after a failure are the orchestrator's call
/// (typically a [`LifecycleCoordinator::reset`] and a fresh pass).
#[derive(Debug, Default)]
pub struct LifecycleCoordinator {
    state: RwLock<LifecycleState>,
}

impl LifecycleCoordinator {
    /// An empty coordinator; subsystems are declared by the caller.
    pub fn new() -> Self {
        Self::default()
    }

    /// A coordinator pre-loaded with the documented platform startup
    /// order ([`PLATFORM_SUBSYSTEMS`]).
    pub fn with_platform_defaults() -> Self {
        let coordinator = Self::new();
        for (name, deps) in PLATFORM_SUBSYSTEMS {
            coordinator
                .register_subsystem(name, deps)
                .expect("platform defaults are registered in dependency order");
        }
        coordinator
    }

    /// Declare a subsystem and its dependencies. Dependencies must have
    /// been declared first; re-declaring an existing subsystem is a
    /// no-op.
    pub fn register_subsystem(
        &self,
        name: &str,
        depends_on: &[&str],
    ) -> Result<(), DependencyOrderViolation> {
        let mut state = self.state.write();
        if state.find(name).is_some() {
            return Ok(());
        }
        for dep in depends_on {
            if state.find(dep).is_none() {
                return Err(DependencyOrderViolation::UnknownSubsystem {
                    name: dep.to_string(),
                });
            }
        }
        state.subsystems.push(Subsystem {
            name: name.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            state: SubsystemState::Pending,
            failure_reason: None,
        });
        Ok(())
    }

    /// Move a subsystem from Pending to Initializing. Fails fast with
    /// [`DependencyOrderViolation`] when any declared dependency is not
    /// Ready; re-entering Initializing is a no-op.
    pub fn begin_initializing(&self, name: &str) -> Result<(), DependencyOrderViolation> {
        let mut state = self.state.write();
        Self::check_gate(&state, name)?;
        let index = state.find(name).ok_or_else(|| {
            DependencyOrderViolation::UnknownSubsystem {
                name: name.to_string(),
            }
        })?;
        if state.subsystems[index].state == SubsystemState::Pending {
            state.subsystems[index].state = SubsystemState::Initializing;
            state.log_step(name, SubsystemState::Initializing);
            log::info!("subsystem {name} initializing");
        }
        Ok(())
    }

    /// Mark a subsystem Ready. Idempotent: re-marking an already-Ready
    /// subsystem is a no-op, not an error. Dependencies must be Ready.
    pub fn mark_ready(&self, name: &str) -> Result<(), DependencyOrderViolation> {
        let mut state = self.state.write();
        let index = state.find(name).ok_or_else(|| {
            DependencyOrderViolation::UnknownSubsystem {
                name: name.to_string(),
            }
        })?;
        if state.subsystems[index].state == SubsystemState::Ready {
            return Ok(());
        }
        Self::check_gate(&state, name)?;
        state.subsystems[index].state = SubsystemState::Ready;
        state.subsystems[index].failure_reason = None;
        state.log_step(name, SubsystemState::Ready);
        log::info!("subsystem {name} ready");

        if state
            .subsystems
            .iter()
            .all(|s| s.state == SubsystemState::Ready)
        {
            state.frozen = true;
            log::info!("all subsystems ready; lifecycle state frozen");
        }
        Ok(())
    }

    /// Mark a subsystem Failed and cascade the failure to every
    /// subsystem that depends on it, directly or transitively.
    pub fn mark_failed(
        &self,
        name: &str,
        reason: &str,
    ) -> Result<(), DependencyOrderViolation> {
        let mut state = self.state.write();
        if state.frozen {
            return Err(DependencyOrderViolation::Frozen);
        }
        let index = state.find(name).ok_or_else(|| {
            DependencyOrderViolation::UnknownSubsystem {
                name: name.to_string(),
            }
        })?;
        state.subsystems[index].state = SubsystemState::Failed;
        state.subsystems[index].failure_reason = Some(reason.to_string());
        state.log_step(name, SubsystemState::Failed);
        log::error!("subsystem {name} failed: {reason}");

        // Cascade to transitive dependents. Repeated sweeps settle in at
        // most subsystem-count passes on this small graph.
        let mut newly_failed: Vec<String> = Vec::new();
        loop {
            let failed_names: Vec<String> = state
                .subsystems
                .iter()
                .filter(|s| s.state == SubsystemState::Failed)
                .map(|s| s.name.clone())
                .collect();
            let mut changed = false;
            for subsystem in state.subsystems.iter_mut() {
                if subsystem.state != SubsystemState::Failed
                    && subsystem
                        .depends_on
                        .iter()
                        .any(|dep| failed_names.contains(dep))
                {
                    subsystem.state = SubsystemState::Failed;
                    subsystem.failure_reason =
                        Some(format!("dependency failure cascaded from {name}"));
                    log::error!(
                        "subsystem {} failed: dependency failure cascaded from {name}",
                        subsystem.name
                    );
                    newly_failed.push(subsystem.name.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        for cascade in newly_failed {
            state.log_step(&cascade, SubsystemState::Failed);
        }
        Ok(())
    }

    /// Aggregate readiness.
    pub fn overall_status(&self) -> OverallStatus {
        let state = self.state.read();
        let failed: Vec<String> = state
            .subsystems
            .iter()
            .filter(|s| s.state == SubsystemState::Failed)
            .map(|s| s.name.clone())
            .collect();
        let pending: Vec<String> = state
            .subsystems
            .iter()
            .filter(|s| {
                matches!(
                    s.state,
                    SubsystemState::Pending | SubsystemState::Initializing
                )
            })
            .map(|s| s.name.clone())
            .collect();
        OverallStatus {
            ready: !state.subsystems.is_empty() && failed.is_empty() && pending.is_empty(),
            failed,
            pending,
        }
    }

    /// Current state of one subsystem.
    pub fn subsystem_state(&self, name: &str) -> Option<SubsystemState> {
        let state = self.state.read();
        state.find(name).map(|i| state.subsystems[i].state)
    }

    /// The monotonic log of completed transitions.
    pub fn sequence_log(&self) -> Vec<InitStep> {
        self.state.read().sequence_log.clone()
    }

    /// Full restart: every subsystem back to Pending, the sequence log
    /// cleared, the frozen flag lifted. The dependency graph survives.
    pub fn reset(&self) {
        let mut state = self.state.write();
        for subsystem in state.subsystems.iter_mut() {
            subsystem.state = SubsystemState::Pending;
            subsystem.failure_reason = None;
        }
        state.sequence_log.clear();
        state.next_sequence = 0;
        state.frozen = false;
        log::info!("lifecycle state reset");
    }

    /// Shared dependency gate: frozen state and not-Ready dependencies
    /// both block a transition toward Ready.
    fn check_gate(state: &LifecycleState, name: &str) -> Result<(), DependencyOrderViolation> {
        if state.frozen {
            return Err(DependencyOrderViolation::Frozen);
        }
        let index = state.find(name).ok_or_else(|| {
            DependencyOrderViolation::UnknownSubsystem {
                name: name.to_string(),
            }
        })?;
        for dep in &state.subsystems[index].depends_on {
            let dep_state = state
                .find(dep)
                .map(|i| state.subsystems[i].state)
                .unwrap_or(SubsystemState::Pending);
            if dep_state != SubsystemState::Ready {
                return Err(DependencyOrderViolation::DependenciesNotReady {
                    name: name.to_string(),
                    dependency: dep.clone(),
                    dependency_state: dep_state.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> LifecycleCoordinator {
        let coordinator = LifecycleCoordinator::new();
        coordinator.register_subsystem("a", &[]).unwrap();
        coordinator.register_subsystem("b", &["a"]).unwrap();
        coordinator.register_subsystem("c", &["b"]).unwrap();
        coordinator
    }

    #[test]
    fn test_out_of_order_ready_is_a_violation() {
        let coordinator = chain();
        let err = coordinator.mark_ready("b").unwrap_err();
        assert!(matches!(
            err,
            DependencyOrderViolation::DependenciesNotReady { ref dependency, .. }
                if dependency == "a"
        ));

        coordinator.mark_ready("a").unwrap();
        coordinator.mark_ready("b").unwrap();
        coordinator.mark_ready("c").unwrap();
        let status = coordinator.overall_status();
        assert!(status.ready);
        assert!(status.failed.is_empty());
        assert!(status.pending.is_empty());
    }

    #[test]
    fn test_mark_ready_is_idempotent() {
        let coordinator = chain();
        coordinator.mark_ready("a").unwrap();
        coordinator.mark_ready("a").unwrap();
        assert_eq!(
            coordinator.sequence_log().len(),
            1,
            "re-marking must not append to the log"
        );
    }

    #[test]
    fn test_cascading_failure() {
        let coordinator = chain();
        coordinator.mark_failed("a", "disk on fire").unwrap();
        let status = coordinator.overall_status();
        assert!(!status.ready);
        assert_eq!(status.failed, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cascade_only_hits_dependents() {
        let coordinator = LifecycleCoordinator::new();
        coordinator.register_subsystem("a", &[]).unwrap();
        coordinator.register_subsystem("b", &["a"]).unwrap();
        coordinator.register_subsystem("solo", &[]).unwrap();
        coordinator.mark_failed("a", "boom").unwrap();
        let status = coordinator.overall_status();
        assert_eq!(status.failed, vec!["a", "b"]);
        assert_eq!(status.pending, vec!["solo"]);
    }

    #[test]
    fn test_begin_initializing_gates_on_dependencies() {
        let coordinator = chain();
        assert!(coordinator.begin_initializing("b").is_err());
        coordinator.mark_ready("a").unwrap();
        coordinator.begin_initializing("b").unwrap();
        assert_eq!(
            coordinator.subsystem_state("b"),
            Some(SubsystemState::Initializing)
        );
        coordinator.mark_ready("b").unwrap();
    }

    #[test]
    fn test_unknown_subsystem() {
        let coordinator = chain();
        assert!(matches!(
            coordinator.mark_ready("ghost").unwrap_err(),
            DependencyOrderViolation::UnknownSubsystem { .. }
        ));
        assert!(coordinator.register_subsystem("d", &["ghost"]).is_err());
    }

    #[test]
    fn test_frozen_after_overall_ready_until_reset() {
        let coordinator = LifecycleCoordinator::new();
        coordinator.register_subsystem("a", &[]).unwrap();
        coordinator.mark_ready("a").unwrap();
        assert!(coordinator.overall_status().ready);
        assert!(matches!(
            coordinator.mark_failed("a", "late failure").unwrap_err(),
            DependencyOrderViolation::Frozen
        ));

        coordinator.reset();
        assert!(!coordinator.overall_status().ready);
        assert_eq!(coordinator.subsystem_state("a"), Some(SubsystemState::Pending));
        coordinator.mark_ready("a").unwrap();
        assert!(coordinator.overall_status().ready);
    }

    #[test]
    fn test_platform_defaults_order() {
        let coordinator = LifecycleCoordinator::with_platform_defaults();
        // Skipping straight to the communication layer must fail.
        assert!(coordinator.mark_ready("communication").is_err());
        for (name, _) in PLATFORM_SUBSYSTEMS {
            coordinator.mark_ready(name).unwrap();
        }
        assert!(coordinator.overall_status().ready);
        let log = coordinator.sequence_log();
        assert_eq!(log.len(), PLATFORM_SUBSYSTEMS.len());
        assert_eq!(log[0].subsystem, "infrastructure_adapters");
        assert!(log.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    #[test]
    fn test_empty_coordinator_is_not_ready() {
        let coordinator = LifecycleCoordinator::new();
        assert!(!coordinator.overall_status().ready);
    }
}
