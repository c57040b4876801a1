//! Lightweight in-process telemetry for registry operations.
//!
//! Every registry operation records an outcome counter and health
//! metrics feed the aggregate health check. Recording is cheap (a short
//! mutex around two maps) and can be opted out of entirely via
//! `CURATOR_TELEMETRY_OPT_OUT`.
//!
//! The recorder is constructed and injected, never a process-wide
//! global, so isolated registry instances in tests do not share state.

use std::collections::HashMap;
use std::env;

use parking_lot::Mutex;

/// Success/failure counters for one named operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct OperationStats {
    pub success: u64,
    pub failure: u64,
}

/// Point-in-time copy of everything recorded so far.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TelemetrySnapshot {
    pub operations: HashMap<String, OperationStats>,
    pub health_metrics: HashMap<String, f64>,
}

/// Operation and health-metric recorder.
#[derive(Debug, Default)]
pub struct TelemetryRecorder {
    enabled: bool,
    operations: Mutex<HashMap<String, OperationStats>>,
    health_metrics: Mutex<HashMap<String, f64>>,
}

impl TelemetryRecorder {
    /// Create a recorder, honoring `CURATOR_TELEMETRY_OPT_OUT`.
    pub fn new() -> Self {
        Self {
            enabled: !telemetry_opted_out(),
            ..Self::default()
        }
    }

    /// Create a recorder that never records. Used by opted-out hosts and
    /// by tests that do not assert on telemetry.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count one outcome of the named operation.
    pub fn record_operation(&self, operation: &str, success: bool) {
        if !self.enabled {
            return;
        }
        let mut operations = self.operations.lock();
        let stats = operations.entry(operation.to_string()).or_default();
        if success {
            stats.success += 1;
        } else {
            stats.failure += 1;
        }
    }

    /// Record a gauge-style health metric (last write wins).
    pub fn record_health_metric(&self, metric: &str, value: f64) {
        if !self.enabled {
            return;
        }
        self.health_metrics.lock().insert(metric.to_string(), value);
    }

    /// Copy out everything recorded so far.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            operations: self.operations.lock().clone(),
            health_metrics: self.health_metrics.lock().clone(),
        }
    }
}

/// Check the telemetry opt-out environment variable.
fn telemetry_opted_out() -> bool {
    matches!(
        env::var("CURATOR_TELEMETRY_OPT_OUT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str(),
        "true" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let recorder = TelemetryRecorder {
            enabled: true,
            ..TelemetryRecorder::default()
        };
        recorder.record_operation("register_service", true);
        recorder.record_operation("register_service", true);
        recorder.record_operation("register_service", false);
        recorder.record_health_metric("services_active", 2.0);

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.operations["register_service"].success, 2);
        assert_eq!(snapshot.operations["register_service"].failure, 1);
        assert_eq!(snapshot.health_metrics["services_active"], 2.0);
    }

    #[test]
    fn test_disabled_recorder_records_nothing() {
        let recorder = TelemetryRecorder::disabled();
        recorder.record_operation("register_service", true);
        recorder.record_health_metric("services_active", 1.0);
        let snapshot = recorder.snapshot();
        assert!(snapshot.operations.is_empty());
        assert!(snapshot.health_metrics.is_empty());
    }
}
