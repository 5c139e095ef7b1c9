//! Degradation telemetry.
//!
//! Aggregation entry points swallow their own errors so the dashboard
//! renders partial data instead of crashing. That policy is deliberate, but
//! it must stay observable: every contained error is counted here per
//! operation in addition to being logged, so an empty dashboard can be told
//! apart from an empty classroom.

use std::collections::HashMap;
use std::sync::RwLock;

use log::error;

#[derive(Default)]
pub struct Telemetry {
    degraded: RwLock<HashMap<&'static str, u64>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one contained failure for `operation` and logs it.
    pub fn record_degraded(&self, operation: &'static str, err: &dyn std::fmt::Display) {
        error!(target: "aggregation", "{operation} degraded to empty result: {err}");
        let mut degraded = self.degraded.write().expect("telemetry lock poisoned");
        *degraded.entry(operation).or_insert(0) += 1;
    }

    /// Contained-failure count for one operation.
    pub fn degraded_count(&self, operation: &str) -> u64 {
        let degraded = self.degraded.read().expect("telemetry lock poisoned");
        degraded.get(operation).copied().unwrap_or(0)
    }

    /// Snapshot of all counters, for surfacing in a status panel.
    pub fn snapshot(&self) -> HashMap<&'static str, u64> {
        self.degraded.read().expect("telemetry lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_operation() {
        let telemetry = Telemetry::new();
        assert_eq!(telemetry.degraded_count("teacher_courses"), 0);

        telemetry.record_degraded("teacher_courses", &"boom");
        telemetry.record_degraded("teacher_courses", &"boom again");
        telemetry.record_degraded("course_stats", &"boom");

        assert_eq!(telemetry.degraded_count("teacher_courses"), 2);
        assert_eq!(telemetry.degraded_count("course_stats"), 1);
        assert_eq!(telemetry.snapshot().len(), 2);
    }
}
