use crate::error::SerializationError;
use crate::telemetry::CycleMetrics;
use serde::Serialize;

const HALT_SCHEMA_VERSION: u16 = 1;

/// Which gate ended the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HaltGate {
    /// The boot list scan completed a pass with zero successes and the
    /// fallback path also returned.
    BootListExhausted,
    /// A one-shot recovery request from the previous OS session pre-empted
    /// the interactive boot logic.
    RecoveryRequested,
    /// The embedder-configured scan cap tripped; a deviation from the
    /// uncapped reference behaviour.
    ScanCapReached,
}

/// Serializable explanation of how a cycle reached its terminal state.
/// Built once, at the halt transition.
#[derive(Debug, Clone, Serialize)]
pub struct HaltReport {
    pub schema_version: u16,
    pub gate: HaltGate,
    pub recovery_list_used: bool,
    pub built_in_fallback_used: bool,
    pub metrics: CycleMetrics,
}

impl HaltReport {
    pub fn new(gate: HaltGate, recovery_list_used: bool, metrics: CycleMetrics) -> Self {
        let built_in_fallback_used = metrics.fallback_synthesized > 0;
        Self {
            schema_version: HALT_SCHEMA_VERSION,
            gate,
            recovery_list_used,
            built_in_fallback_used,
            metrics,
        }
    }

    pub fn to_json(&self) -> Result<String, SerializationError> {
        serde_json::to_string(self).map_err(SerializationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_schema_version() {
        let mut metrics = CycleMetrics::default();
        metrics.record_fallback_synthesized();
        let report = HaltReport::new(HaltGate::BootListExhausted, false, metrics);
        assert!(report.built_in_fallback_used);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"schema_version\":1"));
        assert!(json.contains("BootListExhausted"));
    }
}
