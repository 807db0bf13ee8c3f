//! Per-cycle counters. Reset at the start of every cycle and snapshotted
//! into the halt report, so an embedder can see what the machine actually
//! did on the way to its end state.

use crate::option::OptionType;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CycleMetrics {
    pub driver_attempts: u64,
    pub sysprep_attempts: u64,
    pub boot_attempts: u64,
    pub recovery_attempts: u64,
    pub boot_successes: u64,
    pub menu_handoffs: u64,
    pub scan_passes: u64,
    pub reconnect_cycles: u64,
    pub records_healed: u64,
    pub boot_next_consumed: u64,
    pub fallback_synthesized: u64,
}

impl CycleMetrics {
    pub fn record_attempt(&mut self, option_type: OptionType) {
        let counter = match option_type {
            OptionType::Driver => &mut self.driver_attempts,
            OptionType::SysPrep => &mut self.sysprep_attempts,
            OptionType::Boot => &mut self.boot_attempts,
            OptionType::PlatformRecovery => &mut self.recovery_attempts,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn record_success(&mut self, option_type: OptionType) {
        if option_type == OptionType::Boot {
            self.boot_successes = self.boot_successes.saturating_add(1);
        }
    }

    pub fn record_menu_handoff(&mut self) {
        self.menu_handoffs = self.menu_handoffs.saturating_add(1);
    }

    pub fn record_scan_pass(&mut self) {
        self.scan_passes = self.scan_passes.saturating_add(1);
    }

    pub fn record_reconnect_cycle(&mut self) {
        self.reconnect_cycles = self.reconnect_cycles.saturating_add(1);
    }

    pub fn record_healed(&mut self) {
        self.records_healed = self.records_healed.saturating_add(1);
    }

    pub fn record_boot_next_consumed(&mut self) {
        self.boot_next_consumed = self.boot_next_consumed.saturating_add(1);
    }

    pub fn record_fallback_synthesized(&mut self) {
        self.fallback_synthesized = self.fallback_synthesized.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_are_bucketed_by_type() {
        let mut metrics = CycleMetrics::default();
        metrics.record_attempt(OptionType::Driver);
        metrics.record_attempt(OptionType::Boot);
        metrics.record_attempt(OptionType::Boot);
        metrics.record_success(OptionType::Boot);
        metrics.record_success(OptionType::Driver); // only boot successes count
        assert_eq!(metrics.driver_attempts, 1);
        assert_eq!(metrics.boot_attempts, 2);
        assert_eq!(metrics.boot_successes, 1);
    }
}
