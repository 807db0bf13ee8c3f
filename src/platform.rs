//! The opaque collaborator surface the orchestrator drives: device and
//! console connection, load-option execution, the hotkey trigger, and the
//! platform extension hooks. One trait, so embedders implement a single
//! object and tests can record every call in order.

use crate::console::ConsoleClass;
use crate::option::{ExecutionError, LoadOption};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerWait {
    Fired,
    TimedOut,
}

pub trait BootPlatform {
    fn connect_console(&mut self, class: ConsoleClass);
    fn connect_all_default_consoles(&mut self);
    fn connect_all_drivers(&mut self);
    fn disconnect_all_drivers(&mut self);

    /// Transfers control to the option. Returning at all means the boot came
    /// back; the outcome says how.
    fn execute(&mut self, option: &LoadOption) -> Result<(), ExecutionError>;

    /// Whether a hotkey trigger handle exists this cycle. When absent the
    /// countdown cannot be pre-empted.
    fn has_hotkey_trigger(&self) -> bool;
    fn wait_for_trigger(&mut self, timeout: Duration) -> TriggerWait;

    /// Non-blocking read-and-discard of already-pending input, so a hotkey
    /// surfaced via input polling is not starved during the countdown.
    fn drain_pending_input(&mut self);

    /// Plain sleep used for the triggerless countdown tick. A seam so hosted
    /// tests do not stall.
    fn sleep(&mut self, interval: Duration);

    // Extension hooks. No return value is consumed by the core.
    fn before_console(&mut self) {}
    fn after_console(&mut self) {}
    fn wait_tick(&mut self, _seconds_remaining: u16) {}
    fn run_hotkey_boot(&mut self) {}
    fn unable_to_boot(&mut self) {}
}
