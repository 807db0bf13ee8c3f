//! Console bring-up policy. Input connection is a single gate every
//! input-reading path goes through, so deferred-input platforms never see a
//! read before their "connect now" hook ran.

use crate::platform::BootPlatform;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleClass {
    Input,
    Output,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsolePolicy {
    /// Connect input, output, and error up front.
    #[default]
    EagerAll,
    /// Connect output and error now, defer input until the first read.
    OnDemandInput,
}

#[derive(Debug)]
pub struct ConsoleManager {
    policy: ConsolePolicy,
    input_connected: bool,
}

impl ConsoleManager {
    pub fn new(policy: ConsolePolicy) -> Self {
        Self {
            policy,
            input_connected: false,
        }
    }

    pub fn policy(&self) -> ConsolePolicy {
        self.policy
    }

    pub fn input_connected(&self) -> bool {
        self.input_connected
    }

    /// The console phase: what gets connected now depends on the policy.
    pub fn bring_up<P: BootPlatform>(&mut self, platform: &mut P) {
        match self.policy {
            ConsolePolicy::EagerAll => {
                platform.connect_all_default_consoles();
                self.input_connected = true;
            }
            ConsolePolicy::OnDemandInput => {
                platform.connect_console(ConsoleClass::Output);
                platform.connect_console(ConsoleClass::Error);
            }
        }
        info!("event=console_bring_up policy={:?}", self.policy);
    }

    /// The "connect input now" hook. Idempotent; must precede any input read.
    pub fn ensure_input<P: BootPlatform>(&mut self, platform: &mut P) {
        if self.input_connected {
            return;
        }
        platform.connect_console(ConsoleClass::Input);
        self.input_connected = true;
        info!("event=console_input_connected policy={:?}", self.policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::{ExecutionError, LoadOption};
    use crate::platform::TriggerWait;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingPlatform {
        calls: Vec<String>,
    }

    impl BootPlatform for RecordingPlatform {
        fn connect_console(&mut self, class: ConsoleClass) {
            self.calls.push(format!("connect_{class:?}"));
        }
        fn connect_all_default_consoles(&mut self) {
            self.calls.push("connect_all".into());
        }
        fn connect_all_drivers(&mut self) {}
        fn disconnect_all_drivers(&mut self) {}
        fn execute(&mut self, _option: &LoadOption) -> Result<(), ExecutionError> {
            Ok(())
        }
        fn has_hotkey_trigger(&self) -> bool {
            false
        }
        fn wait_for_trigger(&mut self, _timeout: Duration) -> TriggerWait {
            TriggerWait::TimedOut
        }
        fn drain_pending_input(&mut self) {}
        fn sleep(&mut self, _interval: Duration) {}
    }

    #[test]
    fn eager_policy_connects_everything_once() {
        let mut platform = RecordingPlatform::default();
        let mut consoles = ConsoleManager::new(ConsolePolicy::EagerAll);
        consoles.bring_up(&mut platform);
        consoles.ensure_input(&mut platform);
        assert_eq!(platform.calls, vec!["connect_all"]);
    }

    #[test]
    fn deferred_policy_connects_input_exactly_once_on_demand() {
        let mut platform = RecordingPlatform::default();
        let mut consoles = ConsoleManager::new(ConsolePolicy::OnDemandInput);
        consoles.bring_up(&mut platform);
        assert_eq!(platform.calls, vec!["connect_Output", "connect_Error"]);
        assert!(!consoles.input_connected());

        consoles.ensure_input(&mut platform);
        consoles.ensure_input(&mut platform);
        assert_eq!(
            platform.calls,
            vec!["connect_Output", "connect_Error", "connect_Input"]
        );
    }
}
