//! Shared fixtures: a scripted platform that records every collaborator call
//! in order, plus store seeding helpers.

#![allow(dead_code)]

use bootsel::{
    BootPlatform, ConsoleClass, ExecutionError, InMemoryVariableStore, LoadOption,
    OptionAttributes, OptionType, TriggerWait, VarAttributes, VariableStore,
};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ConnectConsole(ConsoleClass),
    ConnectAllConsoles,
    ConnectAllDrivers,
    DisconnectAllDrivers,
    Execute(String),
    DrainInput,
    Sleep,
    BeforeConsole,
    AfterConsole,
    WaitTick(u16),
    RunHotkeyBoot,
    UnableToBoot,
}

pub struct MockPlatform {
    pub calls: Vec<Call>,
    outcomes: HashMap<String, VecDeque<Result<(), ExecutionError>>>,
    default_outcome: Result<(), ExecutionError>,
    trigger_fire_on_wait: Option<u32>,
    trigger_waits: u32,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            outcomes: HashMap::new(),
            default_outcome: Err(ExecutionError::NotFound),
            trigger_fire_on_wait: None,
            trigger_waits: 0,
        }
    }

    /// Arms the hotkey trigger to fire on the n-th one-second wait.
    pub fn with_trigger_on_wait(mut self, n: u32) -> Self {
        self.trigger_fire_on_wait = Some(n);
        self
    }

    /// Queues outcomes for successive executions of `name`; once drained the
    /// default outcome applies again.
    pub fn script_outcomes(
        &mut self,
        name: impl Into<String>,
        outcomes: impl IntoIterator<Item = Result<(), ExecutionError>>,
    ) {
        self.outcomes
            .entry(name.into())
            .or_default()
            .extend(outcomes);
    }

    pub fn executed(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Execute(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn ticks(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::WaitTick(remaining) => Some(*remaining),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls.iter().filter(|call| *call == wanted).count()
    }

    pub fn position(&self, wanted: &Call) -> Option<usize> {
        self.calls.iter().position(|call| call == wanted)
    }
}

impl BootPlatform for MockPlatform {
    fn connect_console(&mut self, class: ConsoleClass) {
        self.calls.push(Call::ConnectConsole(class));
    }

    fn connect_all_default_consoles(&mut self) {
        self.calls.push(Call::ConnectAllConsoles);
    }

    fn connect_all_drivers(&mut self) {
        self.calls.push(Call::ConnectAllDrivers);
    }

    fn disconnect_all_drivers(&mut self) {
        self.calls.push(Call::DisconnectAllDrivers);
    }

    fn execute(&mut self, option: &LoadOption) -> Result<(), ExecutionError> {
        let name = option.variable_name();
        self.calls.push(Call::Execute(name.clone()));
        let scripted = self.outcomes.get_mut(&name).and_then(VecDeque::pop_front);
        scripted.unwrap_or(self.default_outcome)
    }

    fn has_hotkey_trigger(&self) -> bool {
        self.trigger_fire_on_wait.is_some()
    }

    fn wait_for_trigger(&mut self, _timeout: Duration) -> TriggerWait {
        self.trigger_waits += 1;
        match self.trigger_fire_on_wait {
            Some(n) if self.trigger_waits >= n => TriggerWait::Fired,
            _ => TriggerWait::TimedOut,
        }
    }

    fn drain_pending_input(&mut self) {
        self.calls.push(Call::DrainInput);
    }

    fn sleep(&mut self, _interval: Duration) {
        self.calls.push(Call::Sleep);
    }

    fn before_console(&mut self) {
        self.calls.push(Call::BeforeConsole);
    }

    fn after_console(&mut self) {
        self.calls.push(Call::AfterConsole);
    }

    fn wait_tick(&mut self, seconds_remaining: u16) {
        self.calls.push(Call::WaitTick(seconds_remaining));
    }

    fn run_hotkey_boot(&mut self) {
        self.calls.push(Call::RunHotkeyBoot);
    }

    fn unable_to_boot(&mut self) {
        self.calls.push(Call::UnableToBoot);
    }
}

pub const ACTIVE: u32 = OptionAttributes::ACTIVE;
pub const FORCE_RECONNECT: u32 = OptionAttributes::FORCE_RECONNECT;
pub const MENU_ATTRS: u32 =
    OptionAttributes::ACTIVE | OptionAttributes::CATEGORY_APP | OptionAttributes::HIDDEN;

/// A minimal well-formed locator: a single end node.
pub fn end_node_locator() -> Vec<u8> {
    vec![0x7F, 0xFF, 0x04, 0x00]
}

pub fn seed_option(
    store: &mut InMemoryVariableStore,
    option_type: OptionType,
    number: u16,
    attributes: u32,
) {
    let option = LoadOption::new(
        option_type,
        number,
        OptionAttributes::new(attributes),
        format!("{} {number}", option_type.prefix()),
        end_node_locator(),
        Vec::new(),
    );
    store
        .set(
            &option.variable_name(),
            VarAttributes::PERSISTENT_RUNTIME,
            option.encode(),
        )
        .unwrap();
}

pub fn seed_order(store: &mut InMemoryVariableStore, option_type: OptionType, numbers: &[u16]) {
    store
        .set(
            option_type.order_name(),
            VarAttributes::PERSISTENT_RUNTIME,
            bootsel::encode_order_list(numbers),
        )
        .unwrap();
}

pub fn set_u16(store: &mut InMemoryVariableStore, name: &str, value: u16) {
    store
        .set(
            name,
            VarAttributes::PERSISTENT_RUNTIME,
            value.to_le_bytes().to_vec(),
        )
        .unwrap();
}

pub fn set_u64(store: &mut InMemoryVariableStore, name: &str, value: u64) {
    store
        .set(
            name,
            VarAttributes::PERSISTENT_RUNTIME,
            value.to_le_bytes().to_vec(),
        )
        .unwrap();
}

pub fn set_raw(store: &mut InMemoryVariableStore, name: &str, data: Vec<u8>) {
    store
        .set(name, VarAttributes::PERSISTENT_RUNTIME, data)
        .unwrap();
}
