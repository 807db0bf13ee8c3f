//! The boot orchestrator: the fixed-order state machine that runs after
//! driver/hardware init. Phases: normalize persisted state, process driver
//! options, bring up consoles, honor the firmware-UI and recovery
//! indications, process sysprep options, race the hotkey against the
//! countdown, consume the one-shot boot intent, walk the boot list until a
//! pass yields no success, then fall back and halt.
//!
//! All cross-phase state lives in an explicit `CycleState` threaded through
//! the phase functions; nothing is process-global.

use crate::console::{ConsoleManager, ConsolePolicy};
use crate::hotkey::{HotkeyWait, HotkeyWaitConfig, WaitOutcome};
use crate::indications::{
    validate_record, IndicationsDisposition, OsIndications, SupportedIndications, BOOT_TO_FW_UI,
    BOOT_OPTION_SUPPORT_APP, BOOT_OPTION_SUPPORT_KEY, BOOT_OPTION_SUPPORT_SYSPREP,
    START_PLATFORM_RECOVERY,
};
use crate::option::{locator_well_formed, LoadOption, OptionAttributes, OptionType};
use crate::platform::BootPlatform;
use crate::runner::LoadOptionRunner;
use crate::store::{
    LoadOptionStore, StoreError, VariableStore, WriteFailure, CONSOLE_SELECTOR_NAMES,
};
use crate::telemetry::CycleMetrics;
use crate::why::{HaltGate, HaltReport};
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct BootConfig {
    pub console_policy: ConsolePolicy,
    /// Fixed indication capabilities beyond the bits derived from discovered
    /// state (menu presence, recovery, capsule delivery).
    pub platform_indication_caps: u64,
    pub platform_recovery_enabled: bool,
    pub capsule_delivery_enabled: bool,
    /// Countdown seconds used when no Timeout record is persisted.
    pub default_timeout: u16,
    /// Reconnect aggregation for the sysprep phase. Off in the base model;
    /// when a platform defines it, the reduce-then-act-once logic is scoped
    /// to that phase alone.
    pub sysprep_reconnect: bool,
    /// Optional bound on boot list rescans. The reference behaviour is
    /// uncapped; setting this is a documented deviation for embedders that
    /// need the machine to converge.
    pub max_scan_passes: Option<u32>,
    pub hotkey_wait: HotkeyWaitConfig,
    /// Locator of the built-in removable-media fallback, synthesized as a
    /// recovery option when platform recovery is disabled.
    pub default_fallback_locator: Vec<u8>,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            console_policy: ConsolePolicy::default(),
            platform_indication_caps: 0,
            platform_recovery_enabled: false,
            capsule_delivery_enabled: false,
            default_timeout: 0,
            sysprep_reconnect: false,
            max_scan_passes: None,
            hotkey_wait: HotkeyWaitConfig::default(),
            // a bare end node; real platforms override this
            default_fallback_locator: vec![0x7F, 0xFF, 0x04, 0x00],
        }
    }
}

impl BootConfig {
    pub fn with_console_policy(mut self, policy: ConsolePolicy) -> Self {
        self.console_policy = policy;
        self
    }

    pub fn with_platform_recovery(mut self, enabled: bool) -> Self {
        self.platform_recovery_enabled = enabled;
        self
    }

    pub fn with_default_timeout(mut self, seconds: u16) -> Self {
        self.default_timeout = seconds;
        self
    }

    pub fn with_max_scan_passes(mut self, cap: u32) -> Self {
        self.max_scan_passes = Some(cap);
        self
    }

    pub fn with_fallback_locator(mut self, locator: Vec<u8>) -> Self {
        self.default_fallback_locator = locator;
        self
    }
}

/// Cross-phase cycle state. `boot_next` is read exactly once, before any
/// platform hook runs; later phases consult only this cache.
#[derive(Debug)]
pub struct CycleState {
    supported: SupportedIndications,
    boot_next: Option<u16>,
    menu: Option<LoadOption>,
    boot_to_fw_ui: bool,
    platform_recovery: bool,
    hotkey_fired: bool,
}

impl CycleState {
    pub fn supported(&self) -> SupportedIndications {
        self.supported
    }

    pub fn boot_next(&self) -> Option<u16> {
        self.boot_next
    }

    pub fn menu(&self) -> Option<&LoadOption> {
        self.menu.as_ref()
    }

    pub fn boot_to_fw_ui(&self) -> bool {
        self.boot_to_fw_ui
    }

    pub fn platform_recovery(&self) -> bool {
        self.platform_recovery
    }

    pub fn hotkey_fired(&self) -> bool {
        self.hotkey_fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Some attempted option reported success this pass; the list is
    /// re-fetched and rescanned from the top.
    Success,
    /// A full pass produced zero successes.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanExit {
    Exhausted,
    CapReached,
}

/// How a cycle ended. `Halted` is the documented end state when every avenue
/// failed, not an error; the embedding firmware loop parks the machine.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The firmware-UI fast path ran the boot manager menu; later phases
    /// never execute on this cycle.
    FirmwareUiHandoff,
    Halted(HaltReport),
}

#[derive(Debug, Error)]
pub enum CycleError {
    /// A persistent write that downstream phases assume durable failed.
    #[error("unrecoverable configuration corruption: {0}")]
    StoreCorruption(StoreError),
}

#[derive(Debug)]
pub struct BootOrchestrator<S: VariableStore, P: BootPlatform> {
    store: LoadOptionStore<S>,
    platform: P,
    config: BootConfig,
    consoles: ConsoleManager,
    metrics: CycleMetrics,
}

impl<S: VariableStore, P: BootPlatform> BootOrchestrator<S, P> {
    pub fn new(backend: S, platform: P, config: BootConfig) -> Self {
        let consoles = ConsoleManager::new(config.console_policy);
        Self {
            store: LoadOptionStore::new(backend),
            platform,
            config,
            consoles,
            metrics: CycleMetrics::default(),
        }
    }

    pub fn store(&self) -> &LoadOptionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LoadOptionStore<S> {
        &mut self.store
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn metrics(&self) -> &CycleMetrics {
        &self.metrics
    }

    /// Runs one full boot cycle. Returns only when control came back from
    /// every attempted option: either the firmware-UI fast path was taken, or
    /// all options and recovery paths are exhausted.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        self.metrics = CycleMetrics::default();
        self.consoles = ConsoleManager::new(self.config.console_policy);

        let mut cycle = self.init();
        self.platform.before_console();
        self.process_option_list(OptionType::Driver, true);
        self.consoles.bring_up(&mut self.platform);
        self.platform.after_console();

        if self.fw_ui_fast_path(&mut cycle)? {
            return Ok(CycleOutcome::FirmwareUiHandoff);
        }
        if cycle.platform_recovery {
            info!("event=recovery_gate");
            let recovery_list_used = self.fallback_phase();
            return Ok(self.halt(HaltGate::RecoveryRequested, recovery_list_used));
        }

        self.process_option_list(OptionType::SysPrep, self.config.sysprep_reconnect);
        self.interactive_wait(&mut cycle);
        if cycle.hotkey_fired {
            self.platform.run_hotkey_boot();
        }
        self.boot_next_phase(&mut cycle);

        let exit = self.boot_list_phase(&mut cycle);
        let recovery_list_used = self.fallback_phase();
        let gate = match exit {
            ScanExit::Exhausted => HaltGate::BootListExhausted,
            ScanExit::CapReached => HaltGate::ScanCapReached,
        };
        Ok(self.halt(gate, recovery_list_used))
    }

    /// Normalizes persisted global state and caches the one-shot intent.
    fn init(&mut self) -> CycleState {
        info!("event=cycle_start policy={:?}", self.config.console_policy);

        for name in CONSOLE_SELECTOR_NAMES {
            let malformed = self
                .store
                .console_selector(name)
                .is_some_and(|variable| !locator_well_formed(&variable.data));
            if malformed {
                warn!("event=selector_healed name={name} reason=malformed_locator");
                if let Err(err) = self.store.delete_console_selector(name) {
                    warn!("event=selector_heal_failed name={name} error={err}");
                }
                self.metrics.record_healed();
            }
        }

        let menu = self
            .store
            .ordered_options(OptionType::Boot)
            .into_iter()
            .find(LoadOption::is_manager_menu);

        let supported = SupportedIndications::compute(
            self.config.platform_indication_caps,
            menu.is_some(),
            self.config.platform_recovery_enabled,
            self.config.capsule_delivery_enabled,
        );
        if let Err(err) = self.store.publish_supported_indications(supported.bits()) {
            // runtime-only record, recomputed next cycle
            warn!("event=supported_publish_failed error={err}");
        }

        match validate_record(self.store.indications_variable(), supported) {
            IndicationsDisposition::Malformed(reason) => {
                warn!("event=indications_healed reason={reason}");
                if let Err(err) = self.store.delete_indications() {
                    warn!("event=indications_heal_failed error={err}");
                }
                self.metrics.record_healed();
            }
            IndicationsDisposition::Absent | IndicationsDisposition::Valid(_) => {}
        }

        let support_mask =
            BOOT_OPTION_SUPPORT_KEY | BOOT_OPTION_SUPPORT_APP | BOOT_OPTION_SUPPORT_SYSPREP;
        if let Err(err) = self.store.publish_boot_option_support(support_mask) {
            warn!("event=support_publish_failed error={err}");
        }

        let boot_next = self.store.read_boot_next();
        if let Some(number) = boot_next {
            info!("event=boot_next_cached number={number:#06x}");
        }

        CycleState {
            supported,
            boot_next,
            menu,
            boot_to_fw_ui: false,
            platform_recovery: false,
            hotkey_fired: false,
        }
    }

    /// Sequential processing of one ordered list with force-reconnect
    /// aggregation: reconnecting mid-list would invalidate handles the
    /// remaining entries may reference, so the disconnect/reconnect happens
    /// at most once, after the list is exhausted.
    fn process_option_list(&mut self, option_type: OptionType, reconnect_enabled: bool) {
        let mut options = self.store.ordered_options(option_type);
        let mut any_reconnect = false;
        for option in options.iter_mut() {
            let result =
                LoadOptionRunner::attempt(&mut self.platform, &mut self.metrics, option, None);
            any_reconnect |= result.succeeded && option.attributes.force_reconnect();
        }
        if reconnect_enabled && any_reconnect {
            info!("event=force_reconnect list={:?}", option_type);
            self.platform.disconnect_all_drivers();
            self.platform.connect_all_drivers();
            self.metrics.record_reconnect_cycle();
        }
    }

    /// Re-derives the two behavior-triggering indication bits, clears both in
    /// a single persisted write before acting on either, and takes the
    /// firmware-UI path when requested and a menu exists.
    fn fw_ui_fast_path(&mut self, cycle: &mut CycleState) -> Result<bool, CycleError> {
        let value = OsIndications::new(self.store.read_indications());
        cycle.boot_to_fw_ui = value.contains(BOOT_TO_FW_UI);
        cycle.platform_recovery = value.contains(START_PLATFORM_RECOVERY);

        let (cleared, consumed) = value.consume(BOOT_TO_FW_UI | START_PLATFORM_RECOVERY);
        if consumed != 0 {
            // the clear must be durable before either bit is acted on, or a
            // crash mid-action re-fires the request on the next power-up
            if let Err(failure) = self.store.write_indications(cleared.bits()) {
                let err = match failure {
                    WriteFailure::Fatal(err) | WriteFailure::Transient(err) => err,
                };
                return Err(CycleError::StoreCorruption(err));
            }
            info!("event=indications_consumed bits={consumed:#x}");
        }

        if cycle.boot_to_fw_ui {
            if let Some(menu) = cycle.menu.as_mut() {
                info!("event=fw_ui_fast_path menu={}", menu.variable_name());
                self.consoles.ensure_input(&mut self.platform);
                LoadOptionRunner::run_directly(&mut self.platform, &mut self.metrics, menu);
                return Ok(true);
            }
            debug!("event=fw_ui_request_without_menu");
        }
        Ok(false)
    }

    fn interactive_wait(&mut self, cycle: &mut CycleState) {
        let countdown = self.store.countdown(self.config.default_timeout);
        // the countdown loop reads input, so the on-demand policy's connect
        // hook has to run first; the wait itself owns the post-wait drain and
        // the final completion callback
        self.consoles.ensure_input(&mut self.platform);
        let outcome = HotkeyWait::new(self.config.hotkey_wait).run(&mut self.platform, countdown);
        cycle.hotkey_fired = outcome == WaitOutcome::HotkeyFired;
        debug!("event=interactive_wait outcome={outcome:?} countdown={:?}", countdown);
    }

    /// Consumes the cached one-shot intent: the persisted slot is deleted
    /// before the attempt so a crash or hang during the boot cannot retry the
    /// same option forever on the next power-up.
    fn boot_next_phase(&mut self, cycle: &mut CycleState) {
        let Some(number) = cycle.boot_next else {
            return;
        };
        if let Err(err) = self.store.delete_boot_next() {
            // already-absent reads as success from the store; anything else
            // is reported and the attempt proceeds regardless
            warn!("event=boot_next_delete_failed error={err}");
        }
        self.metrics.record_boot_next_consumed();
        let name = OptionType::Boot.variable_name(number);
        match self.store.load_option(&name) {
            Some(mut option) => {
                info!("event=boot_next_attempt name={name}");
                LoadOptionRunner::attempt(
                    &mut self.platform,
                    &mut self.metrics,
                    &mut option,
                    cycle.menu.as_mut(),
                );
            }
            None => {
                // the intent may refer to an option deleted since it was set
                debug!("event=boot_next_unresolved name={name}");
            }
        }
    }

    /// The retry loop: any pass with a success re-fetches the list and scans
    /// again from the top; only a pass with zero successes exits.
    fn boot_list_phase(&mut self, cycle: &mut CycleState) -> ScanExit {
        let mut passes: u32 = 0;
        loop {
            if let Some(cap) = self.config.max_scan_passes {
                if passes >= cap {
                    warn!("event=scan_cap_reached cap={cap}");
                    return ScanExit::CapReached;
                }
            }
            passes = passes.saturating_add(1);
            self.metrics.record_scan_pass();
            let mut options = self.store.ordered_options(OptionType::Boot);
            debug!("event=scan_pass pass={passes} options={}", options.len());
            match self.scan_boot_list(&mut options, cycle) {
                ScanOutcome::Success => continue,
                ScanOutcome::Exhausted => return ScanExit::Exhausted,
            }
        }
    }

    fn scan_boot_list(
        &mut self,
        options: &mut [LoadOption],
        cycle: &mut CycleState,
    ) -> ScanOutcome {
        for option in options.iter_mut() {
            let result = LoadOptionRunner::attempt(
                &mut self.platform,
                &mut self.metrics,
                option,
                cycle.menu.as_mut(),
            );
            if result.succeeded {
                return ScanOutcome::Success;
            }
        }
        ScanOutcome::Exhausted
    }

    /// Last resort: the platform recovery list when recovery is enabled
    /// (plain run, no retry loop, no menu cascade), otherwise one attempt of
    /// the synthesized built-in removable-media option. Returns whether the
    /// recovery list was used.
    fn fallback_phase(&mut self) -> bool {
        if self.config.platform_recovery_enabled {
            info!("event=fallback source=recovery_list");
            let mut options = self.store.ordered_options(OptionType::PlatformRecovery);
            for option in options.iter_mut() {
                LoadOptionRunner::attempt(&mut self.platform, &mut self.metrics, option, None);
            }
            true
        } else {
            info!("event=fallback source=built_in_default");
            let mut option = LoadOption::new(
                OptionType::PlatformRecovery,
                0,
                OptionAttributes::new(OptionAttributes::ACTIVE),
                "Default Recovery",
                self.config.default_fallback_locator.clone(),
                Vec::new(),
            );
            self.metrics.record_fallback_synthesized();
            LoadOptionRunner::attempt(&mut self.platform, &mut self.metrics, &mut option, None);
            false
        }
    }

    fn halt(&mut self, gate: HaltGate, recovery_list_used: bool) -> CycleOutcome {
        let report = HaltReport::new(gate, recovery_list_used, self.metrics.clone());
        warn!("event=boot_halt gate={gate:?}");
        self.platform.unable_to_boot();
        CycleOutcome::Halted(report)
    }
}
