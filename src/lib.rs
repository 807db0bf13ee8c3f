//! Boot device selection core: the control loop a platform runs after
//! driver initialization to decide what executes next — process driver and
//! sysprep options, bring up consoles, honor one-shot boot intents and
//! firmware-UI requests, race a hotkey against the countdown, and walk the
//! ordered boot list through recovery fallback to a terminal halt.

pub mod console;
pub mod error;
pub mod hotkey;
pub mod indications;
pub mod option;
pub mod orchestrator;
pub mod platform;
pub mod prelude;
pub mod runner;
pub mod store;
pub mod telemetry;
pub mod timing;
pub mod why;

pub use console::{ConsoleClass, ConsoleManager, ConsolePolicy};
pub use error::{BootselError, SerializationError};
pub use hotkey::{Countdown, HotkeyWait, HotkeyWaitConfig, WaitOutcome};
pub use indications::{
    validate_record, IndicationsDisposition, OsIndications, SupportedIndications,
    BOOT_OPTION_SUPPORT_APP, BOOT_OPTION_SUPPORT_KEY, BOOT_OPTION_SUPPORT_SYSPREP, BOOT_TO_FW_UI,
    FILE_CAPSULE_DELIVERY, START_PLATFORM_RECOVERY,
};
pub use option::{
    decode_order_list, encode_order_list, locator_well_formed, AttemptOutcome, Category,
    ExecutionError, LoadOption, OptionAttributes, OptionDecodeError, OptionType,
};
pub use orchestrator::{
    BootConfig, BootOrchestrator, CycleError, CycleOutcome, CycleState, ScanOutcome,
};
pub use platform::{BootPlatform, TriggerWait};
pub use runner::{AttemptResult, LoadOptionRunner};
pub use store::{
    InMemoryVariableStore, LoadOptionStore, StoreError, VarAttributes, Variable, VariableStore,
    WriteFailure,
};
pub use telemetry::CycleMetrics;
pub use why::{HaltGate, HaltReport};
