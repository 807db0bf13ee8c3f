//! Convenience re-exports for embedders. Pull this module in via
//! `use bootsel::prelude::*;` when you want the most common types without
//! spelunking the module tree.

pub use crate::console::{ConsoleClass, ConsolePolicy};
pub use crate::error::{BootselError, Result as BootselResult};
pub use crate::hotkey::{Countdown, WaitOutcome};
pub use crate::option::{AttemptOutcome, LoadOption, OptionAttributes, OptionType};
pub use crate::orchestrator::{BootConfig, BootOrchestrator, CycleOutcome};
pub use crate::platform::{BootPlatform, TriggerWait};
pub use crate::store::{InMemoryVariableStore, VariableStore};
pub use crate::why::{HaltGate, HaltReport};
