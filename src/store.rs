//! Persistent variable store access: the collaborator trait the orchestrator
//! drives, plus the typed layer that turns raw records into load options,
//! order lists, and the small global knobs (Timeout, BootNext, indications).

use crate::hotkey::Countdown;
use crate::option::{
    decode_order_list, encode_order_list, LoadOption, OptionAttributes, OptionType,
};
use log::warn;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

pub const BOOT_NEXT_NAME: &str = "BootNext";
pub const TIMEOUT_NAME: &str = "Timeout";
pub const OS_INDICATIONS_NAME: &str = "OsIndications";
pub const OS_INDICATIONS_SUPPORTED_NAME: &str = "OsIndicationsSupported";
pub const BOOT_OPTION_SUPPORT_NAME: &str = "BootOptionSupport";
pub const CONSOLE_SELECTOR_NAMES: [&str; 3] = ["ConIn", "ConOut", "ErrOut"];

/// Store-level attribute flags: persistence across restarts and visibility to
/// a running OS (post-OS) as opposed to firmware-only (pre-OS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarAttributes {
    pub persistent: bool,
    pub runtime_visible: bool,
}

impl VarAttributes {
    pub const PERSISTENT_RUNTIME: Self = Self {
        persistent: true,
        runtime_visible: true,
    };
    pub const VOLATILE_RUNTIME: Self = Self {
        persistent: false,
        runtime_visible: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub attributes: VarAttributes,
    pub data: Vec<u8>,
}

/// The external key/value store. Deleting an absent name succeeds; the core
/// never relies on enumeration.
pub trait VariableStore {
    fn get(&self, name: &str) -> Option<&Variable>;
    fn set(&mut self, name: &str, attributes: VarAttributes, data: Vec<u8>)
        -> Result<(), StoreError>;
    fn delete(&mut self, name: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store rejected write of {name} ({size} bytes)")]
    WriteRejected { name: String, size: usize },
    #[error("store rejected delete of {0}")]
    DeleteRejected(String),
}

/// Classification of a failed persistent write. Writes that did not grow a
/// record are assumed to succeed by everything downstream, so their failure is
/// configuration corruption; growing writes can hit capacity and stay
/// transient.
#[derive(Debug, Error)]
pub enum WriteFailure {
    #[error("unrecoverable store corruption: {0}")]
    Fatal(StoreError),
    #[error("transient store failure: {0}")]
    Transient(StoreError),
}

/// In-memory backend for tests and hosted embedders. Write and delete
/// failures are injectable by name.
#[derive(Debug, Default)]
pub struct InMemoryVariableStore {
    variables: BTreeMap<String, Variable>,
    failing_writes: HashSet<String>,
    failing_deletes: HashSet<String>,
}

impl InMemoryVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_to(&mut self, name: impl Into<String>) {
        self.failing_writes.insert(name.into());
    }

    pub fn fail_deletes_of(&mut self, name: impl Into<String>) {
        self.failing_deletes.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }
}

impl VariableStore for InMemoryVariableStore {
    fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    fn set(
        &mut self,
        name: &str,
        attributes: VarAttributes,
        data: Vec<u8>,
    ) -> Result<(), StoreError> {
        if self.failing_writes.contains(name) {
            return Err(StoreError::WriteRejected {
                name: name.to_string(),
                size: data.len(),
            });
        }
        self.variables
            .insert(name.to_string(), Variable { attributes, data });
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        if self.failing_deletes.contains(name) {
            return Err(StoreError::DeleteRejected(name.to_string()));
        }
        self.variables.remove(name);
        Ok(())
    }
}

/// Typed data access over a [`VariableStore`]. Pure mechanism; ordering and
/// retry policy live in the orchestrator.
#[derive(Debug)]
pub struct LoadOptionStore<S: VariableStore> {
    backend: S,
}

impl<S: VariableStore> LoadOptionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Attempt order for `option_type`. Absent order list means empty; a
    /// malformed one is treated the same rather than trusted.
    pub fn order_list(&self, option_type: OptionType) -> Vec<u16> {
        let name = option_type.order_name();
        let Some(variable) = self.backend.get(name) else {
            return Vec::new();
        };
        match decode_order_list(&variable.data) {
            Ok(numbers) => numbers,
            Err(err) => {
                warn!("event=order_list_malformed name={name} error={err}");
                Vec::new()
            }
        }
    }

    /// Options in order-list order. Numbers with no backing record are
    /// silently omitted; records that fail to decode are skipped with a
    /// warning, matching the dangling-number semantics.
    pub fn ordered_options(&self, option_type: OptionType) -> Vec<LoadOption> {
        let mut options = Vec::new();
        for number in self.order_list(option_type) {
            let name = option_type.variable_name(number);
            let Some(variable) = self.backend.get(&name) else {
                continue;
            };
            match LoadOption::decode(option_type, number, &variable.data) {
                Ok(option) => options.push(option),
                Err(err) => warn!("event=load_option_malformed name={name} error={err}"),
            }
        }
        options
    }

    /// Loads a single record by its variable name (`Boot0003`-style).
    pub fn load_option(&self, variable_name: &str) -> Option<LoadOption> {
        let (option_type, number) = OptionType::parse_variable_name(variable_name)?;
        let variable = self.backend.get(variable_name)?;
        match LoadOption::decode(option_type, number, &variable.data) {
            Ok(option) => Some(option),
            Err(err) => {
                warn!("event=load_option_malformed name={variable_name} error={err}");
                None
            }
        }
    }

    /// Creates a new option under the smallest number the order list does not
    /// already use, appends it to the order list, and persists both.
    pub fn create_option(
        &mut self,
        option_type: OptionType,
        attributes: OptionAttributes,
        description: impl Into<String>,
        file_path: Vec<u8>,
        optional_data: Vec<u8>,
    ) -> Result<u16, StoreError> {
        let mut order = self.order_list(option_type);
        let used: HashSet<u16> = order.iter().copied().collect();
        let number = (0..=u16::MAX)
            .find(|candidate| !used.contains(candidate))
            .expect("order list cannot hold every 16-bit number");
        let option = LoadOption::new(
            option_type,
            number,
            attributes,
            description,
            file_path,
            optional_data,
        );
        self.backend.set(
            &option.variable_name(),
            VarAttributes::PERSISTENT_RUNTIME,
            option.encode(),
        )?;
        order.push(number);
        self.backend.set(
            option_type.order_name(),
            VarAttributes::PERSISTENT_RUNTIME,
            encode_order_list(&order),
        )?;
        Ok(number)
    }

    /// Removes a record and vacates its number from the order list. Deleting
    /// something already absent is not an error.
    pub fn delete_option(&mut self, option_type: OptionType, number: u16) -> Result<(), StoreError> {
        self.backend.delete(&option_type.variable_name(number))?;
        let order = self.order_list(option_type);
        if order.contains(&number) {
            let remaining: Vec<u16> = order.into_iter().filter(|n| *n != number).collect();
            self.backend.set(
                option_type.order_name(),
                VarAttributes::PERSISTENT_RUNTIME,
                encode_order_list(&remaining),
            )?;
        }
        Ok(())
    }

    /// Raw countdown setting, when one is persisted.
    pub fn timeout_raw(&self) -> Option<u16> {
        let variable = self.backend.get(TIMEOUT_NAME)?;
        if variable.data.len() != 2 {
            warn!("event=timeout_malformed size={}", variable.data.len());
            return None;
        }
        Some(u16::from_le_bytes([variable.data[0], variable.data[1]]))
    }

    pub fn countdown(&self, default_seconds: u16) -> Countdown {
        Countdown::from_raw(self.timeout_raw().unwrap_or(default_seconds))
    }

    /// Reads and self-heals the one-shot boot intent: a malformed record is
    /// deleted and reported as absent.
    pub fn read_boot_next(&mut self) -> Option<u16> {
        let variable = self.backend.get(BOOT_NEXT_NAME)?;
        if variable.data.len() != 2 {
            warn!(
                "event=boot_next_healed reason=bad_size size={}",
                variable.data.len()
            );
            if let Err(err) = self.backend.delete(BOOT_NEXT_NAME) {
                warn!("event=boot_next_heal_failed error={err}");
            }
            return None;
        }
        Some(u16::from_le_bytes([variable.data[0], variable.data[1]]))
    }

    pub fn delete_boot_next(&mut self) -> Result<(), StoreError> {
        self.backend.delete(BOOT_NEXT_NAME)
    }

    pub fn indications_variable(&self) -> Option<&Variable> {
        self.backend.get(OS_INDICATIONS_NAME)
    }

    /// Current indications value; absent or wrongly-sized records read as 0.
    pub fn read_indications(&self) -> u64 {
        match self.backend.get(OS_INDICATIONS_NAME) {
            Some(variable) if variable.data.len() == 8 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&variable.data);
                u64::from_le_bytes(bytes)
            }
            _ => 0,
        }
    }

    /// Persists a new indications value, classifying a failure by whether the
    /// record grew. Same-size and shrinking writes are assumed good by later
    /// phases, so their failure is fatal corruption.
    pub fn write_indications(&mut self, value: u64) -> Result<(), WriteFailure> {
        let prior_size = self
            .backend
            .get(OS_INDICATIONS_NAME)
            .map(|variable| variable.data.len());
        let data = value.to_le_bytes().to_vec();
        match self
            .backend
            .set(OS_INDICATIONS_NAME, VarAttributes::PERSISTENT_RUNTIME, data)
        {
            Ok(()) => Ok(()),
            Err(err) => match prior_size {
                Some(prior) if 8 <= prior => Err(WriteFailure::Fatal(err)),
                _ => Err(WriteFailure::Transient(err)),
            },
        }
    }

    pub fn delete_indications(&mut self) -> Result<(), StoreError> {
        self.backend.delete(OS_INDICATIONS_NAME)
    }

    /// Runtime-only records are recomputed every cycle; publication failure is
    /// reported but never fatal.
    pub fn publish_supported_indications(&mut self, mask: u64) -> Result<(), StoreError> {
        self.backend.set(
            OS_INDICATIONS_SUPPORTED_NAME,
            VarAttributes::VOLATILE_RUNTIME,
            mask.to_le_bytes().to_vec(),
        )
    }

    pub fn publish_boot_option_support(&mut self, mask: u32) -> Result<(), StoreError> {
        self.backend.set(
            BOOT_OPTION_SUPPORT_NAME,
            VarAttributes::VOLATILE_RUNTIME,
            mask.to_le_bytes().to_vec(),
        )
    }

    pub fn console_selector(&self, name: &str) -> Option<&Variable> {
        self.backend.get(name)
    }

    pub fn delete_console_selector(&mut self, name: &str) -> Result<(), StoreError> {
        self.backend.delete(name)
    }
}
