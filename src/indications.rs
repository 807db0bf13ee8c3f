//! Cross-reboot signaling between a previously-booted OS and the firmware:
//! the indications bitmask, the supported-subset computation published each
//! cycle, and validation of the persisted record against that subset.

use crate::store::{VarAttributes, Variable};
use serde::Serialize;

pub const BOOT_TO_FW_UI: u64 = 0x0000_0000_0000_0001;
pub const FILE_CAPSULE_DELIVERY: u64 = 0x0000_0000_0000_0004;
pub const START_PLATFORM_RECOVERY: u64 = 0x0000_0000_0000_0040;

/// Capability bitmap advertised alongside the supported indications.
pub const BOOT_OPTION_SUPPORT_KEY: u32 = 0x0000_0001;
pub const BOOT_OPTION_SUPPORT_APP: u32 = 0x0000_0002;
pub const BOOT_OPTION_SUPPORT_SYSPREP: u32 = 0x0000_0010;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OsIndications(u64);

impl OsIndications {
    pub fn new(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    /// Clears `mask` and reports which bits were actually consumed. The
    /// caller persists the returned value before acting on the consumed bits.
    pub fn consume(self, mask: u64) -> (Self, u64) {
        let consumed = self.0 & mask;
        (Self(self.0 & !mask), consumed)
    }
}

/// The subset of indication bits this firmware build can honor, recomputed at
/// the start of every cycle from platform capabilities and discovered state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedIndications(u64);

impl SupportedIndications {
    pub fn compute(
        platform_fixed: u64,
        menu_present: bool,
        recovery_enabled: bool,
        capsule_enabled: bool,
    ) -> Self {
        let mut mask = platform_fixed;
        if menu_present {
            mask |= BOOT_TO_FW_UI;
        }
        if recovery_enabled {
            mask |= START_PLATFORM_RECOVERY;
        }
        if capsule_enabled {
            mask |= FILE_CAPSULE_DELIVERY;
        }
        Self(mask)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn permits(self, value: u64) -> bool {
        value & !self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicationsDisposition {
    Absent,
    Valid(OsIndications),
    Malformed(&'static str),
}

/// Checks the persisted indications record: size, store attributes, and bit
/// content must all be consistent with the supported set, otherwise the
/// record is untrustworthy and gets deleted rather than interpreted.
pub fn validate_record(
    variable: Option<&Variable>,
    supported: SupportedIndications,
) -> IndicationsDisposition {
    let Some(variable) = variable else {
        return IndicationsDisposition::Absent;
    };
    if variable.data.len() != 8 {
        return IndicationsDisposition::Malformed("bad_size");
    }
    if variable.attributes != VarAttributes::PERSISTENT_RUNTIME {
        return IndicationsDisposition::Malformed("bad_attributes");
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&variable.data);
    let value = u64::from_le_bytes(bytes);
    if !supported.permits(value) {
        return IndicationsDisposition::Malformed("unsupported_bits");
    }
    IndicationsDisposition::Valid(OsIndications::new(value))
}
