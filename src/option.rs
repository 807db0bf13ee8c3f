//! Load option records: the named, numbered boot/driver/recovery targets the
//! orchestrator sequences, plus their persisted wire format and order lists.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptionType {
    Driver,
    SysPrep,
    Boot,
    PlatformRecovery,
}

impl OptionType {
    pub const ALL: [OptionType; 4] = [
        OptionType::Driver,
        OptionType::SysPrep,
        OptionType::Boot,
        OptionType::PlatformRecovery,
    ];

    /// Variable-name prefix for numbered records of this type.
    pub fn prefix(&self) -> &'static str {
        match self {
            OptionType::Driver => "Driver",
            OptionType::SysPrep => "SysPrep",
            OptionType::Boot => "Boot",
            OptionType::PlatformRecovery => "PlatformRecovery",
        }
    }

    /// Name of the order list that defines attempt order for this type.
    pub fn order_name(&self) -> &'static str {
        match self {
            OptionType::Driver => "DriverOrder",
            OptionType::SysPrep => "SysPrepOrder",
            OptionType::Boot => "BootOrder",
            OptionType::PlatformRecovery => "PlatformRecoveryOrder",
        }
    }

    /// Whether a successful-but-returned option of this type chains into the
    /// boot manager menu.
    pub fn menu_eligible(&self) -> bool {
        matches!(self, OptionType::Boot)
    }

    pub fn variable_name(&self, number: u16) -> String {
        format!("{}{:04X}", self.prefix(), number)
    }

    /// Splits a `Boot0003`-style variable name back into type and number.
    /// Names like `BootOrder` or `BootNext` do not match.
    pub fn parse_variable_name(name: &str) -> Option<(OptionType, u16)> {
        for ty in OptionType::ALL {
            if let Some(suffix) = name.strip_prefix(ty.prefix()) {
                if suffix.len() == 4 && suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
                    if let Ok(number) = u16::from_str_radix(suffix, 16) {
                        return Some((ty, number));
                    }
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OptionAttributes(u32);

impl OptionAttributes {
    pub const ACTIVE: u32 = 0x0000_0001;
    pub const FORCE_RECONNECT: u32 = 0x0000_0002;
    pub const HIDDEN: u32 = 0x0000_0008;
    pub const CATEGORY_MASK: u32 = 0x0000_1F00;
    pub const CATEGORY_BOOT: u32 = 0x0000_0000;
    pub const CATEGORY_APP: u32 = 0x0000_0100;

    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn active(self) -> bool {
        self.0 & Self::ACTIVE != 0
    }

    pub fn force_reconnect(self) -> bool {
        self.0 & Self::FORCE_RECONNECT != 0
    }

    pub fn hidden(self) -> bool {
        self.0 & Self::HIDDEN != 0
    }

    pub fn category(self) -> Category {
        match self.0 & Self::CATEGORY_MASK {
            Self::CATEGORY_BOOT => Category::Boot,
            Self::CATEGORY_APP => Category::App,
            other => Category::Reserved(other),
        }
    }
}

/// Sub-classification of boot options. Only `Boot` is eligible for unattended
/// automatic attempts; `App` and reserved values are inert for the list scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Boot,
    App,
    Reserved(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionError {
    NotFound,
    LoadError,
    DeviceError,
    AccessDenied,
    Aborted,
}

/// Last-attempt outcome of a load option. `Unattempted` until run once;
/// written by the runner, read by the orchestrator for decision-making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AttemptOutcome {
    #[default]
    Unattempted,
    Success,
    Failed(ExecutionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOption {
    pub option_type: OptionType,
    pub number: u16,
    pub attributes: OptionAttributes,
    pub description: String,
    pub file_path: Vec<u8>,
    pub optional_data: Vec<u8>,
    pub outcome: AttemptOutcome,
}

impl LoadOption {
    pub fn new(
        option_type: OptionType,
        number: u16,
        attributes: OptionAttributes,
        description: impl Into<String>,
        file_path: Vec<u8>,
        optional_data: Vec<u8>,
    ) -> Self {
        Self {
            option_type,
            number,
            attributes,
            description: description.into(),
            file_path,
            optional_data,
            outcome: AttemptOutcome::Unattempted,
        }
    }

    pub fn variable_name(&self) -> String {
        self.option_type.variable_name(self.number)
    }

    /// The boot manager menu is a Boot option carried with App category plus
    /// the Hidden attribute. App category already keeps it out of automatic
    /// scans; Hidden distinguishes it from ordinary user-visible apps.
    pub fn is_manager_menu(&self) -> bool {
        self.option_type == OptionType::Boot
            && self.attributes.category() == Category::App
            && self.attributes.hidden()
    }

    /// Persisted layout: attributes u32, file-path length u16, NUL-terminated
    /// UTF-16LE description, file-path bytes, remainder optional data. All
    /// integers little-endian.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.attributes.bits().to_le_bytes());
        buf.extend_from_slice(&(self.file_path.len() as u16).to_le_bytes());
        for unit in self.description.encode_utf16() {
            buf.extend_from_slice(&unit.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&self.file_path);
        buf.extend_from_slice(&self.optional_data);
        buf
    }

    pub fn decode(
        option_type: OptionType,
        number: u16,
        bytes: &[u8],
    ) -> Result<Self, OptionDecodeError> {
        let mut reader = bytes;
        let attributes = OptionAttributes::new(read_u32(&mut reader)?);
        let path_len = read_u16(&mut reader)? as usize;
        let description = read_utf16_description(&mut reader)?;
        if reader.len() < path_len {
            return Err(OptionDecodeError::Truncated);
        }
        let (path, rest) = reader.split_at(path_len);
        Ok(Self {
            option_type,
            number,
            attributes,
            description,
            file_path: path.to_vec(),
            optional_data: rest.to_vec(),
            outcome: AttemptOutcome::Unattempted,
        })
    }
}

/// Order lists are packed little-endian u16 arrays; odd payloads are rejected.
pub fn decode_order_list(bytes: &[u8]) -> Result<Vec<u16>, OptionDecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(OptionDecodeError::MisalignedOrderList);
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

pub fn encode_order_list(numbers: &[u16]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(numbers.len() * 2);
    for number in numbers {
        buf.extend_from_slice(&number.to_le_bytes());
    }
    buf
}

/// Structural check for opaque device locators (console selectors). Walks the
/// node list — type u8, subtype u8, length u16 — and requires a terminating
/// end node flush with the buffer end. No semantic interpretation.
pub fn locator_well_formed(bytes: &[u8]) -> bool {
    const END_NODE_TYPE: u8 = 0x7F;
    const END_ENTIRE_SUBTYPE: u8 = 0xFF;
    const END_INSTANCE_SUBTYPE: u8 = 0x01;

    let mut offset = 0usize;
    loop {
        if bytes.len() < offset + 4 {
            return false;
        }
        let node_type = bytes[offset];
        let subtype = bytes[offset + 1];
        let len = u16::from_le_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        if len < 4 || offset + len > bytes.len() {
            return false;
        }
        if node_type == END_NODE_TYPE {
            if subtype == END_ENTIRE_SUBTYPE {
                return offset + len == bytes.len();
            }
            if subtype != END_INSTANCE_SUBTYPE {
                return false;
            }
        }
        offset += len;
    }
}

fn read_u16(reader: &mut &[u8]) -> Result<u16, OptionDecodeError> {
    if reader.len() < 2 {
        return Err(OptionDecodeError::Truncated);
    }
    let (head, tail) = reader.split_at(2);
    *reader = tail;
    Ok(u16::from_le_bytes([head[0], head[1]]))
}

fn read_u32(reader: &mut &[u8]) -> Result<u32, OptionDecodeError> {
    if reader.len() < 4 {
        return Err(OptionDecodeError::Truncated);
    }
    let (head, tail) = reader.split_at(4);
    *reader = tail;
    Ok(u32::from_le_bytes([head[0], head[1], head[2], head[3]]))
}

fn read_utf16_description(reader: &mut &[u8]) -> Result<String, OptionDecodeError> {
    let mut units = Vec::new();
    loop {
        let unit = read_u16(reader)?;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    String::from_utf16(&units).map_err(|_| OptionDecodeError::InvalidDescription)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionDecodeError {
    #[error("unexpected end of load option record")]
    Truncated,
    #[error("load option description is not valid UTF-16")]
    InvalidDescription,
    #[error("order list payload has an odd byte length")]
    MisalignedOrderList,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(nodes: &[(u8, u8, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        for (ty, sub, body) in nodes {
            buf.push(*ty);
            buf.push(*sub);
            buf.extend_from_slice(&((body.len() + 4) as u16).to_le_bytes());
            buf.extend_from_slice(body);
        }
        buf
    }

    #[test]
    fn record_encode_decode_preserves_fields() {
        let option = LoadOption::new(
            OptionType::Boot,
            3,
            OptionAttributes::new(OptionAttributes::ACTIVE),
            "Internal Disk",
            vec![0xAA, 0xBB, 0xCC],
            vec![0x01],
        );
        let decoded = LoadOption::decode(OptionType::Boot, 3, &option.encode()).unwrap();
        assert_eq!(decoded, option);
        assert_eq!(decoded.outcome, AttemptOutcome::Unattempted);
    }

    #[test]
    fn decode_rejects_missing_description_terminator() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&[b'A', 0]); // one unit, no terminator
        assert_eq!(
            LoadOption::decode(OptionType::Boot, 0, &bytes),
            Err(OptionDecodeError::Truncated)
        );
    }

    #[test]
    fn decode_rejects_truncated_file_path() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&8u16.to_le_bytes()); // claims 8 path bytes
        bytes.extend_from_slice(&0u16.to_le_bytes()); // empty description
        bytes.extend_from_slice(&[0xAA; 4]); // only 4 present
        assert_eq!(
            LoadOption::decode(OptionType::Boot, 0, &bytes),
            Err(OptionDecodeError::Truncated)
        );
    }

    #[test]
    fn category_extraction_covers_reserved_values() {
        assert_eq!(OptionAttributes::new(0x0000).category(), Category::Boot);
        assert_eq!(OptionAttributes::new(0x0100).category(), Category::App);
        assert_eq!(
            OptionAttributes::new(0x0200).category(),
            Category::Reserved(0x0200)
        );
    }

    #[test]
    fn variable_name_round_trip() {
        assert_eq!(OptionType::Boot.variable_name(3), "Boot0003");
        assert_eq!(
            OptionType::parse_variable_name("Boot0003"),
            Some((OptionType::Boot, 3))
        );
        assert_eq!(
            OptionType::parse_variable_name("PlatformRecovery001F"),
            Some((OptionType::PlatformRecovery, 0x1F))
        );
        assert_eq!(OptionType::parse_variable_name("BootOrder"), None);
        assert_eq!(OptionType::parse_variable_name("BootNext"), None);
        assert_eq!(OptionType::parse_variable_name("Boot03"), None);
    }

    #[test]
    fn manager_menu_requires_app_category_and_hidden() {
        let menu_attrs =
            OptionAttributes::new(OptionAttributes::CATEGORY_APP | OptionAttributes::HIDDEN);
        let menu = LoadOption::new(OptionType::Boot, 0, menu_attrs, "Menu", vec![], vec![]);
        assert!(menu.is_manager_menu());

        let plain_app = LoadOption::new(
            OptionType::Boot,
            1,
            OptionAttributes::new(OptionAttributes::CATEGORY_APP),
            "Shell",
            vec![],
            vec![],
        );
        assert!(!plain_app.is_manager_menu());
    }

    #[test]
    fn order_list_rejects_odd_payload() {
        assert_eq!(
            decode_order_list(&[0x01, 0x00, 0x02]),
            Err(OptionDecodeError::MisalignedOrderList)
        );
        assert_eq!(decode_order_list(&[0x07, 0x00, 0x03, 0x00]), Ok(vec![7, 3]));
    }

    #[test]
    fn locator_validation_requires_closing_end_node() {
        let good = locator(&[(0x04, 0x01, &[0u8; 8]), (0x7F, 0xFF, &[])]);
        assert!(locator_well_formed(&good));

        let multi_instance = locator(&[
            (0x04, 0x01, &[0u8; 4]),
            (0x7F, 0x01, &[]),
            (0x04, 0x01, &[0u8; 4]),
            (0x7F, 0xFF, &[]),
        ]);
        assert!(locator_well_formed(&multi_instance));

        let no_end = locator(&[(0x04, 0x01, &[0u8; 8])]);
        assert!(!locator_well_formed(&no_end));

        let trailing = {
            let mut bytes = locator(&[(0x7F, 0xFF, &[])]);
            bytes.push(0x00);
            bytes
        };
        assert!(!locator_well_formed(&trailing));

        let mut short_node = locator(&[(0x7F, 0xFF, &[])]);
        short_node[2] = 2; // node length below the 4-byte header
        assert!(!locator_well_formed(&short_node));

        assert!(!locator_well_formed(&[]));
    }
}
