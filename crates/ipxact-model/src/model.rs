//! Entity graph: Component → MemoryMap → AddressBlock → Register → Field.

use core::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Field access mode (`ipxact:access`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    WriteOnce,
}

impl AccessMode {
    /// Literal used by the IP-XACT schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
            AccessMode::WriteOnce => "writeOnce",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effect of a software write (`ipxact:modifiedWriteValue`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifiedWrite {
    OneToClear,
    OneToSet,
    OneToToggle,
    ZeroToClear,
    ZeroToSet,
    ZeroToToggle,
    Clear,
    Set,
}

impl ModifiedWrite {
    /// Literal used by the IP-XACT schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            ModifiedWrite::OneToClear => "oneToClear",
            ModifiedWrite::OneToSet => "oneToSet",
            ModifiedWrite::OneToToggle => "oneToToggle",
            ModifiedWrite::ZeroToClear => "zeroToClear",
            ModifiedWrite::ZeroToSet => "zeroToSet",
            ModifiedWrite::ZeroToToggle => "zeroToToggle",
            ModifiedWrite::Clear => "clear",
            ModifiedWrite::Set => "set",
        }
    }

    /// Whether the transform depends on the written bit value (`oneTo*`/`zeroTo*`).
    ///
    /// Bit-wise transforms only make sense on a field that can also be read
    /// back, whereas `clear`/`set` describe a write-only strobe.
    pub const fn is_bitwise(self) -> bool {
        !matches!(self, ModifiedWrite::Clear | ModifiedWrite::Set)
    }
}

impl fmt::Display for ModifiedWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effect of a software read (`ipxact:readAction`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadAction {
    Clear,
    Set,
}

impl ReadAction {
    /// Literal used by the IP-XACT schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            ReadAction::Clear => "clear",
            ReadAction::Set => "set",
        }
    }
}

impl fmt::Display for ReadAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsigned number kept in its textual form.
///
/// Addresses and ranges are never narrowed to a machine integer: the text is
/// validated as decimal digits or `0x`-prefixed hex digits of any length and
/// rendered back exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Numeric(String);

impl Numeric {
    /// Validate `text` as an unsigned decimal or `0x` hexadecimal literal.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let trimmed = text.trim();
        let digits_ok = match strip_hex_prefix(trimmed) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()),
        };
        if !digits_ok {
            return Err(ModelError::InvalidNumber(text.to_string()));
        }
        Ok(Numeric(trimmed.to_string()))
    }

    /// Render `value` as upper-case hex with a `0x` prefix, zero-padded to
    /// at least `digits` hex digits.
    pub fn hex(value: u64, digits: usize) -> Self {
        Numeric(format!("0x{value:0digits$X}"))
    }

    /// Textual form as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits after the radix prefix.
    pub fn digit_count(&self) -> usize {
        strip_hex_prefix(&self.0).unwrap_or(&self.0).len()
    }

    /// Whether the literal is written in hexadecimal.
    pub fn is_hex(&self) -> bool {
        strip_hex_prefix(&self.0).is_some()
    }

    /// Value as a `u64`, or `None` when it does not fit.
    pub fn to_u64(&self) -> Option<u64> {
        match strip_hex_prefix(&self.0) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => self.0.parse().ok(),
        }
    }
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

impl FromStr for Numeric {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Numeric::parse(s)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bit field inside a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    /// Least significant bit of the field inside its register.
    pub bit_offset: u32,
    pub bit_width: u32,
    pub access: AccessMode,
    pub modified_write_value: Option<ModifiedWrite>,
    pub read_action: Option<ReadAction>,
    /// Reset value exactly as authored (e.g. `0x0`, `1`).
    pub reset_value: Option<String>,
}

impl Field {
    /// Create a field with no write/read side effects and no reset value.
    pub fn new(
        name: impl Into<String>,
        bit_offset: u32,
        bit_width: u32,
        access: AccessMode,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if bit_width == 0 {
            return Err(ModelError::ZeroWidth(name));
        }
        Ok(Field {
            name,
            description: None,
            bit_offset,
            bit_width,
            access,
            modified_write_value: None,
            read_action: None,
            reset_value: None,
        })
    }

    pub fn with_modified_write(mut self, value: Option<ModifiedWrite>) -> Self {
        self.modified_write_value = value;
        self
    }

    pub fn with_read_action(mut self, value: Option<ReadAction>) -> Self {
        self.read_action = value;
        self
    }

    pub fn with_reset(mut self, value: Option<String>) -> Self {
        self.reset_value = value.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn with_description(mut self, value: Option<String>) -> Self {
        self.description = value.filter(|v| !v.trim().is_empty());
        self
    }

    /// One past the most significant bit.
    pub fn end_bit(&self) -> u64 {
        u64::from(self.bit_offset) + u64::from(self.bit_width)
    }

    /// Whether the field lies entirely inside a register of `size` bits.
    pub fn fits(&self, size: u32) -> bool {
        self.end_bit() <= u64::from(size)
    }

    /// Whether the two fields share at least one bit.
    pub fn overlaps(&self, other: &Field) -> bool {
        u64::from(self.bit_offset) < other.end_bit() && u64::from(other.bit_offset) < self.end_bit()
    }
}

/// Register with an ordered list of named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    name: String,
    description: Option<String>,
    address_offset: Numeric,
    size_in_bits: u32,
    fields: Vec<Field>,
}

impl Register {
    /// Build a register, rejecting a zero size or any field that does not
    /// fit inside `size_in_bits`.
    pub fn new(
        name: impl Into<String>,
        address_offset: Numeric,
        size_in_bits: u32,
        fields: Vec<Field>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if size_in_bits == 0 {
            return Err(ModelError::ZeroSize(name));
        }
        if let Some(field) = fields.iter().find(|field| !field.fits(size_in_bits)) {
            return Err(ModelError::FieldOverflow {
                register: name,
                field: field.name.clone(),
                bit_offset: field.bit_offset,
                bit_width: field.bit_width,
                size: size_in_bits,
            });
        }
        Ok(Register {
            name,
            description: None,
            address_offset,
            size_in_bits,
            fields,
        })
    }

    pub fn with_description(mut self, value: Option<String>) -> Self {
        self.description = value.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn address_offset(&self) -> &Numeric {
        &self.address_offset
    }

    pub fn size_in_bits(&self) -> u32 {
        self.size_in_bits
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Pairs of field names whose bit ranges intersect, in declaration order.
    pub fn overlapping_fields(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (index, field) in self.fields.iter().enumerate() {
            for other in &self.fields[index + 1..] {
                if field.overlaps(other) {
                    pairs.push((field.name.as_str(), other.name.as_str()));
                }
            }
        }
        pairs
    }
}

/// Named, based and ranged region holding registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBlock {
    name: String,
    description: Option<String>,
    base_address: Numeric,
    range: Numeric,
    width: u32,
    registers: Vec<Register>,
}

impl AddressBlock {
    /// Create an address block with no registers.
    pub fn new(name: impl Into<String>, base_address: Numeric, range: Numeric, width: u32) -> Self {
        AddressBlock {
            name: name.into(),
            description: None,
            base_address,
            range,
            width,
            registers: Vec::new(),
        }
    }

    pub fn with_description(mut self, value: Option<String>) -> Self {
        self.description = value.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn with_registers(mut self, registers: Vec<Register>) -> Self {
        self.registers = registers;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn base_address(&self) -> &Numeric {
        &self.base_address
    }

    pub fn range(&self) -> &Numeric {
        &self.range
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }
}

/// Memory map grouping the address blocks of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap {
    name: String,
    address_blocks: Vec<AddressBlock>,
}

impl MemoryMap {
    pub fn new(name: impl Into<String>, address_blocks: Vec<AddressBlock>) -> Self {
        MemoryMap {
            name: name.into(),
            address_blocks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address_blocks(&self) -> &[AddressBlock] {
        &self.address_blocks
    }
}

/// Root of the document: the VLNV identity plus its memory maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    vendor: String,
    library: String,
    name: String,
    version: String,
    description: Option<String>,
    memory_maps: Vec<MemoryMap>,
}

impl Component {
    pub fn new(
        vendor: impl Into<String>,
        library: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Component {
            vendor: vendor.into(),
            library: library.into(),
            name: name.into(),
            version: version.into(),
            description: None,
            memory_maps: Vec::new(),
        }
    }

    pub fn with_description(mut self, value: Option<String>) -> Self {
        self.description = value.filter(|v| !v.trim().is_empty());
        self
    }

    /// Attach the single implicit memory map, named after the component.
    pub fn with_address_blocks(mut self, address_blocks: Vec<AddressBlock>) -> Self {
        self.memory_maps = vec![MemoryMap::new(self.name.clone(), address_blocks)];
        self
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn memory_maps(&self) -> &[MemoryMap] {
        &self.memory_maps
    }

    /// Iterate over every address block of every memory map.
    pub fn address_blocks(&self) -> impl Iterator<Item = &AddressBlock> {
        self.memory_maps
            .iter()
            .flat_map(|map| map.address_blocks().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, offset: u32, width: u32) -> Field {
        Field::new(name, offset, width, AccessMode::ReadWrite).expect("field")
    }

    #[test]
    fn numeric_accepts_hex_and_decimal() {
        let hex = Numeric::parse(" 0x1F00 ").expect("hex");
        assert_eq!(hex.as_str(), "0x1F00");
        assert_eq!(hex.to_u64(), Some(0x1F00));
        assert_eq!(hex.digit_count(), 4);
        assert!(hex.is_hex());

        let dec = Numeric::parse("4096").expect("decimal");
        assert_eq!(dec.to_u64(), Some(4096));
        assert!(!dec.is_hex());
    }

    #[test]
    fn numeric_keeps_values_wider_than_u64() {
        let wide = Numeric::parse("0x10000000000000000").expect("wide literal");
        assert_eq!(wide.as_str(), "0x10000000000000000");
        assert_eq!(wide.to_u64(), None);
    }

    #[test]
    fn numeric_rejects_garbage() {
        for text in ["", "0x", "12ab", "0xZZ", "-1", "1.5"] {
            assert!(
                matches!(Numeric::parse(text), Err(ModelError::InvalidNumber(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn numeric_hex_rendering_pads() {
        assert_eq!(Numeric::hex(0x10C, 3).as_str(), "0x10C");
        assert_eq!(Numeric::hex(0x4, 4).as_str(), "0x0004");
        assert_eq!(Numeric::hex(0x12345, 2).as_str(), "0x12345");
    }

    #[test]
    fn zero_width_field_is_rejected() {
        let err = Field::new("EN", 0, 0, AccessMode::ReadOnly).unwrap_err();
        assert!(matches!(err, ModelError::ZeroWidth(name) if name == "EN"));
    }

    #[test]
    fn register_rejects_overflowing_field() {
        let offset = Numeric::parse("0x0").expect("offset");
        let err = Register::new("CTRL", offset, 8, vec![field("A", 4, 5)]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FieldOverflow { bit_offset: 4, bit_width: 5, size: 8, .. }
        ));
    }

    #[test]
    fn register_reports_overlaps() {
        let offset = Numeric::parse("0x0").expect("offset");
        let reg = Register::new(
            "CTRL",
            offset,
            32,
            vec![field("A", 0, 4), field("B", 3, 2), field("C", 8, 8)],
        )
        .expect("register");
        assert_eq!(reg.overlapping_fields(), vec![("A", "B")]);
    }

    #[test]
    fn empty_optionals_are_dropped() {
        let f = field("A", 0, 1)
            .with_reset(Some("  ".into()))
            .with_description(Some(String::new()));
        assert_eq!(f.reset_value, None);
        assert_eq!(f.description, None);
    }

    #[test]
    fn memory_map_is_named_after_component() {
        let block = AddressBlock::new(
            "uart",
            Numeric::parse("0x4000").expect("base"),
            Numeric::parse("0x100").expect("range"),
            32,
        );
        let component = Component::new("acme", "periph", "soc", "1.0").with_address_blocks(vec![block]);
        assert_eq!(component.memory_maps().len(), 1);
        assert_eq!(component.memory_maps()[0].name(), "soc");
        assert_eq!(component.address_blocks().count(), 1);
    }
}
