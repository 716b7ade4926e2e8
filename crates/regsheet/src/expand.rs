//! Register sheet expansion.
//!
//! Rows are grouped by ADDR. A group whose REG carries the `{n}` placeholder
//! (for example `CH{n} n=0~3`) is cloned once per index with the address
//! advanced by the group's stride; every other group passes through with
//! its header rows removed. The concrete rows are then regrouped by REG in
//! first-seen order and turned into [`Register`]s.

use std::collections::HashMap;
use std::sync::OnceLock;

use ipxact_model::{Field, ModelError, Numeric, Register};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::attribute::{self, AttributeError};
use crate::bits::{self, BitError};
use crate::table::{register_rows, RegisterRow, Sheet, SheetError};

/// Reasons a whole ADDR group is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    /// `{n}` is present but the `n = <start>` / `~ <end>` range is not.
    #[error("malformed template range in '{0}'")]
    Template(String),
    /// ADDR is not a decimal or `0x` hex number.
    #[error("unparsable address '{0}'")]
    Address(String),
    /// The field widths of the group add up to less than one byte.
    #[error("register '{0}' has zero stride")]
    ZeroStride(String),
    /// The field widths add up to more bits than a register can hold.
    #[error("register '{0}' is too wide")]
    Oversize(String),
    /// The template range enumerates more instances than [`MAX_INSTANCES`].
    #[error("template '{reg}' expands to more than {MAX_INSTANCES} registers")]
    TooManyInstances { reg: String },
    /// An expanded instance address does not fit in 64 bits.
    #[error("address of '{reg}' instance {index} overflows")]
    AddressOverflow { reg: String, index: u64 },
}

/// Reasons a single field row is dropped.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Bit(#[from] BitError),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("bits {bit_offset}..{end} exceed register size {size}")]
    Overflow { bit_offset: u32, end: u64, size: u32 },
}

/// Upper bound on the registers one `{n}` template may expand to.
pub const MAX_INSTANCES: u64 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Template {
    base: String,
    first: u64,
    last: u64,
}

fn template_patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"^(.*?)\{n\}").expect("valid template regex"),
            Regex::new(r"n\s*=\s*(\d+)").expect("valid start regex"),
            Regex::new(r"~\s*(\d+)").expect("valid end regex"),
        )
    })
}

/// `None` for a plain register name; otherwise the parsed family template.
fn parse_template(reg: &str) -> Option<Result<Template, GroupError>> {
    let (placeholder, start, end) = template_patterns();
    let base = placeholder.captures(reg)?.get(1)?.as_str().trim().to_string();
    let number = |pattern: &Regex| {
        pattern
            .captures(reg)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    };
    let parsed = match (number(start), number(end)) {
        (Some(first), Some(last)) if first <= last && !base.is_empty() => {
            Ok(Template { base, first, last })
        }
        _ => Err(GroupError::Template(reg.to_string())),
    };
    Some(parsed)
}

/// One concrete register instance before its fields are parsed.
#[derive(Debug)]
struct Instance<'a> {
    reg: String,
    addr: Numeric,
    size_in_bits: u32,
    description: Option<&'a str>,
    rows: Vec<&'a RegisterRow>,
}

/// Rows sharing one ADDR value, in first-seen order.
fn group_by_addr(rows: &[RegisterRow]) -> Vec<Vec<&RegisterRow>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&RegisterRow>> = Vec::new();
    for row in rows {
        let slot = *index.entry(row.addr.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }
    groups
}

/// Group stride in bytes: the declared widths of every named row, reserved
/// ones included, rounded down to whole bytes.
fn stride_of(sheet: &str, rows: &[&RegisterRow]) -> u64 {
    let total: u64 = rows
        .iter()
        .filter(|row| row.is_field())
        .filter_map(|row| match bits::parse_width(&row.width) {
            Ok(width) => Some(u64::from(width)),
            Err(err) => {
                debug!(sheet, line = row.line, field = %row.field, %err, "width excluded from stride");
                None
            }
        })
        .sum();
    total / 8
}

fn expand_group<'a>(
    sheet: &str,
    rows: Vec<&'a RegisterRow>,
) -> Result<Vec<Instance<'a>>, GroupError> {
    let Some(head) = rows.first() else {
        return Ok(Vec::new());
    };
    let header_reg = head.reg.as_str();
    let description = rows
        .iter()
        .copied()
        .filter(|row| !row.is_field())
        .map(|row| row.description.as_str())
        .find(|text| !text.is_empty());
    let fields: Vec<&RegisterRow> = rows.iter().copied().filter(|row| row.is_field()).collect();
    if fields.is_empty() {
        debug!(sheet, register = header_reg, "group has no field rows");
        return Ok(Vec::new());
    }

    let address =
        Numeric::parse(&head.addr).map_err(|_| GroupError::Address(head.addr.clone()))?;
    let stride = stride_of(sheet, &fields);
    if stride == 0 {
        return Err(GroupError::ZeroStride(header_reg.to_string()));
    }
    let size_in_bits =
        u32::try_from(stride * 8).map_err(|_| GroupError::Oversize(header_reg.to_string()))?;

    let template = match parse_template(header_reg) {
        // Plain rows keep their own REG; `regroup` merges them by name.
        None => {
            let instances = fields
                .into_iter()
                .map(|row| Instance {
                    reg: row.reg.clone(),
                    addr: address.clone(),
                    size_in_bits,
                    description,
                    rows: vec![row],
                })
                .collect();
            return Ok(instances);
        }
        Some(template) => template?,
    };

    if template.last - template.first >= MAX_INSTANCES {
        return Err(GroupError::TooManyInstances {
            reg: header_reg.to_string(),
        });
    }
    let start = address
        .to_u64()
        .ok_or_else(|| GroupError::Address(head.addr.clone()))?;
    let digits = if address.is_hex() { address.digit_count() } else { 0 };
    let mut instances = Vec::with_capacity((template.last - template.first + 1) as usize);
    for index in template.first..=template.last {
        let offset = index
            .checked_mul(stride)
            .and_then(|delta| start.checked_add(delta))
            .ok_or_else(|| GroupError::AddressOverflow {
                reg: header_reg.to_string(),
                index,
            })?;
        instances.push(Instance {
            reg: format!("{}_{index}", template.base),
            addr: Numeric::hex(offset, digits),
            size_in_bits,
            description,
            rows: fields.clone(),
        });
    }
    debug!(
        sheet,
        register = header_reg,
        instances = instances.len(),
        stride,
        "expanded register family"
    );
    Ok(instances)
}

/// Merge instances sharing a REG name, keeping first-seen order; the first
/// occurrence supplies address, size and description.
fn regroup<'a>(instances: Vec<Instance<'a>>) -> Vec<Instance<'a>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Instance<'a>> = Vec::new();
    for instance in instances {
        match index.get(&instance.reg) {
            Some(&slot) => merged[slot].rows.extend(instance.rows),
            None => {
                index.insert(instance.reg.clone(), merged.len());
                merged.push(instance);
            }
        }
    }
    merged
}

fn build_field(
    sheet: &str,
    register: &str,
    row: &RegisterRow,
    size_in_bits: u32,
) -> Result<Field, FieldError> {
    let range = bits::parse_bit_range(&row.bit)?;
    let width = bits::parse_width(&row.width)?;
    let attribute = attribute::decode(&row.attribute)?;
    let field = Field::new(row.field.as_str(), range.lsb, width, attribute.access)?
        .with_modified_write(attribute.modified_write)
        .with_read_action(attribute.read_action)
        .with_reset(Some(row.default.clone()))
        .with_description(Some(row.description.clone()));
    if !field.fits(size_in_bits) {
        return Err(FieldError::Overflow {
            bit_offset: field.bit_offset,
            end: field.end_bit(),
            size: size_in_bits,
        });
    }
    if let Some(span) = range.width().filter(|span| *span != width) {
        warn!(
            sheet,
            line = row.line,
            register,
            field = %row.field,
            bit = %row.bit,
            declared = width,
            span,
            "declared width differs from bit range; keeping declared width"
        );
    }
    Ok(field)
}

fn build_register(sheet: &str, instance: Instance<'_>) -> Option<Register> {
    let mut fields = Vec::new();
    for row in instance.rows {
        if bits::is_reserved_field_name(&row.field) {
            continue;
        }
        match build_field(sheet, &instance.reg, row, instance.size_in_bits) {
            Ok(field) => fields.push(field),
            Err(err) => error!(
                sheet,
                line = row.line,
                register = %instance.reg,
                field = %row.field,
                %err,
                "dropping field"
            ),
        }
    }
    if fields.is_empty() {
        debug!(sheet, register = %instance.reg, "no named fields; skipping register");
        return None;
    }
    let built = Register::new(
        instance.reg.as_str(),
        instance.addr,
        instance.size_in_bits,
        fields,
    );
    let register = match built {
        Ok(register) => register.with_description(instance.description.map(str::to_string)),
        Err(err) => {
            error!(sheet, register = %instance.reg, %err, "dropping register");
            return None;
        }
    };
    for (first, second) in register.overlapping_fields() {
        warn!(sheet, register = register.name(), first, second, "fields overlap");
    }
    Some(register)
}

/// Expand already forward-filled rows of one sheet into registers.
///
/// Group and field errors are logged and the offending group or field is
/// dropped; they never fail the sheet.
pub fn expand_rows(sheet: &str, rows: &[RegisterRow]) -> Vec<Register> {
    let mut instances = Vec::new();
    for group in group_by_addr(rows) {
        let line = group.first().map(|row| row.line).unwrap_or_default();
        let reg = group.first().map(|row| row.reg.clone()).unwrap_or_default();
        match expand_group(sheet, group) {
            Ok(expanded) => instances.extend(expanded),
            Err(err) => warn!(sheet, line, register = %reg, %err, "dropping register group"),
        }
    }
    regroup(instances)
        .into_iter()
        .filter_map(|instance| build_register(sheet, instance))
        .collect()
}

/// Read a register sheet and expand it into registers.
pub fn expand_sheet(sheet: &Sheet) -> Result<Vec<Register>, SheetError> {
    let rows = register_rows(sheet)?;
    let registers = expand_rows(&sheet.name, &rows);
    debug!(sheet = %sheet.name, rows = rows.len(), registers = registers.len(), "expanded sheet");
    Ok(registers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipxact_model::{AccessMode, ModifiedWrite};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a subscriber that records formatted events.
    fn captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().expect("log buffer").clone();
        (out, String::from_utf8_lossy(&bytes).into_owned())
    }

    const HEADER: [&str; 8] = [
        "ADDR",
        "REG",
        "FIELD",
        "BIT",
        "WIDTH",
        "ATTRIBUTE",
        "DEFAULT",
        "DESCRIPTION",
    ];

    fn sheet(rows: &[[&str; 8]]) -> Sheet {
        let mut all = vec![HEADER];
        all.extend_from_slice(rows);
        Sheet::from_rows("blk", all)
    }

    fn names(registers: &[Register]) -> Vec<&str> {
        registers.iter().map(Register::name).collect()
    }

    #[test]
    fn template_parsing() {
        assert_eq!(parse_template("CTRL"), None);
        assert_eq!(
            parse_template("FOO{n}, n = 0 ~ 3"),
            Some(Ok(Template {
                base: "FOO".into(),
                first: 0,
                last: 3
            }))
        );
        assert!(matches!(
            parse_template("FOO{n}"),
            Some(Err(GroupError::Template(_)))
        ));
        assert!(matches!(
            parse_template("FOO{n} n=4~1"),
            Some(Err(GroupError::Template(_)))
        ));
    }

    #[test]
    fn templated_family_is_enumerated() {
        let sheet = sheet(&[
            ["0x100", "FOO{n} n=0~3", "", "", "", "", "", "channel"],
            ["", "", "LO", "[15:0]", "16", "RW", "0x0", ""],
            ["", "", "HI", "[31:16]", "16", "W1C", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(names(&registers), ["FOO_0", "FOO_1", "FOO_2", "FOO_3"]);
        let addresses: Vec<&str> = registers.iter().map(|r| r.address_offset().as_str()).collect();
        assert_eq!(addresses, ["0x100", "0x104", "0x108", "0x10C"]);
        for register in &registers {
            assert_eq!(register.size_in_bits(), 32);
            assert_eq!(register.fields().len(), 2);
            assert_eq!(register.description(), Some("channel"));
        }
        let hi = &registers[2].fields()[1];
        assert_eq!(hi.bit_offset, 16);
        assert_eq!(hi.modified_write_value, Some(ModifiedWrite::OneToClear));
    }

    #[test]
    fn plain_register_passes_through() {
        let sheet = sheet(&[
            ["0x0", "CTRL", "EN", "[0]", "1", "RW", "0x1", "enable"],
            ["", "", "MODE", "[7:1]", "7", "RO", "", ""],
            ["0x8", "STATUS", "", "", "", "", "", ""],
            ["", "", "BUSY", "[0]", "8", "RO", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(names(&registers), ["CTRL", "STATUS"]);
        assert_eq!(registers[0].address_offset().as_str(), "0x0");
        assert_eq!(registers[1].address_offset().as_str(), "0x8");
        assert_eq!(registers[0].size_in_bits(), 8);
        let en = &registers[0].fields()[0];
        assert_eq!(en.access, AccessMode::ReadWrite);
        assert_eq!(en.reset_value.as_deref(), Some("0x1"));
        assert_eq!(en.description.as_deref(), Some("enable"));
        assert_eq!(registers[0].fields()[1].reset_value, None);
    }

    #[test]
    fn reserved_width_counts_toward_size() {
        let sheet = sheet(&[
            ["0x10", "CFG", "EN", "[0]", "1", "RW", "", ""],
            ["", "", "rsvd3", "[15:1]", "15", "RO", "", ""],
            ["", "", "DIV", "[31:16]", "16", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(registers.len(), 1);
        assert_eq!(registers[0].size_in_bits(), 32);
        let fields: Vec<&str> = registers[0].fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["EN", "DIV"]);
    }

    #[test]
    fn fully_reserved_register_is_skipped() {
        let sheet = sheet(&[
            ["0x0", "PAD", "RESERVED", "[31:0]", "32", "RO", "", ""],
            ["0x4", "DATA", "D", "[31:0]", "32", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(names(&registers), ["DATA"]);
    }

    #[test]
    fn bad_rows_drop_only_their_field() {
        let sheet = sheet(&[
            ["0x0", "CTRL", "A", "[0]", "1", "RW", "", ""],
            ["", "", "B", "bit one", "1", "RW", "", ""],
            ["", "", "C", "[2]", "1", "XYZ", "", ""],
            ["", "", "D", "[3]", "5", "RO", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(registers.len(), 1);
        let fields: Vec<&str> = registers[0].fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["A", "D"]);
    }

    #[test]
    fn overflowing_field_is_dropped() {
        // 12 declared bits round down to one byte.
        let sheet = sheet(&[
            ["0x0", "R", "LO", "[3:0]", "4", "RW", "", ""],
            ["", "", "HI", "[11:4]", "8", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(registers[0].size_in_bits(), 8);
        assert_eq!(registers[0].fields().len(), 1);
        assert_eq!(registers[0].fields()[0].name, "LO");
    }

    #[test]
    fn malformed_groups_do_not_fail_the_sheet() {
        let sheet = sheet(&[
            ["0x0", "BAD{n}", "F", "[0]", "8", "RW", "", ""],
            ["zz", "WORSE", "F", "[0]", "8", "RW", "", ""],
            ["0x8", "TINY", "F", "[0]", "1", "RW", "", ""],
            ["0xC", "GOOD", "F", "[0]", "8", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(names(&registers), ["GOOD"]);
    }

    #[test]
    fn registers_keep_first_seen_order() {
        let sheet = sheet(&[
            ["0x20", "ZED", "F", "[0]", "8", "RW", "", ""],
            ["0x0", "ALPHA", "F", "[0]", "8", "RW", "", ""],
            ["0x10", "MID{n} n=1~2", "F", "[0]", "8", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(names(&registers), ["ZED", "ALPHA", "MID_1", "MID_2"]);
        assert_eq!(registers[2].address_offset().as_str(), "0x11");
        assert_eq!(registers[3].address_offset().as_str(), "0x12");
    }

    #[test]
    fn plain_rows_keep_their_register_name() {
        // ADDR left blank on the second register: both share the group.
        let sheet = sheet(&[
            ["0x0", "LO", "A", "[3:0]", "4", "RW", "", ""],
            ["", "HI", "B", "[7:4]", "4", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(names(&registers), ["LO", "HI"]);
        assert_eq!(registers[1].address_offset().as_str(), "0x0");
    }

    #[test]
    fn overlapping_fields_are_kept() {
        let sheet = sheet(&[
            ["0x0", "R", "A", "[3:0]", "4", "RW", "", ""],
            ["", "", "B", "[5:2]", "4", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(registers[0].overlapping_fields(), vec![("A", "B")]);
    }

    #[test]
    fn width_mismatch_warning_names_sheet_and_register() {
        let mut all = vec![HEADER];
        all.push(["0x0", "CTRL", "EN", "[3:0]", "8", "RW", "", ""]);
        let sheet = Sheet::from_rows("dma_regs", all);
        let (registers, logs) = captured_logs(|| expand_sheet(&sheet).expect("sheet"));
        assert_eq!(registers[0].fields()[0].bit_width, 8);
        let line = logs
            .lines()
            .find(|line| line.contains("declared width differs"))
            .expect("mismatch warning");
        assert!(line.contains("dma_regs"), "{line}");
        assert!(line.contains("CTRL"), "{line}");
        assert!(line.contains("EN"), "{line}");
    }

    #[test]
    fn oversized_template_range_is_rejected() {
        assert!(matches!(
            parse_template("FOO{n} n=0~4000000000").map(|t| t.map(|t| t.last)),
            Some(Ok(4_000_000_000))
        ));
        let sheet = sheet(&[
            ["0x0", "FOO{n} n=0~4000000000", "F", "[7:0]", "8", "RW", "", ""],
            ["0x1000", "EDGE{n} n=0~4095", "F", "[7:0]", "8", "RW", "", ""],
            ["0x8000", "OVER{n} n=1~4097", "F", "[7:0]", "8", "RW", "", ""],
        ]);
        let registers = expand_sheet(&sheet).expect("sheet");
        assert_eq!(registers.len(), MAX_INSTANCES as usize);
        assert!(registers.iter().all(|r| r.name().starts_with("EDGE_")));
    }
}
