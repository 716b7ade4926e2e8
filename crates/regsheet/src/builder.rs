//! Vendor / address-map sheet parsing and final document assembly.

use std::collections::HashSet;

use ipxact_model::{AddressBlock, Component, Numeric, Register};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::table::{Sheet, SheetError};

/// Errors that abort a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("vendor sheet '{0}' not found")]
    MissingVendorSheet(String),
    #[error("address map sheet '{0}' not found")]
    MissingAddressSheet(String),
    #[error("vendor sheet: {0}")]
    VendorSheet(#[source] SheetError),
    /// One of VENDOR, LIBRARY, NAME or VERSION has no value.
    #[error("tag '{0}' not found in vendor sheet")]
    MissingVendorTag(String),
    #[error("address map sheet: {0}")]
    AddressSheet(#[source] SheetError),
    #[error("no address blocks parsed")]
    NoAddressBlocks,
}

/// Identity of the component, read from the vendor sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRecord {
    pub vendor: String,
    pub library: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

/// Read the TAG/VALUE vendor sheet.
///
/// VENDOR, LIBRARY, NAME and VERSION are required; DESCRIPTION is optional.
/// Tags match case-insensitively and the first occurrence wins.
pub fn parse_vendor_sheet(sheet: &Sheet) -> Result<VendorRecord, BuildError> {
    let columns = sheet
        .columns(&["TAG", "VALUE"])
        .map_err(BuildError::VendorSheet)?;
    let (tag_column, value_column) = (columns[0], columns[1]);

    let lookup = |tag: &str| -> Option<String> {
        (0..sheet.rows.len())
            .find(|&row| {
                sheet
                    .cell(row, tag_column)
                    .is_some_and(|text| text.eq_ignore_ascii_case(tag))
            })
            .and_then(|row| sheet.cell(row, value_column))
            .map(str::to_string)
    };
    let required =
        |tag: &str| lookup(tag).ok_or_else(|| BuildError::MissingVendorTag(tag.to_string()));

    let record = VendorRecord {
        vendor: required("VENDOR")?,
        library: required("LIBRARY")?,
        name: required("NAME")?,
        version: required("VERSION")?,
        description: lookup("DESCRIPTION"),
    };
    debug!(sheet = %sheet.name, vendor = %record.vendor, name = %record.name, "parsed vendor sheet");
    Ok(record)
}

/// Read the BLOCK/OFFSET/RANGE address-map sheet into register-less blocks.
///
/// Rows missing a value or carrying a non-numeric offset/range are skipped
/// with a warning, as are repeated block names. A sheet without the columns
/// at all is an error.
pub fn parse_address_map_sheet(
    sheet: &Sheet,
    width: u32,
) -> Result<Vec<AddressBlock>, BuildError> {
    let columns = sheet
        .columns(&["BLOCK", "OFFSET", "RANGE"])
        .map_err(BuildError::AddressSheet)?;
    let description = sheet.column("DESCRIPTION");

    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    for row in 0..sheet.rows.len() {
        let line = row + 2;
        let cells: Vec<Option<&str>> = columns.iter().map(|&c| sheet.cell(row, c)).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        let [Some(name), Some(offset), Some(range)] = [cells[0], cells[1], cells[2]] else {
            warn!(sheet = %sheet.name, line, "address map row lacks BLOCK/OFFSET/RANGE; skipping");
            continue;
        };
        let (base, size) = match (Numeric::parse(offset), Numeric::parse(range)) {
            (Ok(base), Ok(size)) => (base, size),
            (Err(err), _) | (_, Err(err)) => {
                warn!(sheet = %sheet.name, line, block = name, %err, "skipping address block");
                continue;
            }
        };
        if !seen.insert(name.to_string()) {
            warn!(sheet = %sheet.name, line, block = name, "duplicate address block; skipping");
            continue;
        }
        let text = description.and_then(|c| sheet.cell(row, c)).map(str::to_string);
        blocks.push(AddressBlock::new(name, base, size, width).with_description(text));
    }
    debug!(sheet = %sheet.name, blocks = blocks.len(), "parsed address map");
    Ok(blocks)
}

/// Collects per-sheet register lists and assembles the component.
#[derive(Debug)]
pub struct DocumentBuilder {
    vendor: VendorRecord,
    blocks: Vec<AddressBlock>,
    sheets: Vec<(String, Vec<Register>)>,
}

impl DocumentBuilder {
    /// Start a document; at least one address block is required.
    pub fn new(vendor: VendorRecord, blocks: Vec<AddressBlock>) -> Result<Self, BuildError> {
        if blocks.is_empty() {
            return Err(BuildError::NoAddressBlocks);
        }
        Ok(DocumentBuilder {
            vendor,
            blocks,
            sheets: Vec::new(),
        })
    }

    /// Record the registers expanded from register sheet `name`.
    pub fn add_sheet(&mut self, name: impl Into<String>, registers: Vec<Register>) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(sheet, _)| *sheet == name) {
            Some((_, existing)) => existing.extend(registers),
            None => self.sheets.push((name, registers)),
        }
    }

    /// Attach every sheet's registers to the address block of the same name.
    ///
    /// Blocks without a sheet keep an empty register list; sheets without a
    /// block are reported and left out.
    pub fn build(self) -> Component {
        let DocumentBuilder {
            vendor,
            blocks,
            mut sheets,
        } = self;

        let blocks: Vec<AddressBlock> = blocks
            .into_iter()
            .map(|block| {
                match sheets.iter().position(|(sheet, _)| sheet == block.name()) {
                    Some(index) => {
                        let (_, registers) = sheets.remove(index);
                        info!(block = block.name(), registers = registers.len(), "mapped registers");
                        block.with_registers(registers)
                    }
                    None => {
                        warn!(block = block.name(), "no register sheet for address block");
                        block
                    }
                }
            })
            .collect();
        for (sheet, registers) in &sheets {
            warn!(
                sheet = %sheet,
                registers = registers.len(),
                "register sheet has no matching address block"
            );
        }

        Component::new(vendor.vendor, vendor.library, vendor.name, vendor.version)
            .with_description(vendor.description)
            .with_address_blocks(blocks)
    }
}
