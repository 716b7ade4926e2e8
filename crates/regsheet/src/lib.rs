//! Spreadsheet register maps to the IP-XACT document model.
//!
//! A [`Workbook`] holds three kinds of sheets, told apart by name: a vendor
//! sheet (TAG/VALUE), an address map sheet (BLOCK/OFFSET/RANGE) and one
//! register sheet per address block (ADDR/REG/FIELD/BIT/WIDTH/ATTRIBUTE
//! plus optional DEFAULT/DESCRIPTION). [`convert`] turns the workbook into an
//! [`ipxact_model::Component`].
//!
//! Problems confined to one field row or one register group are logged and
//! the row or group is dropped; only [`BuildError`] aborts a run.

pub mod attribute;
pub mod bits;
mod builder;
mod expand;
mod table;

use ipxact_model::Component;
use tracing::{info, warn};

pub use attribute::{decode, Attribute, AttributeError};
pub use bits::{is_reserved_field_name, parse_bit_offset, BitError, BitRange};
pub use builder::{
    parse_address_map_sheet, parse_vendor_sheet, BuildError, DocumentBuilder, VendorRecord,
};
pub use expand::{expand_rows, expand_sheet, FieldError, GroupError, MAX_INSTANCES};
pub use table::{register_rows, Cell, RegisterRow, Sheet, SheetError, Workbook, REGISTER_COLUMNS};

/// Default name of the vendor sheet.
pub const DEFAULT_VENDOR_SHEET: &str = "version";
/// Default name of the address map sheet.
pub const DEFAULT_ADDRESS_SHEET: &str = "address_map";
/// Default `width` of every address block.
pub const DEFAULT_BLOCK_WIDTH: u32 = 32;

/// Names of the special sheets and the block width applied to every block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub vendor: String,
    pub address: String,
    pub block_width: u32,
}

impl Default for SheetNames {
    fn default() -> Self {
        SheetNames {
            vendor: DEFAULT_VENDOR_SHEET.to_string(),
            address: DEFAULT_ADDRESS_SHEET.to_string(),
            block_width: DEFAULT_BLOCK_WIDTH,
        }
    }
}

/// Convert `workbook` into a component.
///
/// Register sheets are expanded in workbook order. A sheet that lacks the
/// register columns is skipped with a warning.
pub fn convert(workbook: &Workbook, names: &SheetNames) -> Result<Component, BuildError> {
    let vendor_sheet = workbook
        .sheet(&names.vendor)
        .ok_or_else(|| BuildError::MissingVendorSheet(names.vendor.clone()))?;
    let vendor = parse_vendor_sheet(vendor_sheet)?;

    let address_sheet = workbook
        .sheet(&names.address)
        .ok_or_else(|| BuildError::MissingAddressSheet(names.address.clone()))?;
    let blocks = parse_address_map_sheet(address_sheet, names.block_width)?;

    let mut builder = DocumentBuilder::new(vendor, blocks)?;
    for sheet in &workbook.sheets {
        if sheet.name == names.vendor || sheet.name == names.address {
            continue;
        }
        info!(sheet = %sheet.name, "reading register sheet");
        match expand_sheet(sheet) {
            Ok(registers) => builder.add_sheet(sheet.name.as_str(), registers),
            Err(err) => warn!(sheet = %sheet.name, %err, "not a register sheet; skipping"),
        }
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> Workbook {
        Workbook::new(vec![
            Sheet::from_rows(
                "version",
                [
                    ["TAG", "VALUE"],
                    ["VENDOR", "acme"],
                    ["LIBRARY", "ip"],
                    ["NAME", "soc"],
                    ["VERSION", "1.0"],
                ],
            ),
            Sheet::from_rows(
                "address_map",
                [
                    ["BLOCK", "OFFSET", "RANGE"],
                    ["uart", "0x1000", "0x100"],
                ],
            ),
            Sheet::from_rows("README", [["notes"], ["free text"]]),
            Sheet::from_rows(
                "uart",
                [
                    ["ADDR", "REG", "FIELD", "BIT", "WIDTH", "ATTRIBUTE"],
                    ["0x0", "DATA", "D", "[7:0]", "8", "RW"],
                ],
            ),
        ])
    }

    #[test]
    fn default_names() {
        let names = SheetNames::default();
        assert_eq!(names.vendor, "version");
        assert_eq!(names.address, "address_map");
        assert_eq!(names.block_width, 32);
    }

    #[test]
    fn converts_and_skips_auxiliary_sheets() {
        let component = convert(&workbook(), &SheetNames::default()).expect("convert");
        assert_eq!(component.name(), "soc");
        let block = component.address_blocks().next().expect("block");
        assert_eq!(block.registers().len(), 1);
        assert_eq!(block.registers()[0].name(), "DATA");
    }

    #[test]
    fn renamed_special_sheets() {
        let names = SheetNames {
            vendor: "identity".into(),
            ..SheetNames::default()
        };
        assert_eq!(
            convert(&workbook(), &names).unwrap_err(),
            BuildError::MissingVendorSheet("identity".into())
        );

        let mut book = workbook();
        book.sheets[0].name = "identity".into();
        assert!(convert(&book, &names).is_ok());
    }
}
