use std::path::PathBuf;

use anyhow::{Context, Result};
use ipxact_model::Component;
use serde::Serialize;
use tracing::info;

use crate::common;
use crate::config::Config;
use crate::workbook::read_workbook;

#[derive(Debug, Clone, Default)]
pub struct InspectArgs {
    pub excel: PathBuf,
    pub vendor_sheet: Option<String>,
    pub address_sheet: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterEntry {
    pub block: String,
    /// `None` for an address block without registers.
    pub register: Option<String>,
    pub offset: String,
    pub size: u32,
    pub fields: usize,
}

/// One entry per register, plus one register-less entry for every empty
/// address block.
pub fn summarize(component: &Component) -> Vec<RegisterEntry> {
    let mut entries = Vec::new();
    for block in component.address_blocks() {
        if block.registers().is_empty() {
            entries.push(RegisterEntry {
                block: block.name().to_string(),
                register: None,
                offset: block.base_address().to_string(),
                size: 0,
                fields: 0,
            });
        }
        for register in block.registers() {
            entries.push(RegisterEntry {
                block: block.name().to_string(),
                register: Some(register.name().to_string()),
                offset: register.address_offset().to_string(),
                size: register.size_in_bits(),
                fields: register.fields().len(),
            });
        }
    }
    entries
}

pub fn run(args: InspectArgs, config: &Config) -> Result<()> {
    let workbook = read_workbook(&args.excel)?;
    let names = config.sheet_names(args.vendor_sheet, args.address_sheet);
    let component = regsheet::convert(&workbook, &names).context("conversion aborted")?;
    let entries = summarize(&component);
    info!(count = entries.len(), "inspected workbook");

    if args.json {
        common::print_json(&entries)?;
        return Ok(());
    }

    println!(
        "{:<16} {:<24} {:<12} {:>5} {:>6}",
        "BLOCK", "REGISTER", "OFFSET", "SIZE", "FIELDS"
    );
    for entry in &entries {
        println!(
            "{:<16} {:<24} {:<12} {:>5} {:>6}",
            entry.block,
            entry.register.as_deref().unwrap_or("-"),
            entry.offset,
            entry.size,
            entry.fields,
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipxact_model::{AccessMode, AddressBlock, Field, Numeric, Register};

    #[test]
    fn summary_lists_registers_and_empty_blocks() {
        let field = Field::new("EN", 0, 1, AccessMode::ReadWrite).expect("field");
        let number = |text: &str| Numeric::parse(text).expect("number");
        let register = Register::new("CTRL", number("0x4"), 32, vec![field]).expect("register");
        let blocks = vec![
            AddressBlock::new("uart", number("0x1000"), number("0x100"), 32)
                .with_registers(vec![register]),
            AddressBlock::new("rom", number("0x2000"), number("0x100"), 32),
        ];
        let component = Component::new("acme", "ip", "soc", "1.0").with_address_blocks(blocks);

        let entries = summarize(&component);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].register.as_deref(), Some("CTRL"));
        assert_eq!(entries[0].offset, "0x4");
        assert_eq!(entries[0].fields, 1);
        assert_eq!(entries[1].block, "rom");
        assert_eq!(entries[1].register, None);
    }
}
