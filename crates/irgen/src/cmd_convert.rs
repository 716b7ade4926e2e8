use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use ipxact_model::{to_regvue_json, to_xml, Component, SchemaVersion};
use regsheet::Workbook;
use tracing::{error, info, warn};

use crate::common;
use crate::config::Config;
use crate::validate::{validator_for, SchemaValidator};
use crate::workbook::read_workbook;

/// Document format written by `convert`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// IP-XACT XML
    #[default]
    Ipxact,
    /// RegVue register-description JSON
    Regvue,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ipxact => "xml",
            OutputFormat::Regvue => "json",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub excel: PathBuf,
    pub output: Option<PathBuf>,
    pub vendor_sheet: Option<String>,
    pub address_sheet: Option<String>,
    pub ipxact_version: Option<String>,
    pub format: OutputFormat,
    pub xsd_dir: Option<PathBuf>,
    pub no_validate: bool,
}

pub fn run(args: ConvertArgs, config: &Config) -> Result<()> {
    // Reject the schema selector before touching the workbook.
    config.schema_version(args.ipxact_version.as_deref())?;
    let workbook = read_workbook(&args.excel)?;
    info!(file = %args.excel.display(), sheets = workbook.sheets.len(), "read workbook");
    execute(&workbook, &args, config)?;
    Ok(())
}

/// Convert an already loaded workbook, write the document and validate it.
///
/// The document is written before validation, so a failing document stays on
/// disk for inspection while the error is returned.
pub fn execute(workbook: &Workbook, args: &ConvertArgs, config: &Config) -> Result<PathBuf> {
    let version = config.schema_version(args.ipxact_version.as_deref())?;
    let names = config.sheet_names(args.vendor_sheet.clone(), args.address_sheet.clone());
    let component = regsheet::convert(workbook, &names).context("conversion aborted")?;
    log_summary(&component);

    let bytes = render(&component, args.format, version)?;
    let output = args
        .output
        .clone()
        .or_else(|| config.output.clone())
        .unwrap_or_else(|| common::default_output(&args.excel, args.format));
    common::write_output(&output, &bytes)?;

    if args.no_validate {
        return Ok(output);
    }
    if args.format != OutputFormat::Ipxact {
        info!("schema validation applies to IP-XACT output only");
        return Ok(output);
    }
    let validator = validator_for(config.xsd_dir(args.xsd_dir.clone()));
    validate(validator.as_ref(), &output, version)?;
    Ok(output)
}

pub fn render(
    component: &Component,
    format: OutputFormat,
    version: SchemaVersion,
) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Ipxact => to_xml(component, version).context("render IP-XACT XML")?,
        OutputFormat::Regvue => to_regvue_json(component).context("render RegVue JSON")?,
    };
    Ok(bytes)
}

fn validate(
    validator: &dyn SchemaValidator,
    output: &Path,
    version: SchemaVersion,
) -> Result<()> {
    let validation = validator
        .validate(output, version)
        .with_context(|| format!("{} of {}", validator.name(), output.display()))?;
    if validation.passed {
        info!(file = %output.display(), validator = validator.name(), "document is valid");
        return Ok(());
    }
    for diagnostic in &validation.diagnostics {
        error!(validator = validator.name(), "{diagnostic}");
    }
    bail!(
        "{} failed schema validation ({} diagnostics)",
        output.display(),
        validation.diagnostics.len()
    );
}

fn log_summary(component: &Component) {
    for block in component.address_blocks() {
        if block.registers().is_empty() {
            warn!(block = block.name(), "address block has no registers");
        }
    }
    let registers: usize = component.address_blocks().map(|b| b.registers().len()).sum();
    info!(
        component = component.name(),
        blocks = component.address_blocks().count(),
        registers,
        "built component"
    );
}
