//! Schema validation of a written IP-XACT document.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use ipxact_model::SchemaVersion;
use tracing::debug;

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub passed: bool,
    pub diagnostics: Vec<String>,
}

/// Checks a document on disk against a schema revision.
pub trait SchemaValidator {
    fn name(&self) -> &'static str;
    fn validate(&self, document: &Path, version: SchemaVersion) -> Result<Validation>;
}

/// Runs `xmllint --schema` against `<xsd_dir>/<version>/index.xsd`.
#[derive(Debug, Clone)]
pub struct XmllintValidator {
    xsd_dir: PathBuf,
}

impl XmllintValidator {
    pub fn new(xsd_dir: impl Into<PathBuf>) -> Self {
        XmllintValidator {
            xsd_dir: xsd_dir.into(),
        }
    }

    pub fn schema_path(&self, version: SchemaVersion) -> PathBuf {
        self.xsd_dir.join(version.as_str()).join("index.xsd")
    }
}

impl SchemaValidator for XmllintValidator {
    fn name(&self) -> &'static str {
        "xmllint"
    }

    fn validate(&self, document: &Path, version: SchemaVersion) -> Result<Validation> {
        let schema = self.schema_path(version);
        if !schema.is_file() {
            bail!("schema {} not found", schema.display());
        }
        let output = Command::new("xmllint")
            .arg("--noout")
            .arg("--schema")
            .arg(&schema)
            .arg(document)
            .output()
            .context("run xmllint")?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(status = ?output.status, "xmllint finished");
        let diagnostics = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.ends_with(" validates"))
            .map(str::to_string)
            .collect();
        Ok(Validation {
            passed: output.status.success(),
            diagnostics,
        })
    }
}

/// Re-reads the document with the built-in structural checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl SchemaValidator for StructuralValidator {
    fn name(&self) -> &'static str {
        "structural check"
    }

    fn validate(&self, document: &Path, version: SchemaVersion) -> Result<Validation> {
        let bytes = std::fs::read(document)
            .with_context(|| format!("read {}", document.display()))?;
        let report = ipxact_model::check(&bytes, version)
            .with_context(|| format!("parse {}", document.display()))?;
        Ok(Validation {
            passed: report.passed(),
            diagnostics: report.diagnostics,
        })
    }
}

/// `xmllint` when a schema directory is configured, the structural checker
/// otherwise.
pub fn validator_for(xsd_dir: Option<PathBuf>) -> Box<dyn SchemaValidator> {
    match xsd_dir {
        Some(dir) => Box::new(XmllintValidator::new(dir)),
        None => Box::new(StructuralValidator),
    }
}
