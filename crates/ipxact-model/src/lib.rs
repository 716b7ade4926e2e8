#![cfg_attr(docsrs, feature(doc_cfg))]
//! IP-XACT memory-map document model and its serializers.
//!
//! The model covers the vendor / memory-map / address-block / register /
//! field subset of IEEE 1685. It is built once per conversion run and handed
//! to [`to_xml`] (or [`to_regvue_json`]) for rendering; [`check`] re-reads a
//! rendered document and reports structural violations.

use thiserror::Error;

pub mod check;
mod model;
pub mod regvue;
mod version;
mod write;

pub use check::{check, CheckReport};
pub use model::{
    AccessMode, AddressBlock, Component, Field, MemoryMap, ModifiedWrite, Numeric, ReadAction,
    Register,
};
pub use regvue::to_regvue_json;
pub use version::SchemaVersion;
pub use write::to_xml;

/// Errors produced while building or rendering the document model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Text that should hold an unsigned number (decimal or `0x` hex) does not.
    #[error("invalid numeric value '{0}'")]
    InvalidNumber(String),
    /// A field declared with zero bits.
    #[error("field '{0}' has zero bit width")]
    ZeroWidth(String),
    /// A register declared with zero bits.
    #[error("register '{0}' has zero size")]
    ZeroSize(String),
    /// Field bits extend past the end of the owning register.
    #[error(
        "field '{field}' (offset {bit_offset}, width {bit_width}) exceeds register '{register}' size {size} bits"
    )]
    FieldOverflow {
        register: String,
        field: String,
        bit_offset: u32,
        bit_width: u32,
        size: u32,
    },
    /// The selector does not name any known IP-XACT revision.
    #[error("unknown IP-XACT version: {0}")]
    UnknownVersion(String),
    /// The IP-XACT revision is recognised but cannot be rendered.
    #[error("IP-XACT version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("xml: {0}")]
    Xml(String),
    #[error("json: {0}")]
    Json(String),
}
