//! Spreadsheet register maps to IP-XACT.
//!
//! Aggregates the workspace libraries: [`model`] holds the IP-XACT document
//! model with its XML/RegVue serializers, [`sheet`] converts in-memory
//! workbook tables into that model. The `irgen` binary lives in
//! `crates/irgen`.

pub use ipxact_model as model;
pub use regsheet as sheet;
