//! Decoder for the shorthand access tokens of the ATTRIBUTE column.

use std::collections::HashMap;
use std::sync::OnceLock;

use ipxact_model::{AccessMode, ModifiedWrite, ReadAction};
use thiserror::Error;

/// Errors produced while decoding an attribute token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// The token is not part of the recognised vocabulary.
    #[error("unrecognized attribute token '{0}'")]
    Unrecognized(String),
}

/// Access semantics implied by one attribute token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub access: AccessMode,
    pub modified_write: Option<ModifiedWrite>,
    pub read_action: Option<ReadAction>,
}

impl Attribute {
    const fn new(
        access: AccessMode,
        modified_write: Option<ModifiedWrite>,
        read_action: Option<ReadAction>,
    ) -> Self {
        Attribute {
            access,
            modified_write,
            read_action,
        }
    }
}

use AccessMode::{ReadOnly, ReadWrite, WriteOnce, WriteOnly};
use ModifiedWrite as W;
use ReadAction as R;

/// Recognised tokens (upper case) and what each one means.
const ENTRIES: [(&str, Attribute); 25] = [
    ("RO", Attribute::new(ReadOnly, None, None)),
    ("RW", Attribute::new(ReadWrite, None, None)),
    ("RC", Attribute::new(ReadWrite, None, Some(R::Clear))),
    ("RS", Attribute::new(ReadWrite, None, Some(R::Set))),
    ("WO", Attribute::new(WriteOnly, None, None)),
    ("WC", Attribute::new(WriteOnly, Some(W::Clear), None)),
    ("WS", Attribute::new(WriteOnly, Some(W::Set), None)),
    ("WRC", Attribute::new(ReadWrite, Some(W::OneToClear), Some(R::Clear))),
    ("WRS", Attribute::new(ReadWrite, Some(W::OneToSet), Some(R::Set))),
    ("WSRC", Attribute::new(ReadWrite, Some(W::OneToSet), Some(R::Clear))),
    ("WCRS", Attribute::new(ReadWrite, Some(W::OneToClear), Some(R::Set))),
    ("W1C", Attribute::new(ReadWrite, Some(W::OneToClear), None)),
    ("W1S", Attribute::new(ReadWrite, Some(W::OneToSet), None)),
    ("W1T", Attribute::new(ReadWrite, Some(W::OneToToggle), None)),
    ("W0C", Attribute::new(ReadWrite, Some(W::ZeroToClear), None)),
    ("W0S", Attribute::new(ReadWrite, Some(W::ZeroToSet), None)),
    ("W0T", Attribute::new(ReadWrite, Some(W::ZeroToToggle), None)),
    ("W1SRC", Attribute::new(ReadWrite, Some(W::OneToSet), Some(R::Clear))),
    ("W1CRS", Attribute::new(ReadWrite, Some(W::OneToClear), Some(R::Set))),
    ("W0SRC", Attribute::new(ReadWrite, Some(W::ZeroToSet), Some(R::Clear))),
    ("W0CRS", Attribute::new(ReadWrite, Some(W::ZeroToClear), Some(R::Set))),
    ("W1", Attribute::new(WriteOnce, None, None)),
    ("WO1", Attribute::new(WriteOnce, None, None)),
    ("WOC", Attribute::new(WriteOnly, Some(W::Clear), None)),
    ("WOS", Attribute::new(WriteOnly, Some(W::Set), None)),
];

fn table() -> &'static HashMap<&'static str, Attribute> {
    static TABLE: OnceLock<HashMap<&'static str, Attribute>> = OnceLock::new();
    TABLE.get_or_init(|| ENTRIES.into_iter().collect())
}

/// Every recognised token, in vocabulary order.
pub fn tokens() -> impl Iterator<Item = &'static str> {
    ENTRIES.iter().map(|(token, _)| *token)
}

/// Decode `token` (case-insensitive, surrounding whitespace ignored).
pub fn decode(token: &str) -> Result<Attribute, AttributeError> {
    let key = token.trim().to_ascii_uppercase();
    table()
        .get(key.as_str())
        .copied()
        .ok_or_else(|| AttributeError::Unrecognized(token.trim().to_string()))
}

pub fn access_mode_of(token: &str) -> Result<AccessMode, AttributeError> {
    decode(token).map(|attr| attr.access)
}

pub fn modified_write_of(token: &str) -> Result<Option<ModifiedWrite>, AttributeError> {
    decode(token).map(|attr| attr.modified_write)
}

pub fn read_action_of(token: &str) -> Result<Option<ReadAction>, AttributeError> {
    decode(token).map(|attr| attr.read_action)
}
