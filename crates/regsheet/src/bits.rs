//! Parsing helpers for the BIT and WIDTH columns and reserved field names.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors produced while reading bit positions and widths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// The BIT cell is empty.
    #[error("missing bit range")]
    Missing,
    /// The BIT cell is not in `[msb:lsb]` or `[bit]` notation.
    #[error("unparsable bit range '{0}'")]
    Range(String),
    /// The WIDTH cell is empty.
    #[error("missing width")]
    MissingWidth,
    /// The WIDTH cell is not a positive integer.
    #[error("invalid width '{0}'")]
    Width(String),
}

/// Bit positions read from `[msb:lsb]` or `[bit]` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    /// Upper bound, present only in `[msb:lsb]` form.
    pub msb: Option<u32>,
    pub lsb: u32,
}

impl BitRange {
    /// Number of bits spanned, when the range names both ends.
    pub fn width(&self) -> Option<u32> {
        self.msb
            .and_then(|msb| msb.checked_sub(self.lsb))
            .map(|span| span + 1)
    }
}

fn bit_range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[\s*(?:(\d+)\s*:\s*)?(\d+)\s*\]").expect("valid bit range regex")
    })
}

fn reserved_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^(rsvd|reserved)\d*$").expect("valid reserved regex"))
}

/// Parse `[msb:lsb]` or `[bit]` text.
pub fn parse_bit_range(text: &str) -> Result<BitRange, BitError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BitError::Missing);
    }
    let captures = bit_range_pattern()
        .captures(text)
        .ok_or_else(|| BitError::Range(text.to_string()))?;
    let number = |index: usize| -> Result<Option<u32>, BitError> {
        captures
            .get(index)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| BitError::Range(text.to_string()))
    };
    let msb = number(1)?;
    let lsb = number(2)?.ok_or_else(|| BitError::Range(text.to_string()))?;
    Ok(BitRange { msb, lsb })
}

/// Offset of the field: the lower (rightmost) number of the bit range.
pub fn parse_bit_offset(text: &str) -> Result<u32, BitError> {
    parse_bit_range(text).map(|range| range.lsb)
}

/// Declared field width in bits.
///
/// Spreadsheet readers commonly surface integer cells as `8.0`; a zero
/// fractional part is accepted.
pub fn parse_width(text: &str) -> Result<u32, BitError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BitError::MissingWidth);
    }
    let integral = match text.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        Some(_) => return Err(BitError::Width(text.to_string())),
        None => text,
    };
    match integral.parse::<u32>() {
        Ok(width) if width > 0 => Ok(width),
        _ => Err(BitError::Width(text.to_string())),
    }
}

/// Whether `name` marks unused bit space (`rsvd`, `RESERVED2`, ...).
pub fn is_reserved_field_name(name: &str) -> bool {
    reserved_pattern().is_match(name.trim())
}
