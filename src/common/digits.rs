use std::fmt::{Display, Formatter};

use super::error::{BarcodeError, BarcodeResult};

// Digit string
//------------------------------------------------------------------------------

/// Immutable run of decimal digits with a length fixed at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigitString(Box<[u8]>);

impl DigitString {
    /// Parses `text` as exactly `len` ASCII digits. No padding, no truncation.
    pub fn parse(text: &str, len: usize) -> BarcodeResult<Self> {
        let found = text.chars().count();
        if found != len {
            return Err(BarcodeError::InvalidLength { expected: len, found });
        }
        Self::parse_unsized(text)
    }

    pub(crate) fn parse_unsized(text: &str) -> BarcodeResult<Self> {
        text.chars()
            .map(|c| c.to_digit(10).map(|d| d as u8).ok_or(BarcodeError::InvalidCharacter(c)))
            .collect::<BarcodeResult<Box<[u8]>>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.0[start..end].iter().map(|d| char::from(b'0' + d)).collect()
    }
}

impl Display for DigitString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.slice(0, self.len()))
    }
}

/// Display form printed above the symbol, grouped 3-1-4-4-1.
pub fn format_isbn(digits: &DigitString) -> BarcodeResult<String> {
    if digits.len() != 13 {
        return Err(BarcodeError::InvalidLength { expected: 13, found: digits.len() });
    }
    Ok(format!(
        "ISBN {}-{}-{}-{}-{}",
        digits.slice(0, 3),
        digits.slice(3, 4),
        digits.slice(4, 8),
        digits.slice(8, 12),
        digits.slice(12, 13)
    ))
}

// Batch input
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub isbn: String,
    pub addon: Option<String>,
}

/// Strips every non-digit and classifies the rest by length:
/// 13 is a bare identifier, 15 and 18 carry a 2 or 5 digit add-on.
pub fn parse_input(raw: &str) -> BarcodeResult<ParsedInput> {
    let digits = raw.chars().filter(char::is_ascii_digit).collect::<String>();
    match digits.len() {
        0 => Err(BarcodeError::EmptyInput),
        13 => Ok(ParsedInput { isbn: digits, addon: None }),
        15 | 18 => {
            let (isbn, addon) = digits.split_at(13);
            Ok(ParsedInput { isbn: isbn.to_string(), addon: Some(addon.to_string()) })
        }
        n => Err(BarcodeError::UnsupportedInputLength(n)),
    }
}
