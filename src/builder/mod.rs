pub mod addon;
pub mod symbol;

pub use addon::{encode2, encode5};
pub use symbol::{encode, ModulePattern, Parity, ParityPattern};

use crate::common::{
    checksum::validate13,
    digits::{format_isbn, DigitString},
    error::{BarcodeError, BarcodeResult},
};

pub struct BarcodeBuilder<'a> {
    isbn: &'a str,
    addon: Option<&'a str>,
}

impl<'a> BarcodeBuilder<'a> {
    pub fn new(isbn: &'a str) -> Self {
        Self { isbn, addon: None }
    }

    pub fn isbn(&mut self, isbn: &'a str) -> &mut Self {
        self.isbn = isbn;
        self
    }

    /// Two or five digit supplement printed to the right of the symbol.
    pub fn addon(&mut self, digits: &'a str) -> &mut Self {
        self.addon = Some(digits);
        self
    }

    pub fn unset_addon(&mut self) -> &mut Self {
        self.addon = None;
        self
    }

    pub fn metadata(&self) -> String {
        match self.addon {
            Some(a) => format!("{{ ISBN: {}, Addon: {a} }}", self.isbn),
            None => format!("{{ ISBN: {}, Addon: None }}", self.isbn),
        }
    }
}


impl BarcodeBuilder<'_> {
    pub fn build(&self) -> BarcodeResult<Barcode> {
        log::debug!("Generating barcode {}...", self.metadata());

        log::debug!("Validating ISBN...");
        let digits = validate13(self.isbn)?;
        let formatted = format_isbn(&digits)?;

        log::debug!("Encoding EAN-13 symbol...");
        let pattern = symbol::encode_digits(&digits);

        let addon = match self.addon {
            Some(a) => {
                log::debug!("Encoding add-on {a}...");
                Some(Addon::new(a)?)
            }
            None => None,
        };

        Ok(Barcode { digits, formatted, pattern, addon })
    }
}

// Barcode
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addon {
    digits: String,
    pattern: ModulePattern,
}

impl Addon {
    pub fn new(digits: &str) -> BarcodeResult<Self> {
        let pattern = match digits.chars().count() {
            2 => encode2(digits)?,
            5 => encode5(digits)?,
            n => {
                let expected = if n < 2 { 2 } else { 5 };
                return Err(BarcodeError::InvalidLength { expected, found: n });
            }
        };
        Ok(Self { digits: digits.to_string(), pattern })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn pattern(&self) -> &ModulePattern {
        &self.pattern
    }
}

/// A validated ISBN with its encoded main symbol and optional supplement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    digits: DigitString,
    formatted: String,
    pattern: ModulePattern,
    addon: Option<Addon>,
}

impl Barcode {
    pub fn digits(&self) -> &DigitString {
        &self.digits
    }

    pub fn formatted(&self) -> &str {
        &self.formatted
    }

    pub fn pattern(&self) -> &ModulePattern {
        &self.pattern
    }

    pub fn addon(&self) -> Option<&Addon> {
        self.addon.as_ref()
    }

    /// Output file name, the bare 13 digits plus the raster extension.
    pub fn file_name(&self) -> String {
        format!("{}.tif", self.digits)
    }

    pub fn to_debug_str(&self) -> String {
        match &self.addon {
            Some(a) => {
                format!("{}       {}", self.pattern.to_debug_str(), a.pattern.to_debug_str())
            }
            None => self.pattern.to_debug_str(),
        }
    }
}
