use std::fmt::{Debug, Display, Error, Formatter};

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BarcodeError {
    // Digit input
    InvalidLength { expected: usize, found: usize },
    InvalidCharacter(char),
    EmptyInput,
    UnsupportedInputLength(usize),

    // Identifier validation
    InvalidPrefix,
    ChecksumMismatch { expected: u8, found: u8 },

    // Geometry
    AmbiguousDimensions,
    InvalidDimension,

    // Configuration document
    InvalidColorMode,
    InvalidAlignment,
    InvalidColor,
}

impl Display for BarcodeError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match *self {
            // Digit input
            Self::InvalidLength { expected, found } => {
                write!(f, "Expected {expected} digits, found {found}")
            }
            Self::InvalidCharacter(c) => write!(f, "Invalid character {c:?}, expected a digit"),
            Self::EmptyInput => f.write_str("Input contains no digits"),
            Self::UnsupportedInputLength(n) => {
                write!(f, "Unsupported input length: {n} digits (expected 13, 15 or 18)")
            }

            // Identifier validation
            Self::InvalidPrefix => f.write_str("ISBN-13 must start with 978 or 979"),
            Self::ChecksumMismatch { expected, found } => {
                write!(f, "Check digit mismatch: expected {expected}, found {found}")
            }

            // Geometry
            Self::AmbiguousDimensions => f.write_str("Image dimensions cannot be resolved"),
            Self::InvalidDimension => f.write_str("Invalid image dimension"),

            // Configuration document
            Self::InvalidColorMode => f.write_str("Invalid color mode"),
            Self::InvalidAlignment => f.write_str("Invalid text alignment"),
            Self::InvalidColor => f.write_str("Invalid color"),
        }
    }
}

impl std::error::Error for BarcodeError {}

pub type BarcodeResult<T> = Result<T, BarcodeError>;

// Export error
//------------------------------------------------------------------------------

/// Failures at the I/O boundary: raster files, template documents, batch output.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Barcode(#[from] BarcodeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("Invalid template document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("Template '{0}' does not exist")]
    TemplateNotFound(String),
    #[error("Template name cannot be empty")]
    EmptyTemplateName,
    #[error("Template document is missing the 'config' field")]
    MissingConfig,
}

pub type ExportResult<T> = Result<T, ExportError>;
