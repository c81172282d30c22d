use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BarcodeError;

// Color mode
//------------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorMode {
    /// Two level raster, 0 is dark and 1 is light.
    #[default]
    Bitmap,
    Grayscale,
    Rgb,
    Cmyk,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            Self::Bitmap | Self::Grayscale => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bitmap => "BITMAP",
            Self::Grayscale => "GRAYSCALE",
            Self::Rgb => "RGB",
            Self::Cmyk => "CMYK",
        }
    }

    /// Converts one logical RGB color into this mode's pixel value.
    pub fn convert(self, rgb: [u8; 3]) -> PixelValue {
        match self {
            Self::Bitmap => PixelValue::Bit(rgb_to_bit(rgb)),
            Self::Grayscale => PixelValue::Gray(rgb_to_gray(rgb)),
            Self::Rgb => PixelValue::Rgb(rgb),
            Self::Cmyk => PixelValue::Cmyk(rgb_to_cmyk(rgb)),
        }
    }
}

impl FromStr for ColorMode {
    type Err = BarcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BITMAP" => Ok(Self::Bitmap),
            "GRAYSCALE" => Ok(Self::Grayscale),
            "RGB" => Ok(Self::Rgb),
            "CMYK" => Ok(Self::Cmyk),
            _ => Err(BarcodeError::InvalidColorMode),
        }
    }
}

fn channel_sum([r, g, b]: [u8; 3]) -> u32 {
    r as u32 + g as u32 + b as u32
}

/// 0 (dark) when the channel mean is below 128, else 1.
pub(crate) fn rgb_to_bit(rgb: [u8; 3]) -> u8 {
    if channel_sum(rgb) < 128 * 3 {
        0
    } else {
        1
    }
}

pub(crate) fn rgb_to_gray(rgb: [u8; 3]) -> u8 {
    (channel_sum(rgb) as f64 / 3.0).round() as u8
}

pub(crate) fn rgb_to_cmyk([r, g, b]: [u8; 3]) -> [u8; 4] {
    if r == 0 && g == 0 && b == 0 {
        return [0, 0, 0, 255];
    }
    let c = 1.0 - r as f64 / 255.0;
    let m = 1.0 - g as f64 / 255.0;
    let y = 1.0 - b as f64 / 255.0;
    let k = c.min(m).min(y);
    let (c, m, y) = if k < 1.0 {
        ((c - k) / (1.0 - k), (m - k) / (1.0 - k), (y - k) / (1.0 - k))
    } else {
        (0.0, 0.0, 0.0)
    };
    [(c * 255.0) as u8, (m * 255.0) as u8, (y * 255.0) as u8, (k * 255.0) as u8]
}

/// Parses `r,g,b` or a single gray level.
pub fn parse_rgb(s: &str) -> Result<[u8; 3], BarcodeError> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u8>().map_err(|_| BarcodeError::InvalidColor))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [v] => Ok([*v; 3]),
        [r, g, b] => Ok([*r, *g, *b]),
        _ => Err(BarcodeError::InvalidColor),
    }
}

// Pixel value
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PixelValue {
    Bit(u8),
    Gray(u8),
    Rgb([u8; 3]),
    Cmyk([u8; 4]),
}

impl PixelValue {
    pub fn channels(&self) -> &[u8] {
        match self {
            Self::Bit(v) | Self::Gray(v) => std::slice::from_ref(v),
            Self::Rgb(c) => c,
            Self::Cmyk(c) => c,
        }
    }
}

// Text alignment
//------------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl FromStr for TextAlignment {
    type Err = BarcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(BarcodeError::InvalidAlignment),
        }
    }
}
