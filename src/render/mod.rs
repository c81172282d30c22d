pub mod font;
pub mod geometry;
pub mod raster;
pub mod tiff;

pub use font::Typeface;
pub use geometry::{layout, Area, DrawCommand, Geometry};
pub use raster::{composite, RasterBuffer, RasterImage};

use serde::{Deserialize, Serialize};

use crate::builder::Barcode;
use crate::common::{
    error::BarcodeResult,
    metadata::{ColorMode, TextAlignment},
};
use crate::config::color_array;

// Render options
//------------------------------------------------------------------------------

/// Every caller adjustable rendering setting. Serializes to the flat key-value
/// configuration document; omitted keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub dpi: u32,
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    pub lock_aspect_ratio: bool,
    pub color_mode: ColorMode,
    #[serde(with = "color_array")]
    pub foreground_color: [u8; 3],
    #[serde(with = "color_array")]
    pub background_color: [u8; 3],
    pub font_family: String,
    /// Pixels.
    pub font_size: u32,
    pub letter_spacing: f64,
    pub isbn_text_offset_y: i32,
    pub digits_offset_y: i32,
    pub text_alignment: TextAlignment,
    pub show_quiet_zone_indicator: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            width_mm: None,
            height_mm: None,
            width_px: None,
            height_px: None,
            lock_aspect_ratio: true,
            color_mode: ColorMode::Bitmap,
            foreground_color: [0, 0, 0],
            background_color: [255, 255, 255],
            font_family: "Arial".to_string(),
            font_size: 10,
            letter_spacing: 0.0,
            isbn_text_offset_y: 5,
            digits_offset_y: 2,
            text_alignment: TextAlignment::Center,
            show_quiet_zone_indicator: true,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dpi(&mut self, dpi: u32) -> &mut Self {
        self.dpi = dpi;
        self
    }

    pub fn width_mm(&mut self, mm: f64) -> &mut Self {
        self.width_mm = Some(mm);
        self
    }

    pub fn height_mm(&mut self, mm: f64) -> &mut Self {
        self.height_mm = Some(mm);
        self
    }

    pub fn width_px(&mut self, px: u32) -> &mut Self {
        self.width_px = Some(px);
        self
    }

    pub fn height_px(&mut self, px: u32) -> &mut Self {
        self.height_px = Some(px);
        self
    }

    pub fn unset_size(&mut self) -> &mut Self {
        self.width_mm = None;
        self.height_mm = None;
        self.width_px = None;
        self.height_px = None;
        self
    }

    pub fn lock_aspect_ratio(&mut self, lock: bool) -> &mut Self {
        self.lock_aspect_ratio = lock;
        self
    }

    pub fn color_mode(&mut self, mode: ColorMode) -> &mut Self {
        self.color_mode = mode;
        self
    }

    pub fn colors(&mut self, foreground: [u8; 3], background: [u8; 3]) -> &mut Self {
        self.foreground_color = foreground;
        self.background_color = background;
        self
    }

    pub fn font(&mut self, family: &str, size: u32) -> &mut Self {
        self.font_family = family.to_string();
        self.font_size = size;
        self
    }

    pub fn letter_spacing(&mut self, spacing: f64) -> &mut Self {
        self.letter_spacing = spacing;
        self
    }

    pub fn text_offsets(&mut self, isbn_text: i32, digits: i32) -> &mut Self {
        self.isbn_text_offset_y = isbn_text;
        self.digits_offset_y = digits;
        self
    }

    pub fn text_alignment(&mut self, alignment: TextAlignment) -> &mut Self {
        self.text_alignment = alignment;
        self
    }

    pub fn quiet_zone_indicator(&mut self, show: bool) -> &mut Self {
        self.show_quiet_zone_indicator = show;
        self
    }
}

// Render config
//------------------------------------------------------------------------------

/// One render request: the encoded barcode and the options applied to it.
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig<'a> {
    pub barcode: &'a Barcode,
    pub options: &'a RenderOptions,
}

impl<'a> RenderConfig<'a> {
    pub fn new(barcode: &'a Barcode, options: &'a RenderOptions) -> Self {
        Self { barcode, options }
    }
}

/// Lays out and paints `config`, resolving the configured font family.
pub fn render(config: &RenderConfig) -> BarcodeResult<RasterImage> {
    let face = Typeface::resolve(&config.options.font_family, config.options.font_size);
    render_with_typeface(config, &face)
}

pub fn render_with_typeface(config: &RenderConfig, face: &Typeface) -> BarcodeResult<RasterImage> {
    log::debug!("Computing layout for {}...", config.barcode.digits());
    let geometry = layout(config, face)?;

    log::debug!(
        "Compositing {}x{} {} raster at {} dpi...",
        geometry.width,
        geometry.height,
        config.options.color_mode.as_str(),
        config.options.dpi
    );
    Ok(composite(&geometry, config.options, face))
}

impl Barcode {
    pub fn render(&self, options: &RenderOptions) -> BarcodeResult<RasterImage> {
        render(&RenderConfig::new(self, options))
    }
}
