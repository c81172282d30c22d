use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

use super::{
    font::Typeface,
    geometry::{DrawCommand, Geometry},
    tiff::{save_tiff, write_tiff},
    RenderOptions,
};
use crate::common::{
    error::ExportResult,
    metadata::{rgb_to_bit, rgb_to_cmyk, rgb_to_gray, ColorMode, PixelValue},
};

/// C, M, Y, K planes packed per pixel. Not an RGBA image.
pub type CmykImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

// Raster buffer
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RasterBuffer {
    /// One byte per pixel holding 0 (dark) or 1 (light).
    Bitmap(GrayImage),
    Grayscale(GrayImage),
    Rgb(RgbImage),
    Cmyk(CmykImage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    buffer: RasterBuffer,
    dpi: u32,
}

impl RasterImage {
    /// Blank raster filled with `background` converted to `mode`.
    pub fn new(width: u32, height: u32, mode: ColorMode, background: [u8; 3], dpi: u32) -> Self {
        let buffer = match mode.convert(background) {
            PixelValue::Bit(v) => RasterBuffer::Bitmap(GrayImage::from_pixel(width, height, Luma([v]))),
            PixelValue::Gray(v) => {
                RasterBuffer::Grayscale(GrayImage::from_pixel(width, height, Luma([v])))
            }
            PixelValue::Rgb(c) => RasterBuffer::Rgb(RgbImage::from_pixel(width, height, Rgb(c))),
            PixelValue::Cmyk(c) => RasterBuffer::Cmyk(CmykImage::from_pixel(width, height, Rgba(c))),
        };
        Self { buffer, dpi }
    }

    pub fn buffer(&self) -> &RasterBuffer {
        &self.buffer
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match &self.buffer {
            RasterBuffer::Bitmap(img) | RasterBuffer::Grayscale(img) => img.dimensions(),
            RasterBuffer::Rgb(img) => img.dimensions(),
            RasterBuffer::Cmyk(img) => img.dimensions(),
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn color_mode(&self) -> ColorMode {
        match self.buffer {
            RasterBuffer::Bitmap(_) => ColorMode::Bitmap,
            RasterBuffer::Grayscale(_) => ColorMode::Grayscale,
            RasterBuffer::Rgb(_) => ColorMode::Rgb,
            RasterBuffer::Cmyk(_) => ColorMode::Cmyk,
        }
    }

    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> PixelValue {
        match &self.buffer {
            RasterBuffer::Bitmap(img) => PixelValue::Bit(img.get_pixel(x, y).0[0]),
            RasterBuffer::Grayscale(img) => PixelValue::Gray(img.get_pixel(x, y).0[0]),
            RasterBuffer::Rgb(img) => PixelValue::Rgb(img.get_pixel(x, y).0),
            RasterBuffer::Cmyk(img) => PixelValue::Cmyk(img.get_pixel(x, y).0),
        }
    }

    /// Fills `rect` clipped to the image with `color` converted to this
    /// raster's mode.
    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 3]) {
        match &mut self.buffer {
            RasterBuffer::Bitmap(img) => draw_filled_rect_mut(img, rect, Luma([rgb_to_bit(color)])),
            RasterBuffer::Grayscale(img) => {
                draw_filled_rect_mut(img, rect, Luma([rgb_to_gray(color)]))
            }
            RasterBuffer::Rgb(img) => draw_filled_rect_mut(img, rect, Rgb(color)),
            RasterBuffer::Cmyk(img) => draw_filled_rect_mut(img, rect, Rgba(rgb_to_cmyk(color))),
        }
    }

    /// Like [`Self::fill_rect`] for a span at any `i32` position. Nothing is
    /// painted when the span misses the image.
    pub fn fill_span(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 3]) {
        let (width, height) = self.dimensions();
        let x0 = i64::from(x).max(0);
        let y0 = i64::from(y).max(0);
        let x1 = (i64::from(x) + i64::from(w)).min(i64::from(width));
        let y1 = (i64::from(y) + i64::from(h)).min(i64::from(height));
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let rect = Rect::at(x0 as i32, y0 as i32).of_size((x1 - x0) as u32, (y1 - y0) as u32);
        self.fill_rect(rect, color);
    }

    /// Preview conversion. Bitmap maps to black and white, CMYK is
    /// approximated without a color profile.
    pub fn to_rgb_image(&self) -> RgbImage {
        let (w, h) = self.dimensions();
        RgbImage::from_fn(w, h, |x, y| match self.pixel(x, y) {
            PixelValue::Bit(v) => Rgb([if v == 0 { 0 } else { 255 }; 3]),
            PixelValue::Gray(v) => Rgb([v; 3]),
            PixelValue::Rgb(c) => Rgb(c),
            PixelValue::Cmyk([c, m, y, k]) => {
                let channel = |v: u8| ((255 - v as u32) * (255 - k as u32) / 255) as u8;
                Rgb([channel(c), channel(m), channel(y)])
            }
        })
    }

    pub fn write_tiff<W: std::io::Write + std::io::Seek>(&self, writer: W) -> ExportResult<()> {
        write_tiff(self, writer)
    }

    pub fn save_tiff(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        save_tiff(self, path.as_ref())
    }
}

// Compositor
//------------------------------------------------------------------------------

/// Paints `geometry` onto a fresh raster: background, bars, then text.
pub fn composite(geometry: &Geometry, opts: &RenderOptions, face: &Typeface) -> RasterImage {
    let mode = opts.color_mode;
    let mut raster =
        RasterImage::new(geometry.width, geometry.height, mode, opts.background_color, opts.dpi);
    let ink = opts.foreground_color;

    for cmd in geometry.commands.iter() {
        match cmd {
            DrawCommand::Bar(r) => raster.fill_span(r.left(), r.top(), r.width(), r.height(), ink),
            DrawCommand::Text { x, y, text } => {
                face.draw(text, *x, *y, &mut |x, y, w, h| raster.fill_span(x, y, w, h, ink))
            }
        }
    }
    raster
}
