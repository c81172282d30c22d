use std::convert::Infallible;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use walkdir::WalkDir;

const FONT_DIRS: [&str; 5] = [
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

const BUILTIN_CELL: (u32, u32) = (10, 20);

// Typeface
//------------------------------------------------------------------------------

/// Glyph source for every text run. Sizes are in pixels.
pub enum Typeface {
    Outline { font: FontVec, scale: PxScale },
    /// 10x20 monospace cells scaled to the requested size.
    Builtin { scale: f64 },
}

impl Typeface {
    pub fn builtin(size: u32) -> Self {
        Self::Builtin { scale: size.max(1) as f64 / BUILTIN_CELL.1 as f64 }
    }

    pub fn from_file(path: &Path, size: u32) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        let font = FontVec::try_from_vec(bytes).ok()?;
        Some(Self::Outline { font, scale: PxScale::from(size.max(1) as f32) })
    }

    /// `family` is either a font file path or a family name looked up in the
    /// system font directories. Falls back to the builtin face.
    pub fn resolve(family: &str, size: u32) -> Self {
        let path = Path::new(family);
        let found = if path.is_file() { Some(path.to_path_buf()) } else { find_font(family) };
        if let Some(face) = found.as_deref().and_then(|p| Self::from_file(p, size)) {
            log::debug!("Using font {}", found.unwrap_or_default().display());
            return face;
        }
        log::warn!("Font '{family}' not found, using builtin glyphs");
        Self::builtin(size)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin { .. })
    }

    pub fn advance(&self, c: char) -> f64 {
        match self {
            Self::Outline { font, scale } => {
                let scaled = font.as_scaled(*scale);
                scaled.h_advance(scaled.glyph_id(c)) as f64
            }
            Self::Builtin { scale } => BUILTIN_CELL.0 as f64 * scale,
        }
    }

    pub fn text_width(&self, text: &str) -> f64 {
        text.chars().map(|c| self.advance(c)).sum()
    }

    pub fn line_height(&self) -> f64 {
        match self {
            Self::Outline { font, scale } => font.as_scaled(*scale).height() as f64,
            Self::Builtin { scale } => BUILTIN_CELL.1 as f64 * scale,
        }
    }

    /// Emits `(x, y, w, h)` spans covering the glyphs of `text` with its top
    /// left corner at `(x, y)`. Outline coverage below 50% is dropped.
    pub fn draw(&self, text: &str, x: i32, y: i32, paint: &mut dyn FnMut(i32, i32, u32, u32)) {
        match self {
            Self::Outline { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let baseline = y as f32 + scaled.ascent();
                let mut caret = x as f32;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    let glyph = id.with_scale_and_position(*scale, point(caret, baseline));
                    caret += scaled.h_advance(id);
                    let Some(outline) = font.outline_glyph(glyph) else { continue };
                    let min = outline.px_bounds().min;
                    outline.draw(|gx, gy, coverage| {
                        if coverage >= 0.5 {
                            let px = (min.x as i32).saturating_add(gx as i32);
                            let py = (min.y as i32).saturating_add(gy as i32);
                            paint(px, py, 1, 1);
                        }
                    });
                }
            }
            Self::Builtin { scale } => {
                let mask = GlyphMask::render(text);
                for (mx, my) in mask.lit() {
                    let x0 = (mx as f64 * scale).round() as i32;
                    let x1 = ((mx + 1) as f64 * scale).round() as i32;
                    let y0 = (my as f64 * scale).round() as i32;
                    let y1 = ((my + 1) as f64 * scale).round() as i32;
                    let (w, h) = ((x1 - x0).max(1) as u32, (y1 - y0).max(1) as u32);
                    paint(x.saturating_add(x0), y.saturating_add(y0), w, h);
                }
            }
        }
    }
}

fn find_font(family: &str) -> Option<PathBuf> {
    FONT_DIRS
        .iter()
        .flat_map(|dir| WalkDir::new(dir).max_depth(4).into_iter().filter_map(Result::ok))
        .map(|entry| entry.into_path())
        .find(|p| {
            let ext_ok = p
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
            let stem_ok =
                p.file_stem().and_then(|s| s.to_str()).is_some_and(|s| s.eq_ignore_ascii_case(family));
            ext_ok && stem_ok
        })
}

// Builtin glyph mask
//------------------------------------------------------------------------------

struct GlyphMask {
    width: u32,
    height: u32,
    lit: Vec<bool>,
}

impl GlyphMask {
    fn render(text: &str) -> Self {
        let width = BUILTIN_CELL.0 * text.chars().count() as u32;
        let height = BUILTIN_CELL.1;
        let mut mask = Self { width, height, lit: vec![false; (width * height) as usize] };
        let style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut mask);
        mask
    }

    fn lit(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.lit
            .iter()
            .enumerate()
            .filter(|&(_, &on)| on)
            .map(|(i, _)| (i as u32 % self.width, i as u32 / self.width))
    }
}

impl OriginDimensions for GlyphMask {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for GlyphMask {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            let inside = (0..self.width as i32).contains(&p.x) && (0..self.height as i32).contains(&p.y);
            if color.is_on() && inside {
                self.lit[(p.y as u32 * self.width + p.x as u32) as usize] = true;
            }
        }
        Ok(())
    }
}
