use imageproc::rect::Rect;
use num_traits::ToPrimitive;

use super::{font::Typeface, RenderConfig, RenderOptions};
use crate::builder::symbol::EAN13_MODULES;
use crate::common::{
    error::{BarcodeError, BarcodeResult},
    metadata::TextAlignment,
};

// GS1 dimensions at 100% magnification
//------------------------------------------------------------------------------

pub const MODULE_WIDTH_MM: f64 = 0.33;
pub const NOMINAL_WIDTH_MM: f64 = 37.29;
pub const NOMINAL_HEIGHT_MM: f64 = 25.93;
/// Smallest magnification GS1 allows for EAN-13.
pub const MIN_MAGNIFICATION: f64 = 0.8;

pub const LEFT_QUIET_ZONE: usize = 11;
pub const RIGHT_QUIET_ZONE: usize = 7;
pub const ADDON_GAP: usize = 7;
pub const ADDON_MARGIN: usize = 5;

const BAND_MARGIN: i64 = 5;
const GUARD_EXTENSION: f64 = 0.1;
const ADDON_HEIGHT: f64 = 0.85;
const ADDON_TEXT_GAP: i64 = 2;
const INDICATOR: &str = ">";
const INDICATOR_INSET: i64 = 2;
/// Layout coordinates stay within this distance of the origin so that
/// `x + width` of any rectangle still fits an `i32`.
const COORD_LIMIT: i64 = i32::MAX as i64 / 2;

fn coord(v: i64) -> i32 {
    v.clamp(-COORD_LIMIT, COORD_LIMIT) as i32
}

pub fn mm_to_px(mm: f64, dpi: u32) -> BarcodeResult<u32> {
    (mm * dpi as f64 / 25.4).round().to_u32().ok_or(BarcodeError::InvalidDimension)
}

pub fn px_to_mm(px: u32, dpi: u32) -> BarcodeResult<f64> {
    if dpi == 0 {
        return Err(BarcodeError::InvalidDimension);
    }
    Ok(px as f64 * 25.4 / dpi as f64)
}

/// Default image size in millimeters, widened for a supplement of
/// `addon_modules` plus its gap and trailing margin.
pub fn nominal_size_mm(addon_modules: Option<usize>) -> (f64, f64) {
    let extra = addon_modules.map_or(0.0, |n| (n + ADDON_GAP + ADDON_MARGIN) as f64 * MODULE_WIDTH_MM);
    (NOMINAL_WIDTH_MM + extra, NOMINAL_HEIGHT_MM)
}

/// Nominal size scaled down to the minimum magnification.
pub fn minimum_size_mm(addon_modules: Option<usize>) -> (f64, f64) {
    let (w, h) = nominal_size_mm(addon_modules);
    (w * MIN_MAGNIFICATION, h * MIN_MAGNIFICATION)
}

/// Total horizontal module count including both quiet zones and the supplement.
pub fn total_modules(addon_modules: Option<usize>) -> usize {
    let main = LEFT_QUIET_ZONE + EAN13_MODULES + RIGHT_QUIET_ZONE;
    main + addon_modules.map_or(0, |n| n + ADDON_GAP + ADDON_MARGIN)
}

/// Final pixel size. Per axis pixels win over millimeters; a locked aspect
/// ratio derives a missing axis from the nominal ratio, otherwise a missing
/// axis takes its nominal value.
pub fn resolve_size(opts: &RenderOptions, addon_modules: Option<usize>) -> BarcodeResult<(u32, u32)> {
    let (nominal_w_mm, nominal_h_mm) = nominal_size_mm(addon_modules);
    let nominal = (mm_to_px(nominal_w_mm, opts.dpi)?, mm_to_px(nominal_h_mm, opts.dpi)?);
    let ratio = nominal_w_mm / nominal_h_mm;

    let axis = |px: Option<u32>, mm: Option<f64>| match (px, mm) {
        (Some(px), _) => Ok(Some(px)),
        (None, Some(mm)) => mm_to_px(mm, opts.dpi).map(Some),
        (None, None) => Ok(None),
    };
    let width = axis(opts.width_px, opts.width_mm)?;
    let height = axis(opts.height_px, opts.height_mm)?;

    let derive = |v: f64| v.round().to_u32().ok_or(BarcodeError::InvalidDimension);
    let (w, h) = match (width, height, opts.lock_aspect_ratio) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, true) => (w, derive(w as f64 / ratio)?),
        (None, Some(h), true) => (derive(h as f64 * ratio)?, h),
        (w, h, _) => (w.unwrap_or(nominal.0), h.unwrap_or(nominal.1)),
    };

    if w == 0 || h == 0 {
        return Err(BarcodeError::AmbiguousDimensions);
    }
    Ok((w, h))
}

// Geometry
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Area {
    pub fn right(&self) -> i32 {
        coord(i64::from(self.x) + i64::from(self.width))
    }

    pub fn bottom(&self) -> i32 {
        coord(i64::from(self.y) + i64::from(self.height))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Bar(Rect),
    /// Text run with its top left corner at `(x, y)`.
    Text { x: i32, y: i32, text: String },
}

/// Everything the compositor paints, in image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub module_width: f64,
    pub barcode: Area,
    pub addon: Option<Area>,
    pub commands: Vec<DrawCommand>,
}

impl Geometry {
    pub fn bars(&self) -> impl Iterator<Item = &Rect> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Bar(r) => Some(r),
            DrawCommand::Text { .. } => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = (i32, i32, &str)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { x, y, text } => Some((*x, *y, text.as_str())),
            DrawCommand::Bar(_) => None,
        })
    }
}

/// Computes image size, bar rectangles and text placement. Pure, no I/O.
pub fn layout(config: &RenderConfig, face: &Typeface) -> BarcodeResult<Geometry> {
    let opts = config.options;
    let barcode = config.barcode;
    let addon = barcode.addon();
    let addon_modules = addon.map(|a| a.pattern().module_count());

    let (width, height) = resolve_size(opts, addon_modules)?;
    let (min_w, min_h) = minimum_size_mm(addon_modules);
    if let (Ok(w_mm), Ok(h_mm)) = (px_to_mm(width, opts.dpi), px_to_mm(height, opts.dpi)) {
        if w_mm < min_w || h_mm < min_h {
            log::warn!(
                "{w_mm:.2}x{h_mm:.2} mm is below {:.0}% magnification ({min_w:.2}x{min_h:.2} mm)",
                MIN_MAGNIFICATION * 100.0
            );
        }
    }
    let mw = width as f64 / total_modules(addon_modules) as f64;
    let span = |modules: f64| (modules * mw).round() as i32;

    // Vertical bands: ISBN text, bars, digits
    let font = i64::from(opts.font_size);
    let bar_y = coord(font + i64::from(opts.isbn_text_offset_y) + BAND_MARGIN);
    let digits_band = font + i64::from(opts.digits_offset_y);
    let bar_h = (i64::from(height) - i64::from(bar_y) - digits_band - BAND_MARGIN)
        .clamp(1, i64::from(height)) as u32;

    let main = Area {
        x: span(LEFT_QUIET_ZONE as f64),
        y: bar_y,
        width: span(EAN13_MODULES as f64).max(1) as u32,
        height: bar_h,
    };

    let mut commands = Vec::new();
    let guard_ext = (bar_h as f64 * GUARD_EXTENSION).round() as u32;
    let pattern = barcode.pattern();
    push_bars(&mut commands, main, mw, pattern.module_count(), |i| {
        pattern.is_dark(i).then(|| if pattern.is_guard(i) { guard_ext } else { 0 })
    });

    let addon_area = addon.map(|a| {
        let h = ((bar_h as f64 * ADDON_HEIGHT).round() as u32).max(1);
        let start = (LEFT_QUIET_ZONE + EAN13_MODULES + RIGHT_QUIET_ZONE + ADDON_GAP) as f64;
        Area {
            x: span(start),
            y: coord(i64::from(bar_y) + i64::from(bar_h) - i64::from(h)),
            width: span(a.pattern().module_count() as f64).max(1) as u32,
            height: h,
        }
    });
    if let (Some(a), Some(area)) = (addon, addon_area) {
        let p = a.pattern();
        push_bars(&mut commands, area, mw, p.module_count(), |i| p.is_dark(i).then_some(0));
    }

    // ISBN line above the bars
    let text = barcode.formatted();
    let advances = text.chars().map(|c| face.advance(c)).collect::<Vec<_>>();
    let spacing = opts.letter_spacing;
    let total = advances.iter().sum::<f64>() + spacing * advances.len().saturating_sub(1) as f64;
    let start = match opts.text_alignment {
        TextAlignment::Left => main.x as f64,
        TextAlignment::Center => main.x as f64 + ((main.width as f64 - total) / 2.0).floor(),
        TextAlignment::Right => main.right() as f64 - total,
    };
    let mut caret = start;
    for (c, adv) in text.chars().zip(&advances) {
        commands.push(DrawCommand::Text {
            x: coord(caret.round() as i64),
            y: coord(i64::from(opts.isbn_text_offset_y)),
            text: c.to_string(),
        });
        caret += adv + spacing;
    }

    // Human readable digits below the bars
    let digits = barcode.digits().to_string();
    let digits_y = coord(i64::from(main.bottom()) + i64::from(opts.digits_offset_y));
    let first = &digits[..1];
    let first_x =
        i64::from(main.x - span(2.0)) - font + (0.5 * face.text_width(first)).round() as i64;
    let first_x = coord(first_x.max(0));
    commands.push(DrawCommand::Text { x: first_x, y: digits_y, text: first.to_string() });
    push_digit_group(&mut commands, face, &digits[1..7], main.x + span(3.0), span(42.0), digits_y);
    push_digit_group(&mut commands, face, &digits[7..13], main.x + span(50.0), span(42.0), digits_y);

    // Supplement digits, right aligned above the supplement bars
    let mut indicator = (main.right() + span(RIGHT_QUIET_ZONE as f64), digits_y);
    if let (Some(a), Some(area)) = (addon, addon_area) {
        let tw = face.text_width(a.digits()).round() as i64;
        let x = coord(i64::from(area.right()) - tw);
        let y = coord((i64::from(area.y) - font - ADDON_TEXT_GAP).max(0));
        commands.push(DrawCommand::Text { x, y, text: a.digits().to_string() });
        indicator = (coord(i64::from(x) + tw), y);
    }

    if opts.show_quiet_zone_indicator {
        let iw = face.text_width(INDICATOR).round() as i64;
        let (x, y) = indicator;
        let mut x = i64::from(x);
        if x + iw > i64::from(width) {
            x = i64::from(width) - iw - INDICATOR_INSET;
        }
        commands.push(DrawCommand::Text { x: coord(x.max(0)), y, text: INDICATOR.to_string() });
    }

    Ok(Geometry { width, height, module_width: mw, barcode: main, addon: addon_area, commands })
}

/// One rectangle per dark module. `extension` yields `None` for light
/// modules, else the extra height below the band.
fn push_bars(
    commands: &mut Vec<DrawCommand>,
    area: Area,
    mw: f64,
    modules: usize,
    extension: impl Fn(usize) -> Option<u32>,
) {
    for i in 0..modules {
        let Some(ext) = extension(i) else { continue };
        let x0 = area.x + (i as f64 * mw).round() as i32;
        let x1 = area.x + ((i + 1) as f64 * mw).round() as i32;
        let w = (x1 - x0).max(1) as u32;
        let h = area.height.saturating_add(ext);
        commands.push(DrawCommand::Bar(Rect::at(x0, area.y).of_size(w, h)));
    }
}

/// Centers each digit in an equal share of `width`, no extra spacing.
fn push_digit_group(
    commands: &mut Vec<DrawCommand>,
    face: &Typeface,
    digits: &str,
    start: i32,
    width: i32,
    y: i32,
) {
    let cell = width as f64 / digits.len() as f64;
    for (i, c) in digits.chars().enumerate() {
        let x = start as f64 + (i as f64 * cell).floor() + (cell - face.advance(c)) / 2.0;
        commands.push(DrawCommand::Text { x: coord(x.round() as i64), y, text: c.to_string() });
    }
}
