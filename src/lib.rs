//! # isbnbar
//!
//! A Rust library for producing print-ready ISBN barcodes: EAN-13 symbols with optional
//! EAN-2 / EAN-5 supplements, laid out to GS1 proportions and written as high resolution TIFF.
//!
//! ## Features
//!
//! - **ISBN Validation**: 978/979 prefix and mod-10 check digit verification
//! - **Symbol Encoding**: EAN-13 module patterns with L/G/R digit sets and parity selection
//! - **Supplements**: 2 and 5 digit add-on codes for price or issue information
//! - **Print Layout**: physical sizing in millimeters or pixels at any dpi, quiet zones,
//!   human readable text and the quiet zone indicator
//! - **Color Modes**: BITMAP, GRAYSCALE, RGB and CMYK rasters
//! - **Templates and Batches**: reusable option documents and per-item failure isolation
//!
//! ## Quick Start
//!
//! ### Simple Barcode
//!
//! ```rust,no_run
//! use isbnbar::{BarcodeBuilder, RenderOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let barcode = BarcodeBuilder::new("9787564922351").build()?;
//!
//! let img = barcode.render(&RenderOptions::default())?;  // 300 dpi, nominal size
//! img.save_tiff(barcode.file_name())?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust,no_run
//! use isbnbar::{BarcodeBuilder, ColorMode, RenderOptions, TextAlignment};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let barcode = BarcodeBuilder::new("9787564922351")
//!     .addon("52495")                     // EAN-5 supplement, "02" would give an EAN-2
//!     .build()?;
//!
//! let mut opts = RenderOptions::new();
//! opts.dpi(1200)                          // Resolution written into the TIFF tags
//!     .width_mm(40.0)                     // Height follows from the nominal aspect ratio
//!     .color_mode(ColorMode::Cmyk)        // Separated output for print
//!     .font("Arial", 98)                  // Family name or a path to a .ttf/.otf file
//!     .letter_spacing(4.0)
//!     .text_alignment(TextAlignment::Center);
//!
//! let img = barcode.render(&opts)?;
//! img.save_tiff("9787564922351.tif")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Batch Generation
//!
//! ```rust,no_run
//! use isbnbar::{BatchProcessor, Preset};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut batch = BatchProcessor::new(Preset::Standard.options());
//! batch.addon_options(Preset::WithAddon.options());
//!
//! let items = ["978-7-5649-2235-1", "978756492235102", "0000000000000"];
//! let res = batch.process_list(&items, "out", |i, n, item| println!("[{}/{n}] {item}", i + 1))?;
//! for e in res.errors.iter() {
//!     println!("{}: {}", e.input, e.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Symbol Anatomy
//!
//! A bookland EAN-13 is 95 modules wide: a `101` start guard, six left digits of 7 modules
//! each, a `01010` center guard, six right digits and a `101` end guard. The first digit is
//! not drawn as bars; it selects the L/G parity of the six left digits. The symbol is flanked
//! by an 11 module left and a 7 module right quiet zone. Supplements start 7 modules after the
//! right quiet zone and are drawn at 85% of the bar height, bottom aligned.

#![allow(clippy::items_after_test_module)]

pub mod batch;
pub mod builder;
pub mod common;
pub mod config;
pub mod render;

pub use batch::{BatchFailure, BatchProcessor, BatchResult};
pub use builder::{Addon, Barcode, BarcodeBuilder, ModulePattern};
pub use common::error::{BarcodeError, BarcodeResult, ExportError, ExportResult};
pub use common::metadata::{ColorMode, PixelValue, TextAlignment};
pub use config::{Preset, TemplateInfo, TemplateStore};
pub use render::{RasterImage, RenderConfig, RenderOptions};
