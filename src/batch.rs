use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::BarcodeBuilder;
use crate::common::{digits::parse_input, error::ExportResult};
use crate::render::{render_with_typeface, RenderConfig, RenderOptions, Typeface};

// Batch result
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// The item exactly as given.
    pub input: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<BatchFailure>,
    pub outputs: Vec<PathBuf>,
}

// Batch processor
//------------------------------------------------------------------------------

/// Renders one TIFF per input item. A failing item is recorded and the
/// remaining items still run.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    options: RenderOptions,
    addon_options: Option<RenderOptions>,
}

impl BatchProcessor {
    pub fn new(options: RenderOptions) -> Self {
        Self { options, addon_options: None }
    }

    /// Size, resolution and text settings for items carrying a supplement.
    /// Color mode, colors and alignment still come from the base options.
    pub fn addon_options(&mut self, options: RenderOptions) -> &mut Self {
        self.addon_options = Some(options);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Options for one item depending on whether it carries a supplement.
    pub fn options_for(&self, has_addon: bool) -> RenderOptions {
        match (&self.addon_options, has_addon) {
            (Some(addon), true) => {
                let mut opts = addon.clone();
                opts.color_mode(self.options.color_mode)
                    .colors(self.options.foreground_color, self.options.background_color)
                    .text_alignment(self.options.text_alignment);
                opts
            }
            _ => self.options.clone(),
        }
    }

    /// One item per line of `path`.
    pub fn process_file(
        &self,
        path: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
        progress: impl FnMut(usize, usize, &str),
    ) -> ExportResult<BatchResult> {
        let text = fs::read_to_string(path.as_ref())?;
        let items = text.lines().collect::<Vec<_>>();
        self.process_list(&items, out_dir, progress)
    }

    /// `progress` receives the zero based index, the item count and the item
    /// before it is processed. Blank items are neither counted nor reported.
    pub fn process_list<S: AsRef<str>>(
        &self,
        items: &[S],
        out_dir: impl AsRef<Path>,
        mut progress: impl FnMut(usize, usize, &str),
    ) -> ExportResult<BatchResult> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir)?;

        let items =
            items.iter().map(|s| s.as_ref()).filter(|s| !s.trim().is_empty()).collect::<Vec<_>>();
        let mut result = BatchResult { total: items.len(), ..Default::default() };
        log::info!("Processing {} items into {}...", items.len(), out_dir.display());

        let faces = self.faces();
        for (i, &item) in items.iter().enumerate() {
            progress(i, items.len(), item);
            match self.process_item(item, out_dir, &faces) {
                Ok(path) => {
                    result.success += 1;
                    result.outputs.push(path);
                }
                Err(e) => {
                    log::warn!("Skipping '{item}': {e}");
                    result.failed += 1;
                    result.errors.push(BatchFailure { input: item.to_string(), message: e.to_string() });
                }
            }
        }

        log::info!(
            "Batch done: {} total, {} succeeded, {} failed",
            result.total,
            result.success,
            result.failed
        );
        Ok(result)
    }

    /// Fonts for the base and supplement options, looked up once per batch.
    fn faces(&self) -> Faces {
        let resolve = |o: &RenderOptions| Typeface::resolve(&o.font_family, o.font_size);
        Faces { base: resolve(&self.options), addon: self.addon_options.as_ref().map(resolve) }
    }

    fn process_item(&self, item: &str, out_dir: &Path, faces: &Faces) -> ExportResult<PathBuf> {
        let parsed = parse_input(item.trim())?;
        let mut builder = BarcodeBuilder::new(&parsed.isbn);
        if let Some(addon) = parsed.addon.as_deref() {
            builder.addon(addon);
        }
        let barcode = builder.build()?;

        let has_addon = barcode.addon().is_some();
        let options = self.options_for(has_addon);
        let face = match (&faces.addon, has_addon) {
            (Some(face), true) => face,
            _ => &faces.base,
        };
        let image = render_with_typeface(&RenderConfig::new(&barcode, &options), face)?;
        let path = out_dir.join(barcode.file_name());
        image.save_tiff(&path)?;
        Ok(path)
    }
}

struct Faces {
    base: Typeface,
    addon: Option<Typeface>,
}
