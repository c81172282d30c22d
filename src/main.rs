//! isbnbar CLI - print-ready ISBN barcode generator.
//!
//! Generates single barcodes or whole batches as TIFF and manages saved option templates.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use isbnbar::{
    common::{digits::parse_input, metadata::parse_rgb},
    render::{geometry::px_to_mm, tiff::read_tiff_info_file},
    BarcodeBuilder, BatchProcessor, ColorMode, Preset, RenderOptions, TemplateStore, TextAlignment,
};

/// ISBN barcode generator producing EAN-13 symbols with optional EAN-2/EAN-5 supplements
#[derive(Parser)]
#[command(name = "isbnbar")]
#[command(version)]
#[command(about = "Print-ready ISBN barcode generator", long_about = None)]
#[command(after_help = "EXAMPLES:
    isbnbar generate 978-7-5649-2235-1
    isbnbar generate 9787564922351 --addon 52495 --preset with_addon --color-mode cmyk
    isbnbar batch isbns.txt out/ --preset standard --addon-preset with_addon
    isbnbar template save press --preset standard --dpi 2400
    isbnbar info 9787564922351.tif

Log verbosity follows RUST_LOG (default: info).")]
struct Cli {
    /// Directory holding saved templates
    #[arg(long, global = true, default_value = "templates")]
    templates: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one barcode
    ///
    /// The ISBN may contain separators. Trailing 2 or 5 digits after the 13 ISBN digits
    /// are taken as the supplement unless --addon is given.
    #[command(visible_alias = "g")]
    Generate {
        /// ISBN-13, optionally followed by supplement digits
        isbn: String,

        /// Supplement digits (2 or 5)
        #[arg(short, long)]
        addon: Option<String>,

        /// Output file, defaults to <ISBN>.tif in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Generate one barcode per line of a text file
    ///
    /// Failing lines are reported and skipped; blank lines are ignored.
    #[command(visible_alias = "b")]
    Batch {
        /// Text file with one ISBN per line
        input: PathBuf,

        /// Output directory, created if missing
        out_dir: PathBuf,

        #[command(flatten)]
        options: OptionArgs,

        /// Options document for items carrying a supplement
        #[arg(long)]
        addon_config: Option<PathBuf>,

        /// Saved template for items carrying a supplement
        #[arg(long, conflicts_with = "addon_config")]
        addon_template: Option<String>,

        /// Built-in preset for items carrying a supplement
        #[arg(long, conflicts_with_all = ["addon_config", "addon_template"])]
        addon_preset: Option<String>,
    },

    /// Manage saved option templates
    #[command(visible_alias = "t")]
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Show dimensions, channels and resolution of a written TIFF
    #[command(visible_alias = "i")]
    Info {
        /// TIFF file to inspect
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// Save the resolved options under a name
    Save {
        name: String,

        #[command(flatten)]
        options: OptionArgs,
    },
    /// Print a template's options document
    Load { name: String },
    /// List saved templates
    List,
    /// Delete a template
    Delete { name: String },
    /// Show template metadata
    Info { name: String },
}

/// Option sources, applied in order: preset, config file, template, then flags.
#[derive(Args)]
struct OptionArgs {
    /// Built-in preset: standard or with_addon
    #[arg(long)]
    preset: Option<String>,

    /// JSON options document
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Saved template name
    #[arg(long)]
    template: Option<String>,

    #[arg(long)]
    dpi: Option<u32>,

    #[arg(long)]
    width_mm: Option<f64>,

    #[arg(long)]
    height_mm: Option<f64>,

    #[arg(long)]
    width_px: Option<u32>,

    #[arg(long)]
    height_px: Option<u32>,

    /// Keep both given dimensions instead of deriving one from the other
    #[arg(long)]
    unlock_aspect_ratio: bool,

    /// bitmap, grayscale, rgb or cmyk
    #[arg(long)]
    color_mode: Option<ColorMode>,

    /// Foreground color as r,g,b
    #[arg(long, value_parser = parse_rgb)]
    fg: Option<[u8; 3]>,

    /// Background color as r,g,b
    #[arg(long, value_parser = parse_rgb)]
    bg: Option<[u8; 3]>,

    /// Font family name or path to a .ttf/.otf file
    #[arg(long)]
    font: Option<String>,

    /// Font size in pixels
    #[arg(long)]
    font_size: Option<u32>,

    #[arg(long)]
    letter_spacing: Option<f64>,

    /// left, center or right
    #[arg(long)]
    align: Option<TextAlignment>,

    /// Omit the '>' quiet zone indicator
    #[arg(long)]
    no_indicator: bool,
}

impl OptionArgs {
    fn resolve(&self, store: &TemplateStore) -> anyhow::Result<RenderOptions> {
        let mut opts = match &self.preset {
            Some(name) => preset(name)?,
            None => RenderOptions::default(),
        };
        if let Some(path) = &self.config {
            opts = RenderOptions::load(path)
                .with_context(|| format!("Failed to read options from {}", path.display()))?;
        }
        if let Some(name) = &self.template {
            opts = store.load(name).with_context(|| format!("Failed to load template '{name}'"))?;
        }

        if let Some(dpi) = self.dpi {
            opts.dpi(dpi);
        }
        if let Some(mm) = self.width_mm {
            opts.width_mm(mm);
        }
        if let Some(mm) = self.height_mm {
            opts.height_mm(mm);
        }
        if let Some(px) = self.width_px {
            opts.width_px(px);
        }
        if let Some(px) = self.height_px {
            opts.height_px(px);
        }
        if self.unlock_aspect_ratio {
            opts.lock_aspect_ratio(false);
        }
        if let Some(mode) = self.color_mode {
            opts.color_mode(mode);
        }
        if let Some(fg) = self.fg {
            opts.foreground_color = fg;
        }
        if let Some(bg) = self.bg {
            opts.background_color = bg;
        }
        if let Some(family) = &self.font {
            opts.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            opts.font_size = size;
        }
        if let Some(spacing) = self.letter_spacing {
            opts.letter_spacing(spacing);
        }
        if let Some(align) = self.align {
            opts.text_alignment(align);
        }
        if self.no_indicator {
            opts.quiet_zone_indicator(false);
        }
        Ok(opts)
    }
}

fn preset(name: &str) -> anyhow::Result<RenderOptions> {
    match Preset::from_name(name) {
        Some(p) => Ok(p.options()),
        None => {
            let known = Preset::ALL.map(|p| p.name()).join(", ");
            bail!("Unknown preset '{name}' (expected one of: {known})")
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = TemplateStore::new(&cli.templates);

    match cli.command {
        Commands::Generate { isbn, addon, output, options } => {
            let opts = options.resolve(&store)?;
            let parsed = parse_input(&isbn).with_context(|| format!("Invalid input '{isbn}'"))?;
            let isbn = parsed.isbn;
            let addon = addon.or(parsed.addon);

            let mut builder = BarcodeBuilder::new(&isbn);
            if let Some(addon) = addon.as_deref() {
                builder.addon(addon);
            }
            let barcode = builder.build().with_context(|| format!("Invalid ISBN '{isbn}'"))?;
            let img = barcode.render(&opts)?;

            let path = output.unwrap_or_else(|| PathBuf::from(barcode.file_name()));
            img.save_tiff(&path)?;
            println!(
                "{} ({}x{} px, {} dpi) -> {}",
                barcode.formatted(),
                img.width(),
                img.height(),
                img.dpi(),
                path.display()
            );
        }

        Commands::Batch { input, out_dir, options, addon_config, addon_template, addon_preset } => {
            let mut batch = BatchProcessor::new(options.resolve(&store)?);
            if let Some(path) = addon_config {
                batch.addon_options(RenderOptions::load(&path)?);
            } else if let Some(name) = addon_template {
                batch.addon_options(store.load(&name)?);
            } else if let Some(name) = addon_preset {
                batch.addon_options(preset(&name)?);
            }

            let res = batch
                .process_file(&input, &out_dir, |i, n, item| println!("[{}/{n}] {item}", i + 1))
                .with_context(|| format!("Failed to process {}", input.display()))?;

            println!("Total: {}, succeeded: {}, failed: {}", res.total, res.success, res.failed);
            for e in res.errors.iter() {
                println!("  {}: {}", e.input, e.message);
            }
        }

        Commands::Template { command } => match command {
            TemplateCommand::Save { name, options } => {
                let opts = options.resolve(&store)?;
                let path = store.save(&name, &opts)?;
                println!("Saved '{name}' -> {}", path.display());
            }
            TemplateCommand::Load { name } => println!("{}", store.load(&name)?.to_json()?),
            TemplateCommand::List => {
                for name in store.list()? {
                    println!("{name}");
                }
            }
            TemplateCommand::Delete { name } => {
                store.delete(&name)?;
                println!("Deleted '{name}'");
            }
            TemplateCommand::Info { name } => {
                let info = store.info(&name)?;
                println!("Name:     {}", info.name);
                println!("Version:  {}", info.version);
                println!("Created:  {}", info.created_at);
                println!("Updated:  {}", info.updated_at);
            }
        },

        Commands::Info { file } => {
            let info = read_tiff_info_file(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("Size:      {} x {} px", info.width, info.height);
            println!("Channels:  {} x {} bit", info.channels, info.bits_per_sample);
            match info.dpi {
                Some(dpi) => {
                    println!("Resolution: {dpi} dpi");
                    let dpi = dpi.round() as u32;
                    if let (Ok(w), Ok(h)) = (px_to_mm(info.width, dpi), px_to_mm(info.height, dpi)) {
                        println!("Physical:  {w:.2} x {h:.2} mm");
                    }
                }
                None => println!("Resolution: unknown"),
            }
        }
    }

    Ok(())
}
