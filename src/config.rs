use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use walkdir::WalkDir;

use crate::common::error::{ExportError, ExportResult};
use crate::render::RenderOptions;

// Color arrays
//------------------------------------------------------------------------------

/// `[r, g, b]` on the wire. A single element array is a gray level, extra
/// elements past the third are ignored.
pub mod color_array {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &[u8; 3], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(color.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 3], D::Error> {
        let values = Vec::<i64>::deserialize(deserializer)?;
        let channel = |v: i64| {
            u8::try_from(v).map_err(|_| D::Error::custom(format!("color channel {v} out of range")))
        };
        match values.as_slice() {
            [v] => Ok([channel(*v)?; 3]),
            [r, g, b, ..] => Ok([channel(*r)?, channel(*g)?, channel(*b)?]),
            _ => Err(D::Error::custom("color must have 1 or 3 components")),
        }
    }
}

// Options document
//------------------------------------------------------------------------------

impl RenderOptions {
    pub fn from_json(json: &str) -> ExportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ExportResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Returns a copy with every key in `overrides` replacing the current
    /// value. `self` is left untouched.
    pub fn with_overrides(&self, overrides: &Map<String, Value>) -> ExportResult<Self> {
        let mut doc = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        doc.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(serde_json::from_value(Value::Object(doc))?)
    }
}

// Presets
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Preset {
    /// 1200 dpi print master at 32.5 x 22.6 mm.
    Standard,
    /// Standard with a smaller font to leave room for the supplement digits.
    WithAddon,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Standard, Preset::WithAddon];

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::WithAddon => "with_addon",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn options(self) -> RenderOptions {
        let font_size = match self {
            Self::Standard => 125,
            Self::WithAddon => 98,
        };
        let mut opts = RenderOptions::default();
        opts.dpi(1200)
            .width_mm(32.5)
            .height_mm(22.6)
            .lock_aspect_ratio(true)
            .font("Arial", font_size)
            .letter_spacing(4.0)
            .text_offsets(4, 3);
        opts
    }
}

// Template store
//------------------------------------------------------------------------------

const TEMPLATE_VERSION: &str = "1.0";
const TEMPLATE_EXTENSION: &str = "json";
const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    pub version: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Deserialize)]
struct TemplateDocument {
    name: Option<String>,
    version: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    config: Option<RenderOptions>,
}

impl TemplateDocument {
    fn read(path: &Path) -> ExportResult<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Trims `name` and replaces characters that are not allowed in file names.
pub fn sanitize_name(name: &str) -> ExportResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ExportError::EmptyTemplateName);
    }
    Ok(name.chars().map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c }).collect())
}

/// Named option sets, one JSON document per template in a single directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> ExportResult<PathBuf> {
        Ok(self.dir.join(format!("{}.{TEMPLATE_EXTENSION}", sanitize_name(name)?)))
    }

    /// Creates or replaces `name`. Replacing keeps the original creation time.
    pub fn save(&self, name: &str, options: &RenderOptions) -> ExportResult<PathBuf> {
        let path = self.path(name)?;
        fs::create_dir_all(&self.dir)?;

        let now = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let created_at = match TemplateDocument::read(&path) {
            Ok(doc) => doc.created_at.unwrap_or_else(|| now.clone()),
            Err(_) => now.clone(),
        };
        let doc = TemplateDocument {
            name: Some(name.trim().to_string()),
            version: Some(TEMPLATE_VERSION.to_string()),
            created_at: Some(created_at),
            updated_at: Some(now),
            config: Some(options.clone()),
        };
        fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
        log::info!("Saved template '{}' to {}", name.trim(), path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> ExportResult<RenderOptions> {
        let doc = self.read(name)?;
        doc.config.ok_or(ExportError::MissingConfig)
    }

    pub fn delete(&self, name: &str) -> ExportResult<()> {
        let path = self.path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted template '{name}'");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ExportError::TemplateNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sorted template names. Files that fail to parse are skipped.
    pub fn list(&self) -> ExportResult<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| entry.into_path())
            .filter(|p| p.extension().is_some_and(|e| e == TEMPLATE_EXTENSION))
            .filter_map(|p| match TemplateDocument::read(&p) {
                Ok(doc) => doc
                    .name
                    .or_else(|| p.file_stem().map(|s| s.to_string_lossy().into_owned())),
                Err(e) => {
                    log::warn!("Skipping unreadable template {}: {e}", p.display());
                    None
                }
            })
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_ok_and(|p| p.is_file())
    }

    pub fn info(&self, name: &str) -> ExportResult<TemplateInfo> {
        let doc = self.read(name)?;
        Ok(TemplateInfo {
            name: doc.name.unwrap_or_else(|| name.trim().to_string()),
            version: doc.version.unwrap_or_default(),
            created_at: doc.created_at.unwrap_or_default(),
            updated_at: doc.updated_at.unwrap_or_default(),
        })
    }

    fn read(&self, name: &str) -> ExportResult<TemplateDocument> {
        let path = self.path(name)?;
        match TemplateDocument::read(&path) {
            Err(ExportError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                Err(ExportError::TemplateNotFound(name.to_string()))
            }
            res => res,
        }
    }
}
