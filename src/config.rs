//! Configuration types for recognition.
//!
//! Every magic number the pipeline depends on (regions, thresholds, noise
//! tokens, OCR settings) lives in [`RecognizerConfig`]. It can be loaded
//! from a `config.json` file; fields missing from the file keep defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{RecognizerError, Result};

/// A rectangle in relative coordinates (0.0 to 1.0).
/// Used for defining screen regions that scale with screenshot size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of image width
    pub width: f32,
    /// Height as fraction of image height
    pub height: f32,
}

impl RelativeRect {
    /// Builds a rect from its edges: x in [left, right], y in [top, bottom].
    pub fn from_bounds(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Converts to absolute `(x, y, width, height)` in a `w`×`h` image,
    /// clamped to the image bounds.
    pub fn to_pixels(&self, w: u32, h: u32) -> (u32, u32, u32, u32) {
        let x0 = ((self.x * w as f32) as u32).min(w);
        let y0 = ((self.y * h as f32) as u32).min(h);
        let rw = ((self.width * w as f32) as u32).min(w - x0);
        let rh = ((self.height * h as f32) as u32).min(h - y0);
        (x0, y0, rw, rh)
    }
}

/// Screen type detection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Corner region where the play/pause carat is expected
    pub carat_region: RelativeRect,
    /// Match confidence must be strictly above this for the large app view
    pub threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            carat_region: RelativeRect::from_bounds(0.04, 0.11, 0.06, 0.11),
            threshold: 0.8,
        }
    }
}

impl DetectorConfig {
    /// Looser preset for templates cut from a different anchor, where
    /// correlation peaks are much lower.
    pub fn loose() -> Self {
        Self {
            threshold: 0.35,
            ..Self::default()
        }
    }
}

/// How the grayscale image is turned into a two-tone image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Binarization {
    /// Pixels below `low` become 0, all others become `high`.
    Fixed { low: u8, high: u8 },
    /// Cut point chosen per image by maximizing between-class variance.
    Otsu { high: u8 },
}

impl Default for Binarization {
    fn default() -> Self {
        Binarization::Fixed { low: 90, high: 255 }
    }
}

/// Heuristic line parser settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Known-garbage substrings removed from every line
    pub noise_tokens: Vec<String>,
    /// Case-insensitive keyword marking the anchor line on notifications
    pub anchor_keyword: String,
    /// Exact number of ':' a fallback anchor line must contain
    pub fallback_colon_count: usize,
    /// Trailing characters dropped from large-view titles
    pub title_trailing_trim: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            noise_tokens: vec!["K I I N".to_string()],
            anchor_keyword: "spotify".to_string(),
            fallback_colon_count: 1,
            title_trailing_trim: 0,
        }
    }
}

/// Tesseract invocation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract language code
    pub language: String,
    /// Tesseract page segmentation mode (--psm)
    pub page_segmentation_mode: u8,
    /// Maximum time to wait for one OCR call (milliseconds)
    pub timeout_ms: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            tessdata_dir: None,
            language: "eng".to_string(),
            page_segmentation_mode: 3,
            timeout_ms: 30_000,
        }
    }
}

/// Complete recognizer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub detector: DetectorConfig,
    /// Title/artist band on the large app view
    pub large_view_region: RelativeRect,
    pub binarization: Binarization,
    pub parser: ParserConfig,
    pub ocr: OcrConfig,
    /// Carat template used when `load()` is not given one
    pub template_path: Option<PathBuf>,
    /// If set, every run also writes its binarized image here
    pub binarized_output: Option<PathBuf>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            large_view_region: RelativeRect::from_bounds(0.12, 0.85, 0.61, 0.725),
            binarization: Binarization::default(),
            parser: ParserConfig::default(),
            ocr: OcrConfig::default(),
            template_path: None,
            binarized_output: None,
        }
    }
}

impl RecognizerConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            RecognizerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            RecognizerError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Template path to use when the caller does not supply one.
    pub fn default_template_path(&self) -> PathBuf {
        self.template_path
            .clone()
            .unwrap_or_else(crate::paths::get_default_template_path)
    }
}

/// Loads configuration from `path` or returns defaults.
pub fn load_config_or_default(path: &Path) -> RecognizerConfig {
    info!("Looking for config at: {}", path.display());

    if !path.exists() {
        info!("{} not found. Using default config.", path.display());
        return RecognizerConfig::default();
    }

    match RecognizerConfig::load(path) {
        Ok(config) => {
            info!("Config loaded from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{}. Using defaults.", e);
            RecognizerConfig::default()
        }
    }
}
