//! Error taxonomy for the recognition pipeline.
//!
//! Only structural failures live here. A screenshot where no artist or title
//! could be found is a normal outcome and is reported through unset fields
//! on the result, never through an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognizerError {
    /// Screenshot or template could not be read, or has zero width/height.
    #[error("failed to load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    /// An in-memory image handed to a pipeline stage was unusable.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// `run()` was called before a successful `load()`.
    #[error("no image loaded; call load() before run()")]
    NotLoaded,

    /// The OCR collaborator failed or is unavailable.
    #[error("OCR adapter failed: {0}")]
    OcrAdapter(String),

    /// The OCR collaborator did not finish within the configured bound.
    #[error("OCR adapter timed out after {timeout_ms}ms")]
    OcrTimeout { timeout_ms: u64 },

    /// The binarized side-channel copy could not be written.
    #[error("failed to write binarized image to {path}")]
    SideChannel {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("configuration: {0}")]
    Config(String),
}

impl RecognizerError {
    /// True for failures attributable to the OCR collaborator.
    pub fn is_ocr_failure(&self) -> bool {
        matches!(self, Self::OcrAdapter(_) | Self::OcrTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, RecognizerError>;
