//! Spotify Screenshot Recognizer
//!
//! Extracts the artist and song title from a screenshot of a music player,
//! either a lock-screen notification or the full player view. The pipeline
//! classifies the layout by template matching, crops and binarizes the
//! relevant region, runs OCR and reads artist/title out of the OCR lines.

pub mod batch;
pub mod config;
pub mod detection;
pub mod error;
pub mod ocr;
pub mod paths;
pub mod recognizer;

pub use config::{Binarization, DetectorConfig, ParserConfig, RecognizerConfig, RelativeRect};
pub use detection::{Detection, ScreenType, ScreenTypeDetector};
pub use error::{RecognizerError, Result};
pub use ocr::{ExtractionResult, OcrEngine, TesseractEngine};
pub use recognizer::{RecognizerState, SpotifyImageRecognizer};
