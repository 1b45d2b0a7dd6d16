pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrEngine, TesseractEngine};
pub use extract::{ExtractionResult, LineParser, split_lines};
pub use preprocess::{binarize, crop_region, to_grayscale};
pub use setup::{TesseractPaths, locate_tesseract};
