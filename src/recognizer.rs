//! Recognition facade.
//!
//! Sequences detection, cropping, binarization, OCR and line parsing for one
//! screenshot at a time:
//!
//! ```text
//! load -> detect screen type -> crop (large view only) -> binarize -> OCR -> parse
//! ```
//!
//! Each recognizer owns its image, template and result outright. Callers
//! that process many screenshots are expected to build a fresh recognizer
//! per image rather than share one.

use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::RecognizerConfig;
use crate::detection::{Detection, ScreenType, ScreenTypeDetector};
use crate::error::{RecognizerError, Result};
use crate::ocr::engine::{OcrEngine, TesseractEngine};
use crate::ocr::extract::{ExtractionResult, LineParser, split_lines};
use crate::ocr::preprocess::{binarize, crop_region, to_grayscale};

/// Lifecycle of a recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    /// Nothing loaded
    Idle,
    /// Screenshot and template loaded, no result yet
    Loaded,
    /// Last run finished; result is available
    Complete,
}

pub struct SpotifyImageRecognizer<E: OcrEngine = TesseractEngine> {
    config: RecognizerConfig,
    detector: ScreenTypeDetector,
    parser: LineParser,
    engine: E,
    state: RecognizerState,
    image: Option<DynamicImage>,
    template: Option<GrayImage>,
    detection: Option<Detection>,
    result: ExtractionResult,
}

impl SpotifyImageRecognizer<TesseractEngine> {
    /// Recognizer backed by the Tesseract CLI.
    pub fn new(config: RecognizerConfig) -> Result<Self> {
        let engine = TesseractEngine::new(config.ocr.clone());
        Self::with_engine(config, engine)
    }
}

impl<E: OcrEngine> SpotifyImageRecognizer<E> {
    pub fn with_engine(config: RecognizerConfig, engine: E) -> Result<Self> {
        let parser = LineParser::new(&config.parser)?;
        let detector = ScreenTypeDetector::new(config.detector.clone());

        Ok(Self {
            config,
            detector,
            parser,
            engine,
            state: RecognizerState::Idle,
            image: None,
            template: None,
            detection: None,
            result: ExtractionResult::default(),
        })
    }

    /// Loads a screenshot and the carat template.
    ///
    /// Any previous image, template and result are discarded first. When
    /// `template_path` is None the configured default template is used.
    pub fn load(&mut self, image_path: &Path, template_path: Option<&Path>) -> Result<()> {
        self.reset();

        let template_path: PathBuf = template_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.default_template_path());

        let image = load_image(image_path)?;
        let template = load_image(&template_path)?;

        debug!(
            "Loaded {} ({}x{}) with template {} ({}x{})",
            image_path.display(),
            image.width(),
            image.height(),
            template_path.display(),
            template.width(),
            template.height()
        );

        self.image = Some(image);
        self.template = Some(to_grayscale(&template));
        self.state = RecognizerState::Loaded;
        Ok(())
    }

    /// Runs the full pipeline on the loaded screenshot.
    ///
    /// `show_debug` logs the detector outcome and every OCR line at info
    /// level. Fails with [`RecognizerError::NotLoaded`] before `load()`.
    pub fn run(&mut self, show_debug: bool) -> Result<&ExtractionResult> {
        let (Some(image), Some(template)) = (&self.image, &self.template) else {
            return Err(RecognizerError::NotLoaded);
        };

        self.state = RecognizerState::Loaded;
        self.detection = None;
        self.result = ExtractionResult::default();

        let gray = to_grayscale(image);
        let detection = self.detector.detect(&gray, template)?;

        let binarized = match detection.screen_type {
            ScreenType::LargeAppView => {
                let band = crop_region(&gray, &self.config.large_view_region);
                binarize(&band, self.config.binarization)
            }
            ScreenType::Notification => binarize(&gray, self.config.binarization),
        };

        if let Some(path) = &self.config.binarized_output {
            binarized
                .save(path)
                .map_err(|source| RecognizerError::SideChannel {
                    path: path.clone(),
                    source,
                })?;
        }

        let text = self.engine.recognize(&binarized)?;
        let lines = split_lines(&text);

        if show_debug {
            info!(
                "Screen type {:?} (confidence {:.3} at {:?})",
                detection.screen_type, detection.confidence, detection.location
            );
            for (i, line) in lines.iter().enumerate() {
                info!("Line {}: {}", i, line);
            }
        }

        self.result = self.parser.parse(&lines, detection.screen_type);
        self.detection = Some(detection);
        self.state = RecognizerState::Complete;

        if show_debug {
            info!(
                "Detected artist: {:?}, song title: {:?}",
                self.result.artist, self.result.title
            );
        }

        Ok(&self.result)
    }

    /// Discards image, template and result.
    pub fn reset(&mut self) {
        self.image = None;
        self.template = None;
        self.detection = None;
        self.result = ExtractionResult::default();
        self.state = RecognizerState::Idle;
    }

    pub fn artist(&self) -> Option<&str> {
        self.result.artist.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.result.title.as_deref()
    }

    pub fn result(&self) -> &ExtractionResult {
        &self.result
    }

    pub fn state(&self) -> RecognizerState {
        self.state
    }

    /// Detector outcome of the last successful run.
    pub fn detection(&self) -> Option<&Detection> {
        self.detection.as_ref()
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }
}

/// Opens an image, rejecting unreadable files and zero-sized images.
fn load_image(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path).map_err(|e| RecognizerError::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if img.width() == 0 || img.height() == 0 {
        return Err(RecognizerError::ImageLoad {
            path: path.to_path_buf(),
            reason: "image has zero width or height".to_string(),
        });
    }

    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::{TempDir, tempdir};

    const NOTIFICATION_TEXT: &str = "9:32 AM\nSong Title\nArtist Name\nSpotify\nK I I N\n";
    const LARGE_VIEW_TEXT: &str = "Song Title\nArtist Name\n\x0c";

    fn carat_template() -> GrayImage {
        ImageBuffer::from_fn(5, 5, |x, y| Luma([(30 + x * 40 + y * 10) as u8]))
    }

    struct Fixture {
        dir: TempDir,
        template: PathBuf,
        notification: PathBuf,
        large_view: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();

        let template = dir.path().join("carat.png");
        carat_template().save(&template).unwrap();

        let notification = dir.path().join("notification.png");
        GrayImage::from_fn(200, 200, |x, _| Luma([if x % 7 == 0 { 200 } else { 0 }]))
            .save(&notification)
            .unwrap();

        let large_view = dir.path().join("large.png");
        let mut large = GrayImage::new(200, 200);
        image::imageops::replace(&mut large, &carat_template(), 10, 13);
        large.save(&large_view).unwrap();

        Fixture {
            dir,
            template,
            notification,
            large_view,
        }
    }

    /// Engine that answers by input size: full screenshots get notification
    /// text, cropped bands get large-view text.
    fn scripted_engine(calls: Rc<Cell<usize>>) -> impl Fn(&GrayImage) -> Result<String> {
        move |img: &GrayImage| {
            calls.set(calls.get() + 1);
            assert!(img.pixels().all(|p| p[0] == 0 || p[0] == 255));
            if img.dimensions() == (200, 200) {
                Ok(NOTIFICATION_TEXT.to_string())
            } else {
                Ok(LARGE_VIEW_TEXT.to_string())
            }
        }
    }

    fn recognizer() -> SpotifyImageRecognizer<impl Fn(&GrayImage) -> Result<String>> {
        SpotifyImageRecognizer::with_engine(
            RecognizerConfig::default(),
            scripted_engine(Rc::new(Cell::new(0))),
        )
        .unwrap()
    }

    #[test]
    fn test_run_before_load_fails() {
        let mut recog = recognizer();

        let err = recog.run(false).unwrap_err();

        assert!(matches!(err, RecognizerError::NotLoaded));
        assert_eq!(recog.state(), RecognizerState::Idle);
    }

    #[test]
    fn test_missing_image_is_load_error() {
        let fx = fixture();
        let mut recog = recognizer();

        let err = recog
            .load(&fx.dir.path().join("missing.png"), Some(&fx.template))
            .unwrap_err();

        assert!(matches!(err, RecognizerError::ImageLoad { .. }));
        assert_eq!(recog.state(), RecognizerState::Idle);
    }

    #[test]
    fn test_unreadable_template_is_load_error() {
        let fx = fixture();
        let garbage = fx.dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not a png").unwrap();
        let mut recog = recognizer();

        let err = recog.load(&fx.notification, Some(&garbage)).unwrap_err();

        assert!(matches!(err, RecognizerError::ImageLoad { .. }));
        assert!(matches!(recog.run(false), Err(RecognizerError::NotLoaded)));
    }

    #[test]
    fn test_notification_pipeline() {
        let fx = fixture();
        let calls = Rc::new(Cell::new(0));
        let mut recog = SpotifyImageRecognizer::with_engine(
            RecognizerConfig::default(),
            scripted_engine(calls.clone()),
        )
        .unwrap();

        recog.load(&fx.notification, Some(&fx.template)).unwrap();
        assert_eq!(recog.state(), RecognizerState::Loaded);
        assert_eq!(recog.artist(), None);

        recog.run(false).unwrap();

        assert_eq!(recog.state(), RecognizerState::Complete);
        assert_eq!(recog.detection().unwrap().screen_type, ScreenType::Notification);
        assert_eq!(recog.artist(), Some("Artist Name"));
        assert_eq!(recog.title(), Some("Song Title"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_large_view_pipeline_crops_band() {
        let fx = fixture();
        let mut recog = recognizer();

        recog.load(&fx.large_view, Some(&fx.template)).unwrap();
        let result = recog.run(true).unwrap().clone();

        assert_eq!(recog.detection().unwrap().screen_type, ScreenType::LargeAppView);
        assert_eq!(result.title.as_deref(), Some("Song Title"));
        assert_eq!(result.artist.as_deref(), Some("Artist Name"));
    }

    #[test]
    fn test_run_is_idempotent() {
        let fx = fixture();
        let mut recog = recognizer();
        recog.load(&fx.notification, Some(&fx.template)).unwrap();

        let first = recog.run(false).unwrap().clone();
        let second = recog.run(false).unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(recog.state(), RecognizerState::Complete);
    }

    #[test]
    fn test_reset_clears_everything() {
        let fx = fixture();
        let mut recog = recognizer();
        recog.load(&fx.notification, Some(&fx.template)).unwrap();
        recog.run(false).unwrap();

        recog.reset();

        assert_eq!(recog.state(), RecognizerState::Idle);
        assert_eq!(recog.artist(), None);
        assert_eq!(recog.title(), None);
        assert!(recog.detection().is_none());
        assert!(matches!(recog.run(false), Err(RecognizerError::NotLoaded)));
    }

    #[test]
    fn test_load_discards_previous_result() {
        let fx = fixture();
        let mut recog = recognizer();
        recog.load(&fx.notification, Some(&fx.template)).unwrap();
        recog.run(false).unwrap();

        recog.load(&fx.large_view, Some(&fx.template)).unwrap();

        assert_eq!(recog.state(), RecognizerState::Loaded);
        assert_eq!(recog.artist(), None);
    }

    #[test]
    fn test_ocr_failure_propagates() {
        let fx = fixture();
        let engine = |_: &GrayImage| -> Result<String> {
            Err(RecognizerError::OcrAdapter("engine unavailable".to_string()))
        };
        let mut recog =
            SpotifyImageRecognizer::with_engine(RecognizerConfig::default(), engine).unwrap();
        recog.load(&fx.notification, Some(&fx.template)).unwrap();

        let err = recog.run(false).unwrap_err();

        assert!(err.is_ocr_failure());
        assert_eq!(recog.state(), RecognizerState::Loaded);
        assert_eq!(recog.artist(), None);
    }

    #[test]
    fn test_empty_ocr_output_is_soft() {
        let fx = fixture();
        let engine = |_: &GrayImage| -> Result<String> { Ok(String::new()) };
        let mut recog =
            SpotifyImageRecognizer::with_engine(RecognizerConfig::default(), engine).unwrap();
        recog.load(&fx.notification, Some(&fx.template)).unwrap();

        let result = recog.run(false).unwrap();

        assert_eq!(result, &ExtractionResult::default());
        assert_eq!(recog.state(), RecognizerState::Complete);
    }

    #[test]
    fn test_side_channel_copy_written() {
        let fx = fixture();
        let side_channel = fx.dir.path().join("binarized.png");
        let config = RecognizerConfig {
            binarized_output: Some(side_channel.clone()),
            ..RecognizerConfig::default()
        };
        let mut recog =
            SpotifyImageRecognizer::with_engine(config, scripted_engine(Rc::new(Cell::new(0))))
                .unwrap();
        recog.load(&fx.large_view, Some(&fx.template)).unwrap();

        recog.run(false).unwrap();

        let written = image::open(&side_channel).unwrap();
        assert!(written.width() < 200);
    }

    #[test]
    fn test_default_template_from_config() {
        let fx = fixture();
        let config = RecognizerConfig {
            template_path: Some(fx.template.clone()),
            ..RecognizerConfig::default()
        };
        let mut recog =
            SpotifyImageRecognizer::with_engine(config, scripted_engine(Rc::new(Cell::new(0))))
                .unwrap();

        recog.load(&fx.notification, None).unwrap();

        assert_eq!(recog.state(), RecognizerState::Loaded);
    }
}
