//! Acceptance manifest runner.
//!
//! A manifest is a plain text file of 4-line records:
//!
//! ```text
//! notif-clock.jpg
//! Song Title
//! Artist Name
//! <blank>
//! ```
//!
//! Each record is run through a fresh recognizer and compared exactly
//! (case-sensitive) against the expected pair.

use anyhow::{Context, Result};
use image::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::RecognizerConfig;
use crate::ocr::engine::OcrEngine;
use crate::ocr::extract::ExtractionResult;
use crate::recognizer::SpotifyImageRecognizer;

/// Lines per manifest record: image, title, artist, separator.
const RECORD_LINES: usize = 4;

/// One expected recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Screenshot path, resolved against the manifest directory
    pub image: PathBuf,
    pub expected_title: String,
    pub expected_artist: String,
}

impl TestCase {
    /// Exact, case-sensitive comparison of both fields.
    pub fn matches(&self, result: &ExtractionResult) -> bool {
        result.artist.as_deref() == Some(self.expected_artist.as_str())
            && result.title.as_deref() == Some(self.expected_title.as_str())
    }
}

/// All records loaded from a manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub cases: Vec<TestCase>,
}

impl Manifest {
    /// Load a manifest file. Image names resolve relative to its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to open manifest: {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::parse(&contents, base_dir))
    }

    /// Groups lines into records. A trailing incomplete record is dropped.
    pub fn parse(contents: &str, base_dir: &Path) -> Self {
        let lines: Vec<&str> = contents.lines().collect();

        let cases = lines
            .chunks_exact(RECORD_LINES)
            .map(|record| TestCase {
                image: base_dir.join(record[0]),
                expected_title: record[1].to_string(),
                expected_artist: record[2].to_string(),
            })
            .collect();

        Manifest { cases }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Result of running one record.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub case: TestCase,
    /// None when load or run failed
    pub actual: Option<ExtractionResult>,
    pub error: Option<String>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.actual
            .as_ref()
            .is_some_and(|actual| self.case.matches(actual))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }
}

/// Runs every manifest record through its own recognizer.
///
/// Load and run errors are recorded as failures for that record; they do
/// not stop the batch.
pub fn run_batch<E: OcrEngine>(
    manifest: &Manifest,
    config: &RecognizerConfig,
    template: Option<&Path>,
    engine: &E,
) -> BatchReport {
    let mut report = BatchReport::default();

    for case in &manifest.cases {
        info!(
            "Running test for: {} ({:?} / {:?})",
            case.image.display(),
            case.expected_title,
            case.expected_artist
        );

        let outcome = match run_case(case, config, template, engine) {
            Ok(actual) => CaseOutcome {
                case: case.clone(),
                actual: Some(actual),
                error: None,
            },
            Err(e) => CaseOutcome {
                case: case.clone(),
                actual: None,
                error: Some(format!("{:#}", e)),
            },
        };

        if outcome.passed() {
            info!("Test success for: {}", case.image.display());
        } else {
            match (&outcome.actual, &outcome.error) {
                (Some(actual), _) => warn!(
                    "Test case failure for {}: expected ({:?}, {:?}), got ({:?}, {:?})",
                    case.image.display(),
                    case.expected_artist,
                    case.expected_title,
                    actual.artist,
                    actual.title
                ),
                (None, Some(error)) => {
                    warn!("Test case failure for {}: {}", case.image.display(), error)
                }
                (None, None) => {}
            }
        }

        report.outcomes.push(outcome);
    }

    info!("Total Failures: {}/{}", report.failures(), report.total());
    report
}

fn run_case<E: OcrEngine>(
    case: &TestCase,
    config: &RecognizerConfig,
    template: Option<&Path>,
    engine: &E,
) -> Result<ExtractionResult> {
    let mut recog = SpotifyImageRecognizer::with_engine(config.clone(), |img: &GrayImage| {
        engine.recognize(img)
    })?;
    recog
        .load(&case.image, template)
        .context("Failed to load test image")?;
    let result = recog.run(false).context("Recognition failed")?;
    Ok(result.clone())
}
