use image::GrayImage;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::setup::locate_tesseract;
use crate::config::OcrConfig;
use crate::error::{RecognizerError, Result};

/// How often a running OCR process is checked for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Converts a binarized image into newline-delimited text.
///
/// Line order in the returned text must follow top-to-bottom order in the
/// image. Nothing else is promised: the text may be empty or contain
/// garbage and non-ASCII bytes.
pub trait OcrEngine {
    fn recognize(&self, img: &GrayImage) -> Result<String>;
}

/// Any closure with the right shape is an engine, which keeps scripted
/// engines in tests and wrappers in callers free of boilerplate.
impl<F> OcrEngine for F
where
    F: Fn(&GrayImage) -> Result<String>,
{
    fn recognize(&self, img: &GrayImage) -> Result<String> {
        self(img)
    }
}

/// Runs the Tesseract CLI on each image.
///
/// Every call writes its input to a fresh temporary directory, so
/// concurrent calls never share a file.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    config: OcrConfig,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, img: &GrayImage) -> Result<String> {
        if img.width() == 0 || img.height() == 0 {
            debug!("Empty OCR input, nothing to recognize");
            return Ok(String::new());
        }

        let paths = locate_tesseract(&self.config)?;

        let work_dir = tempfile::Builder::new()
            .prefix("spotify-ocr-")
            .tempdir()
            .map_err(|e| RecognizerError::OcrAdapter(format!("failed to create work dir: {}", e)))?;
        let input_path = work_dir.path().join("input.png");
        // Tesseract appends .txt to the output base
        let output_base = work_dir.path().join("output");

        img.save(&input_path)
            .map_err(|e| RecognizerError::OcrAdapter(format!("failed to write OCR input: {}", e)))?;

        let mut command = Command::new(&paths.executable);
        command.arg(&input_path).arg(&output_base);
        if let Some(tessdata) = &paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        command
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.page_segmentation_mode.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(|e| {
            RecognizerError::OcrAdapter(format!(
                "failed to start {}: {}",
                paths.executable.display(),
                e
            ))
        })?;

        let (status, stderr) = wait_with_timeout(child, self.config.timeout_ms)?;
        if !status.success() {
            return Err(RecognizerError::OcrAdapter(format!(
                "Tesseract failed ({}): {}",
                status,
                stderr.trim()
            )));
        }

        let txt_path = output_base.with_extension("txt");
        let bytes = std::fs::read(&txt_path).map_err(|e| {
            RecognizerError::OcrAdapter(format!("failed to read Tesseract output: {}", e))
        })?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Waits for `child` to exit, killing it once `timeout_ms` has elapsed.
///
/// Stderr is drained on a separate thread while waiting, so a chatty
/// process never stalls on a full pipe. Returns the exit status and
/// whatever the process wrote to stderr.
fn wait_with_timeout(mut child: Child, timeout_ms: u64) -> Result<(ExitStatus, String)> {
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                return Err(RecognizerError::OcrAdapter(format!(
                    "failed to poll OCR process: {}",
                    e
                )));
            }
        }

        if start.elapsed() > timeout {
            warn!("OCR process exceeded {}ms, killing it", timeout_ms);
            let _ = child.kill();
            let _ = child.wait();
            return Err(RecognizerError::OcrTimeout { timeout_ms });
        }

        thread::sleep(POLL_INTERVAL);
    };

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default();

    Ok((status, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_engine() {
        let engine = |_: &GrayImage| -> Result<String> { Ok("Song\nArtist\n".to_string()) };
        let img = GrayImage::new(4, 4);

        assert_eq!(engine.recognize(&img).unwrap(), "Song\nArtist\n");
    }

    #[test]
    fn test_empty_image_short_circuits() {
        let engine = TesseractEngine::default();
        let img = GrayImage::new(0, 0);

        assert_eq!(engine.recognize(&img).unwrap(), "");
    }

    #[test]
    fn test_missing_executable_is_adapter_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TesseractEngine::new(OcrConfig {
            tesseract_path: Some(dir.path().join("missing")),
            ..OcrConfig::default()
        });

        let err = engine.recognize(&GrayImage::new(8, 8)).unwrap_err();
        assert!(err.is_ocr_failure());
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_process_times_out() {
        let child = Command::new("sleep")
            .arg("5")
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let err = wait_with_timeout(child, 50).unwrap_err();
        assert!(matches!(err, RecognizerError::OcrTimeout { timeout_ms: 50 }));
    }

    #[cfg(unix)]
    #[test]
    fn test_finished_process_reports_status() {
        let child = Command::new("true").stderr(Stdio::piped()).spawn().unwrap();

        let (status, _) = wait_with_timeout(child, 5_000).unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stderr_output_does_not_stall() {
        // Far more than a pipe buffer holds
        let child = Command::new("sh")
            .arg("-c")
            .arg("head -c 200000 /dev/zero | tr '\\0' 'x' >&2")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let (status, stderr) = wait_with_timeout(child, 5_000).unwrap();

        assert!(status.success());
        assert_eq!(stderr.len(), 200_000);
    }
}
