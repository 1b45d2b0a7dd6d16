use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{RecognizerError, Result};
use crate::paths::get_user_tesseract_dir;

#[cfg(windows)]
const TESSERACT_EXE: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_EXE: &str = "tesseract";

#[cfg(windows)]
const COMMON_INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];
#[cfg(not(windows))]
const COMMON_INSTALL_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"];

/// Resolved locations for running Tesseract.
#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// None lets Tesseract use its compiled-in default
    pub tessdata: Option<PathBuf>,
}

/// Resolves the executable and tessdata directory for `config`.
pub fn locate_tesseract(config: &OcrConfig) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    let tessdata = find_tessdata_dir(config.tessdata_dir.as_deref(), &config.language);
    debug!(
        "Tesseract: {} (tessdata: {:?})",
        executable.display(),
        tessdata
    );
    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable.
///
/// Order: explicit override, `TESSERACT_PATH`, the per-user data dir,
/// `PATH`, then common install locations.
pub fn find_tesseract_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(RecognizerError::OcrAdapter(format!(
            "configured tesseract not found at {}",
            path.display()
        )));
    }

    if let Ok(env_path) = std::env::var("TESSERACT_PATH") {
        let p = PathBuf::from(env_path);
        if p.exists() {
            return Ok(p);
        }
    }

    let local_exe = get_user_tesseract_dir().join(TESSERACT_EXE);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(status) = Command::new(TESSERACT_EXE)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        if status.success() {
            return Ok(PathBuf::from(TESSERACT_EXE));
        }
    }

    for dir in COMMON_INSTALL_DIRS {
        let p = Path::new(dir).join(TESSERACT_EXE);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(RecognizerError::OcrAdapter(
        "Tesseract not found. Install tesseract-ocr or set TESSERACT_PATH.".to_string(),
    ))
}

/// Finds a tessdata directory holding `<language>.traineddata`.
///
/// Returns None when nothing explicit is found; Tesseract then falls back
/// to its own default location.
pub fn find_tessdata_dir(explicit: Option<&Path>, language: &str) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }

    let traineddata = format!("{}.traineddata", language);

    let local_tessdata = get_user_tesseract_dir().join("tessdata");
    if local_tessdata.join(&traineddata).exists() {
        return Some(local_tessdata);
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(&traineddata).exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join(&traineddata).exists() {
            return Some(p);
        }
    }

    None
}
