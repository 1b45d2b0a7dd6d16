use std::path::PathBuf;

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the template directory: `<exe_dir>/resources/template/`
pub fn get_template_dir() -> PathBuf {
    get_exe_dir().join("resources").join("template")
}

/// Returns the default carat template: `<exe_dir>/resources/template/carat.png`
pub fn get_default_template_path() -> PathBuf {
    get_template_dir().join("carat.png")
}

/// Returns the default config file: `<exe_dir>/config.json`
pub fn get_default_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the per-user tesseract directory used as a lookup fallback.
pub fn get_user_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spotify-recognizer")
        .join("tesseract")
}
