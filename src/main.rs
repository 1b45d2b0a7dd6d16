//! Spotify Screenshot Recognizer
//!
//! Command-line front end: recognize a single screenshot, or run an
//! acceptance manifest and report how many records failed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spotify_recognizer::batch::{Manifest, run_batch};
use spotify_recognizer::config::load_config_or_default;
use spotify_recognizer::paths::get_default_config_path;
use spotify_recognizer::{RecognizerConfig, SpotifyImageRecognizer, TesseractEngine};

#[derive(Parser, Debug)]
#[command(name = "spotify-recognizer")]
#[command(about = "Extracts artist and song title from music player screenshots")]
struct Args {
    /// Config file (defaults to config.json next to the executable)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Carat template image (overrides the configured default)
    #[arg(short, long, global = true)]
    template: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize a single screenshot
    Recognize {
        image: PathBuf,

        /// Log detector outcome and every OCR line
        #[arg(long)]
        debug: bool,
    },
    /// Run a manifest of 4-line records (image, title, artist, blank)
    Batch { manifest: PathBuf },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = args.config.clone().unwrap_or_else(get_default_config_path);
    let config = load_config_or_default(&config_path);

    match args.command {
        Command::Recognize { image, debug } => {
            recognize(config, &image, args.template.as_deref(), debug)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Batch { manifest } => {
            let manifest = Manifest::from_file(&manifest)?;
            info!("Loaded {} test cases", manifest.len());

            let engine = TesseractEngine::new(config.ocr.clone());
            let report = run_batch(&manifest, &config, args.template.as_deref(), &engine);

            println!("Total Failures: {}/{}", report.failures(), report.total());
            if report.failures() == 0 {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn recognize(
    config: RecognizerConfig,
    image: &std::path::Path,
    template: Option<&std::path::Path>,
    debug: bool,
) -> Result<()> {
    let mut recog = SpotifyImageRecognizer::new(config)?;
    recog
        .load(image, template)
        .with_context(|| format!("Failed to load {}", image.display()))?;
    recog.run(debug).context("Recognition failed")?;

    println!("Artist: {}", recog.artist().unwrap_or("<not found>"));
    println!("Title: {}", recog.title().unwrap_or("<not found>"));
    Ok(())
}
