use regex::Regex;
use tracing::debug;

use crate::config::ParserConfig;
use crate::detection::ScreenType;
use crate::error::{RecognizerError, Result};

/// Artist and title pulled from one screenshot.
///
/// Either field may be unset; that is a normal outcome for screenshots
/// where the heuristics find nothing, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub artist: Option<String>,
    pub title: Option<String>,
}

impl ExtractionResult {
    /// True once both artist and title were found.
    pub fn is_complete(&self) -> bool {
        self.artist.is_some() && self.title.is_some()
    }
}

/// Splits raw OCR text into lines, top to bottom.
///
/// Non-ASCII and control characters are dropped here so nothing later
/// compares or stores them.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.chars()
                .filter(|c| c.is_ascii() && !c.is_ascii_control())
                .collect()
        })
        .collect()
}

/// Returns true if the line has at least one ASCII letter or digit.
/// Lines without any are decoration (separators, icon misreads).
pub fn qualifies(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_alphanumeric())
}

/// Derives artist and title from OCR lines.
#[derive(Debug, Clone)]
pub struct LineParser {
    /// Alternation of every configured noise token, None when there are none
    noise: Option<Regex>,
    anchor_keyword: String,
    fallback_colon_count: usize,
    title_trailing_trim: usize,
}

impl LineParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let tokens: Vec<String> = config
            .noise_tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(t))
            .collect();

        let noise = if tokens.is_empty() {
            None
        } else {
            let pattern = tokens.join("|");
            Some(Regex::new(&pattern).map_err(|e| {
                RecognizerError::Config(format!("invalid noise token pattern: {}", e))
            })?)
        };

        Ok(Self {
            noise,
            anchor_keyword: config.anchor_keyword.to_ascii_lowercase(),
            fallback_colon_count: config.fallback_colon_count,
            title_trailing_trim: config.title_trailing_trim,
        })
    }

    /// Removes noise tokens anywhere in the line, then trims whitespace.
    pub fn clean_line(&self, line: &str) -> String {
        match &self.noise {
            Some(noise) => noise.replace_all(line, "").trim().to_string(),
            None => line.trim().to_string(),
        }
    }

    pub fn parse(&self, lines: &[String], screen_type: ScreenType) -> ExtractionResult {
        let cleaned: Vec<String> = lines.iter().map(|l| self.clean_line(l)).collect();

        let result = match screen_type {
            ScreenType::Notification => self.parse_notification(&cleaned),
            ScreenType::LargeAppView => self.parse_large_view(&cleaned),
        };

        debug!(
            "Extracted ({:?}) artist={:?} title={:?} from {} lines",
            screen_type,
            result.artist,
            result.title,
            lines.len()
        );

        result
    }

    /// Finds the line artist/title are read upward from.
    ///
    /// First line containing the anchor keyword, scanning down. Failing
    /// that, the last line with exactly the configured number of colons
    /// (the notification timestamp).
    pub fn find_anchor(&self, cleaned: &[String]) -> Option<usize> {
        if !self.anchor_keyword.is_empty() {
            let keyword_line = cleaned
                .iter()
                .position(|line| line.to_ascii_lowercase().contains(&self.anchor_keyword));
            if keyword_line.is_some() {
                return keyword_line;
            }
        }

        cleaned
            .iter()
            .rposition(|line| line.matches(':').count() == self.fallback_colon_count)
    }

    fn parse_notification(&self, cleaned: &[String]) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        let Some(anchor) = self.find_anchor(cleaned) else {
            debug!("No anchor line found in notification text");
            return result;
        };
        debug!("Anchor line {}: {:?}", anchor, cleaned[anchor]);

        for line in cleaned[..anchor].iter().rev() {
            if !qualifies(line) {
                continue;
            }
            if result.artist.is_none() {
                result.artist = Some(line.clone());
            } else {
                result.title = Some(line.clone());
                break;
            }
        }

        result
    }

    /// The cropped band holds the title on the first line and the artist
    /// on the second.
    fn parse_large_view(&self, cleaned: &[String]) -> ExtractionResult {
        if cleaned.len() < 2 {
            debug!("Large view band produced {} lines, need 2", cleaned.len());
            return ExtractionResult::default();
        }

        let title = self.trim_title(&cleaned[0]);
        let artist = &cleaned[1];

        ExtractionResult {
            artist: qualifies(artist).then(|| artist.clone()),
            title: qualifies(&title).then_some(title),
        }
    }

    fn trim_title(&self, title: &str) -> String {
        if self.title_trailing_trim == 0 {
            return title.to_string();
        }
        let keep = title.chars().count().saturating_sub(self.title_trailing_trim);
        title.chars().take(keep).collect::<String>().trim_end().to_string()
    }
}
