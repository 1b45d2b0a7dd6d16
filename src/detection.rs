//! Screen type detection via template matching.
//!
//! The large player view shows a play/pause carat near the top-left corner;
//! notifications do not. Matching the carat template inside that corner
//! region is enough to tell the two layouts apart.

use image::GrayImage;
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};
use tracing::{debug, warn};

use crate::config::DetectorConfig;
use crate::error::{RecognizerError, Result};
use crate::ocr::preprocess::crop_region;

/// Which player layout a screenshot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenType {
    /// Lock-screen or shade notification
    Notification,
    /// Full player application view
    LargeAppView,
}

/// Outcome of matching the carat template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub screen_type: ScreenType,
    /// Highest normalized cross-correlation found (0.0 when the template
    /// could not be placed)
    pub confidence: f32,
    /// Top-left of the best match in full-image pixel coordinates
    pub location: (u32, u32),
}

#[derive(Debug, Clone, Default)]
pub struct ScreenTypeDetector {
    config: DetectorConfig,
}

impl ScreenTypeDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Strictly above the threshold is the large view; equality is not.
    pub fn classify(&self, confidence: f32) -> ScreenType {
        if confidence > self.config.threshold {
            ScreenType::LargeAppView
        } else {
            ScreenType::Notification
        }
    }

    /// Matches `template` inside the carat region of `image`.
    pub fn detect(&self, image: &GrayImage, template: &GrayImage) -> Result<Detection> {
        if image.width() == 0 || image.height() == 0 {
            return Err(RecognizerError::InvalidImage(
                "screenshot has zero area".to_string(),
            ));
        }
        if template.width() == 0 || template.height() == 0 {
            return Err(RecognizerError::InvalidImage(
                "template has zero area".to_string(),
            ));
        }

        let region = self.config.carat_region;
        let (origin_x, origin_y, _, _) = region.to_pixels(image.width(), image.height());
        let search = crop_region(image, &region);

        if template.width() > search.width() || template.height() > search.height() {
            warn!(
                "Template {}x{} does not fit carat region {}x{}, treating as no match",
                template.width(),
                template.height(),
                search.width(),
                search.height()
            );
            return Ok(Detection {
                screen_type: ScreenType::Notification,
                confidence: 0.0,
                location: (origin_x, origin_y),
            });
        }

        let scores = match_template(
            &search,
            template,
            MatchTemplateMethod::CrossCorrelationNormalized,
        );
        let extremes = find_extremes(&scores);

        // All-black windows divide by zero and produce NaN
        let confidence = if extremes.max_value.is_finite() {
            extremes.max_value
        } else {
            0.0
        };
        let (match_x, match_y) = extremes.max_value_location;

        let detection = Detection {
            screen_type: self.classify(confidence),
            confidence,
            location: (origin_x + match_x, origin_y + match_y),
        };

        debug!(
            "Carat match: confidence={:.3} at {:?} (threshold {}) -> {:?}",
            detection.confidence, detection.location, self.config.threshold, detection.screen_type
        );

        Ok(detection)
    }
}
