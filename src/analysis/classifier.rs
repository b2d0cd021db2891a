//! Black thumbnail classification
//!
//! Decoding sits behind [ThumbnailDecoder] so the color model and darkness
//! cutoff can change without touching the decision policy.

use image::RgbaImage;
use thiserror::Error;
use tracing::debug;

use super::record::BlackCheck;

/// Channel value below which a pixel channel counts as dark
pub const DEFAULT_BLACK_CUTOFF: u8 = 16;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to decode thumbnail: {0}")]
    Decode(String),
}

/// Turns encoded image bytes into a pixel grid
pub trait ThumbnailDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, ClassifyError>;
}

/// Decoder backed by the `image` crate; sniffs the format from the bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ThumbnailDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, ClassifyError> {
        let img = image::load_from_memory(bytes).map_err(|e| ClassifyError::Decode(e.to_string()))?;
        Ok(img.to_rgba8())
    }
}

/// Measures how much of a thumbnail is black
pub struct BlackFrameClassifier {
    decoder: Box<dyn ThumbnailDecoder>,
    cutoff: u8,
}

impl Default for BlackFrameClassifier {
    fn default() -> Self {
        Self::new(Box::new(ImageCrateDecoder), DEFAULT_BLACK_CUTOFF)
    }
}

impl BlackFrameClassifier {
    pub fn new(decoder: Box<dyn ThumbnailDecoder>, cutoff: u8) -> Self {
        Self { decoder, cutoff }
    }

    /// Decode `bytes`, measure the black ratio and compare it with `blackness_threshold`
    pub fn classify(&self, bytes: &[u8], blackness_threshold: f64) -> Result<BlackCheck, ClassifyError> {
        let pixels = self.decoder.decode(bytes)?;
        let ratio = black_ratio(&pixels, self.cutoff);

        debug!(
            width = pixels.width(),
            height = pixels.height(),
            black_ratio = ratio,
            threshold = blackness_threshold,
            "Measured thumbnail blackness"
        );

        Ok(BlackCheck::new(ratio, blackness_threshold))
    }
}

/// Fraction of pixels whose red, green and blue channels are all below `cutoff`.
///
/// Alpha is ignored. An empty image has ratio 0.
pub fn black_ratio(pixels: &RgbaImage, cutoff: u8) -> f64 {
    let total = u64::from(pixels.width()) * u64::from(pixels.height());
    if total == 0 {
        return 0.0;
    }

    let black = pixels
        .pixels()
        .filter(|p| p.0[..3].iter().all(|&channel| channel < cutoff))
        .count() as u64;

    black as f64 / total as f64
}
