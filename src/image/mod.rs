pub mod loader;

use crate::config::DumpConfig;
use crate::error::Result;
use crate::pattern::{Pattern, PATTERN_SIZE};
use crate::pipeline::SignaturePipeline;
use crate::signature::{Signature, SIGNATURE_SIZE};
use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use log::info;
use std::path::PathBuf;

pub use loader::PatternBuilder;

/// Stage of the image to pattern pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Resized quadratic-mean intensities
    Grayscale,
    /// Intensities rescaled to `[0, 1]`
    Normalized,
    /// Haar pyramid
    Transformed,
    /// Pyramid after sub-band blurring
    Shuffled,
}

impl PipelineStage {
    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::Grayscale => "grayscale",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Transformed => "transformed",
            PipelineStage::Shuffled => "shuffled",
        }
    }

    /// Wavelet stages hold signed coefficients.
    pub fn is_signed(self) -> bool {
        matches!(self, PipelineStage::Transformed | PipelineStage::Shuffled)
    }
}

/// Hooks called between pipeline stages. Every method defaults to doing nothing.
pub trait PipelineObserver {
    fn on_pattern(&mut self, _stage: PipelineStage, _pattern: &Pattern) {}

    fn on_signature(&mut self, _signature: &Signature) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Writes every stage it sees as a PNG file.
#[derive(Debug, Default)]
pub struct PngDumpObserver {
    config: DumpConfig,
    written: Vec<PathBuf>,
}

impl PngDumpObserver {
    pub fn new(config: DumpConfig) -> Self {
        Self {
            config,
            written: Vec::new(),
        }
    }

    /// Files written so far, in order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        match self.config.output_dir {
            Some(ref dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    fn record(&mut self, path: PathBuf, saved: image::ImageResult<()>) {
        match saved {
            Ok(()) => {
                info!("Debug output saved: {}", path.display());
                self.written.push(path);
            }
            Err(e) => log::warn!("Failed to save debug output {}: {}", path.display(), e),
        }
    }
}

impl PipelineObserver for PngDumpObserver {
    fn on_pattern(&mut self, stage: PipelineStage, pattern: &Pattern) {
        if !self.config.enabled {
            return;
        }
        let path = self.path_for(&format!("pattern-{}.png", stage.name()));
        let saved = pattern_to_rgb_image(pattern, stage.is_signed()).save(&path);
        self.record(path, saved);
    }

    fn on_signature(&mut self, signature: &Signature) {
        if !self.config.enabled {
            return;
        }
        let path = self.path_for("signature.png");
        let saved = signature_to_gray_image(signature).save(&path);
        self.record(path, saved);
    }
}

fn to_byte(value: f32) -> u8 {
    (value * 255.999).clamp(0.0, 255.0) as u8
}

/// Render a pattern for inspection.
///
/// Unsigned patterns become grayscale. Signed patterns show positive
/// coefficients in green and negative ones in red.
pub fn pattern_to_rgb_image(pattern: &Pattern, signed: bool) -> RgbImage {
    let size = PATTERN_SIZE as u32;
    RgbImage::from_fn(size, size, |x, y| {
        let value = pattern.values[x as usize][y as usize];
        if !signed {
            let gray = to_byte(value);
            Rgb([gray, gray, gray])
        } else if value >= 0.0 {
            Rgb([0, to_byte(value), 0])
        } else {
            Rgb([to_byte(-value), 0, 0])
        }
    })
}

/// One row of `SIGNATURE_SIZE` pixels scaled by the largest component.
pub fn signature_to_gray_image(signature: &Signature) -> GrayImage {
    let max = signature.values.iter().cloned().fold(0.0f32, f32::max);
    GrayImage::from_fn(SIGNATURE_SIZE as u32, 1, |x, _| {
        let value = signature.values[x as usize];
        Luma([if max > 0.0 { to_byte(value / max) } else { 0 }])
    })
}

fn pattern_from_format(bytes: &[u8], format: ImageFormat, label: &str) -> Option<Pattern> {
    match SignaturePipeline::default().pattern_from_memory(bytes, Some(format)) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            info!("Error loading {}: {}", label, e);
            None
        }
    }
}

/// Transformed pattern of a JPEG image, `None` when it cannot be decoded
pub fn pattern_from_jpeg(bytes: &[u8]) -> Option<Pattern> {
    pattern_from_format(bytes, ImageFormat::Jpeg, "jpeg")
}

/// Transformed pattern of a PNG image, `None` when it cannot be decoded
pub fn pattern_from_png(bytes: &[u8]) -> Option<Pattern> {
    pattern_from_format(bytes, ImageFormat::Png, "png")
}

/// Transformed pattern of a GIF image, `None` when it cannot be decoded
pub fn pattern_from_gif(bytes: &[u8]) -> Option<Pattern> {
    pattern_from_format(bytes, ImageFormat::Gif, "gif")
}

/// Like [`try_pattern_from_bytes`] with the format guessed, logging failures.
pub fn pattern_from_bytes(bytes: &[u8]) -> Option<Pattern> {
    match try_pattern_from_bytes(bytes, None) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            info!("Error loading image: {}", e);
            None
        }
    }
}

/// Transformed pattern of an in-memory image, keeping the decode error.
pub fn try_pattern_from_bytes(bytes: &[u8], format: Option<ImageFormat>) -> Result<Pattern> {
    SignaturePipeline::default().pattern_from_memory(bytes, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_rendering() {
        let mut pattern = Pattern::zero();
        pattern.values[1][2] = 1.0;
        pattern.values[2][1] = -0.5;
        let img = pattern_to_rgb_image(&pattern, true);
        assert_eq!(img.get_pixel(1, 2), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(2, 1), &Rgb([127, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_signature_rendering() {
        let mut signature = Signature::default();
        signature.values[0] = 2.0;
        signature.values[1] = 1.0;
        let img = signature_to_gray_image(&signature);
        assert_eq!(img.dimensions(), (16, 1));
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(1, 0)[0], 127);
    }

    #[test]
    fn test_decode_failure_is_none() {
        assert!(pattern_from_jpeg(b"definitely not a jpeg").is_none());
        assert!(pattern_from_png(&[]).is_none());
        assert!(pattern_from_gif(b"GIF8").is_none());
        assert!(pattern_from_bytes(b"????").is_none());
    }

    #[test]
    fn test_disabled_dump_writes_nothing() {
        let mut observer = PngDumpObserver::new(DumpConfig {
            enabled: false,
            output_dir: None,
        });
        observer.on_pattern(PipelineStage::Grayscale, &Pattern::zero());
        observer.on_signature(&Signature::default());
        assert!(observer.written().is_empty());
    }
}
