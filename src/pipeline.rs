use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::image::loader::{decode, grayscale_pattern, resize_to_pattern};
use crate::image::{NoopObserver, PatternBuilder, PipelineObserver, PipelineStage};
use crate::pattern::Pattern;
use crate::signature::Signature;
use image::{DynamicImage, ImageFormat};
use log::debug;
use std::path::Path;

/// Image → pattern → signature, configured once and reused per image.
///
/// Holds no mutable state, so one pipeline can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct SignaturePipeline {
    config: ExtractorConfig,
}

impl SignaturePipeline {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Transformed (and, if configured, shuffled) pattern of an image.
    pub fn pattern_from_image(&self, img: &DynamicImage) -> Pattern {
        self.pattern_with_observer(img, &mut NoopObserver)
    }

    pub fn pattern_with_observer(
        &self,
        img: &DynamicImage,
        observer: &mut dyn PipelineObserver,
    ) -> Pattern {
        let mut pattern = grayscale_pattern(&resize_to_pattern(img));
        observer.on_pattern(PipelineStage::Grayscale, &pattern);

        PatternBuilder::new(self.config.flat_policy).normalize(&mut pattern);
        observer.on_pattern(PipelineStage::Normalized, &pattern);

        let mut transformed = pattern.transformed();
        observer.on_pattern(PipelineStage::Transformed, &transformed);

        if self.config.shuffle {
            transformed = transformed.shuffled();
            observer.on_pattern(PipelineStage::Shuffled, &transformed);
        }

        debug!("Pattern ready, dc {:.6}", transformed.dc());
        transformed
    }

    pub fn pattern_from_memory(&self, bytes: &[u8], format: Option<ImageFormat>) -> Result<Pattern> {
        let img = decode(bytes, format)?;
        Ok(self.pattern_from_image(&img))
    }

    /// The format is detected from the file contents, not its extension.
    pub fn pattern_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Pattern> {
        let bytes = std::fs::read(path)?;
        self.pattern_from_memory(&bytes, None)
    }

    pub fn signature(&self, pattern: &Pattern) -> Signature {
        Signature::from_pattern(pattern)
    }

    /// Pattern and signature of an image
    pub fn extract(&self, img: &DynamicImage) -> (Pattern, Signature) {
        self.extract_with_observer(img, &mut NoopObserver)
    }

    pub fn extract_with_observer(
        &self,
        img: &DynamicImage,
        observer: &mut dyn PipelineObserver,
    ) -> (Pattern, Signature) {
        let pattern = self.pattern_with_observer(img, observer);
        let signature = self.signature(&pattern);
        observer.on_signature(&signature);
        (pattern, signature)
    }
}
