use crate::config::FlatPolicy;
use crate::error::Result;
use crate::pattern::{Pattern, PATTERN_SIZE};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use log::{debug, warn};

/// Turns decoded images into normalised intensity grids.
///
/// The grids are not wavelet-transformed; use
/// [`SignaturePipeline`](crate::pipeline::SignaturePipeline) for patterns
/// that can be compared or turned into signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternBuilder {
    pub flat_policy: FlatPolicy,
}

impl PatternBuilder {
    pub fn new(flat_policy: FlatPolicy) -> Self {
        Self { flat_policy }
    }

    /// Decode an in-memory image. The format is guessed when not given.
    pub fn intensities_from_memory(&self, bytes: &[u8], format: Option<ImageFormat>) -> Result<Pattern> {
        let img = decode(bytes, format)?;
        Ok(self.intensities_from_image(&img))
    }

    /// Resize, convert to intensities and normalise
    pub fn intensities_from_image(&self, img: &DynamicImage) -> Pattern {
        let mut pattern = grayscale_pattern(&resize_to_pattern(img));
        self.normalize(&mut pattern);
        pattern
    }

    /// Rescale every cell to `(value - min) / (max - min)`.
    ///
    /// Returns `false` when the pattern is flat; it is then handled according
    /// to the configured [`FlatPolicy`].
    pub fn normalize(&self, pattern: &mut Pattern) -> bool {
        let (min_val, max_val) = pattern.min_max();

        if max_val > min_val {
            let range = max_val - min_val;
            for column in pattern.values.iter_mut() {
                for value in column.iter_mut() {
                    *value = (*value - min_val) / range;
                }
            }
            return true;
        }

        warn!("Flat image with intensity {:.6}, applying {:?}", min_val, self.flat_policy);
        if self.flat_policy == FlatPolicy::Zero {
            *pattern = Pattern::zero();
        }
        false
    }
}

pub fn decode(bytes: &[u8], format: Option<ImageFormat>) -> Result<DynamicImage> {
    let img = match format {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    debug!("Decoded {}x{} image", img.width(), img.height());
    Ok(img)
}

/// Resample any image to `PATTERN_SIZE × PATTERN_SIZE` RGB.
pub fn resize_to_pattern(img: &DynamicImage) -> RgbImage {
    let size = PATTERN_SIZE as u32;
    image::imageops::resize(&img.to_rgb8(), size, size, FilterType::Triangle)
}

/// Quadratic-mean brightness of one RGB sample, channels in `[0, 1]`.
pub fn quadratic_mean(red: f32, green: f32, blue: f32) -> f32 {
    ((red * red + green * green + blue * blue) / 3.0).sqrt()
}

/// Intensity pattern of a `PATTERN_SIZE`-square RGB image, `values[x][y]`
/// holding the pixel at column `x`, row `y`.
pub fn grayscale_pattern(img: &RgbImage) -> Pattern {
    debug_assert_eq!(img.dimensions(), (PATTERN_SIZE as u32, PATTERN_SIZE as u32));
    Pattern::from_fn(|x, y| {
        let pixel = img.get_pixel(x as u32, y as u32);
        quadratic_mean(
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_quadratic_mean() {
        assert_eq!(quadratic_mean(1.0, 1.0, 1.0), 1.0);
        assert_eq!(quadratic_mean(0.0, 0.0, 0.0), 0.0);
        assert!((quadratic_mean(1.0, 0.0, 0.0) - (1.0f32 / 3.0).sqrt()).abs() < 1e-7);
    }

    #[test]
    fn test_grayscale_addresses_columns_first() {
        let img = RgbImage::from_fn(64, 64, |x, _| if x == 3 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) });
        let pattern = grayscale_pattern(&img);
        assert_eq!(pattern.values[3][10], 1.0);
        assert_eq!(pattern.values[10][3], 0.0);
    }

    #[test]
    fn test_normalize_range() {
        let builder = PatternBuilder::default();
        let mut pattern = Pattern::from_fn(|x, _| 0.2 + x as f32 / 200.0);
        assert!(builder.normalize(&mut pattern));
        let (lo, hi) = pattern.min_max();
        assert_eq!(lo, 0.0);
        assert!((hi - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flat_image_policies() {
        let mut zeroed = Pattern::filled(0.4);
        assert!(!PatternBuilder::new(FlatPolicy::Zero).normalize(&mut zeroed));
        assert_eq!(zeroed, Pattern::zero());

        let mut kept = Pattern::filled(0.4);
        assert!(!PatternBuilder::new(FlatPolicy::Keep).normalize(&mut kept));
        assert_eq!(kept, Pattern::filled(0.4));
    }

    #[test]
    fn test_resize_any_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(17, 250, Rgb([10, 20, 30])));
        let resized = resize_to_pattern(&img);
        assert_eq!(resized.dimensions(), (64, 64));
    }

    #[test]
    fn test_intensities_stop_before_transform() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(40, 40, |x, y| {
            Rgb([(x * 6) as u8, (y * 6) as u8, 90])
        }));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let builder = PatternBuilder::default();
        let intensities = builder
            .intensities_from_memory(&bytes, Some(ImageFormat::Png))
            .unwrap();
        assert_eq!(intensities, builder.intensities_from_image(&img));

        let (lo, hi) = intensities.min_max();
        assert_eq!(lo, 0.0);
        assert!((hi - 1.0).abs() < 1e-6);

        let transformed = crate::pipeline::SignaturePipeline::default()
            .pattern_from_memory(&bytes, None)
            .unwrap();
        assert_eq!(intensities.transformed(), transformed);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode(b"not an image", Some(ImageFormat::Png)).is_err());
        assert!(decode(b"", None).is_err());
    }
}
