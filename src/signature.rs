use crate::error::{Result, SimilarityError};
use crate::pattern::{Orientation, Pattern, PATTERN_SIZE};
use crate::text::{write_float_list, FloatReader};
use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::str::FromStr;

/// Number of components in a signature.
pub const SIGNATURE_SIZE: usize = 16;

/// Index of the DC component.
pub const DC_COMPONENT: usize = SIGNATURE_SIZE - 1;

/// Compact fingerprint of a transformed pattern.
///
/// Components `0..15` are the weighted energies of the horizontal, vertical
/// and diagonal sub-bands for block sides 16, 8, 4, 2 and 1 (coarse to fine,
/// weights 1 to 16). Component 15 is the DC term.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Signature {
    pub values: [f32; SIGNATURE_SIZE],
}

unsafe impl Pod for Signature {}
unsafe impl Zeroable for Signature {}

impl Signature {
    pub fn new(values: [f32; SIGNATURE_SIZE]) -> Self {
        Self { values }
    }

    /// Extract the signature of a wavelet-transformed pattern
    pub fn from_pattern(pattern: &Pattern) -> Self {
        let mut values = [0.0f32; SIGNATURE_SIZE];
        let mut size = PATTERN_SIZE / 2;
        let mut weight = 1.0f32;
        let mut component = 0;

        while size > 1 {
            size /= 2;
            for orientation in Orientation::ALL {
                let (x, y) = orientation.origin(size);
                values[component] = weight * block_energy(pattern, x, y, size);
                component += 1;
            }
            weight *= 2.0;
        }

        values[DC_COMPONENT] = pattern.dc();
        Self { values }
    }

    pub fn dc(&self) -> f32 {
        self.values[DC_COMPONENT]
    }

    /// Euclidean distance between two signatures
    pub fn distance(&self, other: &Signature) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bytemuck::try_pod_read_unaligned(bytes)
            .map_err(|_| SimilarityError::InvalidSignatureSize(bytes.len()))
    }
}

/// L2 norm of the cells in one block.
fn block_energy(pattern: &Pattern, x: usize, y: usize, size: usize) -> f32 {
    pattern.block(x, y, size).map(|v| v * v).sum::<f32>().sqrt()
}

pub fn signature_distance(a: &Signature, b: &Signature) -> f32 {
    a.distance(b)
}

impl From<&Pattern> for Signature {
    fn from(pattern: &Pattern) -> Self {
        Self::from_pattern(pattern)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_float_list(f, &self.values)
    }
}

impl FromStr for Signature {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self> {
        let mut reader = FloatReader::new("signature", s);
        let mut values = [0.0f32; SIGNATURE_SIZE];
        for value in values.iter_mut() {
            *value = reader.next_float()?;
        }
        reader.finish()?;
        Ok(Self { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_pattern_signature() {
        let transformed = Pattern::filled(0.5).transformed();
        let signature = Signature::from_pattern(&transformed);
        assert!(signature.values[..DC_COMPONENT].iter().all(|&v| v == 0.0));
        assert_eq!(signature.dc(), 0.5);
    }

    #[test]
    fn test_level_weights_and_order() {
        let mut pattern = Pattern::zero();
        // Horizontal block of side 16 holds one cell of value 2.
        pattern.values[16][0] = 2.0;
        // Diagonal block of side 1, the finest level.
        pattern.values[1][1] = 0.5;
        // Coarsest level of the transform is skipped entirely.
        pattern.values[40][40] = 9.0;

        let signature = Signature::from_pattern(&pattern);
        assert_eq!(signature.values[0], 2.0);
        assert_eq!(signature.values[14], 16.0 * 0.5);
        assert!(signature.values[1..14].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_block_energy_is_l2_norm() {
        let mut pattern = Pattern::zero();
        pattern.values[0][8] = 3.0;
        pattern.values[1][9] = 4.0;
        let signature = Signature::from_pattern(&pattern);
        // Vertical block of side 8 is the second level, weight 2.
        assert_eq!(signature.values[4], 2.0 * 5.0);
    }

    #[test]
    fn test_distance_properties() {
        let a = Signature::new([1.0; SIGNATURE_SIZE]);
        let mut b = a;
        b.values[3] = 4.0;
        b.values[7] = 5.0;
        assert_eq!(a.distance(&a), 0.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(signature_distance(&b, &a), 5.0);
    }

    #[test]
    fn test_parse_sixteen_values() {
        let text = "(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0)";
        let signature: Signature = text.parse().unwrap();
        for (i, value) in signature.values.iter().enumerate() {
            assert_eq!(*value, (i + 1) as f32);
        }
        assert_eq!(
            signature.to_string(),
            "(1.000000, 2.000000, 3.000000, 4.000000, 5.000000, 6.000000, 7.000000, 8.000000, \
             9.000000, 10.000000, 11.000000, 12.000000, 13.000000, 14.000000, 15.000000, 16.000000)"
        );
    }

    #[test]
    fn test_parse_failures() {
        assert!("(1.0, 2.0, 3.0)".parse::<Signature>().is_err());
        let long = format!("({}, 17.0)", vec!["1.0"; SIGNATURE_SIZE].join(", "));
        assert!(long.parse::<Signature>().is_err());
        let err = "(1.0, x)".parse::<Signature>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input syntax for type signature: \"(1.0, x)\""
        );
    }

    #[test]
    fn test_bytes_layout() {
        let signature = Signature::new([0.25; SIGNATURE_SIZE]);
        assert_eq!(signature.as_bytes().len(), 64);
        assert_eq!(Signature::from_bytes(signature.as_bytes()).unwrap(), signature);
        assert!(Signature::from_bytes(&[0u8; 12]).is_err());
    }
}
