//! Tunables for signature extraction and the in-memory index.

use std::path::PathBuf;

/// What normalisation does with an image whose intensities are all equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlatPolicy {
    /// Emit an all-zero pattern.
    #[default]
    Zero,
    /// Leave the flat intensities as they are.
    Keep,
}

/// Configuration for turning images into patterns and signatures
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    /// Blur each detail sub-band after the wavelet transform
    pub shuffle: bool,
    pub flat_policy: FlatPolicy,
}

/// Node capacity of [`crate::index::SignatureTree`].
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// A node holding more entries than this is split
    pub max_entries: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_entries: 8,
        }
    }
}

impl TreeConfig {
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(2),
        }
    }
}

/// Configuration for PNG dumps of intermediate patterns
#[derive(Debug, Clone)]
pub struct DumpConfig {
    /// Whether dumps should be written
    pub enabled: bool,
    /// Base directory for dumps, current directory when unset
    pub output_dir: Option<PathBuf>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: None,
        }
    }
}
