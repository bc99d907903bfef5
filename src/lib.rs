//! Image Similarity Signatures
//!
//! Computes compact, shift-tolerant fingerprints of images and indexes them
//! in a bounding-box tree for nearest-neighbour search.
//!
//! ## Pipeline
//!
//! 1. **Pattern building** (`image::loader`)
//!    - Decode JPEG/PNG/GIF and resample to a 64×64 grid
//!    - Intensity is the quadratic mean `sqrt((r² + g² + b²) / 3)`
//!    - Normalise to `[0, 1]`; flat images follow [`config::FlatPolicy`]
//!
//! 2. **Wavelet transform** (`pattern::wavelet`)
//!    - Recursive 2D Haar decomposition into an average and three detail
//!      sub-bands (horizontal, vertical, diagonal) per level
//!
//! 3. **Shuffling** (`pattern::shuffle`, optional)
//!    - Blurs each detail sub-band with a radius of a quarter of its side
//!
//! 4. **Signature extraction** (`signature`)
//!    - 15 weighted sub-band energies plus the DC term
//!
//! ## Distances
//!
//! - [`pattern::distance::pattern_distance`]: level-weighted L2 over whole patterns
//! - [`signature::signature_distance`]: Euclidean distance between signatures
//!
//! ## Index
//!
//! [`index::IndexKey`] is either a point (leaf) or a min/max box (internal
//! node). Box union, volume-enlargement penalty, quadratic split and an
//! admissible ordering distance drive [`index::SignatureTree`], whose
//! best-first search rechecks every candidate with the exact distance.

pub mod config;
pub mod error;
pub mod image;
pub mod index;
pub mod pattern;
pub mod pipeline;
pub mod signature;
mod text;

pub use config::{DumpConfig, ExtractorConfig, FlatPolicy, TreeConfig};
pub use error::{Result, SimilarityError};
pub use image::{
    pattern_from_bytes, pattern_from_gif, pattern_from_jpeg, pattern_from_png, pattern_to_rgb_image,
    try_pattern_from_bytes, PatternBuilder, PipelineObserver, PipelineStage, PngDumpObserver,
};
pub use index::{pick_split, IndexKey, Neighbor, SignatureTree, Split};
pub use pattern::{Pattern, PATTERN_SIZE};
pub use pipeline::SignaturePipeline;
pub use signature::{signature_distance, Signature, SIGNATURE_SIZE};
