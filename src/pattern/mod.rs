pub mod distance;
pub mod shuffle;
pub mod wavelet;

use crate::error::{Result, SimilarityError};
use crate::text::{write_float_list, FloatReader};
use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::str::FromStr;

/// Side length of every pattern. Must be a power of two.
pub const PATTERN_SIZE: usize = 64;

/// Orientation of a detail sub-band inside a wavelet pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
    Diagonal,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Horizontal,
        Orientation::Vertical,
        Orientation::Diagonal,
    ];

    /// Top-left cell `(x, y)` of this sub-band for blocks of side `size`.
    pub fn origin(self, size: usize) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (size, 0),
            Orientation::Vertical => (0, size),
            Orientation::Diagonal => (size, size),
        }
    }
}

/// Square grid of intensities, addressed `values[x][y]`.
///
/// Before the wavelet transform it holds normalised grayscale intensities in
/// `[0, 1]`; afterwards cell `(0, 0)` is the DC term and every other cell a
/// detail coefficient.
#[derive(Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Pattern {
    pub values: [[f32; PATTERN_SIZE]; PATTERN_SIZE],
}

unsafe impl Pod for Pattern {}
unsafe impl Zeroable for Pattern {}

impl Pattern {
    pub fn zero() -> Self {
        Self::filled(0.0)
    }

    pub fn filled(value: f32) -> Self {
        Self {
            values: [[value; PATTERN_SIZE]; PATTERN_SIZE],
        }
    }

    /// Build a pattern by evaluating `f(x, y)` for every cell
    pub fn from_fn<F: FnMut(usize, usize) -> f32>(mut f: F) -> Self {
        let mut pattern = Self::zero();
        for (x, column) in pattern.values.iter_mut().enumerate() {
            for (y, value) in column.iter_mut().enumerate() {
                *value = f(x, y);
            }
        }
        pattern
    }

    /// The coarsest approximation coefficient of a transformed pattern.
    pub fn dc(&self) -> f32 {
        self.values[0][0]
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.cells()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }

    pub fn cells(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().flat_map(|column| column.iter().copied())
    }

    /// Cells of the square block with top-left `(x, y)` and side `size`.
    pub(crate) fn block(&self, x: usize, y: usize, size: usize) -> impl Iterator<Item = f32> + '_ {
        self.values[x..x + size]
            .iter()
            .flat_map(move |column| column[y..y + size].iter().copied())
    }

    /// Run the Haar decomposition on a copy of this pattern.
    pub fn transformed(&self) -> Pattern {
        wavelet::forward(self)
    }

    /// Blurred copy of a transformed pattern, see [`shuffle::shuffle`].
    pub fn shuffled(&self) -> Pattern {
        shuffle::shuffle(self)
    }

    pub fn distance(&self, other: &Pattern) -> f32 {
        distance::pattern_distance(self, other)
    }

    /// Raw `PATTERN_SIZE²` float layout.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bytemuck::try_pod_read_unaligned(bytes)
            .map_err(|_| SimilarityError::InvalidPatternSize(bytes.len()))
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lo, hi) = self.min_max();
        f.debug_struct("Pattern")
            .field("size", &PATTERN_SIZE)
            .field("dc", &self.dc())
            .field("min", &lo)
            .field("max", &hi)
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (x, column) in self.values.iter().enumerate() {
            if x > 0 {
                f.write_str(", ")?;
            }
            write_float_list(f, column)?;
        }
        f.write_str(")")
    }
}

impl FromStr for Pattern {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self> {
        let mut reader = FloatReader::new("pattern", s);
        let mut pattern = Pattern::zero();
        for column in pattern.values.iter_mut() {
            for value in column.iter_mut() {
                *value = reader.next_float()?;
            }
        }
        reader.finish()?;
        Ok(pattern)
    }
}
