use crate::error::{Result, SimilarityError};
use crate::signature::{Signature, SIGNATURE_SIZE};

const SIGNATURE_BYTES: usize = SIGNATURE_SIZE * std::mem::size_of::<f32>();

/// Key stored in the bounding-box index: a leaf point or an internal box.
///
/// A point behaves as a degenerate box whose corners are both the point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexKey {
    Point(Signature),
    Box { min: Signature, max: Signature },
}

/// Answer of the consistency check for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consistency {
    /// The subtree may hold matches
    pub may_match: bool,
    /// Matches must be verified with the exact distance
    pub recheck: bool,
}

impl IndexKey {
    /// Leaf key for a signature; stored as is.
    pub fn compress(signature: &Signature) -> Self {
        IndexKey::Point(*signature)
    }

    /// Stored keys need no unpacking, so this is the identity.
    pub fn decompress(self) -> Self {
        self
    }

    pub fn lower(&self) -> &Signature {
        match self {
            IndexKey::Point(point) => point,
            IndexKey::Box { min, .. } => min,
        }
    }

    pub fn upper(&self) -> &Signature {
        match self {
            IndexKey::Point(point) => point,
            IndexKey::Box { max, .. } => max,
        }
    }

    /// This key as a two-corner box.
    pub fn to_box(&self) -> Self {
        IndexKey::Box {
            min: *self.lower(),
            max: *self.upper(),
        }
    }

    /// Grow this key in place so it also covers `other`. Points become boxes.
    pub fn extend(&mut self, other: &IndexKey) {
        let mut min = *self.lower();
        let mut max = *self.upper();
        for i in 0..SIGNATURE_SIZE {
            min.values[i] = min.values[i].min(other.lower().values[i]);
            max.values[i] = max.values[i].max(other.upper().values[i]);
        }
        *self = IndexKey::Box { min, max };
    }

    /// Bounding box of all `keys`.
    pub fn union(keys: &[IndexKey]) -> Result<IndexKey> {
        let (first, rest) = keys.split_first().ok_or(SimilarityError::EmptyUnion)?;
        let mut merged = first.to_box();
        for key in rest {
            merged.extend(key);
        }
        Ok(merged)
    }

    /// Union plus the stored size of the merged key in bytes.
    pub fn union_with_size(keys: &[IndexKey]) -> Result<(IndexKey, usize)> {
        let merged = Self::union(keys)?;
        let size = merged.stored_size();
        Ok((merged, size))
    }

    /// Product of the side lengths over every dimension.
    pub fn volume(&self) -> f32 {
        let (min, max) = (self.lower(), self.upper());
        (0..SIGNATURE_SIZE)
            .map(|i| max.values[i] - min.values[i])
            .product()
    }

    /// Volumes of the union and of the intersection of two keys.
    ///
    /// Dimensions that do not overlap contribute a zero side to the
    /// intersection.
    pub fn union_intersect_volume(&self, other: &IndexKey) -> (f32, f32) {
        let mut union_volume = 1.0f32;
        let mut intersect_volume = 1.0f32;

        for i in 0..SIGNATURE_SIZE {
            let (a_min, a_max) = (self.lower().values[i], self.upper().values[i]);
            let (b_min, b_max) = (other.lower().values[i], other.upper().values[i]);
            union_volume *= a_max.max(b_max) - a_min.min(b_min);
            intersect_volume *= (a_max.min(b_max) - a_min.max(b_min)).max(0.0);
        }

        (union_volume, intersect_volume)
    }

    /// Volume enlargement caused by inserting `candidate` under this key.
    pub fn penalty(&self, candidate: &IndexKey) -> f32 {
        let (union_volume, _) = self.union_intersect_volume(candidate);
        union_volume - self.volume()
    }

    /// Same shape and bit-identical corners, so `NaN` matches itself and
    /// `-0.0` differs from `0.0`.
    pub fn same(&self, other: &IndexKey) -> bool {
        fn bits_equal(a: &Signature, b: &Signature) -> bool {
            a.values
                .iter()
                .zip(b.values.iter())
                .all(|(x, y)| x.to_bits() == y.to_bits())
        }

        match (self, other) {
            (IndexKey::Point(a), IndexKey::Point(b)) => bits_equal(a, b),
            (
                IndexKey::Box { min: a_min, max: a_max },
                IndexKey::Box { min: b_min, max: b_max },
            ) => bits_equal(a_min, b_min) && bits_equal(a_max, b_max),
            _ => false,
        }
    }

    /// The index is lossy: every key may match and every match is rechecked.
    pub fn consistent(&self, _query: &Signature) -> Consistency {
        Consistency {
            may_match: true,
            recheck: true,
        }
    }

    /// Lower bound on the distance from `query` to any point inside this key.
    pub fn ordering_distance(&self, query: &Signature) -> f64 {
        let (min, max) = (self.lower(), self.upper());
        let mut distance = 0.0f64;

        for i in 0..SIGNATURE_SIZE {
            let q = query.values[i] as f64;
            let lo = min.values[i] as f64;
            let hi = max.values[i] as f64;
            if q < lo {
                distance += (lo - q) * (lo - q);
            } else if q > hi {
                distance += (q - hi) * (q - hi);
            }
        }

        distance.sqrt()
    }

    /// Size of the stored form: one or two signature blocks.
    pub fn stored_size(&self) -> usize {
        match self {
            IndexKey::Point(_) => SIGNATURE_BYTES,
            IndexKey::Box { .. } => 2 * SIGNATURE_BYTES,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.stored_size());
        match self {
            IndexKey::Point(point) => bytes.extend_from_slice(point.as_bytes()),
            IndexKey::Box { min, max } => {
                bytes.extend_from_slice(min.as_bytes());
                bytes.extend_from_slice(max.as_bytes());
            }
        }
        bytes
    }

    /// Parse a stored key. Any length other than one or two signatures means
    /// the stored index is corrupt.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            SIGNATURE_BYTES => Ok(IndexKey::Point(Signature::from_bytes(bytes)?)),
            len if len == 2 * SIGNATURE_BYTES => {
                let (min, max) = bytes.split_at(SIGNATURE_BYTES);
                Ok(IndexKey::Box {
                    min: Signature::from_bytes(min)?,
                    max: Signature::from_bytes(max)?,
                })
            }
            len => Err(SimilarityError::InvalidKeySize(len)),
        }
    }
}

impl From<Signature> for IndexKey {
    fn from(signature: Signature) -> Self {
        IndexKey::Point(signature)
    }
}
