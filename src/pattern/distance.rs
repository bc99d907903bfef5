use super::{Orientation, Pattern, PATTERN_SIZE};

/// Sum of squared cell differences inside one block.
fn block_difference(a: &Pattern, b: &Pattern, x: usize, y: usize, size: usize) -> f32 {
    a.block(x, y, size)
        .zip(b.block(x, y, size))
        .map(|(va, vb)| (va - vb) * (va - vb))
        .sum()
}

/// Pyramidal L2 distance between two transformed patterns.
///
/// Detail sub-bands are visited from side 32 down to side 1 with a weight that
/// doubles at every finer level; the DC difference gets the final weight.
pub fn pattern_distance(a: &Pattern, b: &Pattern) -> f32 {
    let mut distance = 0.0f32;
    let mut size = PATTERN_SIZE;
    let mut weight = 1.0f32;

    while size > 1 {
        size /= 2;
        for orientation in Orientation::ALL {
            let (x, y) = orientation.origin(size);
            distance += weight * block_difference(a, b, x, y, size);
        }
        weight *= 2.0;
    }

    let dc = a.dc() - b.dc();
    distance += weight * dc * dc;
    distance.sqrt()
}
