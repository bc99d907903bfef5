use super::{Orientation, Pattern, PATTERN_SIZE};

/// Blur every detail sub-band of a transformed pattern.
///
/// Sub-bands of side 32, 16, 8 and 4 are blurred with radius `side / 4`, so
/// comparisons become less sensitive to small shifts of the source image.
/// All reads come from `source`; the result is a new pattern.
pub fn shuffle(source: &Pattern) -> Pattern {
    let mut shuffled = *source;
    let mut size = PATTERN_SIZE;

    while size > 4 {
        size /= 2;
        for orientation in Orientation::ALL {
            let (x, y) = orientation.origin(size);
            blur_block(&mut shuffled, source, x, y, size, size / 4);
        }
    }

    shuffled
}

/// Weighted root-mean-square of the cells within `radius` of each cell,
/// clamped to the block `(x, y) - (x + size, y + size)`.
fn blur_block(dst: &mut Pattern, src: &Pattern, x: usize, y: usize, size: usize, radius: usize) {
    let r = radius as f32;

    for i in x..x + size {
        for j in y..y + size {
            let ii_range = i.saturating_sub(radius).max(x)..(i + radius + 1).min(x + size);
            let jj_range = j.saturating_sub(radius).max(y)..(j + radius + 1).min(y + size);

            let mut sum = 0.0f32;
            let mut weight_sum = 0.0f32;

            for ii in ii_range {
                for jj in jj_range.clone() {
                    let dx = i.abs_diff(ii) as f32;
                    let dy = j.abs_diff(jj) as f32;
                    let weight = 1.0 - (dx * dx + dy * dy).sqrt() / r;
                    if weight <= 0.0 {
                        continue;
                    }
                    let value = src.values[ii][jj];
                    sum += value * value * weight;
                    weight_sum += weight;
                }
            }

            // The centre cell always carries weight 1.
            debug_assert!(weight_sum > 0.0);
            dst.values[i][j] = (sum / weight_sum).sqrt();
        }
    }
}
