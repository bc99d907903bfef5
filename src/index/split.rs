use super::key::IndexKey;
use crate::error::{Result, SimilarityError};
use log::debug;

/// Result of splitting an overflowing node.
#[derive(Debug, Clone)]
pub struct Split {
    /// Entry positions assigned to the left node, ascending
    pub left: Vec<usize>,
    /// Entry positions assigned to the right node, ascending
    pub right: Vec<usize>,
    pub left_key: IndexKey,
    pub right_key: IndexKey,
}

/// Divide `entries` into two non-empty groups.
///
/// Seeds are the pair whose union wastes the most volume beyond their
/// intersection. The remaining entries are then placed one at a time: the
/// entry with the strongest preference for one side goes first, to the side
/// whose box grows less. Ties prefer the smaller group.
pub fn pick_split(entries: &[IndexKey]) -> Result<Split> {
    if entries.len() < 2 {
        return Err(SimilarityError::SplitTooSmall(entries.len()));
    }

    let (seed_left, seed_right) = pick_seeds(entries);
    debug!(
        "Splitting {} entries with seeds {} and {}",
        entries.len(),
        seed_left,
        seed_right
    );

    let mut assigned = vec![false; entries.len()];
    let mut left = vec![seed_left];
    let mut right = vec![seed_right];
    assigned[seed_left] = true;
    assigned[seed_right] = true;

    let mut left_key = entries[seed_left].to_box();
    let mut right_key = entries[seed_right].to_box();
    let mut left_volume = left_key.volume();
    let mut right_volume = right_key.volume();

    for _ in 2..entries.len() {
        let mut selected: Option<(usize, f32)> = None;

        for (i, entry) in entries.iter().enumerate() {
            if assigned[i] {
                continue;
            }

            let (left_union, _) = left_key.union_intersect_volume(entry);
            let (right_union, _) = right_key.union_intersect_volume(entry);
            let delta = left_union - left_volume - right_union + right_volume;

            // Would this entry land in the smaller group?
            let towards_smaller = (left.len() < right.len() && delta < 0.0)
                || (left.len() > right.len() && delta > 0.0);

            let better = match selected {
                None => true,
                Some((_, max_delta)) => {
                    delta.abs() > max_delta.abs()
                        || (delta.abs() == max_delta.abs() && towards_smaller)
                }
            };
            if better {
                selected = Some((i, delta));
            }
        }

        let Some((index, delta)) = selected else {
            break;
        };

        if delta < 0.0 || (delta == 0.0 && left.len() < right.len()) {
            left_key.extend(&entries[index]);
            left_volume = left_key.volume();
            left.push(index);
        } else {
            right_key.extend(&entries[index]);
            right_volume = right_key.volume();
            right.push(index);
        }
        assigned[index] = true;
    }

    left.sort_unstable();
    right.sort_unstable();

    Ok(Split {
        left,
        right,
        left_key,
        right_key,
    })
}

/// The pair wasting the most volume; the first pair wins ties.
fn pick_seeds(entries: &[IndexKey]) -> (usize, usize) {
    let mut seeds = (0, 1);
    let mut max_waste: Option<f32> = None;

    for i in 0..entries.len() - 1 {
        for j in i + 1..entries.len() {
            let (union_volume, intersect_volume) = entries[i].union_intersect_volume(&entries[j]);
            let waste = union_volume - intersect_volume;
            if max_waste.map_or(true, |max| waste > max) {
                max_waste = Some(waste);
                seeds = (i, j);
            }
        }
    }

    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{Signature, SIGNATURE_SIZE};

    fn point(base: f32, jitter: f32) -> IndexKey {
        let mut values = [base; SIGNATURE_SIZE];
        for (i, value) in values.iter_mut().enumerate() {
            *value += jitter * (i as f32 + 1.0);
        }
        IndexKey::Point(Signature::new(values))
    }

    #[test]
    fn test_too_few_entries() {
        assert!(matches!(
            pick_split(&[point(0.0, 0.0)]),
            Err(SimilarityError::SplitTooSmall(1))
        ));
    }

    #[test]
    fn test_two_entries() {
        let split = pick_split(&[point(0.0, 0.1), point(1.0, 0.2)]).unwrap();
        assert_eq!(split.left, vec![0]);
        assert_eq!(split.right, vec![1]);
        assert_eq!(split.left_key, point(0.0, 0.1).to_box());
    }

    #[test]
    fn test_separates_two_groups() {
        let entries = vec![
            point(0.0, 0.01),
            point(5.0, 0.01),
            point(0.0, 0.02),
            point(5.0, 0.03),
            point(0.0, 0.03),
            point(5.0, 0.02),
        ];
        let split = pick_split(&entries).unwrap();

        let mut groups = [split.left.clone(), split.right.clone()];
        groups.sort();
        assert_eq!(groups[0], vec![0, 2, 4]);
        assert_eq!(groups[1], vec![1, 3, 5]);

        for (positions, key) in [(&split.left, &split.left_key), (&split.right, &split.right_key)] {
            for &i in positions {
                assert_eq!(key.penalty(&entries[i]), 0.0);
            }
        }
    }

    #[test]
    fn test_identical_entries_are_balanced() {
        let entries = vec![point(1.0, 0.0); 7];
        let split = pick_split(&entries).unwrap();
        assert_eq!(split.left.len() + split.right.len(), 7);
        assert!(split.left.len().abs_diff(split.right.len()) <= 1);
    }

    /// Box spanning `[lo, hi]` on the first axis and `[0, 1]` on every other.
    fn interval(lo: f32, hi: f32) -> IndexKey {
        let mut min = [0.0; SIGNATURE_SIZE];
        let mut max = [1.0; SIGNATURE_SIZE];
        min[0] = lo;
        max[0] = hi;
        IndexKey::Box {
            min: Signature::new(min),
            max: Signature::new(max),
        }
    }

    #[test]
    fn test_equal_delta_prefers_smaller_group() {
        // Seeds 0 and 1; entry 2 joins the left first. Entries 3 and 4 then
        // tie at |delta| = 3, and entry 4 wins because it goes to the
        // smaller right group.
        let entries = vec![
            interval(0.0, 1.0),
            interval(10.0, 11.0),
            interval(1.0, 2.0),
            interval(4.0, 5.0),
            interval(7.0, 8.0),
        ];
        let split = pick_split(&entries).unwrap();
        assert_eq!(split.left, vec![0, 2]);
        assert_eq!(split.right, vec![1, 3, 4]);
        assert_eq!(split.left_key, interval(0.0, 2.0));
        assert_eq!(split.right_key, interval(4.0, 11.0));
    }

    fn corner_volume(min: &[f32; SIGNATURE_SIZE], max: &[f32; SIGNATURE_SIZE]) -> f32 {
        let mut size = 1.0f32;
        for i in 0..SIGNATURE_SIZE {
            size *= max[i] - min[i];
        }
        size
    }

    fn union_volume(
        a: &([f32; SIGNATURE_SIZE], [f32; SIGNATURE_SIZE]),
        b: &([f32; SIGNATURE_SIZE], [f32; SIGNATURE_SIZE]),
    ) -> (f32, f32) {
        let mut union_size = 1.0f32;
        let mut intersect_size = 1.0f32;
        for i in 0..SIGNATURE_SIZE {
            union_size *= a.1[i].max(b.1[i]) - a.0[i].min(b.0[i]);
            let range = a.1[i].min(b.1[i]) - a.0[i].max(b.0[i]);
            intersect_size *= if range < 0.0 { 0.0 } else { range };
        }
        (union_size, intersect_size)
    }

    /// Straight-line quadratic split over raw corner arrays.
    fn reference_split(entries: &[IndexKey]) -> (Vec<usize>, Vec<usize>) {
        let corners: Vec<_> = entries
            .iter()
            .map(|key| (key.lower().values, key.upper().values))
            .collect();
        let n = corners.len();

        let (mut seed_1, mut seed_2, mut waste) = (0, 1, 0.0f32);
        let mut first = true;
        for i in 0..n - 1 {
            for j in i + 1..n {
                let (u, x) = union_volume(&corners[i], &corners[j]);
                if u - x > waste || first {
                    waste = u - x;
                    seed_1 = i;
                    seed_2 = j;
                    first = false;
                }
            }
        }

        let mut done = vec![false; n];
        done[seed_1] = true;
        done[seed_2] = true;
        let (mut left, mut right) = (vec![seed_1], vec![seed_2]);
        let (mut box_l, mut box_r) = (corners[seed_1], corners[seed_2]);

        for _ in 2..n {
            let size_l = corner_volume(&box_l.0, &box_l.1);
            let size_r = corner_volume(&box_r.0, &box_r.1);
            let (mut selected, mut max_delta, mut first) = (0, 0.0f32, true);
            for i in 0..n {
                if done[i] {
                    continue;
                }
                let (union_l, _) = union_volume(&box_l, &corners[i]);
                let (union_r, _) = union_volume(&box_r, &corners[i]);
                let delta = union_l - size_l - union_r + size_r;
                let direction = (left.len() < right.len() && delta < 0.0)
                    || (left.len() > right.len() && delta > 0.0);
                if delta.abs() > max_delta.abs()
                    || (delta.abs() == max_delta.abs() && direction)
                    || first
                {
                    max_delta = delta;
                    selected = i;
                    first = false;
                }
            }

            let target = if max_delta < 0.0 || (max_delta == 0.0 && left.len() < right.len()) {
                left.push(selected);
                &mut box_l
            } else {
                right.push(selected);
                &mut box_r
            };
            for d in 0..SIGNATURE_SIZE {
                target.0[d] = target.0[d].min(corners[selected].0[d]);
                target.1[d] = target.1[d].max(corners[selected].1[d]);
            }
            done[selected] = true;
        }

        left.sort_unstable();
        right.sort_unstable();
        (left, right)
    }

    #[test]
    fn test_matches_reference_split() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(11);
        for round in 0..200 {
            let n = rng.gen_range(2..12);
            // Small integer coordinates give plenty of exact ties.
            let coarse = round % 2 == 0;
            let entries: Vec<IndexKey> = (0..n)
                .map(|_| {
                    let mut a = [0.0f32; SIGNATURE_SIZE];
                    let mut b = [0.0f32; SIGNATURE_SIZE];
                    for d in 0..SIGNATURE_SIZE {
                        let (x, y) = if coarse {
                            (rng.gen_range(0..4) as f32, rng.gen_range(0..4) as f32)
                        } else {
                            (rng.gen_range(0.0..2.0), rng.gen_range(0.0..2.0))
                        };
                        a[d] = x.min(y);
                        b[d] = x.max(y);
                    }
                    if rng.gen_bool(0.5) {
                        IndexKey::Point(Signature::new(a))
                    } else {
                        IndexKey::Box {
                            min: Signature::new(a),
                            max: Signature::new(b),
                        }
                    }
                })
                .collect();

            let split = pick_split(&entries).unwrap();
            let (left, right) = reference_split(&entries);
            assert_eq!(split.left, left, "round {}", round);
            assert_eq!(split.right, right, "round {}", round);
        }
    }
}
