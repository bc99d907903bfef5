//! Two-dimensional Haar decomposition of a [`Pattern`].
//!
//! Each level reads the current `size × size` approximation, writes the three
//! `half × half` detail sub-bands straight into the output pyramid and keeps
//! the averages in a separate buffer that becomes the next level's input.
//!
//! ```text
//! +-----+-----+
//! | A   | V   |   A: approximation (recursed on)
//! +-----+-----+   H: horizontal detail at (x + half, y)
//! | H   | D   |   V: vertical detail   at (x, y + half)
//! +-----+-----+   D: diagonal detail   at (x + half, y + half)
//! ```

use super::{Pattern, PATTERN_SIZE};

/// Flat `size × size` buffer addressed `[x * size + y]`.
struct Level {
    size: usize,
    cells: Vec<f32>,
}

impl Level {
    fn from_pattern(pattern: &Pattern) -> Self {
        Self {
            size: PATTERN_SIZE,
            cells: pattern.cells().collect(),
        }
    }

    fn get(&self, x: usize, y: usize) -> f32 {
        self.cells[x * self.size + y]
    }
}

/// Forward Haar transform. The input is left untouched.
pub fn forward(source: &Pattern) -> Pattern {
    let mut output = Pattern::zero();
    let mut level = Level::from_pattern(source);

    while level.size > 1 {
        let half = level.size / 2;
        let mut averages = vec![0.0f32; half * half];

        for i in 0..half {
            for j in 0..half {
                let a = level.get(2 * i, 2 * j);
                let b = level.get(2 * i + 1, 2 * j);
                let c = level.get(2 * i, 2 * j + 1);
                let d = level.get(2 * i + 1, 2 * j + 1);

                output.values[i + half][j] = (-a + b - c + d) / 4.0;
                output.values[i][j + half] = (-a - b + c + d) / 4.0;
                output.values[i + half][j + half] = (a - b - c + d) / 4.0;
                averages[i * half + j] = (a + b + c + d) / 4.0;
            }
        }

        level = Level {
            size: half,
            cells: averages,
        };
    }

    output.values[0][0] = level.get(0, 0);
    output
}

/// Inverse of [`forward`]: rebuilds the intensity grid from a pyramid.
pub fn inverse(transformed: &Pattern) -> Pattern {
    let mut level = Level {
        size: 1,
        cells: vec![transformed.dc()],
    };

    while level.size < PATTERN_SIZE {
        let half = level.size;
        let size = half * 2;
        let mut cells = vec![0.0f32; size * size];

        for i in 0..half {
            for j in 0..half {
                let average = level.get(i, j);
                let h = transformed.values[i + half][j];
                let v = transformed.values[i][j + half];
                let d = transformed.values[i + half][j + half];

                cells[(2 * i) * size + 2 * j] = average - h - v + d;
                cells[(2 * i + 1) * size + 2 * j] = average + h - v - d;
                cells[(2 * i) * size + 2 * j + 1] = average - h + v - d;
                cells[(2 * i + 1) * size + 2 * j + 1] = average + h + v + d;
            }
        }

        level = Level { size, cells };
    }

    Pattern::from_fn(|x, y| level.get(x, y))
}
