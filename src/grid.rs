//! Sampling a function over the fixed input domain.

use crate::neural::{Network, ScalarEvaluator};
use rayon::prelude::*;

/// Default samples per side
pub const GRID_RESOLUTION: usize = 100;
/// The domain is the square [-DOMAIN_EXTENT, DOMAIN_EXTENT]²
pub const DOMAIN_EXTENT: f64 = 5.0;
/// Smaller resolutions are raised to this
pub const MIN_RESOLUTION: usize = 2;

/// Row-major samples of a function, row 0 at the top (x2 = +5)
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub resolution: usize,
    pub values: Vec<f64>,
    /// Color range lower bound
    pub min: f64,
    /// Color range upper bound
    pub max: f64,
}

/// x1 coordinate of column `i`
#[inline]
pub fn column_x1(i: usize, resolution: usize) -> f64 {
    -DOMAIN_EXTENT + (i as f64 / last_index(resolution)) * (2.0 * DOMAIN_EXTENT)
}

/// x2 coordinate of row `j`
#[inline]
pub fn row_x2(j: usize, resolution: usize) -> f64 {
    DOMAIN_EXTENT - (j as f64 / last_index(resolution)) * (2.0 * DOMAIN_EXTENT)
}

#[inline]
fn last_index(resolution: usize) -> f64 {
    (resolution.max(MIN_RESOLUTION) - 1) as f64
}

impl Grid {
    /// Value at column `i`, row `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.resolution + i]
    }

    /// Value scaled into [0, 1] over the grid's color range
    pub fn normalized(&self, i: usize, j: usize) -> f64 {
        ((self.get(i, j) - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Build a grid from raw samples, sanitizing non-finite values and
    /// deriving a non-empty color range
    fn from_samples(resolution: usize, mut values: Vec<f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in &mut values {
            if v.is_finite() {
                min = min.min(*v);
                max = max.max(*v);
            } else {
                *v = 0.0;
            }
        }

        if !min.is_finite() || !max.is_finite() {
            min = 0.0;
            max = 1.0;
        }
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        Self {
            resolution,
            values,
            min,
            max,
        }
    }
}

/// Sample `f(x1, x2)` on a `resolution`² grid over the domain
pub fn sample_grid<F>(resolution: usize, f: F) -> Grid
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    let resolution = resolution.max(MIN_RESOLUTION);
    let mut values = vec![0.0; resolution * resolution];
    values
        .par_chunks_mut(resolution)
        .enumerate()
        .for_each(|(j, row)| {
            let x2 = row_x2(j, resolution);
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = f(column_x1(i, resolution), x2);
            }
        });

    Grid::from_samples(resolution, values)
}

/// Sample a network's output over the domain
pub fn sample_network(net: &Network, resolution: usize) -> Grid {
    let resolution = resolution.max(MIN_RESOLUTION);
    let mut values = vec![0.0; resolution * resolution];
    values
        .par_chunks_mut(resolution)
        .enumerate()
        .for_each_init(
            || ScalarEvaluator::new(net),
            |evaluator, (j, row)| {
                let x2 = row_x2(j, resolution);
                for (i, cell) in row.iter_mut().enumerate() {
                    *cell = evaluator.eval(column_x1(i, resolution), x2);
                }
            },
        );

    Grid::from_samples(resolution, values)
}
