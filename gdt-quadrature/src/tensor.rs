//! Rules for the unit cube `[0, 1]^d` formed as tensor products of one-dimensional Gauss rules.

use crate::univariate::{num_points_for_order, unit_interval_gauss, MAX_GAUSS_POINTS};
use crate::{DynRule, Error};

/// Tensor-product Gauss rule on `[0, 1]^dim` with `num_points_per_dim` points along each axis.
///
/// Points are ordered lexicographically with the first coordinate varying fastest.
/// For `dim == 0` the rule consists of the single (empty) point with unit weight.
pub fn unit_cube_gauss(dim: usize, num_points_per_dim: usize) -> DynRule {
    let (weights_1d, points_1d) = unit_interval_gauss(num_points_per_dim);
    let n = weights_1d.len();
    let num_points = n.pow(dim as u32);

    let mut weights = Vec::with_capacity(num_points);
    let mut points = Vec::with_capacity(num_points);
    let mut multi_index = vec![0; dim];
    for _ in 0..num_points {
        let w = multi_index.iter().map(|&i| weights_1d[i]).product();
        let x = multi_index.iter().map(|&i| points_1d[i][0]).collect();
        weights.push(w);
        points.push(x);

        // Increment the multi index with the first axis running fastest
        for i in multi_index.iter_mut() {
            *i += 1;
            if *i < n {
                break;
            }
            *i = 0;
        }
    }

    (weights, points)
}

/// Tensor-product Gauss rule on `[0, 1]^dim` that is exact for polynomials of the given
/// degree in each coordinate.
pub fn unit_cube_gauss_for_order(dim: usize, order: usize) -> Result<DynRule, Error> {
    let n = num_points_for_order(order);
    if n > MAX_GAUSS_POINTS {
        Err(Error::NoRuleAvailable)
    } else {
        Ok(unit_cube_gauss(dim, n))
    }
}
