//! Gauss–Legendre rules on one-dimensional intervals.

use crate::{Error, Rule};
use std::f64::consts::PI;

/// The largest number of points for which [`gauss`] is considered accurate enough.
pub const MAX_GAUSS_POINTS: usize = 32;

/// Value of the Legendre polynomial `p_n` and its predecessor `p_{n-1}` at a point.
///
/// Derivatives are computed with a formula that is singular at `|x| == 1`, so this is only
/// suitable for points in the open interval (-1, 1).
#[derive(Debug, Clone, Copy)]
struct Legendre {
    n: usize,
    x: f64,
    p_n: f64,
    p_n_minus_1: f64,
}

impl Legendre {
    fn at(n: usize, x: f64) -> Self {
        // Bonnet's recursion: k p_k = (2k - 1) x p_{k-1} - (k - 1) p_{k-2}
        let mut p_n = 1.0;
        let mut p_n_minus_1 = 0.0;
        for k in 1..=n {
            let k = k as f64;
            let p_n_minus_2 = p_n_minus_1;
            p_n_minus_1 = p_n;
            p_n = ((2.0 * k - 1.0) * x * p_n_minus_1 - (k - 1.0) * p_n_minus_2) / k;
        }
        Self {
            n,
            x,
            p_n,
            p_n_minus_1,
        }
    }

    fn value(&self) -> f64 {
        self.p_n
    }

    fn derivative(&self) -> f64 {
        let n = self.n as f64;
        n * (self.x * self.p_n - self.p_n_minus_1) / (self.x * self.x - 1.0)
    }
}

/// Gauss–Legendre rule with `num_points` points on the reference interval `[-1, 1]`.
///
/// A rule with `n` points integrates polynomials of degree up to `2n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let half = (n + 1) / 2;
    let mut points = vec![[0.0]; n];
    let mut weights = vec![0.0; n];

    for i in 0..half {
        // Chebyshev-like initial guess for the i-th largest root, refined by Newton iterations
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut legendre = Legendre::at(n, x);
        for _ in 0..100 {
            let dx = -legendre.value() / legendre.derivative();
            x += dx;
            legendre = Legendre::at(n, x);
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        let dp = legendre.derivative();
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        // Roots are symmetric about the origin
        points[i] = [-x];
        weights[i] = w;
        points[n - i - 1] = [x];
        weights[n - i - 1] = w;
    }

    (weights, points)
}

/// Gauss–Legendre rule with `num_points` points on the unit interval `[0, 1]`.
pub fn unit_interval_gauss(num_points: usize) -> Rule<1> {
    let (weights, points) = gauss(num_points);
    let weights = weights.into_iter().map(|w| 0.5 * w).collect();
    let points = points.into_iter().map(|[x]| [0.5 * (x + 1.0)]).collect();
    (weights, points)
}

/// The number of Gauss points needed to integrate polynomials of the given degree exactly.
pub fn num_points_for_order(order: usize) -> usize {
    order / 2 + 1
}

/// Gauss–Legendre rule on `[0, 1]` that is exact for polynomials of the given degree.
pub fn unit_interval_gauss_for_order(order: usize) -> Result<Rule<1>, Error> {
    let n = num_points_for_order(order);
    if n > MAX_GAUSS_POINTS {
        Err(Error::NoRuleAvailable)
    } else {
        Ok(unit_interval_gauss(n))
    }
}
