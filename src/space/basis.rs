use crate::grid::Geometry;
use crate::space::BaseFunctionSet;
use crate::Real;
use nalgebra::{convert, DMatrix, DVector};

/// Equidistant one-dimensional Lagrange polynomial `i` of the given degree on `[0, 1]`.
fn lagrange_1d<T: Real>(degree: usize, i: usize, x: T) -> T {
    if degree == 0 {
        return T::one();
    }
    let node = |j: usize| convert::<f64, T>(j as f64 / degree as f64);
    (0..=degree)
        .filter(|&j| j != i)
        .fold(T::one(), |acc, j| acc * (x - node(j)) / (node(i) - node(j)))
}

fn lagrange_1d_derivative<T: Real>(degree: usize, i: usize, x: T) -> T {
    if degree == 0 {
        return T::zero();
    }
    let node = |j: usize| convert::<f64, T>(j as f64 / degree as f64);
    let mut derivative = T::zero();
    for l in (0..=degree).filter(|&l| l != i) {
        let product = (0..=degree)
            .filter(|&j| j != i && j != l)
            .fold(T::one(), |acc, j| acc * (x - node(j)) / (node(i) - node(j)));
        derivative += product / (node(i) - node(l));
    }
    derivative
}

/// Splits a scalar basis function index into per-axis indices, first axis fastest.
fn tensor_indices(index: usize, degree: usize, dim: usize) -> impl Iterator<Item = usize> {
    let n = degree + 1;
    (0..dim).scan(index, move |remainder, _| {
        let i = *remainder % n;
        *remainder /= n;
        Some(i)
    })
}

/// Reference nodes of the tensor-product Lagrange basis of the given degree on `[0, 1]^dim`.
///
/// The nodes are ordered like the scalar basis functions. Degree zero has the cell center as
/// its only node.
pub fn lagrange_nodes<T: Real>(degree: usize, dim: usize) -> Vec<DVector<T>> {
    let n = (degree + 1).pow(dim as u32);
    (0..n)
        .map(|index| {
            let coordinates = tensor_indices(index, degree, dim).map(|i| {
                if degree == 0 {
                    convert::<f64, T>(0.5)
                } else {
                    convert::<f64, T>(i as f64 / degree as f64)
                }
            });
            DVector::from_iterator(dim, coordinates)
        })
        .collect()
}

/// Tensor-product Lagrange basis on a cube entity.
///
/// Vector-valued sets replicate the scalar basis per component: local function
/// `c * n + k` is the scalar function `k` in component `c`, where `n` is the scalar size.
#[derive(Debug, Clone, Copy)]
pub struct LagrangeBasis<'a, T: Real> {
    entity: usize,
    geometry: &'a dyn Geometry<T>,
    degree: usize,
    range_dim: usize,
}

impl<'a, T: Real> LagrangeBasis<'a, T> {
    pub fn new(entity: usize, geometry: &'a dyn Geometry<T>, degree: usize, range_dim: usize) -> Self {
        assert!(range_dim > 0, "Range dimension must be positive");
        Self {
            entity,
            geometry,
            degree,
            range_dim,
        }
    }

    fn dim(&self) -> usize {
        self.geometry.mydim()
    }

    fn scalar_size(&self) -> usize {
        (self.degree + 1).pow(self.dim() as u32)
    }

    fn scalar_value(&self, index: usize, local: &DVector<T>) -> T {
        tensor_indices(index, self.degree, self.dim())
            .zip(local.iter())
            .fold(T::one(), |acc, (i, &x)| acc * lagrange_1d(self.degree, i, x))
    }
}

impl<'a, T: Real> BaseFunctionSet<T> for LagrangeBasis<'a, T> {
    fn entity(&self) -> usize {
        self.entity
    }

    fn geometry(&self) -> &dyn Geometry<T> {
        self.geometry
    }

    fn size(&self) -> usize {
        self.range_dim * self.scalar_size()
    }

    fn order(&self) -> usize {
        self.degree
    }

    fn range_dim(&self) -> usize {
        self.range_dim
    }

    fn populate_values(&self, local: &DVector<T>, values: &mut DMatrix<T>) {
        assert_eq!(local.len(), self.dim(), "Reference point has wrong dimension");
        let n = self.scalar_size();
        values.resize_mut(self.range_dim, self.range_dim * n, T::zero());
        values.fill(T::zero());
        for k in 0..n {
            let phi = self.scalar_value(k, local);
            for c in 0..self.range_dim {
                values[(c, c * n + k)] = phi;
            }
        }
    }

    fn populate_reference_gradients(&self, local: &DVector<T>, gradients: &mut DMatrix<T>) {
        assert_eq!(self.range_dim, 1, "Gradients are only available for scalar base function sets");
        assert_eq!(local.len(), self.dim(), "Reference point has wrong dimension");
        let d = self.dim();
        let n = self.scalar_size();
        gradients.resize_mut(d, n, T::zero());
        for k in 0..n {
            let indices: Vec<_> = tensor_indices(k, self.degree, d).collect();
            for a in 0..d {
                let mut partial = T::one();
                for b in 0..d {
                    partial *= if a == b {
                        lagrange_1d_derivative(self.degree, indices[b], local[b])
                    } else {
                        lagrange_1d(self.degree, indices[b], local[b])
                    };
                }
                gradients[(a, k)] = partial;
            }
        }
    }
}
