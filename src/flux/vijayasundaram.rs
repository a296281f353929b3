use crate::flux::{assert_arguments, normal_jacobian, FluxError, FluxFunction, NumericalFlux, Parameter};
use crate::Real;
use nalgebra::linalg::Schur;
use nalgebra::{convert, DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Eigenvalues `Λ`, eigenvectors `T` (as columns) and `T^{-1}` of a diagonalizable matrix.
pub type EigenDecomposition<T> = (DVector<T>, DMatrix<T>, DMatrix<T>);

type DecompositionFn<T> = dyn Fn(&DMatrix<T>) -> Result<EigenDecomposition<T>, FluxError> + Send + Sync;

/// Computes a real eigendecomposition `P = T Λ T^{-1}`.
///
/// Entries below the diagonal of the real Schur form and differences between eigenvalues are
/// considered zero if they are at most `tolerance` relative to the largest entry of `P`
/// (or absolute, if all entries are smaller than one).
///
/// Fails if `P` has complex eigenvalues or is not diagonalizable.
pub fn real_eigen_decomposition<T: Real>(p: &DMatrix<T>, tolerance: T) -> Result<EigenDecomposition<T>, FluxError> {
    assert!(p.is_square(), "Matrix must be square");
    let m = p.nrows();
    let tol = tolerance * p.amax().max(T::one());

    let schur = Schur::try_new(p.clone(), T::default_epsilon(), 10_000).ok_or(FluxError::EigenDecomposition {
        reason: "Schur iteration did not converge",
    })?;
    let (q, t) = schur.unpack();

    if (1..m).any(|i| t[(i, i - 1)].abs() > tol) {
        return Err(FluxError::EigenDecomposition {
            reason: "eigenvalues are not real",
        });
    }

    // Eigenvectors of the triangular factor by back substitution, column k belonging to t_kk
    let mut y = DMatrix::zeros(m, m);
    for k in 0..m {
        y[(k, k)] = T::one();
        for i in (0..k).rev() {
            let residual = ((i + 1)..=k).fold(T::zero(), |acc, j| acc + t[(i, j)] * y[(j, k)]);
            let shift = t[(i, i)] - t[(k, k)];
            if shift.abs() > tol {
                y[(i, k)] = -residual / shift;
            } else if residual.abs() <= tol {
                y[(i, k)] = T::zero();
            } else {
                return Err(FluxError::EigenDecomposition {
                    reason: "matrix is not diagonalizable",
                });
            }
        }
    }

    let eigenvalues = t.diagonal();
    let eigenvectors = q * y;
    let inverse = eigenvectors
        .clone()
        .try_inverse()
        .ok_or(FluxError::EigenDecomposition {
            reason: "eigenvectors are linearly dependent",
        })?;
    Ok((eigenvalues, eigenvectors, inverse))
}

/// Vijayasundaram flux for hyperbolic systems.
///
/// The normal jacobian `P = sum_s n_s df_s/du` at the mean state is decomposed as
/// `P = T Λ T^{-1}` and the flux is `T Λ⁺ T^{-1} u + T Λ⁻ T^{-1} v`, with `Λ⁺` and `Λ⁻` the
/// positive and negative parts of the eigenvalues.
#[derive(Clone)]
pub struct Vijayasundaram<T: Real> {
    flux: Arc<dyn FluxFunction<T>>,
    decomposition: Option<Arc<DecompositionFn<T>>>,
    tolerance: T,
}

impl<T: Real> Vijayasundaram<T> {
    pub fn new(flux: Arc<dyn FluxFunction<T>>) -> Result<Self, FluxError> {
        if flux.state_dim() == 0 || flux.domain_dim() == 0 {
            return Err(FluxError::NotAvailableForDimensions {
                flux: "Vijayasundaram",
                domain_dim: flux.domain_dim(),
                state_dim: flux.state_dim(),
            });
        }
        Ok(Self {
            flux,
            decomposition: None,
            tolerance: convert(1e-10),
        })
    }

    /// Replaces the default eigensolver by a custom decomposition of the normal jacobian.
    pub fn with_eigen_decomposition<F>(mut self, decomposition: F) -> Self
    where
        F: Fn(&DMatrix<T>) -> Result<EigenDecomposition<T>, FluxError> + Send + Sync + 'static,
    {
        self.decomposition = Some(Arc::new(decomposition));
        self
    }

    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn decompose(&self, p: &DMatrix<T>) -> Result<EigenDecomposition<T>, FluxError> {
        match &self.decomposition {
            Some(decomposition) => decomposition(p),
            None => real_eigen_decomposition(p, self.tolerance),
        }
    }
}

impl<T: Real> Debug for Vijayasundaram<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vijayasundaram")
            .field("domain_dim", &self.flux.domain_dim())
            .field("state_dim", &self.flux.state_dim())
            .field("tolerance", &self.tolerance)
            .field("custom_decomposition", &self.decomposition.is_some())
            .finish()
    }
}

impl<T: Real> NumericalFlux<T> for Vijayasundaram<T> {
    fn state_dim(&self) -> usize {
        self.flux.state_dim()
    }

    fn domain_dim(&self) -> usize {
        self.flux.domain_dim()
    }

    fn apply(
        &self,
        u: &DVector<T>,
        v: &DVector<T>,
        n: &DVector<T>,
        param: &Parameter<T>,
    ) -> Result<DVector<T>, FluxError> {
        let flux = self.flux.as_ref();
        assert_arguments(flux, u, v, n);
        let mean = (u + v) * convert::<f64, T>(0.5);
        let p = normal_jacobian(flux, &mean, n, param);
        let (eigenvalues, eigenvectors, inverse) = self.decompose(&p)?;

        let positive = DMatrix::from_diagonal(&eigenvalues.map(|lambda| lambda.max(T::zero())));
        let negative = DMatrix::from_diagonal(&eigenvalues.map(|lambda| lambda.min(T::zero())));
        let p_plus = &eigenvectors * positive * &inverse;
        let p_minus = &eigenvectors * negative * &inverse;
        Ok(p_plus * u + p_minus * v)
    }

    fn clone_box(&self) -> Box<dyn NumericalFlux<T>> {
        Box::new(self.clone())
    }
}
