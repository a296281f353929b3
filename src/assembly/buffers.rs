use crate::space::BaseFunctionSet;
use crate::Real;
use nalgebra::{DMatrix, DVector, Scalar};

/// Values and gradients of all functions of a base function set at a single point.
#[derive(Debug, Clone)]
pub struct BasisFunctionBuffer<T: Scalar> {
    values: DMatrix<T>,
    reference_gradients: DMatrix<T>,
    gradients: DMatrix<T>,
}

impl<T: Real> Default for BasisFunctionBuffer<T> {
    fn default() -> Self {
        Self {
            values: DMatrix::zeros(0, 0),
            reference_gradients: DMatrix::zeros(0, 0),
            gradients: DMatrix::zeros(0, 0),
        }
    }
}

impl<T: Real> BasisFunctionBuffer<T> {
    /// Evaluates the basis functions at the reference point `local`.
    pub fn populate_values(&mut self, basis: &(impl ?Sized + BaseFunctionSet<T>), local: &DVector<T>) {
        basis.populate_values(local, &mut self.values);
    }

    /// Evaluates the physical gradients of a scalar basis at the reference point `local`.
    ///
    /// Reference gradients are transformed with the jacobian inverse transposed of the entity
    /// geometry, so that column `i` of [`Self::gradients`] is the gradient of function `i`.
    pub fn populate_gradients(&mut self, basis: &(impl ?Sized + BaseFunctionSet<T>), local: &DVector<T>) {
        basis.populate_reference_gradients(local, &mut self.reference_gradients);
        let jit = basis.geometry().jacobian_inverse_transposed(local);
        self.gradients
            .resize_mut(jit.nrows(), self.reference_gradients.ncols(), T::zero());
        self.gradients
            .gemm(T::one(), &jit, &self.reference_gradients, T::zero());
    }

    /// Basis values, one column per function.
    pub fn values(&self) -> &DMatrix<T> {
        &self.values
    }

    pub fn reference_gradients(&self) -> &DMatrix<T> {
        &self.reference_gradients
    }

    /// Physical gradients, one column per function.
    pub fn gradients(&self) -> &DMatrix<T> {
        &self.gradients
    }
}

/// Basis buffers for the test and ansatz sets on both sides of an intersection.
#[derive(Debug, Clone)]
pub struct BasisBuffers<T: Scalar> {
    pub test: BasisFunctionBuffer<T>,
    pub ansatz: BasisFunctionBuffer<T>,
    pub test_outside: BasisFunctionBuffer<T>,
    pub ansatz_outside: BasisFunctionBuffer<T>,
}

impl<T: Real> Default for BasisBuffers<T> {
    fn default() -> Self {
        Self {
            test: Default::default(),
            ansatz: Default::default(),
            test_outside: Default::default(),
            ansatz_outside: Default::default(),
        }
    }
}

/// Number and minimal shape of the temporary objects a local operator needs.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ScratchRequirements {
    pub matrices: usize,
    pub vectors: usize,
    pub rows: usize,
    pub cols: usize,
}

impl ScratchRequirements {
    /// The smallest requirements satisfying both `self` and `other`.
    pub fn max(self, other: Self) -> Self {
        Self {
            matrices: self.matrices.max(other.matrices),
            vectors: self.vectors.max(other.vectors),
            rows: self.rows.max(other.rows),
            cols: self.cols.max(other.cols),
        }
    }
}

/// Temporary storage handed to local operators.
///
/// A pool is owned by a single worker and reused for every entity and intersection it visits.
/// Matrices are at least `rows x cols` and vectors at least `rows` long, as given by the
/// [`ScratchRequirements`] the pool was last prepared with.
#[derive(Debug, Clone)]
pub struct ScratchPool<T: Scalar> {
    matrices: Vec<DMatrix<T>>,
    vectors: Vec<DVector<T>>,
    basis: BasisBuffers<T>,
}

impl<T: Real> Default for ScratchPool<T> {
    fn default() -> Self {
        Self {
            matrices: Vec::new(),
            vectors: Vec::new(),
            basis: BasisBuffers::default(),
        }
    }
}

impl<T: Real> ScratchPool<T> {
    pub fn new(requirements: ScratchRequirements) -> Self {
        let mut pool = Self::default();
        pool.ensure(requirements);
        pool
    }

    /// Grows the pool so that it satisfies the given requirements.
    ///
    /// Existing temporaries are never shrunk.
    pub fn ensure(&mut self, requirements: ScratchRequirements) {
        if self.matrices.len() < requirements.matrices {
            self.matrices.resize(requirements.matrices, DMatrix::zeros(0, 0));
        }
        if self.vectors.len() < requirements.vectors {
            self.vectors.resize(requirements.vectors, DVector::zeros(0));
        }
        for matrix in &mut self.matrices {
            let (rows, cols) = matrix.shape();
            if rows < requirements.rows || cols < requirements.cols {
                matrix.resize_mut(rows.max(requirements.rows), cols.max(requirements.cols), T::zero());
            }
        }
        for vector in &mut self.vectors {
            if vector.len() < requirements.rows {
                vector.resize_vertically_mut(requirements.rows, T::zero());
            }
        }
    }

    pub fn num_tmp_matrices(&self) -> usize {
        self.matrices.len()
    }

    pub fn num_tmp_vectors(&self) -> usize {
        self.vectors.len()
    }

    pub fn split_mut(&mut self) -> (&mut [DMatrix<T>], &mut [DVector<T>], &mut BasisBuffers<T>) {
        (&mut self.matrices, &mut self.vectors, &mut self.basis)
    }

    pub fn basis_mut(&mut self) -> &mut BasisBuffers<T> {
        &mut self.basis
    }
}
