//! Global matrix and vector containers written to by the assembly.
use crate::Real;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CsrMatrix, SparseEntryMut};
use std::sync::{Mutex, PoisonError};

/// A global matrix the assembly accumulates into.
pub trait MatrixContainer<T: Real>: Send + Sync {
    fn nrows(&self) -> usize;

    fn ncols(&self) -> usize;

    /// `self[(i, j)] += value`.
    fn add_to_entry(&mut self, i: usize, j: usize, value: T);

    /// `self[(i, j)] = value`.
    fn set_entry(&mut self, i: usize, j: usize, value: T);

    /// Sets all stored entries of row `i` to zero.
    fn clear_row(&mut self, i: usize);
}

/// A global vector the assembly accumulates into.
pub trait VectorContainer<T: Real>: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_to_entry(&mut self, i: usize, value: T);

    fn set_entry(&mut self, i: usize, value: T);
}

impl<T: Real> MatrixContainer<T> for DMatrix<T> {
    fn nrows(&self) -> usize {
        self.shape().0
    }

    fn ncols(&self) -> usize {
        self.shape().1
    }

    fn add_to_entry(&mut self, i: usize, j: usize, value: T) {
        self[(i, j)] += value;
    }

    fn set_entry(&mut self, i: usize, j: usize, value: T) {
        self[(i, j)] = value;
    }

    fn clear_row(&mut self, i: usize) {
        self.row_mut(i).fill(T::zero());
    }
}

/// Entries outside the sparsity pattern can only receive zeros.
///
/// # Panics
///
/// Adding or setting a non-zero value at an entry that is not part of the sparsity pattern panics.
impl<T: Real> MatrixContainer<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        CsrMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        CsrMatrix::ncols(self)
    }

    fn add_to_entry(&mut self, i: usize, j: usize, value: T) {
        match self.get_entry_mut(i, j) {
            Some(SparseEntryMut::NonZero(entry)) => *entry += value,
            Some(SparseEntryMut::Zero) if value == T::zero() => {}
            Some(SparseEntryMut::Zero) => panic!("Entry ({i}, {j}) is not part of the sparsity pattern"),
            None => panic!("Entry ({i}, {j}) is out of bounds"),
        }
    }

    fn set_entry(&mut self, i: usize, j: usize, value: T) {
        match self.get_entry_mut(i, j) {
            Some(SparseEntryMut::NonZero(entry)) => *entry = value,
            Some(SparseEntryMut::Zero) if value == T::zero() => {}
            Some(SparseEntryMut::Zero) => panic!("Entry ({i}, {j}) is not part of the sparsity pattern"),
            None => panic!("Entry ({i}, {j}) is out of bounds"),
        }
    }

    fn clear_row(&mut self, i: usize) {
        self.row_mut(i).values_mut().fill(T::zero());
    }
}

impl<T: Real> VectorContainer<T> for DVector<T> {
    fn len(&self) -> usize {
        self.nrows()
    }

    fn add_to_entry(&mut self, i: usize, value: T) {
        self[i] += value;
    }

    fn set_entry(&mut self, i: usize, value: T) {
        self[i] = value;
    }
}

/// Write access of a registered operator to its global container.
///
/// A container that receives contributions from several operators is registered through a
/// shared reference to a [`Mutex`]. The lock is only taken while contributions are scattered,
/// which always happens on a single thread.
///
/// ```
/// use fenris_gdt::assembly::container::ContainerRef;
/// use nalgebra::DMatrix;
/// use std::sync::Mutex;
///
/// let matrix = Mutex::new(DMatrix::<f64>::zeros(2, 2));
/// let mut first = ContainerRef::from(&matrix);
/// let mut second = ContainerRef::from(&matrix);
/// first.with(|m| m[(0, 0)] += 1.0);
/// second.with(|m| m[(0, 0)] += 1.0);
/// assert_eq!(matrix.into_inner().unwrap()[(0, 0)], 2.0);
/// ```
pub enum ContainerRef<'a, C: ?Sized> {
    Exclusive(&'a mut C),
    Shared(&'a Mutex<C>),
}

impl<'a, C: ?Sized> ContainerRef<'a, C> {
    pub fn with<R>(&mut self, f: impl FnOnce(&mut C) -> R) -> R {
        match self {
            Self::Exclusive(container) => f(&mut **container),
            Self::Shared(container) => {
                let mut guard = container.lock().unwrap_or_else(PoisonError::into_inner);
                f(&mut *guard)
            }
        }
    }
}

impl<'a, C: ?Sized> From<&'a mut C> for ContainerRef<'a, C> {
    fn from(container: &'a mut C) -> Self {
        Self::Exclusive(container)
    }
}

impl<'a, C: ?Sized> From<&'a Mutex<C>> for ContainerRef<'a, C> {
    fn from(container: &'a Mutex<C>) -> Self {
        Self::Shared(container)
    }
}
