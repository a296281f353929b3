//! Scalar functions of the physical coordinates, used as inducing functions of local operators.
use crate::Real;
use nalgebra::DVector;
use std::fmt;
use std::fmt::{Debug, Formatter};

/// A scalar function `f: R^d -> R` with a declared polynomial order.
///
/// The order determines how accurately local operators integrate products involving `f`.
/// Non-polynomial functions should report the order at which they are to be approximated.
pub trait Function<T: Real>: Send + Sync {
    fn order(&self) -> usize;

    fn evaluate(&self, x: &DVector<T>) -> T;
}

impl<'a, T: Real, F: Function<T> + ?Sized> Function<T> for &'a F {
    fn order(&self) -> usize {
        (**self).order()
    }

    fn evaluate(&self, x: &DVector<T>) -> T {
        (**self).evaluate(x)
    }
}

impl<T: Real, F: Function<T> + ?Sized> Function<T> for Box<F> {
    fn order(&self) -> usize {
        (**self).order()
    }

    fn evaluate(&self, x: &DVector<T>) -> T {
        (**self).evaluate(x)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConstantFunction<T> {
    value: T,
}

impl<T: Real> ConstantFunction<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn zero() -> Self {
        Self::new(T::zero())
    }

    pub fn one() -> Self {
        Self::new(T::one())
    }

    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Real> Function<T> for ConstantFunction<T> {
    fn order(&self) -> usize {
        0
    }

    fn evaluate(&self, _x: &DVector<T>) -> T {
        self.value
    }
}

/// A function given by a closure.
#[derive(Clone)]
pub struct LambdaFunction<F> {
    order: usize,
    function: F,
}

impl<F> LambdaFunction<F> {
    pub fn new(order: usize, function: F) -> Self {
        Self { order, function }
    }
}

impl<F> Debug for LambdaFunction<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaFunction")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl<T, F> Function<T> for LambdaFunction<F>
where
    T: Real,
    F: Fn(&DVector<T>) -> T + Send + Sync,
{
    fn order(&self) -> usize {
        self.order
    }

    fn evaluate(&self, x: &DVector<T>) -> T {
        (self.function)(x)
    }
}
