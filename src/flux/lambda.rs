use crate::flux::{FluxError, NumericalFlux, Parameter};
use crate::Real;
use nalgebra::DVector;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type LambdaFn<T> = dyn Fn(&DVector<T>, &DVector<T>, &DVector<T>, &Parameter<T>) -> DVector<T> + Send + Sync;

/// A numerical flux given by a closure `(u, v, n, param) -> g`.
#[derive(Clone)]
pub struct NumericalLambdaFlux<T: Real> {
    state_dim: usize,
    domain_dim: usize,
    lambda: Arc<LambdaFn<T>>,
}

impl<T: Real> NumericalLambdaFlux<T> {
    pub fn new<F>(state_dim: usize, domain_dim: usize, lambda: F) -> Self
    where
        F: Fn(&DVector<T>, &DVector<T>, &DVector<T>, &Parameter<T>) -> DVector<T> + Send + Sync + 'static,
    {
        Self {
            state_dim,
            domain_dim,
            lambda: Arc::new(lambda),
        }
    }
}

impl<T: Real> Debug for NumericalLambdaFlux<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericalLambdaFlux")
            .field("state_dim", &self.state_dim)
            .field("domain_dim", &self.domain_dim)
            .finish_non_exhaustive()
    }
}

impl<T: Real> NumericalFlux<T> for NumericalLambdaFlux<T> {
    fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn domain_dim(&self) -> usize {
        self.domain_dim
    }

    fn apply(
        &self,
        u: &DVector<T>,
        v: &DVector<T>,
        n: &DVector<T>,
        param: &Parameter<T>,
    ) -> Result<DVector<T>, FluxError> {
        assert_eq!(u.len(), self.state_dim, "Inside state has wrong dimension");
        assert_eq!(v.len(), self.state_dim, "Outside state has wrong dimension");
        assert_eq!(n.len(), self.domain_dim, "Normal has wrong dimension");
        let result = (self.lambda)(u, v, n, param);
        assert_eq!(result.len(), self.state_dim, "Flux closure returned state of wrong dimension");
        Ok(result)
    }

    fn clone_box(&self) -> Box<dyn NumericalFlux<T>> {
        Box::new(self.clone())
    }
}
