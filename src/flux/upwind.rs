use crate::flux::{
    assert_arguments, check_scalar, normal_flux, normal_jacobian, FluxError, FluxFunction, NumericalFlux, Parameter,
};
use crate::Real;
use nalgebra::{convert, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Upwind flux for scalar conservation laws.
///
/// The upwind direction is determined from the normal derivative of the flux at the mean state
/// `(u + v) / 2`. If it is positive the inside state is used, otherwise the outside state.
#[derive(Clone)]
pub struct Upwind<T: Real> {
    flux: Arc<dyn FluxFunction<T>>,
}

impl<T: Real> Upwind<T> {
    pub fn new(flux: Arc<dyn FluxFunction<T>>) -> Result<Self, FluxError> {
        check_scalar("Upwind", flux.as_ref())?;
        Ok(Self { flux })
    }

    pub fn flux_function(&self) -> &dyn FluxFunction<T> {
        self.flux.as_ref()
    }
}

impl<T: Real> Debug for Upwind<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upwind")
            .field("domain_dim", &self.flux.domain_dim())
            .finish_non_exhaustive()
    }
}

impl<T: Real> NumericalFlux<T> for Upwind<T> {
    fn state_dim(&self) -> usize {
        1
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
        let n_dot_df = normal_jacobian(flux, &mean, n, param)[(0, 0)];
        if n_dot_df > T::zero() {
            Ok(normal_flux(flux, u, n, param))
        } else {
            Ok(normal_flux(flux, v, n, param))
        }
    }

    fn clone_box(&self) -> Box<dyn NumericalFlux<T>> {
        Box::new(self.clone())
    }
}
