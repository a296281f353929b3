use crate::flux::{
    assert_arguments, check_scalar, normal_flux, normal_jacobian, FluxError, FluxFunction, NumericalFlux, Parameter,
};
use crate::quadrature::{unit_interval_rule, QuadratureRule};
use crate::Real;
use nalgebra::DVector;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Engquist–Osher flux for scalar conservation laws.
///
/// Computes `f(0) n + int_0^u max(n f'(s), 0) ds + int_0^v min(n f'(s), 0) ds`, where the
/// integrals are signed (they change sign for negative states) and are evaluated with a Gauss
/// rule that is exact for the derivative of a polynomial flux of the declared order.
#[derive(Clone)]
pub struct EngquistOsher<T: Real> {
    flux: Arc<dyn FluxFunction<T>>,
    rule: QuadratureRule<T>,
}

impl<T: Real> EngquistOsher<T> {
    pub fn new(flux: Arc<dyn FluxFunction<T>>) -> Result<Self, FluxError> {
        check_scalar("Engquist-Osher", flux.as_ref())?;
        let rule = unit_interval_rule(flux.order())?;
        Ok(Self { flux, rule })
    }

    /// Integral of `select(n f'(s))` over `s` from zero to `state`.
    fn integrate_derivative(&self, state: T, n: &DVector<T>, param: &Parameter<T>, select: impl Fn(T) -> T) -> T {
        let flux = self.flux.as_ref();
        let sum = self.rule.iter().fold(T::zero(), |acc, (w, x)| {
            let s = DVector::from_element(1, state * x[0]);
            acc + w * select(normal_jacobian(flux, &s, n, param)[(0, 0)])
        });
        state * sum
    }
}

impl<T: Real> Debug for EngquistOsher<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngquistOsher")
            .field("domain_dim", &self.flux.domain_dim())
            .field("quadrature_points", &self.rule.len())
            .finish_non_exhaustive()
    }
}

impl<T: Real> NumericalFlux<T> for EngquistOsher<T> {
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
        let zero = DVector::zeros(1);
        let mut result = normal_flux(flux, &zero, n, param);
        result[0] += self.integrate_derivative(u[0], n, param, |df| df.max(T::zero()));
        result[0] += self.integrate_derivative(v[0], n, param, |df| df.min(T::zero()));
        Ok(result)
    }

    fn clone_box(&self) -> Box<dyn NumericalFlux<T>> {
        Box::new(self.clone())
    }
}
