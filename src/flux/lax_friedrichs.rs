use crate::flux::{assert_arguments, check_scalar, normal_flux, FluxError, FluxFunction, NumericalFlux, Parameter};
use crate::Real;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Local Lax–Friedrichs flux for scalar conservation laws.
///
/// Computes `1/2 (f(u) + f(v)) n + 1/2 (u - v) / lambda`, where `1 / lambda` is the largest
/// row-sum norm of the flux jacobian in the two states.
#[derive(Clone)]
pub struct LaxFriedrichs<T: Real> {
    flux: Arc<dyn FluxFunction<T>>,
}

impl<T: Real> LaxFriedrichs<T> {
    pub fn new(flux: Arc<dyn FluxFunction<T>>) -> Result<Self, FluxError> {
        check_scalar("Lax-Friedrichs", flux.as_ref())?;
        Ok(Self { flux })
    }
}

impl<T: Real> Debug for LaxFriedrichs<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaxFriedrichs")
            .field("domain_dim", &self.flux.domain_dim())
            .finish_non_exhaustive()
    }
}

/// Row-sum norm of the `m x (m d)` matrix formed by the jacobians of all flux columns.
fn jacobian_infinity_norm<T: Real>(jacobians: &[DMatrix<T>]) -> T {
    let m = jacobians.first().map_or(0, |j| j.nrows());
    (0..m)
        .map(|i| {
            jacobians
                .iter()
                .flat_map(|j| j.row(i).iter().map(|x| x.abs()).collect::<Vec<_>>())
                .fold(T::zero(), |acc, x| acc + x)
        })
        .fold(T::zero(), |acc, x| acc.max(x))
}

impl<T: Real> NumericalFlux<T> for LaxFriedrichs<T> {
    fn state_dim(&self) -> usize {
        1
    }

    fn domain_dim(&self) -> usize {
        self.flux.domain_dim()
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn apply(
        &self,
        u: &DVector<T>,
        v: &DVector<T>,
        n: &DVector<T>,
        param: &Parameter<T>,
    ) -> Result<DVector<T>, FluxError> {
        let flux = self.flux.as_ref();
        assert_arguments(flux, u, v, n);
        let max_derivative = jacobian_infinity_norm(&flux.jacobian(u, param))
            .max(jacobian_infinity_norm(&flux.jacobian(v, param)));
        if max_derivative == 0.0 {
            return Err(FluxError::DegenerateDissipation);
        }

        let central = (normal_flux(flux, u, n, param) + normal_flux(flux, v, n, param)) * 0.5;
        let dissipation = (u - v) * (max_derivative * 0.5);
        Ok(central + dissipation)
    }

    fn clone_box(&self) -> Box<dyn NumericalFlux<T>> {
        Box::new(self.clone())
    }
}
