//! Finite volume discretization of the advection term `div f(u)` on faces.
use crate::assembly::local::{LocalBoundaryOperator, LocalCouplingOperator};
use crate::flux::{NumericalFlux, Parameter};
use crate::grid::{Geometry, Intersection};
use crate::space::DiscreteFunctionSpace;
use crate::Real;
use eyre::{bail, WrapErr};
use nalgebra::{DVector, DVectorViewMut};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type BoundaryFn<T> = dyn Fn(&DVector<T>, &DVector<T>, &Parameter<T>) -> DVector<T> + Send + Sync;

fn check_space<T: Real, S: DiscreteFunctionSpace<T>>(space: &S, state_dim: usize) -> eyre::Result<()> {
    if !space.is_finite_volume() {
        bail!("finite volume advection requires a finite volume space, got a space of order {}", space.order());
    }
    if space.range_dim() != state_dim {
        bail!(
            "space with range dimension {} does not match flux with state dimension {state_dim}",
            space.range_dim()
        );
    }
    Ok(())
}

/// Numerical flux across an inner (or periodic) face of a finite volume discretization.
///
/// With `g = g(u_inside, u_outside, n)` evaluated at the face center, the inside cell receives
/// `g |F| / |K_inside|` and the outside cell `-g |F| / |K_outside|`.
pub struct AdvectionFvCouplingOperator<T: Real> {
    flux: Box<dyn NumericalFlux<T>>,
    parameter: Parameter<T>,
}

impl<T: Real> AdvectionFvCouplingOperator<T> {
    pub fn new<S>(flux: impl NumericalFlux<T> + 'static, space: &S) -> eyre::Result<Self>
    where
        S: DiscreteFunctionSpace<T>,
    {
        check_space(space, flux.state_dim())?;
        Ok(Self {
            flux: Box::new(flux),
            parameter: Parameter::default(),
        })
    }

    pub fn with_parameter(mut self, parameter: Parameter<T>) -> Self {
        self.parameter = parameter;
        self
    }

    pub fn flux(&self) -> &dyn NumericalFlux<T> {
        self.flux.as_ref()
    }
}

impl<T: Real> Debug for AdvectionFvCouplingOperator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvectionFvCouplingOperator")
            .field("state_dim", &self.flux.state_dim())
            .field("parameter", &self.parameter)
            .finish_non_exhaustive()
    }
}

impl<T: Real> LocalCouplingOperator<T> for AdvectionFvCouplingOperator<T> {
    fn apply(
        &self,
        source_inside: &DVector<T>,
        source_outside: &DVector<T>,
        intersection: &dyn Intersection<T>,
        inside_geometry: &dyn Geometry<T>,
        outside_geometry: &dyn Geometry<T>,
        mut range_inside: DVectorViewMut<T>,
        mut range_outside: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        let normal = intersection.center_unit_outer_normal();
        let g = self
            .flux
            .apply(source_inside, source_outside, &normal, &self.parameter)
            .wrap_err("numerical flux failed")?;
        let face_volume = intersection.geometry().volume();
        range_inside.axpy(face_volume / inside_geometry.volume(), &g, T::one());
        range_outside.axpy(-face_volume / outside_geometry.volume(), &g, T::one());
        Ok(())
    }
}

enum BoundaryTreatment<T: Real> {
    Flux(Arc<BoundaryFn<T>>),
    State {
        flux: Box<dyn NumericalFlux<T>>,
        state: Arc<BoundaryFn<T>>,
    },
}

/// Numerical flux across a boundary face of a finite volume discretization.
///
/// The flux is either given directly as a function of the inside state, or computed from a
/// numerical flux with a prescribed outside state. The inside cell receives `g |F| / |K|`.
pub struct AdvectionFvBoundaryOperator<T: Real> {
    treatment: BoundaryTreatment<T>,
    parameter: Parameter<T>,
}

impl<T: Real> AdvectionFvBoundaryOperator<T> {
    /// Boundary flux `g(u_inside, n, param)`.
    pub fn by_custom_flux<S, F>(space: &S, state_dim: usize, flux: F) -> eyre::Result<Self>
    where
        S: DiscreteFunctionSpace<T>,
        F: Fn(&DVector<T>, &DVector<T>, &Parameter<T>) -> DVector<T> + Send + Sync + 'static,
    {
        check_space(space, state_dim)?;
        Ok(Self {
            treatment: BoundaryTreatment::Flux(Arc::new(flux)),
            parameter: Parameter::default(),
        })
    }

    /// Numerical flux with the outside state `v = state(u_inside, x, param)` at the face center `x`.
    pub fn by_boundary_state<S, F>(flux: impl NumericalFlux<T> + 'static, space: &S, state: F) -> eyre::Result<Self>
    where
        S: DiscreteFunctionSpace<T>,
        F: Fn(&DVector<T>, &DVector<T>, &Parameter<T>) -> DVector<T> + Send + Sync + 'static,
    {
        check_space(space, flux.state_dim())?;
        Ok(Self {
            treatment: BoundaryTreatment::State {
                flux: Box::new(flux),
                state: Arc::new(state),
            },
            parameter: Parameter::default(),
        })
    }

    pub fn with_parameter(mut self, parameter: Parameter<T>) -> Self {
        self.parameter = parameter;
        self
    }
}

impl<T: Real> Debug for AdvectionFvBoundaryOperator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let treatment = match self.treatment {
            BoundaryTreatment::Flux(_) => "flux",
            BoundaryTreatment::State { .. } => "state",
        };
        f.debug_struct("AdvectionFvBoundaryOperator")
            .field("treatment", &treatment)
            .field("parameter", &self.parameter)
            .finish()
    }
}

impl<T: Real> LocalBoundaryOperator<T> for AdvectionFvBoundaryOperator<T> {
    fn apply(
        &self,
        source_inside: &DVector<T>,
        intersection: &dyn Intersection<T>,
        inside_geometry: &dyn Geometry<T>,
        mut range_inside: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        let normal = intersection.center_unit_outer_normal();
        let g = match &self.treatment {
            BoundaryTreatment::Flux(flux) => flux(source_inside, &normal, &self.parameter),
            BoundaryTreatment::State { flux, state } => {
                let outside = state(source_inside, &intersection.geometry().center(), &self.parameter);
                flux.apply(source_inside, &outside, &normal, &self.parameter)
                    .wrap_err("numerical flux failed on boundary")?
            }
        };
        assert_eq!(g.len(), range_inside.len(), "Boundary flux has wrong number of components");
        let face_volume = intersection.geometry().volume();
        range_inside.axpy(face_volume / inside_geometry.volume(), &g, T::one());
        Ok(())
    }
}
