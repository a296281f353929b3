//! Grid views, entity geometries and intersections.
//!
//! Entities (codim-0 cells) are identified by a dense index `0 .. num_entities()`. Each entity
//! knows its geometry, its corner vertices and its intersections (codim-1 faces) with
//! neighboring entities or with the domain boundary.
use crate::quadrature::ReferenceShape;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use std::fmt::Debug;

mod structured;

pub use structured::{StructuredGrid, StructuredIntersection};

/// The mapping from a reference element into a coordinate space.
pub trait Geometry<T: Real>: Debug + Send + Sync {
    fn reference_shape(&self) -> ReferenceShape;

    /// Dimension of the coordinate space the reference element is mapped into.
    fn coord_dim(&self) -> usize;

    fn global(&self, local: &DVector<T>) -> DVector<T>;

    /// The jacobian of the mapping, with dimensions `coord_dim x mydim`.
    fn jacobian(&self, local: &DVector<T>) -> DMatrix<T>;

    /// The (pseudo-)inverse transposed jacobian, with dimensions `coord_dim x mydim`.
    ///
    /// Reference gradients are mapped to physical gradients by left multiplication.
    fn jacobian_inverse_transposed(&self, local: &DVector<T>) -> DMatrix<T>;

    /// The factor `sqrt(det(J^T J))` relating reference and physical measures.
    fn integration_element(&self, local: &DVector<T>) -> T;

    fn volume(&self) -> T;

    fn mydim(&self) -> usize {
        self.reference_shape().dim()
    }

    fn center(&self) -> DVector<T> {
        self.global(&self.reference_shape().center())
    }

    fn corner(&self, corner: usize) -> DVector<T> {
        self.global(&self.reference_shape().corner(corner))
    }
}

/// An affine geometry `x = origin + J * xi`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineGeometry<T: Real> {
    shape: ReferenceShape,
    origin: DVector<T>,
    jacobian: DMatrix<T>,
    jacobian_inverse_transposed: DMatrix<T>,
    integration_element: T,
}

impl<T: Real> AffineGeometry<T> {
    /// Creates an affine geometry from the image of the reference origin and the jacobian.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions are inconsistent or the jacobian does not have full column rank.
    pub fn new(shape: ReferenceShape, origin: DVector<T>, jacobian: DMatrix<T>) -> Self {
        assert_eq!(jacobian.ncols(), shape.dim(), "Jacobian must have one column per reference axis");
        assert_eq!(jacobian.nrows(), origin.len(), "Jacobian and origin must have the same coordinate dimension");

        let (integration_element, jacobian_inverse_transposed) = if shape.dim() == 0 {
            (T::one(), DMatrix::zeros(origin.len(), 0))
        } else {
            let gram = jacobian.tr_mul(&jacobian);
            let gram_inverse = gram
                .clone()
                .try_inverse()
                .expect("Affine geometry must not be degenerate");
            (gram.determinant().sqrt(), &jacobian * gram_inverse)
        };

        Self {
            shape,
            origin,
            jacobian,
            jacobian_inverse_transposed,
            integration_element,
        }
    }

    pub fn origin(&self) -> &DVector<T> {
        &self.origin
    }

    pub fn constant_jacobian(&self) -> &DMatrix<T> {
        &self.jacobian
    }
}

impl<T: Real> Geometry<T> for AffineGeometry<T> {
    fn reference_shape(&self) -> ReferenceShape {
        self.shape
    }

    fn coord_dim(&self) -> usize {
        self.origin.len()
    }

    fn global(&self, local: &DVector<T>) -> DVector<T> {
        assert_eq!(local.len(), self.shape.dim(), "Local coordinate has wrong dimension");
        &self.origin + &self.jacobian * local
    }

    fn jacobian(&self, _local: &DVector<T>) -> DMatrix<T> {
        self.jacobian.clone()
    }

    fn jacobian_inverse_transposed(&self, _local: &DVector<T>) -> DMatrix<T> {
        self.jacobian_inverse_transposed.clone()
    }

    fn integration_element(&self, _local: &DVector<T>) -> T {
        self.integration_element
    }

    fn volume(&self) -> T {
        // All reference cubes have unit volume
        self.integration_element
    }
}

/// A face shared by two entities, or between an entity and the domain boundary.
///
/// Periodic intersections are boundary intersections that nevertheless have an outside entity.
pub trait Intersection<T: Real> {
    fn inside(&self) -> usize;

    fn outside(&self) -> Option<usize>;

    /// Whether the intersection lies on the boundary of the domain.
    fn boundary(&self) -> bool;

    /// Local face number of the intersection in the inside entity.
    fn index_in_inside(&self) -> usize;

    /// Local face number of the intersection in the outside entity, if there is one.
    fn index_in_outside(&self) -> Option<usize>;

    /// The geometry of the face in physical space.
    fn geometry(&self) -> &dyn Geometry<T>;

    /// The embedding of the face reference element into the reference element of the inside entity.
    fn geometry_in_inside(&self) -> &dyn Geometry<T>;

    /// The embedding of the face reference element into the reference element of the outside entity.
    fn geometry_in_outside(&self) -> Option<&dyn Geometry<T>>;

    fn unit_outer_normal(&self, local: &DVector<T>) -> DVector<T>;

    fn center_unit_outer_normal(&self) -> DVector<T> {
        self.unit_outer_normal(&self.geometry().reference_shape().center())
    }

    fn neighbor(&self) -> bool {
        self.outside().is_some()
    }

    fn periodic(&self) -> bool {
        self.boundary() && self.neighbor()
    }
}

/// Read-only view of a grid partition.
pub trait GridView<T: Real>: Sync {
    type Intersection: Intersection<T> + Sync;

    fn dim(&self) -> usize;

    fn num_entities(&self) -> usize;

    fn entity_geometry(&self, entity: usize) -> &dyn Geometry<T>;

    /// All intersections of the given entity, including boundary intersections.
    fn intersections(&self, entity: usize) -> &[Self::Intersection];

    fn num_vertices(&self) -> usize;

    /// Global vertex indices of the corners of the entity.
    ///
    /// The vertices are ordered like the corners of the reference element, see
    /// [`ReferenceShape::corner`].
    fn entity_vertices(&self, entity: usize) -> &[usize];

    fn entity_on_boundary(&self, entity: usize) -> bool {
        self.intersections(entity).iter().any(|i| i.boundary())
    }
}

/// Decides from which side an intersection is visited when walking over all entities.
///
/// Every intersection with an outside entity is seen twice, once from each side. It is
/// visited from its inside entity if it has no outside entity, if the inside index is the
/// smaller one, or, for an entity that is its own (periodic) neighbor, if the local face
/// number in the inside is the smaller one.
pub fn visit_from_inside<T: Real, I: Intersection<T> + ?Sized>(intersection: &I) -> bool {
    match intersection.outside() {
        None => true,
        Some(outside) => {
            let inside = intersection.inside();
            inside < outside
                || (inside == outside
                    && intersection
                        .index_in_outside()
                        .map_or(true, |index_in_outside| intersection.index_in_inside() < index_in_outside))
        }
    }
}
