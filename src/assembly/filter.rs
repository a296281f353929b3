//! Predicates restricting functors to parts of the grid.
use crate::grid::{GridView, Intersection};
use crate::Real;

/// Decides whether a functor is applied on an entity.
pub trait EntityFilter<T: Real, G: GridView<T>>: Send + Sync {
    fn contains(&self, grid: &G, entity: usize) -> bool;
}

/// Decides whether a functor is applied on an intersection.
pub trait IntersectionFilter<T: Real, G: GridView<T>>: Send + Sync {
    fn contains(&self, grid: &G, intersection: &G::Intersection) -> bool;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AllEntities;

/// Entities with at least one boundary intersection.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BoundaryEntities;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AllIntersections;

/// Intersections in the interior of the domain.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct InnerIntersections;

/// Intersections on the domain boundary, including periodic ones.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BoundaryIntersections;

/// Boundary intersections without a periodic neighbor.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NonPeriodicBoundaryIntersections;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PeriodicIntersections;

/// Intersections with an outside entity, i.e. inner and periodic intersections.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CouplingIntersections;

impl<T: Real, G: GridView<T>> EntityFilter<T, G> for AllEntities {
    fn contains(&self, _grid: &G, _entity: usize) -> bool {
        true
    }
}

impl<T: Real, G: GridView<T>> EntityFilter<T, G> for BoundaryEntities {
    fn contains(&self, grid: &G, entity: usize) -> bool {
        grid.entity_on_boundary(entity)
    }
}

impl<T: Real, G: GridView<T>> IntersectionFilter<T, G> for AllIntersections {
    fn contains(&self, _grid: &G, _intersection: &G::Intersection) -> bool {
        true
    }
}

impl<T: Real, G: GridView<T>> IntersectionFilter<T, G> for InnerIntersections {
    fn contains(&self, _grid: &G, intersection: &G::Intersection) -> bool {
        !intersection.boundary() && intersection.neighbor()
    }
}

impl<T: Real, G: GridView<T>> IntersectionFilter<T, G> for BoundaryIntersections {
    fn contains(&self, _grid: &G, intersection: &G::Intersection) -> bool {
        intersection.boundary()
    }
}

impl<T: Real, G: GridView<T>> IntersectionFilter<T, G> for NonPeriodicBoundaryIntersections {
    fn contains(&self, _grid: &G, intersection: &G::Intersection) -> bool {
        intersection.boundary() && !intersection.neighbor()
    }
}

impl<T: Real, G: GridView<T>> IntersectionFilter<T, G> for PeriodicIntersections {
    fn contains(&self, _grid: &G, intersection: &G::Intersection) -> bool {
        intersection.periodic()
    }
}

impl<T: Real, G: GridView<T>> IntersectionFilter<T, G> for CouplingIntersections {
    fn contains(&self, _grid: &G, intersection: &G::Intersection) -> bool {
        intersection.neighbor()
    }
}

/// An entity filter given by a closure `(grid, entity) -> bool`.
pub struct EntityFilterFn<F>(pub F);

impl<T, G, F> EntityFilter<T, G> for EntityFilterFn<F>
where
    T: Real,
    G: GridView<T>,
    F: Fn(&G, usize) -> bool + Send + Sync,
{
    fn contains(&self, grid: &G, entity: usize) -> bool {
        (self.0)(grid, entity)
    }
}

/// An intersection filter given by a closure `(grid, intersection) -> bool`.
pub struct IntersectionFilterFn<F>(pub F);

impl<T, G, F> IntersectionFilter<T, G> for IntersectionFilterFn<F>
where
    T: Real,
    G: GridView<T>,
    F: Fn(&G, &G::Intersection) -> bool + Send + Sync,
{
    fn contains(&self, grid: &G, intersection: &G::Intersection) -> bool {
        (self.0)(grid, intersection)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct And<A, B>(pub A, pub B);

#[derive(Debug, Copy, Clone)]
pub struct Or<A, B>(pub A, pub B);

#[derive(Debug, Copy, Clone)]
pub struct Not<A>(pub A);

impl<T: Real, G: GridView<T>, A: EntityFilter<T, G>, B: EntityFilter<T, G>> EntityFilter<T, G> for And<A, B> {
    fn contains(&self, grid: &G, entity: usize) -> bool {
        self.0.contains(grid, entity) && self.1.contains(grid, entity)
    }
}

impl<T: Real, G: GridView<T>, A: EntityFilter<T, G>, B: EntityFilter<T, G>> EntityFilter<T, G> for Or<A, B> {
    fn contains(&self, grid: &G, entity: usize) -> bool {
        self.0.contains(grid, entity) || self.1.contains(grid, entity)
    }
}

impl<T: Real, G: GridView<T>, A: EntityFilter<T, G>> EntityFilter<T, G> for Not<A> {
    fn contains(&self, grid: &G, entity: usize) -> bool {
        !self.0.contains(grid, entity)
    }
}

impl<T: Real, G: GridView<T>, A, B> IntersectionFilter<T, G> for And<A, B>
where
    A: IntersectionFilter<T, G>,
    B: IntersectionFilter<T, G>,
{
    fn contains(&self, grid: &G, intersection: &G::Intersection) -> bool {
        self.0.contains(grid, intersection) && self.1.contains(grid, intersection)
    }
}

impl<T: Real, G: GridView<T>, A, B> IntersectionFilter<T, G> for Or<A, B>
where
    A: IntersectionFilter<T, G>,
    B: IntersectionFilter<T, G>,
{
    fn contains(&self, grid: &G, intersection: &G::Intersection) -> bool {
        self.0.contains(grid, intersection) || self.1.contains(grid, intersection)
    }
}

impl<T: Real, G: GridView<T>, A: IntersectionFilter<T, G>> IntersectionFilter<T, G> for Not<A> {
    fn contains(&self, grid: &G, intersection: &G::Intersection) -> bool {
        !self.0.contains(grid, intersection)
    }
}

/// Builder-style composition of filters.
///
/// ```
/// use fenris_gdt::assembly::filter::{BoundaryIntersections, FilterCombinators, PeriodicIntersections};
/// let non_periodic_boundary = BoundaryIntersections.and(PeriodicIntersections.not());
/// # let _ = non_periodic_boundary;
/// ```
pub trait FilterCombinators: Sized {
    fn and<B>(self, other: B) -> And<Self, B> {
        And(self, other)
    }

    fn or<B>(self, other: B) -> Or<Self, B> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }
}

macro_rules! impl_filter_combinators {
    ($($filter:ident$(<$($param:ident),+>)?),* $(,)?) => {
        $(impl$(<$($param),+>)? FilterCombinators for $filter$(<$($param),+>)? {})*
    };
}

impl_filter_combinators!(
    AllEntities,
    BoundaryEntities,
    AllIntersections,
    InnerIntersections,
    BoundaryIntersections,
    NonPeriodicBoundaryIntersections,
    PeriodicIntersections,
    CouplingIntersections,
    EntityFilterFn<F>,
    IntersectionFilterFn<F>,
    And<A, B>,
    Or<A, B>,
    Not<A>,
);
