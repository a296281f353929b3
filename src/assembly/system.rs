use crate::assembly::constraints::Constraints;
use crate::assembly::container::{ContainerRef, MatrixContainer, VectorContainer};
use crate::assembly::filter::{
    AllEntities, CouplingIntersections, EntityFilter, IntersectionFilter, NonPeriodicBoundaryIntersections,
};
use crate::assembly::functor::{
    assert_matrix_dims, assert_vector_dims, BoundaryMatrixFunctor, BoundaryOperatorFunctor, CouplingMatrixFunctor,
    CouplingOperatorFunctor, FaceVectorFunctor, MatrixConstraintsFunctor, VectorConstraintsFunctor, VolumeMatrixFunctor,
    VolumeVectorFunctor,
};
use crate::assembly::local::{
    LocalBoundaryMatrixOperator, LocalBoundaryOperator, LocalCouplingMatrixOperator, LocalCouplingOperator,
    LocalFaceVectorOperator, LocalVolumeMatrixOperator, LocalVolumeVectorOperator,
};
use crate::assembly::partition::IndexPartitioning;
use crate::assembly::walker::{GridWalker, WalkerState};
use crate::assembly::{AssemblyOptions, TraversalMode};
use crate::grid::GridView;
use crate::space::DiscreteFunctionSpace;
use crate::Real;
use log::warn;
use nalgebra::DVector;

/// Collects local operators together with their global containers and assembles all of them
/// in a single walk over the grid.
///
/// Matrix operators map test functions to rows and ansatz functions to columns. Operators that
/// act on a single space use the test space. Containers are borrowed until the assembler is
/// dropped. A container is either borrowed mutably by a single registration, or shared between
/// several registrations through a [`Mutex`](std::sync::Mutex) (see [`ContainerRef`]).
///
/// ```ignore
/// let mut assembler = SystemAssembler::from_space(&space, &grid);
/// assembler.add_volume_matrix(Codim0Integral::new(Elliptic::new(diffusion)), &mut matrix);
/// assembler.add_volume_vector(Codim0FunctionalIntegral::new(SourceProduct::new(f)), &mut rhs);
/// assembler.assemble()?;
/// ```
pub struct SystemAssembler<'a, T: Real, G: GridView<T>, TS, AS = TS> {
    test: &'a TS,
    ansatz: &'a AS,
    walker: GridWalker<'a, T, G>,
    options: AssemblyOptions,
}

impl<'a, T, G, S> SystemAssembler<'a, T, G, S, S>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
{
    /// An assembler using the same space for test and ansatz functions.
    pub fn from_space(space: &'a S, grid: &'a G) -> Self {
        Self::new(space, space, grid)
    }
}

impl<'a, T, G, TS, AS> SystemAssembler<'a, T, G, TS, AS>
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
{
    pub fn new(test: &'a TS, ansatz: &'a AS, grid: &'a G) -> Self {
        Self {
            test,
            ansatz,
            walker: GridWalker::new(grid),
            options: AssemblyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssemblyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: AssemblyOptions) {
        self.options = options;
    }

    pub fn grid(&self) -> &'a G {
        self.walker.grid()
    }

    pub fn test_space(&self) -> &'a TS {
        self.test
    }

    pub fn ansatz_space(&self) -> &'a AS {
        self.ansatz
    }

    pub fn state(&self) -> WalkerState {
        self.walker.state()
    }

    /// Number of currently registered operators and constraints.
    pub fn num_registrations(&self) -> usize {
        self.walker.num_functors()
    }

    /// Drops all registrations, releasing the borrowed containers.
    pub fn clear(&mut self) {
        self.walker.clear();
    }

    pub fn add_volume_matrix<Op, M>(&mut self, operator: Op, matrix: impl Into<ContainerRef<'a, M>>)
    where
        Op: LocalVolumeMatrixOperator<T> + 'a,
        M: ?Sized + MatrixContainer<T> + 'a,
    {
        self.add_volume_matrix_on(operator, matrix, AllEntities);
    }

    /// # Panics
    ///
    /// Panics if the matrix dimensions do not match the sizes of the test and ansatz spaces.
    pub fn add_volume_matrix_on<Op, M, F>(&mut self, operator: Op, matrix: impl Into<ContainerRef<'a, M>>, filter: F)
    where
        Op: LocalVolumeMatrixOperator<T> + 'a,
        M: ?Sized + MatrixContainer<T> + 'a,
        F: EntityFilter<T, G> + 'a,
    {
        let functor = VolumeMatrixFunctor::new(self.test, self.ansatz, operator, matrix, filter);
        self.walker.add_codim0(functor);
    }

    pub fn add_volume_vector<Op, V>(&mut self, operator: Op, vector: impl Into<ContainerRef<'a, V>>)
    where
        Op: LocalVolumeVectorOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
    {
        self.add_volume_vector_on(operator, vector, AllEntities);
    }

    /// # Panics
    ///
    /// Panics if the vector length does not match the size of the test space.
    pub fn add_volume_vector_on<Op, V, F>(&mut self, operator: Op, vector: impl Into<ContainerRef<'a, V>>, filter: F)
    where
        Op: LocalVolumeVectorOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
        F: EntityFilter<T, G> + 'a,
    {
        let functor = VolumeVectorFunctor::new(self.test, operator, vector, filter);
        self.walker.add_codim0(functor);
    }

    /// Registers a coupling operator on all intersections with an outside entity.
    pub fn add_coupling_matrix<Op, M>(&mut self, operator: Op, matrix: impl Into<ContainerRef<'a, M>>)
    where
        Op: LocalCouplingMatrixOperator<T> + 'a,
        M: ?Sized + MatrixContainer<T> + 'a,
    {
        self.add_coupling_matrix_on(operator, matrix, CouplingIntersections);
    }

    /// # Panics
    ///
    /// Panics if the matrix dimensions do not match the sizes of the test and ansatz spaces.
    pub fn add_coupling_matrix_on<Op, M, F>(&mut self, operator: Op, matrix: impl Into<ContainerRef<'a, M>>, filter: F)
    where
        Op: LocalCouplingMatrixOperator<T> + 'a,
        M: ?Sized + MatrixContainer<T> + 'a,
        F: IntersectionFilter<T, G> + 'a,
    {
        let functor = CouplingMatrixFunctor::new(self.test, self.ansatz, operator, matrix, filter);
        self.walker.add_codim1(functor);
    }

    /// Registers a boundary operator on all non-periodic boundary intersections.
    pub fn add_boundary_matrix<Op, M>(&mut self, operator: Op, matrix: impl Into<ContainerRef<'a, M>>)
    where
        Op: LocalBoundaryMatrixOperator<T> + 'a,
        M: ?Sized + MatrixContainer<T> + 'a,
    {
        self.add_boundary_matrix_on(operator, matrix, NonPeriodicBoundaryIntersections);
    }

    pub fn add_boundary_matrix_on<Op, M, F>(&mut self, operator: Op, matrix: impl Into<ContainerRef<'a, M>>, filter: F)
    where
        Op: LocalBoundaryMatrixOperator<T> + 'a,
        M: ?Sized + MatrixContainer<T> + 'a,
        F: IntersectionFilter<T, G> + 'a,
    {
        let functor = BoundaryMatrixFunctor::new(self.test, self.ansatz, operator, matrix, filter);
        self.walker.add_codim1(functor);
    }

    /// Registers a face functional on all non-periodic boundary intersections.
    pub fn add_face_vector<Op, V>(&mut self, operator: Op, vector: impl Into<ContainerRef<'a, V>>)
    where
        Op: LocalFaceVectorOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
    {
        self.add_face_vector_on(operator, vector, NonPeriodicBoundaryIntersections);
    }

    pub fn add_face_vector_on<Op, V, F>(&mut self, operator: Op, vector: impl Into<ContainerRef<'a, V>>, filter: F)
    where
        Op: LocalFaceVectorOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
        F: IntersectionFilter<T, G> + 'a,
    {
        let functor = FaceVectorFunctor::new(self.test, operator, vector, filter);
        self.walker.add_codim1(functor);
    }

    /// Registers the application of a coupling operator to `source`, accumulated into `range`.
    ///
    /// Both vectors hold coefficients with respect to the test space.
    pub fn add_coupling_operator<Op, V>(
        &mut self,
        operator: Op,
        source: &'a DVector<T>,
        range: impl Into<ContainerRef<'a, V>>,
    ) where
        Op: LocalCouplingOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
    {
        self.add_coupling_operator_on(operator, source, range, CouplingIntersections);
    }

    pub fn add_coupling_operator_on<Op, V, F>(
        &mut self,
        operator: Op,
        source: &'a DVector<T>,
        range: impl Into<ContainerRef<'a, V>>,
        filter: F,
    ) where
        Op: LocalCouplingOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
        F: IntersectionFilter<T, G> + 'a,
    {
        let functor = CouplingOperatorFunctor::new(self.test, operator, source, range, filter);
        self.walker.add_codim1(functor);
    }

    pub fn add_boundary_operator<Op, V>(
        &mut self,
        operator: Op,
        source: &'a DVector<T>,
        range: impl Into<ContainerRef<'a, V>>,
    ) where
        Op: LocalBoundaryOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
    {
        self.add_boundary_operator_on(operator, source, range, NonPeriodicBoundaryIntersections);
    }

    pub fn add_boundary_operator_on<Op, V, F>(
        &mut self,
        operator: Op,
        source: &'a DVector<T>,
        range: impl Into<ContainerRef<'a, V>>,
        filter: F,
    ) where
        Op: LocalBoundaryOperator<T> + 'a,
        V: ?Sized + VectorContainer<T> + 'a,
        F: IntersectionFilter<T, G> + 'a,
    {
        let functor = BoundaryOperatorFunctor::new(self.test, operator, source, range, filter);
        self.walker.add_codim1(functor);
    }

    /// Replaces the constrained rows of `matrix` by unit rows once everything else is assembled.
    ///
    /// # Panics
    ///
    /// Panics if `matrix` is not square with the size of the constrained space.
    pub fn add_matrix_constraints<C, M>(&mut self, constraints: &'a C, matrix: impl Into<ContainerRef<'a, M>>)
    where
        C: ?Sized + Constraints<T, G>,
        M: ?Sized + MatrixContainer<T> + 'a,
    {
        let mut matrix = matrix.into();
        let num_dofs = constraints.num_dofs();
        matrix.with(|m| assert_matrix_dims::<T>(m, num_dofs, num_dofs));
        self.walker
            .add_codim0(MatrixConstraintsFunctor::new(constraints, matrix));
    }

    /// Overwrites the constrained entries of `vector` once everything else is assembled.
    ///
    /// # Panics
    ///
    /// Panics if the length of `vector` differs from the size of the constrained space.
    pub fn add_vector_constraints<C, V>(&mut self, constraints: &'a C, vector: impl Into<ContainerRef<'a, V>>)
    where
        C: ?Sized + Constraints<T, G>,
        V: ?Sized + VectorContainer<T> + 'a,
    {
        let mut vector = vector.into();
        let num_dofs = constraints.num_dofs();
        vector.with(|v| assert_vector_dims::<T>(v, num_dofs));
        self.walker
            .add_codim0(VectorConstraintsFunctor::new(constraints, vector));
    }

    /// Walks the grid once with the configured [`AssemblyOptions`].
    pub fn assemble(&mut self) -> eyre::Result<()> {
        match self.options.mode {
            TraversalMode::Serial => self.assemble_serial(),
            TraversalMode::Partitioned { num_partitions } => self.assemble_partitioned(num_partitions),
        }
    }

    pub fn assemble_serial(&mut self) -> eyre::Result<()> {
        self.walker.walk(self.options.clear_stack)
    }

    /// Walks the grid with the entities split into at most `num_partitions` contiguous chunks.
    ///
    /// The assembled containers are identical to those of [`assemble_serial`](Self::assemble_serial).
    ///
    /// # Panics
    ///
    /// Panics if `num_partitions` is zero.
    pub fn assemble_partitioned(&mut self, num_partitions: usize) -> eyre::Result<()> {
        let num_entities = self.grid().num_entities();
        if num_partitions > num_entities {
            warn!("Requested {num_partitions} partitions for a grid with {num_entities} entities");
        }
        let partitioning = IndexPartitioning::contiguous(num_entities, num_partitions);
        self.walker
            .walk_partitioned(&partitioning, self.options.clear_stack)
    }
}
