//! Functors binding local operators to spaces, global containers and filters.
//!
//! The grid walker drives each functor in two phases per entity or intersection:
//! [`compute_local`](Codim0Functor::compute_local) fills a [`LocalContribution`] with dense
//! blocks and their global indices without touching any global state, and
//! [`scatter`](Codim0Functor::scatter) adds a previously computed contribution to the global
//! container. Separating the two lets a partitioned walk compute in parallel and scatter in
//! serial order.
use crate::assembly::buffers::{ScratchPool, ScratchRequirements};
use crate::assembly::constraints::Constraints;
use crate::assembly::container::{ContainerRef, MatrixContainer, VectorContainer};
use crate::assembly::filter::{EntityFilter, IntersectionFilter};
use crate::assembly::local::{
    scratch_requirements, CouplingMatrixBlocks, LocalBoundaryMatrixOperator, LocalBoundaryOperator,
    LocalCouplingMatrixOperator, LocalCouplingOperator, LocalFaceVectorOperator, LocalVolumeMatrixOperator,
    LocalVolumeVectorOperator,
};
use crate::grid::{GridView, Intersection};
use crate::space::{BaseFunctionSet, DiscreteFunctionSpace, Mapper};
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut, Scalar};
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// A dense local matrix together with the global indices of its rows and columns.
#[derive(Debug, Clone)]
pub struct LocalMatrixBlock<T: Scalar> {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub values: DMatrix<T>,
}

impl<T: Real> Default for LocalMatrixBlock<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            values: DMatrix::zeros(0, 0),
        }
    }
}

impl<T: Real> LocalMatrixBlock<T> {
    pub fn values_mut(&mut self) -> DMatrixViewMut<T> {
        let shape = self.values.shape();
        self.values.view_mut((0, 0), shape)
    }
}

/// A dense local vector together with the global indices of its entries.
#[derive(Debug, Clone)]
pub struct LocalVectorBlock<T: Scalar> {
    pub rows: Vec<usize>,
    pub values: DVector<T>,
}

impl<T: Real> Default for LocalVectorBlock<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            values: DVector::zeros(0),
        }
    }
}

impl<T: Real> LocalVectorBlock<T> {
    pub fn values_mut(&mut self) -> DVectorViewMut<T> {
        let len = self.values.len();
        self.values.rows_mut(0, len)
    }
}

/// Everything a functor computes on a single entity or intersection.
///
/// Block allocations are kept when the contribution is cleared, so a contribution reused across
/// entities only allocates when a larger block than before is needed.
#[derive(Debug, Clone)]
pub struct LocalContribution<T: Scalar> {
    matrix_blocks: Vec<LocalMatrixBlock<T>>,
    num_matrix_blocks: usize,
    vector_blocks: Vec<LocalVectorBlock<T>>,
    num_vector_blocks: usize,
    constraints: Vec<(usize, T)>,
}

impl<T: Real> Default for LocalContribution<T> {
    fn default() -> Self {
        Self {
            matrix_blocks: Vec::new(),
            num_matrix_blocks: 0,
            vector_blocks: Vec::new(),
            num_vector_blocks: 0,
            constraints: Vec::new(),
        }
    }
}

impl<T: Real> LocalContribution<T> {
    pub fn clear(&mut self) {
        self.num_matrix_blocks = 0;
        self.num_vector_blocks = 0;
        self.constraints.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.num_matrix_blocks == 0 && self.num_vector_blocks == 0 && self.constraints.is_empty()
    }

    /// Appends `N` zeroed matrix blocks with the given shapes and empty index lists.
    pub fn push_matrix_blocks<const N: usize>(&mut self, shapes: [(usize, usize); N]) -> &mut [LocalMatrixBlock<T>; N] {
        let start = self.num_matrix_blocks;
        let end = start + N;
        if self.matrix_blocks.len() < end {
            self.matrix_blocks.resize_with(end, Default::default);
        }
        for (block, (rows, cols)) in self.matrix_blocks[start..end].iter_mut().zip(shapes) {
            block.rows.clear();
            block.cols.clear();
            block.values.resize_mut(rows, cols, T::zero());
            block.values.fill(T::zero());
        }
        self.num_matrix_blocks = end;
        <&mut [_; N]>::try_from(&mut self.matrix_blocks[start..end]).expect("Slice has exactly N blocks")
    }

    /// Appends `N` zeroed vector blocks with the given lengths and empty index lists.
    pub fn push_vector_blocks<const N: usize>(&mut self, lengths: [usize; N]) -> &mut [LocalVectorBlock<T>; N] {
        let start = self.num_vector_blocks;
        let end = start + N;
        if self.vector_blocks.len() < end {
            self.vector_blocks.resize_with(end, Default::default);
        }
        for (block, len) in self.vector_blocks[start..end].iter_mut().zip(lengths) {
            block.rows.clear();
            block.values.resize_vertically_mut(len, T::zero());
            block.values.fill(T::zero());
        }
        self.num_vector_blocks = end;
        <&mut [_; N]>::try_from(&mut self.vector_blocks[start..end]).expect("Slice has exactly N blocks")
    }

    pub fn matrix_blocks(&self) -> &[LocalMatrixBlock<T>] {
        &self.matrix_blocks[..self.num_matrix_blocks]
    }

    pub fn vector_blocks(&self) -> &[LocalVectorBlock<T>] {
        &self.vector_blocks[..self.num_vector_blocks]
    }

    /// Pairs of global index and prescribed value.
    pub fn constraints(&self) -> &[(usize, T)] {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut Vec<(usize, T)> {
        &mut self.constraints
    }
}

/// A functor applied on entities.
pub trait Codim0Functor<T: Real, G: GridView<T>>: Send + Sync {
    /// Called once before the walk.
    fn prepare(&mut self) -> eyre::Result<()> {
        Ok(())
    }

    fn scratch_requirements(&self) -> ScratchRequirements;

    fn applies_to(&self, grid: &G, entity: usize) -> bool;

    fn compute_local(
        &self,
        grid: &G,
        entity: usize,
        pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()>;

    fn scatter(&mut self, local: &LocalContribution<T>);

    /// Called once after the walk.
    fn finalize(&mut self) -> eyre::Result<()> {
        Ok(())
    }
}

/// A functor applied on intersections.
pub trait Codim1Functor<T: Real, G: GridView<T>>: Send + Sync {
    fn prepare(&mut self) -> eyre::Result<()> {
        Ok(())
    }

    fn scratch_requirements(&self) -> ScratchRequirements;

    fn applies_to(&self, grid: &G, intersection: &G::Intersection) -> bool;

    fn compute_local(
        &self,
        grid: &G,
        intersection: &G::Intersection,
        pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()>;

    fn scatter(&mut self, local: &LocalContribution<T>);

    fn finalize(&mut self) -> eyre::Result<()> {
        Ok(())
    }
}

fn scatter_matrix_blocks<T: Real>(matrix: &mut (impl ?Sized + MatrixContainer<T>), local: &LocalContribution<T>) {
    for block in local.matrix_blocks() {
        for (i, &row) in block.rows.iter().enumerate() {
            for (j, &col) in block.cols.iter().enumerate() {
                matrix.add_to_entry(row, col, block.values[(i, j)]);
            }
        }
    }
}

fn scatter_vector_blocks<T: Real>(vector: &mut (impl ?Sized + VectorContainer<T>), local: &LocalContribution<T>) {
    for block in local.vector_blocks() {
        for (&row, &value) in block.rows.iter().zip(block.values.iter()) {
            vector.add_to_entry(row, value);
        }
    }
}

pub(crate) fn assert_matrix_dims<T: Real>(matrix: &(impl ?Sized + MatrixContainer<T>), rows: usize, cols: usize) {
    assert_eq!(
        (matrix.nrows(), matrix.ncols()),
        (rows, cols),
        "Matrix dimensions must match the sizes of the test and ansatz spaces"
    );
}

pub(crate) fn assert_vector_dims<T: Real>(vector: &(impl ?Sized + VectorContainer<T>), len: usize) {
    assert_eq!(vector.len(), len, "Vector length must match the size of the space");
}

fn outside_entity<T: Real>(intersection: &impl Intersection<T>) -> eyre::Result<usize> {
    intersection.outside().ok_or_else(|| {
        eyre!(
            "face {} of entity {} has no outside entity",
            intersection.index_in_inside(),
            intersection.inside()
        )
    })
}

/// Assembles a [`LocalVolumeMatrixOperator`] into a global matrix.
pub struct VolumeMatrixFunctor<'a, T, TS, AS, Op, M: ?Sized, F> {
    test: &'a TS,
    ansatz: &'a AS,
    operator: Op,
    matrix: ContainerRef<'a, M>,
    filter: F,
    marker: PhantomData<T>,
}

impl<'a, T, TS, AS, Op, M, F> VolumeMatrixFunctor<'a, T, TS, AS, Op, M, F>
where
    T: Real,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
    M: ?Sized + MatrixContainer<T>,
{
    /// # Panics
    ///
    /// Panics if the matrix dimensions do not match the sizes of the spaces.
    pub fn new(test: &'a TS, ansatz: &'a AS, operator: Op, matrix: impl Into<ContainerRef<'a, M>>, filter: F) -> Self {
        let mut matrix = matrix.into();
        matrix.with(|m| assert_matrix_dims::<T>(m, test.mapper().size(), ansatz.mapper().size()));
        Self {
            test,
            ansatz,
            operator,
            matrix,
            filter,
            marker: PhantomData,
        }
    }
}

impl<'a, T, G, TS, AS, Op, M, F> Codim0Functor<T, G> for VolumeMatrixFunctor<'a, T, TS, AS, Op, M, F>
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
    Op: LocalVolumeMatrixOperator<T>,
    M: ?Sized + MatrixContainer<T>,
    F: EntityFilter<T, G>,
{
    fn scratch_requirements(&self) -> ScratchRequirements {
        scratch_requirements(
            self.operator.num_tmp_objects_required(),
            self.test.mapper().max_local_size(),
            self.ansatz.mapper().max_local_size(),
        )
    }

    fn applies_to(&self, grid: &G, entity: usize) -> bool {
        self.filter.contains(grid, entity)
    }

    fn compute_local(
        &self,
        _grid: &G,
        entity: usize,
        pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        let test = self.test.base_function_set(entity);
        let ansatz = self.ansatz.base_function_set(entity);
        let [block] = local.push_matrix_blocks([(test.size(), ansatz.size())]);
        self.test
            .mapper()
            .populate_global_indices(entity, &mut block.rows);
        self.ansatz
            .mapper()
            .populate_global_indices(entity, &mut block.cols);
        self.operator
            .apply(&test, &ansatz, block.values_mut(), pool)
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.matrix.with(|matrix| scatter_matrix_blocks(matrix, local));
    }
}

/// Assembles a [`LocalVolumeVectorOperator`] into a global vector.
pub struct VolumeVectorFunctor<'a, T, TS, Op, V: ?Sized, F> {
    test: &'a TS,
    operator: Op,
    vector: ContainerRef<'a, V>,
    filter: F,
    marker: PhantomData<T>,
}

impl<'a, T, TS, Op, V, F> VolumeVectorFunctor<'a, T, TS, Op, V, F>
where
    T: Real,
    TS: DiscreteFunctionSpace<T>,
    V: ?Sized + VectorContainer<T>,
{
    pub fn new(test: &'a TS, operator: Op, vector: impl Into<ContainerRef<'a, V>>, filter: F) -> Self {
        let mut vector = vector.into();
        vector.with(|v| assert_vector_dims::<T>(v, test.mapper().size()));
        Self {
            test,
            operator,
            vector,
            filter,
            marker: PhantomData,
        }
    }
}

impl<'a, T, G, TS, Op, V, F> Codim0Functor<T, G> for VolumeVectorFunctor<'a, T, TS, Op, V, F>
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    Op: LocalVolumeVectorOperator<T>,
    V: ?Sized + VectorContainer<T>,
    F: EntityFilter<T, G>,
{
    fn scratch_requirements(&self) -> ScratchRequirements {
        scratch_requirements(self.operator.num_tmp_objects_required(), self.test.mapper().max_local_size(), 1)
    }

    fn applies_to(&self, grid: &G, entity: usize) -> bool {
        self.filter.contains(grid, entity)
    }

    fn compute_local(
        &self,
        _grid: &G,
        entity: usize,
        pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        let test = self.test.base_function_set(entity);
        let [block] = local.push_vector_blocks([test.size()]);
        self.test
            .mapper()
            .populate_global_indices(entity, &mut block.rows);
        self.operator.apply(&test, block.values_mut(), pool)
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.vector.with(|vector| scatter_vector_blocks(vector, local));
    }
}

/// Assembles a [`LocalCouplingMatrixOperator`] into a global matrix.
///
/// All four coupling blocks are accumulated, so every intersection must be visited only once.
pub struct CouplingMatrixFunctor<'a, T, TS, AS, Op, M: ?Sized, F> {
    test: &'a TS,
    ansatz: &'a AS,
    operator: Op,
    matrix: ContainerRef<'a, M>,
    filter: F,
    marker: PhantomData<T>,
}

impl<'a, T, TS, AS, Op, M, F> CouplingMatrixFunctor<'a, T, TS, AS, Op, M, F>
where
    T: Real,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
    M: ?Sized + MatrixContainer<T>,
{
    pub fn new(test: &'a TS, ansatz: &'a AS, operator: Op, matrix: impl Into<ContainerRef<'a, M>>, filter: F) -> Self {
        let mut matrix = matrix.into();
        matrix.with(|m| assert_matrix_dims::<T>(m, test.mapper().size(), ansatz.mapper().size()));
        Self {
            test,
            ansatz,
            operator,
            matrix,
            filter,
            marker: PhantomData,
        }
    }
}

impl<'a, T, G, TS, AS, Op, M, F> Codim1Functor<T, G> for CouplingMatrixFunctor<'a, T, TS, AS, Op, M, F>
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
    Op: LocalCouplingMatrixOperator<T>,
    M: ?Sized + MatrixContainer<T>,
    F: IntersectionFilter<T, G>,
{
    fn scratch_requirements(&self) -> ScratchRequirements {
        scratch_requirements(
            self.operator.num_tmp_objects_required(),
            self.test.mapper().max_local_size(),
            self.ansatz.mapper().max_local_size(),
        )
    }

    fn applies_to(&self, grid: &G, intersection: &G::Intersection) -> bool {
        self.filter.contains(grid, intersection)
    }

    fn compute_local(
        &self,
        _grid: &G,
        intersection: &G::Intersection,
        pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        let inside = intersection.inside();
        let outside = outside_entity::<T>(intersection)?;
        let test_inside = self.test.base_function_set(inside);
        let ansatz_inside = self.ansatz.base_function_set(inside);
        let test_outside = self.test.base_function_set(outside);
        let ansatz_outside = self.ansatz.base_function_set(outside);

        let [ii, oo, io, oi] = local.push_matrix_blocks([
            (test_inside.size(), ansatz_inside.size()),
            (test_outside.size(), ansatz_outside.size()),
            (test_inside.size(), ansatz_outside.size()),
            (test_outside.size(), ansatz_inside.size()),
        ]);
        let (test_mapper, ansatz_mapper) = (self.test.mapper(), self.ansatz.mapper());
        test_mapper.populate_global_indices(inside, &mut ii.rows);
        ansatz_mapper.populate_global_indices(inside, &mut ii.cols);
        test_mapper.populate_global_indices(outside, &mut oo.rows);
        ansatz_mapper.populate_global_indices(outside, &mut oo.cols);
        test_mapper.populate_global_indices(inside, &mut io.rows);
        ansatz_mapper.populate_global_indices(outside, &mut io.cols);
        test_mapper.populate_global_indices(outside, &mut oi.rows);
        ansatz_mapper.populate_global_indices(inside, &mut oi.cols);

        let blocks = CouplingMatrixBlocks {
            inside_inside: ii.values_mut(),
            outside_outside: oo.values_mut(),
            inside_outside: io.values_mut(),
            outside_inside: oi.values_mut(),
        };
        self.operator.apply(
            &test_inside,
            &ansatz_inside,
            &test_outside,
            &ansatz_outside,
            intersection,
            blocks,
            pool,
        )
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.matrix.with(|matrix| scatter_matrix_blocks(matrix, local));
    }
}

/// Assembles a [`LocalBoundaryMatrixOperator`] into a global matrix.
pub struct BoundaryMatrixFunctor<'a, T, TS, AS, Op, M: ?Sized, F> {
    test: &'a TS,
    ansatz: &'a AS,
    operator: Op,
    matrix: ContainerRef<'a, M>,
    filter: F,
    marker: PhantomData<T>,
}

impl<'a, T, TS, AS, Op, M, F> BoundaryMatrixFunctor<'a, T, TS, AS, Op, M, F>
where
    T: Real,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
    M: ?Sized + MatrixContainer<T>,
{
    pub fn new(test: &'a TS, ansatz: &'a AS, operator: Op, matrix: impl Into<ContainerRef<'a, M>>, filter: F) -> Self {
        let mut matrix = matrix.into();
        matrix.with(|m| assert_matrix_dims::<T>(m, test.mapper().size(), ansatz.mapper().size()));
        Self {
            test,
            ansatz,
            operator,
            matrix,
            filter,
            marker: PhantomData,
        }
    }
}

impl<'a, T, G, TS, AS, Op, M, F> Codim1Functor<T, G> for BoundaryMatrixFunctor<'a, T, TS, AS, Op, M, F>
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    AS: DiscreteFunctionSpace<T>,
    Op: LocalBoundaryMatrixOperator<T>,
    M: ?Sized + MatrixContainer<T>,
    F: IntersectionFilter<T, G>,
{
    fn scratch_requirements(&self) -> ScratchRequirements {
        scratch_requirements(
            self.operator.num_tmp_objects_required(),
            self.test.mapper().max_local_size(),
            self.ansatz.mapper().max_local_size(),
        )
    }

    fn applies_to(&self, grid: &G, intersection: &G::Intersection) -> bool {
        self.filter.contains(grid, intersection)
    }

    fn compute_local(
        &self,
        _grid: &G,
        intersection: &G::Intersection,
        pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        let inside = intersection.inside();
        let test = self.test.base_function_set(inside);
        let ansatz = self.ansatz.base_function_set(inside);
        let [block] = local.push_matrix_blocks([(test.size(), ansatz.size())]);
        self.test
            .mapper()
            .populate_global_indices(inside, &mut block.rows);
        self.ansatz
            .mapper()
            .populate_global_indices(inside, &mut block.cols);
        self.operator
            .apply(&test, &ansatz, intersection, block.values_mut(), pool)
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.matrix.with(|matrix| scatter_matrix_blocks(matrix, local));
    }
}

/// Assembles a [`LocalFaceVectorOperator`] into a global vector.
pub struct FaceVectorFunctor<'a, T, TS, Op, V: ?Sized, F> {
    test: &'a TS,
    operator: Op,
    vector: ContainerRef<'a, V>,
    filter: F,
    marker: PhantomData<T>,
}

impl<'a, T, TS, Op, V, F> FaceVectorFunctor<'a, T, TS, Op, V, F>
where
    T: Real,
    TS: DiscreteFunctionSpace<T>,
    V: ?Sized + VectorContainer<T>,
{
    pub fn new(test: &'a TS, operator: Op, vector: impl Into<ContainerRef<'a, V>>, filter: F) -> Self {
        let mut vector = vector.into();
        vector.with(|v| assert_vector_dims::<T>(v, test.mapper().size()));
        Self {
            test,
            operator,
            vector,
            filter,
            marker: PhantomData,
        }
    }
}

impl<'a, T, G, TS, Op, V, F> Codim1Functor<T, G> for FaceVectorFunctor<'a, T, TS, Op, V, F>
where
    T: Real,
    G: GridView<T>,
    TS: DiscreteFunctionSpace<T>,
    Op: LocalFaceVectorOperator<T>,
    V: ?Sized + VectorContainer<T>,
    F: IntersectionFilter<T, G>,
{
    fn scratch_requirements(&self) -> ScratchRequirements {
        scratch_requirements(self.operator.num_tmp_objects_required(), self.test.mapper().max_local_size(), 1)
    }

    fn applies_to(&self, grid: &G, intersection: &G::Intersection) -> bool {
        self.filter.contains(grid, intersection)
    }

    fn compute_local(
        &self,
        _grid: &G,
        intersection: &G::Intersection,
        pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        let inside = intersection.inside();
        let test = self.test.base_function_set(inside);
        let [block] = local.push_vector_blocks([test.size()]);
        self.test
            .mapper()
            .populate_global_indices(inside, &mut block.rows);
        self.operator
            .apply(&test, intersection, block.values_mut(), pool)
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.vector.with(|vector| scatter_vector_blocks(vector, local));
    }
}

fn gather_local<T: Real>(
    mapper: &impl Mapper,
    source: &DVector<T>,
    entity: usize,
    indices: &mut Vec<usize>,
) -> DVector<T> {
    mapper.populate_global_indices(entity, indices);
    DVector::from_iterator(indices.len(), indices.iter().map(|&i| source[i]))
}

/// Applies a [`LocalCouplingOperator`] to a source function and accumulates into a range vector.
pub struct CouplingOperatorFunctor<'a, T: Real, S, Op, V: ?Sized, F> {
    space: &'a S,
    operator: Op,
    source: &'a DVector<T>,
    range: ContainerRef<'a, V>,
    filter: F,
}

impl<'a, T, S, Op, V, F> CouplingOperatorFunctor<'a, T, S, Op, V, F>
where
    T: Real,
    S: DiscreteFunctionSpace<T>,
    V: ?Sized + VectorContainer<T>,
{
    pub fn new(
        space: &'a S,
        operator: Op,
        source: &'a DVector<T>,
        range: impl Into<ContainerRef<'a, V>>,
        filter: F,
    ) -> Self {
        assert_eq!(source.len(), space.mapper().size(), "Source length must match the size of the space");
        let mut range = range.into();
        range.with(|v| assert_vector_dims::<T>(v, space.mapper().size()));
        Self {
            space,
            operator,
            source,
            range,
            filter,
        }
    }
}

impl<'a, T, G, S, Op, V, F> Codim1Functor<T, G> for CouplingOperatorFunctor<'a, T, S, Op, V, F>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
    Op: LocalCouplingOperator<T>,
    V: ?Sized + VectorContainer<T>,
    F: IntersectionFilter<T, G>,
{
    fn scratch_requirements(&self) -> ScratchRequirements {
        ScratchRequirements::default()
    }

    fn applies_to(&self, grid: &G, intersection: &G::Intersection) -> bool {
        self.filter.contains(grid, intersection)
    }

    fn compute_local(
        &self,
        grid: &G,
        intersection: &G::Intersection,
        _pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        let inside = intersection.inside();
        let outside = outside_entity::<T>(intersection)?;
        let mapper = self.space.mapper();
        let [range_inside, range_outside] =
            local.push_vector_blocks([mapper.local_size(inside), mapper.local_size(outside)]);
        let source_inside = gather_local(mapper, self.source, inside, &mut range_inside.rows);
        let source_outside = gather_local(mapper, self.source, outside, &mut range_outside.rows);
        self.operator.apply(
            &source_inside,
            &source_outside,
            intersection,
            grid.entity_geometry(inside),
            grid.entity_geometry(outside),
            range_inside.values_mut(),
            range_outside.values_mut(),
        )
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.range.with(|range| scatter_vector_blocks(range, local));
    }
}

/// Applies a [`LocalBoundaryOperator`] to a source function and accumulates into a range vector.
pub struct BoundaryOperatorFunctor<'a, T: Real, S, Op, V: ?Sized, F> {
    space: &'a S,
    operator: Op,
    source: &'a DVector<T>,
    range: ContainerRef<'a, V>,
    filter: F,
}

impl<'a, T, S, Op, V, F> BoundaryOperatorFunctor<'a, T, S, Op, V, F>
where
    T: Real,
    S: DiscreteFunctionSpace<T>,
    V: ?Sized + VectorContainer<T>,
{
    pub fn new(
        space: &'a S,
        operator: Op,
        source: &'a DVector<T>,
        range: impl Into<ContainerRef<'a, V>>,
        filter: F,
    ) -> Self {
        assert_eq!(source.len(), space.mapper().size(), "Source length must match the size of the space");
        let mut range = range.into();
        range.with(|v| assert_vector_dims::<T>(v, space.mapper().size()));
        Self {
            space,
            operator,
            source,
            range,
            filter,
        }
    }
}

impl<'a, T, G, S, Op, V, F> Codim1Functor<T, G> for BoundaryOperatorFunctor<'a, T, S, Op, V, F>
where
    T: Real,
    G: GridView<T>,
    S: DiscreteFunctionSpace<T>,
    Op: LocalBoundaryOperator<T>,
    V: ?Sized + VectorContainer<T>,
    F: IntersectionFilter<T, G>,
{
    fn scratch_requirements(&self) -> ScratchRequirements {
        ScratchRequirements::default()
    }

    fn applies_to(&self, grid: &G, intersection: &G::Intersection) -> bool {
        self.filter.contains(grid, intersection)
    }

    fn compute_local(
        &self,
        grid: &G,
        intersection: &G::Intersection,
        _pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        let inside = intersection.inside();
        let mapper = self.space.mapper();
        let [range_inside] = local.push_vector_blocks([mapper.local_size(inside)]);
        let source_inside = gather_local(mapper, self.source, inside, &mut range_inside.rows);
        self.operator.apply(
            &source_inside,
            intersection,
            grid.entity_geometry(inside),
            range_inside.values_mut(),
        )
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.range.with(|range| scatter_vector_blocks(range, local));
    }
}

/// Replaces constrained rows of a matrix by unit rows after the walk.
pub struct MatrixConstraintsFunctor<'a, T, C: ?Sized, M: ?Sized> {
    constraints: &'a C,
    matrix: ContainerRef<'a, M>,
    rows: BTreeMap<usize, T>,
}

impl<'a, T, C, M> MatrixConstraintsFunctor<'a, T, C, M>
where
    T: Real,
    C: ?Sized,
    M: ?Sized + MatrixContainer<T>,
{
    pub fn new(constraints: &'a C, matrix: impl Into<ContainerRef<'a, M>>) -> Self {
        Self {
            constraints,
            matrix: matrix.into(),
            rows: BTreeMap::new(),
        }
    }
}

impl<'a, T, G, C, M> Codim0Functor<T, G> for MatrixConstraintsFunctor<'a, T, C, M>
where
    T: Real,
    G: GridView<T>,
    C: ?Sized + Constraints<T, G>,
    M: ?Sized + MatrixContainer<T>,
{
    fn prepare(&mut self) -> eyre::Result<()> {
        self.rows.clear();
        Ok(())
    }

    fn scratch_requirements(&self) -> ScratchRequirements {
        ScratchRequirements::default()
    }

    fn applies_to(&self, _grid: &G, _entity: usize) -> bool {
        true
    }

    fn compute_local(
        &self,
        grid: &G,
        entity: usize,
        _pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        self.constraints
            .populate_local_constraints(grid, entity, local.constraints_mut());
        Ok(())
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.rows.extend(local.constraints().iter().copied());
    }

    fn finalize(&mut self) -> eyre::Result<()> {
        let rows = &self.rows;
        self.matrix.with(|matrix| {
            for &row in rows.keys() {
                matrix.clear_row(row);
                matrix.set_entry(row, row, T::one());
            }
        });
        Ok(())
    }
}

/// Sets constrained entries of a vector to their prescribed values after the walk.
pub struct VectorConstraintsFunctor<'a, T, C: ?Sized, V: ?Sized> {
    constraints: &'a C,
    vector: ContainerRef<'a, V>,
    values: BTreeMap<usize, T>,
}

impl<'a, T, C, V> VectorConstraintsFunctor<'a, T, C, V>
where
    T: Real,
    C: ?Sized,
    V: ?Sized + VectorContainer<T>,
{
    pub fn new(constraints: &'a C, vector: impl Into<ContainerRef<'a, V>>) -> Self {
        Self {
            constraints,
            vector: vector.into(),
            values: BTreeMap::new(),
        }
    }
}

impl<'a, T, G, C, V> Codim0Functor<T, G> for VectorConstraintsFunctor<'a, T, C, V>
where
    T: Real,
    G: GridView<T>,
    C: ?Sized + Constraints<T, G>,
    V: ?Sized + VectorContainer<T>,
{
    fn prepare(&mut self) -> eyre::Result<()> {
        self.values.clear();
        Ok(())
    }

    fn scratch_requirements(&self) -> ScratchRequirements {
        ScratchRequirements::default()
    }

    fn applies_to(&self, _grid: &G, _entity: usize) -> bool {
        true
    }

    fn compute_local(
        &self,
        grid: &G,
        entity: usize,
        _pool: &mut ScratchPool<T>,
        local: &mut LocalContribution<T>,
    ) -> eyre::Result<()> {
        self.constraints
            .populate_local_constraints(grid, entity, local.constraints_mut());
        Ok(())
    }

    fn scatter(&mut self, local: &LocalContribution<T>) {
        self.values.extend(local.constraints().iter().copied());
    }

    fn finalize(&mut self) -> eyre::Result<()> {
        let values = &self.values;
        self.vector.with(|vector| {
            for (&row, &value) in values {
                vector.set_entry(row, value);
            }
        });
        Ok(())
    }
}
