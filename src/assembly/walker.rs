use crate::assembly::buffers::{ScratchPool, ScratchRequirements};
use crate::assembly::functor::{Codim0Functor, Codim1Functor, LocalContribution};
use crate::assembly::partition::IndexPartitioning;
use crate::grid::{visit_from_inside, GridView, Intersection};
use crate::Real;
use eyre::WrapErr;
use log::{debug, warn};
use rayon::prelude::*;
use std::cell::RefCell;
use std::mem;
use std::ops::Range;
use thread_local::ThreadLocal;

/// Lifecycle of a [`GridWalker`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WalkerState {
    /// No functors are registered.
    Idle,
    /// Functors are registered and the walker is ready to walk.
    Populating,
    /// A walk is in progress.
    Walking,
}

#[derive(Debug, Copy, Clone)]
enum FunctorId {
    Codim0(usize),
    Codim1(usize),
}

type ContributionLog<T> = Vec<(FunctorId, LocalContribution<T>)>;

/// Visits every entity and every intersection of a grid exactly once and dispatches registered
/// functors.
///
/// Entities are visited in index order. On each entity, all codim-0 functors run in registration
/// order, followed by all codim-1 functors on every intersection of the entity that is visited
/// from this side (see [`visit_from_inside`]).
pub struct GridWalker<'a, T: Real, G: GridView<T>> {
    grid: &'a G,
    codim0: Vec<Box<dyn Codim0Functor<T, G> + 'a>>,
    codim1: Vec<Box<dyn Codim1Functor<T, G> + 'a>>,
    state: WalkerState,
}

impl<'a, T: Real, G: GridView<T>> GridWalker<'a, T, G> {
    pub fn new(grid: &'a G) -> Self {
        Self {
            grid,
            codim0: Vec::new(),
            codim1: Vec::new(),
            state: WalkerState::Idle,
        }
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    pub fn add_codim0(&mut self, functor: impl Codim0Functor<T, G> + 'a) {
        self.register();
        self.codim0.push(Box::new(functor));
    }

    pub fn add_codim1(&mut self, functor: impl Codim1Functor<T, G> + 'a) {
        self.register();
        self.codim1.push(Box::new(functor));
    }

    fn register(&mut self) {
        assert_ne!(self.state, WalkerState::Walking, "Cannot register functors during a walk");
        if self.grid.num_entities() == 0 {
            warn!("Registering functor on a grid without entities");
        }
        self.state = WalkerState::Populating;
    }

    pub fn num_functors(&self) -> usize {
        self.codim0.len() + self.codim1.len()
    }

    /// Drops all registered functors.
    pub fn clear(&mut self) {
        self.codim0.clear();
        self.codim1.clear();
        self.state = WalkerState::Idle;
    }

    /// Walks the grid on the calling thread.
    ///
    /// If `clear_stack` is set, all functors are dropped after the walk, which releases the
    /// borrows of their containers.
    pub fn walk(&mut self, clear_stack: bool) -> eyre::Result<()> {
        let requirements = self.begin_walk()?;
        debug!(
            "Serial walk over {} entities with {} codim-0 and {} codim-1 functors",
            self.grid.num_entities(),
            self.codim0.len(),
            self.codim1.len()
        );
        let result = self.walk_serial(requirements);
        self.end_walk(result, clear_stack)
    }

    /// Walks the grid with the entities split into contiguous partitions.
    ///
    /// Each partition is processed by a rayon task that computes the local contributions of its
    /// entities and intersections. The contributions are scattered into the global containers
    /// afterwards, partition by partition, in the same order as a serial walk would, so the
    /// result is identical to [`walk`](Self::walk).
    ///
    /// # Panics
    ///
    /// Panics if the partitioning does not cover exactly the entities of the grid.
    pub fn walk_partitioned(&mut self, partitioning: &IndexPartitioning, clear_stack: bool) -> eyre::Result<()> {
        assert_eq!(
            partitioning.index_len(),
            self.grid.num_entities(),
            "Partitioning must cover all entities of the grid"
        );
        let requirements = self.begin_walk()?;
        debug!(
            "Partitioned walk over {} entities in {} partitions with {} codim-0 and {} codim-1 functors",
            self.grid.num_entities(),
            partitioning.num_partitions(),
            self.codim0.len(),
            self.codim1.len()
        );
        let result = self.walk_in_partitions(partitioning, requirements);
        self.end_walk(result, clear_stack)
    }

    fn begin_walk(&mut self) -> eyre::Result<ScratchRequirements> {
        assert_ne!(self.state, WalkerState::Walking, "Walk already in progress");
        self.state = WalkerState::Walking;
        let mut requirements = ScratchRequirements::default();
        for functor in &self.codim0 {
            requirements = requirements.max(functor.scratch_requirements());
        }
        for functor in &self.codim1 {
            requirements = requirements.max(functor.scratch_requirements());
        }
        let prepared = self
            .codim0
            .iter_mut()
            .map(|functor| functor.prepare())
            .chain(self.codim1.iter_mut().map(|functor| functor.prepare()))
            .collect::<eyre::Result<()>>()
            .wrap_err("failed to prepare functors");
        match prepared {
            Ok(()) => Ok(requirements),
            Err(err) => {
                self.state = WalkerState::Populating;
                Err(err)
            }
        }
    }

    fn end_walk(&mut self, result: eyre::Result<()>, clear_stack: bool) -> eyre::Result<()> {
        let result = result.and_then(|()| self.finalize());
        self.state = if self.num_functors() > 0 {
            WalkerState::Populating
        } else {
            WalkerState::Idle
        };
        if clear_stack {
            self.clear();
        }
        result
    }

    fn finalize(&mut self) -> eyre::Result<()> {
        for functor in &mut self.codim0 {
            functor.finalize().wrap_err("failed to finalize codim-0 functor")?;
        }
        for functor in &mut self.codim1 {
            functor.finalize().wrap_err("failed to finalize codim-1 functor")?;
        }
        Ok(())
    }

    fn walk_serial(&mut self, requirements: ScratchRequirements) -> eyre::Result<()> {
        let grid = self.grid;
        let mut pool = ScratchPool::new(requirements);
        let mut local = LocalContribution::default();
        for entity in 0..grid.num_entities() {
            for functor in &mut self.codim0 {
                if functor.applies_to(grid, entity) {
                    local.clear();
                    functor
                        .compute_local(grid, entity, &mut pool, &mut local)
                        .wrap_err_with(|| format!("failed to assemble on entity {entity}"))?;
                    functor.scatter(&local);
                }
            }
            for intersection in grid.intersections(entity) {
                if !visit_from_inside::<T, _>(intersection) {
                    continue;
                }
                for functor in &mut self.codim1 {
                    if functor.applies_to(grid, intersection) {
                        local.clear();
                        functor
                            .compute_local(grid, intersection, &mut pool, &mut local)
                            .wrap_err_with(|| intersection_context::<T>(intersection))?;
                        functor.scatter(&local);
                    }
                }
            }
        }
        Ok(())
    }

    fn walk_in_partitions(
        &mut self,
        partitioning: &IndexPartitioning,
        requirements: ScratchRequirements,
    ) -> eyre::Result<()> {
        if partitioning.num_partitions() > rayon::current_num_threads() {
            debug!(
                "More partitions ({}) than threads ({})",
                partitioning.num_partitions(),
                rayon::current_num_threads()
            );
        }

        let pools: ThreadLocal<RefCell<ScratchPool<T>>> = ThreadLocal::new();
        let walker = &*self;
        let ranges: Vec<_> = partitioning.ranges().collect();
        let logs = ranges
            .into_par_iter()
            .map(|range| {
                let mut pool = pools
                    .get_or(|| RefCell::new(ScratchPool::new(requirements)))
                    .borrow_mut();
                walker.compute_partition(range, &mut pool)
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        for log in logs {
            for (id, local) in log {
                match id {
                    FunctorId::Codim0(index) => self.codim0[index].scatter(&local),
                    FunctorId::Codim1(index) => self.codim1[index].scatter(&local),
                }
            }
        }
        Ok(())
    }

    fn compute_partition(&self, range: Range<usize>, pool: &mut ScratchPool<T>) -> eyre::Result<ContributionLog<T>> {
        let grid = self.grid;
        let mut log = Vec::new();
        let mut local = LocalContribution::default();
        for entity in range {
            for (index, functor) in self.codim0.iter().enumerate() {
                if functor.applies_to(grid, entity) {
                    local.clear();
                    functor
                        .compute_local(grid, entity, pool, &mut local)
                        .wrap_err_with(|| format!("failed to assemble on entity {entity}"))?;
                    log.push((FunctorId::Codim0(index), mem::take(&mut local)));
                }
            }
            for intersection in grid.intersections(entity) {
                if !visit_from_inside::<T, _>(intersection) {
                    continue;
                }
                for (index, functor) in self.codim1.iter().enumerate() {
                    if functor.applies_to(grid, intersection) {
                        local.clear();
                        functor
                            .compute_local(grid, intersection, pool, &mut local)
                            .wrap_err_with(|| intersection_context::<T>(intersection))?;
                        log.push((FunctorId::Codim1(index), mem::take(&mut local)));
                    }
                }
            }
        }
        Ok(log)
    }
}

fn intersection_context<T: Real>(intersection: &impl Intersection<T>) -> String {
    format!(
        "failed to assemble on face {} of entity {}",
        intersection.index_in_inside(),
        intersection.inside()
    )
}
