//! Assembly of global matrices and vectors from local contributions.
//!
//! Local operators (see [`local`]) compute dense blocks on single entities or intersections.
//! Functors (see [`functor`]) bind a local operator to one or two discrete function spaces, a
//! global container and a filter. The [`walker::GridWalker`] visits every entity and
//! every intersection of a grid exactly once and dispatches all registered functors, either
//! serially or in parallel over contiguous partitions of the entities. The
//! [`system::SystemAssembler`] is the public entry point tying these pieces together.
use serde::{Deserialize, Serialize};

pub mod buffers;
pub mod constraints;
pub mod container;
pub mod filter;
pub mod functor;
pub mod local;
pub mod partition;
pub mod pattern;
pub mod system;
pub mod walker;

pub use buffers::{BasisBuffers, BasisFunctionBuffer, ScratchPool, ScratchRequirements};
pub use container::{MatrixContainer, VectorContainer};
pub use system::SystemAssembler;
pub use walker::{GridWalker, WalkerState};

/// How the grid walker traverses the entities of the grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalMode {
    /// Visit all entities in index order on the calling thread.
    Serial,
    /// Split the entities into contiguous partitions that are processed in parallel.
    ///
    /// The result is identical to a serial traversal.
    Partitioned { num_partitions: usize },
}

impl TraversalMode {
    /// Partitioned traversal with one partition per thread of the current rayon pool.
    pub fn partitioned_per_thread() -> Self {
        Self::Partitioned {
            num_partitions: rayon::current_num_threads(),
        }
    }
}

/// Options controlling a call to [`SystemAssembler::assemble`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    pub mode: TraversalMode,
    /// Whether registered functors are dropped after the walk.
    pub clear_stack: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            mode: TraversalMode::Serial,
            clear_stack: true,
        }
    }
}
