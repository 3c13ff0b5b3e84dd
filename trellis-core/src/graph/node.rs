//! Graph Nodes
//!
//! This module defines the node types stored in the evaluation arena.

use std::fmt;
use std::sync::Arc;

use crate::error::KernelError;
use crate::graph::binding::ArgumentBinding;
use crate::graph::cache::ValueCache;
use crate::value::Value;

/// Stable identifier for a node: its index in the owning graph's arena.
///
/// Ids are handed out by [`Graph::add_source`](crate::Graph::add_source) and
/// [`Graph::add_node`](crate::Graph::add_node) and are only meaningful for
/// the graph that produced them. Bindings hold ids rather than references,
/// which keeps the arena free of ownership cycles while dependency lookups
/// stay O(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Construct an id from a raw arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A compute body: a pure function from resolved argument values to a result.
///
/// Bound once at node construction. Kernels invoked inside must be
/// deterministic and stateless; the cache assumes identical inputs yield
/// identical outputs.
pub type ComputeFn = Arc<dyn Fn(&[Value]) -> Result<Value, KernelError> + Send + Sync>;

/// Evaluation state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// No value has ever been computed or assigned.
    Unevaluated,

    /// The cached value reflects current upstream state as of the last read.
    Valid,

    /// An upstream input changed since the cache was last written; the value
    /// must be recomputed before being trusted.
    Stale,
}

/// What drives a node's value.
pub(crate) enum NodeKind {
    /// A mutable source. Its value is assigned directly by an external owner
    /// (typically the sampler); it has no compute function and no upstream.
    Source,

    /// A derived quantity: a compute function over an ordered argument list.
    Computed {
        compute: ComputeFn,
        bindings: ArgumentBinding,
    },
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Source => write!(f, "Source"),
            NodeKind::Computed { bindings, .. } => f
                .debug_struct("Computed")
                .field("bindings", bindings)
                .finish_non_exhaustive(),
        }
    }
}

/// A node in the dependency graph.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) cache: ValueCache,

    /// Monotonically increasing change counter. Bumped on every source
    /// mutation and unconditionally on every successful recomputation —
    /// only relative ordering matters, and equality-checking arbitrary
    /// numeric results is not assumed cheap.
    pub(crate) generation: u64,

    pub(crate) state: NodeState,

    /// Graph epoch at which this node was last verified fresh. Lets a read
    /// with no intervening mutation anywhere return without walking upstream.
    pub(crate) verified_at: u64,
}

impl Node {
    pub(crate) fn source(initial: Option<Value>) -> Self {
        let mut cache = ValueCache::new();
        let (generation, state) = match initial {
            Some(value) => {
                cache.write(value, &[]);
                (1, NodeState::Valid)
            }
            None => (0, NodeState::Unevaluated),
        };
        Self {
            kind: NodeKind::Source,
            cache,
            generation,
            state,
            verified_at: 0,
        }
    }

    pub(crate) fn computed(compute: ComputeFn, bindings: ArgumentBinding) -> Self {
        Self {
            kind: NodeKind::Computed { compute, bindings },
            cache: ValueCache::new(),
            generation: 0,
            state: NodeState::Unevaluated,
            verified_at: 0,
        }
    }

    pub(crate) fn is_source(&self) -> bool {
        matches!(self.kind, NodeKind::Source)
    }
}
