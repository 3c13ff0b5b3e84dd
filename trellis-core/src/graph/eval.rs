//! Dependency Graph and Lazy Evaluation
//!
//! The graph owns an immutable-after-construction arena of nodes addressed by
//! [`NodeId`]. Topology is frozen once the model is assembled; only values,
//! generations, and source state change over the graph's lifetime.
//!
//! # Evaluation model
//!
//! Invalidation is pull-based. Mutating a source is a counter bump; nothing
//! is pushed through the graph. When a dependent's value is read, the graph
//! resolves the node's arguments depth-first (recursively refreshing upstream
//! computed nodes), then compares the upstream generations against the
//! snapshot recorded when the node's cache was last written. Only a mismatch
//! triggers the compute function. This makes the cost of a sampling step
//! proportional to the number of reads rather than the number of writes,
//! which is what a one-variable-at-a-time sampler needs: one source among
//! thousands of nodes changes per step, and most nodes are never read before
//! the next mutation.
//!
//! A graph-wide epoch counter, bumped on every source mutation, provides a
//! read fast path: a node verified fresh at the current epoch returns its
//! cached value without walking upstream at all. Per-node generations remain
//! the staleness authority.
//!
//! # Concurrency
//!
//! Evaluation is single-threaded and synchronous: `get_value` recursion is a
//! plain call stack. All mutating operations take `&mut self`, so the
//! serialize-all-calls contract is enforced structurally. Parallel chains
//! must own private `Graph` instances.

use serde::Serialize;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{EvalError, GraphError, KernelError};
use crate::graph::binding::{Argument, ArgumentBinding};
use crate::graph::cache::GenSnapshot;
use crate::graph::node::{ComputeFn, Node, NodeId, NodeKind, NodeState};
use crate::value::Value;

/// Counters maintained on the evaluation hot path.
///
/// Counting only; no timing. `computes` is the number of compute-function
/// invocations, `cache_hits` the number of reads served without one.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EvalStats {
    /// Compute-function invocations.
    pub computes: u64,
    /// Reads of computed nodes served from cache.
    pub cache_hits: u64,
    /// Compute-function failures (surfaced as `ComputeFailure`).
    pub failures: u64,
    /// Source mutations (`set_value` and `mark_changed`).
    pub source_writes: u64,
}

impl EvalStats {
    /// Fraction of computed-node reads served from cache.
    /// Returns 0.0 before any reads.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.computes;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Zero all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The dependency graph: node arena plus the edges implied by bindings.
///
/// This is the explicit evaluation context passed to every construction and
/// evaluation call — there is no process-wide current graph.
pub struct Graph {
    nodes: Vec<Node>,
    /// Bumped on every source mutation. See module docs.
    epoch: u64,
    stats: EvalStats,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            epoch: 0,
            stats: EvalStats::default(),
        }
    }

    /// Add a mutable source node, optionally with an initial value.
    ///
    /// A source left uninitialized fails with `UninitializedCache` when any
    /// evaluation path reaches it.
    pub fn add_source(&mut self, initial: Option<Value>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::source(initial));
        id
    }

    /// Add a computed node binding `compute` to the given arguments.
    ///
    /// Every referenced node must already exist in this graph; since ids are
    /// only handed out on insertion and topology is frozen afterwards, the
    /// arena stays acyclic by construction. Out-of-range references are
    /// rejected with `UnknownNode`.
    pub fn add_node<F>(
        &mut self,
        compute: F,
        bindings: impl Into<ArgumentBinding>,
    ) -> Result<NodeId, GraphError>
    where
        F: Fn(&[Value]) -> Result<Value, KernelError> + Send + Sync + 'static,
    {
        self.add_node_raw(Arc::new(compute), bindings.into())
    }

    pub(crate) fn add_node_raw(
        &mut self,
        compute: ComputeFn,
        bindings: ArgumentBinding,
    ) -> Result<NodeId, GraphError> {
        for dep in bindings.node_refs() {
            if dep.index() >= self.nodes.len() {
                return Err(GraphError::UnknownNode(dep));
            }
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::computed(compute, bindings));
        Ok(id)
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current generation of a node, without forcing recomputation.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    pub fn generation(&self, id: NodeId) -> u64 {
        self.nodes[id.index()].generation
    }

    /// Current evaluation state of a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    pub fn state(&self, id: NodeId) -> NodeState {
        self.nodes[id.index()].state
    }

    /// Evaluation counters.
    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    /// Zero the evaluation counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Assign a new value to a source node.
    ///
    /// Bumps the source's generation so dependents recompute on their next
    /// read. The sampler calls this for a proposal, and again with the prior
    /// value on rejection so the cache reflects the reverted state.
    pub fn set_value(&mut self, id: NodeId, value: Value) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode(id))?;
        if !node.is_source() {
            return Err(GraphError::NotASource(id));
        }
        node.cache.write(value, &[]);
        node.generation += 1;
        node.state = NodeState::Valid;
        self.epoch += 1;
        self.stats.source_writes += 1;
        debug!(node = %id, generation = node.generation, "source value assigned");
        Ok(())
    }

    /// Mark a source as changed without replacing its value.
    ///
    /// Idempotent with respect to recomputation: calling this any number of
    /// times between reads costs dependents exactly one recompute on the next
    /// read. The generation is bumped unconditionally — only relative
    /// ordering matters.
    pub fn mark_changed(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode(id))?;
        if !node.is_source() {
            return Err(GraphError::NotASource(id));
        }
        node.generation += 1;
        if node.state == NodeState::Valid {
            node.state = NodeState::Stale;
        }
        self.epoch += 1;
        self.stats.source_writes += 1;
        debug!(node = %id, generation = node.generation, "source marked changed");
        Ok(())
    }

    /// Read a node's value, recomputing it (and any stale upstream computed
    /// nodes) on demand.
    ///
    /// On a compute failure the node's cache, state, and generation are left
    /// exactly as they were — a failed speculative recomputation never
    /// corrupts a previously valid value.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    pub fn get_value(&mut self, id: NodeId) -> Result<Value, EvalError> {
        self.ensure_fresh(id)?;
        let epoch = self.epoch;
        let node = &mut self.nodes[id.index()];
        let value = node
            .cache
            .read()
            .cloned()
            .ok_or(EvalError::UninitializedCache { node: id })?;
        node.state = NodeState::Valid;
        node.verified_at = epoch;
        Ok(value)
    }

    /// Bring a computed node up to date with its upstream. Sources are
    /// always "fresh" — their own mutation is the authoritative signal.
    fn ensure_fresh(&mut self, id: NodeId) -> Result<(), EvalError> {
        let idx = id.index();
        {
            let node = &self.nodes[idx];
            if node.is_source() {
                return Ok(());
            }
            if node.state == NodeState::Valid && node.verified_at == self.epoch {
                self.stats.cache_hits += 1;
                return Ok(());
            }
        }

        let (compute, bindings) = match &self.nodes[idx].kind {
            NodeKind::Computed { compute, bindings } => {
                (Arc::clone(compute), bindings.clone())
            }
            NodeKind::Source => return Ok(()),
        };

        // Depth-first, eager argument resolution: recomputation cannot
        // proceed until every argument is a concrete, up-to-date value.
        let mut args: Vec<Value> = Vec::with_capacity(bindings.len());
        let mut gens: GenSnapshot = SmallVec::new();
        for arg in bindings.iter() {
            match arg {
                Argument::Constant(v) => args.push(v.clone()),
                Argument::Node(dep) => {
                    args.push(self.get_value(*dep)?);
                    gens.push(self.nodes[dep.index()].generation);
                }
            }
        }

        let epoch = self.epoch;
        let node = &mut self.nodes[idx];
        if !node.cache.is_stale(&gens) {
            // Upstream generations match the snapshot: the cached value is
            // exactly what a full recomputation would produce.
            node.state = NodeState::Valid;
            node.verified_at = epoch;
            self.stats.cache_hits += 1;
            trace!(node = %id, "cache hit");
            return Ok(());
        }

        trace!(node = %id, "recomputing");
        match (compute)(&args) {
            Ok(value) => {
                let node = &mut self.nodes[idx];
                node.cache.write(value, &gens);
                node.generation += 1;
                node.state = NodeState::Valid;
                node.verified_at = epoch;
                self.stats.computes += 1;
                Ok(())
            }
            Err(cause) => {
                // No partial write: cache, state, and generation untouched.
                self.stats.failures += 1;
                debug!(node = %id, error = %cause, "compute failed");
                Err(EvalError::ComputeFailure { node: id, source: cause })
            }
        }
    }

    /// Nodes in an order where every dependency precedes its dependents.
    ///
    /// Kahn's algorithm over the binding-induced edges. Not needed on the
    /// evaluation path (which is purely pull-based); provided for diagnostics
    /// and bulk re-evaluation.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (idx, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Computed { bindings, .. } = &node.kind {
                for dep in bindings.node_refs() {
                    in_degree[idx] += 1;
                    dependents[dep.index()].push(idx);
                }
            }
        }

        let mut queue: VecDeque<usize> =
            (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(idx) = queue.pop_front() {
            order.push(NodeId::from_index(idx));
            for &dependent in &dependents[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        order
    }

    /// Evaluate every node in dependency order.
    ///
    /// For bulk use such as re-populating all caches after loading saved
    /// source state; stops at the first failure.
    pub fn recompute_all(&mut self) -> Result<(), EvalError> {
        for id in self.topological_order() {
            if !self.nodes[id.index()].is_source() {
                self.get_value(id)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.nodes.len())
            .field("epoch", &self.epoch)
            .field("stats", &self.stats)
            .finish()
    }
}
