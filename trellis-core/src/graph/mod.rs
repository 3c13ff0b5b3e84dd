//! Dependency Graph
//!
//! This module implements the dependency-tracked lazy evaluation cache at the
//! heart of the crate: a directed acyclic graph where nodes are cached,
//! recomputable quantities and edges are induced by argument bindings.
//!
//! # Overview
//!
//! - [`ValueCache`] stores one node's last-known value and the generation
//!   snapshot it was produced from
//! - [`ArgumentBinding`] is the ordered, typed input list to a compute body
//! - [`Graph`] owns the node arena and drives pull-based lazy evaluation
//!
//! # Design Decisions
//!
//! 1. Nodes live in an arena addressed by stable integer ids, and bindings
//!    hold ids rather than live references. This avoids ownership cycles
//!    between nodes that know about each other while keeping dependency
//!    lookups O(1).
//!
//! 2. Invalidation is pull-based: a source mutation bumps counters and
//!    returns. Staleness is discovered at the next read, so the cost of a
//!    sampling step scales with reads rather than writes.
//!
//! 3. Staleness is decided by generation counters, never by value equality,
//!    since deep comparison of numeric results is not assumed cheap.

mod binding;
mod cache;
mod eval;
mod node;

pub use binding::{Argument, ArgumentBinding};
pub use cache::ValueCache;
pub use eval::{EvalStats, Graph};
pub use node::{ComputeFn, NodeId, NodeState};
