//! Error taxonomy for graph construction, evaluation, and numeric kernels.
//!
//! Three layers, matching how failures propagate:
//!
//! - [`GraphError`]: model-construction errors. Always fatal; a model that
//!   fails to build never evaluates.
//! - [`EvalError`]: evaluation-time errors. `UninitializedCache` is a
//!   programming error (a source was never given a value); `ComputeFailure`
//!   is recoverable and is what a sampler treats as "reject this proposal".
//! - [`KernelError`]: failures inside pure numeric kernels, wrapped into
//!   `ComputeFailure` by the graph.
//!
//! A failed recomputation never touches cache state, so a `ComputeFailure`
//! from a speculative proposal leaves the previous valid value intact.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised while assembling a graph or model. Fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A node's arguments reference the node itself, directly or transitively.
    /// Detected at construction; evaluation assumes an acyclic graph.
    #[error("dependency cycle detected: {}", path.join(" -> "))]
    CycleDetected {
        /// The offending reference path, ending where it re-enters itself.
        path: Vec<String>,
    },

    /// A binding references a node id that was never inserted.
    #[error("unknown node {0} in argument binding")]
    UnknownNode(NodeId),

    /// A named argument references a declaration that does not exist.
    #[error("unknown name {0:?} in model declaration")]
    UnknownName(String),

    /// Two declarations share a name.
    #[error("duplicate declaration name {0:?}")]
    DuplicateName(String),

    /// A source-only operation was applied to a computed node.
    #[error("node {0} is not a mutable source")]
    NotASource(NodeId),
}

/// Errors raised by `get_value`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A source node was read before it was ever given a value.
    /// Indicates a missing initialization in model setup.
    #[error("node {node} read before initialization")]
    UninitializedCache { node: NodeId },

    /// A compute body failed. The node's cache is untouched; the sampler
    /// decides whether this means "reject the proposal" or abort the run.
    #[error("compute failed at node {node}: {source}")]
    ComputeFailure {
        node: NodeId,
        #[source]
        source: KernelError,
    },
}

/// Errors raised by numeric kernels and compute bodies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// An incomplete factorization could not meet its tolerance within the
    /// allowed rank.
    #[error(
        "incomplete factorization stopped at rank {rank} with residual {residual:.3e} > tolerance {tolerance:.3e}"
    )]
    FactorizationFailure {
        rank: usize,
        residual: f64,
        tolerance: f64,
    },

    /// A (nominally) symmetric positive-definite matrix produced a
    /// non-positive pivot. Typical for ill-conditioned covariance proposals.
    #[error("matrix is not positive definite (pivot {pivot} <= 0)")]
    NotPositiveDefinite { pivot: usize },

    /// Operand shapes do not agree.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    /// A kernel parameter is outside its valid domain.
    #[error("invalid kernel parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// A compute body received a `Value` variant it cannot use.
    #[error("value type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_formats_path() {
        let err = GraphError::CycleDetected {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "dependency cycle detected: a -> b -> a"
        );
    }

    #[test]
    fn compute_failure_carries_cause() {
        let err = EvalError::ComputeFailure {
            node: NodeId::from_index(3),
            source: KernelError::NotPositiveDefinite { pivot: 1 },
        };
        let msg = err.to_string();
        assert!(msg.contains("node 3"));
        assert!(msg.contains("not positive definite"));
    }
}
