//! Argument Bindings
//!
//! An `ArgumentBinding` is the ordered list of typed inputs to a node's
//! compute function: plain constants, or references to other cached nodes.
//! Order is positional input order to the compute body and is semantically
//! significant; the same node may legitimately appear twice.
//!
//! Resolution (turning bindings into concrete values) lives on the graph,
//! which owns the arena the node references point into.

use smallvec::SmallVec;

use crate::graph::node::NodeId;
use crate::value::Value;

/// One entry in an argument list.
#[derive(Debug, Clone)]
pub enum Argument {
    /// A fixed value, supplied as-is on every evaluation. Never stale.
    Constant(Value),

    /// A reference to another node in the same graph, resolved via
    /// `get_value` (which may itself trigger recomputation upstream).
    Node(NodeId),
}

impl From<Value> for Argument {
    fn from(v: Value) -> Self {
        Argument::Constant(v)
    }
}

impl From<NodeId> for Argument {
    fn from(id: NodeId) -> Self {
        Argument::Node(id)
    }
}

/// Ordered argument list for one compute function.
#[derive(Debug, Clone, Default)]
pub struct ArgumentBinding {
    entries: SmallVec<[Argument; 4]>,
}

impl ArgumentBinding {
    /// An empty binding (for compute bodies with no inputs).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the binding has no arguments.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in positional order.
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.entries.iter()
    }

    /// The node references in this binding, in positional order.
    /// Duplicates are preserved.
    pub fn node_refs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().filter_map(|arg| match arg {
            Argument::Node(id) => Some(*id),
            Argument::Constant(_) => None,
        })
    }
}

impl From<Vec<Argument>> for ArgumentBinding {
    fn from(entries: Vec<Argument>) -> Self {
        Self {
            entries: SmallVec::from_vec(entries),
        }
    }
}

impl FromIterator<Argument> for ArgumentBinding {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_preserved() {
        let binding: ArgumentBinding = vec![
            Argument::Node(NodeId::from_index(2)),
            Argument::Constant(Value::Scalar(1.0)),
            Argument::Node(NodeId::from_index(0)),
        ]
        .into();

        assert_eq!(binding.len(), 3);
        let refs: Vec<_> = binding.node_refs().collect();
        assert_eq!(refs, vec![NodeId::from_index(2), NodeId::from_index(0)]);
    }

    #[test]
    fn duplicates_are_allowed() {
        let id = NodeId::from_index(1);
        let binding: ArgumentBinding =
            vec![Argument::Node(id), Argument::Node(id)].into();
        assert_eq!(binding.node_refs().count(), 2);
    }

    #[test]
    fn constants_contribute_no_refs() {
        let binding: ArgumentBinding = vec![
            Argument::Constant(Value::Scalar(1.0)),
            Argument::Constant(Value::Scalar(2.0)),
        ]
        .into();
        assert!(binding.node_refs().next().is_none());
    }
}
