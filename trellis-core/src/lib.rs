//! Trellis Core
//!
//! This crate provides the computation-caching core of an MCMC toolkit:
//! a directed dependency graph of random and deterministic quantities where
//! each value can be expensive to recompute and is re-evaluated only when an
//! upstream input actually changes.
//!
//! The dominant access pattern is the one Metropolis-Hastings/Gibbs samplers
//! produce: mutate one source variable, then read the handful of downstream
//! values that decide acceptance, millions of times. The graph is therefore
//! pull-based — mutation is a counter bump, and all staleness checking happens
//! on read, so cost is proportional to reads rather than writes.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: the node arena, value cache, argument bindings, and the lazy
//!   evaluation engine
//! - `model`: name-addressed model assembly with construction-time cycle
//!   detection
//! - `kernels`: pure numeric kernels (covariance functions, dense and
//!   incomplete Cholesky factorization) invoked from compute bodies
//! - `value`: the opaque value type flowing through the graph
//! - `error`: the error taxonomy shared by all of the above
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{Graph, Value, Argument};
//!
//! let mut graph = Graph::new();
//!
//! // A source variable owned by the sampler.
//! let x = graph.add_source(Some(Value::Scalar(2.0)));
//!
//! // A deterministic node: y = x * x.
//! let y = graph
//!     .add_node(
//!         |args| Ok(Value::Scalar(args[0].as_scalar()? * args[0].as_scalar()?)),
//!         vec![Argument::Node(x)],
//!     )
//!     .unwrap();
//!
//! assert_eq!(graph.get_value(y).unwrap(), Value::Scalar(4.0));
//!
//! // Propose a new value for x; y recomputes on the next read only.
//! graph.set_value(x, Value::Scalar(3.0)).unwrap();
//! assert_eq!(graph.get_value(y).unwrap(), Value::Scalar(9.0));
//! ```

pub mod error;
pub mod graph;
pub mod kernels;
pub mod model;
pub mod value;

pub use error::{EvalError, GraphError, KernelError};
pub use graph::{Argument, ArgumentBinding, EvalStats, Graph, NodeId, NodeState};
pub use kernels::Matrix;
pub use model::{ArgSpec, Model, ModelBuilder};
pub use value::Value;
