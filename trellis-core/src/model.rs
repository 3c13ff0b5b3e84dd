//! Model Assembly
//!
//! Statistical models are written down as named quantities that reference
//! each other by name, in whatever order reads best — a log-probability may
//! be declared before the covariance matrix it consumes. The builder accepts
//! forward references and resolves them when the model is built, inserting
//! nodes into the graph in dependency order.
//!
//! Cycle detection happens here, at construction: evaluation assumes an
//! acyclic arena, and a recursion guard on the hot path would defeat the
//! point of the cache. A cyclic declaration fails `build()` with the
//! offending path spelled out.
//!
//! The built [`Model`] owns its [`Graph`] and the name → id index; samplers
//! hold `NodeId`s and talk to the graph directly.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use crate::error::{GraphError, KernelError};
use crate::graph::{Argument, ComputeFn, Graph, NodeId};
use crate::value::Value;

/// One argument in a declaration: a constant, or a reference by name.
#[derive(Debug, Clone)]
pub enum ArgSpec {
    /// A fixed value.
    Constant(Value),
    /// A reference to another declaration, which may appear later in the
    /// builder.
    Named(String),
}

impl ArgSpec {
    /// Reference another declaration by name.
    pub fn named(name: impl Into<String>) -> Self {
        ArgSpec::Named(name.into())
    }

    /// Supply a fixed value.
    pub fn constant(value: impl Into<Value>) -> Self {
        ArgSpec::Constant(value.into())
    }
}

enum Decl {
    Source { init: Option<Value> },
    Deterministic { compute: ComputeFn, args: Vec<ArgSpec> },
}

/// Builder for a named dependency graph.
///
/// Declarations may reference each other in any order; `build()` resolves
/// names, rejects unknowns and cycles, and produces a frozen [`Model`].
#[derive(Default)]
pub struct ModelBuilder {
    decls: IndexMap<String, Decl>,
}

impl std::fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("decls", &self.decls.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an uninitialized mutable source. Reading any dependent before
    /// the source is assigned fails with `UninitializedCache`.
    pub fn source(&mut self, name: impl Into<String>) -> Result<&mut Self, GraphError> {
        self.declare(name.into(), Decl::Source { init: None })
    }

    /// Declare a mutable source with an initial value.
    pub fn source_with(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, GraphError> {
        self.declare(
            name.into(),
            Decl::Source {
                init: Some(value.into()),
            },
        )
    }

    /// Declare a deterministic quantity: a compute function over named or
    /// constant arguments, in positional order.
    pub fn deterministic<F>(
        &mut self,
        name: impl Into<String>,
        compute: F,
        args: Vec<ArgSpec>,
    ) -> Result<&mut Self, GraphError>
    where
        F: Fn(&[Value]) -> Result<Value, KernelError> + Send + Sync + 'static,
    {
        self.declare(
            name.into(),
            Decl::Deterministic {
                compute: Arc::new(compute),
                args,
            },
        )
    }

    fn declare(&mut self, name: String, decl: Decl) -> Result<&mut Self, GraphError> {
        if self.decls.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }
        self.decls.insert(name, decl);
        Ok(self)
    }

    /// Resolve all names and produce the frozen model.
    ///
    /// Fails with `UnknownName` for dangling references and `CycleDetected`
    /// (naming the path) for cyclic ones. Topology cannot change afterwards.
    pub fn build(self) -> Result<Model, GraphError> {
        let mut ctx = BuildCtx {
            decls: self.decls.into_iter().map(|(k, v)| (k, Some(v))).collect(),
            ids: IndexMap::new(),
            stack: Vec::new(),
            graph: Graph::new(),
        };

        let names: Vec<String> = ctx.decls.keys().cloned().collect();
        for name in &names {
            ctx.resolve(name)?;
        }

        // Forward references resolve dependencies out of declaration order;
        // the public index keeps the order the model was written in.
        let mut index = IndexMap::with_capacity(names.len());
        for name in names {
            let id = ctx.ids[&name];
            index.insert(name, id);
        }

        info!(nodes = ctx.graph.node_count(), "model built");
        Ok(Model {
            graph: ctx.graph,
            index,
        })
    }
}

struct BuildCtx {
    decls: IndexMap<String, Option<Decl>>,
    ids: IndexMap<String, NodeId>,
    stack: Vec<String>,
    graph: Graph,
}

impl BuildCtx {
    fn resolve(&mut self, name: &str) -> Result<NodeId, GraphError> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }

        if let Some(pos) = self.stack.iter().position(|n| n == name) {
            let mut path: Vec<String> = self.stack[pos..].to_vec();
            path.push(name.to_string());
            return Err(GraphError::CycleDetected { path });
        }

        let decl = self
            .decls
            .get_mut(name)
            .and_then(Option::take)
            .ok_or_else(|| GraphError::UnknownName(name.to_string()))?;

        self.stack.push(name.to_string());
        let id = match decl {
            Decl::Source { init } => self.graph.add_source(init),
            Decl::Deterministic { compute, args } => {
                let mut bound = Vec::with_capacity(args.len());
                for spec in args {
                    match spec {
                        ArgSpec::Constant(v) => bound.push(Argument::Constant(v)),
                        ArgSpec::Named(dep) => bound.push(Argument::Node(self.resolve(&dep)?)),
                    }
                }
                self.graph.add_node_raw(compute, bound.into())?
            }
        };
        self.stack.pop();

        self.ids.insert(name.to_string(), id);
        Ok(id)
    }
}

/// A built model: the dependency graph plus its name index.
///
/// Topology is frozen; only source values and caches change from here on.
#[derive(Debug)]
pub struct Model {
    graph: Graph,
    index: IndexMap<String, NodeId>,
}

impl Model {
    /// Look up a declaration's node id.
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Declared names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the underlying graph, for evaluation and source
    /// mutation.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }
}
