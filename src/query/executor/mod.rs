//! Pattern matching executor
//!
//! A [`PathPattern`] is planned into a linear chain of match operators
//! starting at the cheapest position (see [`planner`]). Running the chain is a
//! depth-first backtracking search: each operator binds one candidate for its
//! position, hands control to the rest of the chain, then clears the binding
//! and moves on. When the last operator binds, the accumulator receives the
//! full path and the row's variable bindings.
//!
//! The graph must not be mutated while a run is in progress.

pub mod operator;
pub mod planner;
pub mod record;
pub mod varlength;

pub use operator::{Continuation, MatchOperator, OperatorBox};
pub use planner::ExecutionPlan;
pub use record::{CountAccumulator, FilteredAccumulator, MatchAccumulator, Record, RecordBatch};

use crate::graph::{EdgeId, Graph, GraphError, NodeId};
use crate::query::pattern::{PathPattern, PatternElement};
use crate::query::symbols::{Bindings, PatternSymbol, SymbolKind, Symbols, Value};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use thiserror::Error;
use tracing::debug;

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Pattern cannot be planned
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A variable is bound to the wrong kind of value
    #[error("Variable '{name}' is bound to a {found}, expected a {expected}")]
    SymbolKindMismatch {
        name: String,
        expected: SymbolKind,
        found: SymbolKind,
    },

    /// Forced pivot outside the pattern
    #[error("Pivot position {0} is outside the pattern")]
    InvalidPivot(usize),

    /// Row predicate failed
    #[error("Predicate error: {0}")]
    Predicate(String),

    /// Graph store error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Knobs for a single match run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Start the plan at this position instead of the cheapest one
    pub pivot: Option<usize>,
    /// Stop after this many rows
    pub limit: Option<usize>,
}

/// What an operator bound at one pattern position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Node(NodeId),
    /// Edges in pattern order with the nodes at the left and right end
    Edges {
        edges: Vec<EdgeId>,
        left: NodeId,
        right: NodeId,
    },
}

impl Slot {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Slot::Node(_) => SymbolKind::Node,
            Slot::Edges { .. } => SymbolKind::Edges,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Slot::Node(id) => Value::Node(*id),
            Slot::Edges { edges, .. } => Value::Edges(edges.clone()),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Slot::Node(a), Value::Node(b)) => a == b,
            (Slot::Edges { edges, .. }, Value::Edges(other)) => edges == other,
            _ => false,
        }
    }
}

/// Receipt for a successful [`MatchContext::admit`]; hand it back to
/// [`MatchContext::release`] when backtracking.
#[derive(Debug)]
#[must_use]
pub struct Admitted {
    position: usize,
    bound_locally: bool,
}

/// State of one match run
pub struct MatchContext<'g> {
    graph: &'g Graph,
    /// Outer-scope symbols; these constrain and are never rebound
    symbols: &'g Symbols,
    /// Single values fixed by earlier parts of a multi-part clause
    pinned: &'g Bindings,
    /// Variables bound while walking this pattern, in binding order
    bindings: Bindings,
    path: Vec<Option<Slot>>,
}

impl<'g> MatchContext<'g> {
    pub fn new(graph: &'g Graph, symbols: &'g Symbols, pinned: &'g Bindings, len: usize) -> Self {
        Self {
            graph,
            symbols,
            pinned,
            bindings: Bindings::new(),
            path: vec![None; len],
        }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn slot(&self, position: usize) -> Option<&Slot> {
        self.path.get(position).and_then(Option::as_ref)
    }

    /// Node bound at `position` by an earlier plan step.
    pub fn anchor_node(&self, position: usize) -> ExecutionResult<NodeId> {
        match self.slot(position) {
            Some(Slot::Node(id)) => Ok(*id),
            _ => Err(unbound_anchor(position)),
        }
    }

    /// Left and right end of the edges bound at `position`.
    pub fn anchor_ends(&self, position: usize) -> ExecutionResult<(NodeId, NodeId)> {
        match self.slot(position) {
            Some(Slot::Edges { left, right, .. }) => Ok((*left, *right)),
            _ => Err(unbound_anchor(position)),
        }
    }

    /// Nodes `name` is already restricted to, if any.
    pub fn known_nodes(&self, name: Option<&str>) -> Option<Vec<NodeId>> {
        let name = name?;
        if let Some(Value::Node(id)) = self.pinned.get(name) {
            return Some(vec![*id]);
        }
        match self.symbols.get(name) {
            Some(PatternSymbol::Nodes(ids)) => Some(ids.iter().copied().collect()),
            _ => None,
        }
    }

    /// Single edges `name` is already restricted to, if any.
    pub fn known_edges(&self, name: Option<&str>) -> Option<Vec<EdgeId>> {
        let name = name?;
        if let Some(Value::Edges(edges)) = self.pinned.get(name) {
            return Some(if edges.len() == 1 { vec![edges[0]] } else { Vec::new() });
        }
        match self.symbols.get(name) {
            Some(PatternSymbol::Edges(sequences)) => Some(
                sequences
                    .iter()
                    .filter(|s| s.len() == 1)
                    .map(|s| s[0])
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Try to bind `slot` at `position` under `name`.
    ///
    /// Returns `None` when an outer symbol, a pinned value or an earlier
    /// binding of the same name rules the candidate out.
    pub fn admit(&mut self, position: usize, name: Option<&str>, slot: Slot) -> ExecutionResult<Option<Admitted>> {
        let mut bound_locally = false;
        if let Some(name) = name {
            let accepted = if let Some(value) = self.pinned.get(name) {
                check_kind(name, &slot, value.kind())?;
                slot.matches(value)
            } else if let Some(symbol) = self.symbols.get(name) {
                check_kind(name, &slot, symbol.kind())?;
                match (symbol, &slot) {
                    (PatternSymbol::Nodes(ids), Slot::Node(id)) => ids.contains(id),
                    (PatternSymbol::Edges(sequences), Slot::Edges { edges, .. }) => sequences.contains(edges),
                    _ => false,
                }
            } else if let Some(value) = self.bindings.get(name) {
                check_kind(name, &slot, value.kind())?;
                slot.matches(value)
            } else {
                self.bindings.insert(name.to_string(), slot.to_value());
                bound_locally = true;
                true
            };
            if !accepted {
                return Ok(None);
            }
        }
        self.path[position] = Some(slot);
        Ok(Some(Admitted {
            position,
            bound_locally,
        }))
    }

    /// Undo an [`admit`](Self::admit). Releases happen in reverse admit order.
    pub fn release(&mut self, admitted: Admitted) {
        self.path[admitted.position] = None;
        if admitted.bound_locally {
            self.bindings.pop();
        }
    }

    /// Current path, one value per pattern position.
    pub fn path_values(&self) -> Vec<Value> {
        self.path.iter().flatten().map(Slot::to_value).collect()
    }

    /// Local bindings reordered to follow `variables`.
    pub fn row_bindings(&self, variables: &[&str]) -> Bindings {
        variables
            .iter()
            .filter_map(|name| {
                self.bindings
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }
}

fn check_kind(name: &str, slot: &Slot, found: SymbolKind) -> ExecutionResult<()> {
    if slot.kind() == found {
        Ok(())
    } else {
        Err(ExecutionError::SymbolKindMismatch {
            name: name.to_string(),
            expected: slot.kind(),
            found,
        })
    }
}

fn unbound_anchor(position: usize) -> ExecutionError {
    ExecutionError::InvalidPattern(format!("position {} was not bound before use", position))
}

/// Fail fast when an outer symbol or pinned value has the wrong kind for the
/// position that names it, even if no candidate would ever reach it.
fn check_symbol_kinds(pattern: &PathPattern, symbols: &Symbols, pinned: &Bindings) -> ExecutionResult<()> {
    for element in pattern.elements() {
        let Some(name) = element.variable() else {
            continue;
        };
        let expected = match element {
            PatternElement::Node(_) => SymbolKind::Node,
            PatternElement::Edge(_) => SymbolKind::Edges,
        };
        let found = pinned
            .get(name)
            .map(Value::kind)
            .or_else(|| symbols.get(name).map(PatternSymbol::kind));
        if let Some(found) = found {
            if found != expected {
                return Err(ExecutionError::SymbolKindMismatch {
                    name: name.to_string(),
                    expected,
                    found,
                });
            }
        }
    }
    Ok(())
}

impl PathPattern {
    /// Match this pattern against `graph`, feeding every row to `accumulator`.
    ///
    /// Variables named in `symbols` are constraints: a position carrying such
    /// a name only matches members of the symbol set. No match is not an
    /// error.
    pub fn run(
        &self,
        graph: &Graph,
        symbols: &Symbols,
        accumulator: &mut dyn MatchAccumulator,
    ) -> ExecutionResult<()> {
        self.run_with_options(graph, symbols, &MatchOptions::default(), accumulator)
    }

    pub fn run_with_options(
        &self,
        graph: &Graph,
        symbols: &Symbols,
        options: &MatchOptions,
        accumulator: &mut dyn MatchAccumulator,
    ) -> ExecutionResult<()> {
        self.run_scoped(graph, symbols, &Bindings::new(), options, accumulator)
            .map(|_| ())
    }

    pub(crate) fn run_scoped(
        &self,
        graph: &Graph,
        symbols: &Symbols,
        pinned: &Bindings,
        options: &MatchOptions,
        accumulator: &mut dyn MatchAccumulator,
    ) -> ExecutionResult<ControlFlow<()>> {
        self.validate()?;
        check_symbol_kinds(self, symbols, pinned)?;
        if options.limit == Some(0) {
            return Ok(ControlFlow::Break(()));
        }

        let plan = planner::build_plan(self, graph, symbols, pinned, options.pivot)?;
        debug!("Match plan from pivot {}: {}", plan.pivot, plan.describe().join(" -> "));

        let variables = self.variables();
        let limit = options.limit;
        let mut rows = 0usize;
        let mut ctx = MatchContext::new(graph, symbols, pinned, self.len());
        let mut sink = |ctx: &mut MatchContext<'_>| -> ExecutionResult<ControlFlow<()>> {
            let path = ctx.path_values();
            let bindings = ctx.row_bindings(&variables);
            rows += 1;
            let flow = accumulator.store_result(&path, &bindings)?;
            if flow.is_break() || limit.is_some_and(|limit| rows >= limit) {
                Ok(ControlFlow::Break(()))
            } else {
                Ok(ControlFlow::Continue(()))
            }
        };
        let flow = plan.execute(&mut ctx, &mut sink)?;
        debug!("Matched {} rows", rows);
        Ok(flow)
    }
}

/// Several path patterns matched together, like `MATCH (a), (b)-->(c)`.
///
/// Parts run left to right. Variables bound by an earlier part are fixed for
/// later parts, so a shared name joins the parts; everything else combines as
/// a cartesian product. Each row carries the concatenated paths and the
/// union of the parts' bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchClause {
    pub parts: Vec<PathPattern>,
}

impl MatchClause {
    pub fn new(parts: Vec<PathPattern>) -> Self {
        Self { parts }
    }

    pub fn run(
        &self,
        graph: &Graph,
        symbols: &Symbols,
        accumulator: &mut dyn MatchAccumulator,
    ) -> ExecutionResult<()> {
        self.run_with_options(graph, symbols, &MatchOptions::default(), accumulator)
    }

    /// Forced pivots do not apply across parts; only `limit` is honored.
    pub fn run_with_options(
        &self,
        graph: &Graph,
        symbols: &Symbols,
        options: &MatchOptions,
        accumulator: &mut dyn MatchAccumulator,
    ) -> ExecutionResult<()> {
        if self.parts.is_empty() {
            return Err(ExecutionError::InvalidPattern("match clause has no parts".to_string()));
        }
        if options.limit == Some(0) {
            return Ok(());
        }

        let limit = options.limit;
        let mut rows = 0usize;
        let mut sink = |path: &[Value], bindings: &Bindings| -> ExecutionResult<ControlFlow<()>> {
            rows += 1;
            let flow = accumulator.store_result(path, bindings)?;
            if flow.is_break() || limit.is_some_and(|limit| rows >= limit) {
                Ok(ControlFlow::Break(()))
            } else {
                Ok(ControlFlow::Continue(()))
            }
        };
        let mut path = Vec::new();
        let mut bindings = Bindings::new();
        let flow = self.run_from(0, graph, symbols, &mut path, &mut bindings, &mut sink)?;
        debug!(
            "Matched {} rows over {} parts{}",
            rows,
            self.parts.len(),
            if flow.is_break() { " (stopped early)" } else { "" }
        );
        Ok(())
    }

    fn run_from(
        &self,
        index: usize,
        graph: &Graph,
        symbols: &Symbols,
        path: &mut Vec<Value>,
        bindings: &mut Bindings,
        sink: &mut dyn MatchAccumulator,
    ) -> ExecutionResult<ControlFlow<()>> {
        let Some(part) = self.parts.get(index) else {
            return sink.store_result(path, bindings);
        };

        let pinned = bindings.clone();
        let mut forward = |part_path: &[Value], part_bindings: &Bindings| -> ExecutionResult<ControlFlow<()>> {
            let (path_len, bound) = (path.len(), bindings.len());
            path.extend_from_slice(part_path);
            for (name, value) in part_bindings {
                bindings.insert(name.clone(), value.clone());
            }
            let flow = self.run_from(index + 1, graph, symbols, path, bindings, &mut *sink);
            path.truncate(path_len);
            bindings.truncate(bound);
            flow
        };
        part.run_scoped(graph, symbols, &pinned, &MatchOptions::default(), &mut forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{properties, PropertyMap};
    use crate::query::pattern::{EdgePattern, NodePattern};

    fn triangle() -> (Graph, Vec<NodeId>) {
        let mut graph = Graph::new();
        let a = graph.new_node(["Person"], properties([("name", "a")])).unwrap();
        let b = graph.new_node(["Person"], properties([("name", "b")])).unwrap();
        let c = graph.new_node(["Robot"], properties([("name", "c")])).unwrap();
        graph.new_edge(a, b, "KNOWS", PropertyMap::new()).unwrap();
        graph.new_edge(b, c, "KNOWS", PropertyMap::new()).unwrap();
        graph.new_edge(c, a, "OWNS", PropertyMap::new()).unwrap();
        (graph, vec![a, b, c])
    }

    #[test]
    fn test_single_hop_rows() {
        let (graph, ids) = triangle();
        let pattern = PathPattern::new(NodePattern::new().named("x").with_label("Person"))
            .then(EdgePattern::outgoing().named("r").with_type("KNOWS"), NodePattern::new().named("y"));

        let mut batch = RecordBatch::new();
        pattern.run(&graph, &Symbols::new(), &mut batch).unwrap();
        assert_eq!(batch.len(), 2);

        let first = &batch.records[0];
        let names: Vec<&String> = first.bindings.keys().collect();
        assert_eq!(names, vec!["x", "r", "y"]);
        assert_eq!(first.get("x"), Some(&Value::Node(ids[0])));
        assert_eq!(first.get("y"), Some(&Value::Node(ids[1])));
        assert_eq!(first.path.len(), 3);
    }

    #[test]
    fn test_outer_symbol_constrains() {
        let (graph, ids) = triangle();
        let pattern = PathPattern::new(NodePattern::new().named("x"))
            .then(EdgePattern::undirected(), NodePattern::new().named("y"));

        let mut symbols = Symbols::new();
        symbols.insert("x".to_string(), PatternSymbol::nodes([ids[2]]));
        let mut batch = RecordBatch::new();
        pattern.run(&graph, &symbols, &mut batch).unwrap();

        // c touches b (incoming) and a (outgoing); x is not rebound
        assert_eq!(batch.len(), 2);
        for record in &batch.records {
            assert!(record.get("x").is_none());
            assert_eq!(record.path[0], Value::Node(ids[2]));
        }
    }

    #[test]
    fn test_symbol_kind_mismatch_aborts() {
        let (graph, _) = triangle();
        let pattern = PathPattern::new(NodePattern::new().named("x"))
            .then(EdgePattern::outgoing().named("r"), NodePattern::new());

        let mut symbols = Symbols::new();
        symbols.insert("r".to_string(), PatternSymbol::nodes([NodeId::new(0)]));
        let err = pattern.run(&graph, &symbols, &mut CountAccumulator::new()).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::SymbolKindMismatch {
                name: "r".to_string(),
                expected: SymbolKind::Edges,
                found: SymbolKind::Node,
            }
        );
    }

    #[test]
    fn test_repeated_variable_closes_cycle() {
        let (graph, ids) = triangle();
        let pattern = PathPattern::new(NodePattern::new().named("x"))
            .then(EdgePattern::outgoing(), NodePattern::new())
            .then(EdgePattern::outgoing(), NodePattern::new())
            .then(EdgePattern::outgoing(), NodePattern::new().named("x"));

        let mut batch = RecordBatch::new();
        pattern.run(&graph, &Symbols::new(), &mut batch).unwrap();
        // one rotation of the triangle per start node
        assert_eq!(batch.len(), 3);
        let mut starts: Vec<NodeId> = batch.records.iter().filter_map(|r| r.get("x")?.as_node()).collect();
        starts.sort();
        assert_eq!(starts, ids);
    }

    #[test]
    fn test_limit_stops_early() {
        let (graph, _) = triangle();
        let pattern = PathPattern::new(NodePattern::new());
        let options = MatchOptions {
            pivot: None,
            limit: Some(2),
        };
        let mut count = CountAccumulator::new();
        pattern.run_with_options(&graph, &Symbols::new(), &options, &mut count).unwrap();
        assert_eq!(count.count(), 2);
    }

    #[test]
    fn test_invalid_pivot() {
        let (graph, _) = triangle();
        let pattern = PathPattern::new(NodePattern::new());
        let options = MatchOptions {
            pivot: Some(3),
            limit: None,
        };
        let err = pattern
            .run_with_options(&graph, &Symbols::new(), &options, &mut CountAccumulator::new())
            .unwrap_err();
        assert_eq!(err, ExecutionError::InvalidPivot(3));
    }

    #[test]
    fn test_clause_joins_on_shared_variable() {
        let (graph, ids) = triangle();
        let people = PathPattern::new(NodePattern::new().named("p").with_label("Person"));
        let knows = PathPattern::new(NodePattern::new().named("p"))
            .then(EdgePattern::outgoing().with_type("KNOWS"), NodePattern::new().named("q"));

        let clause = MatchClause::new(vec![people, knows]);
        let mut batch = RecordBatch::new();
        clause.run(&graph, &Symbols::new(), &mut batch).unwrap();

        assert_eq!(batch.len(), 2);
        for record in &batch.records {
            assert_eq!(record.path.len(), 4);
            assert_eq!(record.bindings.len(), 2);
        }
        let pairs: Vec<(NodeId, NodeId)> = batch
            .records
            .iter()
            .map(|r| (r.get("p").unwrap().as_node().unwrap(), r.get("q").unwrap().as_node().unwrap()))
            .collect();
        assert_eq!(pairs, vec![(ids[0], ids[1]), (ids[1], ids[2])]);
    }

    #[test]
    fn test_clause_cartesian_product() {
        let (graph, _) = triangle();
        let clause = MatchClause::new(vec![
            PathPattern::new(NodePattern::new().named("a").with_label("Person")),
            PathPattern::new(NodePattern::new().named("b")),
        ]);
        let mut count = CountAccumulator::new();
        clause.run(&graph, &Symbols::new(), &mut count).unwrap();
        assert_eq!(count.count(), 2 * 3);

        assert!(MatchClause::default()
            .run(&graph, &Symbols::new(), &mut CountAccumulator::new())
            .is_err());
    }

    #[test]
    fn test_options_serde_defaults() {
        let options: MatchOptions = serde_json::from_str(r#"{"limit": 5}"#).unwrap();
        assert_eq!(options, MatchOptions { pivot: None, limit: Some(5) });
    }
}
