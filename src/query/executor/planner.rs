//! Match planner - picks a pivot and lays out the operator chain
//!
//! The pivot is the pattern position with the smallest known candidate
//! estimate. From there the chain walks right to the end of the pattern,
//! then left back to the start, so every operator after the first has an
//! already-bound neighbour to expand from.

use super::operator::{
    Continuation, EdgeEndpoint, EdgeScan, ExpandEdge, NodeScan, OperatorBox, VarLengthExpand,
};
use super::{ExecutionError, ExecutionResult, MatchContext};
use crate::graph::Graph;
use crate::query::pattern::{PathPattern, PatternElement};
use crate::query::symbols::{Bindings, Symbols};
use std::ops::ControlFlow;

/// Linear operator chain for one pattern
pub struct ExecutionPlan<'p> {
    /// Position the chain starts from
    pub pivot: usize,
    /// Operators in execution order
    pub steps: Vec<OperatorBox<'p>>,
}

impl<'p> ExecutionPlan<'p> {
    /// Drive the chain once; `sink` fires for every complete binding.
    pub fn execute<'g>(
        &self,
        ctx: &mut MatchContext<'g>,
        sink: &mut Continuation<'_, 'g>,
    ) -> ExecutionResult<ControlFlow<()>> {
        proceed(&self.steps, ctx, sink)
    }

    pub fn describe(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.describe()).collect()
    }
}

/// Run `steps[0]` with the rest of the chain as its continuation.
fn proceed<'g>(
    steps: &[OperatorBox<'_>],
    ctx: &mut MatchContext<'g>,
    sink: &mut Continuation<'_, 'g>,
) -> ExecutionResult<ControlFlow<()>> {
    match steps.split_first() {
        None => sink(ctx),
        Some((step, rest)) => step.run(ctx, &mut |ctx: &mut MatchContext<'g>| proceed(rest, ctx, &mut *sink)),
    }
}

/// Candidate estimate for one position, `None` when unknown.
///
/// Nodes take the smallest of the facade's access-path size, the size of an
/// outer symbol of the same name and 1 for a pinned value. Multi-hop edges
/// are never estimated.
pub fn estimate(
    pattern: &PathPattern,
    position: usize,
    graph: &Graph,
    symbols: &Symbols,
    pinned: &Bindings,
) -> ExecutionResult<Option<usize>> {
    let Some(element) = pattern.element(position) else {
        return Err(ExecutionError::InvalidPivot(position));
    };
    let from_graph = match element {
        PatternElement::Node(node) => graph.estimate_nodes(&node.filter())?,
        PatternElement::Edge(edge) if edge.length.is_single_hop() => graph.estimate_edges(&edge.filter())?,
        PatternElement::Edge(_) => return Ok(None),
    };
    let from_symbol = element.variable().and_then(|name| {
        if pinned.contains_key(name) {
            Some(1)
        } else {
            symbols.get(name).map(|symbol| symbol.len())
        }
    });
    Ok(match (from_graph, from_symbol) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    })
}

/// Position with the smallest known estimate; ties go to the earlier
/// position, and position 0 when nothing is known.
pub fn fastest_element(
    pattern: &PathPattern,
    graph: &Graph,
    symbols: &Symbols,
    pinned: &Bindings,
) -> ExecutionResult<usize> {
    let mut best: Option<(usize, usize)> = None;
    for position in 0..pattern.len() {
        if let Some(size) = estimate(pattern, position, graph, symbols, pinned)? {
            if best.map_or(true, |(_, smallest)| size < smallest) {
                best = Some((position, size));
            }
        }
    }
    Ok(best.map_or(0, |(position, _)| position))
}

/// Build the operator chain, starting at `pivot` or at the
/// [`fastest_element`].
pub fn build_plan<'p>(
    pattern: &'p PathPattern,
    graph: &Graph,
    symbols: &Symbols,
    pinned: &Bindings,
    pivot: Option<usize>,
) -> ExecutionResult<ExecutionPlan<'p>> {
    let pivot = match pivot {
        Some(pivot) if pivot < pattern.len() => pivot,
        Some(pivot) => return Err(ExecutionError::InvalidPivot(pivot)),
        None => fastest_element(pattern, graph, symbols, pinned)?,
    };

    let mut steps: Vec<OperatorBox<'p>> = Vec::with_capacity(pattern.len());
    steps.push(start_operator(pattern, pivot)?);
    for position in pivot + 1..pattern.len() {
        steps.push(step_operator(pattern, position, position - 1, true)?);
    }
    for position in (0..pivot).rev() {
        steps.push(step_operator(pattern, position, position + 1, false)?);
    }
    Ok(ExecutionPlan { pivot, steps })
}

fn element(pattern: &PathPattern, position: usize) -> ExecutionResult<PatternElement<'_>> {
    pattern
        .element(position)
        .ok_or(ExecutionError::InvalidPivot(position))
}

fn start_operator(pattern: &PathPattern, position: usize) -> ExecutionResult<OperatorBox<'_>> {
    Ok(match element(pattern, position)? {
        PatternElement::Node(node) => Box::new(NodeScan::new(position, node)),
        PatternElement::Edge(edge) if edge.length.is_single_hop() => Box::new(EdgeScan::new(position, edge)),
        PatternElement::Edge(edge) => Box::new(VarLengthExpand::new(position, None, true, edge)),
    })
}

/// Operator for `position`, expanding from the already bound `anchor`.
/// `forward` is true when the walk moves left to right.
fn step_operator(
    pattern: &PathPattern,
    position: usize,
    anchor: usize,
    forward: bool,
) -> ExecutionResult<OperatorBox<'_>> {
    Ok(match element(pattern, position)? {
        PatternElement::Node(node) => Box::new(EdgeEndpoint::new(position, anchor, forward, node)),
        PatternElement::Edge(edge) if edge.length.is_single_hop() => {
            Box::new(ExpandEdge::new(position, anchor, forward, edge))
        }
        PatternElement::Edge(edge) => Box::new(VarLengthExpand::new(position, Some(anchor), forward, edge)),
    })
}
