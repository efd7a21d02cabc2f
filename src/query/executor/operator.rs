//! Match operators
//!
//! One operator per pattern position. Each binds every acceptable candidate
//! for its position in turn and calls the continuation (the rest of the
//! chain) once per candidate:
//!
//! | operator            | position | candidates come from                   |
//! |---------------------|----------|----------------------------------------|
//! | [`NodeScan`]        | node     | label bucket / property index / scan   |
//! | [`EdgeScan`]        | edge     | type bucket / property index / scan    |
//! | [`ExpandEdge`]      | edge     | adjacency of the bound neighbour node  |
//! | [`EdgeEndpoint`]    | node     | far end of the bound neighbour edges   |
//! | [`VarLengthExpand`] | edge     | paths walked from a neighbour (or any) |

use super::varlength::{enumerate_paths, expand, WalkOrigin};
use super::{ExecutionResult, MatchContext, Slot};
use crate::graph::{EdgeFilter, EdgeId, NodeFilter, NodeId};
use crate::query::pattern::{Direction, EdgePattern, NodePattern};
use std::ops::ControlFlow;

/// The rest of the chain
pub type Continuation<'n, 'g> = dyn FnMut(&mut MatchContext<'g>) -> ExecutionResult<ControlFlow<()>> + 'n;

/// Match operator trait - every plan step implements this
pub trait MatchOperator {
    /// Pattern position this operator binds
    fn position(&self) -> usize;

    /// Bind each candidate in turn and call `next` for it.
    fn run<'g>(&self, ctx: &mut MatchContext<'g>, next: &mut Continuation<'_, 'g>) -> ExecutionResult<ControlFlow<()>>;

    /// Short label for plan logging
    fn describe(&self) -> String;
}

/// Type alias for boxed operators
pub type OperatorBox<'p> = Box<dyn MatchOperator + 'p>;

/// Admit `slot`, run the continuation, then undo the binding.
fn visit<'g>(
    ctx: &mut MatchContext<'g>,
    position: usize,
    name: Option<&str>,
    slot: Slot,
    next: &mut Continuation<'_, 'g>,
) -> ExecutionResult<ControlFlow<()>> {
    let Some(admitted) = ctx.admit(position, name, slot)? else {
        return Ok(ControlFlow::Continue(()));
    };
    let flow = next(ctx);
    ctx.release(admitted);
    flow
}

/// Orientations in which `edge` satisfies a pattern edge read left to right:
/// (left node, right node).
fn orientations(source: NodeId, target: NodeId, direction: Direction) -> Vec<(NodeId, NodeId)> {
    match direction {
        Direction::Outgoing => vec![(source, target)],
        Direction::Incoming => vec![(target, source)],
        Direction::Both if source == target => vec![(source, target)],
        Direction::Both => vec![(source, target), (target, source)],
    }
}

/// Node scan operator: MATCH (n:Person)
pub struct NodeScan<'p> {
    position: usize,
    node: &'p NodePattern,
    filter: NodeFilter,
}

impl<'p> NodeScan<'p> {
    pub fn new(position: usize, node: &'p NodePattern) -> Self {
        Self {
            position,
            node,
            filter: node.filter(),
        }
    }
}

impl MatchOperator for NodeScan<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn run<'g>(&self, ctx: &mut MatchContext<'g>, next: &mut Continuation<'_, 'g>) -> ExecutionResult<ControlFlow<()>> {
        let graph = ctx.graph();
        let name = self.node.variable.as_deref();
        let scan = graph.select_nodes(&self.filter)?;

        // An outer restriction smaller than the best access path is walked instead
        match ctx.known_nodes(name) {
            Some(ids) if scan.max_size().map_or(true, |size| ids.len() < size) => {
                for id in ids {
                    let Some(node) = graph.node(id) else {
                        continue;
                    };
                    if !self.filter.matches(node)? {
                        continue;
                    }
                    if visit(ctx, self.position, name, Slot::Node(id), next)?.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
            }
            _ => {
                for id in scan {
                    if visit(ctx, self.position, name, Slot::Node(id?), next)?.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn describe(&self) -> String {
        format!("NodeScan({})", self.position)
    }
}

/// Edge scan operator: a single-hop edge chosen as pivot
pub struct EdgeScan<'p> {
    position: usize,
    edge: &'p EdgePattern,
    filter: EdgeFilter,
}

impl<'p> EdgeScan<'p> {
    pub fn new(position: usize, edge: &'p EdgePattern) -> Self {
        Self {
            position,
            edge,
            filter: edge.filter(),
        }
    }

    fn bind_each<'g>(
        &self,
        ctx: &mut MatchContext<'g>,
        id: EdgeId,
        next: &mut Continuation<'_, 'g>,
    ) -> ExecutionResult<ControlFlow<()>> {
        let Some(edge) = ctx.graph().edge(id) else {
            return Ok(ControlFlow::Continue(()));
        };
        for (left, right) in orientations(edge.source, edge.target, self.edge.direction) {
            let slot = Slot::Edges {
                edges: vec![id],
                left,
                right,
            };
            if visit(ctx, self.position, self.edge.variable.as_deref(), slot, next)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

impl MatchOperator for EdgeScan<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn run<'g>(&self, ctx: &mut MatchContext<'g>, next: &mut Continuation<'_, 'g>) -> ExecutionResult<ControlFlow<()>> {
        let graph = ctx.graph();
        let scan = graph.select_edges(&self.filter)?;

        match ctx.known_edges(self.edge.variable.as_deref()) {
            Some(ids) if scan.max_size().map_or(true, |size| ids.len() < size) => {
                for id in ids {
                    let Some(edge) = graph.edge(id) else {
                        continue;
                    };
                    if !self.filter.matches(edge)? {
                        continue;
                    }
                    if self.bind_each(ctx, id, next)?.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
            }
            _ => {
                for id in scan {
                    if self.bind_each(ctx, id?, next)?.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn describe(&self) -> String {
        format!("EdgeScan({})", self.position)
    }
}

/// Expand operator: single-hop edges incident to the bound neighbour node
pub struct ExpandEdge<'p> {
    position: usize,
    anchor: usize,
    /// True when the anchor is the node on the left
    forward: bool,
    edge: &'p EdgePattern,
    filter: EdgeFilter,
}

impl<'p> ExpandEdge<'p> {
    pub fn new(position: usize, anchor: usize, forward: bool, edge: &'p EdgePattern) -> Self {
        Self {
            position,
            anchor,
            forward,
            edge,
            filter: edge.filter(),
        }
    }
}

impl MatchOperator for ExpandEdge<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn run<'g>(&self, ctx: &mut MatchContext<'g>, next: &mut Continuation<'_, 'g>) -> ExecutionResult<ControlFlow<()>> {
        let from = ctx.anchor_node(self.anchor)?;
        let direction = walk_direction(self.edge.direction, self.forward);

        for (edge, far) in expand(ctx.graph(), from, direction, &self.filter)? {
            let (left, right) = if self.forward { (from, far) } else { (far, from) };
            let slot = Slot::Edges {
                edges: vec![edge],
                left,
                right,
            };
            if visit(ctx, self.position, self.edge.variable.as_deref(), slot, next)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn describe(&self) -> String {
        format!("ExpandEdge({} from {})", self.position, self.anchor)
    }
}

/// Endpoint operator: the node at the far end of the bound neighbour edges
pub struct EdgeEndpoint<'p> {
    position: usize,
    anchor: usize,
    /// True when the anchor is the edge on the left
    forward: bool,
    node: &'p NodePattern,
    filter: NodeFilter,
}

impl<'p> EdgeEndpoint<'p> {
    pub fn new(position: usize, anchor: usize, forward: bool, node: &'p NodePattern) -> Self {
        Self {
            position,
            anchor,
            forward,
            node,
            filter: node.filter(),
        }
    }
}

impl MatchOperator for EdgeEndpoint<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn run<'g>(&self, ctx: &mut MatchContext<'g>, next: &mut Continuation<'_, 'g>) -> ExecutionResult<ControlFlow<()>> {
        let (left, right) = ctx.anchor_ends(self.anchor)?;
        let id = if self.forward { right } else { left };
        let Some(node) = ctx.graph().node(id) else {
            return Ok(ControlFlow::Continue(()));
        };
        if !self.filter.matches(node)? {
            return Ok(ControlFlow::Continue(()));
        }
        visit(ctx, self.position, self.node.variable.as_deref(), Slot::Node(id), next)
    }

    fn describe(&self) -> String {
        format!("EdgeEndpoint({} from {})", self.position, self.anchor)
    }
}

/// Variable-length expand operator: -[:KNOWS*1..3]->
///
/// Walks from the bound neighbour node, or from every node when it starts
/// the chain. Bound edge sequences are always in pattern order.
pub struct VarLengthExpand<'p> {
    position: usize,
    anchor: Option<usize>,
    /// True when the walk starts at the left node
    forward: bool,
    edge: &'p EdgePattern,
    filter: EdgeFilter,
}

impl<'p> VarLengthExpand<'p> {
    pub fn new(position: usize, anchor: Option<usize>, forward: bool, edge: &'p EdgePattern) -> Self {
        Self {
            position,
            anchor,
            forward,
            edge,
            filter: edge.filter(),
        }
    }

    fn walk<'g>(
        &self,
        ctx: &mut MatchContext<'g>,
        start: NodeId,
        next: &mut Continuation<'_, 'g>,
    ) -> ExecutionResult<ControlFlow<()>> {
        let direction = walk_direction(self.edge.direction, self.forward);
        let name = self.edge.variable.as_deref();
        let origin = if self.forward { WalkOrigin::Start } else { WalkOrigin::End };
        enumerate_paths(
            ctx.graph(),
            start,
            direction,
            &self.filter,
            self.edge.length,
            origin,
            |edges, end| {
                let slot = if self.forward {
                    Slot::Edges {
                        edges: edges.to_vec(),
                        left: start,
                        right: end,
                    }
                } else {
                    Slot::Edges {
                        edges: edges.iter().rev().copied().collect(),
                        left: end,
                        right: start,
                    }
                };
                visit(ctx, self.position, name, slot, next)
            },
        )
    }
}

impl MatchOperator for VarLengthExpand<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn run<'g>(&self, ctx: &mut MatchContext<'g>, next: &mut Continuation<'_, 'g>) -> ExecutionResult<ControlFlow<()>> {
        if let Some(anchor) = self.anchor {
            let start = ctx.anchor_node(anchor)?;
            return self.walk(ctx, start, next);
        }
        let graph = ctx.graph();
        for start in graph.node_ids() {
            if self.walk(ctx, start, next)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn describe(&self) -> String {
        match self.anchor {
            Some(anchor) => format!("VarLengthExpand({} from {})", self.position, anchor),
            None => format!("VarLengthExpand({})", self.position),
        }
    }
}

/// Direction to follow adjacency in, given the pattern direction and which
/// side the walk starts from.
fn walk_direction(direction: Direction, forward: bool) -> Direction {
    if forward {
        direction
    } else {
        direction.reversed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, PropertyMap};
    use crate::query::pattern::{EdgePattern, LengthPattern};
    use crate::query::symbols::{Bindings, Symbols};

    fn collect_slots(op: &dyn MatchOperator, ctx: &mut MatchContext<'_>) -> Vec<Slot> {
        let position = op.position();
        let mut seen = Vec::new();
        op.run(ctx, &mut |ctx: &mut MatchContext<'_>| {
            seen.push(ctx.slot(position).cloned().unwrap());
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        seen
    }

    #[test]
    fn test_edge_scan_both_directions() {
        let mut graph = Graph::new();
        let a = graph.new_node(["N"], PropertyMap::new()).unwrap();
        let b = graph.new_node(["N"], PropertyMap::new()).unwrap();
        let ab = graph.new_edge(a, b, "E", PropertyMap::new()).unwrap();
        let aa = graph.new_edge(a, a, "E", PropertyMap::new()).unwrap();

        let pattern = EdgePattern::undirected();
        let scan = EdgeScan::new(1, &pattern);
        let symbols = Symbols::new();
        let pinned = Bindings::new();
        let mut ctx = MatchContext::new(&graph, &symbols, &pinned, 3);

        let slots = collect_slots(&scan, &mut ctx);
        assert_eq!(
            slots,
            vec![
                Slot::Edges { edges: vec![ab], left: a, right: b },
                Slot::Edges { edges: vec![ab], left: b, right: a },
                Slot::Edges { edges: vec![aa], left: a, right: a },
            ]
        );
    }

    #[test]
    fn test_backward_varlength_keeps_pattern_order() {
        let mut graph = Graph::new();
        let n: Vec<NodeId> = (0..3).map(|_| graph.new_node(["N"], PropertyMap::new()).unwrap()).collect();
        let e0 = graph.new_edge(n[0], n[1], "E", PropertyMap::new()).unwrap();
        let e1 = graph.new_edge(n[1], n[2], "E", PropertyMap::new()).unwrap();

        // (x)-[*2..2]->(n2), walked from n2 back to x
        let pattern = EdgePattern::outgoing().with_length(LengthPattern::range(2, 2));
        let expand = VarLengthExpand::new(1, Some(2), false, &pattern);
        let symbols = Symbols::new();
        let pinned = Bindings::new();
        let mut ctx = MatchContext::new(&graph, &symbols, &pinned, 3);
        let anchor = ctx.admit(2, None, Slot::Node(n[2])).unwrap().unwrap();

        let slots = collect_slots(&expand, &mut ctx);
        assert_eq!(
            slots,
            vec![Slot::Edges { edges: vec![e0, e1], left: n[0], right: n[2] }]
        );
        ctx.release(anchor);
        assert!(ctx.slot(2).is_none());
    }
}
