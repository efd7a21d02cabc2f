//! Variable-length path enumeration
//!
//! Depth-first over filtered adjacency, with an explicit stack instead of
//! recursion. Paths never reuse an edge. Read from its first node, a path
//! may repeat a node only as its last node: reaching a node already on the
//! path still emits the path (when its length is in range) but the path is
//! not extended further, which bounds the depth by the number of nodes.
//!
//! A walk that starts at the last node enumerates the same paths from the
//! other side, see [`WalkOrigin::End`].

use super::ExecutionResult;
use crate::graph::{EdgeFilter, EdgeId, EdgeType, Graph, NodeId};
use crate::query::pattern::{Direction, LengthPattern};
use std::ops::ControlFlow;

/// Edges to follow out of `node` in `direction` that pass `filter`, each
/// paired with the node it leads to. With [`Direction::Both`] a self-loop
/// is returned once.
pub fn expand(
    graph: &Graph,
    node: NodeId,
    direction: Direction,
    filter: &EdgeFilter,
) -> ExecutionResult<Vec<(EdgeId, NodeId)>> {
    let store = graph.store();
    let mut found = Vec::new();

    if matches!(direction, Direction::Outgoing | Direction::Both) {
        let ids: Vec<EdgeId> = if filter.types.is_empty() {
            store.outgoing_edges(node).collect()
        } else {
            distinct_types(filter)
                .flat_map(|t| store.outgoing_edges_of_type(node, t))
                .collect()
        };
        for id in ids {
            let Some(edge) = store.get_edge(id) else {
                continue;
            };
            if filter.matches(edge)? {
                found.push((id, edge.target));
            }
        }
    }

    if matches!(direction, Direction::Incoming | Direction::Both) {
        let ids: Vec<EdgeId> = if filter.types.is_empty() {
            store.incoming_edges(node).collect()
        } else {
            distinct_types(filter)
                .flat_map(|t| store.incoming_edges_of_type(node, t))
                .collect()
        };
        for id in ids {
            let Some(edge) = store.get_edge(id) else {
                continue;
            };
            if direction == Direction::Both && edge.is_self_loop() {
                continue;
            }
            if filter.matches(edge)? {
                found.push((id, edge.source));
            }
        }
    }

    Ok(found)
}

fn distinct_types(filter: &EdgeFilter) -> impl Iterator<Item = &EdgeType> + '_ {
    filter
        .types
        .iter()
        .enumerate()
        .filter(|(i, t)| !filter.types[..*i].contains(t))
        .map(|(_, t)| t)
}

/// Which end of the path the walk starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOrigin {
    /// The walk starts at the first node of the path
    Start,
    /// The walk starts at the last node; that node may reappear once, every
    /// other node at most once
    End,
}

struct Frame {
    edges: Vec<EdgeId>,
    /// Nodes that may not be reached again
    visited: Vec<NodeId>,
    last: NodeId,
    /// Reached an already visited node
    closed: bool,
}

/// Call `visit(edges, end)` for every path from `start` whose hop count lies
/// in `length`, in depth-first adjacency order. `edges` is in walk order.
pub fn enumerate_paths<F>(
    graph: &Graph,
    start: NodeId,
    direction: Direction,
    filter: &EdgeFilter,
    length: LengthPattern,
    origin: WalkOrigin,
    mut visit: F,
) -> ExecutionResult<ControlFlow<()>>
where
    F: FnMut(&[EdgeId], NodeId) -> ExecutionResult<ControlFlow<()>>,
{
    let visited = match origin {
        WalkOrigin::Start => vec![start],
        WalkOrigin::End => Vec::new(),
    };
    let mut stack = vec![Frame {
        edges: Vec::new(),
        visited,
        last: start,
        closed: false,
    }];

    while let Some(frame) = stack.pop() {
        let hops = frame.edges.len();
        if hops > 0 && length.contains(hops) && visit(&frame.edges, frame.last)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        if frame.closed || !length.can_extend(hops) {
            continue;
        }

        // reversed so the first adjacent edge is popped first
        for (edge, far) in expand(graph, frame.last, direction, filter)?.into_iter().rev() {
            if frame.edges.contains(&edge) {
                continue;
            }
            let closed = frame.visited.contains(&far);
            if closed && origin == WalkOrigin::End {
                continue;
            }
            let mut edges = frame.edges.clone();
            edges.push(edge);
            let mut visited = frame.visited.clone();
            if !closed {
                visited.push(far);
            }
            stack.push(Frame {
                edges,
                visited,
                last: far,
                closed,
            });
        }
    }
    Ok(ControlFlow::Continue(()))
}
