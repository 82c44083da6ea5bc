//! Weighted selection of outgoing edges.
//!
//! Selection is a two-pass walk over a vertex's outgoing edges of one
//! kind: sum the eligible weights, draw one uniform from `[0, W)`,
//! then walk the same edges in document order and take the first one
//! whose running total covers the draw. Because the draw excludes
//! `W` itself, the last eligible edge is always reachable.

use tracing::debug;

use crate::graph::{EdgeId, EdgeKind, ModelGraph, VertexId};
use crate::prng::ModelRng;

/// Pick one outgoing edge of `kind` from `from`, weighted by edge
/// weight, and return it with its destination vertex.
///
/// Returns `None` when no eligible edge exists or the eligible
/// weights sum to zero; the PRNG is consumed only on a successful
/// selection.
pub fn choose_edge(
    graph: &ModelGraph,
    rng: &mut ModelRng,
    from: VertexId,
    kind: EdgeKind,
) -> Option<(EdgeId, VertexId)> {
    let mut total_weight = 0.0;
    let mut eligible = 0usize;

    for edge_id in graph.outgoing(from) {
        let edge = graph.edge(edge_id);
        if edge.class.kind() == kind {
            eligible += 1;
            total_weight += edge.weight;
        }
    }

    debug!(
        vertex = %graph.vertex(from).name,
        kind = %kind,
        eligible,
        total_weight,
        "summed outgoing edge weights"
    );

    if eligible == 0 || total_weight <= 0.0 {
        return None;
    }

    let draw = rng.draw_uniform(0.0, total_weight);
    debug!(draw, total_weight, "drew selection value");

    let mut cumulative = 0.0;
    for edge_id in graph.outgoing(from) {
        let edge = graph.edge(edge_id);
        if edge.class.kind() != kind {
            continue;
        }
        cumulative += edge.weight;
        if cumulative >= draw {
            return Some((edge_id, edge.to));
        }
    }

    // The final running total equals `total_weight`, which exceeds
    // every possible draw.
    None
}
