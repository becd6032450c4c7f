//! Crossing reduction
//!
//! Layers are reordered by the weighted barycenter of each vertex's neighbours
//! in the adjacent layer, sweeping down and up alternately. The ordering with
//! the fewest weighted crossings seen is kept.

use log::trace;

use super::layered::{LayeredGraph, Neighbour};

/// Reorders the layers of `graph` in place using `passes` sweeps.
pub(super) fn arrange(graph: &mut LayeredGraph, passes: usize) {
    if graph.layers.len() < 2 {
        return;
    }

    let mut best = graph.layers.clone();
    let mut best_crossings = crossings(graph);

    for pass in 0..passes {
        if best_crossings == 0.0 {
            break;
        }
        let mut positions = positions(graph);
        if pass % 2 == 0 {
            for rank in 1..graph.layers.len() {
                reorder(&mut graph.layers[rank], &graph.upper, &mut positions);
            }
        } else {
            for rank in (0..graph.layers.len() - 1).rev() {
                reorder(&mut graph.layers[rank], &graph.lower, &mut positions);
            }
        }

        let current = crossings(graph);
        trace!(pass, crossings = current; "Ordering sweep");
        if current < best_crossings {
            best_crossings = current;
            best = graph.layers.clone();
        }
    }

    graph.layers = best;
}

/// Weighted number of segment crossings over all adjacent layer pairs.
pub(super) fn crossings(graph: &LayeredGraph) -> f32 {
    let positions = positions(graph);
    let mut total = 0.0;

    for layer in &graph.layers {
        let segments: Vec<(usize, usize, f32)> = layer
            .iter()
            .flat_map(|&top| {
                graph.lower[top]
                    .iter()
                    .map(move |&(bottom, weight)| (top, bottom, weight))
            })
            .map(|(top, bottom, weight)| (positions[top], positions[bottom], weight))
            .collect();

        for (i, &(top_a, bottom_a, weight_a)) in segments.iter().enumerate() {
            for &(top_b, bottom_b, weight_b) in &segments[i + 1..] {
                let crossed = (top_a < top_b && bottom_a > bottom_b)
                    || (top_a > top_b && bottom_a < bottom_b);
                if crossed {
                    total += weight_a * weight_b;
                }
            }
        }
    }
    total
}

/// Position of every vertex within its layer.
fn positions(graph: &LayeredGraph) -> Vec<usize> {
    let mut positions = vec![0; graph.vertex_count()];
    for layer in &graph.layers {
        for (position, &vertex) in layer.iter().enumerate() {
            positions[vertex] = position;
        }
    }
    positions
}

fn reorder(layer: &mut [usize], neighbours: &[Vec<Neighbour>], positions: &mut [usize]) {
    // Vertices without neighbours stay where they are.
    let mut sorted: Vec<(usize, f32)> = layer
        .iter()
        .map(|&vertex| {
            let key = barycenter(&neighbours[vertex], positions)
                .unwrap_or(positions[vertex] as f32);
            (vertex, key)
        })
        .collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (position, (vertex, _)) in sorted.into_iter().enumerate() {
        layer[position] = vertex;
        positions[vertex] = position;
    }
}

fn barycenter(neighbours: &[Neighbour], positions: &[usize]) -> Option<f32> {
    let (sum, total_weight) = neighbours
        .iter()
        .fold((0.0, 0.0), |(sum, total), &(vertex, weight)| {
            (sum + positions[vertex] as f32 * weight, total + weight)
        });
    (total_weight > 0.0).then(|| sum / total_weight)
}
