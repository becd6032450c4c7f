//! Horizontal coordinate assignment
//!
//! Layers start packed left to right. Each alignment sweep then moves every
//! vertex towards the weighted mean x of its neighbours in the adjacent layer,
//! solved per layer as an isotonic regression over gap-adjusted offsets so
//! that the layer order and the minimum gaps are kept.

use super::layered::{LayeredGraph, Neighbour};

/// Pull of a vertex without neighbours towards its current x.
const ANCHOR_WEIGHT: f32 = 0.1;

/// Returns the center x of every vertex.
///
/// Neighbouring vertices of a layer are at least `spacing` apart, edge to
/// edge. The leftmost real vertex edge is at x = 0.
pub(super) fn assign(graph: &LayeredGraph, spacing: f32, passes: usize) -> Vec<f32> {
    let mut xs = vec![0.0; graph.vertex_count()];
    for layer in &graph.layers {
        let gaps = gaps(layer, &graph.widths, spacing);
        let mut x = layer.first().map_or(0.0, |&first| graph.widths[first] / 2.0);
        for (i, &vertex) in layer.iter().enumerate() {
            if i > 0 {
                x += gaps[i - 1];
            }
            xs[vertex] = x;
        }
    }

    for pass in 0..passes {
        let neighbours = if pass % 2 == 0 {
            &graph.upper
        } else {
            &graph.lower
        };
        for layer in &graph.layers {
            align(layer, neighbours, &graph.widths, spacing, &mut xs);
        }
    }

    let left = graph
        .layers
        .iter()
        .flatten()
        .filter(|&&vertex| graph.is_real(vertex))
        .map(|&vertex| xs[vertex] - graph.widths[vertex] / 2.0)
        .reduce(f32::min)
        .unwrap_or(0.0);
    for x in &mut xs {
        *x -= left;
    }
    xs
}

/// Minimum center distance between each vertex and its right neighbour.
fn gaps(layer: &[usize], widths: &[f32], spacing: f32) -> Vec<f32> {
    layer
        .windows(2)
        .map(|pair| (widths[pair[0]] + widths[pair[1]]) / 2.0 + spacing)
        .collect()
}

fn align(
    layer: &[usize],
    neighbours: &[Vec<Neighbour>],
    widths: &[f32],
    spacing: f32,
    xs: &mut [f32],
) {
    if layer.is_empty() {
        return;
    }
    let gaps = gaps(layer, widths, spacing);

    // Offsets: x_i = y_i + sum(gaps[..i]). The gap constraints on x become
    // y_i <= y_{i+1}.
    let mut offset = 0.0;
    let mut targets = Vec::with_capacity(layer.len());
    let mut weights = Vec::with_capacity(layer.len());
    for (i, &vertex) in layer.iter().enumerate() {
        if i > 0 {
            offset += gaps[i - 1];
        }
        let (target, weight) =
            pull(&neighbours[vertex], xs).unwrap_or((xs[vertex], ANCHOR_WEIGHT));
        targets.push(target - offset);
        weights.push(weight);
    }

    let solved = isotonic(&targets, &weights);

    let mut offset = 0.0;
    for (i, &vertex) in layer.iter().enumerate() {
        if i > 0 {
            offset += gaps[i - 1];
        }
        xs[vertex] = solved[i] + offset;
    }
}

/// Weighted mean x of the neighbours and the total weight.
fn pull(neighbours: &[Neighbour], xs: &[f32]) -> Option<(f32, f32)> {
    let (sum, total) = neighbours
        .iter()
        .fold((0.0, 0.0), |(sum, total), &(vertex, weight)| {
            (sum + xs[vertex] * weight, total + weight)
        });
    (total > 0.0).then(|| (sum / total, total))
}

/// Weighted least-squares fit of a non-decreasing sequence (pool adjacent
/// violators).
fn isotonic(values: &[f32], weights: &[f32]) -> Vec<f32> {
    struct Block {
        value: f32,
        weight: f32,
        len: usize,
    }

    let mut blocks: Vec<Block> = Vec::with_capacity(values.len());
    for (&value, &weight) in values.iter().zip(weights) {
        blocks.push(Block {
            value,
            weight,
            len: 1,
        });
        while blocks.len() >= 2 && blocks[blocks.len() - 2].value > blocks[blocks.len() - 1].value
        {
            let Some(last) = blocks.pop() else { break };
            let Some(prev) = blocks.last_mut() else { break };
            let weight = prev.weight + last.weight;
            prev.value = (prev.value * prev.weight + last.value * last.weight) / weight;
            prev.weight = weight;
            prev.len += last.len;
        }
    }

    blocks
        .into_iter()
        .flat_map(|block| std::iter::repeat_n(block.value, block.len))
        .collect()
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_isotonic_keeps_sorted_input() {
        assert_eq!(isotonic(&[1.0, 2.0, 3.0], &[1.0; 3]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_isotonic_pools_violators() {
        let fitted = isotonic(&[3.0, 1.0, 5.0], &[1.0, 3.0, 1.0]);

        assert_approx_eq!(f32, fitted[0], 1.5);
        assert_approx_eq!(f32, fitted[1], 1.5);
        assert_approx_eq!(f32, fitted[2], 5.0);
    }

    #[test]
    fn test_initial_packing() {
        let graph = LayeredGraph::new(&[0, 0, 0], &[100.0, 50.0, 10.0], &[]);

        let xs = assign(&graph, 20.0, 0);

        assert_approx_eq!(f32, xs[0], 50.0);
        assert_approx_eq!(f32, xs[1], 50.0 + 75.0 + 20.0);
        assert_approx_eq!(f32, xs[2], 145.0 + 30.0 + 20.0);
    }

    #[test]
    fn test_child_centered_under_parent() {
        // A wide parent above one narrow child.
        let graph = LayeredGraph::new(&[0, 1], &[300.0, 100.0], &[(0, 1, 1.0)]);

        let xs = assign(&graph, 50.0, 4);

        assert_approx_eq!(f32, xs[0], xs[1], epsilon = 0.01);
    }

    #[test]
    fn test_gaps_respected_after_alignment() {
        // Two children pulled towards the same parent.
        let widths = [100.0, 80.0, 80.0];
        let graph = LayeredGraph::new(&[0, 1, 1], &widths, &[(0, 1, 1.0), (0, 2, 1.0)]);

        let xs = assign(&graph, 50.0, 4);

        let gap = (xs[2] - widths[2] / 2.0) - (xs[1] + widths[1] / 2.0);
        assert!(gap >= 50.0 - 1e-3, "gap {gap}");
        assert_approx_eq!(f32, xs[0], (xs[1] + xs[2]) / 2.0, epsilon = 0.01);
    }
}
