//! The proper layered graph the ordering and positioning passes work on.
//!
//! Edges spanning more than one layer are split by dummy vertices, so every
//! segment connects two adjacent layers. Real vertices keep their
//! component-local node index; dummies are numbered after them.

use indexmap::IndexMap;

use super::rank::RankEdge;

/// A segment end: the neighbouring vertex and the segment weight.
pub(super) type Neighbour = (usize, f32);

#[derive(Debug, Clone)]
pub(super) struct LayeredGraph {
    /// Vertex ids per layer, left to right.
    pub(super) layers: Vec<Vec<usize>>,
    /// Width of every vertex. Dummies are zero wide.
    pub(super) widths: Vec<f32>,
    /// Layer of every vertex.
    pub(super) ranks: Vec<usize>,
    /// Neighbours in the layer above.
    pub(super) upper: Vec<Vec<Neighbour>>,
    /// Neighbours in the layer below.
    pub(super) lower: Vec<Vec<Neighbour>>,
    real_count: usize,
}

impl LayeredGraph {
    /// Builds the layered graph for real vertices with the given ranks and widths.
    ///
    /// Edges are oriented from the lower to the higher rank; parallel edges
    /// between the same pair are merged and their weights summed. Edges whose
    /// endpoints share a rank are ignored.
    pub(super) fn new(ranks: &[usize], widths: &[f32], edges: &[RankEdge]) -> Self {
        let real_count = ranks.len();
        let mut graph = Self {
            layers: Vec::new(),
            widths: widths.to_vec(),
            ranks: ranks.to_vec(),
            upper: vec![Vec::new(); real_count],
            lower: vec![Vec::new(); real_count],
            real_count,
        };

        let mut merged: IndexMap<(usize, usize), f32> = IndexMap::new();
        for &(source, target, weight) in edges {
            let pair = match ranks[source].cmp(&ranks[target]) {
                std::cmp::Ordering::Less => (source, target),
                std::cmp::Ordering::Greater => (target, source),
                std::cmp::Ordering::Equal => continue,
            };
            *merged.entry(pair).or_insert(0.0) += weight;
        }

        for ((top, bottom), weight) in merged {
            let mut previous = top;
            for rank in ranks[top] + 1..ranks[bottom] {
                let dummy = graph.push_dummy(rank);
                graph.link(previous, dummy, weight);
                previous = dummy;
            }
            graph.link(previous, bottom, weight);
        }

        let layer_count = graph.ranks.iter().max().map_or(0, |max| max + 1);
        graph.layers = vec![Vec::new(); layer_count];
        for (vertex, &rank) in graph.ranks.iter().enumerate() {
            graph.layers[rank].push(vertex);
        }
        graph
    }

    pub(super) fn vertex_count(&self) -> usize {
        self.ranks.len()
    }

    pub(super) fn is_real(&self, vertex: usize) -> bool {
        vertex < self.real_count
    }

    fn push_dummy(&mut self, rank: usize) -> usize {
        self.widths.push(0.0);
        self.ranks.push(rank);
        self.upper.push(Vec::new());
        self.lower.push(Vec::new());
        self.ranks.len() - 1
    }

    fn link(&mut self, top: usize, bottom: usize, weight: f32) {
        self.lower[top].push((bottom, weight));
        self.upper[bottom].push((top, weight));
    }
}
