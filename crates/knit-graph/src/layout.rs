//! Layered layout of lineage and dependency graphs.
//!
//! [`Engine::layout`] is a pure function of its inputs. It places every node
//! on an integer layer so that edge targets sit below their sources, orders
//! each layer to reduce crossings, and packs nodes horizontally by their own
//! widths. Layers are stacked top to bottom with a separation derived from
//! the smallest node height, so the drawing tightens once real sizes are
//! known.
//!
//! Disconnected parts of the graph are laid out independently and placed side
//! by side, in the order their first node appears in the input.
//!
//! # Malformed input
//!
//! Layout never fails. Edges naming an unknown node are dropped and reported
//! in [`Layout::skipped_edges`]; self-loops are ignored; a repeated node id
//! keeps its first occurrence.

mod layered;
mod order;
mod position;
mod rank;

use std::{collections::HashMap, fmt, hash::Hash};

use log::{debug, trace, warn};
use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::{
    config::LayoutConfig,
    geometry::{Point, Size, SizeHint},
};
use layered::LayeredGraph;
use rank::RankEdge;

/// Weight of an edge that does not carry one.
pub const DEFAULT_EDGE_WEIGHT: f32 = 1.0;

/// A node to lay out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode<K> {
    pub id: K,
    pub size: SizeHint,
}

impl<K> LayoutNode<K> {
    pub fn new(id: K, size: SizeHint) -> Self {
        Self { id, size }
    }
}

/// A directed edge to lay out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge<K> {
    pub source: K,
    pub target: K,
    /// Higher weights keep the endpoints closer to vertical alignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

impl<K> LayoutEdge<K> {
    pub fn new(source: K, target: K, weight: Option<f32>) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }

    /// The weight used by the layout. Missing, non-positive and non-finite
    /// weights count as [`DEFAULT_EDGE_WEIGHT`].
    pub fn effective_weight(&self) -> f32 {
        self.weight
            .filter(|weight| weight.is_finite() && *weight > 0.0)
            .unwrap_or(DEFAULT_EDGE_WEIGHT)
    }
}

/// Why an edge was left out of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidEdgeReason {
    UnknownSource,
    UnknownTarget,
    UnknownEndpoints,
}

impl fmt::Display for InvalidEdgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSource => f.write_str("unknown source"),
            Self::UnknownTarget => f.write_str("unknown target"),
            Self::UnknownEndpoints => f.write_str("unknown source and target"),
        }
    }
}

/// An edge dropped because it references a node that is not part of the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidEdge<K> {
    edge: LayoutEdge<K>,
    reason: InvalidEdgeReason,
}

impl<K> InvalidEdge<K> {
    pub fn edge(&self) -> &LayoutEdge<K> {
        &self.edge
    }

    pub fn reason(&self) -> InvalidEdgeReason {
        self.reason
    }
}

/// Where a node ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement<K> {
    id: K,
    /// Top-left corner of the node box.
    position: Point,
    size: Size,
    layer: usize,
}

impl<K> Placement<K> {
    pub fn id(&self) -> &K {
        &self.id
    }

    /// Returns the top-left corner of the node box
    pub fn position(&self) -> Point {
        self.position
    }

    /// Returns the size the node was laid out with
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Returns the center of the node box
    pub fn center(&self) -> Point {
        self.position.add_point(Point::new(
            self.size.width() / 2.0,
            self.size.height() / 2.0,
        ))
    }
}

/// Result of a layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout<K> {
    placements: Vec<Placement<K>>,
    skipped_edges: Vec<InvalidEdge<K>>,
    bounds: Size,
}

impl<K> Layout<K> {
    /// Placements in input node order.
    pub fn placements(&self) -> &[Placement<K>] {
        &self.placements
    }

    pub fn skipped_edges(&self) -> &[InvalidEdge<K>] {
        &self.skipped_edges
    }

    /// Size of the box enclosing every node, anchored at the origin.
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

impl<K: PartialEq> Layout<K> {
    pub fn placement(&self, id: &K) -> Option<&Placement<K>> {
        self.placements.iter().find(|placement| &placement.id == id)
    }
}

/// The layered layout engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: LayoutConfig,
}

impl Engine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Computes a position for every node.
    ///
    /// # Arguments
    ///
    /// * `nodes` - Nodes with whatever size hints are known. Missing
    ///   dimensions fall back to the configured default size.
    /// * `edges` - Directed edges between those nodes, with optional weights.
    ///
    /// # Returns
    ///
    /// A [`Layout`] with one placement per distinct node id, in input order.
    pub fn layout<K>(&self, nodes: &[LayoutNode<K>], edges: &[LayoutEdge<K>]) -> Layout<K>
    where
        K: Clone + Eq + Hash + fmt::Debug,
    {
        let default_size = self.config.default_size();

        let mut index: HashMap<&K, usize> = HashMap::with_capacity(nodes.len());
        let mut unique: Vec<&LayoutNode<K>> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                debug!(node:? = node.id; "Ignoring repeated layout node");
                continue;
            }
            index.insert(&node.id, unique.len());
            unique.push(node);
        }
        let sizes: Vec<Size> = unique
            .iter()
            .map(|node| node.size.resolve(default_size))
            .collect();

        let mut valid: Vec<RankEdge> = Vec::with_capacity(edges.len());
        let mut skipped_edges = Vec::new();
        for edge in edges {
            match (index.get(&edge.source), index.get(&edge.target)) {
                (Some(source), Some(target)) if source == target => {
                    trace!(node:? = edge.source; "Ignoring self-loop");
                }
                (Some(&source), Some(&target)) => {
                    valid.push((source, target, edge.effective_weight()));
                }
                (source, target) => {
                    let reason = match (source, target) {
                        (None, None) => InvalidEdgeReason::UnknownEndpoints,
                        (None, Some(_)) => InvalidEdgeReason::UnknownSource,
                        _ => InvalidEdgeReason::UnknownTarget,
                    };
                    warn!(
                        source:? = edge.source,
                        target:? = edge.target,
                        reason:% = reason;
                        "Dropping edge with unknown endpoint",
                    );
                    skipped_edges.push(InvalidEdge {
                        edge: edge.clone(),
                        reason,
                    });
                }
            }
        }

        let (components, local_index) = components(unique.len(), &valid);
        let mut component_edges: Vec<Vec<RankEdge>> = vec![Vec::new(); components.len()];
        for &(source, target, weight) in &valid {
            let (component, local_source) = local_index[source];
            let (_, local_target) = local_index[target];
            component_edges[component].push((local_source, local_target, weight));
        }

        let mut layers = vec![0; unique.len()];
        let mut xs = vec![0.0; unique.len()];
        let mut cursor = 0.0;
        for (members, edges) in components.iter().zip(&component_edges) {
            let ranks = rank::assign(members.len(), edges);
            let widths: Vec<f32> = members.iter().map(|&node| sizes[node].width()).collect();

            let mut graph = LayeredGraph::new(&ranks, &widths, edges);
            order::arrange(&mut graph, self.config.ordering_passes());
            let local_xs = position::assign(
                &graph,
                self.config.node_spacing(),
                self.config.alignment_passes(),
            );

            let mut right: f32 = 0.0;
            for (local, &node) in members.iter().enumerate() {
                layers[node] = ranks[local];
                xs[node] = cursor + local_xs[local];
                right = right.max(local_xs[local] + widths[local] / 2.0);
            }
            cursor += right + self.config.component_spacing();
        }

        let layer_count = layers.iter().max().map_or(0, |max| max + 1);
        let mut layer_heights = vec![0.0_f32; layer_count];
        for (node, &layer) in layers.iter().enumerate() {
            layer_heights[layer] = layer_heights[layer].max(sizes[node].height());
        }

        let separation = self.rank_separation(&sizes);
        let mut centers = Vec::with_capacity(layer_count);
        let mut top = 0.0;
        for height in &layer_heights {
            centers.push(top + height / 2.0);
            top += height + separation;
        }

        let mut bounds = Size::default();
        let placements: Vec<Placement<K>> = unique
            .iter()
            .enumerate()
            .map(|(node, layout_node)| {
                let size = sizes[node];
                let layer = layers[node];
                let position = Point::new(
                    xs[node] - size.width() / 2.0,
                    centers[layer] - size.height() / 2.0,
                );
                bounds = bounds.max(Size::new(
                    position.x() + size.width(),
                    position.y() + size.height(),
                ));
                Placement {
                    id: layout_node.id.clone(),
                    position,
                    size,
                    layer,
                }
            })
            .collect();

        debug!(
            nodes_len = placements.len(),
            edges_len = valid.len(),
            skipped_edges_len = skipped_edges.len(),
            components_len = components.len(),
            layers_len = layer_count,
            separation;
            "Layout computed",
        );

        Layout {
            placements,
            skipped_edges,
            bounds,
        }
    }

    /// Vertical gap between layers: a fraction of the smallest node height,
    /// never more than that fraction of the default height.
    fn rank_separation(&self, sizes: &[Size]) -> f32 {
        let min_height = sizes
            .iter()
            .map(|size| size.height())
            .fold(self.config.default_height(), f32::min);
        min_height * self.config.rank_separation_ratio()
    }
}

/// Lays out a graph with the default configuration.
///
/// See [`Engine::layout`].
pub fn layout_edges<K>(nodes: &[LayoutNode<K>], edges: &[LayoutEdge<K>]) -> Layout<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    Engine::default().layout(nodes, edges)
}

/// Groups nodes into weakly connected components.
///
/// Components are ordered by their first node and list their nodes in
/// ascending order. Also returns, per node, its component and its index
/// within that component.
fn components(node_count: usize, edges: &[RankEdge]) -> (Vec<Vec<usize>>, Vec<(usize, usize)>) {
    let mut sets = UnionFind::<usize>::new(node_count);
    for &(source, target, _) in edges {
        sets.union(source, target);
    }

    let mut slots: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut local_index = Vec::with_capacity(node_count);
    for node in 0..node_count {
        let slot = *slots.entry(sets.find(node)).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        local_index.push((slot, components[slot].len()));
        components[slot].push(node);
    }
    (components, local_index)
}
