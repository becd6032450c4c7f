//! The deduplicating graph accumulator and its frozen snapshot.
//!
//! [`GraphModel`] is append-only and owned by a single traversal run. Both
//! `add_node` and `add_edge` are idempotent by identity: a second discovery of
//! the same node keeps the first detail, a second discovery of the same edge
//! keeps the first label. Insertion order is preserved for both.
//!
//! Once the traversal finishes, [`GraphModel::freeze`] turns the model into an
//! immutable [`GraphSnapshot`].

use std::collections::HashMap;

use indexmap::IndexMap;
use log::trace;

use super::{Edge, EdgeKey, Node};
use crate::{
    geometry::SizeHint,
    identifier::NodeId,
    layout::{LayoutEdge, LayoutNode},
};

/// Append-only collection of discovered nodes and edges.
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node unless one with the same identity already exists.
    ///
    /// Returns `true` if the node was inserted.
    pub fn add_node(&mut self, node: Node) -> bool {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            trace!(node:% = id; "Node already recorded");
            return false;
        }
        self.nodes.insert(id, node);
        true
    }

    /// Records an edge unless one with the same identity already exists.
    ///
    /// Returns `true` if the edge was inserted.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let key = edge.key();
        if self.edges.contains_key(&key) {
            return false;
        }
        trace!(
            kind:% = edge.kind(),
            source:% = edge.source(),
            target:% = edge.target();
            "Edge recorded",
        );
        self.edges.insert(key, edge);
        true
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Ends accumulation.
    pub fn freeze(self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes,
            edges: self.edges.into_values().collect(),
        }
    }
}

/// Immutable result of one traversal run.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: IndexMap<NodeId, Node>,
    edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Edges in discovery order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs that have no inputs, i.e. where lineages begin.
    pub fn origin_runs(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().filter_map(|(id, node)| match node {
            Node::Run(run) if run.is_origin() => Some(id),
            _ => None,
        })
    }

    /// A plan node together with its port nodes, for hover highlighting.
    pub fn nodes_of_plan<'a>(&'a self, plan_id: &'a str) -> impl Iterator<Item = &'a NodeId> {
        self.nodes
            .keys()
            .filter(move |id| id.plan_id() == Some(plan_id))
    }

    /// Layout input for every node, with the given size hints applied.
    pub fn layout_nodes(&self, hints: &HashMap<NodeId, SizeHint>) -> Vec<LayoutNode<NodeId>> {
        self.nodes
            .keys()
            .map(|id| LayoutNode::new(id.clone(), hints.get(id).copied().unwrap_or_default()))
            .collect()
    }

    /// Layout input for every edge.
    pub fn layout_edges(&self) -> Vec<LayoutEdge<NodeId>> {
        self.edges
            .iter()
            .map(|edge| LayoutEdge::new(edge.source().clone(), edge.target().clone(), edge.weight()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::{DataDetail, Tag};

    fn data(knit_id: &str, tag: &str) -> Node {
        Node::Data(DataDetail {
            knit_id: knit_id.to_string(),
            tags: vec![Tag::new("name", tag)],
            upstream: None,
            downstreams: vec![],
            nomination: vec![],
        })
    }

    #[test]
    fn test_model_new() {
        let model = GraphModel::new();

        assert_eq!(model.node_count(), 0);
        assert_eq!(model.edge_count(), 0);
        assert!(model.freeze().is_empty());
    }

    #[test]
    fn test_first_seen_detail_wins() {
        let mut model = GraphModel::new();

        assert!(model.add_node(data("d1", "first")));
        assert!(!model.add_node(data("d1", "second")));

        let snapshot = model.freeze();
        assert_eq!(snapshot.node_count(), 1);
        match snapshot.node(&NodeId::data("d1")) {
            Some(Node::Data(detail)) => assert_eq!(detail.tags[0].value(), "first"),
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_edges_deduplicated_by_identity() {
        let mut model = GraphModel::new();
        model.add_node(data("d1", "x"));

        assert!(model.add_edge(Edge::produced_as_output("r1", "d1", "/out")));
        assert!(!model.add_edge(Edge::produced_as_output("r1", "d1", "/again")));
        assert!(model.add_edge(Edge::produced_as_log("r1", "d1")));

        let snapshot = model.freeze();
        assert_eq!(snapshot.edge_count(), 2);
        assert_eq!(snapshot.edges()[0].label(), "/out");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut model = GraphModel::new();
        for id in ["c", "a", "b"] {
            model.add_node(data(id, id));
        }
        model.add_node(data("a", "dup"));

        let order: Vec<String> = model
            .freeze()
            .nodes()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(order, vec!["data:c", "data:a", "data:b"]);
    }

    #[test]
    fn test_layout_input_applies_hints() {
        let mut model = GraphModel::new();
        model.add_node(data("d1", "x"));
        model.add_node(data("d2", "y"));
        model.add_edge(Edge::consumed_as_input("d1", "r1", "/in"));
        let snapshot = model.freeze();

        let mut hints = HashMap::new();
        hints.insert(NodeId::data("d2"), SizeHint::new(80.0, 20.0));

        let nodes = snapshot.layout_nodes(&hints);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].size, SizeHint::default());
        assert_eq!(nodes[1].size, SizeHint::new(80.0, 20.0));

        let edges = snapshot.layout_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, NodeId::data("d1"));
        assert_eq!(edges[0].target, NodeId::run("r1"));
    }
}
