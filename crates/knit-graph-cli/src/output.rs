//! JSON document written by the tool: the graph with its final placements.

use std::collections::HashMap;

use serde::Serialize;

use knit_graph::{
    GraphSession, LayoutUpdate, NodeId,
    geometry::{Point, Size},
    graph::{Edge, Node},
    layout::InvalidEdge,
    traversal::Epoch,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedGraph {
    epoch: Epoch,
    nodes: Vec<PlacedNode>,
    edges: Vec<Edge>,
    skipped_edges: Vec<InvalidEdge<NodeId>>,
    bounds: Size,
    origin_runs: Vec<NodeId>,
}

#[derive(Debug, Serialize)]
pub struct PlacedNode {
    id: NodeId,
    node: Node,
    position: Point,
    size: Size,
    layer: usize,
}

impl PlacedGraph {
    /// Pairs every node of the displayed graph with its placement in `update`.
    ///
    /// Nodes appear in discovery order; nodes missing from the layout are left
    /// out.
    pub fn new(session: &GraphSession, update: &LayoutUpdate) -> Self {
        let layout = update.layout();
        let Some(snapshot) = session.snapshot() else {
            return Self {
                epoch: update.epoch(),
                nodes: Vec::new(),
                edges: Vec::new(),
                skipped_edges: layout.skipped_edges().to_vec(),
                bounds: layout.bounds(),
                origin_runs: Vec::new(),
            };
        };

        let placements: HashMap<&NodeId, _> = layout
            .placements()
            .iter()
            .map(|placement| (placement.id(), placement))
            .collect();
        let nodes = snapshot
            .nodes()
            .filter_map(|(id, node)| {
                placements.get(id).map(|placement| PlacedNode {
                    id: id.clone(),
                    node: node.clone(),
                    position: placement.position(),
                    size: placement.size(),
                    layer: placement.layer(),
                })
            })
            .collect();

        Self {
            epoch: update.epoch(),
            nodes,
            edges: snapshot.edges().to_vec(),
            skipped_edges: layout.skipped_edges().to_vec(),
            bounds: layout.bounds(),
            origin_runs: snapshot.origin_runs().cloned().collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use knit_graph::{RootRef, TraversalOptions, catalog::InMemoryCatalog};

    use super::*;

    #[tokio::test]
    async fn test_nodes_carry_their_placements() {
        let catalog = InMemoryCatalog::from_json_str(
            r#"{
                "data": [{
                    "knitId": "d1",
                    "upstream": {
                        "run": {"runId": "r1", "status": "done", "plan": {"planId": "p"}},
                        "mountpoint": {"path": "/out"}
                    }
                }],
                "runs": [{
                    "runId": "r1",
                    "status": "done",
                    "plan": {"planId": "p"},
                    "outputs": [{"path": "/out", "knitId": "d1"}]
                }]
            }"#,
        )
        .expect("valid fixture");
        let mut session = GraphSession::default();
        let update = session
            .build(&catalog, &[RootRef::Data("d1".into())], TraversalOptions::default())
            .await
            .expect("build succeeds");

        let placed = PlacedGraph::new(&session, &update);

        assert_eq!(placed.node_count(), 2);
        assert_eq!(placed.edge_count(), 1);
        let ids: Vec<&NodeId> = placed.nodes.iter().map(|node| &node.id).collect();
        assert_eq!(ids, vec![&NodeId::data("d1"), &NodeId::run("r1")]);
        for node in &placed.nodes {
            let placement = update.layout().placement(&node.id).expect("placed");
            assert_eq!(node.position, placement.position());
            assert_eq!(node.layer, placement.layer());
        }
        assert_eq!(placed.nodes[1].layer, 0);
        assert_eq!(placed.nodes[0].layer, 1);
    }
}
