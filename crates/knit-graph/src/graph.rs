//! Graph nodes and edges.
//!
//! Nodes are a sum type over the four entity variants, each carrying the full
//! detail record it was discovered with. Edges are a projection of the
//! relationships found in those records; their identity is
//! `(kind, source, target)`.

mod model;

use std::fmt;

use serde::Serialize;

use crate::{
    detail::{DataDetail, Input, Log, Output, PlanDetail, RunDetail},
    identifier::{NodeId, PortKey},
};

pub use model::{GraphModel, GraphSnapshot};

/// Weight of an edge between a plan and one of its own ports.
pub const PLAN_PORT_WEIGHT: f32 = 10.0;

/// Weight of an edge between ports of different plans.
pub const PORT_PORT_WEIGHT: f32 = 1.0;

/// Label used for edges into a log Data item.
pub const LOG_LABEL: &str = "(log)";

/// Direction of a port relative to its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Input,
    Output,
    Log,
}

/// The record behind a port node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PortDetail {
    Input(Input),
    Output(Output),
    Log(Log),
}

/// A named port on a plan, as a node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortNode {
    plan_id: String,
    detail: PortDetail,
}

impl PortNode {
    pub fn new(plan_id: impl Into<String>, detail: PortDetail) -> Self {
        Self {
            plan_id: plan_id.into(),
            detail,
        }
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn detail(&self) -> &PortDetail {
        &self.detail
    }

    pub fn kind(&self) -> PortKind {
        match self.detail {
            PortDetail::Input(_) => PortKind::Input,
            PortDetail::Output(_) => PortKind::Output,
            PortDetail::Log(_) => PortKind::Log,
        }
    }

    pub fn key(&self) -> PortKey {
        match &self.detail {
            PortDetail::Input(input) => PortKey::path(input.mountpoint.path.clone()),
            PortDetail::Output(output) => PortKey::path(output.mountpoint.path.clone()),
            PortDetail::Log(_) => PortKey::Log,
        }
    }

    pub fn id(&self) -> NodeId {
        NodeId::port(self.plan_id.clone(), self.key())
    }
}

/// A discovered entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "lowercase")]
pub enum Node {
    Data(DataDetail),
    Run(RunDetail),
    Plan(PlanDetail),
    Port(PortNode),
}

impl Node {
    /// Identity of this node, derived from its natural key.
    pub fn id(&self) -> NodeId {
        match self {
            Self::Data(detail) => NodeId::data(detail.knit_id.clone()),
            Self::Run(detail) => NodeId::run(detail.run_id()),
            Self::Plan(detail) => NodeId::plan(detail.plan_id()),
            Self::Port(port) => port.id(),
        }
    }

    /// Short name of the variant.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Run(_) => "run",
            Self::Plan(_) => "plan",
            Self::Port(_) => "port",
        }
    }
}

/// Relationship an edge stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// data -> run
    ConsumedAsInput,
    /// run -> data
    ProducedAsOutput,
    /// run -> data
    ProducedAsLog,
    /// port -> plan
    InputToPlan,
    /// plan -> port
    OutputFromPlan,
    /// plan -> port
    LogFromPlan,
    /// port -> port
    UpstreamToDownstream,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConsumedAsInput => "consumed-as-input",
            Self::ProducedAsOutput => "produced-as-output",
            Self::ProducedAsLog => "produced-as-log",
            Self::InputToPlan => "input-to-plan",
            Self::OutputFromPlan => "output-from-plan",
            Self::LogFromPlan => "log-from-plan",
            Self::UpstreamToDownstream => "upstream-to-downstream",
        };
        f.write_str(name)
    }
}

/// Identity of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub kind: EdgeKind,
    pub source: NodeId,
    pub target: NodeId,
}

/// A directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    kind: EdgeKind,
    source: NodeId,
    target: NodeId,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f32>,
}

impl Edge {
    pub fn new(
        kind: EdgeKind,
        source: NodeId,
        target: NodeId,
        label: impl Into<String>,
        weight: Option<f32>,
    ) -> Self {
        Self {
            kind,
            source,
            target,
            label: label.into(),
            weight,
        }
    }

    /// Data item bound to a run input at `path`.
    pub fn consumed_as_input(knit_id: &str, run_id: &str, path: &str) -> Self {
        Self::new(
            EdgeKind::ConsumedAsInput,
            NodeId::data(knit_id),
            NodeId::run(run_id),
            path,
            None,
        )
    }

    /// Data item produced at run output `path`.
    pub fn produced_as_output(run_id: &str, knit_id: &str, path: &str) -> Self {
        Self::new(
            EdgeKind::ProducedAsOutput,
            NodeId::run(run_id),
            NodeId::data(knit_id),
            path,
            None,
        )
    }

    /// Data item recording a run's log.
    pub fn produced_as_log(run_id: &str, knit_id: &str) -> Self {
        Self::new(
            EdgeKind::ProducedAsLog,
            NodeId::run(run_id),
            NodeId::data(knit_id),
            LOG_LABEL,
            None,
        )
    }

    pub fn input_to_plan(plan_id: &str, path: &str) -> Self {
        Self::new(
            EdgeKind::InputToPlan,
            NodeId::port(plan_id, PortKey::path(path)),
            NodeId::plan(plan_id),
            path,
            Some(PLAN_PORT_WEIGHT),
        )
    }

    pub fn output_from_plan(plan_id: &str, path: &str) -> Self {
        Self::new(
            EdgeKind::OutputFromPlan,
            NodeId::plan(plan_id),
            NodeId::port(plan_id, PortKey::path(path)),
            path,
            Some(PLAN_PORT_WEIGHT),
        )
    }

    pub fn log_from_plan(plan_id: &str) -> Self {
        Self::new(
            EdgeKind::LogFromPlan,
            NodeId::plan(plan_id),
            NodeId::port(plan_id, PortKey::Log),
            LOG_LABEL,
            Some(PLAN_PORT_WEIGHT),
        )
    }

    /// An output or log port feeding an input port of another plan.
    pub fn upstream_to_downstream(upstream: NodeId, downstream: NodeId) -> Self {
        Self::new(
            EdgeKind::UpstreamToDownstream,
            upstream,
            downstream,
            "",
            Some(PORT_PORT_WEIGHT),
        )
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn weight(&self) -> Option<f32> {
        self.weight
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            kind: self.kind,
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::{LogPoint, Mountpoint};

    #[test]
    fn test_port_node_identity() {
        let input = PortNode::new(
            "p1",
            PortDetail::Input(Input {
                mountpoint: Mountpoint {
                    path: "/in/1".into(),
                    tags: vec![],
                },
                upstreams: vec![],
            }),
        );
        let log = PortNode::new(
            "p1",
            PortDetail::Log(Log {
                log: LogPoint::default(),
                downstreams: vec![],
            }),
        );

        assert_eq!(input.kind(), PortKind::Input);
        assert_eq!(input.id(), NodeId::port("p1", PortKey::path("/in/1")));
        assert_eq!(log.kind(), PortKind::Log);
        assert_eq!(Node::Port(log).id(), NodeId::port("p1", PortKey::Log));
    }

    #[test]
    fn test_edge_identity_ignores_label_and_weight() {
        let a = Edge::produced_as_output("r1", "d1", "/out");
        let b = Edge::new(
            EdgeKind::ProducedAsOutput,
            NodeId::run("r1"),
            NodeId::data("d1"),
            "/other",
            Some(3.0),
        );
        let c = Edge::produced_as_log("r1", "d1");

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_plan_edges_are_weighted() {
        assert_eq!(
            Edge::input_to_plan("p", "/in").weight(),
            Some(PLAN_PORT_WEIGHT)
        );
        assert_eq!(Edge::log_from_plan("p").label(), LOG_LABEL);
        assert_eq!(
            Edge::upstream_to_downstream(
                NodeId::port("a", PortKey::Log),
                NodeId::port("b", PortKey::path("/in"))
            )
            .weight(),
            Some(PORT_PORT_WEIGHT)
        );
        assert_eq!(Edge::consumed_as_input("d", "r", "/in").weight(), None);
    }

    #[test]
    fn test_edge_kind_names() {
        assert_eq!(EdgeKind::ProducedAsOutput.to_string(), "produced-as-output");
        assert_eq!(
            EdgeKind::UpstreamToDownstream.to_string(),
            "upstream-to-downstream"
        );
    }
}
