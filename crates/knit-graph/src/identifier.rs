//! Node identities.
//!
//! Every node in a lineage or dependency graph is identified by its variant
//! together with the natural key of the entity it stands for:
//!
//! - Data by knit id
//! - Run by run id
//! - Plan by plan id
//! - Port by the owning plan id and its mount path (or the log slot)
//!
//! Two nodes with the same [`NodeId`] are the same node; the graph model relies
//! on this to deduplicate discoveries.

use std::fmt;

use serde::{Serialize, Serializer};

/// The slot a port occupies on its plan.
///
/// Input and output ports are keyed by mount path; a plan has at most one log
/// port, which has no path of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortKey {
    Path(String),
    Log,
}

impl PortKey {
    /// Creates a path key.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Log => f.write_str("log"),
        }
    }
}

/// Identity of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Data(String),
    Run(String),
    Plan(String),
    Port { plan_id: String, key: PortKey },
}

impl NodeId {
    /// Identity of the Data item with the given knit id.
    pub fn data(knit_id: impl Into<String>) -> Self {
        Self::Data(knit_id.into())
    }

    /// Identity of the Run with the given run id.
    pub fn run(run_id: impl Into<String>) -> Self {
        Self::Run(run_id.into())
    }

    /// Identity of the Plan with the given plan id.
    pub fn plan(plan_id: impl Into<String>) -> Self {
        Self::Plan(plan_id.into())
    }

    /// Identity of a port on the given plan.
    pub fn port(plan_id: impl Into<String>, key: PortKey) -> Self {
        Self::Port {
            plan_id: plan_id.into(),
            key,
        }
    }

    /// Returns the plan this node belongs to, if it is a plan or one of its ports.
    pub fn plan_id(&self) -> Option<&str> {
        match self {
            Self::Plan(plan_id) | Self::Port { plan_id, .. } => Some(plan_id),
            Self::Data(_) | Self::Run(_) => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(knit_id) => write!(f, "data:{knit_id}"),
            Self::Run(run_id) => write!(f, "run:{run_id}"),
            Self::Plan(plan_id) => write!(f, "plan:{plan_id}"),
            Self::Port { plan_id, key } => write!(f, "port:{plan_id}:{key}"),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
