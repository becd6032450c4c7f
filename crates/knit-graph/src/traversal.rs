//! Discovery of the subgraph reachable from one or more roots.
//!
//! A [`Traverser`] owns everything one traversal run needs: the catalog it
//! reads from, a visited set keyed by [`NodeId`], the [`GraphModel`] it fills,
//! and the [`EpochGuard`] that tells it whether its results are still wanted.
//!
//! Expansion is done by mutually recursive visit procedures, lineage
//! ([`Traverser::visit_data`] / [`Traverser::visit_run`]) and dependency
//! ([`Traverser::visit_plan`]). A node is marked visited before it is fetched,
//! so a relationship cycle ends at the second visit and no entity is ever
//! fetched twice in one run. Any failed fetch aborts the run and drops what
//! was gathered so far.

mod dependency;
mod epoch;
mod lineage;

use std::{collections::HashSet, num::NonZeroUsize};

use log::{debug, info};
use serde::Deserialize;

use crate::{
    catalog::Catalog,
    error::GraphError,
    graph::{Edge, GraphModel, GraphSnapshot, Node},
    identifier::NodeId,
};

pub use epoch::{Epoch, EpochCounter, EpochGuard};

/// Where a traversal starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootRef {
    Data(String),
    Run(String),
    Plan(String),
}

impl RootRef {
    pub fn node_id(&self) -> NodeId {
        match self {
            Self::Data(knit_id) => NodeId::data(knit_id.clone()),
            Self::Run(run_id) => NodeId::run(run_id.clone()),
            Self::Plan(plan_id) => NodeId::plan(plan_id.clone()),
        }
    }
}

/// Which relationships a traversal follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards producers: data to its producing run, runs to their inputs,
    /// plan inputs to their upstream plans.
    Upstream,
    /// Towards consumers: data to consuming runs, runs to their outputs and
    /// log, plan outputs to their downstream plans.
    Downstream,
    /// Every relationship.
    #[default]
    Both,
}

impl Direction {
    pub fn follows_upstream(self) -> bool {
        matches!(self, Self::Upstream | Self::Both)
    }

    pub fn follows_downstream(self) -> bool {
        matches!(self, Self::Downstream | Self::Both)
    }
}

/// Options of a traversal run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TraversalOptions {
    direction: Direction,

    /// Maximum number of hops into Runs (lineage) or Plans (dependency).
    /// `None` traverses without limit.
    max_depth: Option<NonZeroUsize>,
}

impl TraversalOptions {
    pub fn new(direction: Direction, max_depth: Option<NonZeroUsize>) -> Self {
        Self {
            direction,
            max_depth,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn max_depth(&self) -> Option<NonZeroUsize> {
        self.max_depth
    }

    /// Whether an entity at `depth` may hop to the next Run or Plan.
    fn may_hop(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max.get())
    }
}

/// State of a single traversal run.
pub struct Traverser<'c> {
    catalog: &'c dyn Catalog,
    options: TraversalOptions,
    guard: EpochGuard,
    visited: HashSet<NodeId>,
    model: GraphModel,
}

impl<'c> Traverser<'c> {
    pub fn new(catalog: &'c dyn Catalog, options: TraversalOptions, guard: EpochGuard) -> Self {
        Self {
            catalog,
            options,
            guard,
            visited: HashSet::new(),
            model: GraphModel::new(),
        }
    }

    /// Walks outward from every root and freezes what was found.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure, or [`GraphError::Superseded`] if the
    /// run's epoch went stale before it finished.
    pub async fn run(mut self, roots: &[RootRef]) -> Result<GraphSnapshot, GraphError> {
        info!(
            roots_len = roots.len(),
            epoch:% = self.guard.epoch();
            "Starting traversal",
        );

        for root in roots {
            match root {
                RootRef::Data(knit_id) => self.visit_data(knit_id, 0).await?,
                RootRef::Run(run_id) => self.visit_run(run_id, 0).await?,
                RootRef::Plan(plan_id) => self.visit_plan(plan_id, 0).await?,
            }
        }
        self.guard.check()?;

        let snapshot = self.model.freeze();
        info!(
            nodes_count = snapshot.node_count(),
            edges_count = snapshot.edge_count();
            "Traversal finished",
        );
        Ok(snapshot)
    }

    /// Marks a node visited; returns `false` if it already was.
    fn enter(&mut self, id: NodeId) -> bool {
        self.visited.insert(id)
    }

    /// An edge to `neighbour` belongs in the graph if the neighbour is
    /// already part of it or is about to be visited.
    fn connects(&self, neighbour: &NodeId, follow: bool) -> bool {
        follow || self.visited.contains(neighbour)
    }

    fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        self.guard.check()?;
        self.model.add_node(node);
        Ok(())
    }

    fn add_edges(&mut self, edges: Vec<Edge>) -> Result<(), GraphError> {
        for edge in edges {
            self.guard.check()?;
            self.model.add_edge(edge);
        }
        Ok(())
    }
}

/// Runs a standalone traversal that cannot be superseded.
pub async fn traverse(
    catalog: &dyn Catalog,
    roots: &[RootRef],
    options: TraversalOptions,
) -> Result<GraphSnapshot, GraphError> {
    let counter = EpochCounter::new();
    counter.advance();
    debug!("Running unguarded traversal");
    Traverser::new(catalog, options, counter.guard())
        .run(roots)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_flags() {
        assert!(Direction::Both.follows_upstream());
        assert!(Direction::Both.follows_downstream());
        assert!(Direction::Upstream.follows_upstream());
        assert!(!Direction::Upstream.follows_downstream());
        assert!(!Direction::Downstream.follows_upstream());
    }

    #[test]
    fn test_may_hop() {
        let unbounded = TraversalOptions::default();
        assert!(unbounded.may_hop(1_000));

        let one = TraversalOptions::new(Direction::Both, NonZeroUsize::new(1));
        assert!(one.may_hop(0));
        assert!(!one.may_hop(1));
    }

    #[test]
    fn test_root_node_ids() {
        assert_eq!(RootRef::Data("d".into()).node_id(), NodeId::data("d"));
        assert_eq!(RootRef::Run("r".into()).node_id(), NodeId::run("r"));
        assert_eq!(RootRef::Plan("p".into()).node_id(), NodeId::plan("p"));
    }
}
