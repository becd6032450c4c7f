//! The graph shown by one view, and its two-phase layout.
//!
//! A [`GraphSession`] owns the displayed [`GraphSnapshot`] together with the
//! size hints reported for its nodes. Building a graph is split in three
//! steps so the traversal can run without holding the session:
//!
//! 1. [`GraphSession::start`] issues a new epoch, which makes any build still
//!    in flight stale.
//! 2. [`PendingBuild::run`] traverses the catalog under that epoch.
//! 3. [`GraphSession::commit`] swaps the snapshot in, if the epoch is still
//!    current and the traversal succeeded, and returns the provisional layout.
//!
//! The rendering surface then reports each node's measured size through
//! [`GraphSession::on_node_measured`]. Once every node has been measured the
//! session lays out again and asks for a fit to view, exactly once per graph.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    catalog::Catalog,
    error::GraphError,
    geometry::{Size, SizeHint},
    graph::GraphSnapshot,
    identifier::NodeId,
    layout::{Engine, Layout},
    traversal::{Epoch, EpochCounter, EpochGuard, RootRef, TraversalOptions, Traverser},
};

/// A layout to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutUpdate {
    epoch: Epoch,
    layout: Layout<NodeId>,
    fit_view: bool,
}

impl LayoutUpdate {
    /// Epoch of the graph this layout belongs to.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn layout(&self) -> &Layout<NodeId> {
        &self.layout
    }

    /// Whether the view should be fitted to the graph after rendering.
    pub fn fit_view(&self) -> bool {
        self.fit_view
    }

    pub fn into_layout(self) -> Layout<NodeId> {
        self.layout
    }
}

/// A traversal that has been scheduled but not run yet.
#[derive(Debug)]
pub struct PendingBuild {
    roots: Vec<RootRef>,
    options: TraversalOptions,
    guard: EpochGuard,
}

impl PendingBuild {
    pub fn epoch(&self) -> Epoch {
        self.guard.epoch()
    }

    /// Runs the traversal. The result is only applied by [`GraphSession::commit`].
    pub async fn run(self, catalog: &dyn Catalog) -> BuildOutcome {
        let epoch = self.guard.epoch();
        let result = Traverser::new(catalog, self.options, self.guard)
            .run(&self.roots)
            .await;
        BuildOutcome { epoch, result }
    }
}

/// A finished traversal, tagged with the epoch it ran under.
#[derive(Debug)]
pub struct BuildOutcome {
    epoch: Epoch,
    result: Result<GraphSnapshot, GraphError>,
}

impl BuildOutcome {
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn result(&self) -> &Result<GraphSnapshot, GraphError> {
        &self.result
    }
}

#[derive(Debug)]
struct Displayed {
    epoch: Epoch,
    snapshot: Arc<GraphSnapshot>,
    hints: HashMap<NodeId, SizeHint>,
    /// Nodes not measured yet.
    unmeasured: HashSet<NodeId>,
    fitted: bool,
}

impl Displayed {
    fn lay_out(&self, engine: &Engine, fit_view: bool) -> LayoutUpdate {
        let layout = engine.layout(
            &self.snapshot.layout_nodes(&self.hints),
            &self.snapshot.layout_edges(),
        );
        LayoutUpdate {
            epoch: self.epoch,
            layout,
            fit_view,
        }
    }
}

/// State of one displayed graph.
#[derive(Debug, Default)]
pub struct GraphSession {
    epochs: EpochCounter,
    engine: Engine,
    displayed: Option<Displayed>,
}

impl GraphSession {
    pub fn new(engine: Engine) -> Self {
        Self {
            epochs: EpochCounter::new(),
            engine,
            displayed: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Schedules a build from new roots, superseding any build in flight.
    pub fn start(&self, roots: &[RootRef], options: TraversalOptions) -> PendingBuild {
        let epoch = self.epochs.advance();
        debug!(epoch:%, roots_len = roots.len(); "Graph build scheduled");
        PendingBuild {
            roots: roots.to_vec(),
            options,
            guard: self.epochs.guard(),
        }
    }

    /// Applies a finished build.
    ///
    /// On success the new snapshot replaces the displayed one, size hints are
    /// reset, and the provisional layout (default sizes) is returned. An empty
    /// graph needs no measurements, so its first layout already fits the view.
    ///
    /// # Errors
    ///
    /// Returns the traversal error, or [`GraphError::Superseded`] if a newer
    /// build was started meanwhile. In both cases the displayed graph is left
    /// untouched.
    pub fn commit(&mut self, outcome: BuildOutcome) -> Result<LayoutUpdate, GraphError> {
        let BuildOutcome { epoch, result } = outcome;
        if epoch != self.epochs.current() {
            debug!(epoch:%; "Dropping result of superseded build");
            return Err(GraphError::Superseded { epoch });
        }
        let snapshot = result.inspect_err(|err| {
            warn!(epoch:%, err:%; "Graph build failed, keeping displayed graph");
        })?;

        info!(
            epoch:%,
            nodes_count = snapshot.node_count(),
            edges_count = snapshot.edge_count();
            "Graph committed",
        );
        let unmeasured: HashSet<NodeId> = snapshot.nodes().map(|(id, _)| id.clone()).collect();
        let displayed = Displayed {
            epoch,
            fitted: unmeasured.is_empty(),
            snapshot: Arc::new(snapshot),
            hints: HashMap::new(),
            unmeasured,
        };
        let update = displayed.lay_out(&self.engine, displayed.fitted);
        self.displayed = Some(displayed);
        Ok(update)
    }

    /// Runs a complete build: [`Self::start`], [`PendingBuild::run`] and
    /// [`Self::commit`].
    ///
    /// # Errors
    ///
    /// See [`Self::commit`].
    pub async fn build(
        &mut self,
        catalog: &dyn Catalog,
        roots: &[RootRef],
        options: TraversalOptions,
    ) -> Result<LayoutUpdate, GraphError> {
        let outcome = self.start(roots, options).run(catalog).await;
        self.commit(outcome)
    }

    /// Records the measured size of a rendered node.
    ///
    /// Returns a new layout when one is due: with `fit_view` set once the last
    /// unmeasured node reports, and without it when a later measurement
    /// changes a node's size. Measurements for another epoch or an unknown
    /// node are dropped.
    pub fn on_node_measured(
        &mut self,
        epoch: Epoch,
        node: &NodeId,
        size: Size,
    ) -> Option<LayoutUpdate> {
        let Some(displayed) = self.displayed.as_mut() else {
            warn!(epoch:%, node:%; "Measurement without a displayed graph");
            return None;
        };
        if displayed.epoch != epoch {
            debug!(
                epoch:%,
                displayed:% = displayed.epoch,
                node:%;
                "Dropping measurement of a stale graph",
            );
            return None;
        }
        if !displayed.snapshot.contains_node(node) {
            warn!(epoch:%, node:%; "Dropping measurement of an unknown node");
            return None;
        }

        let hint = SizeHint::from(size);
        let previous = displayed.hints.insert(node.clone(), hint);
        displayed.unmeasured.remove(node);

        if !displayed.fitted {
            if !displayed.unmeasured.is_empty() {
                return None;
            }
            debug!(epoch:%; "All nodes measured, laying out again");
            displayed.fitted = true;
            return Some(displayed.lay_out(&self.engine, true));
        }

        if previous == Some(hint) {
            return None;
        }
        debug!(epoch:%, node:%; "Node resized, laying out again");
        Some(displayed.lay_out(&self.engine, false))
    }

    /// The layout of the displayed graph with the hints known so far.
    ///
    /// Never asks for a fit to view; used for redraws on interaction.
    pub fn current_layout(&self) -> Option<LayoutUpdate> {
        self.displayed
            .as_ref()
            .map(|displayed| displayed.lay_out(&self.engine, false))
    }

    /// The displayed graph.
    pub fn snapshot(&self) -> Option<Arc<GraphSnapshot>> {
        self.displayed
            .as_ref()
            .map(|displayed| Arc::clone(&displayed.snapshot))
    }

    /// Epoch of the displayed graph.
    pub fn epoch(&self) -> Option<Epoch> {
        self.displayed.as_ref().map(|displayed| displayed.epoch)
    }

    pub fn size_hint(&self, node: &NodeId) -> Option<SizeHint> {
        self.displayed
            .as_ref()
            .and_then(|displayed| displayed.hints.get(node).copied())
    }

    /// Number of displayed nodes not measured yet.
    pub fn awaiting_measurements(&self) -> usize {
        self.displayed
            .as_ref()
            .map_or(0, |displayed| displayed.unmeasured.len())
    }
}
