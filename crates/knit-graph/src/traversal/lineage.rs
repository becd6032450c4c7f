//! Lineage expansion: Data items and the Runs that produce or consume them.

use futures::future::{BoxFuture, FutureExt};
use log::{debug, trace, warn};

use super::Traverser;
use crate::{
    catalog::EntityKind,
    error::GraphError,
    graph::{Edge, Node},
    identifier::NodeId,
};

impl Traverser<'_> {
    /// Records a Data item and recurses into its producer and consumers.
    ///
    /// `depth` is the number of Runs between the root and this item.
    pub(crate) fn visit_data<'a>(
        &'a mut self,
        knit_id: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), GraphError>> {
        async move {
            if !self.enter(NodeId::data(knit_id)) {
                trace!(knit_id; "Data already visited");
                return Ok(());
            }

            let detail = self
                .catalog
                .fetch_data_detail(knit_id)
                .await
                .map_err(|err| GraphError::from_fetch(EntityKind::Data, knit_id, err))?;
            debug!(knit_id, depth; "Visited data");

            let direction = self.options.direction();
            let may_hop = self.options.may_hop(depth);
            let mut edges = Vec::new();
            let mut next = Vec::new();

            if let Some(upstream) = &detail.upstream {
                let run_id = upstream.run.run_id.as_str();
                let follow = direction.follows_upstream() && may_hop;
                if self.connects(&NodeId::run(run_id), follow) {
                    match (&upstream.mountpoint, &upstream.log) {
                        (Some(mountpoint), _) => {
                            edges.push(Edge::produced_as_output(run_id, knit_id, &mountpoint.path))
                        }
                        (None, Some(_)) => edges.push(Edge::produced_as_log(run_id, knit_id)),
                        (None, None) => {
                            warn!(knit_id, run_id; "Upstream names neither an output nor a log")
                        }
                    }
                }
                if follow {
                    next.push(run_id.to_string());
                }
            }

            let follow = direction.follows_downstream() && may_hop;
            for downstream in &detail.downstreams {
                let run_id = downstream.run.run_id.as_str();
                if self.connects(&NodeId::run(run_id), follow) {
                    edges.push(Edge::consumed_as_input(
                        knit_id,
                        run_id,
                        &downstream.mountpoint.path,
                    ));
                }
                if follow {
                    next.push(run_id.to_string());
                }
            }

            self.add_node(Node::Data(detail))?;
            self.add_edges(edges)?;

            for run_id in next {
                self.visit_run(&run_id, depth + 1).await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Records a Run and recurses into the Data items on its ports.
    ///
    /// `depth` is the number of Runs between the root and this run, counting
    /// this one.
    pub(crate) fn visit_run<'a>(
        &'a mut self,
        run_id: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), GraphError>> {
        async move {
            if !self.enter(NodeId::run(run_id)) {
                trace!(run_id; "Run already visited");
                return Ok(());
            }

            let detail = self
                .catalog
                .fetch_run_detail(run_id)
                .await
                .map_err(|err| GraphError::from_fetch(EntityKind::Run, run_id, err))?;
            debug!(run_id, status = detail.summary.status, depth; "Visited run");

            let direction = self.options.direction();
            let mut edges = Vec::new();
            let mut next = Vec::new();

            let follow = direction.follows_upstream();
            for input in &detail.inputs {
                if self.connects(&NodeId::data(input.knit_id.as_str()), follow) {
                    edges.push(Edge::consumed_as_input(
                        &input.knit_id,
                        run_id,
                        &input.mountpoint.path,
                    ));
                }
                if follow {
                    next.push(input.knit_id.clone());
                }
            }

            let follow = direction.follows_downstream();
            for output in &detail.outputs {
                if self.connects(&NodeId::data(output.knit_id.as_str()), follow) {
                    edges.push(Edge::produced_as_output(
                        run_id,
                        &output.knit_id,
                        &output.mountpoint.path,
                    ));
                }
                if follow {
                    next.push(output.knit_id.clone());
                }
            }
            if let Some(log) = &detail.log {
                if self.connects(&NodeId::data(log.knit_id.as_str()), follow) {
                    edges.push(Edge::produced_as_log(run_id, &log.knit_id));
                }
                if follow {
                    next.push(log.knit_id.clone());
                }
            }

            self.add_node(Node::Run(detail))?;
            self.add_edges(edges)?;

            for knit_id in next {
                self.visit_data(&knit_id, depth).await?;
            }
            Ok(())
        }
        .boxed()
    }
}
