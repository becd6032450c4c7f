//! Dependency expansion: Plans, their ports, and the ports of neighbouring plans.

use futures::future::{BoxFuture, FutureExt};
use log::{debug, trace, warn};

use super::Traverser;
use crate::{
    catalog::EntityKind,
    detail::Downstream,
    error::GraphError,
    graph::{Edge, Node, PortDetail, PortNode},
    identifier::{NodeId, PortKey},
};

impl Traverser<'_> {
    /// Records a Plan with its ports and recurses into connected plans.
    ///
    /// `depth` is the number of plan hops between the root and this plan.
    pub(crate) fn visit_plan<'a>(
        &'a mut self,
        plan_id: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), GraphError>> {
        async move {
            if !self.enter(NodeId::plan(plan_id)) {
                trace!(plan_id; "Plan already visited");
                return Ok(());
            }

            let detail = self
                .catalog
                .fetch_plan_detail(plan_id)
                .await
                .map_err(|err| GraphError::from_fetch(EntityKind::Plan, plan_id, err))?;
            debug!(
                plan_id,
                inputs_len = detail.inputs.len(),
                outputs_len = detail.outputs.len(),
                depth;
                "Visited plan",
            );

            let direction = self.options.direction();
            let may_hop = self.options.may_hop(depth);
            let mut ports = Vec::new();
            let mut edges = Vec::new();
            let mut next = Vec::new();

            let follow = direction.follows_upstream() && may_hop;
            for input in &detail.inputs {
                let path = input.mountpoint.path.as_str();
                edges.push(Edge::input_to_plan(plan_id, path));

                for upstream in &input.upstreams {
                    let upstream_id = upstream.plan.plan_id.as_str();
                    if self.connects(&NodeId::plan(upstream_id), follow) {
                        match upstream.port_key() {
                            Some(key) => edges.push(Edge::upstream_to_downstream(
                                NodeId::port(upstream_id, key),
                                NodeId::port(plan_id, PortKey::path(path)),
                            )),
                            None => warn!(
                                plan_id,
                                path,
                                upstream_id;
                                "Upstream names neither an output nor a log",
                            ),
                        }
                    }
                    if follow {
                        next.push(upstream_id.to_string());
                    }
                }
                ports.push(PortNode::new(plan_id, PortDetail::Input(input.clone())));
            }

            let follow = direction.follows_downstream() && may_hop;
            for output in &detail.outputs {
                let path = output.mountpoint.path.as_str();
                edges.push(Edge::output_from_plan(plan_id, path));
                self.connect_downstreams(
                    NodeId::port(plan_id, PortKey::path(path)),
                    &output.downstreams,
                    follow,
                    &mut edges,
                    &mut next,
                );
                ports.push(PortNode::new(plan_id, PortDetail::Output(output.clone())));
            }
            if let Some(log) = &detail.log {
                edges.push(Edge::log_from_plan(plan_id));
                self.connect_downstreams(
                    NodeId::port(plan_id, PortKey::Log),
                    &log.downstreams,
                    follow,
                    &mut edges,
                    &mut next,
                );
                ports.push(PortNode::new(plan_id, PortDetail::Log(log.clone())));
            }

            self.add_node(Node::Plan(detail))?;
            for port in ports {
                self.add_node(Node::Port(port))?;
            }
            self.add_edges(edges)?;

            for next_id in next {
                self.visit_plan(&next_id, depth + 1).await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn connect_downstreams(
        &self,
        source: NodeId,
        downstreams: &[Downstream],
        follow: bool,
        edges: &mut Vec<Edge>,
        next: &mut Vec<String>,
    ) {
        for downstream in downstreams {
            let downstream_id = downstream.plan.plan_id.as_str();
            if self.connects(&NodeId::plan(downstream_id), follow) {
                edges.push(Edge::upstream_to_downstream(
                    source.clone(),
                    NodeId::port(downstream_id, PortKey::path(downstream.mountpoint.path.clone())),
                ));
            }
            if follow {
                next.push(downstream_id.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::{
        catalog::InMemoryCatalog,
        detail::{Input, Log, LogPoint, Mountpoint, Output, PlanDetail, PlanSummary, Upstream},
        graph::EdgeKind,
        traversal::{Direction, RootRef, TraversalOptions, traverse},
    };

    fn summary(plan_id: &str) -> PlanSummary {
        PlanSummary {
            plan_id: plan_id.into(),
            image: Some(format!("repo/{plan_id}:1.0")),
            name: None,
            entrypoint: vec![],
            args: vec![],
            annotations: vec![],
        }
    }

    fn mountpoint(path: &str) -> Mountpoint {
        Mountpoint {
            path: path.into(),
            tags: vec![],
        }
    }

    fn plan(plan_id: &str) -> PlanDetail {
        PlanDetail {
            summary: summary(plan_id),
            inputs: vec![],
            outputs: vec![],
            log: None,
            active: true,
            on_node: None,
            resources: Default::default(),
            service_account: None,
        }
    }

    fn input(path: &str, upstreams: &[(&str, Option<&str>)]) -> Input {
        Input {
            mountpoint: mountpoint(path),
            upstreams: upstreams
                .iter()
                .map(|(plan_id, upstream_path)| Upstream {
                    plan: summary(plan_id),
                    mountpoint: upstream_path.map(mountpoint),
                    log: upstream_path.is_none().then(LogPoint::default),
                })
                .collect(),
        }
    }

    fn output(path: &str, downstreams: &[(&str, &str)]) -> Output {
        Output {
            mountpoint: mountpoint(path),
            downstreams: downstreams
                .iter()
                .map(|(plan_id, path)| Downstream {
                    plan: summary(plan_id),
                    mountpoint: mountpoint(path),
                })
                .collect(),
        }
    }

    /// prep:/out -> train:/in, prep log -> audit:/in, train:/model -> eval:/in
    fn pipeline() -> InMemoryCatalog {
        let prep = PlanDetail {
            outputs: vec![output("/out", &[("train", "/in")])],
            log: Some(Log {
                log: LogPoint::default(),
                downstreams: vec![Downstream {
                    plan: summary("audit"),
                    mountpoint: mountpoint("/in"),
                }],
            }),
            ..plan("prep")
        };
        let train = PlanDetail {
            inputs: vec![input("/in", &[("prep", Some("/out"))])],
            outputs: vec![output("/model", &[("eval", "/in")])],
            ..plan("train")
        };
        let eval = PlanDetail {
            inputs: vec![input("/in", &[("train", Some("/model"))])],
            ..plan("eval")
        };
        let audit = PlanDetail {
            inputs: vec![input("/in", &[("prep", None)])],
            ..plan("audit")
        };
        InMemoryCatalog::new()
            .with_plan(prep)
            .with_plan(train)
            .with_plan(eval)
            .with_plan(audit)
    }

    #[tokio::test]
    async fn test_plan_with_ports() {
        let catalog = InMemoryCatalog::new().with_plan(PlanDetail {
            inputs: vec![input("/in", &[])],
            outputs: vec![output("/out", &[])],
            log: Some(Log {
                log: LogPoint::default(),
                downstreams: vec![],
            }),
            ..plan("p1")
        });

        let snapshot = traverse(
            &catalog,
            &[RootRef::Plan("p1".into())],
            TraversalOptions::default(),
        )
        .await
        .expect("traversal succeeds");

        let ids: Vec<_> = snapshot.nodes().map(|(id, _)| id.to_string()).collect();
        assert_eq!(
            ids,
            vec!["plan:p1", "port:p1:/in", "port:p1:/out", "port:p1:log"]
        );
        let kinds: Vec<_> = snapshot.edges().iter().map(|edge| edge.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EdgeKind::InputToPlan,
                EdgeKind::OutputFromPlan,
                EdgeKind::LogFromPlan
            ]
        );
        assert_eq!(snapshot.nodes_of_plan("p1").count(), 4);
    }

    #[tokio::test]
    async fn test_pipeline_connects_ports() {
        let catalog = pipeline();

        let snapshot = traverse(
            &catalog,
            &[RootRef::Plan("train".into())],
            TraversalOptions::default(),
        )
        .await
        .expect("traversal succeeds");

        for plan_id in ["prep", "train", "eval", "audit"] {
            assert!(snapshot.contains_node(&NodeId::plan(plan_id)), "{plan_id}");
            assert_eq!(catalog.fetch_count(EntityKind::Plan, plan_id), 1);
        }

        let links: Vec<_> = snapshot
            .edges()
            .iter()
            .filter(|edge| edge.kind() == EdgeKind::UpstreamToDownstream)
            .map(|edge| (edge.source().to_string(), edge.target().to_string()))
            .collect();
        assert_eq!(links.len(), 3);
        assert!(links.contains(&("port:prep:/out".into(), "port:train:/in".into())));
        assert!(links.contains(&("port:train:/model".into(), "port:eval:/in".into())));
        assert!(links.contains(&("port:prep:log".into(), "port:audit:/in".into())));
    }

    #[tokio::test]
    async fn test_downstream_depth_one() {
        let catalog = pipeline();

        let snapshot = traverse(
            &catalog,
            &[RootRef::Plan("prep".into())],
            TraversalOptions::new(Direction::Downstream, NonZeroUsize::new(1)),
        )
        .await
        .expect("traversal succeeds");

        assert!(snapshot.contains_node(&NodeId::plan("train")));
        assert!(snapshot.contains_node(&NodeId::plan("audit")));
        assert!(!snapshot.contains_node(&NodeId::plan("eval")));
        assert_eq!(catalog.fetch_count(EntityKind::Plan, "eval"), 0);
        for edge in snapshot.edges() {
            assert!(snapshot.contains_node(edge.source()), "{}", edge.source());
            assert!(snapshot.contains_node(edge.target()), "{}", edge.target());
        }
    }

    #[tokio::test]
    async fn test_dependency_cycle_terminates() {
        let a = PlanDetail {
            inputs: vec![input("/in", &[("b", Some("/out"))])],
            outputs: vec![output("/out", &[("b", "/in")])],
            ..plan("a")
        };
        let b = PlanDetail {
            inputs: vec![input("/in", &[("a", Some("/out"))])],
            outputs: vec![output("/out", &[("a", "/in")])],
            ..plan("b")
        };
        let catalog = InMemoryCatalog::new().with_plan(a).with_plan(b);

        let snapshot = traverse(
            &catalog,
            &[RootRef::Plan("a".into())],
            TraversalOptions::default(),
        )
        .await
        .expect("traversal succeeds");

        assert_eq!(catalog.fetch_count(EntityKind::Plan, "a"), 1);
        assert_eq!(catalog.fetch_count(EntityKind::Plan, "b"), 1);
        assert_eq!(snapshot.node_count(), 6);
        let links = snapshot
            .edges()
            .iter()
            .filter(|edge| edge.kind() == EdgeKind::UpstreamToDownstream)
            .count();
        assert_eq!(links, 2);
    }
}
