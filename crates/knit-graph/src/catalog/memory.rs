use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use log::trace;

use super::{Catalog, EntityKind, FetchError};
use crate::detail::{DataDetail, PlanDetail, RunDetail};

/// A catalog backed by maps held in memory.
///
/// Every lookup is recorded, so callers can check how often an entity was
/// fetched. Transport failures can be injected per entity.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    data: HashMap<String, DataDetail>,
    runs: HashMap<String, RunDetail>,
    plans: HashMap<String, PlanDetail>,
    failures: HashMap<(EntityKind, String), String>,
    fetches: Mutex<Vec<(EntityKind, String)>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_data(&mut self, detail: DataDetail) {
        self.data.insert(detail.knit_id.clone(), detail);
    }

    pub fn insert_run(&mut self, detail: RunDetail) {
        self.runs.insert(detail.run_id().to_string(), detail);
    }

    pub fn insert_plan(&mut self, detail: PlanDetail) {
        self.plans.insert(detail.plan_id().to_string(), detail);
    }

    pub fn with_data(mut self, detail: DataDetail) -> Self {
        self.insert_data(detail);
        self
    }

    pub fn with_run(mut self, detail: RunDetail) -> Self {
        self.insert_run(detail);
        self
    }

    pub fn with_plan(mut self, detail: PlanDetail) -> Self {
        self.insert_plan(detail);
        self
    }

    /// Makes every lookup of the given entity fail with a transport error.
    pub fn with_transport_failure(
        mut self,
        kind: EntityKind,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures.insert((kind, id.into()), message.into());
        self
    }

    /// Knit ids of every Data item held, in no particular order.
    pub fn knit_ids(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Ids of every Plan held, in no particular order.
    pub fn plan_ids(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    /// Number of lookups made for the given entity so far.
    pub fn fetch_count(&self, kind: EntityKind, id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(k, i)| *k == kind && i == id)
            .count()
    }

    /// Total number of lookups made so far.
    pub fn total_fetches(&self) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lookup<T: Clone>(
        &self,
        map: &HashMap<String, T>,
        kind: EntityKind,
        id: &str,
    ) -> Result<T, FetchError> {
        trace!(kind:% = kind, id; "Catalog lookup");
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, id.to_string()));

        if let Some(message) = self.failures.get(&(kind, id.to_string())) {
            return Err(FetchError::Transport(message.clone()));
        }

        map.get(id).cloned().ok_or_else(|| FetchError::NotFound {
            kind,
            id: id.to_string(),
        })
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn fetch_data_detail(&self, knit_id: &str) -> Result<DataDetail, FetchError> {
        self.lookup(&self.data, EntityKind::Data, knit_id)
    }

    async fn fetch_run_detail(&self, run_id: &str) -> Result<RunDetail, FetchError> {
        self.lookup(&self.runs, EntityKind::Run, run_id)
    }

    async fn fetch_plan_detail(&self, plan_id: &str) -> Result<PlanDetail, FetchError> {
        self.lookup(&self.plans, EntityKind::Plan, plan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(knit_id: &str) -> DataDetail {
        DataDetail {
            knit_id: knit_id.to_string(),
            tags: vec![],
            upstream: None,
            downstreams: vec![],
            nomination: vec![],
        }
    }

    #[tokio::test]
    async fn test_lookup_found_and_counted() {
        let catalog = InMemoryCatalog::new().with_data(data("d1"));

        let detail = catalog.fetch_data_detail("d1").await.expect("present");
        assert_eq!(detail.knit_id, "d1");
        assert_eq!(catalog.fetch_count(EntityKind::Data, "d1"), 1);
        assert_eq!(catalog.total_fetches(), 1);
    }

    #[tokio::test]
    async fn test_lookup_missing_is_not_found() {
        let catalog = InMemoryCatalog::new();

        let err = catalog.fetch_run_detail("r9").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::NotFound {
                kind: EntityKind::Run,
                id: "r9".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_injected_transport_failure() {
        let catalog = InMemoryCatalog::new()
            .with_data(data("d1"))
            .with_transport_failure(EntityKind::Data, "d1", "connection reset");

        let err = catalog.fetch_data_detail("d1").await.unwrap_err();
        assert_eq!(err, FetchError::Transport("connection reset".to_string()));
    }
}
