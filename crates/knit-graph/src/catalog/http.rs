//! Catalog backed by the knitfab REST API.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::{Catalog, EntityKind, FetchError};
use crate::detail::{DataDetail, PlanDetail, RunDetail};

/// Fetches details from the knitfab API under `base_url`.
///
/// Runs and plans are read from `/runs/{id}` and `/plans/{id}`. Data items
/// are looked up by their `knit#id` tag through `/data?tag=knit#id:{id}`,
/// since `/data/{id}` serves the item's content rather than its detail.
///
/// A 404 response, or no data item matching the tag, maps to
/// [`FetchError::NotFound`]; anything else that is not a success maps to
/// [`FetchError::Transport`].
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `base_url` extended by percent-encoded path segments.
    fn url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            FetchError::Transport(format!("invalid base URL {}: {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| FetchError::Transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        debug!(url:% = url, query:?; "GET");

        let mut request = self.client.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound {
                kind,
                id: id.to_string(),
            }),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|err| FetchError::Transport(err.to_string())),
            status => Err(FetchError::Transport(format!("{url} returned {status}"))),
        }
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn fetch_data_detail(&self, knit_id: &str) -> Result<DataDetail, FetchError> {
        let url = self.url(&["data"])?;
        let query = [("tag", format!("knit#id:{knit_id}"))];
        let found: Vec<DataDetail> = self.get(EntityKind::Data, knit_id, url, &query).await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound {
                kind: EntityKind::Data,
                id: knit_id.to_string(),
            })
    }

    async fn fetch_run_detail(&self, run_id: &str) -> Result<RunDetail, FetchError> {
        let url = self.url(&["runs", run_id])?;
        self.get(EntityKind::Run, run_id, url, &[]).await
    }

    async fn fetch_plan_detail(&self, plan_id: &str) -> Result<PlanDetail, FetchError> {
        let url = self.url(&["plans", plan_id])?;
        self.get(EntityKind::Plan, plan_id, url, &[]).await
    }
}
