//! Read-only lookup of entity details.
//!
//! The traversal engine does not talk to the metadata store directly; it goes
//! through a [`Catalog`]. Retry and timeout policy live behind this trait, so
//! a failed fetch is final as far as the engine is concerned.

mod file;
#[cfg(feature = "http")]
mod http;
mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::detail::{DataDetail, PlanDetail, RunDetail};

pub use file::{CatalogFile, CatalogLoadError};
#[cfg(feature = "http")]
pub use http::HttpCatalog;
pub use memory::InMemoryCatalog;

/// Kind of entity a catalog resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Data,
    Run,
    Plan,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => f.write_str("data"),
            Self::Run => f.write_str("run"),
            Self::Plan => f.write_str("plan"),
        }
    }
}

/// Failure of a single detail lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Source of entity details.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolves a Data item by knit id.
    async fn fetch_data_detail(&self, knit_id: &str) -> Result<DataDetail, FetchError>;

    /// Resolves a Run by run id.
    async fn fetch_run_detail(&self, run_id: &str) -> Result<RunDetail, FetchError>;

    /// Resolves a Plan by plan id.
    async fn fetch_plan_detail(&self, plan_id: &str) -> Result<PlanDetail, FetchError>;
}
