//! Catalog fixtures stored as JSON.
//!
//! A fixture file lists detail records exactly as the REST API returns them:
//!
//! ```json
//! { "data": [ ... ], "runs": [ ... ], "plans": [ ... ] }
//! ```

use std::{fs, io, path::Path};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use super::InMemoryCatalog;
use crate::detail::{DataDetail, PlanDetail, RunDetail};

/// Errors raised while loading a catalog fixture.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to decode catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk layout of a catalog fixture.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub data: Vec<DataDetail>,
    #[serde(default)]
    pub runs: Vec<RunDetail>,
    #[serde(default)]
    pub plans: Vec<PlanDetail>,
}

impl From<CatalogFile> for InMemoryCatalog {
    fn from(file: CatalogFile) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for detail in file.data {
            catalog.insert_data(detail);
        }
        for detail in file.runs {
            catalog.insert_run(detail);
        }
        for detail in file.plans {
            catalog.insert_plan(detail);
        }
        catalog
    }
}

impl InMemoryCatalog {
    /// Builds a catalog from fixture JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogLoadError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        debug!(
            data_len = file.data.len(),
            runs_len = file.runs.len(),
            plans_len = file.plans.len();
            "Catalog fixture decoded",
        );
        Ok(file.into())
    }

    /// Builds a catalog from a fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading catalog fixture");
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
