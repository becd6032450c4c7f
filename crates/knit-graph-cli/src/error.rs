//! Errors reported by the command-line tool.

use std::io;

use miette::Diagnostic;
use thiserror::Error;

use knit_graph::{GraphError, catalog::CatalogLoadError};

use crate::config::ConfigError;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(code(knit_graph::config))]
    Config(#[from] ConfigError),

    #[error("Cannot open catalog: {0}")]
    #[diagnostic(
        code(knit_graph::catalog),
        help("the catalog file is JSON with optional `data`, `runs` and `plans` arrays")
    )]
    Catalog(#[from] CatalogLoadError),

    #[error("No catalog given")]
    #[diagnostic(
        code(knit_graph::catalog::missing),
        help("pass --catalog <FILE>, or --server <URL> when built with the `http` feature")
    )]
    MissingCatalog,

    #[error("Graph build failed: {0}")]
    #[diagnostic(code(knit_graph::build))]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(knit_graph::io))]
    Io(#[from] io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(knit_graph::output))]
    Json(#[from] serde_json::Error),
}
