//! CLI logic for the knit-graph tool.
//!
//! Builds a lineage or plan dependency graph from a catalog, lays it out with
//! estimated card sizes and writes the placed graph as JSON.

pub mod config;
pub mod error;
pub mod measure;
pub mod output;

mod args;

pub use args::{Args, Command, Depth, TraceArgs};
pub use error::CliError;

use std::{fs, io::Write};

use log::{debug, info};

use knit_graph::{
    Engine, GraphSession, LayoutUpdate,
    catalog::{Catalog, InMemoryCatalog},
};

use output::PlacedGraph;

/// Run the knit-graph CLI application
///
/// This function traces the graph from the requested roots, lays it out
/// twice (provisional sizes, then measured card sizes) and writes the placed
/// graph to the output file or standard output.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - Configuration loading errors
/// - Catalog loading errors
/// - Traversal errors
/// - Output I/O errors
pub async fn run(args: &Args) -> Result<(), CliError> {
    info!(
        catalog = args.catalog,
        output = args.output;
        "Building graph"
    );

    // Load configuration
    let app_config = config::load_config(args.config.as_ref())?;
    let options = args.command.trace().options(app_config.traversal());

    let catalog = open_catalog(args)?;

    let mut session = GraphSession::new(Engine::new(app_config.layout().clone()));
    let provisional = session
        .build(catalog.as_ref(), &args.command.roots(), options)
        .await?;
    let update = measure_all(&mut session, provisional);

    let placed = PlacedGraph::new(&session, &update);
    let json = serde_json::to_string_pretty(&placed)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            info!(
                output_file = path,
                nodes_count = placed.node_count(),
                edges_count = placed.edge_count();
                "Graph exported successfully",
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}

/// Feeds a measured card size for every node back into the session and returns
/// the layout that followed the last measurement.
fn measure_all(session: &mut GraphSession, provisional: LayoutUpdate) -> LayoutUpdate {
    let Some(snapshot) = session.snapshot() else {
        return provisional;
    };
    let epoch = provisional.epoch();

    let mut measurer = measure::CardMeasurer::new();
    let mut latest = provisional;
    for (id, node) in snapshot.nodes() {
        if let Some(update) = session.on_node_measured(epoch, id, measurer.estimate(node)) {
            debug!(epoch:%, fit_view = update.fit_view(); "Layout refreshed after measurement");
            latest = update;
        }
    }
    latest
}

#[cfg(feature = "http")]
fn open_catalog(args: &Args) -> Result<Box<dyn Catalog>, CliError> {
    if let Some(server) = &args.server {
        info!(server; "Using knitfab API catalog");
        return Ok(Box::new(knit_graph::catalog::HttpCatalog::new(server.clone())));
    }
    open_catalog_file(args)
}

#[cfg(not(feature = "http"))]
fn open_catalog(args: &Args) -> Result<Box<dyn Catalog>, CliError> {
    open_catalog_file(args)
}

fn open_catalog_file(args: &Args) -> Result<Box<dyn Catalog>, CliError> {
    let path = args.catalog.as_ref().ok_or(CliError::MissingCatalog)?;
    let catalog = InMemoryCatalog::from_path(path)?;
    Ok(Box::new(catalog))
}
