use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use knit_graph::catalog::InMemoryCatalog;
use knit_graph_cli::{Args, CliError, Command, TraceArgs};

/// Collects all .json catalogs from a directory
fn collect_catalogs(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn args(command: Command, catalog: Option<&Path>, output: &Path) -> Args {
    Args {
        command,
        catalog: catalog.map(|path| path.to_string_lossy().to_string()),
        #[cfg(feature = "http")]
        server: None,
        output: Some(output.to_string_lossy().to_string()),
        config: None,
        log_level: "off".to_string(),
    }
}

/// Every root of every demo catalog as a command.
fn commands(catalog_path: &Path) -> Vec<(String, Command)> {
    let catalog = InMemoryCatalog::from_path(catalog_path).expect("valid demo catalog");
    let lineage = catalog.knit_ids().map(|knit_id| {
        (
            format!("lineage-{knit_id}"),
            Command::Lineage {
                knit_ids: vec![knit_id.to_string()],
                trace: TraceArgs::default(),
            },
        )
    });
    let plans = catalog.plan_ids().map(|plan_id| {
        (
            format!("plan-{plan_id}"),
            Command::Plan {
                plan_ids: vec![plan_id.to_string()],
                trace: TraceArgs::default(),
            },
        )
    });
    lineage.chain(plans).collect()
}

#[tokio::test]
async fn e2e_smoke_test_demo_catalogs() {
    // Create a temporary directory for test outputs
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let catalogs = collect_catalogs(demos_dir());

    assert!(!catalogs.is_empty(), "No demo catalogs found in demos/");

    let mut failed = Vec::new();
    let mut runs = 0;

    for catalog_path in &catalogs {
        let stem = catalog_path.file_stem().unwrap().to_string_lossy();
        for (name, command) in commands(catalog_path) {
            runs += 1;
            let output_path = temp_dir.path().join(format!("{stem}-{name}.json"));
            let args = args(command, Some(catalog_path), &output_path);

            if let Err(e) = knit_graph_cli::run(&args).await {
                failed.push((catalog_path.clone(), name, e.to_string()));
                continue;
            }

            let written = fs::read_to_string(&output_path).expect("output written");
            let value: serde_json::Value = serde_json::from_str(&written).expect("valid JSON");
            let nodes = value["nodes"].as_array().map_or(0, Vec::len);
            if nodes == 0 {
                failed.push((catalog_path.clone(), name, "no nodes placed".to_string()));
            }
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemo runs that failed:");
        for (path, name, err) in &failed {
            eprintln!("  - {} ({name}): {err}", path.display());
        }
        panic!("{} demo run(s) failed unexpectedly", failed.len());
    }

    println!("✅ All {runs} demo runs passed");
}

#[tokio::test]
async fn e2e_smoke_test_lineage_output() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("model.json");
    let catalog_path = demos_dir().join("lineage.json");

    let args = args(
        Command::Lineage {
            knit_ids: vec!["model-1".to_string()],
            trace: TraceArgs::default(),
        },
        Some(&catalog_path),
        &output_path,
    );
    knit_graph_cli::run(&args).await.expect("lineage run succeeds");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).expect("output written"))
            .expect("valid JSON");

    // All seven entities of the demo are connected to model-1.
    assert_eq!(value["nodes"].as_array().map(Vec::len), Some(7));
    assert_eq!(value["originRuns"], serde_json::json!(["run:upload-1"]));
    assert!(value["skippedEdges"].as_array().is_some_and(Vec::is_empty));
}

#[tokio::test]
async fn e2e_smoke_test_missing_catalog() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("none.json");

    let args = args(
        Command::Run {
            run_ids: vec!["r1".to_string()],
            trace: TraceArgs::default(),
        },
        None,
        &output_path,
    );
    let err = knit_graph_cli::run(&args).await.unwrap_err();

    assert!(matches!(err, CliError::MissingCatalog));
    assert!(!output_path.exists());
}

#[tokio::test]
async fn e2e_smoke_test_unknown_root() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("unknown.json");
    let catalog_path = demos_dir().join("plans.json");

    let args = args(
        Command::Plan {
            plan_ids: vec!["no-such-plan".to_string()],
            trace: TraceArgs::default(),
        },
        Some(&catalog_path),
        &output_path,
    );
    let err = knit_graph_cli::run(&args).await.unwrap_err();

    assert!(matches!(err, CliError::Graph(_)));
    assert!(!output_path.exists());
}
