//! Command-line argument definitions for the knit-graph CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the catalog, configuration file,
//! output path and logging verbosity; the subcommand picks the graph and its
//! roots.

use std::{fmt, num::NonZeroUsize, str::FromStr};

use clap::{Parser, Subcommand};

use knit_graph::{RootRef, TraversalOptions, traversal::Direction};

/// Command-line arguments for the knit-graph tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a catalog file (JSON)
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Base URL of the knitfab API, used instead of a catalog file
    #[cfg(feature = "http")]
    #[arg(long, global = true, conflicts_with = "catalog")]
    pub server: Option<String>,

    /// Path to the output JSON file; standard output if omitted
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

/// The graph to build.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Trace the lineage of Data items
    Lineage {
        /// Knit ids of the root Data items
        #[arg(required = true)]
        knit_ids: Vec<String>,

        #[command(flatten)]
        trace: TraceArgs,
    },

    /// Trace the lineage of Runs
    Run {
        /// Ids of the root Runs
        #[arg(required = true)]
        run_ids: Vec<String>,

        #[command(flatten)]
        trace: TraceArgs,
    },

    /// Trace the dependencies between Plans
    Plan {
        /// Ids of the root Plans
        #[arg(required = true)]
        plan_ids: Vec<String>,

        #[command(flatten)]
        trace: TraceArgs,
    },
}

impl Command {
    pub fn roots(&self) -> Vec<RootRef> {
        match self {
            Self::Lineage { knit_ids, .. } => knit_ids.iter().cloned().map(RootRef::Data).collect(),
            Self::Run { run_ids, .. } => run_ids.iter().cloned().map(RootRef::Run).collect(),
            Self::Plan { plan_ids, .. } => plan_ids.iter().cloned().map(RootRef::Plan).collect(),
        }
    }

    pub fn trace(&self) -> &TraceArgs {
        match self {
            Self::Lineage { trace, .. } | Self::Run { trace, .. } | Self::Plan { trace, .. } => {
                trace
            }
        }
    }
}

/// How far to trace.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TraceArgs {
    /// Follow producers only
    #[arg(short, long, conflicts_with = "downstream")]
    pub upstream: bool,

    /// Follow consumers only
    #[arg(short, long)]
    pub downstream: bool,

    /// Maximum number of hops from the roots: a positive number or "all"
    #[arg(short = 'n', long)]
    pub depth: Option<Depth>,
}

impl TraceArgs {
    /// Merges the flags over the configured traversal options.
    pub fn options(&self, configured: &TraversalOptions) -> TraversalOptions {
        let direction = match (self.upstream, self.downstream) {
            (true, false) => Direction::Upstream,
            (false, true) => Direction::Downstream,
            _ => configured.direction(),
        };
        let max_depth = match self.depth {
            Some(Depth::All) => None,
            Some(Depth::Limited(depth)) => Some(depth),
            None => configured.max_depth(),
        };
        TraversalOptions::new(direction, max_depth)
    }
}

/// Value of `--depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Limited(NonZeroUsize),
    All,
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<NonZeroUsize>()
            .map(Self::Limited)
            .map_err(|_| format!("expected a positive number or \"all\", got {s:?}"))
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(depth) => write!(f, "{depth}"),
            Self::All => f.write_str("all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_parse() {
        assert_eq!("all".parse::<Depth>(), Ok(Depth::All));
        assert_eq!("ALL".parse::<Depth>(), Ok(Depth::All));
        assert_eq!("3".parse::<Depth>(), Ok(Depth::Limited(NonZeroUsize::new(3).unwrap())));
        assert!("0".parse::<Depth>().is_err());
        assert!("-1".parse::<Depth>().is_err());
    }

    #[test]
    fn test_parse_lineage_command() {
        let args = Args::try_parse_from([
            "knit-graph",
            "lineage",
            "d1",
            "d2",
            "-u",
            "-n",
            "2",
            "--catalog",
            "catalog.json",
        ])
        .expect("valid arguments");

        assert_eq!(args.catalog.as_deref(), Some("catalog.json"));
        assert_eq!(
            args.command.roots(),
            vec![RootRef::Data("d1".into()), RootRef::Data("d2".into())]
        );
        let options = args.command.trace().options(&TraversalOptions::default());
        assert_eq!(options.direction(), Direction::Upstream);
        assert_eq!(options.max_depth(), NonZeroUsize::new(2));
    }

    #[test]
    fn test_upstream_conflicts_with_downstream() {
        let result = Args::try_parse_from(["knit-graph", "run", "r1", "-u", "-d"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_configuration() {
        let configured = TraversalOptions::new(Direction::Downstream, NonZeroUsize::new(5));

        let unset = TraceArgs::default().options(&configured);
        assert_eq!(unset, configured);

        let all = TraceArgs {
            depth: Some(Depth::All),
            ..TraceArgs::default()
        }
        .options(&configured);
        assert_eq!(all.direction(), Direction::Downstream);
        assert_eq!(all.max_depth(), None);
    }
}
