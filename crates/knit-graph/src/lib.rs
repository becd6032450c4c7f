//! knit-graph - Lineage and dependency graphs over knitfab metadata.
//!
//! Starting from one or more roots, the traversal engine walks the
//! relationships recorded in a [`catalog::Catalog`] and collects every
//! reachable entity exactly once into an order-stable [`graph::GraphSnapshot`].
//! The layered layout engine places that snapshot on a plane, and a
//! [`session::GraphSession`] re-runs the layout once the rendering surface has
//! measured the real node sizes.
//!
//! Two graphs share this machinery:
//!
//! - the lineage graph of Data items and the Runs producing or consuming them
//! - the dependency graph of Plans, their ports, and the ports they feed
//!
//! # Examples
//!
//! ```rust,no_run
//! use knit_graph::{
//!     catalog::InMemoryCatalog,
//!     session::GraphSession,
//!     traversal::{RootRef, TraversalOptions},
//! };
//!
//! # async fn example() -> Result<(), knit_graph::GraphError> {
//! let catalog = InMemoryCatalog::from_path("catalog.json").expect("valid catalog");
//! let mut session = GraphSession::default();
//!
//! let update = session
//!     .build(&catalog, &[RootRef::Data("knit-1".into())], TraversalOptions::default())
//!     .await?;
//! for placement in update.layout().placements() {
//!     println!("{} at {:?}", placement.id(), placement.position());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod detail;
pub mod geometry;
pub mod graph;
pub mod identifier;
pub mod layout;
pub mod session;
pub mod traversal;

mod error;

pub use error::GraphError;
pub use identifier::NodeId;
pub use layout::{Engine, Layout, LayoutEdge, LayoutNode, layout_edges};
pub use session::{GraphSession, LayoutUpdate};
pub use traversal::{RootRef, TraversalOptions, traverse};
