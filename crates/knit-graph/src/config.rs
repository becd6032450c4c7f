//! Configuration types for graph building and layout.
//!
//! All types implement [`serde::Deserialize`] and default every field, so a
//! configuration file only needs to name what it overrides.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining traversal and layout settings.
//! - [`TraversalOptions`] - Which relationships to follow and how far.
//! - [`LayoutConfig`] - Default node size and spacing of the layered layout.
//!
//! # Example
//!
//! ```
//! # use knit_graph::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().default_width(), 500.0);
//! ```

use serde::Deserialize;

use crate::{geometry::Size, traversal::TraversalOptions};

/// Top-level configuration combining traversal and layout settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Traversal configuration section.
    #[serde(default)]
    traversal: TraversalOptions,

    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(traversal: TraversalOptions, layout: LayoutConfig) -> Self {
        Self { traversal, layout }
    }

    /// Returns the traversal configuration.
    pub fn traversal(&self) -> &TraversalOptions {
        &self.traversal
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

/// Parameters of the layered layout.
///
/// Sizes are in pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width assumed for nodes that have not been measured.
    default_width: f32,

    /// Height assumed for nodes that have not been measured.
    default_height: f32,

    /// Horizontal gap between neighbouring nodes of one layer.
    node_spacing: f32,

    /// Horizontal gap between disconnected parts of the graph.
    component_spacing: f32,

    /// Vertical gap between layers, as a fraction of the smallest node height.
    rank_separation_ratio: f32,

    /// Number of crossing-reduction sweeps.
    ordering_passes: usize,

    /// Number of coordinate alignment sweeps.
    alignment_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_width: 500.0,
            default_height: 500.0,
            node_spacing: 50.0,
            component_spacing: 100.0,
            rank_separation_ratio: 0.5,
            ordering_passes: 4,
            alignment_passes: 4,
        }
    }
}

impl LayoutConfig {
    pub fn default_width(&self) -> f32 {
        self.default_width
    }

    pub fn default_height(&self) -> f32 {
        self.default_height
    }

    /// The size assumed for a node without any size hint.
    pub fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }

    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    pub fn component_spacing(&self) -> f32 {
        self.component_spacing
    }

    pub fn rank_separation_ratio(&self) -> f32 {
        self.rank_separation_ratio
    }

    pub fn ordering_passes(&self) -> usize {
        self.ordering_passes
    }

    pub fn alignment_passes(&self) -> usize {
        self.alignment_passes
    }

    /// Set the size assumed for unmeasured nodes
    pub fn set_default_size(&mut self, size: Size) -> &mut Self {
        self.default_width = size.width();
        self.default_height = size.height();
        self
    }

    /// Set the horizontal spacing between nodes of a layer
    pub fn set_node_spacing(&mut self, spacing: f32) -> &mut Self {
        self.node_spacing = spacing;
        self
    }

    /// Set the horizontal spacing between disconnected components
    pub fn set_component_spacing(&mut self, spacing: f32) -> &mut Self {
        self.component_spacing = spacing;
        self
    }

    /// Set the number of crossing-reduction sweeps
    pub fn set_ordering_passes(&mut self, passes: usize) -> &mut Self {
        self.ordering_passes = passes;
        self
    }
}
