//! Card size measurement for nodes.
//!
//! Without a rendering surface the tool "measures" each node by shaping the
//! text its card would show, one line per heading, tag and port, and adding
//! padding around it.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::info;

use knit_graph::{
    geometry::Size,
    graph::{Node, PortDetail},
};

const FONT_SIZE: f32 = 12.0;
const PADDING: f32 = 16.0;
const MIN_WIDTH: f32 = 120.0;
const MAX_WIDTH: f32 = 480.0;

/// Shapes card text with a reusable [`FontSystem`].
pub struct CardMeasurer {
    font_system: FontSystem,
}

impl Default for CardMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl CardMeasurer {
    pub fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: FontSystem::new(),
        }
    }

    /// Rendered size of a node card: its shaped text plus padding, with the
    /// width clamped to the card limits.
    pub fn estimate(&mut self, node: &Node) -> Size {
        let text = card_lines(node).join("\n");
        let text_size = self.text_size(&text);

        let width = (text_size.width() + 2.0 * PADDING).clamp(MIN_WIDTH, MAX_WIDTH);
        let height = text_size.height() + 2.0 * PADDING;
        Size::new(width, height)
    }

    /// Size of `text` in pixels, one layout run per line.
    fn text_size(&mut self, text: &str) -> Size {
        // Points to pixels at standard DPI
        let font_size_px = FONT_SIZE * 1.33;
        let metrics = Metrics::new(font_size_px, font_size_px * 1.15);

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut self.font_system);
        let attrs = Attrs::new().family(Family::SansSerif);
        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut lines = 0;
        for run in buffer.layout_runs() {
            if let Some(last) = run.glyphs.last() {
                max_width = max_width.max(last.x + last.w);
            }
            lines += 1;
        }

        // No usable font: approximate from the character count.
        if max_width <= 0.0 {
            let longest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
            max_width = longest as f32 * font_size_px * 0.55;
        }
        let lines = lines.max(text.lines().count()).max(1);

        Size::new(max_width, lines as f32 * metrics.line_height)
    }
}

fn card_lines(node: &Node) -> Vec<String> {
    match node {
        Node::Data(detail) => {
            let mut lines = vec![format!("knit id: {}", detail.knit_id)];
            lines.extend(detail.tags.iter().map(ToString::to_string));
            lines
        }
        Node::Run(detail) => {
            let summary = &detail.summary;
            let mut lines = vec![
                format!("run: {}", summary.run_id),
                format!("status: {}", summary.status),
            ];
            if let Some(title) = summary.plan.title() {
                lines.push(title.to_string());
            }
            if !summary.updated_at.is_empty() {
                lines.push(summary.updated_at.clone());
            }
            if let Some(exit) = &summary.exit {
                lines.push(format!("exit {}: {}", exit.code, exit.message));
            }
            lines
        }
        Node::Plan(detail) => {
            let summary = &detail.summary;
            let mut lines = vec![format!("plan: {}", summary.plan_id)];
            lines.extend(summary.title().map(str::to_string));
            if !summary.entrypoint.is_empty() || !summary.args.is_empty() {
                let command: Vec<&str> = summary
                    .entrypoint
                    .iter()
                    .chain(&summary.args)
                    .map(String::as_str)
                    .collect();
                lines.push(command.join(" "));
            }
            lines.extend(summary.annotations.iter().cloned());
            if !detail.active {
                lines.push("(deactivated)".to_string());
            }
            lines
        }
        Node::Port(port) => {
            let (heading, tags) = match port.detail() {
                PortDetail::Input(input) => (
                    input.mountpoint.path.clone(),
                    &input.mountpoint.tags,
                ),
                PortDetail::Output(output) => (
                    output.mountpoint.path.clone(),
                    &output.mountpoint.tags,
                ),
                PortDetail::Log(log) => ("(log)".to_string(), &log.log.tags),
            };
            let mut lines = vec![heading];
            lines.extend(tags.iter().map(ToString::to_string));
            lines
        }
    }
}
