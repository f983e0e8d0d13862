//! Flat Presenter Module
//!
//! Renders a label tree as indented text lines: two spaces per depth level,
//! a literal `- ` marker, an optional depth glyph, then the label's plain text.
//!
//! Traversal is depth-first pre-order. With a depth limit `k`, a node at depth
//! `k` is still emitted but its children are not visited.

pub mod glyphs;

pub use glyphs::{GlyphFormatter, GlyphTone, Theme};

use crate::core::node::Node;
use std::io::{self, Write};

// =============================================================================
// Flat Renderer
// =============================================================================

/// Renders trees as indented text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRenderer {
    glyphs: GlyphFormatter,
    max_level: Option<usize>,
}

impl FlatRenderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            glyphs: GlyphFormatter::new(theme),
            max_level: None,
        }
    }

    /// Stop descending below `max_level` (`None` = unbounded).
    pub fn with_max_level(mut self, max_level: Option<usize>) -> Self {
        self.max_level = max_level;
        self
    }

    /// Produce one line per visited node.
    // Every ancestor of a node at depth <= max sits above max.
    pub fn render(&self, root: &Node) -> Vec<String> {
        root.walk()
            .into_iter()
            .filter(|(depth, _)| !self.max_level.is_some_and(|max| *depth > max))
            .map(|(depth, node)| {
                format!(
                    "{}- {}{}",
                    "  ".repeat(depth),
                    self.glyphs.prefix(depth),
                    node.label.plain_text()
                )
            })
            .collect()
    }

    /// Write the rendering to `out`, one line each.
    pub fn write_to<W: Write>(&self, root: &Node, out: &mut W) -> io::Result<()> {
        for line in self.render(root) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}
