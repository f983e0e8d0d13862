//! Glyph Formatter Module
//!
//! Provides the depth markers shared by the flat listing and the interactive
//! view. Glyphs are decoration only; they never take part in search.

use serde::{Deserialize, Serialize};

// =============================================================================
// Theme
// =============================================================================

/// Visual theme for depth markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Circle markers on the first two levels (default)
    #[default]
    Full,
    /// No markers (plain text)
    Plain,
}

/// Colour hint for a depth marker, mapped to real colours by each renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphTone {
    Root,
    Group,
}

// =============================================================================
// Glyph Formatter
// =============================================================================

/// Picks the marker glyph for a tree depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphFormatter {
    theme: Theme,
}

impl GlyphFormatter {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Marker for a node at `depth`, if that depth is decorated.
    pub fn depth_glyph(&self, depth: usize) -> Option<(&'static str, GlyphTone)> {
        match (self.theme, depth) {
            (Theme::Plain, _) => None,
            (Theme::Full, 0) => Some(("●", GlyphTone::Root)),
            (Theme::Full, 1) => Some(("○", GlyphTone::Group)),
            (Theme::Full, _) => None,
        }
    }

    /// Marker followed by a space, or an empty string.
    pub fn prefix(&self, depth: usize) -> String {
        self.depth_glyph(depth)
            .map(|(glyph, _)| format!("{} ", glyph))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_theme_marks_first_two_levels() {
        let glyphs = GlyphFormatter::new(Theme::Full);
        assert_eq!(glyphs.depth_glyph(0), Some(("●", GlyphTone::Root)));
        assert_eq!(glyphs.depth_glyph(1), Some(("○", GlyphTone::Group)));
        assert_eq!(glyphs.depth_glyph(2), None);
        assert_eq!(glyphs.prefix(5), "");
    }

    #[test]
    fn test_plain_theme_has_no_markers() {
        let glyphs = GlyphFormatter::new(Theme::Plain);
        assert_eq!(glyphs.prefix(0), "");
        assert_eq!(glyphs.prefix(1), "");
    }

    #[test]
    fn test_theme_default_is_full() {
        assert_eq!(GlyphFormatter::default().theme(), Theme::Full);
    }
}
