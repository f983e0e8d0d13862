//! Structured node labels
//!
//! A label is an ordered sequence of styled spans. Renderers decide how an
//! emphasized span looks; nothing downstream ever parses markup back out of
//! a string.

use std::fmt;

/// A run of label text with a single style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub emphasized: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: false,
        }
    }

    pub fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: true,
        }
    }
}

/// Free-text node label made of styled spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Label {
    spans: Vec<Span>,
}

impl Label {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain span; empty text is skipped
    pub fn plain(mut self, text: impl Into<String>) -> Self {
        self.push(Span::plain(text));
        self
    }

    /// Append an emphasized span; empty text is skipped
    pub fn emphasized(mut self, text: impl Into<String>) -> Self {
        self.push(Span::emphasized(text));
        self
    }

    fn push(&mut self, span: Span) {
        if span.text.is_empty() {
            return;
        }
        // Merge adjacent spans of the same style
        match self.spans.last_mut() {
            Some(last) if last.emphasized == span.emphasized => last.text.push_str(&span.text),
            _ => self.spans.push(span),
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Label text with all styling dropped
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Label::new().plain(text)
    }
}

impl From<String> for Label {
    fn from(text: String) -> Self {
        Label::new().plain(text)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}
