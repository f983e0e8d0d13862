//! Interactive tree session state
//!
//! Holds the expandable view of one label tree, the cursor, the search input
//! and the side-table of original labels used to undo search highlighting.
//! Nothing here touches the terminal, so all behaviour is testable directly.

use crate::core::label::Label;
use crate::core::node::Node;
use crate::core::presenter::{GlyphFormatter, Theme};
use regex::RegexBuilder;
use std::collections::HashMap;
use std::ops::Range;
use tracing::{debug, warn};

/// Nodes at a depth below this are expanded when the session is built
const AUTO_EXPAND_DEPTH: usize = 2;

/// Stable identity of a node within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub emphasized: bool,
    /// Part of a search match
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

/// What the view currently shows for a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLabel {
    pub spans: Vec<StyledSpan>,
    /// Whole-line background decoration for search hits
    pub line_highlight: bool,
}

impl DisplayLabel {
    fn from_label(label: &Label) -> Self {
        Self {
            spans: label
                .spans()
                .iter()
                .map(|s| StyledSpan {
                    text: s.text.clone(),
                    style: SpanStyle {
                        emphasized: s.emphasized,
                        matched: false,
                    },
                })
                .collect(),
            line_highlight: false,
        }
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn is_highlighted(&self) -> bool {
        self.line_highlight || self.spans.iter().any(|s| s.style.matched)
    }
}

#[derive(Debug, Clone)]
struct UiNode {
    label: DisplayLabel,
    depth: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expanded: bool,
}

/// Stateful, searchable view over a label tree
#[derive(Debug, Clone)]
pub struct TreeSession {
    nodes: Vec<UiNode>,
    original_labels: HashMap<NodeId, Label>,
    glyphs: GlyphFormatter,
    selected: NodeId,
    search_input: Option<String>,
    last_query: Option<String>,
}

impl TreeSession {
    /// Start a session holding only a root node
    pub fn new(root: impl Into<Label>, theme: Theme) -> Self {
        let mut session = Self {
            nodes: Vec::new(),
            original_labels: HashMap::new(),
            glyphs: GlyphFormatter::new(theme),
            selected: NodeId(0),
            search_input: None,
            last_query: None,
        };
        session.insert(None, root.into());
        session
    }

    /// Mirror `root` into a session, expanding the first two levels
    pub fn from_tree(root: &Node, theme: Theme) -> Self {
        let mut session = Self::new(root.label.clone(), theme);
        session.nodes.reserve(root.node_count() - 1);
        let root_id = session.root();
        session.mirror_children(root_id, root);
        for node in &mut session.nodes {
            node.expanded = node.depth < AUTO_EXPAND_DEPTH;
        }
        debug!(nodes = session.nodes.len(), "built tree session");
        session
    }

    fn mirror_children(&mut self, parent: NodeId, node: &Node) {
        for child in &node.children {
            let id = self.add_child(parent, child.label.clone());
            self.mirror_children(id, child);
        }
    }

    fn insert(&mut self, parent: Option<NodeId>, label: Label) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);
        self.nodes.push(UiNode {
            label: DisplayLabel::from_label(&label),
            depth,
            parent,
            children: Vec::new(),
            expanded: false,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        self.original_labels.insert(id, label);
        id
    }

    /// Append a collapsed child under `parent`
    pub fn add_child(&mut self, parent: NodeId, label: impl Into<Label>) -> NodeId {
        self.insert(Some(parent), label.into())
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn glyphs(&self) -> GlyphFormatter {
        self.glyphs
    }

    pub fn label(&self, id: NodeId) -> &DisplayLabel {
        &self.nodes[id.0].label
    }

    /// Label as it was when the session was built
    pub fn original_label(&self, id: NodeId) -> &Label {
        &self.original_labels[&id]
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.nodes[id.0].depth
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.nodes[id.0].expanded
    }

    pub fn expand(&mut self, id: NodeId) {
        self.nodes[id.0].expanded = true;
    }

    pub fn collapse(&mut self, id: NodeId) {
        self.nodes[id.0].expanded = false;
    }

    pub fn toggle(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.expanded = !node.expanded;
    }

    fn expand_ancestors(&mut self, id: NodeId) {
        let mut current = self.parent(id);
        while let Some(p) = current {
            self.expand(p);
            current = self.parent(p);
        }
    }

    /// Every node in pre-order
    fn preorder(&self) -> Vec<NodeId> {
        self.collect_rows(|_| true)
    }

    /// Nodes currently on screen, in pre-order
    pub fn visible_rows(&self) -> Vec<NodeId> {
        self.collect_rows(|n| n.expanded)
    }

    fn collect_rows(&self, descend: impl Fn(&UiNode) -> bool) -> Vec<NodeId> {
        let mut rows = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            rows.push(id);
            let node = &self.nodes[id.0];
            if descend(node) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        rows
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    pub fn selected(&self) -> NodeId {
        self.selected
    }

    /// Row index of the selection among the visible rows
    pub fn selected_row(&self) -> usize {
        self.visible_rows()
            .iter()
            .position(|&id| id == self.selected)
            .unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let rows = self.visible_rows();
        let row = self.selected_row();
        if row + 1 < rows.len() {
            self.selected = rows[row + 1];
        }
    }

    pub fn select_previous(&mut self) {
        let rows = self.visible_rows();
        let row = self.selected_row();
        if row > 0 {
            self.selected = rows[row - 1];
        }
    }

    /// Collapse the selection, or move to its parent when already collapsed
    pub fn collapse_or_parent(&mut self) {
        let id = self.selected;
        if self.is_expanded(id) && !self.is_leaf(id) {
            self.collapse(id);
        } else if let Some(parent) = self.parent(id) {
            self.selected = parent;
        }
    }

    pub fn toggle_selected(&mut self) {
        self.toggle(self.selected);
    }

    pub fn expand_selected(&mut self) {
        self.expand(self.selected);
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Reveal the search input
    pub fn begin_search(&mut self) {
        self.search_input = Some(String::new());
    }

    /// Current search input, if the input is shown
    pub fn search_input(&self) -> Option<&str> {
        self.search_input.as_deref()
    }

    pub fn is_searching(&self) -> bool {
        self.search_input.is_some()
    }

    pub fn push_search_char(&mut self, c: char) {
        if let Some(input) = &mut self.search_input {
            input.push(c);
        }
    }

    pub fn pop_search_char(&mut self) {
        if let Some(input) = &mut self.search_input {
            input.pop();
        }
    }

    /// Hide the input without searching
    pub fn cancel_search(&mut self) {
        self.search_input = None;
    }

    /// Run the typed query, then hide and clear the input
    pub fn submit_search(&mut self) -> usize {
        let query = self.search_input.take().unwrap_or_default();
        let hits = self.apply_search(&query);
        self.last_query = (!query.is_empty()).then_some(query);
        hits
    }

    /// Query of the last non-empty search that is still applied
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Put every label back to its original, unhighlighted form
    pub fn restore_labels(&mut self) {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.label = DisplayLabel::from_label(&self.original_labels[&NodeId(index)]);
        }
    }

    /// Highlight every node whose text contains `query`, case-insensitively
    ///
    /// Labels are restored first; an empty query only restores. Matching
    /// nodes and all their ancestors are expanded, and the cursor moves to
    /// the first hit. Returns the number of matching nodes.
    pub fn apply_search(&mut self, query: &str) -> usize {
        self.restore_labels();
        if query.is_empty() {
            return 0;
        }

        let matcher = match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "search query rejected");
                return 0;
            }
        };

        let mut first_hit = None;
        let mut hits = 0;
        for id in self.preorder() {
            let original = &self.original_labels[&id];
            let ranges: Vec<Range<usize>> = matcher
                .find_iter(&original.plain_text())
                .map(|m| m.range())
                .collect();
            if ranges.is_empty() {
                continue;
            }
            self.nodes[id.0].label = DisplayLabel {
                spans: highlight_spans(original, &ranges),
                line_highlight: true,
            };
            self.expand(id);
            self.expand_ancestors(id);
            first_hit.get_or_insert(id);
            hits += 1;
        }

        if let Some(id) = first_hit {
            self.selected = id;
        }
        debug!(query, hits, "applied search");
        hits
    }
}

/// Split `label` into spans so that each byte range in `ranges` is marked
fn highlight_spans(label: &Label, ranges: &[Range<usize>]) -> Vec<StyledSpan> {
    let mut out = Vec::new();
    let mut offset = 0;
    for span in label.spans() {
        let end = offset + span.text.len();
        let mut cuts = vec![offset, end];
        for r in ranges {
            cuts.extend(
                [r.start, r.end]
                    .into_iter()
                    .filter(|&b| b > offset && b < end),
            );
        }
        cuts.sort_unstable();
        cuts.dedup();

        for pair in cuts.windows(2) {
            let (start, stop) = (pair[0], pair[1]);
            out.push(StyledSpan {
                text: span.text[start - offset..stop - offset].to_string(),
                style: SpanStyle {
                    emphasized: span.emphasized,
                    matched: ranges.iter().any(|r| r.start <= start && start < r.end),
                },
            });
        }
        offset = end;
    }
    out
}
