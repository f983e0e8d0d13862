//! Drawing a tree session with ratatui

use super::session::{DisplayLabel, NodeId, SpanStyle, TreeSession};
use crate::core::presenter::GlyphTone;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

const MATCH_LINE_BG: Color = Color::Rgb(0x2a, 0x2a, 0x2a);
const MATCH_FG: Color = Color::Rgb(0xff, 0x00, 0xff);

fn tone_color(tone: GlyphTone) -> Color {
    match tone {
        GlyphTone::Root => Color::Green,
        GlyphTone::Group => Color::Yellow,
    }
}

fn span_style(style: SpanStyle) -> Style {
    let mut out = Style::default();
    if style.emphasized {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.matched {
        out = out.fg(MATCH_FG).add_modifier(Modifier::BOLD);
    }
    out
}

/// Styled spans of a label, without indentation or markers
pub fn label_spans(label: &DisplayLabel) -> Vec<Span<'static>> {
    label
        .spans
        .iter()
        .map(|s| Span::styled(s.text.clone(), span_style(s.style)))
        .collect()
}

fn row_line(session: &TreeSession, id: NodeId) -> Line<'static> {
    let depth = session.depth(id);
    let mut spans = vec![Span::raw("  ".repeat(depth))];

    let toggle = if session.is_leaf(id) {
        "  "
    } else if session.is_expanded(id) {
        "▾ "
    } else {
        "▸ "
    };
    spans.push(Span::styled(toggle, Style::default().fg(Color::DarkGray)));

    if let Some((glyph, tone)) = session.glyphs().depth_glyph(depth) {
        spans.push(Span::styled(
            format!("{} ", glyph),
            Style::default().fg(tone_color(tone)),
        ));
    }

    let label = session.label(id);
    spans.extend(label_spans(label));

    let line = Line::from(spans);
    if label.line_highlight {
        line.style(Style::default().bg(MATCH_LINE_BG))
    } else {
        line
    }
}

/// Draw the tree, plus the search input or the key help footer
pub fn draw(frame: &mut Frame, session: &TreeSession) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(frame.area());

    draw_tree(frame, chunks[0], session);
    draw_footer(frame, chunks[1], session);
}

fn draw_tree(frame: &mut Frame, area: Rect, session: &TreeSession) {
    let items: Vec<ListItem> = session
        .visible_rows()
        .into_iter()
        .map(|id| ListItem::new(row_line(session, id)))
        .collect();

    let title = match session.last_query() {
        Some(query) => format!(" Exposures  /{} ", query),
        None => " Exposures ".to_string(),
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(session.selected_row()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut Frame, area: Rect, session: &TreeSession) {
    let footer = match session.search_input() {
        Some(input) => Paragraph::new(Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Cyan)),
            Span::raw(input.to_string()),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Search ")),
        None => Paragraph::new(
            "↑/↓ move  ←/→ fold  enter toggle  / search  q quit",
        )
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL)),
    };
    frame.render_widget(footer, area);

    if let Some(input) = session.search_input() {
        frame.set_cursor_position((search_cursor_x(area, input), area.y.saturating_add(1)));
    }
}

/// Column of the text cursor after `input`, clamped inside the footer border
fn search_cursor_x(area: Rect, input: &str) -> u16 {
    let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    area.x
        .saturating_add(2)
        .saturating_add(typed)
        .min(area.right().saturating_sub(2))
}
