//! Interactive collapsible tree view
//!
//! A single-threaded event loop: each key press is handled to completion
//! before the next one is read, so a search never overlaps another.
//!
//! - `session`: tree state, cursor and search, independent of the terminal
//! - `view`: ratatui drawing

pub mod session;
pub mod view;

pub use session::{DisplayLabel, NodeId, SpanStyle, StyledSpan, TreeSession};

use crate::core::error::{Result, TreeError};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Whether the alternate screen currently owns the terminal
///
/// Log writers check this so nothing is printed over the frame.
pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Acquire)
}

/// Marks the view active until dropped
struct ActiveGuard;

impl ActiveGuard {
    fn enter() -> Self {
        ACTIVE.store(true, Ordering::Release);
        ActiveGuard
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
    }
}

/// Outcome of handling one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Apply one key press to the session
pub fn handle_key(session: &mut TreeSession, key: KeyEvent) -> KeyOutcome {
    if key.kind != KeyEventKind::Press {
        return KeyOutcome::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    if session.is_searching() {
        match key.code {
            KeyCode::Enter => {
                let hits = session.submit_search();
                info!(hits, "search submitted");
            }
            KeyCode::Esc => session.cancel_search(),
            KeyCode::Backspace => session.pop_search_char(),
            KeyCode::Char(c) => session.push_search_char(c),
            _ => {}
        }
        return KeyOutcome::Continue;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Char('/') => session.begin_search(),
        KeyCode::Up | KeyCode::Char('k') => session.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => session.select_next(),
        KeyCode::Right | KeyCode::Char('l') => session.expand_selected(),
        KeyCode::Left | KeyCode::Char('h') => session.collapse_or_parent(),
        KeyCode::Enter | KeyCode::Char(' ') => session.toggle_selected(),
        _ => {}
    }
    KeyOutcome::Continue
}

/// Run the interactive view until the user quits
pub fn run(session: &mut TreeSession) -> Result<()> {
    enable_raw_mode().map_err(terminal_error)?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(terminal_error(e));
    }
    let _active = ActiveGuard::enter();

    let outcome = Terminal::new(CrosstermBackend::new(io::stdout()))
        .map_err(TreeError::from)
        .and_then(|mut terminal| {
            let result = event_loop(&mut terminal, session);
            let _ = terminal.show_cursor();
            result
        });

    // Restore terminal
    disable_raw_mode().map_err(terminal_error)?;
    execute!(io::stdout(), LeaveAlternateScreen)
        .map_err(terminal_error)?;

    outcome
}

fn terminal_error(e: io::Error) -> TreeError {
    TreeError::terminal(e.to_string())
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut TreeSession,
) -> Result<()> {
    loop {
        terminal.draw(|frame| view::draw(frame, session))?;
        if let Event::Key(key) = event::read()? {
            if handle_key(session, key) == KeyOutcome::Quit {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presenter::Theme;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key(session: &mut TreeSession, code: KeyCode) -> KeyOutcome {
        handle_key(session, press(code))
    }

    fn typed(session: &mut TreeSession, text: &str) {
        for c in text.chars() {
            handle_key(session, press(KeyCode::Char(c)));
        }
    }

    fn sample() -> (TreeSession, NodeId) {
        let mut session = TreeSession::new("Root", Theme::Full);
        let root = session.root();
        session.add_child(root, "Item 1");
        let special = session.add_child(root, "Special Item");
        session.add_child(special, "Deep Item");
        (session, special)
    }

    #[test]
    fn test_active_flag_follows_guard() {
        assert!(!is_active());
        {
            let _active = ActiveGuard::enter();
            assert!(is_active());
        }
        assert!(!is_active());
    }

    #[test]
    fn test_slash_opens_search_and_enter_submits() {
        let (mut session, special) = sample();
        key(&mut session, KeyCode::Char('/'));
        assert!(session.is_searching());

        // Keys that normally navigate are typed into the input
        typed(&mut session, "qSpec");
        assert_eq!(session.search_input(), Some("qSpec"));
        key(&mut session, KeyCode::Backspace);
        key(&mut session, KeyCode::Home);

        assert_eq!(key(&mut session, KeyCode::Enter), KeyOutcome::Continue);
        assert!(!session.is_searching());
        // "qSpe" matches nothing, so nothing is highlighted
        assert!(!session.label(special).is_highlighted());

        key(&mut session, KeyCode::Char('/'));
        typed(&mut session, "SPECIAL");
        key(&mut session, KeyCode::Enter);
        assert!(session.label(special).is_highlighted());
        assert!(session.is_expanded(special));
    }

    #[test]
    fn test_escape_cancels_search_before_quitting() {
        let (mut session, _) = sample();
        key(&mut session, KeyCode::Char('/'));
        assert_eq!(key(&mut session, KeyCode::Esc), KeyOutcome::Continue);
        assert!(!session.is_searching());
        assert_eq!(key(&mut session, KeyCode::Esc), KeyOutcome::Quit);
    }

    #[test]
    fn test_navigation_keys() {
        let (mut session, special) = sample();
        session.expand(session.root());
        key(&mut session, KeyCode::Down);
        key(&mut session, KeyCode::Char('j'));
        assert_eq!(session.selected(), special);
        key(&mut session, KeyCode::Enter);
        assert!(session.is_expanded(special));
        key(&mut session, KeyCode::Left);
        assert!(!session.is_expanded(special));
        key(&mut session, KeyCode::Char('k'));
        assert_ne!(session.selected(), special);
    }

    #[test]
    fn test_quit_keys() {
        let (mut session, _) = sample();
        assert_eq!(key(&mut session, KeyCode::Char('q')), KeyOutcome::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut session, ctrl_c), KeyOutcome::Quit);
    }
}
