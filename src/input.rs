//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Adding a new keybinding is
//! a single match arm in [`handle_key_event`]; remember to update the help
//! text in the status bar (`ui::draw_status_bar`).
//!
//! While a search query is being edited every printable key goes into the
//! query, so the normal bindings are only live in [`InputMode::Normal`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, InputMode, Screen};

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit = true;
        return;
    }

    match app.mode {
        InputMode::Editing => handle_editing(app, key.code),
        InputMode::Normal => handle_normal(app, key.code),
    }
}

fn handle_editing(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter | KeyCode::Esc => app.stop_editing(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

fn handle_normal(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Tab | KeyCode::BackTab => app.switch_screen(),
        KeyCode::Char('/') => app.start_editing(),
        KeyCode::Char('r') => app.retry(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        code => match app.screen {
            Screen::Schools => handle_schools(app, code),
            Screen::News => handle_news(app, code),
        },
    }
}

fn handle_schools(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Right | KeyCode::Char('l') => app.next_page(),
        KeyCode::Left | KeyCode::Char('h') => app.previous_page(),
        KeyCode::Char('p') => app.cycle_per_page(),
        KeyCode::Char('v') => app.toggle_view_mode(),
        _ => {}
    }
}

fn handle_news(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('s') => app.next_source(),
        KeyCode::Char('S') => app.previous_source(),
        KeyCode::Char('c') => app.next_category(),
        KeyCode::Char('C') => app.previous_category(),
        KeyCode::Char('a') => app.toggle_scope(),
        KeyCode::Char('A') => app.refresh_all_categories(),
        _ => {}
    }
}
