use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, InputMode, Tab};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The market popup captures input while it is open
    if app.market.is_open() {
        handle_market(app, key);
        return;
    }

    match (app.showing_selector(), app.input_mode) {
        (true, InputMode::Editing) => handle_selector_editing(app, key),
        (true, InputMode::Normal) => handle_selector_normal(app, key),
        (false, InputMode::Editing) => handle_chat_editing(app, key),
        (false, InputMode::Normal) => handle_chat_normal(app, key),
    }
}

/// Keys shared by every normal-mode screen. Returns true when handled.
fn handle_navigation_keys(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('1') => app.navigate(Tab::Global),
        KeyCode::Char('2') => app.navigate(Tab::Country),
        KeyCode::Char('m') => app.open_market(),
        KeyCode::Tab => {
            let next = match app.tab {
                Tab::Global => Tab::Country,
                Tab::Country => Tab::Global,
            };
            app.navigate(next);
        }
        _ => return false,
    }
    true
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    if handle_navigation_keys(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('c') if app.tab == Tab::Country => {
            app.clear_country();
        }

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_chat_down(10),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_chat_up(10),
        KeyCode::PageDown => app.scroll_chat_down(10),
        KeyCode::PageUp => app.scroll_chat_up(10),
        KeyCode::Char('g') => app.scroll_chat_up(u16::MAX),
        KeyCode::Char('G') => app.follow_chat = true,
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Submission is disabled while a reply is pending
            if !app.conversation.is_loading() {
                app.submit_chat();
            }
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_selector_normal(app: &mut App, key: KeyEvent) {
    if handle_navigation_keys(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.selector.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.selector.nav_up(),
        KeyCode::Enter => app.confirm_selector(),
        KeyCode::Char('i') | KeyCode::Char('/') => app.input_mode = InputMode::Editing,
        KeyCode::Esc => app.navigate(Tab::Global),
        _ => {}
    }
}

fn handle_selector_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.confirm_selector(),
        KeyCode::Down => app.selector.nav_down(),
        KeyCode::Up => app.selector.nav_up(),
        KeyCode::Backspace => app.selector.pop_char(),
        KeyCode::Char(c) => app.selector.push_char(c),
        _ => {}
    }
}

fn handle_market(app: &mut App, key: KeyEvent) {
    if app.market_search_editing {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => app.market_search_editing = false,
            KeyCode::Backspace => app.market.pop_search_char(),
            KeyCode::Char(c) => app.market.push_search_char(c),
            _ => {}
        }
        app.clamp_market_selection();
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('m') => app.close_market(),
        // Refresh, or "Try Again" from the error overlay
        KeyCode::Char('r') => app.refresh_market(),
        KeyCode::Char('/') | KeyCode::Char('i') => app.market_search_editing = true,
        KeyCode::Char('j') | KeyCode::Down => app.market_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.market_nav_up(),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if app.market.is_open() {
                app.market_nav_down();
            } else {
                app.scroll_chat_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if app.market.is_open() {
                app.market_nav_up();
            } else {
                app.scroll_chat_up(3);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "Zürich";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }
}
