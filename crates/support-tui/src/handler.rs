use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use support_core::ChatError;
use tracing::debug;

use crate::app::{App, Screen, WelcomeFocus};
use crate::tui::{ApiEvent, AppEvent};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Api(api_event) => handle_api_event(app, api_event),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // A notice blocks everything until dismissed
    if app.notice.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.notice = None;
        }
        return;
    }

    match app.screen() {
        Screen::Welcome => handle_welcome_key(app, key),
        Screen::Chat => handle_chat_key(app, key),
    }
}

fn handle_welcome_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_welcome_focus(),
        _ => match app.focus {
            WelcomeFocus::Faqs => match key.code {
                KeyCode::Char('j') | KeyCode::Down => app.faq_nav_down(),
                KeyCode::Char('k') | KeyCode::Up => app.faq_nav_up(),
                KeyCode::Enter => app.toggle_welcome_focus(),
                _ => {}
            },
            WelcomeFocus::NameInput => {
                if key.code == KeyCode::Enter {
                    start_session(app);
                } else {
                    edit_line(app.chat.name_input_mut(), &mut app.name_cursor, key);
                }
            }
        },
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        // The human-agent action is hidden once escalated
        KeyCode::Char('e') if ctrl => {
            if !app.chat.phase().is_escalated() {
                escalate(app);
            }
        }
        KeyCode::Char('n') if ctrl => app.restart(),

        KeyCode::Enter => send_message(app),

        // Transcript scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.page_height()),
        KeyCode::PageDown => app.scroll_down(app.page_height()),

        _ => {
            if app.chat.accepts_input() {
                edit_line(app.chat.input_mut(), &mut app.input_cursor, key);
            }
        }
    }
}

/// Single-line text editing with a character cursor
fn edit_line(text: &mut String, cursor: &mut usize, key: KeyEvent) {
    let char_count = text.chars().count();
    *cursor = (*cursor).min(char_count);

    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_count),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_count,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

// Support API calls run in background tasks and report back as events

pub fn load_faqs(app: &App) {
    let api = app.api.clone();
    let tx = app.events.clone();
    tokio::spawn(async move {
        let outcome = api.list_faqs().await;
        let _ = tx.send(AppEvent::Api(ApiEvent::FaqsLoaded(outcome)));
    });
}

fn start_session(app: &mut App) {
    let request = match app.chat.request_session() {
        Ok(request) => request,
        Err(ChatError::EmptyName) => {
            app.notice = Some(ChatError::EmptyName.to_string());
            return;
        }
        Err(e) => {
            debug!("Session not started: {}", e);
            return;
        }
    };

    let api = app.api.clone();
    let tx = app.events.clone();
    tokio::spawn(async move {
        let outcome = api.create_session(&request).await;
        let _ = tx.send(AppEvent::Api(ApiEvent::SessionStarted { request, outcome }));
    });
}

fn send_message(app: &mut App) {
    let request = match app.chat.begin_send() {
        Ok(request) => request,
        Err(e) => {
            debug!("Message not sent: {}", e);
            return;
        }
    };
    app.input_cursor = 0;
    app.scroll_to_bottom();

    let api = app.api.clone();
    let tx = app.events.clone();
    tokio::spawn(async move {
        let outcome = api.send_query(&request).await;
        let _ = tx.send(AppEvent::Api(ApiEvent::QueryAnswered {
            session_id: request.session_id,
            outcome,
        }));
    });
}

fn escalate(app: &mut App) {
    let request = match app.chat.begin_escalation() {
        Ok(request) => request,
        Err(e) => {
            debug!("Escalation not requested: {}", e);
            return;
        }
    };

    let api = app.api.clone();
    let tx = app.events.clone();
    tokio::spawn(async move {
        let outcome = api.escalate(&request).await;
        let _ = tx.send(AppEvent::Api(ApiEvent::Escalated {
            session_id: request.session_id,
            outcome,
        }));
    });
}

fn handle_api_event(app: &mut App, event: ApiEvent) {
    match event {
        ApiEvent::FaqsLoaded(outcome) => app.chat.faqs_loaded(outcome),
        ApiEvent::SessionStarted { request, outcome } => {
            match app.chat.finish_session(request, outcome) {
                Ok(()) => {
                    app.input_cursor = 0;
                    app.scroll_to_bottom();
                }
                Err(e) => app.notice = Some(e.to_string()),
            }
        }
        ApiEvent::QueryAnswered { session_id, outcome } => {
            app.chat.finish_query(&session_id, outcome);
            app.scroll_to_bottom();
        }
        ApiEvent::Escalated { session_id, outcome } => {
            app.chat.finish_escalation(&session_id, outcome);
            app.scroll_to_bottom();
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen() != Screen::Chat {
        return;
    }
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
