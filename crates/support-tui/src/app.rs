use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use support_core::{Conversation, FaqArticle, SupportApi};

use crate::tui::EventSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Chat,
}

/// Which welcome-screen pane receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WelcomeFocus {
    #[default]
    NameInput,
    Faqs,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub chat: Conversation,
    pub api: Arc<dyn SupportApi>,
    pub events: EventSender,
    pub base_url: String,

    // Welcome screen
    pub focus: WelcomeFocus,
    pub name_cursor: usize,
    pub faq_state: ListState,

    // Blocking notice (dismissed with Enter/Esc)
    pub notice: Option<String>,

    // Conversation screen
    pub input_cursor: usize,
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // Inner height of the transcript, for scroll calculations
    pub chat_lines: u16,  // Transcript height once wrapped to the pane, measured at render
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(api: Arc<dyn SupportApi>, events: EventSender, base_url: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            chat: Conversation::new(),
            api,
            events,
            base_url: base_url.into(),

            focus: WelcomeFocus::NameInput,
            name_cursor: 0,
            faq_state: ListState::default(),

            notice: None,

            input_cursor: 0,
            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_lines: 0,
            chat_area: None,

            animation_frame: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        if self.chat.phase().is_started() {
            Screen::Chat
        } else {
            Screen::Welcome
        }
    }

    /// Back to the welcome screen with everything but the FAQ catalog cleared
    pub fn restart(&mut self) {
        self.chat.restart();
        self.focus = WelcomeFocus::NameInput;
        self.name_cursor = 0;
        self.input_cursor = 0;
        self.chat_scroll = 0;
        self.follow_bottom = true;
        self.animation_frame = 0;
    }

    // FAQ browser

    pub fn toggle_welcome_focus(&mut self) {
        self.focus = match self.focus {
            WelcomeFocus::NameInput if !self.chat.faqs().is_empty() => {
                if self.faq_state.selected().is_none() {
                    self.faq_state.select(Some(0));
                }
                WelcomeFocus::Faqs
            }
            _ => WelcomeFocus::NameInput,
        };
    }

    pub fn faq_nav_down(&mut self) {
        let len = self.chat.faqs().len();
        if len > 0 {
            let i = self.faq_state.selected().unwrap_or(0);
            self.faq_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn faq_nav_up(&mut self) {
        let i = self.faq_state.selected().unwrap_or(0);
        self.faq_state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_category(&self) -> Option<(&str, &[FaqArticle])> {
        let i = self.faq_state.selected()?;
        self.chat
            .faqs()
            .iter()
            .nth(i)
            .map(|(name, articles)| (name.as_str(), articles.as_slice()))
    }

    // Transcript scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.min(self.bottom_scroll()).saturating_sub(lines);
        self.follow_bottom = false;
    }

    /// Reaching the bottom re-attaches auto-scroll
    pub fn scroll_down(&mut self, lines: u16) {
        let bottom = self.bottom_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(bottom);
        if self.chat_scroll >= bottom {
            self.follow_bottom = true;
        }
    }

    pub fn page_height(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.chat_scroll = self.bottom_scroll();
    }

    /// Scroll offset that puts the last transcript line at the bottom of the pane
    pub fn bottom_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.phase().is_busy() || self.chat.is_starting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use support_core::api::{
        EscalationReply, EscalationRequest, NewSessionReply, NewSessionRequest, QueryReply,
        QueryRequest,
    };
    use support_core::FaqCatalog;
    use tokio::sync::mpsc;

    struct NoopApi;

    #[async_trait]
    impl SupportApi for NoopApi {
        async fn list_faqs(&self) -> Result<FaqCatalog> {
            Ok(FaqCatalog::new())
        }

        async fn create_session(&self, _: &NewSessionRequest) -> Result<NewSessionReply> {
            anyhow::bail!("unused")
        }

        async fn send_query(&self, _: &QueryRequest) -> Result<QueryReply> {
            anyhow::bail!("unused")
        }

        async fn escalate(&self, _: &EscalationRequest) -> Result<EscalationReply> {
            anyhow::bail!("unused")
        }
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Arc::new(NoopApi), tx, "http://localhost:8000")
    }

    fn catalog(names: &[&str]) -> FaqCatalog {
        names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    vec![FaqArticle {
                        question: format!("{} question?", name),
                        answer: format!("{} answer.", name),
                    }],
                )
            })
            .collect()
    }

    fn active_app_with_lines(count: usize) -> App {
        let mut app = app();
        app.chat.name_input_mut().push_str("Ana");
        let request = app.chat.request_session().unwrap();
        app.chat
            .finish_session(
                request,
                Ok(NewSessionReply {
                    session_id: "s-1".to_string(),
                }),
            )
            .unwrap();
        for i in 0..count {
            app.chat.input_mut().push_str(&format!("line {}", i));
            let query = app.chat.begin_send().unwrap();
            app.chat.finish_query(
                &query.session_id,
                Ok(QueryReply {
                    response: "ok".to_string(),
                    escalated: false,
                }),
            );
        }
        app.chat_lines = (count as u16 + 1) * 6;
        app.chat_height = 10;
        app
    }

    #[test]
    fn test_screen_follows_phase() {
        let app = app();
        assert_eq!(app.screen(), Screen::Welcome);
        assert_eq!(active_app_with_lines(0).screen(), Screen::Chat);
    }

    #[test]
    fn test_faq_focus_requires_catalog() {
        let mut app = app();
        app.toggle_welcome_focus();
        assert_eq!(app.focus, WelcomeFocus::NameInput);

        app.chat.faqs_loaded(Ok(catalog(&["returns", "shipping"])));
        app.toggle_welcome_focus();
        assert_eq!(app.focus, WelcomeFocus::Faqs);
        assert_eq!(app.selected_category().unwrap().0, "returns");

        app.faq_nav_down();
        app.faq_nav_down();
        assert_eq!(app.selected_category().unwrap().0, "shipping");

        app.toggle_welcome_focus();
        assert_eq!(app.focus, WelcomeFocus::NameInput);
    }

    #[test]
    fn test_scrolling_detaches_and_reattaches() {
        let mut app = active_app_with_lines(10);
        let bottom = app.bottom_scroll();
        assert!(bottom > 0);

        app.scroll_to_bottom();
        app.scroll_up(3);
        assert!(!app.follow_bottom);
        assert_eq!(app.chat_scroll, bottom - 3);

        app.scroll_down(100);
        assert!(app.follow_bottom);
        assert_eq!(app.chat_scroll, bottom);
    }

    #[test]
    fn test_restart_clears_view_state() {
        let mut app = active_app_with_lines(2);
        app.chat.faqs_loaded(Ok(catalog(&["shipping"])));
        app.input_cursor = 4;
        app.scroll_up(1);

        app.restart();

        assert_eq!(app.screen(), Screen::Welcome);
        assert_eq!(app.input_cursor, 0);
        assert_eq!(app.chat_scroll, 0);
        assert!(app.follow_bottom);
        assert_eq!(app.chat.faqs().len(), 1);
    }

    #[test]
    fn test_animation_only_runs_while_waiting() {
        let mut app = active_app_with_lines(0);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.chat.input_mut().push_str("hello");
        app.chat.begin_send().unwrap();
        app.tick_animation();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
    }
}
