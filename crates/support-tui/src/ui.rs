use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use support_core::state::category_title;
use support_core::{ChatMessage, ChatRole};

use crate::app::{App, Screen, WelcomeFocus};

const ESCALATION_NOTICE: &str = "⚠️  This issue has been escalated to our support team. \
                                 A representative will contact you shortly.";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen() {
        Screen::Welcome => render_welcome_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if let Some(notice) = &app.notice {
        render_notice(notice, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" 💬 Customer Support Bot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("AI-Powered Support Assistant ", Style::default().fg(Color::White)),
        Span::styled(format!("[{}] ", app.base_url), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let (mode_text, mode_style) = match app.screen() {
        Screen::Welcome => (" WELCOME ", Style::default().bg(Color::Blue).fg(Color::White)),
        Screen::Chat if app.chat.phase().is_escalated() => {
            (" ESCALATED ", Style::default().bg(Color::Red).fg(Color::White))
        }
        Screen::Chat => (" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = if app.notice.is_some() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" dismiss ", label_style),
        ]
    } else {
        match app.screen() {
            Screen::Welcome => {
                let mut hints = match app.focus {
                    WelcomeFocus::NameInput => vec![
                        Span::styled(" Enter ", key_style),
                        Span::styled(" start chat ", label_style),
                    ],
                    WelcomeFocus::Faqs => vec![
                        Span::styled(" j/k ", key_style),
                        Span::styled(" category ", label_style),
                    ],
                };
                if !app.chat.faqs().is_empty() {
                    hints.extend(vec![
                        Span::styled(" Tab ", key_style),
                        Span::styled(
                            if app.focus == WelcomeFocus::Faqs { " name " } else { " FAQs " },
                            label_style,
                        ),
                    ]);
                }
                hints.extend(vec![
                    Span::styled(" Esc ", key_style),
                    Span::styled(" quit ", label_style),
                ]);
                hints
            }
            Screen::Chat => {
                let send_style = if app.chat.can_send() { label_style } else { disabled_style };
                let mut hints = vec![
                    Span::styled(" Enter ", key_style),
                    Span::styled(" send ", send_style),
                ];
                if !app.chat.phase().is_escalated() {
                    hints.extend(vec![
                        Span::styled(" ^E ", key_style),
                        Span::styled(" talk to human agent ", label_style),
                    ]);
                }
                hints.extend(vec![
                    Span::styled(" ^N ", key_style),
                    Span::styled(" new chat ", label_style),
                    Span::styled(" PgUp/PgDn ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" ^C ", key_style),
                    Span::styled(" quit ", label_style),
                ]);
                hints
            }
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_welcome_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [intro_area, input_area, faq_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let intro = Paragraph::new(vec![
        Line::from(Span::styled(
            "Welcome to Support",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from("Start a conversation with our AI assistant. We're here to help!"),
    ])
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(intro, intro_area);

    let name_focused = app.focus == WelcomeFocus::NameInput && app.notice.is_none();
    let input_title = if app.chat.is_starting() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        format!(" Starting chat{} ", dots)
    } else {
        " Enter your name ".to_string()
    };
    render_text_input(
        frame,
        input_area,
        app.chat.name_input(),
        app.name_cursor,
        &input_title,
        name_focused,
    );

    render_faq_browser(app, frame, faq_area);
}

fn render_faq_browser(app: &mut App, frame: &mut Frame, area: Rect) {
    let faqs_focused = app.focus == WelcomeFocus::Faqs;
    let border_color = if faqs_focused { Color::Cyan } else { Color::DarkGray };

    if app.chat.faqs().is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No help topics available right now.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" 📚 We Can Help With: "),
        );
        frame.render_widget(empty, area);
        return;
    }

    let [categories_area, articles_area] = Layout::horizontal([
        Constraint::Percentage(35),
        Constraint::Percentage(65),
    ])
    .areas(area);

    let items: Vec<ListItem> = app
        .chat
        .faqs()
        .iter()
        .map(|(category, articles)| {
            ListItem::new(Line::from(vec![
                Span::styled(category_title(category), Style::default().bold()),
                Span::styled(
                    format!("  {} articles", articles.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" 📚 We Can Help With: "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, categories_area, &mut app.faq_state);

    let (title, text) = match app.selected_category() {
        Some((category, articles)) => {
            let mut lines: Vec<Line> = Vec::new();
            for article in articles {
                lines.push(Line::from(Span::styled(
                    format!("Q: {}", article.question),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!("A: {}", article.answer)));
                lines.push(Line::default());
            }
            (format!(" {} ", category_title(category)), Text::from(lines))
        }
        None => (
            " Articles ".to_string(),
            Text::from(Span::styled(
                "Press Tab to browse help topics",
                Style::default().fg(Color::DarkGray),
            )),
        ),
    };

    let articles = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(articles, articles_area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let banner_height = if app.chat.phase().is_escalated() { 3 } else { 0 };
    let [chat_area, banner_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(banner_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store area for mouse hit-testing and dimensions for scroll calculations
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.chat.messages() {
        lines.extend(message_lines(msg));
    }

    if app.chat.phase().is_busy() {
        lines.push(badge_line(ChatRole::Assistant, None, false));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let title = match app.chat.session() {
        Some(session) => format!(" Chatting as {} ", session.customer_name),
        None => " Conversation ".to_string(),
    };
    // Measure with the same wrapping the pane uses so following the bottom lands on the last line
    let text = Text::from(lines);
    let wrapped_height = Paragraph::new(text.clone())
        .wrap(Wrap { trim: false })
        .line_count(chat_area.width.saturating_sub(2));
    app.chat_lines = u16::try_from(wrapped_height).unwrap_or(u16::MAX);
    if app.follow_bottom {
        app.chat_scroll = app.bottom_scroll();
    }

    let chat = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    if banner_height > 0 {
        let banner = Paragraph::new(ESCALATION_NOTICE)
            .style(Style::default().fg(Color::Black).bg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Yellow)))
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, banner_area);
    }

    let input_title = if app.chat.phase().is_escalated() {
        " Input disabled: escalated to a human agent "
    } else if app.chat.phase().is_busy() {
        " Waiting for a reply... "
    } else {
        " Type your question... "
    };
    let focused = app.chat.accepts_input() && app.notice.is_none();
    render_text_input(
        frame,
        input_area,
        app.chat.input(),
        app.input_cursor,
        input_title,
        focused,
    );
}

fn message_lines(msg: &ChatMessage) -> Vec<Line<'static>> {
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string();
    let mut lines = vec![badge_line(msg.role, Some(time), msg.escalated)];

    let content_style = if msg.escalated {
        Style::default().fg(Color::LightRed)
    } else {
        Style::default()
    };
    for line in msg.content.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), content_style)));
    }
    lines.push(Line::default());
    lines
}

fn badge_line(role: ChatRole, time: Option<String>, escalated: bool) -> Line<'static> {
    let (badge, style) = match role {
        ChatRole::User => (
            "👤 You",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        ChatRole::Assistant => (
            "🤖 Assistant",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    };

    let mut spans = vec![Span::styled(badge, style)];
    if let Some(time) = time {
        spans.push(Span::styled(format!("  {}", time), Style::default().fg(Color::DarkGray)));
    }
    if escalated {
        spans.push(Span::styled(
            "  [escalated]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

/// Bordered single-line input with horizontal scrolling to keep the cursor visible
fn render_text_input(
    frame: &mut Frame,
    area: Rect,
    text: &str,
    cursor: usize,
    title: &str,
    focused: bool,
) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = cursor.min(text.chars().count());

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = text.chars().skip(scroll_offset).take(inner_width).collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_notice(notice: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height.min(area.height));

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(notice.to_string()),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Notice "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(popup, popup_area);
}
