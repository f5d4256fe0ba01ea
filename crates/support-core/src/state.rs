//! UI-agnostic conversation data types
//!
//! These are shared by every front end (the terminal client, the one-shot
//! commands) and don't depend on any specific UI framework.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single entry in the conversation transcript. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub escalated: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            escalated: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            escalated: false,
        }
    }

    /// An assistant message flagged as part of an escalation
    pub fn escalation(content: impl Into<String>) -> Self {
        Self {
            escalated: true,
            ..Self::assistant(content)
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A server-issued session bound to the customer's display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub customer_name: String,
}

/// One FAQ entry as served by the backend (`{"q": ..., "a": ...}`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaqArticle {
    #[serde(rename = "q")]
    pub question: String,
    #[serde(rename = "a")]
    pub answer: String,
}

/// Category name -> articles. Read-only reference data.
pub type FaqCatalog = BTreeMap<String, Vec<FaqArticle>>;

/// "shipping" -> "Shipping"
pub fn category_title(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_title() {
        assert_eq!(category_title("shipping"), "Shipping");
        assert_eq!(category_title("éclair"), "Éclair");
        assert_eq!(category_title(""), "");
    }

    #[test]
    fn test_faq_article_wire_names() {
        let article: FaqArticle =
            serde_json::from_str(r#"{"q": "Do you ship abroad?", "a": "Yes."}"#).unwrap();
        assert_eq!(article.question, "Do you ship abroad?");
        assert_eq!(article.answer, "Yes.");
    }

    #[test]
    fn test_escalation_message_is_flagged_assistant() {
        let msg = ChatMessage::escalation("connecting you now");
        assert_eq!(msg.role, ChatRole::Assistant);
        assert!(msg.escalated);
        assert!(!ChatMessage::user("hi").escalated);
    }
}
