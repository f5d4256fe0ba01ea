pub mod api;
pub mod config;
pub mod conversation;
pub mod state;

// Re-export main types for convenience
pub use api::{SupportApi, SupportClient};
pub use config::Config;
pub use conversation::{ChatError, Conversation, Phase};
pub use state::{ChatMessage, ChatRole, FaqArticle, FaqCatalog, Session};
