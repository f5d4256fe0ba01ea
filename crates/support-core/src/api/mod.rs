pub mod http;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

use crate::state::FaqCatalog;

pub use http::SupportClient;
pub use types::{
    EscalationReply, EscalationRequest, HealthStatus, NewSessionReply, NewSessionRequest,
    QueryReply, QueryRequest, SessionTranscript, TranscriptMessage,
};

/// The four Support API calls the conversation depends on.
///
/// Each call is a single request/response with no retry, backoff or timeout.
#[async_trait]
pub trait SupportApi: Send + Sync {
    async fn list_faqs(&self) -> Result<FaqCatalog>;

    async fn create_session(&self, request: &NewSessionRequest) -> Result<NewSessionReply>;

    async fn send_query(&self, request: &QueryRequest) -> Result<QueryReply>;

    async fn escalate(&self, request: &EscalationRequest) -> Result<EscalationReply>;
}
