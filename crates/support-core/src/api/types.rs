//! Wire types for the Support API (JSON bodies)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSessionRequest {
    pub customer_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSessionReply {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub session_id: String,
    pub customer_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryReply {
    pub response: String,
    #[serde(default)]
    pub escalated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscalationRequest {
    pub session_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EscalationReply {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A message as stored by the backend. Timestamps are kept as the server's
/// ISO strings; they carry no timezone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptMessage {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionTranscript {
    pub session_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub messages: Vec<TranscriptMessage>,
    #[serde(default)]
    pub escalated: bool,
    #[serde(default)]
    pub escalation_reason: Option<String>,
}
