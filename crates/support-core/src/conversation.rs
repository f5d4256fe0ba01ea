//! The support conversation state machine
//!
//! `Conversation` owns every piece of chat state: the session, the message
//! log, the pending input, and the busy/escalated flags. All mutation goes
//! through the transitions below.
//!
//! Each network-backed transition is split in two. `request_session`,
//! `begin_send` and `begin_escalation` validate locally and hand back the
//! request to issue; `finish_session`, `finish_query` and `finish_escalation`
//! fold the outcome back in. An event loop can run the request in a
//! background task between the two halves. The `start`, `send`, `escalate`
//! and `load_faqs` drivers simply await the call in between.

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api::{
    EscalationReply, EscalationRequest, NewSessionReply, NewSessionRequest, QueryReply,
    QueryRequest, SupportApi,
};
use crate::state::{ChatMessage, FaqCatalog, Session};

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";
pub const ESCALATION_REASON: &str = "Customer requested escalation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    NotStarted,
    /// `busy` is set while a query is in flight. `escalated` never clears
    /// for the lifetime of the session.
    Active { busy: bool, escalated: bool },
}

impl Phase {
    pub fn is_started(&self) -> bool {
        matches!(self, Phase::Active { .. })
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Active { busy: true, .. })
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self, Phase::Active { escalated: true, .. })
    }
}

/// Local rejections, plus the one failure surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Please enter your name")]
    EmptyName,
    #[error("A chat session is already being started")]
    StartPending,
    #[error("The chat has already started")]
    AlreadyStarted,
    #[error("Failed to start chat session")]
    SessionStartFailed,
    #[error("No active chat session")]
    NoSession,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Still waiting for the previous reply")]
    Busy,
    #[error("This conversation has been escalated")]
    Escalated,
    #[error("An escalation request is already in progress")]
    EscalationPending,
}

pub fn welcome_message(customer_name: &str) -> String {
    format!(
        "Hi {}! 👋 Welcome to our customer support. How can I help you today? \
         I can assist with shipping, returns, products, payments, and account issues.",
        customer_name
    )
}

#[derive(Debug, Default)]
pub struct Conversation {
    phase: Phase,
    session: Option<Session>,
    messages: Vec<ChatMessage>,
    name_input: String,
    input: String,
    starting: bool,
    escalating: bool,
    faqs: FaqCatalog,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn faqs(&self) -> &FaqCatalog {
        &self.faqs
    }

    pub fn name_input(&self) -> &str {
        &self.name_input
    }

    pub fn name_input_mut(&mut self) -> &mut String {
        &mut self.name_input
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Editable message text. Callers should check `accepts_input` first.
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn is_starting(&self) -> bool {
        self.starting
    }

    pub fn is_escalating(&self) -> bool {
        self.escalating
    }

    /// Input is disabled while a reply is pending and after escalation
    pub fn accepts_input(&self) -> bool {
        matches!(
            self.phase,
            Phase::Active {
                busy: false,
                escalated: false
            }
        )
    }

    pub fn can_send(&self) -> bool {
        self.accepts_input() && !self.input.trim().is_empty()
    }

    // Session start

    pub fn request_session(&mut self) -> Result<NewSessionRequest, ChatError> {
        if self.phase.is_started() {
            return Err(ChatError::AlreadyStarted);
        }
        if self.starting {
            return Err(ChatError::StartPending);
        }

        let customer_name = self.name_input.trim();
        if customer_name.is_empty() {
            return Err(ChatError::EmptyName);
        }

        self.starting = true;
        Ok(NewSessionRequest {
            customer_name: customer_name.to_string(),
        })
    }

    pub fn finish_session(
        &mut self,
        request: NewSessionRequest,
        outcome: Result<NewSessionReply>,
    ) -> Result<(), ChatError> {
        if !self.starting || self.phase.is_started() {
            debug!("Ignoring session reply that is no longer awaited");
            return Ok(());
        }
        self.starting = false;

        match outcome {
            Ok(reply) => {
                info!(session_id = %reply.session_id, "Chat session started");
                self.messages = vec![ChatMessage::assistant(welcome_message(
                    &request.customer_name,
                ))];
                self.session = Some(Session {
                    id: reply.session_id,
                    customer_name: request.customer_name,
                });
                self.phase = Phase::Active {
                    busy: false,
                    escalated: false,
                };
                Ok(())
            }
            Err(e) => {
                error!("Error starting session: {:#}", e);
                Err(ChatError::SessionStartFailed)
            }
        }
    }

    // Queries

    /// Appends the user's message right away and marks the conversation busy
    pub fn begin_send(&mut self) -> Result<QueryRequest, ChatError> {
        let Some(session) = &self.session else {
            return Err(ChatError::NoSession);
        };
        match self.phase {
            Phase::NotStarted => return Err(ChatError::NoSession),
            Phase::Active { busy: true, .. } => return Err(ChatError::Busy),
            Phase::Active {
                escalated: true, ..
            } => return Err(ChatError::Escalated),
            Phase::Active { .. } => {}
        }
        if self.input.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let request = QueryRequest {
            session_id: session.id.clone(),
            customer_name: session.customer_name.clone(),
            message: std::mem::take(&mut self.input),
        };

        self.messages.push(ChatMessage::user(request.message.clone()));
        self.set_busy(true);
        Ok(request)
    }

    /// Failures become a fallback assistant message; the chat stays usable
    pub fn finish_query(&mut self, session_id: &str, outcome: Result<QueryReply>) {
        if !self.is_current(session_id) {
            debug!(session_id, "Discarding query reply for a previous session");
            return;
        }

        match outcome {
            Ok(reply) if reply.escalated => {
                info!(session_id, "Assistant escalated the conversation");
                self.messages.push(ChatMessage::escalation(reply.response));
                self.mark_escalated();
            }
            Ok(reply) => {
                self.messages.push(ChatMessage::assistant(reply.response));
            }
            Err(e) => {
                warn!(session_id, "Error sending message: {:#}", e);
                self.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
            }
        }
        self.set_busy(false);
    }

    // Escalation

    pub fn begin_escalation(&mut self) -> Result<EscalationRequest, ChatError> {
        let session = self.session.as_ref().ok_or(ChatError::NoSession)?;
        if self.escalating {
            return Err(ChatError::EscalationPending);
        }

        self.escalating = true;
        Ok(EscalationRequest {
            session_id: session.id.clone(),
            reason: ESCALATION_REASON.to_string(),
        })
    }

    /// Failures are logged only; nothing changes for the user
    pub fn finish_escalation(&mut self, session_id: &str, outcome: Result<EscalationReply>) {
        if !self.is_current(session_id) {
            debug!(session_id, "Discarding escalation reply for a previous session");
            return;
        }
        self.escalating = false;

        match outcome {
            Ok(reply) => {
                info!(session_id, "Conversation escalated to a human agent");
                self.messages.push(ChatMessage::escalation(reply.message));
                self.mark_escalated();
            }
            Err(e) => error!(session_id, "Error escalating: {:#}", e),
        }
    }

    // FAQ catalog

    pub fn faqs_loaded(&mut self, outcome: Result<FaqCatalog>) {
        match outcome {
            Ok(faqs) => {
                debug!(categories = faqs.len(), "FAQ catalog loaded");
                self.faqs = faqs;
            }
            Err(e) => error!("Error fetching FAQs: {:#}", e),
        }
    }

    /// Back to the welcome screen. The FAQ catalog is reference data and survives.
    pub fn restart(&mut self) {
        if let Some(session) = &self.session {
            info!(session_id = %session.id, "Restarting chat");
        }
        let faqs = std::mem::take(&mut self.faqs);
        *self = Self {
            faqs,
            ..Self::default()
        };
    }

    // Awaiting drivers

    pub async fn start(&mut self, api: &dyn SupportApi) -> Result<(), ChatError> {
        let request = self.request_session()?;
        let outcome = api.create_session(&request).await;
        self.finish_session(request, outcome)
    }

    pub async fn send(&mut self, api: &dyn SupportApi) -> Result<(), ChatError> {
        let request = self.begin_send()?;
        let outcome = api.send_query(&request).await;
        self.finish_query(&request.session_id, outcome);
        Ok(())
    }

    pub async fn escalate(&mut self, api: &dyn SupportApi) -> Result<(), ChatError> {
        let request = self.begin_escalation()?;
        let outcome = api.escalate(&request).await;
        self.finish_escalation(&request.session_id, outcome);
        Ok(())
    }

    pub async fn load_faqs(&mut self, api: &dyn SupportApi) {
        let outcome = api.list_faqs().await;
        self.faqs_loaded(outcome);
    }

    fn is_current(&self, session_id: &str) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == session_id)
    }

    fn set_busy(&mut self, value: bool) {
        if let Phase::Active { busy, .. } = &mut self.phase {
            *busy = value;
        }
    }

    fn mark_escalated(&mut self) {
        if let Phase::Active { escalated, .. } = &mut self.phase {
            *escalated = true;
        }
    }
}
