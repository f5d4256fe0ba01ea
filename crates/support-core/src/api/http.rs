use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use super::types::{
    EscalationReply, EscalationRequest, HealthStatus, NewSessionReply, NewSessionRequest,
    QueryReply, QueryRequest, SessionTranscript,
};
use super::SupportApi;
use crate::state::{FaqArticle, FaqCatalog};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone)]
pub struct SupportClient {
    client: Client,
    base_url: String,
}

impl SupportClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        read_json(response, "health check").await
    }

    /// Articles of a single category. Unknown categories are a 404 from the backend.
    pub async fn faq_category(&self, category: &str) -> Result<Vec<FaqArticle>> {
        let url = self.endpoint(&["faqs", category])?;
        let response = self.client.get(url).send().await?;
        let mut body: BTreeMap<String, Vec<FaqArticle>> =
            read_json(response, "FAQ category request").await?;

        body.remove(category)
            .ok_or_else(|| anyhow!("FAQ response did not contain category '{}'", category))
    }

    pub async fn session_transcript(&self, session_id: &str) -> Result<SessionTranscript> {
        let url = self.endpoint(&["chat", "session", session_id])?;
        let response = self.client.get(url).send().await?;
        read_json(response, "session lookup").await
    }

    /// Base URL with each segment appended and percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base URL '{}'", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("base URL '{}' cannot have a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl SupportApi for SupportClient {
    async fn list_faqs(&self) -> Result<FaqCatalog> {
        let url = format!("{}/faqs", self.base_url);
        let response = self.client.get(&url).send().await?;
        read_json(response, "FAQ request").await
    }

    async fn create_session(&self, request: &NewSessionRequest) -> Result<NewSessionReply> {
        let url = format!("{}/chat/new-session", self.base_url);

        // The backend reads the name from the query string, not the body
        let response = self
            .client
            .post(&url)
            .query(&[("customer_name", request.customer_name.as_str())])
            .json(request)
            .send()
            .await?;

        read_json(response, "new session request").await
    }

    async fn send_query(&self, request: &QueryRequest) -> Result<QueryReply> {
        let url = format!("{}/chat/query", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        read_json(response, "query").await
    }

    async fn escalate(&self, request: &EscalationRequest) -> Result<EscalationReply> {
        let url = format!("{}/chat/escalate", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        read_json(response, "escalation request").await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(anyhow!("{} failed with status {}: {}", what, status, text));
    }

    response
        .json::<T>()
        .await
        .with_context(|| format!("could not decode {} response", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_trailing_slash_is_stripped() {
        let client = SupportClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_create_session_sends_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/new-session"))
            .and(query_param("customer_name", "Ana"))
            .and(body_json(json!({ "customer_name": "Ana" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "abc-123",
                "message": "Session created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let reply = client
            .create_session(&NewSessionRequest {
                customer_name: "Ana".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(reply.session_id, "abc-123");
    }

    #[tokio::test]
    async fn test_send_query_decodes_escalation_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/query"))
            .and(body_json(json!({
                "session_id": "abc-123",
                "customer_name": "Ana",
                "message": "my account was hacked"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "abc-123",
                "escalated": true,
                "response": "I am connecting you to a specialist now.",
                "escalation_reason": "Complex issue or user frustration detected."
            })))
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let reply = client
            .send_query(&QueryRequest {
                session_id: "abc-123".to_string(),
                customer_name: "Ana".to_string(),
                message: "my account was hacked".to_string(),
            })
            .await
            .unwrap();

        assert!(reply.escalated);
        assert_eq!(reply.response, "I am connecting you to a specialist now.");
    }

    #[tokio::test]
    async fn test_send_query_missing_escalated_defaults_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": "5-7 business days." })),
            )
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let reply = client
            .send_query(&QueryRequest {
                session_id: "s".to_string(),
                customer_name: "Ana".to_string(),
                message: "shipping?".to_string(),
            })
            .await
            .unwrap();

        assert!(!reply.escalated);
    }

    #[tokio::test]
    async fn test_escalate_posts_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/escalate"))
            .and(body_json(json!({
                "session_id": "abc-123",
                "reason": "Customer requested escalation"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "abc-123",
                "status": "escalated",
                "message": "Your issue has been escalated to support."
            })))
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let reply = client
            .escalate(&EscalationRequest {
                session_id: "abc-123".to_string(),
                reason: "Customer requested escalation".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(reply.message, "Your issue has been escalated to support.");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/escalate"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "detail": "Session not found" })),
            )
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let err = client
            .escalate(&EscalationRequest {
                session_id: "missing".to_string(),
                reason: "Customer requested escalation".to_string(),
            })
            .await
            .unwrap_err();

        let text = err.to_string();
        assert!(text.contains("404"), "unexpected error: {}", text);
        assert!(text.contains("Session not found"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let result = client
            .send_query(&QueryRequest {
                session_id: "s".to_string(),
                customer_name: "Ana".to_string(),
                message: "hello".to_string(),
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_faqs_and_category() {
        let server = MockServer::start().await;
        let shipping = json!([
            { "q": "How long does shipping take?", "a": "Standard shipping takes 5-7 business days." }
        ]);
        Mock::given(method("GET"))
            .and(path("/faqs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "shipping": shipping.clone(),
                "returns": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/faqs/shipping"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "shipping": shipping })),
            )
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let catalog = client.list_faqs().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["shipping"].len(), 1);
        assert!(catalog["returns"].is_empty());

        let articles = client.faq_category("shipping").await.unwrap();
        assert_eq!(articles[0].question, "How long does shipping take?");
    }

    #[tokio::test]
    async fn test_session_transcript() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chat/session/abc-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "abc-123",
                "customer_name": null,
                "created_at": "2024-05-01T10:00:00",
                "messages": [
                    { "role": "user", "content": "hi", "timestamp": "2024-05-01T10:00:05" }
                ],
                "escalated": false,
                "escalation_reason": null
            })))
            .mount(&server)
            .await;

        let client = SupportClient::new(&server.uri());
        let transcript = client.session_transcript("abc-123").await.unwrap();
        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.customer_name, None);
        assert!(!transcript.escalated);
    }

    #[tokio::test]
    async fn test_path_arguments_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/faqs/returns%2Fexchanges%3Fall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "returns/exchanges?all": [{ "q": "Can I swap sizes?", "a": "Yes." }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chat/session/a%23b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "a#b",
                "customer_name": "Ana",
                "created_at": "2024-05-01T10:00:00",
                "messages": [],
                "escalated": false,
                "escalation_reason": null
            })))
            .mount(&server)
            .await;

        let client = SupportClient::new(&format!("{}/", server.uri()));
        let articles = client.faq_category("returns/exchanges?all").await.unwrap();
        assert_eq!(articles[0].answer, "Yes.");

        let transcript = client.session_transcript("a#b").await.unwrap();
        assert_eq!(transcript.session_id, "a#b");
    }
}
