// ABOUTME: Backend that forwards each turn to a remote chat server over HTTP.
// ABOUTME: POST {base_url}/api/chat/{domain}; keeps the server's conversation_id between turns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{Backend, BackendReply};
use crate::error::BackendError;
use crate::knowledge::Domain;

/// Longest slice of an unparseable error body kept in `BackendError::Status`
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
    conversation_id: Option<String>,
    timestamp: Option<String>,
}

/// Server-side conversation this backend is attached to
#[derive(Debug, Default)]
struct Session {
    conversation_id: Option<String>,
    /// Bumped by reset so a reply to an older request cannot reattach
    generation: u64,
}

pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    session: Mutex<Session>,
}

impl HttpBackend {
    pub fn new(base_url: &str, domain: Domain, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(Self::with_client(client, base_url, domain, timeout))
    }

    /// Use a preconfigured client. `timeout` is only reported in `BackendError::Timeout`.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        domain: Domain,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/chat/{}", base_url.trim_end_matches('/'), domain),
            timeout,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Conversation ID issued by the server, once one has been seen
    pub fn conversation_id(&self) -> Option<String> {
        self.session().conversation_id.clone()
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn map_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Request(err.to_string())
        }
    }
}

/// Interpret a response body. Any JSON body in the chat shape is a reply,
/// whatever the status; other bodies are errors.
fn parse_reply(status: u16, body: &str) -> Result<(BackendReply, Option<String>), BackendError> {
    let response: ChatResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) if !(200..300).contains(&status) => {
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(BackendError::Status { status, body });
        }
        Err(e) => return Err(BackendError::Malformed(e.to_string())),
    };

    let timestamp = response
        .timestamp
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let reply = if response.success {
        let message = response
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| BackendError::Malformed("success without a message".to_string()))?;
        BackendReply {
            success: true,
            message,
            timestamp,
        }
    } else {
        BackendReply {
            success: false,
            message: response.error.or(response.message).unwrap_or_default(),
            timestamp,
        }
    };

    Ok((reply, response.conversation_id))
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, message: &str) -> Result<BackendReply, BackendError> {
        let (conversation_id, generation) = {
            let session = self.session();
            (session.conversation_id.clone(), session.generation)
        };
        let request = ChatRequest {
            message,
            conversation_id,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        let (reply, issued_id) = parse_reply(status, &body)?;
        if let Some(id) = issued_id {
            let mut session = self.session();
            if session.generation == generation {
                session.conversation_id = Some(id);
            }
        }

        if !reply.success {
            tracing::warn!(status, error = %reply.message, "Chat server declined the request");
        }
        Ok(reply)
    }

    fn reset(&self) {
        let mut session = self.session();
        session.conversation_id = None;
        session.generation = session.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_endpoint_joins_base_url() {
        let backend =
            HttpBackend::new("http://localhost:5000/", Domain::Tire, Duration::from_secs(5))
                .unwrap();
        assert_eq!(backend.endpoint(), "http://localhost:5000/api/chat/tire");
    }

    #[test]
    fn test_parse_success() {
        let body = r#"{"success": true, "message": "Use LFP.", "agent": "BatteryEdge AI",
            "conversation_id": "battery_1", "timestamp": "2026-02-05T10:23:45Z"}"#;
        let (reply, id) = parse_reply(200, body).unwrap();
        assert!(reply.success);
        assert_eq!(reply.message, "Use LFP.");
        assert_eq!(reply.timestamp.to_rfc3339(), "2026-02-05T10:23:45+00:00");
        assert_eq!(id.as_deref(), Some("battery_1"));
    }

    #[test]
    fn test_parse_declined_with_error_status() {
        let body = r#"{"success": false, "error": "AI model not initialized"}"#;
        let (reply, id) = parse_reply(500, body).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message, "AI model not initialized");
        assert!(id.is_none());
    }

    #[test]
    fn test_parse_success_without_message_is_malformed() {
        let err = parse_reply(200, r#"{"success": true}"#).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[test]
    fn test_parse_non_json_error_status() {
        let err = parse_reply(502, "<html>bad gateway</html>").unwrap_err();
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.contains("bad gateway"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_non_json_ok_status_is_malformed() {
        let err = parse_reply(200, "not json").unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    fn local_backend(base: &str, domain: Domain) -> HttpBackend {
        let timeout = Duration::from_secs(5);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .unwrap();
        HttpBackend::with_client(client, base, domain, timeout)
    }

    /// Serve one canned JSON response per connection and hand back each raw request.
    async fn serve(responses: Vec<&'static str>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for body in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                    let text = String::from_utf8_lossy(&buf).to_string();
                    if let Some(end) = text.find("\r\n\r\n") {
                        let length = text[..end]
                            .lines()
                            .find_map(|l| {
                                let lower = l.to_ascii_lowercase();
                                lower
                                    .strip_prefix("content-length:")
                                    .map(|v| v.trim().parse::<usize>().unwrap())
                            })
                            .unwrap_or(0);
                        if buf.len() >= end + 4 + length {
                            break;
                        }
                    }
                    if n == 0 {
                        break;
                    }
                }
                requests.push(String::from_utf8_lossy(&buf).to_string());
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn test_send_round_trip_keeps_conversation_id() {
        let (base, server) = serve(vec![
            r#"{"success": true, "message": "first", "conversation_id": "clutch_42"}"#,
            r#"{"success": true, "message": "second", "conversation_id": "clutch_42"}"#,
        ])
        .await;

        let backend = local_backend(&base, Domain::Clutch);
        assert_eq!(backend.send("hello").await.unwrap().message, "first");
        assert_eq!(backend.conversation_id().as_deref(), Some("clutch_42"));
        assert_eq!(backend.send("again").await.unwrap().message, "second");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/chat/clutch "));
        assert!(requests[0].contains(r#""message":"hello""#));
        assert!(!requests[0].contains("conversation_id"));
        assert!(requests[1].contains(r#""conversation_id":"clutch_42""#));
    }

    #[tokio::test]
    async fn test_reset_forgets_conversation_id() {
        let (base, server) = serve(vec![
            r#"{"success": true, "message": "first", "conversation_id": "tire_7"}"#,
            r#"{"success": true, "message": "fresh", "conversation_id": "tire_8"}"#,
        ])
        .await;

        let backend = local_backend(&base, Domain::Tire);
        backend.send("hello").await.unwrap();
        backend.reset();
        assert!(backend.conversation_id().is_none());

        backend.send("start over").await.unwrap();
        assert_eq!(backend.conversation_id().as_deref(), Some("tire_8"));

        let requests = server.await.unwrap();
        assert!(!requests[1].contains("conversation_id"));
    }

    #[tokio::test]
    async fn test_engine_reset_starts_a_new_server_conversation() {
        use crate::engine::Engine;
        use crate::knowledge::KnowledgeBase;
        use std::sync::Arc;

        let (base, server) = serve(vec![
            r#"{"success": true, "message": "first", "conversation_id": "clutch_1"}"#,
            r#"{"success": true, "message": "second", "conversation_id": "clutch_2"}"#,
        ])
        .await;

        let identity = KnowledgeBase::builtin(Domain::Clutch).unwrap().identity;
        let engine = Engine::new(identity, Arc::new(local_backend(&base, Domain::Clutch)));

        engine.submit("first").await;
        engine.reset();
        let outcome = engine.submit("second after reset").await;
        assert_eq!(outcome.message().unwrap().text, "second");

        let requests = server.await.unwrap();
        assert!(requests[1].contains(r#""message":"second after reset""#));
        assert!(!requests[1].contains("conversation_id"));
    }

    #[tokio::test]
    async fn test_send_to_closed_port_is_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = local_backend(&format!("http://{addr}"), Domain::Frame);
        let err = backend.send("hello").await.unwrap_err();
        assert!(matches!(err, BackendError::Request(_)), "{err:?}");
    }
}
