//! Chat-completion backends.
//!
//! Every remote call in the pipeline (classification, summarization,
//! recommendations) is expressed as one [`ChatRequest`] sent through an
//! [`LlmBackend`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http;

/// Request envelope shared by all call shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn user(user: impl Into<String>) -> Self {
        ChatRequest {
            system: None,
            user: user.into(),
            max_tokens: None,
            temperature: 0.0,
        }
    }
}

/// Implemented by anything that can answer a chat request.
pub trait LlmBackend: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiClient {
    api_key: String,
    api_base: String,
    model: String,
    agent: ureq::Agent,
}

impl OpenAiClient {
    pub fn new(api_key: String, api_base: String, model: String, timeout: Duration) -> Self {
        OpenAiClient {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            agent: http::agent(timeout),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl LlmBackend for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &request.user,
        });
        let body = WireRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/chat/completions", self.api_base);
        log::debug!("POST {url} (model={}, max_tokens={:?})", self.model, request.max_tokens);
        let response = match self
            .agent
            .post(&url)
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {}", self.api_key.trim()))
            .send_json(&body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = http::read_body_limited(response, 64 * 1024).unwrap_or_default();
                return Err(http::map_status(code, body));
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(LlmError::Transport(err.to_string()));
            }
        };

        let text = http::read_body_limited(response, http::MAX_RESPONSE_BYTES)?;
        parse_reply(&text)
    }
}

fn parse_reply(body: &str) -> Result<String, LlmError> {
    let parsed: WireResponse =
        serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| LlmError::MalformedResponse("response has no message content".into()))
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireAssistant,
}

#[derive(Debug, Deserialize)]
struct WireAssistant {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_server::{http_response, serve_once};

    fn client(url: &str) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test".into(),
            format!("{url}/v1/"),
            "gpt-3.5-turbo".into(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn sends_system_and_user_messages() {
        let reply = r#"{"choices":[{"message":{"role":"assistant","content":"  - rest\n"}}]}"#;
        let (url, rx) = serve_once(http_response("200 OK", reply));
        let request = ChatRequest {
            system: Some("You are kind.".into()),
            user: "Help".into(),
            max_tokens: Some(256),
            temperature: 0.6,
        };
        let answer = client(&url).complete(&request).unwrap();
        assert_eq!(answer, "- rest");

        let raw = rx.recv().unwrap();
        assert!(raw.starts_with("POST /v1/chat/completions"));
        assert!(raw.contains("Bearer sk-test"));
        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Help");
        assert_eq!(json["max_tokens"], 256);
    }

    #[test]
    fn auth_and_rate_limit_are_distinguished() {
        let (url, _rx) = serve_once(http_response("401 Unauthorized", "{}"));
        let err = client(&url).complete(&ChatRequest::user("x")).unwrap_err();
        assert!(matches!(err, LlmError::Unauthorized(401)));

        let (url, _rx) = serve_once(http_response("429 Too Many Requests", "{}"));
        let err = client(&url).complete(&ChatRequest::user("x")).unwrap_err();
        assert!(matches!(err, LlmError::RateLimited));
    }

    #[test]
    fn malformed_bodies_are_reported() {
        let (url, _rx) = serve_once(http_response("200 OK", "not json"));
        let err = client(&url).complete(&ChatRequest::user("x")).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));

        assert!(matches!(
            parse_reply(r#"{"choices":[]}"#),
            Err(LlmError::MalformedResponse(_))
        ));
    }
}
