//! OpenAI-compatible `/chat/completions` client.
//!
//! Non-streaming, single user message per request. The request timeout is
//! the generator's deadline: the dispatcher imposes none of its own.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ReplyError, ReplyGenerator};

/// How much upstream error body to keep in [`ReplyError::Api`].
const ERROR_BODY_LIMIT: usize = 512;

/// Configuration for [`OpenAiReplyGenerator`].
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API base, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model ID sent with each request.
    pub model: String,
    /// Per-request deadline.
    pub timeout: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator
// ─────────────────────────────────────────────────────────────────────────────

/// Reply generator backed by an OpenAI-compatible chat completions API.
pub struct OpenAiReplyGenerator {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiReplyGenerator {
    /// Build a generator with its own HTTP client.
    pub fn new(config: OpenAiConfig) -> Result<Self, ReplyError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiReplyGenerator {
    async fn generate_reply(&self, prompt: &str) -> Result<String, ReplyError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            message.truncate(ERROR_BODY_LIMIT);
            return Err(ReplyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatCompletionResponse = response.json().await?;
        let reply = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(ReplyError::MissingContent)?;

        debug!(model = %self.config.model, chars = reply.len(), "reply generated");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> OpenAiConfig {
        OpenAiConfig {
            base_url,
            api_key: "test-key".into(),
            model: "gpt-4o".into(),
            timeout: Duration::from_secs(5),
        }
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn extracts_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let generator = OpenAiReplyGenerator::new(config(server.uri())).unwrap();
        let reply = generator.generate_reply("hello").await.unwrap();
        assert_eq!(reply, "hi there");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let generator = OpenAiReplyGenerator::new(config(server.uri())).unwrap();
        let err = generator.generate_reply("hello").await.unwrap_err();
        match err {
            ReplyError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_missing_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let generator = OpenAiReplyGenerator::new(config(server.uri())).unwrap();
        let err = generator.generate_reply("hello").await.unwrap_err();
        assert!(matches!(err, ReplyError::MissingContent));
    }

    #[tokio::test]
    async fn null_content_is_missing_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let generator = OpenAiReplyGenerator::new(config(server.uri())).unwrap();
        let err = generator.generate_reply("hello").await.unwrap_err();
        assert!(matches!(err, ReplyError::MissingContent));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut cfg = config(server.uri());
        cfg.timeout = Duration::from_millis(100);
        let generator = OpenAiReplyGenerator::new(cfg).unwrap();
        let err = generator.generate_reply("hello").await.unwrap_err();
        match err {
            ReplyError::Http(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn trailing_slash_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .mount(&server)
            .await;

        let generator =
            OpenAiReplyGenerator::new(config(format!("{}/", server.uri()))).unwrap();
        assert_eq!(generator.generate_reply("x").await.unwrap(), "ok");
    }
}
