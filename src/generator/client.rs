use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{parse_sse_line, ChatRequest, ChatResponse, Message, SseEvent};
use super::TextGenerator;
use crate::config::{GeneratorConfig, RequestConfig};
use crate::error::{GeneratorError, GeneratorResult};

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct HttpGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    streaming: bool,
    stream_timeout: Duration,
    request_config: RequestConfig,
}

impl HttpGenerator {
    /// Create a new generator client
    pub fn new(config: &GeneratorConfig, request_config: RequestConfig) -> GeneratorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(GeneratorError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            streaming: config.streaming,
            stream_timeout: Duration::from_millis(config.stream_timeout_ms),
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Non-streaming completion with exponential backoff
    pub async fn complete(&self, api_key: &str, messages: &[Message]) -> GeneratorResult<String> {
        let url = self.completions_url();
        let request = ChatRequest::new(&self.model, messages.to_vec());

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    model = %self.model,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying completion request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, api_key, &request).await {
                Ok(text) => {
                    info!(
                        model = %self.model,
                        latency_ms = start.elapsed().as_millis(),
                        "Completion succeeded"
                    );
                    return Ok(text);
                }
                Err(e) => {
                    error!(
                        model = %self.model,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Completion failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(GeneratorError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        api_key: &str,
        request: &ChatRequest,
    ) -> GeneratorResult<String> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Calling chat completions"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        chat.text()
            .map(str::to_string)
            .ok_or_else(|| GeneratorError::InvalidResponse {
                message: "Response contained no choices".to_string(),
            })
    }

    /// Streamed completion, accumulated into one string
    pub async fn stream(&self, api_key: &str, messages: &[Message]) -> GeneratorResult<String> {
        let request = ChatRequest::new(&self.model, messages.to_vec()).streaming();

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut text = String::new();

        'read: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(GeneratorError::Http)?;
            buffer.extend_from_slice(&chunk);

            // A chunk may end inside a multi-byte character, so only whole lines are decoded
            while let Some(line) = take_line(&mut buffer) {
                match parse_sse_line(&line) {
                    SseEvent::Delta(delta) => text.push_str(&delta),
                    SseEvent::Done => break 'read,
                    SseEvent::Skip => {}
                }
            }
        }

        if let SseEvent::Delta(delta) = parse_sse_line(&String::from_utf8_lossy(&buffer)) {
            text.push_str(&delta);
        }

        if text.is_empty() {
            return Err(GeneratorError::InvalidResponse {
                message: "Stream ended without content".to_string(),
            });
        }
        Ok(text)
    }

    fn map_send_error(&self, e: reqwest::Error) -> GeneratorError {
        if e.is_timeout() {
            GeneratorError::Timeout {
                timeout_ms: self.request_config.timeout_ms,
            }
        } else {
            GeneratorError::Http(e)
        }
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, messages: Vec<Message>) -> GeneratorResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GeneratorError::MissingCredential)?;

        if self.streaming {
            match tokio::time::timeout(self.stream_timeout, self.stream(api_key, &messages)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => {
                    warn!(error = %e, "Streaming failed, falling back to a single request");
                }
                Err(_) => {
                    warn!(
                        timeout_ms = self.stream_timeout.as_millis(),
                        "Streaming timed out, falling back to a single request"
                    );
                }
            }
        }

        self.complete(api_key, &messages).await
    }
}

/// Remove the first complete line from `buffer` and decode it.
fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    let line_end = buffer.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=line_end).collect();
    Some(String::from_utf8_lossy(&line).into_owned())
}
