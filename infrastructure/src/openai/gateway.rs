//! OpenAI-compatible LLM Gateway implementation

use super::endpoints::{Endpoint, EndpointRegistry};
use super::error::{map_http_error, map_transport_error};
use super::protocol::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use super::sse::parse_sse_lines;
use async_trait::async_trait;
use futures::StreamExt;
use mdt_application::ports::llm_gateway::{GatewayError, LlmGateway, StreamHandle};
use mdt_domain::{GenerationOptions, Message, StreamEvent};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Buffer between the SSE reader task and the stream consumer
const STREAM_BUFFER: usize = 64;

/// Request settings shared by every endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    /// Cap on generated tokens, omitted from the request when `None`
    pub max_tokens: Option<u32>,
    /// Time limit for non-streaming requests
    pub request_timeout: Duration,
    /// Time limit for establishing a connection
    pub connect_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_tokens: None,
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(15),
        }
    }
}

/// LLM Gateway for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAiGateway {
    client: Client,
    endpoints: EndpointRegistry,
    settings: GatewaySettings,
}

impl OpenAiGateway {
    pub fn new(endpoints: EndpointRegistry, settings: GatewaySettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        info!(
            "OpenAiGateway initialized (default endpoint: {})",
            endpoints.default_endpoint().base_url
        );

        Ok(Self {
            client,
            endpoints,
            settings,
        })
    }

    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    fn request(
        &self,
        endpoint: &Endpoint,
        messages: &[Message],
        options: &GenerationOptions,
        stream: bool,
    ) -> RequestBuilder {
        let body = ChatCompletionRequest::new(messages, options, self.settings.max_tokens, stream);
        let mut request = self
            .client
            .post(endpoint.chat_completions_url())
            .header("content-type", "application/json")
            .json(&body);
        if let Some(key) = endpoint.api_key() {
            request = request.bearer_auth(key);
        }
        request
    }

    async fn send(
        &self,
        request: RequestBuilder,
        model: &str,
    ) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(map_http_error(status, &body, model))
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<String, GatewayError> {
        let endpoint = self.endpoints.resolve(&options.model);
        debug!(
            "POST {} model={} json_mode={}",
            endpoint.name, options.model, options.json_mode
        );

        let request = self
            .request(endpoint, messages, options, false)
            .timeout(self.settings.request_timeout);
        let response = self.send(request, options.model.as_str()).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        parsed
            .into_text()
            .ok_or_else(|| GatewayError::InvalidResponse("response contained no content".into()))
    }

    async fn complete_streaming(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let endpoint = self.endpoints.resolve(&options.model);
        debug!("POST {} model={} (streaming)", endpoint.name, options.model);

        let request = self.request(endpoint, messages, options, true);
        let response = self.send(request, options.model.as_str()).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let model = options.model.to_string();
        tokio::spawn(async move {
            let mut lines = Box::pin(parse_sse_lines(response.bytes_stream()));
            let mut full_text = String::new();

            while let Some(line) = lines.next().await {
                let data = match line {
                    Ok(data) => data,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                let chunk = match serde_json::from_str::<ChatCompletionChunk>(&data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Skipping unreadable stream chunk from {}: {}", model, e);
                        continue;
                    }
                };
                let text = chunk.delta_text();
                if text.is_empty() {
                    continue;
                }
                full_text.push_str(&text);
                if tx.send(StreamEvent::Delta(text)).await.is_err() {
                    // Consumer went away (cancelled round)
                    debug!("Stream consumer for {} dropped", model);
                    return;
                }
            }

            let _ = tx.send(StreamEvent::Completed(full_text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdt_domain::Model;

    fn gateway() -> OpenAiGateway {
        let registry = EndpointRegistry::new(
            Endpoint::new("default", "http://127.0.0.1:9/v1").with_api_key(Some("sk-test".into())),
        );
        OpenAiGateway::new(registry, GatewaySettings::default()).unwrap()
    }

    #[test]
    fn test_request_carries_auth_and_body() {
        let gateway = gateway();
        let messages = [Message::user("hello")];
        let options = GenerationOptions::new(Model::Gpt51);
        let endpoint = gateway.endpoints().default_endpoint().clone();

        let request = gateway
            .request(&endpoint, &messages, &options, false)
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer sk-test"
        );
        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["model"], "gpt-5.1");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_request_without_key_has_no_auth() {
        let registry = EndpointRegistry::new(Endpoint::new("local", "http://localhost:8000/v1"));
        let gateway = OpenAiGateway::new(registry, GatewaySettings::default()).unwrap();
        let endpoint = gateway.endpoints().default_endpoint().clone();
        let request = gateway
            .request(
                &endpoint,
                &[Message::user("x")],
                &GenerationOptions::new(Model::Qwen3),
                true,
            )
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let err = gateway()
            .complete(&[Message::user("x")], &GenerationOptions::new(Model::Gpt51))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::ConnectionError(_) | GatewayError::RequestFailed(_)
        ));
    }
}
