//! Chat completions wire types

use mdt_domain::{GenerationOptions, Message};
use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    pub stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn new(
        messages: &'a [Message],
        options: &'a GenerationOptions,
        max_tokens: Option<u32>,
        stream: bool,
    ) -> Self {
        Self {
            model: options.model.as_str(),
            messages,
            temperature: options.temperature,
            max_tokens,
            response_format: options.json_mode.then_some(ResponseFormat::JSON_OBJECT),
            stream,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    pub const JSON_OBJECT: Self = Self {
        kind: "json_object",
    };
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// Concatenated content deltas of this chunk.
    pub fn delta_text(&self) -> String {
        self.choices
            .iter()
            .filter_map(|choice| choice.delta.content.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdt_domain::Model;
    use serde_json::json;

    #[test]
    fn test_request_omits_unset_fields() {
        let messages = [Message::system("sys"), Message::user("hi")];
        let options = GenerationOptions::new(Model::Grok4);
        let body = serde_json::to_value(ChatCompletionRequest::new(&messages, &options, None, false))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "model": "grok-4",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_json_mode_and_limits() {
        let messages = [Message::user("hi")];
        let mut options = GenerationOptions::new(Model::Gpt51).json();
        options.temperature = Some(0.5);
        let body =
            serde_json::to_value(ChatCompletionRequest::new(&messages, &options, Some(512), true))
                .unwrap();
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["max_tokens"], json!(512));
        assert_eq!(body["stream"], json!(true));
    }

    #[test]
    fn test_chunk_delta_text() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.delta_text(), "Hel");

        let finish: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#).unwrap();
        assert_eq!(finish.delta_text(), "");
    }

    #[test]
    fn test_response_into_text() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
                .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("ok"));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.into_text(), None);
    }
}
