use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::config::Config;

/// Custom error types for chat-completion backend interactions
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("The model backend is currently busy. Please try again in a few moments.")]
    ServerBusy,

    #[error("Network connection failed: {message}")]
    NetworkError { message: String },

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {message}")]
    ParseError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl LlmError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            LlmError::ServerBusy => {
                "🚫 The model backend is busy or rate limited. Please try again in a few moments."
                    .to_string()
            }
            LlmError::NetworkError { .. } => {
                "🌐 Network connection failed. Please check your internet connection and try again."
                    .to_string()
            }
            LlmError::Timeout { seconds } => {
                format!(
                    "⏰ Request timed out after {} seconds. The server might be overloaded.",
                    seconds
                )
            }
            LlmError::ApiError { status, .. } => match *status {
                401 => "🔑 The API key was rejected.".to_string(),
                503 => "🚫 Service temporarily unavailable. Please try again later.".to_string(),
                _ => format!("❌ API error ({}). Please try again later.", status),
            },
            LlmError::ParseError { .. } => {
                "⚠️ Failed to parse the model response. Please try again.".to_string()
            }
            LlmError::ConfigError { message } => {
                format!("⚙️ Configuration error: {}", message)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// A function the model may call, described by a JSON schema.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as sent by the backend
    pub arguments: String,
}

impl ToolCall {
    pub fn parse_arguments(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::from_str(&self.function.arguments)
    }
}

/// Everything needed for one completion call.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    /// Force the model to answer with a tool call
    pub require_tool: bool,
    /// Ask for a JSON object instead of free text
    pub json_output: bool,
}

/// The assistant message of a completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatReply, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

/// OpenAI-compatible chat-completion client
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: Config,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl ChatClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self, LlmError> {
        config.validate().map_err(|e| LlmError::ConfigError {
            message: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("litrev_agents/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::ConfigError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        tracing::debug!(
            model = %config.model,
            function_calling = config.model_info.function_calling,
            json_output = config.model_info.json_output,
            vision = config.model_info.vision,
            "Chat client ready"
        );
        Ok(Self { client, config })
    }

    fn tool_payload(&self, tools: &[ToolDefinition]) -> Option<Vec<JsonValue>> {
        if tools.is_empty() || !self.config.model_info.function_calling {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect(),
        )
    }

    /// Map reqwest errors to our custom error types
    fn map_reqwest_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            return LlmError::Timeout {
                seconds: self.config.timeout,
            };
        }

        if error.is_connect() {
            return LlmError::NetworkError {
                message: "Failed to connect to server".to_string(),
            };
        }

        if error.is_request() {
            return LlmError::NetworkError {
                message: "Request failed".to_string(),
            };
        }

        LlmError::NetworkError {
            message: format!("Request error: {}", error),
        }
    }

    /// Handle error responses from the server
    async fn handle_error_response(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> LlmError {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::ServerBusy,
            StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => LlmError::ServerBusy,
            _ => LlmError::ApiError {
                status: status.as_u16(),
                message: error_text,
            },
        }
    }
}

#[async_trait]
impl LlmClient for ChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatReply, LlmError> {
        let tools = self.tool_payload(&request.tools);
        let tool_choice = match (&tools, request.require_tool) {
            (Some(_), true) => Some("required"),
            (Some(_), false) => Some("auto"),
            (None, _) => None,
        };
        let response_format = (request.json_output && self.config.model_info.json_output)
            .then_some(ResponseFormat { format_type: "json_object" });

        let body = ChatRequest {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools,
            tool_choice,
            response_format,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_error_response(status, response).await);
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError { message: format!("Failed to parse API response: {}", e) })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError { message: "No choices in API response".to_string() })?;

        Ok(ChatReply {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ChatClient {
        let mut cfg = Config::default().with_credential("test-key");
        cfg.base_url = server.uri();
        ChatClient::new(cfg).unwrap()
    }

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "arxiv_search".into(),
            description: "Searches arXiv and returns relevant papers.".into(),
            parameters: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        }
    }

    #[test]
    fn new_rejects_missing_credential() {
        let err = ChatClient::new(Config::default()).unwrap_err();
        assert!(matches!(err, LlmError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn returns_tool_calls_and_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "llama-3.3-70b-versatile",
                "tool_choice": "required"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "arxiv_search", "arguments": "{\"query\":\"transformers\"}"}
                        }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete(CompletionRequest {
                messages: vec![ChatMessage::user("hi")],
                tools: vec![search_tool()],
                require_tool: true,
                json_output: false,
            })
            .await
            .unwrap();

        assert_eq!(reply.content, None);
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].parse_arguments().unwrap()["query"], "transformers");

        let received = server.received_requests().await.unwrap();
        let body: JsonValue = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "arxiv_search");
        assert!(body.get("response_format").is_none());
    }

    #[tokio::test]
    async fn json_output_sets_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"response_format": {"type": "json_object"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{}"}}]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete(CompletionRequest {
                messages: vec![ChatMessage::user("hi")],
                json_output: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(reply.content.as_deref(), Some("{}"));
        assert!(reply.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn maps_status_codes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let busy = client.complete(CompletionRequest::default()).await.unwrap_err();
        assert!(matches!(busy, LlmError::ServerBusy));

        let denied = client.complete(CompletionRequest::default()).await.unwrap_err();
        match denied {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(CompletionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ParseError { .. }));
    }
}
