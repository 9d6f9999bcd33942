//! Google Gemini client implementation

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{EngineError, LlmClient};
use crate::message::{ContentPart, Message, MessageContent, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini client speaking the generateContent API
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self, EngineError> {
        let model_id = model.into();
        let base_url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model_id}:generateContent"
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| EngineError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model_id,
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> GeminiRequest {
        let system_instruction = request.system.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text { text: text.clone() }],
        });

        let mut contents = Vec::new();
        for msg in &request.messages {
            let role = match msg.role {
                Role::User | Role::Tool => "user",
                Role::Assistant => "model",
                // System instructions travel out-of-band.
                Role::System => continue,
            };

            let parts = translate_parts(&msg.content);
            if !parts.is_empty() {
                contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts,
                });
            }
        }

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|t| GeminiFunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.input_schema.clone(),
                    })
                    .collect(),
            }])
        };

        GeminiRequest {
            contents,
            system_instruction,
            tools,
            generation_config: request.max_tokens.map(|t| GeminiGenerationConfig {
                max_output_tokens: Some(t as i32),
            }),
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, EngineError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::unknown("No candidates in response"))?;

        let mut content = Vec::new();
        for part in candidate.content.parts {
            match part {
                GeminiPart::Text { text } => {
                    if !text.is_empty() {
                        content.push(ContentPart::Text { text });
                    }
                }
                GeminiPart::FunctionCall { function_call } => {
                    content.push(ContentPart::ToolUse {
                        // Gemini doesn't assign call ids
                        id: format!("call_{}", function_call.name),
                        name: function_call.name,
                        input: function_call.args,
                    });
                }
                _ => {}
            }
        }

        let end_turn = candidate
            .finish_reason
            .map(|r| r == "STOP")
            .unwrap_or(false);

        let usage = resp.usage_metadata.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_token_count),
            output_tokens: u64::from(u.candidates_token_count),
        });

        Ok(LlmResponse {
            content,
            end_turn,
            usage,
        })
    }
}

fn translate_parts(content: &MessageContent) -> Vec<GeminiPart> {
    let parts: Vec<ContentPart> = match content {
        MessageContent::Text(text) => vec![ContentPart::text(text.clone())],
        MessageContent::Parts(parts) => parts.clone(),
    };

    parts
        .into_iter()
        .map(|part| match part {
            ContentPart::Text { text } => GeminiPart::Text { text },
            ContentPart::Image { mime_type, data }
            | ContentPart::File { mime_type, data }
            | ContentPart::Audio { mime_type, data } => GeminiPart::InlineData {
                inline_data: GeminiInlineData { mime_type, data },
            },
            ContentPart::ToolUse { id: _, name, input } => GeminiPart::FunctionCall {
                function_call: GeminiFunctionCall { name, args: input },
            },
            ContentPart::ToolResult {
                tool_use_id: _,
                content,
                is_error,
            } => GeminiPart::FunctionResponse {
                function_response: GeminiFunctionResponse {
                    // Gemini doesn't track call ids
                    name: "function".to_string(),
                    response: serde_json::json!({
                        "result": content,
                        "error": is_error,
                    }),
                },
            },
        })
        .collect()
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, EngineError> {
        let gemini_request = self.translate_request(request);
        let url = format!("{}?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    EngineError::network(format!("Connection failed: {e}"))
                } else {
                    EngineError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                let message = error_resp.error.message;
                return Err(match status.as_u16() {
                    400 => EngineError::invalid_request(format!("Invalid request: {message}")),
                    401 | 403 => EngineError::auth(format!("Authentication failed: {message}")),
                    429 => EngineError::rate_limit(format!("Rate limit exceeded: {message}")),
                    500..=599 => EngineError::server_error(format!("Server error: {message}")),
                    _ => EngineError::unknown(format!("HTTP {status}: {message}")),
                });
            }
            return Err(EngineError::unknown(format!("HTTP {status} error: {body}")));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            EngineError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ToolDefinition;

    fn client() -> GeminiClient {
        GeminiClient::new("test-key".to_string(), "gemini-2.0-flash").unwrap()
    }

    #[test]
    fn test_translate_maps_roles_and_system() {
        let request = LlmRequest {
            system: Some("be helpful".to_string()),
            messages: vec![
                Message::user(vec![ContentPart::text("hi")]),
                Message::assistant_text("hello"),
            ],
            tools: vec![],
            max_tokens: None,
        };

        let wire = client().translate_request(&request);
        assert!(wire.system_instruction.is_some());
        assert_eq!(wire.contents.len(), 2);
        assert_eq!(wire.contents[0].role.as_deref(), Some("user"));
        assert_eq!(wire.contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_translate_inlines_binary_parts() {
        let request = LlmRequest {
            system: None,
            messages: vec![Message::user(vec![
                ContentPart::text("describe"),
                ContentPart::image("image/png", "aWRr"),
                ContentPart::audio("audio/wav", "c291bmQ="),
            ])],
            tools: vec![],
            max_tokens: None,
        };

        let wire = client().translate_request(&request);
        let json = serde_json::to_value(&wire).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "audio/wav");
    }

    #[test]
    fn test_translate_tool_results_as_function_responses() {
        let request = LlmRequest {
            system: None,
            messages: vec![Message::tool_result("call_web_search", "results here", false)],
            tools: vec![],
            max_tokens: None,
        };

        let wire = client().translate_request(&request);
        assert_eq!(wire.contents[0].role.as_deref(), Some("user"));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(
            json["contents"][0]["parts"][0]["functionResponse"]["response"]["result"],
            "results here"
        );
    }

    #[test]
    fn test_translate_declares_tools() {
        let request = LlmRequest {
            system: None,
            messages: vec![Message::user(vec![ContentPart::text("search it")])],
            tools: vec![ToolDefinition {
                name: "web_search".to_string(),
                description: "Search the web".to_string(),
                input_schema: serde_json::json!({"type": "object"}),
            }],
            max_tokens: None,
        };

        let wire = client().translate_request(&request);
        let tools = wire.tools.unwrap();
        assert_eq!(tools[0].function_declarations[0].name, "web_search");
    }

    #[test]
    fn test_normalize_text_and_function_call() {
        let resp: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Let me search."},
                        {"functionCall": {"name": "web_search", "args": {"query": "rust"}}}
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }))
        .unwrap();

        let normalized = GeminiClient::normalize_response(resp).unwrap();
        assert!(normalized.end_turn);
        assert_eq!(normalized.text(), "Let me search.");
        let uses = normalized.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].0, "call_web_search");
        assert_eq!(normalized.usage.input_tokens, 10);
    }

    #[test]
    fn test_normalize_empty_candidates_is_error() {
        let resp: GeminiResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(GeminiClient::normalize_response(resp).is_err());
    }
}
