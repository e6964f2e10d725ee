//! Shared types for LLM providers

use serde::{Deserialize, Serialize};

/// Role in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a conversation
///
/// Assistant turns may carry tool calls; tool turns carry the id of the
/// call they answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn with_text(role: Role, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_text(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_text(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_text(Role::Assistant, content.into())
    }

    /// Assistant turn that requested tool calls, with any text said alongside
    pub fn assistant_tool_calls(text: Option<&str>, calls: &[ToolCall]) -> Self {
        Self {
            role: Role::Assistant,
            content: text.filter(|t| !t.is_empty()).map(str::to_string),
            tool_calls: calls.to_vec(),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_text(Role::Tool, content.into())
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Response from an LLM
#[derive(Debug, Clone)]
pub enum LlmResponse {
    /// Plain text response
    Text {
        text: String,
        usage: Option<TokenUsage>,
    },
    /// Tool calls requested by the model
    ToolCalls {
        calls: Vec<ToolCall>,
        usage: Option<TokenUsage>,
    },
    /// Mixed response with text and tool calls
    Mixed {
        text: Option<String>,
        tool_calls: Vec<ToolCall>,
        usage: Option<TokenUsage>,
    },
}

impl LlmResponse {
    pub fn text(&self) -> Option<&str> {
        match self {
            LlmResponse::Text { text, .. } => Some(text),
            LlmResponse::Mixed { text, .. } => text.as_deref(),
            LlmResponse::ToolCalls { .. } => None,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            LlmResponse::ToolCalls { calls, .. } => calls,
            LlmResponse::Mixed { tool_calls, .. } => tool_calls,
            LlmResponse::Text { .. } => &[],
        }
    }

    pub fn usage(&self) -> Option<&TokenUsage> {
        match self {
            LlmResponse::Text { usage, .. } => usage.as_ref(),
            LlmResponse::ToolCalls { usage, .. } => usage.as_ref(),
            LlmResponse::Mixed { usage, .. } => usage.as_ref(),
        }
    }
}

/// A tool call from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Definition of a tool for the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_add() {
        let mut total = TokenUsage::default();
        total.add(&TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        });
        total.add(&TokenUsage {
            input_tokens: 1,
            output_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(total.input_tokens, 11);
        assert_eq!(total.output_tokens, 7);
        assert_eq!(total.total_tokens, 18);
    }

    #[test]
    fn test_llm_response_mixed() {
        let response = LlmResponse::Mixed {
            text: Some("Let me search".to_string()),
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "search_internet".to_string(),
                arguments: serde_json::json!({"search_query": "modular storage"}),
            }],
            usage: None,
        };

        assert_eq!(response.text(), Some("Let me search"));
        assert_eq!(response.tool_calls().len(), 1);
        assert!(response.usage().is_none());
    }

    #[test]
    fn test_tool_calls_response_has_no_text() {
        let response = LlmResponse::ToolCalls {
            calls: vec![],
            usage: Some(TokenUsage::default()),
        };
        assert!(response.text().is_none());
        assert!(response.usage().is_some());
    }

    #[test]
    fn test_assistant_tool_calls_message_skips_empty_text() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "search_internet".to_string(),
            arguments: serde_json::json!({}),
        };
        let msg = Message::assistant_tool_calls(Some(""), &[call]);
        assert!(msg.text().is_none());
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_tool_result_keeps_call_id() {
        let msg = Message::tool_result("call_7", "Title: x");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.text(), Some("Title: x"));
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }
}
