//! Conversation held by one agent while it works on one task

use crate::llm::{Message, ToolCall};

/// Max tokens for a single tool result (keeps search dumps from crowding the prompt)
const MAX_TOOL_RESULT_TOKENS: usize = 2_000;

pub struct TaskConversation {
    messages: Vec<Message>,
}

impl TaskConversation {
    pub fn new(system_prompt: impl Into<String>, task_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(task_prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Add an assistant turn with tool calls (required before tool results for OpenAI)
    pub fn add_assistant_tool_calls(&mut self, text: Option<&str>, tool_calls: &[ToolCall]) {
        self.messages
            .push(Message::assistant_tool_calls(text, tool_calls));
    }

    /// Add a tool result (auto-truncates if too large)
    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, result: &str) {
        let truncated = Self::truncate_if_needed(result, MAX_TOOL_RESULT_TOKENS);
        self.messages
            .push(Message::tool_result(tool_call_id, truncated));
    }

    fn truncate_if_needed(text: &str, max_tokens: usize) -> String {
        if Self::estimate_tokens(text) <= max_tokens {
            return text.to_string();
        }

        // ~4 chars per token
        let truncated: String = text.chars().take(max_tokens * 4).collect();
        format!("{}\n\n... [TRUNCATED]", truncated)
    }

    /// Estimate tokens in text (~4 chars per token for English)
    pub fn estimate_tokens(text: &str) -> usize {
        text.len().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn starts_with_system_and_task() {
        let conv = TaskConversation::new("You are a Technology Specialist.", "List requirements");
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[0].role, Role::System);
        assert_eq!(conv.messages()[1].role, Role::User);
    }

    #[test]
    fn large_tool_results_are_truncated() {
        let mut conv = TaskConversation::new("s", "u");
        let huge = "x".repeat(MAX_TOOL_RESULT_TOKENS * 4 + 100);
        conv.add_tool_result("call_1", &huge);

        let stored = conv.messages()[2].text().unwrap();
        assert!(stored.ends_with("[TRUNCATED]"));
        assert!(stored.len() < huge.len());
    }

    #[test]
    fn small_tool_results_are_kept() {
        let mut conv = TaskConversation::new("s", "u");
        conv.add_tool_result("call_1", "Title: a");
        assert_eq!(conv.messages()[2].text(), Some("Title: a"));
        assert_eq!(conv.messages()[2].tool_call_id.as_deref(), Some("call_1"));
    }
}
