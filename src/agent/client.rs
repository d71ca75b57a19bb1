//! OpenAI API クライアント — 意図選択バックエンドの本番実装
//!
//! リクエストと会話履歴、選択可能アクションの Tool 定義を OpenAI に送信し、
//! Tool Call（= アクション選択）またはテキスト応答を受け取る。
//! テキストはストリーミングで表示済みの状態で返る。

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, ChatCompletionTool, CreateChatCompletionRequest,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::AiConfig;

use super::backend::{IntentBackend, Selection};
use super::prompts::SYSTEM_PROMPT;
use super::stream::process_stream;
use super::tools::call::first_invocation;
use super::types::ConversationState;

/// OpenAI バックエンドの AI クライアント
pub struct AssistantAI {
    client: Client<OpenAIConfig>,
    model: String,
}

impl AssistantAI {
    /// OPENAI_API_KEY 環境変数から AI クライアントを初期化する。
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY is not set. AI features are disabled.")?;

        if api_key.is_empty() || api_key == "your_openai_api_key" {
            anyhow::bail!("OPENAI_API_KEY is not configured. Please set a valid API key in .env");
        }

        let openai_config = OpenAIConfig::new().with_api_key(&api_key);
        let client = Client::with_config(openai_config);

        info!(model = %config.model, "AI client initialized");
        Ok(Self {
            client,
            model: config.model.clone(),
        })
    }

    /// システムプロンプト + 会話履歴 + 今回のリクエストからメッセージ列を組み立てる。
    fn build_messages(
        &self,
        request: &str,
        history: &ConversationState,
    ) -> Vec<ChatCompletionRequestMessage> {
        let mut messages = Vec::with_capacity(history.messages().len() + 2);

        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    SYSTEM_PROMPT.to_string(),
                ),
                name: None,
            },
        ));
        messages.extend_from_slice(history.messages());
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.to_string()),
                name: None,
            },
        ));

        messages
    }
}

#[async_trait]
impl IntentBackend for AssistantAI {
    async fn select_action(
        &self,
        request: &str,
        history: &ConversationState,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<Selection> {
        debug!(
            request = %request,
            history_turns = history.turns(),
            eligible_tools = tools.len(),
            "select_action() called"
        );

        let messages = self.build_messages(request, history);
        let chat_request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            tools: Some(tools),
            stream: Some(true),
            ..Default::default()
        };

        let result = process_stream(&self.client, chat_request).await?;

        if result.interrupted {
            info!("Selection interrupted by user");
            return Ok(Selection::Reply(result.full_text));
        }

        // Tool Call があればアクション選択として返す
        if let Some(invocation) = first_invocation(&result.tool_calls) {
            info!(
                selection = "Invoke",
                action = %invocation.name,
                "Backend selected an action"
            );
            return Ok(Selection::Invoke(invocation));
        }

        info!(
            selection = "Reply",
            response_length = result.full_text.len(),
            "Backend replied with text"
        );
        Ok(Selection::Reply(result.full_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn new_fails_without_api_key() {
        let original = std::env::var("OPENAI_API_KEY").ok();
        std::env::remove_var("OPENAI_API_KEY");

        let result = AssistantAI::new(&AiConfig::default());
        assert!(result.is_err());

        if let Some(key) = original {
            std::env::set_var("OPENAI_API_KEY", key);
        }
    }

    #[test]
    #[serial]
    fn new_rejects_placeholder_api_key() {
        let original = std::env::var("OPENAI_API_KEY").ok();
        std::env::set_var("OPENAI_API_KEY", "your_openai_api_key");

        let result = AssistantAI::new(&AiConfig::default());
        assert!(result.is_err());

        match original {
            Some(key) => std::env::set_var("OPENAI_API_KEY", key),
            None => std::env::remove_var("OPENAI_API_KEY"),
        }
    }
}
