//! agent モジュールの公開型定義

use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent,
};

/// バックエンドが選択した、検証前の生の呼び出し。
/// arguments は Tool Call の JSON 文字列そのままで、完全性は保証されない。
#[derive(Debug, Clone, PartialEq)]
pub struct RawInvocation {
    pub name: String,
    pub arguments: String,
}

/// 会話の状態。過去ターンの (リクエスト, 応答) をチャットメッセージとして保持する。
#[derive(Default)]
pub struct ConversationState {
    messages: Vec<ChatCompletionRequestMessage>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 完了した 1 ターン分をメッセージ履歴に追加する。
    pub fn push_turn(&mut self, request: &str, response: &str) {
        self.messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.to_string()),
                name: None,
            },
        ));
        self.messages.push(ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                    response.to_string(),
                )),
                ..Default::default()
            },
        ));
    }

    /// 過去ターンのメッセージ列を返す。
    pub fn messages(&self) -> &[ChatCompletionRequestMessage] {
        &self.messages
    }

    /// 記録済みのターン数を返す。
    pub fn turns(&self) -> usize {
        self.messages.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_turn_appends_user_and_assistant_messages() {
        let mut state = ConversationState::new();
        state.push_turn("list users", "- Alice (alice@wonderland.io)");
        state.push_turn("thanks", "You're welcome.");

        assert_eq!(state.turns(), 2);
        assert_eq!(state.messages().len(), 4);
        assert!(matches!(
            state.messages()[0],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            state.messages()[1],
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }
}
