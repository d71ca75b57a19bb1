//! 意図選択バックエンドの抽象
//!
//! 「リクエスト + 会話履歴 + カタログを与えると、0 または 1 件の
//! アクション呼び出し、もしくはテキスト応答を返す」という外部の推論能力を
//! 1 つのトレイトに閉じ込める。本番は OpenAI 実装（`AssistantAI`）、
//! テストではスクリプト化したモック実装を差し替える。

use anyhow::Result;
use async_openai::types::ChatCompletionTool;
use async_trait::async_trait;

use super::types::{ConversationState, RawInvocation};

/// バックエンドの選択結果
#[derive(Debug)]
pub enum Selection {
    /// カタログ中のアクションを 1 件選択した（引数は未検証）
    Invoke(RawInvocation),
    /// アクションを選ばず、テキストで応答した（確認質問・雑談応答を含む）
    Reply(String),
}

/// 不透明な意図選択能力。
#[async_trait]
pub trait IntentBackend {
    /// 1 リクエストを処理し、アクション呼び出しまたはテキスト応答を返す。
    ///
    /// `tools` はディスアンビゲータによる語彙フィルタ適用後の
    /// 選択可能アクションのみを含む。
    async fn select_action(
        &self,
        request: &str,
        history: &ConversationState,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<Selection>;
}
