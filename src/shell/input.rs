//! 入力ハンドリング
//!
//! ユーザー入力を受け取り、アシスタントの 1 ターン処理に委譲し、
//! 応答種別に応じて表示と会話履歴の記録を行う。

use tracing::{debug, info, warn};

use crate::agent::disambiguator::Disambiguator;
use crate::agent::tools::registry::GREETING;
use crate::agent::turn::{self, TurnKind};
use crate::cli::assistant::{assistant_report_error, assistant_talk};

use super::Shell;

/// AI クライアント無効時の固定応答
const AI_DISABLED_NOTICE: &str =
    "The assistant is unavailable because no OpenAI API key is configured. \
     Set OPENAI_API_KEY and restart to manage users.";

impl Shell {
    /// ユーザー入力を処理する。
    ///
    /// 戻り値: `true` = REPL ループ続行、`false` = シェル終了
    pub(super) async fn handle_input(&mut self, line: &str) -> bool {
        let line = line.trim().to_string();

        if line.is_empty() {
            return true;
        }

        debug!(input = %line, "User input received");

        // exit はアシスタントを介さず直接終了
        if line == "exit" {
            info!("Exit input detected, leaving shell");
            return false;
        }

        // AI 無効時: 挨拶ルールだけは語彙判定で処理できる
        let Some(ai_client) = &self.ai_client else {
            if Disambiguator::is_greeting(&line) {
                assistant_talk(GREETING);
                self.conversation_state.push_turn(&line, GREETING);
            } else {
                assistant_report_error(AI_DISABLED_NOTICE);
            }
            return true;
        };

        // 1 ターン実行: 挨拶ルール → 語彙フィルタ → 選択 → 検証 → ディスパッチ
        let output = match turn::run_turn(
            ai_client,
            &self.disambiguator,
            &self.store,
            &self.conversation_state,
            &line,
        )
        .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Turn failed");
                assistant_report_error(&format!("Something went wrong: {e}"));
                return true;
            }
        };

        // 応答種別に応じて表示（Streamed はストリーミング中に表示済み）
        match output.kind {
            TurnKind::Streamed => {}
            TurnKind::Direct | TurnKind::Clarification => assistant_talk(&output.text),
            TurnKind::Action { error } => {
                if error.is_some() {
                    assistant_report_error(&output.text);
                } else {
                    assistant_talk(&output.text);
                }
            }
        }

        // 会話履歴に記録（次ターンの文脈として使用される）
        self.conversation_state.push_turn(&line, &output.text);
        debug!(turns = self.conversation_state.turns(), "Conversation history updated");

        true
    }
}
