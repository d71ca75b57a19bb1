//! Shell モジュール — REPL ループとシェル状態管理
//!
//! `Shell` 構造体にすべてのシェル状態を集約し、
//! 入力ハンドリングの責務をサブモジュールに分離する。

mod input;

use anyhow::{Context, Result};
use reedline::{Reedline, Signal};
use tracing::{info, warn};

use crate::agent::disambiguator::Disambiguator;
use crate::agent::{AssistantAI, ConversationState};
use crate::cli::highlighter::WhiteHighlighter;
use crate::cli::prompt::DeskPrompt;
use crate::config::UserdeskConfig;
use crate::store::UserStore;

/// Userdesk Shell の状態を管理する構造体。
/// エディタ、AI クライアント、レコードストア、会話状態を保持する。
pub struct Shell {
    editor: Reedline,
    prompt: DeskPrompt,
    ai_client: Option<AssistantAI>,
    disambiguator: Disambiguator,
    store: UserStore,
    conversation_state: ConversationState,
}

impl Shell {
    /// 新しい Shell インスタンスを作成する。
    ///
    /// 設定ファイル、エディタ、プロンプト、レコードストア、AI クライアントを初期化する。
    /// レコードストアの初期化失敗は致命的エラーとして伝播する。
    pub fn new() -> Result<Self> {
        // 設定ファイルの読み込み
        let config = UserdeskConfig::load();

        // レコードストアの初期化（設定ファイルの [database] セクションを反映）
        let store = match &config.database.path {
            Some(path) => UserStore::open_at(path.clone()),
            None => UserStore::open(),
        }
        .context("failed to initialize user store")?;
        info!(db_path = %store.db_path().display(), "User store initialized");

        let editor = Reedline::create().with_highlighter(Box::new(WhiteHighlighter));
        let prompt = DeskPrompt::new();

        // AI クライアントの初期化（設定ファイルの [ai] セクションを反映）
        let ai_client = match AssistantAI::new(&config.ai) {
            Ok(ai) => {
                info!("AI client initialized successfully");
                Some(ai)
            }
            Err(e) => {
                warn!("AI disabled: {e}");
                eprintln!("userdesk: warning: AI disabled: {e}");
                None // API キー未設定時は AI 機能を無効化
            }
        };

        Ok(Self {
            editor,
            prompt,
            ai_client,
            disambiguator: Disambiguator::default(),
            store,
            conversation_state: ConversationState::new(),
        })
    }

    /// REPL ループを実行する。
    ///
    /// ユーザー入力を受け取り、アシスタントに処理を委譲する。
    /// Ctrl-D または exit 入力で終了する。
    pub async fn run(&mut self) {
        crate::cli::banner::print_welcome();

        loop {
            match self.editor.read_line(&self.prompt) {
                Ok(Signal::Success(line)) => {
                    if !self.handle_input(&line).await {
                        break;
                    }
                }
                Ok(Signal::CtrlC) => {
                    info!("Ctrl-C received: clearing current line");
                    // なにもしない
                    println!(); // 改行して次のプロンプトを見やすくする
                }
                Ok(Signal::CtrlD) => {
                    // EOF → シェル終了
                    info!("Ctrl-D received: exiting shell");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "REPL error, exiting");
                    eprintln!("userdesk: error: {e}");
                    break;
                }
            }
        }

        crate::cli::banner::print_goodbye();
    }
}
