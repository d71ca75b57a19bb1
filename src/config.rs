//! 設定ファイル管理
//!
//! `~/.config/userdesk/config.toml` から TOML 形式の設定を読み込む。
//! ファイルが存在しない場合はデフォルト値を使用する。
//!
//! # 設定ファイル例
//!
//! ```toml
//! [ai]
//! model = "gpt-4o"
//!
//! [database]
//! path = "/path/to/users.db"
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

/// userdesk の設定全体
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct UserdeskConfig {
    /// AI 関連設定
    pub ai: AiConfig,
    /// データベース関連設定
    pub database: DatabaseConfig,
}

/// AI 関連の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// 使用する AI モデル名
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
        }
    }
}

/// データベース関連の設定
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// DB ファイルのパス。未指定の場合はプラットフォーム標準のデータディレクトリ。
    pub path: Option<PathBuf>,
}

impl UserdeskConfig {
    /// 設定ファイルを読み込む。
    ///
    /// `~/.config/userdesk/config.toml` が存在すればパースし、
    /// 存在しなければテンプレートを生成してデフォルト値を返す。
    /// パースエラーの場合は警告を表示してデフォルト値を返す。
    pub fn load() -> Self {
        let path = Self::config_path();
        debug!(path = %path.display(), "Loading config file");

        if !path.exists() {
            Self::create_default_config(&path);
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<UserdeskConfig>(&content) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        model = %config.ai.model,
                        db_path = ?config.database.path,
                        "Config loaded successfully"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    eprintln!("userdesk: warning: failed to parse config file: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file");
                eprintln!("userdesk: warning: failed to read config file: {e}");
                Self::default()
            }
        }
    }

    /// 設定ファイルのパスを返す。
    ///
    /// macOS / Linux 共通で `~/.config/userdesk/config.toml` を使用する。
    /// `$HOME` が取得できない場合は `./.config/userdesk/config.toml` にフォールバックする。
    pub fn config_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/userdesk/config.toml")
    }

    /// 設定ファイルが存在しない場合にテンプレートから生成する。
    ///
    /// 親ディレクトリが存在しなければ再帰的に作成する。
    /// 生成に失敗した場合は警告を表示するが、起動は継続する。
    fn create_default_config(path: &std::path::Path) {
        const TEMPLATE: &str = r#"# userdesk configuration
#
# You can write settings like this:

[ai]
# model = "gpt-4o"

[database]
# path = "/path/to/users.db"
"#;

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create config directory");
                eprintln!("userdesk: warning: failed to create config directory: {e}");
                return;
            }
        }

        match std::fs::write(path, TEMPLATE) {
            Ok(()) => {
                info!(path = %path.display(), "Created default config file");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to create default config file");
                eprintln!("userdesk: warning: failed to create config file: {e}");
            }
        }
    }
}
