//! アシスタントの発話表示ヘルパー
//!
//! 発話プレフィックス、ストリーミング表示、思考中スピナーを一箇所に集約する。

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::color::{red, white};

/// アシスタントが発話するときに使う共通関数。
/// 先頭に 🗂️ 絵文字を付与し、白色テキストで表示する。
pub fn assistant_talk(message: &str) {
    println!("🗂️  {}", white(message));
}

/// エラー結果を報告するときに使う共通関数。メッセージを赤色で表示する。
pub fn assistant_report_error(message: &str) {
    println!("🗂️  {}", red(message));
}

/// AI 処理中に表示するスピナーを生成・開始する。
pub fn assistant_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("🗂️  {spinner}")
            .expect("Invalid spinner template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// ストリーミング開始時のプレフィックスを表示する（改行なし）。
pub fn assistant_print_prefix() {
    print!("🗂️  ");
}

/// ストリーミング中のテキスト片を表示する（改行なし）。
pub fn assistant_print_chunk(chunk: &str) {
    print!("{}", white(chunk));
}

/// ストリーミング終了時の改行を出力する。
pub fn assistant_print_end() {
    println!();
}
