//! 起動・終了バナー

use chrono::{Local, Timelike};
use rand::Rng;

use super::assistant::assistant_talk;
use super::color::{bold_cyan, cyan, white, yellow};

/// 時間帯に応じた挨拶を返す。
///  - 5〜11時:  "Good morning"
///  - 12〜17時: "Good afternoon"
///  - 18〜4時:  "Good evening"
fn time_greeting() -> &'static str {
    let hour = Local::now().hour();
    match hour {
        5..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

/// 起動時の Welcome バナーを表示する。
pub fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    let greeting = time_greeting();

    let art_lines: &[&str] = &[
        r#" _   _ ___ ___ ___ ___  ___ ___ _  __"#,
        r#"| | | / __| __| _ \   \| __/ __| |/ /"#,
        r#"| |_| \__ \ _||   / |) | _|\__ \ ' < "#,
        r#" \___/|___/___|_|_\___/|___|___/_|\_\"#,
    ];

    let separator = "=====================================";
    let version_line = format!(
        "  {}  ::  {} {}",
        bold_cyan("USERDESK"),
        white("User Database Assistant"),
        yellow(&format!("v{version}"))
    );

    println!();
    for line in art_lines {
        println!("{}", white(line));
    }
    println!("{}", cyan(separator));
    println!("{}", yellow(&version_line));
    println!("{}", cyan(separator));
    println!();
    assistant_talk(&format!(
        "{greeting}. Ask me to list, find, add, update, or delete users. \
         Type 'exit' to end the conversation."
    ));
    println!();
}

/// 終了時の Farewell メッセージを表示する。
pub fn print_goodbye() {
    let messages: &[&str] = &[
        "Goodbye! The user database is all tidied up.",
        "Goodbye! Come back whenever the records need attention.",
        "Goodbye! I'll keep the user list safe until next time.",
    ];

    let idx = rand::rng().random_range(0..messages.len());

    println!();
    assistant_talk(messages[idx]);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_greeting_returns_valid_string() {
        let g = time_greeting();
        assert!(
            g == "Good morning" || g == "Good afternoon" || g == "Good evening",
            "unexpected greeting: {g}"
        );
    }
}
