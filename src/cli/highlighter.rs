use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

/// ユーザー入力を白色でハイライトするシンプルなハイライター。
/// 入力は常に自然言語のため、構文解析は行わない。
pub struct WhiteHighlighter;

impl Highlighter for WhiteHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        // Color::White は ANSI 7 (灰色) になるため、RGB で明るい白を指定
        styled.push((Style::new().fg(Color::Rgb(255, 255, 255)), line.to_string()));
        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_returns_single_white_segment() {
        let styled = WhiteHighlighter.highlight("add a user named Bob", 0);
        assert_eq!(styled.buffer.len(), 1);
        assert_eq!(styled.buffer[0].1, "add a user named Bob");
    }
}
