// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw corpus text before the vocabulary is built.
//
// Plain-text corpora collected from the web or from e-book
// dumps carry layout noise the tokenizer would otherwise spend
// vocabulary on:
//   - Non-breaking / zero-width spaces and byte order marks
//   - Windows line endings
//   - Tabs and runs of spaces used for indentation
//   - Stray control characters
//   - Long runs of blank lines between sections
//
// Cleaning steps (applied in order):
//   1. Map whitespace variants to ' ' and '\r' to '\n'
//   2. Collapse runs of spaces and trim every line
//   3. Keep at most one blank line between paragraphs
//
// Reference: Rust Book §8 (Strings in Rust)

#[derive(Debug, Default, Clone, Copy)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw text string for tokenisation.
    pub fn clean(&self, text: &str) -> String {
        let normalised: String = text
            .replace("\r\n", "\n")
            .chars()
            .map(normalise_char)
            .collect();

        let mut out         = String::with_capacity(normalised.len());
        let mut blank_run   = 0usize;

        for line in normalised.lines() {
            let line = collapse_spaces(line);

            if line.is_empty() {
                blank_run += 1;
                // Paragraph break: one empty line, however many were present
                if blank_run == 1 && !out.is_empty() {
                    out.push('\n');
                }
                continue;
            }

            blank_run = 0;
            if !out.is_empty() && !out.ends_with("\n\n") {
                out.push('\n');
            }
            out.push_str(&line);
        }

        out.trim().to_string()
    }

    /// Clean a batch of texts, dropping any that end up empty.
    pub fn clean_all<'a, I>(&self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts
            .into_iter()
            .map(|t| self.clean(t))
            .filter(|t| !t.is_empty())
            .collect()
    }
}

fn normalise_char(c: char) -> char {
    match c {
        '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
        '\r' => '\n',
        c if c.is_control() && c != '\n' => ' ',
        c => c,
    }
}

fn collapse_spaces(line: &str) -> String {
    line.split(' ')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello \t  world"), "hello world");
    }

    #[test]
    fn test_windows_line_endings() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("one\r\ntwo"), "one\ntwo");
    }

    #[test]
    fn test_removes_control_and_invisible_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("\u{FEFF}hello\x01world\u{00A0}!"), "hello world !");
    }

    #[test]
    fn test_keeps_single_paragraph_break() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("para one\n\n\n\n  \npara two"), "para one\n\npara two");
    }

    #[test]
    fn test_clean_all_drops_empty_texts() {
        let p = Preprocessor::new();
        let cleaned = p.clean_all(["  ", "text", "\n\n"]);
        assert_eq!(cleaned, vec!["text".to_string()]);
    }
}
