//! Precise text ranges for compiler messages.
//!
//! Compiler positions are 1-based points; the editor wants 0-based,
//! half-open ranges that cover the offending token. The heuristics here read
//! the message to decide what to highlight: a quoted token, an identifier
//! run, an operator run, or the word under the reported column.

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{Position, Range};

static TOKEN_IN_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)unexpected token:?\s*'?([^'\s]+)'?").unwrap());

static IDENTIFIER_IN_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:variable|identifier|method|property|field|class)[:\s]+'?([A-Za-z_][A-Za-z0-9_]*)'?")
        .unwrap()
});

static EOF_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)unexpected (?:eof|end of file)|reached end of file").unwrap());

/// Compute the 0-based, half-open range for a message reported at the
/// 1-based `(line, column)`.
pub fn diagnostic_range(text: &str, message: &str, line: u32, column: u32) -> Range {
    let line_idx = line.saturating_sub(1);
    let Some(line_text) = text.lines().nth(line_idx as usize) else {
        return collapsed(line_idx, 0);
    };
    let chars: Vec<char> = line_text.chars().collect();
    let line_len = chars.len() as u32;

    let mut col = column.saturating_sub(1);
    // Column past the end of the line: clamp to the line length.
    if col >= line_len {
        return collapsed(line_idx, line_len);
    }

    // End-of-file style messages collapse to the reported point.
    if EOF_MESSAGE.is_match(message) {
        return collapsed(line_idx, col);
    }

    // A column pointing at whitespace really means "the next thing".
    while (col as usize) < chars.len() && chars[col as usize].is_whitespace() {
        col += 1;
    }
    if col >= line_len {
        return collapsed(line_idx, line_len);
    }

    // The message names the offending token: highlight its textual extent.
    if let Some(caps) = TOKEN_IN_MESSAGE.captures(message)
        && let Some(token) = caps.get(1)
    {
        let token_chars: Vec<char> = token.as_str().chars().collect();
        if let Some(start) = find_chars(&chars, &token_chars, col as usize)
            .or_else(|| find_chars(&chars, &token_chars, 0))
        {
            return span(line_idx, start as u32, (start + token_chars.len()) as u32);
        }
    }

    // The message names an identifier: highlight that identifier's run.
    if let Some(caps) = IDENTIFIER_IN_MESSAGE.captures(message)
        && let Some(ident) = caps.get(1)
    {
        let ident_chars: Vec<char> = ident.as_str().chars().collect();
        if let Some(start) = find_identifier(&chars, &ident_chars, col as usize)
            .or_else(|| find_identifier(&chars, &ident_chars, 0))
        {
            return span(line_idx, start as u32, (start + ident_chars.len()) as u32);
        }
    }

    let at = chars[col as usize];
    let end = if is_identifier_char(at) {
        extend_while(&chars, col as usize, is_identifier_char)
    } else if is_operator_char(at) {
        // Operators are short; cap the run so `===>` noise stays tight.
        col as usize + run_length(&chars, col as usize, is_operator_char).min(3)
    } else {
        extend_while(&chars, col as usize, |c| !c.is_whitespace())
    };

    span(line_idx, col, (end as u32).min(line_len))
}

fn collapsed(line: u32, character: u32) -> Range {
    Range::new(
        Position::new(line, character),
        Position::new(line, character),
    )
}

fn span(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?' | ':'
    )
}

fn extend_while(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> usize {
    start + run_length(chars, start, pred)
}

fn run_length(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> usize {
    chars[start..].iter().take_while(|&&c| pred(c)).count()
}

/// First occurrence of `needle` in `haystack` at or after `from`.
fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Like [`find_chars`] but only matches whole identifiers.
fn find_identifier(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    let mut at = from;
    while let Some(start) = find_chars(haystack, needle, at) {
        let before_ok = start == 0 || !is_identifier_char(haystack[start - 1]);
        let after = start + needle.len();
        let after_ok = after >= haystack.len() || !is_identifier_char(haystack[after]);
        if before_ok && after_ok {
            return Some(start);
        }
        at = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_of(text: &str, message: &str, line: u32, column: u32) -> (u32, u32, u32) {
        let r = diagnostic_range(text, message, line, column);
        assert_eq!(r.start.line, r.end.line);
        (r.start.line, r.start.character, r.end.character)
    }

    #[test]
    fn named_token_is_highlighted() {
        let text = "def hello( { return 'Hello' }";
        assert_eq!(
            range_of(text, "unexpected token: {", 1, 12),
            (0, 11, 12),
        );
    }

    #[test]
    fn named_token_found_from_reported_column() {
        // Two `{` on the line; the one at the reported column wins.
        let text = "if (x) { y { }";
        assert_eq!(range_of(text, "unexpected token: {", 1, 12), (0, 11, 12));
    }

    #[test]
    fn named_identifier_is_highlighted_whole() {
        let text = "println someVariable + 1";
        assert_eq!(
            range_of(text, "undefined variable: someVariable", 1, 9),
            (0, 8, 20),
        );
    }

    #[test]
    fn identifier_run_at_column() {
        let text = "def value = other";
        assert_eq!(range_of(text, "something odd here", 1, 13), (0, 12, 17));
    }

    #[test]
    fn operator_run_is_short() {
        let text = "x ==== y";
        let (_, start, end) = range_of(text, "weird operator", 1, 3);
        assert_eq!(start, 2);
        assert!(end <= 5, "operator run capped, got end={end}");
    }

    #[test]
    fn eof_message_collapses_to_point() {
        let text = "def x = [1, 2";
        assert_eq!(
            range_of(text, "unexpected EOF while reading list", 1, 14),
            (0, 13, 13),
        );
    }

    #[test]
    fn column_beyond_line_clamps_to_length() {
        let text = "short";
        assert_eq!(range_of(text, "mystery", 1, 99), (0, 5, 5));
    }

    #[test]
    fn column_on_whitespace_skips_forward() {
        let text = "    return value";
        assert_eq!(range_of(text, "who knows", 1, 2), (0, 4, 10));
    }

    #[test]
    fn missing_line_yields_zero_range() {
        assert_eq!(range_of("one line", "boom", 42, 3), (41, 0, 0));
    }

    #[test]
    fn positions_are_converted_to_zero_based() {
        let text = "abc def";
        let r = diagnostic_range(text, "plain words", 1, 1);
        assert_eq!(r.start, Position::new(0, 0));
        assert_eq!(r.end, Position::new(0, 3));
    }
}
