//! Text normalization ahead of chunking.

/// Normalize text for speech synthesis.
///
/// Smart punctuation is replaced with TTS-safe ASCII equivalents, control
/// characters and zero-width marks are dropped, runs of spaces collapse to
/// one, and runs of blank lines collapse to a single paragraph break.
pub fn clean_text(text: &str) -> String {
    let mut replaced = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            // Curly quotes and primes
            '\u{2018}' | '\u{2019}' | '\u{2032}' => replaced.push('\''),
            '\u{201c}' | '\u{201d}' | '\u{2033}' | '\u{00ab}' | '\u{00bb}' => replaced.push('"'),
            // Dash variants
            '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => replaced.push('-'),
            '\u{2026}' => replaced.push_str("..."),
            '\u{00a0}' => replaced.push(' '),
            // Zero-width marks and BOM
            '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' => {}
            '\t' => replaced.push(' '),
            '\n' => replaced.push('\n'),
            c if c.is_control() => {}
            c => replaced.push(c),
        }
    }

    collapse_whitespace(&replaced)
}

/// Collapse space runs to a single space and newline runs to at most two,
/// dropping leading and trailing whitespace.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut spaces = 0usize;
    let mut newlines = 0usize;

    for c in text.chars() {
        match c {
            '\n' => {
                newlines += 1;
                spaces = 0;
            }
            ' ' => spaces += 1,
            _ => {
                if newlines > 0 && !out.is_empty() {
                    out.push('\n');
                    if newlines > 1 {
                        out.push('\n');
                    }
                } else if spaces > 0 && !out.is_empty() {
                    out.push(' ');
                }
                spaces = 0;
                newlines = 0;
                out.push(c);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_smart_quotes() {
        let text = "\u{201c}Hello,\u{201d} said John. \u{2018}It\u{2019}s nice.\u{2019}";
        assert_eq!(clean_text(text), "\"Hello,\" said John. 'It's nice.'");
    }

    #[test]
    fn test_clean_dashes() {
        assert_eq!(clean_text("one–two—three"), "one-two-three");
    }

    #[test]
    fn test_clean_ellipsis() {
        assert_eq!(clean_text("Wait… what?"), "Wait... what?");
    }

    #[test]
    fn test_clean_zero_width_chars() {
        assert_eq!(clean_text("Hello\u{200b}World\u{feff}!"), "HelloWorld!");
    }

    #[test]
    fn test_clean_control_chars() {
        assert_eq!(clean_text("Hello\x00World\x07Test"), "HelloWorldTest");
    }

    #[test]
    fn test_collapse_spaces_and_tabs() {
        assert_eq!(clean_text("Hello \t  world"), "Hello world");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(
            clean_text("Hello   world\n\n\n\nNew paragraph"),
            "Hello world\n\nNew paragraph"
        );
    }

    #[test]
    fn test_preserves_single_newlines() {
        assert_eq!(clean_text("Line 1\nLine 2"), "Line 1\nLine 2");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(clean_text("  \n hello \n  "), "hello");
    }

    #[test]
    fn test_whitespace_only_input() {
        assert_eq!(clean_text("   \n\n \t "), "");
    }
}
