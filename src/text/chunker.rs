//! Splitting text into request-sized chunks for speech synthesis.
//!
//! The speech service enforces a per-request character limit, so long input
//! is packed into chunks of at most `max_chars` characters. Splits land on
//! sentence boundaries where possible, then clause delimiters, then word
//! boundaries. An unbroken token longer than the budget is hard-split so the
//! limit holds unconditionally.

use super::cleaner::clean_text;
use super::sentences::split_sentences;

/// Default maximum characters per synthesis request.
pub const DEFAULT_MAX_CHARS: usize = 3000;

/// Clause delimiters tried in order of preference when a sentence alone
/// exceeds the budget.
const CLAUSE_DELIMITERS: &[char] = &[';', ':', ','];

/// Split text into ordered chunks of at most `max_chars` characters.
///
/// Each non-empty line of the cleaned input is treated as a paragraph.
/// Paragraphs packed into the same chunk are separated by a blank line so
/// narration pacing survives the split; sentences within a paragraph are
/// joined with a single space.
///
/// `max_chars` must be at least 1. Lengths are Unicode scalar counts, which
/// is what the service meters.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    assert!(max_chars > 0, "max_chars must be at least 1");

    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in cleaned.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let pieces = if char_len(paragraph) <= max_chars {
            vec![paragraph.to_string()]
        } else {
            split_sentences(paragraph)
                .into_iter()
                .flat_map(|s| split_long_sentence(&s, max_chars))
                .collect()
        };

        let mut paragraph_start = true;
        for piece in pieces {
            let piece_len = char_len(&piece);
            let (separator, separator_len) = if current.is_empty() {
                ("", 0)
            } else if paragraph_start {
                ("\n\n", 2)
            } else {
                (" ", 1)
            };

            if current_len + separator_len + piece_len <= max_chars {
                current.push_str(separator);
                current.push_str(&piece);
                current_len += separator_len + piece_len;
            } else {
                chunks.push(current);
                current = piece;
                current_len = piece_len;
            }
            paragraph_start = false;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Break a sentence that exceeds the budget at clause delimiters, then word
/// boundaries, then (for a single oversized token) at the character level.
fn split_long_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    if char_len(sentence) <= max_chars {
        return vec![sentence.to_string()];
    }

    for &delimiter in CLAUSE_DELIMITERS {
        if !sentence.contains(delimiter) {
            continue;
        }

        let clauses: Vec<String> = sentence
            .split_inclusive(delimiter)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if clauses.len() < 2 {
            continue;
        }

        let packed = pack_pieces(&clauses, max_chars);
        if packed.len() > 1 {
            // Clauses packed together can still exceed the budget on their
            // own; each such clause is strictly shorter than the sentence,
            // so recursion makes progress.
            return packed
                .into_iter()
                .flat_map(|clause| split_long_sentence(&clause, max_chars))
                .collect();
        }
    }

    let words: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
    pack_pieces(&words, max_chars)
        .into_iter()
        .flat_map(|piece| {
            if char_len(&piece) > max_chars {
                hard_split(&piece, max_chars)
            } else {
                vec![piece]
            }
        })
        .collect()
}

/// Greedily join pieces with single spaces into runs of at most `max_chars`.
/// A piece that alone exceeds the budget comes back as its own run.
fn pack_pieces(pieces: &[String], max_chars: usize) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for piece in pieces {
        let piece_len = char_len(piece);
        if current.is_empty() {
            current = piece.clone();
            current_len = piece_len;
        } else if current_len + 1 + piece_len <= max_chars {
            current.push(' ');
            current.push_str(piece);
            current_len += 1 + piece_len;
        } else {
            runs.push(current);
            current = piece.clone();
            current_len = piece_len;
        }
    }

    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Last resort: split at exact character positions.
fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect())
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
