//! Sentence boundary detection using the seams library (dialog-aware).

use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

static DETECTOR: OnceLock<SentenceDetectorDialog> = OnceLock::new();

fn detector() -> &'static SentenceDetectorDialog {
    DETECTOR.get_or_init(|| {
        SentenceDetectorDialog::new().expect("seams sentence detector should initialize")
    })
}

/// Split text into sentences, dialog quotes kept intact.
pub fn split_sentences(text: &str) -> Vec<String> {
    let sentences = detector()
        .detect_sentences_borrowed(text)
        .expect("seams sentence detection should succeed");

    sentences
        .iter()
        .map(|s| s.normalize())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_sentences() {
        let sentences = split_sentences("Hello. World.");
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn test_split_keeps_order() {
        let sentences = split_sentences("First sentence. Second sentence.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("First"));
        assert!(sentences[1].contains("Second"));
    }

    #[test]
    fn test_split_question_and_exclamation() {
        let sentences = split_sentences("Really? Yes! Good.");
        assert_eq!(sentences.len(), 3);
    }
}
