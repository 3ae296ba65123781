use crate::ocr::RecognizedWord;

/// Joins words with confidence above zero, in engine order, single-spaced.
/// Empty tokens are skipped whatever their confidence.
pub fn assemble_text(words: &[RecognizedWord]) -> String {
    let mut text = String::new();
    for word in words {
        if word.confidence <= 0.0 {
            continue;
        }
        let token = word.text.trim();
        if token.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(token);
    }
    text.trim().to_string()
}
