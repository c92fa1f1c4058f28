//! Script-based language detection
//!
//! Classifies text by the ratio of Arabic-script letters among all alphabetic
//! characters. Digits, punctuation, and whitespace do not count toward either
//! side.

/// Arabic-ratio threshold above which text is classified as Arabic
const ARABIC_THRESHOLD: f64 = 0.7;
/// Ratio below which text is classified as English
const ENGLISH_THRESHOLD: f64 = 0.3;

fn is_arabic_char(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Classify text as "arabic", "english", "mixed", or "unknown"
pub fn detect_language(text: &str) -> &'static str {
    let mut arabic = 0usize;
    let mut total = 0usize;

    for c in text.chars() {
        if is_arabic_char(c) {
            arabic += 1;
            total += 1;
        } else if c.is_alphabetic() {
            total += 1;
        }
    }

    if total == 0 {
        return "unknown";
    }

    let ratio = arabic as f64 / total as f64;
    if ratio > ARABIC_THRESHOLD {
        "arabic"
    } else if ratio < ENGLISH_THRESHOLD {
        "english"
    } else {
        "mixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic() {
        assert_eq!(detect_language("صدر دجاج مجمد"), "arabic");
    }

    #[test]
    fn test_english() {
        assert_eq!(detect_language("frozen chicken breast"), "english");
    }

    #[test]
    fn test_mixed() {
        assert_eq!(detect_language("chicken دجاج"), "mixed");
    }

    #[test]
    fn test_unknown_for_digits_and_punctuation() {
        assert_eq!(detect_language("123 456 !?"), "unknown");
        assert_eq!(detect_language(""), "unknown");
    }

    #[test]
    fn test_arabic_with_digits() {
        // Digits do not dilute the ratio
        assert_eq!(detect_language("ملح 500 غرام"), "arabic");
    }
}
