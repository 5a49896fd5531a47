use super::{truncate_with_marker, ContentOptimizer};
use crate::models::Platform;

pub const CAP: usize = 280;
/// Маркер продолжения: пост обрезан, дальше идёт тред
pub const MARKER: &str = "... (1/n)";
const DEFAULT_TAG: &str = "#twitter";

pub struct XOptimizer;

impl ContentOptimizer for XOptimizer {
    fn platform(&self) -> Platform {
        Platform::X
    }

    fn cap(&self) -> usize {
        CAP
    }

    fn optimize(&self, text: &str) -> String {
        let mut optimized = text.to_string();

        if !optimized.contains('#') {
            if !optimized.trim().is_empty() {
                optimized.push(' ');
            }
            optimized.push_str(DEFAULT_TAG);
        }

        truncate_with_marker(&optimized, CAP, MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::char_len;

    #[test]
    fn test_long_single_word_is_capped_with_marker() {
        let out = XOptimizer.optimize(&"a".repeat(3500));
        assert!(char_len(&out) <= CAP);
        assert!(out.ends_with(MARKER));
        assert_eq!(char_len(&out), CAP);
    }

    #[test]
    fn test_truncation_does_not_split_words() {
        let text = "lorem ipsum ".repeat(40);
        let out = XOptimizer.optimize(&text);
        assert!(char_len(&out) <= CAP);
        let body = out.strip_suffix(MARKER).unwrap();
        assert!(body.ends_with("lorem") || body.ends_with("ipsum"));
    }

    #[test]
    fn test_tag_injection_is_idempotent() {
        let once = XOptimizer.optimize("Shipping today");
        assert_eq!(once, "Shipping today #twitter");
        assert_eq!(XOptimizer.optimize(&once), once);
    }

    #[test]
    fn test_short_text_with_tag_unchanged() {
        assert_eq!(XOptimizer.optimize("Release #rust"), "Release #rust");
    }
}
