use super::{truncate_with_marker, ContentOptimizer};
use crate::models::Platform;

pub const CAP: usize = 2200;
pub const MARKER: &str = "...";
const DEFAULT_TAGS: &str = "#instagram #daily #photo";

pub struct InstagramOptimizer;

impl ContentOptimizer for InstagramOptimizer {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn cap(&self) -> usize {
        CAP
    }

    fn optimize(&self, text: &str) -> String {
        let mut optimized = text.to_string();

        if !optimized.contains('#') {
            if !optimized.trim().is_empty() {
                optimized.push_str("\n\n");
            }
            optimized.push_str(DEFAULT_TAGS);
        }

        truncate_with_marker(&optimized, CAP, MARKER)
    }
}
