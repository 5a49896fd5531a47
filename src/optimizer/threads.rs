use super::{char_len, split_into_parts, truncate_with_marker, ContentOptimizer};
use crate::models::Platform;

/// Общий лимит всего вывода, включая пометки (i/n) и разделители
pub const CAP: usize = 5000;
/// Лимит одной части вместе с пометкой (i/n)
pub const PART_CAP: usize = 500;
pub const MARKER: &str = "...";
pub const SEPARATOR: &str = "\n\n---THREADS_SPLIT---\n\n";

pub struct ThreadsOptimizer;

impl ContentOptimizer for ThreadsOptimizer {
    fn platform(&self) -> Platform {
        Platform::Threads
    }

    fn cap(&self) -> usize {
        CAP
    }

    fn optimize(&self, text: &str) -> String {
        // Пометки и разделители тоже считаются в CAP: ужимаем бюджет,
        // пока склеенный результат не влезет
        let mut budget = CAP;
        loop {
            let capped = truncate_with_marker(text, budget, MARKER);
            let split = split_into_parts(&capped, PART_CAP, SEPARATOR);
            let len = char_len(&split);
            if len <= CAP || budget == 0 {
                return split;
            }
            budget = budget.saturating_sub(len - CAP);
        }
    }
}
