// optimizer/dudu.rs - дружелюбный тон для Dudu

use fancy_regex::Regex;
use rand::seq::SliceRandom;
use tracing::error;

use super::analysis::count_emoji;
use super::{char_len, truncate_with_marker, ContentOptimizer, Decoration};
use crate::models::Platform;

pub const CAP: usize = 3000;
pub const MARKER: &str = "... 😊";

const KNOWN_TAGS: [&str; 3] = ["#dudu", "#일상", "#소통"];
const DEFAULT_TAGS: &str = "#dudu #일상 #좋은하루";

const GREETINGS: [&str; 3] = ["안녕하세요! 😊", "하이! 👋", "반가워요! ✨"];
const EMOJIS: [&str; 8] = ["😊", "💖", "✨", "🌟", "🎉", "💝", "🤗", "😄"];
const MIN_EMOJI: usize = 2;

/// Формальные окончания -> разговорные. Длинные шаблоны идут первыми,
/// иначе `했습니다.` никогда бы не совпал
const ENDINGS: [(&str, &str); 3] = [
    (r"했습니다\.", "했어요!"),
    (r"습니다\.", "해요!"),
    (r"입니다\.", "이에요!"),
];

pub struct DuduOptimizer {
    decoration: Decoration,
}

impl DuduOptimizer {
    pub fn new(decoration: Decoration) -> Self {
        DuduOptimizer { decoration }
    }

    fn pick<'a>(&self, options: &[&'a str]) -> &'a str {
        let chosen = match self.decoration {
            Decoration::Deterministic => options.first(),
            Decoration::Random => options.choose(&mut rand::thread_rng()),
        };
        chosen.copied().unwrap_or_default()
    }

    /// Сколько символов может добавить правка тона
    fn tone_headroom() -> usize {
        let greeting = GREETINGS.iter().map(|g| char_len(g)).max().unwrap_or(0) + 2;
        let emoji = EMOJIS.iter().map(|e| char_len(e)).max().unwrap_or(0) + 1;
        greeting + emoji
    }

    fn inject_tags(text: &str) -> String {
        let lowered = text.to_lowercase();
        if KNOWN_TAGS.iter().any(|tag| lowered.contains(tag)) {
            return text.to_string();
        }

        if text.trim().is_empty() {
            DEFAULT_TAGS.to_string()
        } else {
            format!("{}\n\n{}", text, DEFAULT_TAGS)
        }
    }

    fn soften_endings(text: &str) -> String {
        let mut softened = text.to_string();
        for (pattern, replacement) in ENDINGS {
            match Regex::new(pattern) {
                Ok(re) => softened = re.replace_all(&softened, replacement).into_owned(),
                Err(e) => error!("Regex error while softening endings: {}", e),
            }
        }
        softened
    }

    fn has_greeting(text: &str) -> bool {
        match Regex::new(r"(?i)^\s*(안녕|하이|헬로|반가|hi)") {
            Ok(re) => re.is_match(text).unwrap_or(false),
            Err(e) => {
                error!("Regex error while checking greeting: {}", e);
                true
            }
        }
    }

    fn apply_tone(&self, text: &str) -> String {
        let mut friendly = Self::soften_endings(text);

        if !Self::has_greeting(&friendly) {
            friendly = format!("{}\n\n{}", self.pick(&GREETINGS), friendly);
        }

        if count_emoji(&friendly) < MIN_EMOJI {
            friendly.push(' ');
            friendly.push_str(self.pick(&EMOJIS));
        }

        friendly
    }
}

impl ContentOptimizer for DuduOptimizer {
    fn platform(&self) -> Platform {
        Platform::Dudu
    }

    fn cap(&self) -> usize {
        CAP
    }

    fn optimize(&self, text: &str) -> String {
        let tagged = Self::inject_tags(text);
        // Оставляем место под приветствие и эмодзи, чтобы итог влез в CAP
        let capped = truncate_with_marker(&tagged, CAP - Self::tone_headroom(), MARKER);
        self.apply_tone(&capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimizer() -> DuduOptimizer {
        DuduOptimizer::new(Decoration::Deterministic)
    }

    #[test]
    fn test_formal_endings_become_casual() {
        let out = DuduOptimizer::soften_endings("점심을 먹었습니다. 오늘은 금요일입니다. 산책했습니다.");
        assert_eq!(out, "점심을 먹었해요! 오늘은 금요일이에요! 산책했어요!");
    }

    #[test]
    fn test_full_pipeline_deterministic() {
        let out = optimizer().optimize("좋은 아침입니다.");
        assert_eq!(
            out,
            "안녕하세요! 😊\n\n좋은 아침이에요!\n\n#dudu #일상 #좋은하루 😊"
        );
    }

    #[test]
    fn test_existing_greeting_and_tags_are_kept() {
        let text = "하이! 오늘도 #소통 해요 🎉🎉";
        assert_eq!(optimizer().optimize(text), text);
    }

    #[test]
    fn test_optimizing_twice_adds_nothing() {
        let once = optimizer().optimize("주말 계획을 세웠습니다.");
        let twice = optimizer().optimize(&once);
        assert_eq!(once, twice);
        assert_eq!(twice.matches("#dudu").count(), 1);
    }

    #[test]
    fn test_random_decoration_respects_cap() {
        let optimizer = DuduOptimizer::new(Decoration::Random);
        let out = optimizer.optimize(&"긴 문장 ".repeat(1000));
        assert!(char_len(&out) <= CAP);
        assert!(out.contains(MARKER));
    }
}
