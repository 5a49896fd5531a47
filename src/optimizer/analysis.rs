// optimizer/analysis.rs - оценка текста для дружелюбной вкладки Dudu

use fancy_regex::Regex;
use serde::Serialize;
use tracing::error;

const POSITIVE_WORDS: [&str; 8] = ["좋", "행복", "기쁨", "즐거", "사랑", "감사", "완벽", "최고"];
const NEGATIVE_WORDS: [&str; 6] = ["슬프", "힘들", "어렵", "걱정", "불안", "스트레스"];
const FRIENDLY_EXPRESSIONS: [&str; 4] = ["안녕", "반가", "고마워", "감사해"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Negative => "negative",
            Mood::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub word_count: usize,
    pub emoji_count: usize,
    pub hashtag_count: usize,
    pub mood: Mood,
    pub readability_score: f64,
    pub friendliness_score: u32,
}

/// Считает эмодзи из основных пиктографических блоков
pub fn count_emoji(text: &str) -> usize {
    text.chars()
        .filter(|c| {
            matches!(
                *c as u32,
                0x1F600..=0x1F64F
                    | 0x1F300..=0x1F5FF
                    | 0x1F680..=0x1F6FF
                    | 0x1F1E0..=0x1F1FF
                    | 0x1F900..=0x1F9FF
                    | 0x2600..=0x27BF
            )
        })
        .count()
}

pub fn count_hashtags(text: &str) -> usize {
    match Regex::new(r"#\w+") {
        Ok(re) => re.find_iter(text).filter_map(Result::ok).count(),
        Err(e) => {
            error!("Regex error while counting hashtags: {}", e);
            0
        }
    }
}

fn count_stems(text: &str, stems: &[&str]) -> usize {
    stems.iter().map(|stem| text.matches(stem).count()).sum()
}

/// Грубая оценка настроения по словарю основ
pub fn mood(text: &str) -> Mood {
    let positive = count_stems(text, &POSITIVE_WORDS);
    let negative = count_stems(text, &NEGATIVE_WORDS);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Mood::Positive,
        std::cmp::Ordering::Less => Mood::Negative,
        std::cmp::Ordering::Equal => Mood::Neutral,
    }
}

/// Чем короче предложения, тем выше балл; 15 слов - порог
pub fn readability(text: &str) -> f64 {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .collect();

    if sentences.is_empty() {
        return 50.0;
    }

    let words: usize = sentences
        .iter()
        .map(|s| s.split_whitespace().count())
        .sum();
    let average = words as f64 / sentences.len() as f64;

    (100.0 - (average - 15.0) * 5.0).clamp(0.0, 100.0)
}

pub fn friendliness(text: &str) -> u32 {
    let mut score = 50;

    score += (count_emoji(text) as u32 * 5).min(20);

    if text.contains("해요") || text.contains("이에요") {
        score += 15;
    }

    score += FRIENDLY_EXPRESSIONS
        .iter()
        .filter(|expr| text.contains(*expr))
        .count() as u32
        * 5;

    score.min(100)
}

pub fn analyze(text: &str) -> ContentAnalysis {
    ContentAnalysis {
        word_count: text.split_whitespace().count(),
        emoji_count: count_emoji(text),
        hashtag_count: count_hashtags(text),
        mood: mood(text),
        readability_score: readability(text),
        friendliness_score: friendliness(text),
    }
}

/// Подсказки, как сделать пост дружелюбнее
pub fn suggest(text: &str) -> Vec<&'static str> {
    let analysis = analyze(text);
    let mut suggestions = Vec::new();

    if analysis.emoji_count < 2 {
        suggestions.push("Add a few more emoji 😊✨");
    }
    if analysis.friendliness_score < 70 {
        suggestions.push("Try a warmer, more casual tone");
    }
    if analysis.readability_score < 60.0 {
        suggestions.push("Use shorter, simpler sentences");
    }
    if analysis.mood == Mood::Negative {
        suggestions.push("Try some more positive wording 💖");
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood() {
        assert_eq!(mood("오늘 정말 행복하고 좋아요"), Mood::Positive);
        assert_eq!(mood("걱정이 많고 힘들어요"), Mood::Negative);
        assert_eq!(mood("just a plain update"), Mood::Neutral);
    }

    #[test]
    fn test_count_emoji_and_hashtags() {
        assert_eq!(count_emoji("hi 😊 there ✨ 🤗"), 3);
        assert_eq!(count_hashtags("#dudu #일상 and # alone"), 2);
    }

    #[test]
    fn test_readability_bounds() {
        assert_eq!(readability(""), 50.0);
        assert_eq!(readability("Short one. Another short."), 100.0);
        let rambling = format!("{}.", "word ".repeat(40));
        assert_eq!(readability(&rambling), 0.0);
    }

    #[test]
    fn test_friendliness_caps_at_100() {
        let text = "안녕 반가 고마워 감사해 해요 😊😊😊😊😊😊";
        assert_eq!(friendliness(text), 100);
        assert_eq!(friendliness("plain"), 50);
    }

    #[test]
    fn test_suggest_for_flat_text() {
        let hints = suggest("걱정이 많아요");
        assert!(hints.contains(&"Add a few more emoji 😊✨"));
        assert!(hints.contains(&"Try some more positive wording 💖"));
    }

    #[test]
    fn test_analyze_counts_words() {
        let analysis = analyze("one two  three\nfour");
        assert_eq!(analysis.word_count, 4);
        assert_eq!(analysis.mood, Mood::Neutral);
    }
}
