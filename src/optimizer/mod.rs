pub mod analysis;
pub mod dudu;
pub mod instagram;
pub mod threads;
pub mod x;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Platform;

/// Как выбираются декоративные приветствия и эмодзи
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Decoration {
    /// Всегда первый вариант из списка
    #[value(name = "deterministic")]
    Deterministic,
    /// Случайный вариант
    #[default]
    #[value(name = "random")]
    Random,
}

/// Платформенная подгонка текста. Чистая функция без побочных эффектов.
///
/// Реализации применяют правила в фиксированном порядке: хэштеги по
/// умолчанию, ограничение длины, разбиение на части, правка тона.
pub trait ContentOptimizer: Send + Sync {
    fn platform(&self) -> Platform;

    /// Жёсткий лимит длины в символах
    fn cap(&self) -> usize;

    fn optimize(&self, text: &str) -> String;
}

/// Фабрика оптимизаторов по платформе
pub fn optimizer_for(platform: Platform, decoration: Decoration) -> Box<dyn ContentOptimizer> {
    match platform {
        Platform::Instagram => Box::new(instagram::InstagramOptimizer),
        Platform::Threads => Box::new(threads::ThreadsOptimizer),
        Platform::X => Box::new(x::XOptimizer),
        Platform::Dudu => Box::new(dudu::DuduOptimizer::new(decoration)),
    }
}

pub fn optimize(text: &str, platform: Platform, decoration: Decoration) -> String {
    let optimizer = optimizer_for(platform, decoration);
    let optimized = optimizer.optimize(text);
    debug!(
        "Optimized for {}: {} -> {} chars (cap {})",
        optimizer.platform(),
        char_len(text),
        char_len(&optimized),
        optimizer.cap()
    );
    optimized
}

/// Длина в символах Unicode, не в байтах
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Обрезает текст до `cap` символов вместе с маркером продолжения.
///
/// Сначала режем, потом дописываем маркер, так что сам маркер никогда не
/// обрезается. По возможности режем по последнему пробелу; одно длинное
/// слово без пробелов режется жёстко.
pub fn truncate_with_marker(text: &str, cap: usize, marker: &str) -> String {
    if char_len(text) <= cap {
        return text.to_string();
    }

    let budget = cap.saturating_sub(char_len(marker));
    let head: String = text.chars().take(budget).collect();
    let at_boundary = text.chars().nth(budget).map_or(true, char::is_whitespace);

    let cut = if at_boundary {
        head.as_str()
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &head[..idx],
            _ => head.as_str(),
        }
    };

    format!("{}{}", cut.trim_end(), marker)
}

fn part_marker(index: usize, total: usize) -> String {
    format!(" ({}/{})", index, total)
}

/// Делит длинный текст на части не длиннее `part_cap` символов, включая
/// пометку `(i/n)`, и склеивает их через `separator`. Короткий текст
/// возвращается как есть.
pub fn split_into_parts(text: &str, part_cap: usize, separator: &str) -> String {
    if char_len(text) <= part_cap {
        return text.to_string();
    }

    let mut reserve = char_len(&part_marker(9, 9));
    loop {
        let budget = part_cap.saturating_sub(reserve).max(1);
        let parts = pack_words(text, budget);
        let total = parts.len();
        let needed = char_len(&part_marker(total, total));

        if needed <= reserve {
            return parts
                .iter()
                .enumerate()
                .map(|(i, part)| format!("{}{}", part, part_marker(i + 1, total)))
                .collect::<Vec<_>>()
                .join(separator);
        }

        // Частей стало больше, чем помещается в пометку
        reserve = needed;
    }
}

/// Жадно укладывает слова в куски не длиннее `budget` символов.
/// Границей слова считается любой пробельный символ; сами разделители
/// внутри куска сохраняются, на краях кусков обрезаются
fn pack_words(text: &str, budget: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for token in text.split_inclusive(char::is_whitespace) {
        let word = token.trim_end();

        if word.is_empty() {
            if !current.is_empty() {
                current.push_str(token);
            }
            continue;
        }

        if char_len(&current) + char_len(word) <= budget {
            current.push_str(token);
            continue;
        }

        let finished = std::mem::take(&mut current);
        if !finished.trim_end().is_empty() {
            parts.push(finished.trim_end().to_string());
        }

        if char_len(word) > budget {
            // Слово без пробелов длиннее куска: режем жёстко
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(budget).map(|c| c.iter().collect::<String>());
            let mut last = chunks.next().unwrap_or_default();
            for chunk in chunks {
                parts.push(std::mem::replace(&mut last, chunk));
            }
            current = last;
            current.push_str(&token[word.len()..]);
        } else {
            current.push_str(token);
        }
    }

    if !current.trim_end().is_empty() {
        parts.push(current.trim_end().to_string());
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tab;

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate_with_marker("hello", 10, "..."), "hello");
    }

    #[test]
    fn test_truncate_cuts_on_word_boundary() {
        let out = truncate_with_marker("alpha beta gamma delta", 15, "...");
        assert_eq!(out, "alpha beta...");
        assert!(char_len(&out) <= 15);
    }

    #[test]
    fn test_truncate_hard_cuts_single_word() {
        let out = truncate_with_marker(&"a".repeat(50), 10, "...");
        assert_eq!(out, "aaaaaaa...");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let text = "가".repeat(20);
        let out = truncate_with_marker(&text, 10, "…");
        assert_eq!(char_len(&out), 10);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_split_marks_every_part() {
        let text = vec!["word"; 60].join(" ");
        let out = split_into_parts(&text, 50, "|");
        let parts: Vec<&str> = out.split('|').collect();
        let total = parts.len();
        assert!(total > 1);
        for (i, part) in parts.iter().enumerate() {
            assert!(char_len(part) <= 50, "part too long: {}", part);
            assert!(part.ends_with(&format!("({}/{})", i + 1, total)));
        }
    }

    #[test]
    fn test_split_breaks_overlong_word() {
        let out = split_into_parts(&"z".repeat(120), 50, "|");
        for part in out.split('|') {
            assert!(char_len(part) <= 50);
        }
        assert_eq!(out.matches('z').count(), 120);
    }

    #[test]
    fn test_split_treats_line_breaks_as_word_boundaries() {
        let text = "line\n".repeat(30);
        let out = split_into_parts(&text, 40, "|");
        let parts: Vec<&str> = out.split('|').collect();
        assert!(parts.len() > 1);
        for part in &parts {
            let (body, _) = part.rsplit_once(" (").unwrap();
            assert!(char_len(part) <= 40);
            assert!(body.split('\n').all(|w| w == "line"), "broken word in {:?}", body);
        }
        assert_eq!(out.matches("line").count(), 30);
    }

    #[test]
    fn test_optimized_output_respects_every_cap() {
        let text = "Long update with plenty of words\nand line breaks ".repeat(300);
        for tab in Tab::ALL {
            for platform in tab.vocabulary() {
                let optimizer = optimizer_for(*platform, Decoration::Random);
                assert_eq!(optimizer.platform(), *platform);
                let out = optimizer.optimize(&text);
                assert!(
                    char_len(&out) <= optimizer.cap(),
                    "{} produced {} chars",
                    platform,
                    char_len(&out)
                );
            }
        }
    }

    #[test]
    fn test_split_leaves_short_text_alone() {
        assert_eq!(split_into_parts("short", 50, "|"), "short");
    }
}
