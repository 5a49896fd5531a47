// dispatch/log.rs - журнал ответов вкладки

use chrono::{DateTime, Local};

use crate::models::{DispatchResult, Tab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Pending,
    Success,
    Error,
}

impl LogStatus {
    pub fn glyph(&self) -> &'static str {
        match self {
            LogStatus::Pending => "⏳",
            LogStatus::Success => "✅",
            LogStatus::Error => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub status: LogStatus,
    pub message: String,
}

impl LogEntry {
    pub fn new(status: LogStatus, message: impl Into<String>) -> Self {
        LogEntry {
            timestamp: Local::now(),
            status,
            message: message.into(),
        }
    }

    pub fn pending(message: impl Into<String>) -> Self {
        Self::new(LogStatus::Pending, message)
    }

    pub fn from_result(result: &DispatchResult) -> Self {
        let status = if result.success {
            LogStatus::Success
        } else {
            LogStatus::Error
        };
        Self::new(status, result.message.clone())
    }

    /// `[HH:MM:SS] ✅ message`
    pub fn render(&self) -> String {
        format!(
            "[{}] {} {}",
            self.timestamp.format("%H:%M:%S"),
            self.status.glyph(),
            self.message
        )
    }
}

/// Журнал только на дописывание: прежние записи не меняются и не удаляются
#[derive(Debug, Clone, Default)]
pub struct ResponseLog {
    entries: Vec<LogEntry>,
}

impl ResponseLog {
    pub fn append(&mut self, entry: LogEntry) -> &LogEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

/// Куда выводятся новые записи журнала
pub trait LogRenderer: Send + Sync {
    fn render_log_entry(&self, tab: Tab, entry: &LogEntry);
}

/// Печатает записи в stdout по мере появления; новая запись всегда внизу
pub struct ConsoleRenderer;

impl LogRenderer for ConsoleRenderer {
    fn render_log_entry(&self, tab: Tab, entry: &LogEntry) {
        println!("{:<8} {}", tab.display_name(), entry.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_only() {
        let mut log = ResponseLog::default();
        log.append(LogEntry::pending("Sending..."));
        log.append(LogEntry::new(LogStatus::Error, "boom"));

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, LogStatus::Pending);
        assert_eq!(entries[1].status, LogStatus::Error);
        assert_eq!(entries[1].message, "boom");
    }

    #[test]
    fn test_render_format() {
        let entry = LogEntry::new(LogStatus::Success, "IF24 send complete");
        let rendered = entry.render();
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with("] ✅ IF24 send complete"));
    }
}
