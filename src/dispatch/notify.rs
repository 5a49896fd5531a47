use tracing::{info, warn};

use crate::models::Severity;

/// Короткие уведомления для пользователя (аналог всплывающих подсказок)
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Пишет уведомления в stderr, чтобы не смешивать их с журналом в stdout
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error | Severity::Warning => warn!("Notification ({}): {}", severity, message),
            Severity::Success => info!("Notification ({}): {}", severity, message),
        }
        eprintln!("[{}] {}", severity, message);
    }
}
