// dispatch/context.rs - состояние сессии: настройки и вкладки

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::log::{LogEntry, LogRenderer, ResponseLog};
use super::notify::Notifier;
use crate::config::Config;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{ImageAttachment, Platform, PlatformSelection, PostDraft, Severity, Tab};
use crate::optimizer::{optimize, Decoration};
use crate::settings::{SettingsStore, WebhookSettings};
use crate::webhook::WebhookSender;

pub const SEND_LABEL: &str = "Send";
pub const SENDING_LABEL: &str = "Sending...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub timeout: Duration,
    pub decoration: Decoration,
}

impl DispatchOptions {
    pub fn from_config(config: &Config) -> Self {
        DispatchOptions {
            timeout: Duration::from_secs(config.timeout),
            decoration: config.decoration,
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        DispatchOptions {
            timeout: Duration::from_secs(60),
            decoration: Decoration::Random,
        }
    }
}

/// Фаза вкладки. Конечные исходы сразу возвращают вкладку в `Idle`
/// и запоминаются в `TabState::last_outcome`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TabPhase {
    #[default]
    Idle,
    Sending { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    TimedOut,
}

/// Кнопка отправки: выключена, пока идёт отправка
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendControl {
    pub enabled: bool,
    pub label: &'static str,
}

#[derive(Debug, Default)]
pub struct TabState {
    pub draft: PostDraft,
    pub selection: PlatformSelection,
    pub(super) phase: TabPhase,
    pub(super) next_generation: u64,
    pub(super) last_outcome: Option<Outcome>,
    pub(super) log: ResponseLog,
}

impl TabState {
    pub fn send_control(&self) -> SendControl {
        match self.phase {
            TabPhase::Idle => SendControl {
                enabled: true,
                label: SEND_LABEL,
            },
            TabPhase::Sending { .. } => SendControl {
                enabled: false,
                label: SENDING_LABEL,
            },
        }
    }
}

/// Контекст приложения. Передаётся явно вместо глобальных переменных
pub struct AppContext {
    store: SettingsStore,
    settings: RwLock<WebhookSettings>,
    tabs: [Mutex<TabState>; 3],
    pub(super) sender: Arc<dyn WebhookSender>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) renderer: Arc<dyn LogRenderer>,
    pub(super) options: DispatchOptions,
    shutdown: CancellationToken,
}

impl AppContext {
    /// Создаёт контекст и восстанавливает сохранённые настройки
    pub fn new(
        store: SettingsStore,
        sender: Arc<dyn WebhookSender>,
        notifier: Arc<dyn Notifier>,
        renderer: Arc<dyn LogRenderer>,
        options: DispatchOptions,
    ) -> Arc<Self> {
        let settings = store.load();
        debug!("Session starting with settings from {}", store.path().display());

        Arc::new(AppContext {
            store,
            settings: RwLock::new(settings),
            tabs: Default::default(),
            sender,
            notifier,
            renderer,
            options,
            shutdown: CancellationToken::new(),
        })
    }

    pub(super) fn state(&self, tab: Tab) -> MutexGuard<'_, TabState> {
        let slot = match tab {
            Tab::If24 => 0,
            Tab::CreBlack => 1,
            Tab::Dudu => 2,
        };
        self.tabs[slot].lock()
    }

    pub(super) fn webhook_url(&self, tab: Tab) -> Option<String> {
        self.settings.read().webhook_for(tab).map(str::to_string)
    }

    pub fn notify(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity);
    }

    /// Сообщает об ошибке проверки и возвращает её
    pub(super) fn reject(&self, error: ValidationError) -> AppError {
        self.notify(&error.to_string(), Severity::Warning);
        error.into()
    }

    pub(super) fn render(&self, tab: Tab, entry: &LogEntry) {
        self.renderer.render_log_entry(tab, entry);
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    // --- настройки ---

    pub fn settings(&self) -> WebhookSettings {
        self.settings.read().clone()
    }

    pub fn set_webhook(&self, tab: Tab, url: &str) -> AppResult<()> {
        let snapshot = {
            let mut settings = self.settings.write();
            settings.set(tab, url);
            settings.clone()
        };
        self.store.save(&snapshot)?;
        self.notify("Settings saved", Severity::Success);
        Ok(())
    }

    pub fn reset_settings(&self) -> AppResult<()> {
        *self.settings.write() = WebhookSettings::default();
        self.store.reset()?;
        self.notify("Settings cleared", Severity::Success);
        Ok(())
    }

    // --- черновик ---

    pub fn set_text(&self, tab: Tab, text: impl Into<String>) {
        self.state(tab).draft.text = text.into();
    }

    pub fn draft(&self, tab: Tab) -> PostDraft {
        self.state(tab).draft.clone()
    }

    /// Читает картинку с диска и заменяет прежнее вложение
    pub async fn attach_image(&self, tab: Tab, path: &Path) -> AppResult<()> {
        match ImageAttachment::load(path).await {
            Ok(image) => {
                self.attach(tab, image);
                Ok(())
            }
            Err(e) => {
                self.notify(&e.to_string(), Severity::Error);
                Err(e)
            }
        }
    }

    pub fn attach(&self, tab: Tab, image: ImageAttachment) {
        info!(
            "Attached {} ({}) to {}",
            image.file_name,
            crate::models::format_file_size(image.size),
            tab
        );
        self.state(tab).draft.image = Some(image);
    }

    pub fn detach(&self, tab: Tab) {
        self.state(tab).draft.image = None;
    }

    // --- выбор платформ ---

    pub fn select(&self, tab: Tab, platform: Platform) -> AppResult<()> {
        if !tab.vocabulary().contains(&platform) {
            return Err(self.reject(ValidationError::UnsupportedPlatform { tab, platform }));
        }
        self.state(tab).selection.insert(platform);
        Ok(())
    }

    pub fn deselect(&self, tab: Tab, platform: Platform) {
        self.state(tab).selection.remove(platform);
    }

    pub fn selection(&self, tab: Tab) -> PlatformSelection {
        self.state(tab).selection.clone()
    }

    // --- состояние вкладки ---

    pub fn send_control(&self, tab: Tab) -> SendControl {
        self.state(tab).send_control()
    }

    pub fn last_outcome(&self, tab: Tab) -> Option<Outcome> {
        self.state(tab).last_outcome
    }

    pub fn log(&self, tab: Tab) -> Vec<LogEntry> {
        self.state(tab).log.entries().to_vec()
    }

    /// Очищает текст, картинку и выбор платформ. Журнал не трогается
    pub fn reset_tab(&self, tab: Tab) -> AppResult<()> {
        {
            let mut state = self.state(tab);
            if matches!(state.phase, TabPhase::Sending { .. }) {
                drop(state);
                return Err(self.reject(ValidationError::Busy(tab)));
            }
            state.draft.clear();
            state.selection.clear();
        }
        self.notify(&format!("{} tab has been reset", tab), Severity::Success);
        Ok(())
    }

    /// Подогнанный текст для каждой платформы вкладки. Без выбора
    /// показываются все платформы вкладки
    pub fn preview(&self, tab: Tab, text: &str) -> Vec<(Platform, String)> {
        let selection = self.selection(tab);
        let platforms: Vec<Platform> = if selection.is_empty() {
            tab.vocabulary().to_vec()
        } else {
            selection.as_slice().to_vec()
        };

        platforms
            .into_iter()
            .map(|platform| (platform, optimize(text, platform, self.options.decoration)))
            .collect()
    }
}
