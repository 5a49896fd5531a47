use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::{AppError, AppResult};
use crate::models::{Platform, Tab};
use crate::optimizer::Decoration;
use crate::settings::default_settings_path;

#[derive(Parser, Debug, Clone)]
#[command(name = "multipost")]
#[command(author = "Dabe Vlohn")]
#[command(version = "0.3.0")]
#[command(about = "Multi-network post uploader over automation webhooks")]
pub struct Config {
    /// Файл настроек с адресами webhook
    /// По умолчанию: <config_dir>/multipost/settings.json
    /// env: MULTIPOST_SETTINGS
    #[arg(long, env = "MULTIPOST_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Сколько секунд ждать ответа webhook, прежде чем сбросить вкладку
    /// env: MULTIPOST_TIMEOUT
    #[arg(long, env = "MULTIPOST_TIMEOUT", default_value = "60", global = true)]
    pub timeout: u64,

    /// Таймаут HTTP клиента в секундах
    /// env: MULTIPOST_HTTP_TIMEOUT
    #[arg(long, env = "MULTIPOST_HTTP_TIMEOUT", default_value = "120", global = true)]
    pub http_timeout: u64,

    /// Приветствия и эмодзи для Dudu: random или deterministic
    /// env: MULTIPOST_DECORATION
    #[arg(
        long,
        env = "MULTIPOST_DECORATION",
        value_enum,
        default_value = "random",
        global = true
    )]
    pub decoration: Decoration,

    /// Debug режим: выводить JSON ответов
    #[arg(long, env = "MULTIPOST_DEBUG", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Отправить пост через webhook вкладки
    Send {
        #[arg(long, value_enum)]
        tab: Tab,

        /// Платформа (можно повторять). Для dudu не нужна
        #[arg(long = "platform", value_enum)]
        platforms: Vec<Platform>,

        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,

        /// Прочитать текст поста из файла
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Картинка (до 10 МБ)
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Показать текст, подогнанный под каждую платформу
    Preview {
        #[arg(long, value_enum)]
        tab: Tab,

        #[arg(long = "platform", value_enum)]
        platforms: Vec<Platform>,

        #[arg(long)]
        text: String,
    },

    /// Оценить текст для Dudu и дать советы
    Suggest {
        #[arg(long)]
        text: String,
    },

    /// Адреса webhook
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Интерактивный режим с несколькими вкладками
    Shell,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsAction {
    Show,
    Set {
        #[arg(long, value_enum)]
        tab: Tab,

        #[arg(long)]
        url: String,
    },
    Reset,
}

impl Config {
    /// Валидирует конфигурацию при запуске
    pub fn validate(&self) -> AppResult<()> {
        if self.timeout == 0 {
            return Err(AppError::Config(
                "Таймаут отправки должен быть больше нуля (--timeout)".to_string(),
            ));
        }

        if self.http_timeout == 0 {
            return Err(AppError::Config(
                "Таймаут HTTP клиента должен быть больше нуля (--http-timeout)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(default_settings_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("multipost").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["shell"]);
        assert_eq!(config.timeout, 60);
        assert_eq!(config.http_timeout, 120);
        assert_eq!(config.decoration, Decoration::Random);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_send_with_repeated_platforms() {
        let config = parse(&[
            "send", "--tab", "if24", "--platform", "instagram", "--platform", "x", "--text", "hi",
        ]);
        match config.command {
            Command::Send {
                tab,
                platforms,
                text,
                ..
            } => {
                assert_eq!(tab, Tab::If24);
                assert_eq!(platforms, vec![Platform::Instagram, Platform::X]);
                assert_eq!(text.as_deref(), Some("hi"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_text_and_text_file_conflict() {
        let result = Config::try_parse_from([
            "multipost",
            "send",
            "--tab",
            "dudu",
            "--text",
            "a",
            "--text-file",
            "b.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = parse(&["--timeout", "0", "settings", "show"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_settings_path() {
        let config = parse(&["--settings", "/tmp/mp.json", "settings", "reset"]);
        assert_eq!(config.settings_path(), PathBuf::from("/tmp/mp.json"));
    }
}
