use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod dispatch;
mod error;
mod models;
mod optimizer;
mod settings;
mod shell;
mod webhook;

use config::{Command, Config, SettingsAction};
use dispatch::log::ConsoleRenderer;
use dispatch::notify::ConsoleNotifier;
use dispatch::{AppContext, DispatchOptions};
use error::{AppError, AppResult};
use models::{Platform, Tab};
use settings::SettingsStore;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Инициализируем логирование
    init_tracing()?;

    // Парсим конфигурацию из CLI и env
    let config = Config::parse();

    // Валидируем конфигурацию
    config.validate()?;

    let settings_path = config.settings_path();
    info!(
        "Starting multipost - settings: {}, timeout: {}s, decoration: {:?}",
        settings_path.display(),
        config.timeout,
        config.decoration
    );

    let sender = webhook::create_webhook_client(&config)?;
    let ctx = AppContext::new(
        SettingsStore::new(settings_path),
        Arc::from(sender),
        Arc::new(ConsoleNotifier),
        Arc::new(ConsoleRenderer),
        DispatchOptions::from_config(&config),
    );

    match config.command.clone() {
        Command::Send {
            tab,
            platforms,
            text,
            text_file,
            image,
        } => send_once(&ctx, &config, tab, platforms, text, text_file, image).await,
        Command::Preview {
            tab,
            platforms,
            text,
        } => {
            select_all(&ctx, tab, &platforms)?;
            println!("{}", shell::render_preview(&ctx.preview(tab, &text)));
            Ok(())
        }
        Command::Suggest { text } => {
            println!("{}", shell::render_analysis(&text));
            Ok(())
        }
        Command::Settings { action } => {
            match action {
                SettingsAction::Show => {}
                SettingsAction::Set { tab, url } => ctx.set_webhook(tab, &url)?,
                SettingsAction::Reset => ctx.reset_settings()?,
            }
            println!("{}", shell::render_settings(&ctx.settings()));
            Ok(())
        }
        Command::Shell => shell::Shell::new(Arc::clone(&ctx), config.debug)
            .run()
            .await
            .map_err(|e| AppError::Custom(format!("{:#}", e))),
    }
}

fn select_all(ctx: &AppContext, tab: Tab, platforms: &[Platform]) -> AppResult<()> {
    for platform in platforms {
        ctx.select(tab, *platform)?;
    }
    Ok(())
}

/// Одна отправка из командной строки. Неудачный итог завершает процесс с ошибкой
async fn send_once(
    ctx: &Arc<AppContext>,
    config: &Config,
    tab: Tab,
    platforms: Vec<Platform>,
    text: Option<String>,
    text_file: Option<PathBuf>,
    image: Option<PathBuf>,
) -> AppResult<()> {
    let text = match (text, text_file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path).await?,
        (None, None) => String::new(),
    };

    ctx.set_text(tab, text);
    select_all(ctx, tab, &platforms)?;
    if let Some(path) = image {
        ctx.attach_image(tab, &path).await?;
    }

    let result = dispatch::send(ctx, tab).await?;
    ctx.shutdown();

    if config.debug {
        println!("{}", serde_json::to_string_pretty(&result.raw_response)?);
    }

    if result.success {
        Ok(())
    } else {
        error!("{} send failed: {}", tab, result.message);
        Err(AppError::Transport(result.message))
    }
}

/// Инициализирует систему логирования с использованием tracing.
/// Логи идут в stderr, stdout занят журналом ответов
fn init_tracing() -> AppResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .init();

    Ok(())
}
