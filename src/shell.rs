// shell.rs - интерактивный режим: несколько вкладок в одной сессии

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::dispatch::{self, AppContext};
use crate::error::AppError;
use crate::models::{format_file_size, Platform, Severity, Tab};
use crate::optimizer::analysis;
use crate::settings::WebhookSettings;

const HELP: &str = "\
Commands:
  tab <if24|creblack|dudu>     switch the current tab
  text <message>               set the draft text (\\n for a line break)
  attach <path>                attach an image (up to 10 MB)
  detach                       remove the attached image
  check <platform>             select a platform on the current tab
  uncheck <platform>           deselect a platform
  send                         send the current tab in the background
  reset                        clear text, image and platforms
  log                          show the current tab's response log
  status                       show every tab at a glance
  suggest [text]               tone analysis for Dudu
  preview                      optimized text per platform
  settings                     show webhook URLs
  settings set <tab> <url>     store a webhook URL
  settings reset               forget all webhook URLs
  help                         this text
  quit                         leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    SwitchTab(Tab),
    Text(String),
    Attach(PathBuf),
    Detach,
    Check(Platform),
    Uncheck(Platform),
    Send,
    Reset,
    Log,
    Status,
    Suggest(Option<String>),
    Preview,
    ShowSettings,
    SetWebhook(Tab, String),
    ResetSettings,
    Help,
    Quit,
}

/// Разбирает одну строку ввода
pub fn parse_command(line: &str) -> Result<ShellCommand, AppError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "tab" => ShellCommand::SwitchTab(rest.parse()?),
        "text" => ShellCommand::Text(rest.replace("\\n", "\n")),
        "attach" if !rest.is_empty() => ShellCommand::Attach(PathBuf::from(rest)),
        "attach" => return Err("Usage: attach <path>".into()),
        "detach" => ShellCommand::Detach,
        "check" => ShellCommand::Check(rest.parse()?),
        "uncheck" => ShellCommand::Uncheck(rest.parse()?),
        "send" => ShellCommand::Send,
        "reset" => ShellCommand::Reset,
        "log" => ShellCommand::Log,
        "status" => ShellCommand::Status,
        "suggest" if rest.is_empty() => ShellCommand::Suggest(None),
        "suggest" => ShellCommand::Suggest(Some(rest.replace("\\n", "\n"))),
        "preview" => ShellCommand::Preview,
        "settings" => parse_settings(rest)?,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("Unknown command '{}', try 'help'", other).into()),
    };

    Ok(command)
}

fn parse_settings(rest: &str) -> Result<ShellCommand, AppError> {
    let mut parts = rest.split_whitespace();
    match parts.next() {
        None | Some("show") => Ok(ShellCommand::ShowSettings),
        Some("reset") => Ok(ShellCommand::ResetSettings),
        Some("set") => {
            let tab: Tab = parts
                .next()
                .ok_or("Usage: settings set <tab> <url>")?
                .parse()?;
            let url = parts.next().unwrap_or_default().to_string();
            Ok(ShellCommand::SetWebhook(tab, url))
        }
        Some(other) => Err(format!("Unknown settings action '{}'", other).into()),
    }
}

/// Адреса webhook по вкладкам
pub fn render_settings(settings: &WebhookSettings) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            let url = settings.webhook_for(*tab).unwrap_or("(not set)");
            format!("{:<8} {}", tab.display_name(), url)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Оценка текста и советы для Dudu
pub fn render_analysis(text: &str) -> String {
    let report = analysis::analyze(text);
    let mut out = format!(
        "words: {}  emoji: {}  hashtags: {}  mood: {}\nreadability: {:.0}/100  friendliness: {}/100",
        report.word_count,
        report.emoji_count,
        report.hashtag_count,
        report.mood.as_str(),
        report.readability_score,
        report.friendliness_score
    );

    for hint in analysis::suggest(text) {
        out.push_str("\n  - ");
        out.push_str(hint);
    }
    out
}

/// Подогнанные тексты в читаемом виде
pub fn render_preview(previews: &[(Platform, String)]) -> String {
    previews
        .iter()
        .map(|(platform, text)| {
            format!(
                "--- {} ({} chars) ---\n{}",
                platform,
                crate::optimizer::char_len(text),
                text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    ctx: Arc<AppContext>,
    current: Tab,
    debug: bool,
}

impl Shell {
    pub fn new(ctx: Arc<AppContext>, debug: bool) -> Self {
        Shell {
            ctx,
            current: Tab::If24,
            debug,
        }
    }

    /// Читает команды из stdin, пока не придёт `quit` или EOF
    pub async fn run(mut self) -> anyhow::Result<()> {
        let shutdown = self.ctx.shutdown_token();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("multipost shell, type 'help' for commands");
        self.prompt();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read stdin")?,
                _ = shutdown.cancelled() => break,
            };

            let Some(line) = line else {
                debug!("stdin closed");
                break;
            };

            match parse_command(&line) {
                Ok(command) => match self.execute(command).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => {
                        warn!("Shell command failed: {:#}", e);
                        println!("error: {:#}", e);
                    }
                },
                Err(e) => println!("{}", e),
            }

            self.prompt();
        }

        self.ctx.shutdown();
        info!("Shell finished");
        Ok(())
    }

    fn prompt(&self) {
        println!("[{}]>", self.current.id());
    }

    async fn execute(&mut self, command: ShellCommand) -> anyhow::Result<Flow> {
        let tab = self.current;

        match command {
            ShellCommand::Empty => {}
            ShellCommand::SwitchTab(next) => {
                self.current = next;
                println!("Switched to {}", next);
            }
            ShellCommand::Text(text) => self.ctx.set_text(tab, text),
            ShellCommand::Attach(path) => {
                self.ctx
                    .attach_image(tab, &path)
                    .await
                    .with_context(|| format!("Cannot attach {}", path.display()))?;
            }
            ShellCommand::Detach => self.ctx.detach(tab),
            ShellCommand::Check(platform) => self.ctx.select(tab, platform)?,
            ShellCommand::Uncheck(platform) => self.ctx.deselect(tab, platform),
            ShellCommand::Send => self.spawn_send(tab),
            ShellCommand::Reset => self.ctx.reset_tab(tab)?,
            ShellCommand::Log => {
                for entry in self.ctx.log(tab) {
                    println!("{}", entry.render());
                }
            }
            ShellCommand::Status => self.print_status(),
            ShellCommand::Suggest(text) => {
                let text = text.unwrap_or_else(|| self.ctx.draft(tab).text);
                if text.trim().is_empty() {
                    return Err(anyhow!("Nothing to analyze: enter text first"));
                }
                println!("{}", render_analysis(&text));
            }
            ShellCommand::Preview => {
                let draft = self.ctx.draft(tab);
                println!("{}", render_preview(&self.ctx.preview(tab, &draft.text)));
            }
            ShellCommand::ShowSettings => println!("{}", render_settings(&self.ctx.settings())),
            ShellCommand::SetWebhook(target, url) => self
                .ctx
                .set_webhook(target, &url)
                .context("Failed to save settings")?,
            ShellCommand::ResetSettings => self
                .ctx
                .reset_settings()
                .context("Failed to reset settings")?,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Отправка идёт в отдельной задаче, остальные вкладки доступны
    fn spawn_send(&self, tab: Tab) {
        let ctx = Arc::clone(&self.ctx);
        let debug = self.debug;

        tokio::spawn(async move {
            match dispatch::send(&ctx, tab).await {
                Ok(result) if debug => match serde_json::to_string_pretty(&result.raw_response) {
                    Ok(json) => println!("{}", json),
                    Err(e) => warn!("Cannot render response JSON: {}", e),
                },
                Ok(_) => {}
                Err(AppError::Validation(e)) => debug!("Send on {} not started: {}", tab, e),
                Err(e) => ctx.notify(&e.to_string(), Severity::Error),
            }
        });
    }

    fn print_status(&self) {
        for tab in Tab::ALL {
            let draft = self.ctx.draft(tab);
            let control = self.ctx.send_control(tab);
            let marker = if tab == self.current { '*' } else { ' ' };

            let image = match &draft.image {
                Some(image) => format!("{} ({})", image.file_name, format_file_size(image.size)),
                None => "no image".to_string(),
            };
            let platforms = self
                .ctx
                .selection(tab)
                .as_slice()
                .iter()
                .map(|p| p.wire_name())
                .collect::<Vec<_>>()
                .join(",");

            println!(
                "{}{:<8} [{}] {} chars, {}, platforms: {}, last: {:?}",
                marker,
                tab.display_name(),
                control.label,
                draft.text.chars().count(),
                image,
                if platforms.is_empty() { "-" } else { platforms.as_str() },
                self.ctx.last_outcome(tab)
            );

            if self.debug {
                if let Some(image) = &draft.image {
                    let url = image.to_data_url();
                    println!("          {}...", url.chars().take(64).collect::<String>());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("").unwrap(), ShellCommand::Empty);
        assert_eq!(parse_command("  send ").unwrap(), ShellCommand::Send);
        assert_eq!(
            parse_command("tab CreBlack").unwrap(),
            ShellCommand::SwitchTab(Tab::CreBlack)
        );
        assert_eq!(
            parse_command("check twitter").unwrap(),
            ShellCommand::Check(Platform::X)
        );
        assert_eq!(parse_command("QUIT").unwrap(), ShellCommand::Quit);
    }

    #[test]
    fn test_parse_text_keeps_spacing_and_line_breaks() {
        assert_eq!(
            parse_command("text Hello  world\\n#launch").unwrap(),
            ShellCommand::Text("Hello  world\n#launch".to_string())
        );
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!(parse_command("settings").unwrap(), ShellCommand::ShowSettings);
        assert_eq!(
            parse_command("settings set dudu https://hook.example/abc").unwrap(),
            ShellCommand::SetWebhook(Tab::Dudu, "https://hook.example/abc".to_string())
        );
        assert_eq!(
            parse_command("settings reset").unwrap(),
            ShellCommand::ResetSettings
        );
        assert!(parse_command("settings set").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_command("tab facebook"),
            Err(AppError::UnknownTab(_))
        ));
        assert!(matches!(
            parse_command("check myspace"),
            Err(AppError::UnknownPlatform(_))
        ));
        assert!(parse_command("attach").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn test_render_settings_marks_missing_urls() {
        let mut settings = WebhookSettings::default();
        settings.set(Tab::If24, "https://hook.example/if24");
        let rendered = render_settings(&settings);

        assert!(rendered.contains("IF24     https://hook.example/if24"));
        assert!(rendered.contains("Dudu     (not set)"));
    }

    #[test]
    fn test_render_analysis_lists_hints() {
        let rendered = render_analysis("오늘 너무 힘들고 걱정이 많다");
        assert!(rendered.contains("mood: negative"));
        assert!(rendered.contains("\n  - "));
    }
}
