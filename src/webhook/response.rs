// webhook/response.rs - приведение разнородных ответов webhook к одному виду

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::WebhookResponse;
use crate::models::{DispatchResult, NormalizedStatus};

/// Тело ответа: JSON или просто текст
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookReply {
    Structured(Value),
    Text(String),
}

impl WebhookReply {
    /// Пробует разобрать JSON; при неудаче тело считается текстом
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => WebhookReply::Structured(value),
            Err(e) => {
                debug!("Webhook response is not JSON, falling back to text: {}", e);
                WebhookReply::Text(body.to_string())
            }
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            WebhookReply::Structured(value) => value,
            WebhookReply::Text(text) => Value::String(text),
        }
    }
}

/// Прикладной статус, извлечённый из тела ответа
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppStatus {
    pub status: Option<String>,
    pub message: String,
}

impl AppStatus {
    pub fn is_success(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("success"))
    }
}

/// Ищет `status` в объекте: прямо, в объекте `message` или в строке
/// `message`, содержащей JSON
fn status_in(object: &Value) -> Option<AppStatus> {
    if let Some(status) = object.get("status").and_then(Value::as_str) {
        return Some(AppStatus {
            status: Some(status.to_string()),
            message: text_of(object.get("message")),
        });
    }

    match object.get("message")? {
        inner @ Value::Object(_) => {
            let status = inner.get("status").and_then(Value::as_str)?;
            Some(AppStatus {
                status: Some(status.to_string()),
                message: text_of(inner.get("message")),
            })
        }
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => {
                let status = parsed.get("status").and_then(Value::as_str)?;
                Some(AppStatus {
                    status: Some(status.to_string()),
                    message: text_of(parsed.get("message")),
                })
            }
            Err(_) => Some(AppStatus {
                status: None,
                message: raw.clone(),
            }),
        },
        _ => None,
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Извлекает прикладной статус. Статус может лежать на верхнем уровне
/// или на один-два уровня глубже внутри обёртки `result`/`message`
pub fn extract_status(reply: &WebhookReply) -> AppStatus {
    match reply {
        WebhookReply::Structured(value) => {
            // Некоторые сценарии автоматизации отвечают массивом из одного элемента
            let root = match value {
                Value::Array(items) => items.first().unwrap_or(value),
                other => other,
            };

            let candidates = [Some(root), root.get("result")];
            let mut fallback = AppStatus::default();
            for candidate in candidates.into_iter().flatten() {
                if let Some(found) = status_in(candidate) {
                    if found.status.is_some() {
                        return found;
                    }
                    if fallback.message.is_empty() {
                        fallback = found;
                    }
                }
            }
            fallback
        }
        WebhookReply::Text(text) => {
            // Последний шанс: ищем слово success в тексте
            let status = if text.contains("success") {
                "success"
            } else {
                "error"
            };
            AppStatus {
                status: Some(status.to_string()),
                message: text.clone(),
            }
        }
    }
}

/// Превращает ответ webhook в итог отправки. Успех требует и 2xx на
/// транспорте, и прикладного статуса `success`
pub fn normalize(group: &str, response: &WebhookResponse) -> DispatchResult {
    let reply = WebhookReply::parse(&response.body);

    if !response.is_success() {
        return failure(
            group,
            format!("Webhook returned HTTP {} {}", response.status, response.reason)
                .trim_end()
                .to_string(),
            reply.into_value(),
        );
    }

    let app_status = extract_status(&reply);
    let raw_response = reply.into_value();

    if app_status.is_success() {
        let message = if app_status.message.is_empty() {
            "Post delivered".to_string()
        } else {
            app_status.message
        };
        DispatchResult {
            success: true,
            platform_or_group: group.to_string(),
            raw_response,
            normalized_status: NormalizedStatus::Success,
            message,
            timestamp_iso: Utc::now().to_rfc3339(),
        }
    } else {
        let message = match (app_status.message.is_empty(), app_status.status) {
            (false, _) => app_status.message,
            (true, Some(status)) => format!("Webhook reported status '{}'", status),
            (true, None) => "Webhook response carried no status".to_string(),
        };
        failure(group, message, raw_response)
    }
}

/// Сбой сети или транспорта
pub fn failure(group: &str, message: impl Into<String>, raw_response: Value) -> DispatchResult {
    DispatchResult {
        success: false,
        platform_or_group: group.to_string(),
        raw_response,
        normalized_status: NormalizedStatus::Error,
        message: message.into(),
        timestamp_iso: Utc::now().to_rfc3339(),
    }
}

/// Таймаут на стороне клиента
pub fn timed_out(group: &str, timeout_secs: u64) -> DispatchResult {
    failure(
        group,
        format!("Send timed out (no response within {} seconds)", timeout_secs),
        serde_json::json!({ "timeout": true }),
    )
}
