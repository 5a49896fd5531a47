// dispatch/dispatcher.rs - отправка вкладки: Idle -> Sending -> итог -> Idle

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use super::context::{AppContext, Outcome, TabPhase, TabState};
use super::log::LogEntry;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{DispatchResult, Severity, Tab};
use crate::webhook::response;
use crate::webhook::upload::{compose_upload, UploadRequest};
use crate::webhook::WebhookResponse;

type CallHandle = JoinHandle<AppResult<WebhookResponse>>;

/// Попытка, прошедшая проверку и переведённая в `Sending`
pub(crate) struct Attempt {
    pub generation: u64,
    pub url: String,
    pub request: UploadRequest,
}

/// Что завершило попытку первым
pub(crate) enum Resolution {
    Response(AppResult<WebhookResponse>),
    TimedOut,
}

impl Resolution {
    fn from_join(joined: Result<AppResult<WebhookResponse>, JoinError>) -> Self {
        Resolution::Response(
            joined.unwrap_or_else(|e| Err(AppError::Custom(format!("Send task failed: {}", e)))),
        )
    }
}

/// Порядок проверок: выбор платформ, webhook, содержимое
fn validate(tab: Tab, state: &TabState, url: Option<String>) -> Result<String, ValidationError> {
    if matches!(state.phase, TabPhase::Sending { .. }) {
        return Err(ValidationError::Busy(tab));
    }

    if tab.is_multi_network() {
        if state.selection.is_empty() {
            return Err(ValidationError::EmptySelection(tab));
        }
        state.selection.check_against(tab)?;
    }

    let url = url.ok_or(ValidationError::MissingWebhook(tab))?;

    if !state.draft.has_content() {
        return Err(ValidationError::EmptyContent);
    }

    Ok(url)
}

fn targets(tab: Tab, state: &TabState) -> String {
    if tab.is_multi_network() {
        state
            .selection
            .as_slice()
            .iter()
            .map(|p| p.wire_name())
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        tab.id().to_string()
    }
}

impl AppContext {
    /// Проверяет предусловия и переводит вкладку в `Sending`.
    /// При нарушении выдаёт ровно одно предупреждение, вкладка остаётся `Idle`
    pub(crate) fn begin(&self, tab: Tab) -> AppResult<Attempt> {
        let url = self.webhook_url(tab);
        let mut state = self.state(tab);

        let url = match validate(tab, &state, url) {
            Ok(url) => url,
            Err(e) => {
                drop(state);
                warn!("Send on {} rejected: {}", tab, e);
                return Err(self.reject(e));
            }
        };

        let generation = state.next_generation;
        state.next_generation += 1;
        state.phase = TabPhase::Sending { generation };

        let request = compose_upload(
            tab,
            &state.draft,
            &state.selection,
            self.options.decoration,
            Utc::now(),
        );
        let pending = format!("Send started ({})", targets(tab, &state));
        let entry = state.log.append(LogEntry::pending(pending)).clone();
        drop(state);

        self.render(tab, &entry);
        Ok(Attempt {
            generation,
            url,
            request,
        })
    }

    /// Применяет итог попытки, если она всё ещё текущая. Поздний ответ
    /// для старой попытки отбрасывается и возвращает `None`
    pub(crate) fn complete(
        &self,
        tab: Tab,
        generation: u64,
        resolution: Resolution,
    ) -> Option<DispatchResult> {
        let mut state = self.state(tab);

        if state.phase != (TabPhase::Sending { generation }) {
            debug!(
                "Ignoring late resolution for {} attempt #{} (phase: {:?})",
                tab, generation, state.phase
            );
            return None;
        }

        let group = tab.id();
        let (result, outcome) = match resolution {
            Resolution::TimedOut => (
                response::timed_out(group, self.options.timeout.as_secs()),
                Outcome::TimedOut,
            ),
            Resolution::Response(Ok(reply)) => {
                let result = response::normalize(group, &reply);
                let outcome = if result.success {
                    Outcome::Succeeded
                } else {
                    Outcome::Failed
                };
                (result, outcome)
            }
            Resolution::Response(Err(e)) => (
                response::failure(group, format!("Request failed: {}", e), Value::Null),
                Outcome::Failed,
            ),
        };

        let entry = state.log.append(LogEntry::from_result(&result)).clone();
        state.phase = TabPhase::Idle;
        state.last_outcome = Some(outcome);
        drop(state);

        self.render(tab, &entry);
        if result.success {
            info!("{} attempt #{} succeeded: {}", tab, generation, result.message);
            self.notify(&format!("{} send complete", tab), Severity::Success);
        } else {
            warn!("{} attempt #{} failed: {}", tab, generation, result.message);
            self.notify(&format!("{} send failed", tab), Severity::Error);
        }

        Some(result)
    }
}

/// Отправляет черновик вкладки на её webhook.
///
/// Ошибки проверки возвращаются как `Err`. Сбои транспорта и таймаут
/// не считаются ошибкой вызова: они попадают в журнал, а результат
/// возвращается с `success == false`.
pub async fn send(ctx: &Arc<AppContext>, tab: Tab) -> AppResult<DispatchResult> {
    let Attempt {
        generation,
        url,
        request,
    } = ctx.begin(tab)?;

    info!("Dispatching {} attempt #{} to {}", tab, generation, url);

    let sender = Arc::clone(&ctx.sender);
    let mut call: CallHandle = tokio::spawn(async move { sender.post(&url, request).await });

    let first = tokio::select! {
        joined = &mut call => Some(Resolution::from_join(joined)),
        _ = tokio::time::sleep(ctx.options.timeout) => None,
    };

    let result = match first {
        Some(resolution) => ctx.complete(tab, generation, resolution),
        None => {
            warn!(
                "{} attempt #{} timed out after {:?}",
                tab, generation, ctx.options.timeout
            );
            // Сначала фиксируем таймаут, затем следим за запросом
            let result = ctx.complete(tab, generation, Resolution::TimedOut);
            watch_late_resolution(Arc::clone(ctx), tab, generation, call);
            result
        }
    };

    result.ok_or_else(|| {
        AppError::Custom(format!("{} attempt #{} was superseded", tab, generation))
    })
}

/// Запрос не отменяется на транспорте; его поздний результат только
/// логируется и не меняет состояние вкладки
fn watch_late_resolution(ctx: Arc<AppContext>, tab: Tab, generation: u64, call: CallHandle) {
    let shutdown = ctx.shutdown_token();
    tokio::spawn(async move {
        tokio::select! {
            joined = call => {
                if ctx.complete(tab, generation, Resolution::from_join(joined)).is_some() {
                    warn!("Late response for {} attempt #{} was applied", tab, generation);
                }
            }
            _ = shutdown.cancelled() => {
                debug!("Stopped waiting for {} attempt #{}", tab, generation);
            }
        }
    });
}
