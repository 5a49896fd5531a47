pub mod client;
pub mod response;
pub mod upload;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::AppResult;
use upload::UploadRequest;

/// Ответ webhook на транспортном уровне, тело ещё не разобрано
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Абстрактный интерфейс отправки multipart-запроса на webhook
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// Отправляет запрос. Ошибка означает сбой сети; любой HTTP статус,
    /// включая 4xx/5xx, возвращается как `WebhookResponse`
    async fn post(&self, url: &str, request: UploadRequest) -> AppResult<WebhookResponse>;
}

/// Фабрика для создания HTTP клиента на основе конфигурации
pub fn create_webhook_client(config: &Config) -> AppResult<Box<dyn WebhookSender>> {
    Ok(Box::new(client::HttpWebhookClient::new(config.http_timeout)?))
}
