use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

use super::upload::UploadRequest;
use super::{WebhookResponse, WebhookSender};
use crate::error::{AppError, AppResult};

const USER_AGENT: &str = "multipost/0.3";

pub struct HttpWebhookClient {
    http_client: Client,
}

impl HttpWebhookClient {
    pub fn new(timeout_secs: u64) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(HttpWebhookClient { http_client })
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookClient {
    async fn post(&self, url: &str, request: UploadRequest) -> AppResult<WebhookResponse> {
        debug!(
            "Posting {} fields for tab {} to webhook {} (image: {})",
            request.fields().len(),
            request.field("tab").unwrap_or("-"),
            url,
            request.image().is_some()
        );

        let mut builder = self.http_client.post(url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .multipart(request.into_form()?)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach webhook: {}", e);
                if e.is_timeout() {
                    AppError::Transport(format!("Request timed out: {}", e))
                } else {
                    AppError::NetworkError(e)
                }
            })?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read webhook response body: {}", e);
            AppError::NetworkError(e)
        })?;

        info!("Webhook responded with {} ({} bytes)", status, body.len());

        Ok(WebhookResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageAttachment, Platform, PlatformSelection, Tab};
    use mockito::{Matcher, Server};

    // Заголовок GIF целиком в ASCII, так тело запроса остаётся читаемым для матчера
    const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";

    #[tokio::test]
    async fn test_posts_multipart_fields_and_image() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data; boundary=.*".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="content"\r\n\r\nhello"#.to_string()),
                Matcher::Regex(r#"name="platforms"\r\n\r\n\["instagram","x"\]"#.to_string()),
                Matcher::Regex(r#"name="image_0"; filename="shot.gif""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success","message":"queued"}"#)
            .create_async()
            .await;

        let selection: PlatformSelection = [Platform::Instagram, Platform::X].into_iter().collect();
        let image = ImageAttachment::from_bytes("shot.gif", GIF_BYTES.to_vec()).unwrap();
        let request = UploadRequest::builder(Tab::If24)
            .content("hello")
            .platforms(&selection)
            .image(Some(image))
            .build();

        let client = HttpWebhookClient::new(5).unwrap();
        let response = client
            .post(&format!("{}/hook", server.url()), request)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
        assert_eq!(response.body, r#"{"status":"success","message":"queued"}"#);
    }

    #[tokio::test]
    async fn test_http_error_status_is_returned_not_raised() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = HttpWebhookClient::new(5).unwrap();
        let response = client
            .post(
                &format!("{}/hook", server.url()),
                UploadRequest::builder(Tab::Dudu).content("hi").build(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 500);
        assert_eq!(response.reason, "Internal Server Error");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_sends_custom_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/dudu")
            .match_header("x-platform", "Dudu")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let request = UploadRequest::builder(Tab::Dudu)
            .content("hi")
            .header("X-Platform", "Dudu")
            .build();

        let client = HttpWebhookClient::new(5).unwrap();
        client
            .post(&format!("{}/dudu", server.url()), request)
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
