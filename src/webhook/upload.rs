// webhook/upload.rs - сборка multipart-запроса для одного webhook

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};

use crate::error::{AppError, AppResult};
use crate::models::{ImageAttachment, Platform, PlatformSelection, PostDraft, Tab};
use crate::optimizer::{analysis, optimize, Decoration};

/// Фиксированное имя поля с картинкой
pub const IMAGE_FIELD: &str = "image_0";
pub const SOURCE_TAG: &str = "AI_Content_Uploader";

/// Готовый к отправке запрос. Получатель ищет поля по имени,
/// так что порядок полей значения не имеет
#[derive(Debug, Clone)]
pub struct UploadRequest {
    fields: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    image: Option<ImageAttachment>,
}

impl UploadRequest {
    pub fn builder(tab: Tab) -> UploadRequestBuilder {
        UploadRequestBuilder::new(tab)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Превращает запрос в multipart-форму. Байты картинки идут как есть
    pub fn into_form(self) -> AppResult<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        if let Some(image) = self.image {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.mime)
                .map_err(|e| AppError::Custom(format!("Invalid MIME type: {}", e)))?;
            form = form.part(IMAGE_FIELD, part);
        }

        Ok(form)
    }
}

pub struct UploadRequestBuilder {
    tab: Tab,
    content: String,
    selector: Option<(String, String)>,
    extra: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    image: Option<ImageAttachment>,
    timestamp: DateTime<Utc>,
}

impl UploadRequestBuilder {
    fn new(tab: Tab) -> Self {
        UploadRequestBuilder {
            tab,
            content: String::new(),
            selector: None,
            extra: Vec::new(),
            headers: Vec::new(),
            image: None,
            timestamp: Utc::now(),
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Несколько платформ: поле `platforms` с JSON-массивом
    pub fn platforms(mut self, selection: &PlatformSelection) -> Self {
        self.selector = Some(("platforms".to_string(), selection.to_json()));
        self
    }

    /// Одна платформа: поле `platform` со строкой
    pub fn platform(mut self, platform: Platform) -> Self {
        self.selector = Some(("platform".to_string(), platform.wire_name().to_string()));
        self
    }

    /// Текст, подогнанный под конкретную сеть: поле `content_<platform>`
    pub fn platform_content(self, platform: Platform, text: impl Into<String>) -> Self {
        self.field(format!("content_{}", platform.wire_name()), text)
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn image(mut self, image: Option<ImageAttachment>) -> Self {
        self.image = image;
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn build(self) -> UploadRequest {
        let mut fields = vec![("content".to_string(), self.content)];
        fields.extend(self.selector);
        fields.push((
            "timestamp".to_string(),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
        fields.push(("source".to_string(), SOURCE_TAG.to_string()));
        fields.push(("tab".to_string(), self.tab.id().to_string()));
        fields.push((
            "contentType".to_string(),
            self.tab.content_type().to_string(),
        ));
        fields.extend(self.extra);

        UploadRequest {
            fields,
            headers: self.headers,
            image: self.image,
        }
    }
}

/// Собирает запрос вкладки из черновика: подгоняет текст под платформы
/// и добавляет метаданные
pub fn compose_upload(
    tab: Tab,
    draft: &PostDraft,
    selection: &PlatformSelection,
    decoration: Decoration,
    timestamp: DateTime<Utc>,
) -> UploadRequest {
    let builder = UploadRequest::builder(tab)
        .timestamp(timestamp)
        .image(draft.image.clone());

    if tab.is_multi_network() {
        selection
            .as_slice()
            .iter()
            .fold(
                builder.content(draft.text.as_str()).platforms(selection),
                |builder, platform| {
                    builder.platform_content(*platform, optimize(&draft.text, *platform, decoration))
                },
            )
            .build()
    } else {
        builder
            .content(optimize(&draft.text, Platform::Dudu, decoration))
            .platform(Platform::Dudu)
            .field("mood", analysis::mood(&draft.text).as_str())
            .header("X-Platform", "Dudu")
            .header("X-Source", "AI-Content-Uploader")
            .header("X-Content-Type", tab.content_type())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_multi_network_fields() {
        let draft = PostDraft {
            text: "New drop today".to_string(),
            image: None,
        };
        let selection: PlatformSelection =
            [Platform::Instagram, Platform::X].into_iter().collect();

        let request = compose_upload(
            Tab::If24,
            &draft,
            &selection,
            Decoration::Deterministic,
            fixed_time(),
        );

        assert_eq!(request.field("content"), Some("New drop today"));
        assert_eq!(request.field("platforms"), Some(r#"["instagram","x"]"#));
        assert_eq!(request.field("platform"), None);
        assert_eq!(request.field("timestamp"), Some("2025-03-14T09:26:53.000Z"));
        assert_eq!(request.field("source"), Some(SOURCE_TAG));
        assert_eq!(request.field("tab"), Some("if24"));
        assert_eq!(request.field("contentType"), Some("multi"));
        assert_eq!(
            request.field("content_instagram"),
            Some("New drop today\n\n#instagram #daily #photo")
        );
        assert_eq!(request.field("content_x"), Some("New drop today #twitter"));
        assert_eq!(request.field("content_threads"), None);
        assert!(request.image().is_none());
        assert!(request.headers().is_empty());
    }

    #[test]
    fn test_single_network_fields_and_headers() {
        let draft = PostDraft {
            text: "하이! 정말 행복한 하루 #dudu 😊🎉".to_string(),
            image: None,
        };

        let request = compose_upload(
            Tab::Dudu,
            &draft,
            &PlatformSelection::new(),
            Decoration::Deterministic,
            fixed_time(),
        );

        assert_eq!(request.field("platform"), Some("dudu"));
        assert_eq!(request.field("platforms"), None);
        assert_eq!(request.field("contentType"), Some("social"));
        assert_eq!(request.field("mood"), Some("positive"));
        assert_eq!(request.field("content"), Some(draft.text.as_str()));
        assert!(request
            .headers()
            .contains(&("X-Platform".to_string(), "Dudu".to_string())));
    }

    #[test]
    fn test_image_is_passed_through_untouched() {
        let bytes = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();
        let image = ImageAttachment::from_bytes("pic.gif", bytes.clone()).unwrap();
        let draft = PostDraft {
            text: String::new(),
            image: Some(image),
        };
        let selection: PlatformSelection = [Platform::Threads].into_iter().collect();

        let request = compose_upload(
            Tab::CreBlack,
            &draft,
            &selection,
            Decoration::Deterministic,
            fixed_time(),
        );

        let attached = request.image().unwrap();
        assert_eq!(attached.bytes, bytes);
        assert_eq!(attached.file_name, "pic.gif");
        assert!(request.into_form().is_ok());
    }
}
