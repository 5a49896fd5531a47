use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ValidationError};

/// Максимальный размер вложения: 10 MiB
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Вкладка: независимая единица "написать и отправить", привязанная к одному webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[value(name = "if24")]
    If24,
    #[value(name = "creblack")]
    CreBlack,
    #[value(name = "dudu")]
    Dudu,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::If24, Tab::CreBlack, Tab::Dudu];

    pub fn id(&self) -> &'static str {
        match self {
            Tab::If24 => "if24",
            Tab::CreBlack => "creblack",
            Tab::Dudu => "dudu",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tab::If24 => "IF24",
            Tab::CreBlack => "CreBlack",
            Tab::Dudu => "Dudu",
        }
    }

    /// Платформы, которые можно выбрать на вкладке
    pub fn vocabulary(&self) -> &'static [Platform] {
        match self {
            Tab::If24 => &[Platform::Instagram, Platform::Threads, Platform::X],
            Tab::CreBlack => &[Platform::Instagram, Platform::Threads],
            Tab::Dudu => &[Platform::Dudu],
        }
    }

    /// Несколько сетей на одном webhook, различаются полем `platforms`
    pub fn is_multi_network(&self) -> bool {
        !matches!(self, Tab::Dudu)
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Tab::Dudu => "social",
            Tab::If24 | Tab::CreBlack => "multi",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Tab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::UnknownTab(s.to_string()))
    }
}

/// Внешняя сеть, в которую webhook раздаёт пост дальше
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[value(name = "instagram")]
    Instagram,
    #[value(name = "threads")]
    Threads,
    #[value(name = "x")]
    X,
    #[value(name = "dudu")]
    Dudu,
}

impl Platform {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Threads => "threads",
            Platform::X => "x",
            Platform::Dudu => "dudu",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "threads" | "thread" => Ok(Platform::Threads),
            "x" | "twitter" => Ok(Platform::X),
            "dudu" => Ok(Platform::Dudu),
            _ => Err(AppError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Упорядоченный набор выбранных платформ без повторов
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSelection {
    platforms: Vec<Platform>,
}

impl PlatformSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, platform: Platform) {
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
        }
    }

    pub fn remove(&mut self, platform: Platform) {
        self.platforms.retain(|p| *p != platform);
    }

    pub fn clear(&mut self) {
        self.platforms.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn as_slice(&self) -> &[Platform] {
        &self.platforms
    }

    /// Проверяет, что все выбранные платформы есть в словаре вкладки
    pub fn check_against(&self, tab: Tab) -> Result<(), ValidationError> {
        match self
            .platforms
            .iter()
            .find(|p| !tab.vocabulary().contains(p))
        {
            Some(platform) => Err(ValidationError::UnsupportedPlatform {
                tab,
                platform: *platform,
            }),
            None => Ok(()),
        }
    }

    /// JSON-массив для поля `platforms`
    pub fn to_json(&self) -> String {
        let names: Vec<&str> = self.platforms.iter().map(|p| p.wire_name()).collect();
        serde_json::Value::from(names).to_string()
    }
}

impl FromIterator<Platform> for PlatformSelection {
    fn from_iter<I: IntoIterator<Item = Platform>>(iter: I) -> Self {
        let mut selection = PlatformSelection::new();
        for platform in iter {
            selection.insert(platform);
        }
        selection
    }
}

/// Прикреплённое изображение. Байты передаются как есть, без перекодирования
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// Собирает вложение из байтов, проверяя тип и размер
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> AppResult<Self> {
        let file_name = file_name.into();
        let size = bytes.len() as u64;

        if size > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge(format_file_size(size)).into());
        }

        let mime = detect_mime(&file_name, &bytes);
        if !mime.starts_with("image/") {
            return Err(ValidationError::NotAnImage(mime).into());
        }

        Ok(ImageAttachment {
            file_name,
            mime,
            size,
            bytes,
        })
    }

    /// Асинхронно читает файл с диска
    pub async fn load(path: &Path) -> AppResult<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if metadata.len() > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge(format_file_size(metadata.len())).into());
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Self::from_bytes(file_name, bytes)
    }

    /// data:-URL для предпросмотра
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

fn detect_mime(file_name: &str, bytes: &[u8]) -> String {
    let sniffed = tree_magic_mini::from_u8(bytes);
    if sniffed.starts_with("image/") {
        return sniffed.to_string();
    }

    // Содержимое не распознано, смотрим на расширение
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => sniffed,
    }
    .to_string()
}

/// Черновик поста. Живёт только в памяти и не очищается после отправки
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

impl PostDraft {
    /// Есть что отправлять: непустой текст или картинка
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.image.is_some()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.image = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizedStatus {
    Success,
    Error,
}

/// Итог одной попытки отправки. После создания не меняется
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub platform_or_group: String,
    pub raw_response: serde_json::Value,
    pub normalized_status: NormalizedStatus,
    pub message: String,
    pub timestamp_iso: String,
}

/// Уровень уведомления для пользователя
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        f.write_str(label)
    }
}

/// Размер файла в человекочитаемом виде (основание 1024)
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
