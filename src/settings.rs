// settings.rs - хранилище адресов webhook по вкладкам

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::Tab;

/// Ключ, под которым настройки лежат в хранилище
pub const SETTINGS_KEY: &str = "webhookSettings";

/// Один URL на вкладку. Пустая строка означает "не настроено"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub if24: String,
    pub creblack: String,
    pub dudu: String,
}

impl WebhookSettings {
    pub fn get(&self, tab: Tab) -> &str {
        match tab {
            Tab::If24 => &self.if24,
            Tab::CreBlack => &self.creblack,
            Tab::Dudu => &self.dudu,
        }
    }

    pub fn set(&mut self, tab: Tab, url: impl Into<String>) {
        let url = url.into().trim().to_string();
        match tab {
            Tab::If24 => self.if24 = url,
            Tab::CreBlack => self.creblack = url,
            Tab::Dudu => self.dudu = url,
        }
    }

    /// URL вкладки, если он задан
    pub fn webhook_for(&self, tab: Tab) -> Option<&str> {
        let url = self.get(tab);
        (!url.is_empty()).then_some(url)
    }
}

/// Плоское хранилище ключ -> строка в одном JSON файле
#[derive(Debug, Clone)]
pub struct KeyValueFile {
    path: PathBuf,
}

impl KeyValueFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KeyValueFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Читает всё содержимое. Отсутствующий или битый файл даёт пустую карту
    fn read_all(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Key-value store {} not readable: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "Key-value store {} is corrupt, ignoring: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    pub fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut map = self.read_all();
        map.insert(key.to_string(), value);
        self.write_all(&map)
    }

    pub fn remove(&self, key: &str) -> AppResult<()> {
        let mut map = self.read_all();
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

/// Загрузка и сохранение настроек webhook
#[derive(Debug, Clone)]
pub struct SettingsStore {
    backend: KeyValueFile,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsStore {
            backend: KeyValueFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.backend.path()
    }

    /// Восстанавливает настройки. Ошибки не всплывают к пользователю
    pub fn load(&self) -> WebhookSettings {
        let Some(raw) = self.backend.get(SETTINGS_KEY) else {
            info!("No saved webhook settings, using defaults");
            return WebhookSettings::default();
        };

        match serde_json::from_str::<WebhookSettings>(&raw) {
            Ok(settings) => {
                debug!("Loaded webhook settings from {}", self.path().display());
                settings
            }
            Err(e) => {
                warn!("Saved webhook settings are corrupt, using defaults: {}", e);
                WebhookSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &WebhookSettings) -> AppResult<()> {
        let serialized = serde_json::to_string(settings)?;
        self.backend.set(SETTINGS_KEY, serialized)?;
        info!("Webhook settings saved to {}", self.path().display());
        Ok(())
    }

    pub fn reset(&self) -> AppResult<()> {
        self.backend.remove(SETTINGS_KEY)?;
        info!("Webhook settings cleared");
        Ok(())
    }
}

/// Путь по умолчанию: <config_dir>/multipost/settings.json
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("multipost")
        .join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load(), WebhookSettings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));

        let mut settings = WebhookSettings::default();
        settings.set(Tab::If24, "  https://hook.example.com/if24 ");
        settings.set(Tab::Dudu, "https://hook.example.com/dudu");
        store.save(&settings).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.webhook_for(Tab::If24), Some("https://hook.example.com/if24"));
        assert_eq!(loaded.webhook_for(Tab::CreBlack), None);
        assert_eq!(loaded.webhook_for(Tab::Dudu), Some("https://hook.example.com/dudu"));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(SettingsStore::new(&path).load(), WebhookSettings::default());

        fs::write(&path, r#"{"webhookSettings": "[1, 2"}"#).unwrap();
        assert_eq!(SettingsStore::new(&path).load(), WebhookSettings::default());
    }

    #[test]
    fn test_partial_settings_merge_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"webhookSettings": "{\"dudu\":\"https://d.example\",\"instagram\":\"legacy\"}"}"#,
        )
        .unwrap();

        let loaded = SettingsStore::new(&path).load();
        assert_eq!(loaded.dudu, "https://d.example");
        assert!(loaded.if24.is_empty());
    }

    #[test]
    fn test_reset_removes_only_settings_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let backend = KeyValueFile::new(&path);
        backend.set("theme", "dark".to_string()).unwrap();

        let store = SettingsStore::new(&path);
        let mut settings = WebhookSettings::default();
        settings.set(Tab::CreBlack, "https://c.example");
        store.save(&settings).unwrap();
        store.reset().unwrap();

        assert_eq!(store.load(), WebhookSettings::default());
        assert_eq!(backend.get("theme").as_deref(), Some("dark"));
    }
}
