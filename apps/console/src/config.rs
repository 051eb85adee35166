use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::Language;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub language: Language,
    pub organisation_page_size: u32,
    pub translation_page_size: u32,
    pub settle_delay_ms: u64,
    pub translation_settle_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api/".into(),
            access_token: None,
            language: Language::En,
            organisation_page_size: 8,
            translation_page_size: 15,
            settle_delay_ms: 1500,
            translation_settle_delay_ms: 1200,
        }
    }
}

impl Settings {
    pub fn organisation_settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn translation_settle_delay(&self) -> Duration {
        Duration::from_millis(self.translation_settle_delay_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_base_url: Option<String>,
    access_token: Option<String>,
    language: Option<String>,
    organisation_page_size: Option<u32>,
    translation_page_size: Option<u32>,
    settle_delay_ms: Option<u64>,
    translation_settle_delay_ms: Option<u64>,
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable config file"),
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.access_token {
        settings.access_token = Some(v);
    }
    if let Some(v) = file_cfg.language {
        set_language(settings, &v);
    }
    if let Some(v) = file_cfg.organisation_page_size {
        settings.organisation_page_size = v;
    }
    if let Some(v) = file_cfg.translation_page_size {
        settings.translation_page_size = v;
    }
    if let Some(v) = file_cfg.settle_delay_ms {
        settings.settle_delay_ms = v;
    }
    if let Some(v) = file_cfg.translation_settle_delay_ms {
        settings.translation_settle_delay_ms = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CONSOLE_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = var("CONSOLE_ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = var("APP__ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }

    if let Some(v) = var("APP__LANGUAGE") {
        set_language(settings, &v);
    }

    if let Some(v) = var("APP__SETTLE_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.settle_delay_ms = parsed;
        }
    }
    if let Some(v) = var("APP__TRANSLATION_SETTLE_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.translation_settle_delay_ms = parsed;
        }
    }
}

fn set_language(settings: &mut Settings, raw: &str) {
    match raw.parse::<Language>() {
        Ok(language) => settings.language = language,
        Err(err) => warn!(%err, "keeping language {}", settings.language.code()),
    }
}
