use std::{collections::HashMap, fs};

use serde::Deserialize;
use server_api::openai::OpenAiConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub image_model: String,
    pub image_size: String,
    pub max_prompt_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:7110".into(),
            openai_api_key: None,
            openai_api_base: "https://api.openai.com/v1".into(),
            image_model: "gpt-image-1".into(),
            image_size: "1024x1024".into(),
            max_prompt_body_bytes: 64 * 1024,
        }
    }
}

impl Settings {
    /// `None` when no usable API key is configured.
    pub fn openai_config(&self) -> Option<OpenAiConfig> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())?;
        Some(OpenAiConfig {
            api_key: api_key.to_string(),
            api_base: self.openai_api_base.clone(),
            model: self.image_model.clone(),
            size: self.image_size.clone(),
        })
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_config(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_config(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };

    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("openai_api_base") {
        settings.openai_api_base = v.clone();
    }
    if let Some(v) = file_cfg.get("image_model") {
        settings.image_model = v.clone();
    }
    if let Some(v) = file_cfg.get("image_size") {
        settings.image_size = v.clone();
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("OPENAI_API_KEY") {
        settings.openai_api_key = Some(v);
    }
    if let Some(v) = var("APP__OPENAI_API_KEY") {
        settings.openai_api_key = Some(v);
    }

    if let Some(v) = var("OPENAI_API_BASE") {
        settings.openai_api_base = v;
    }

    if let Some(v) = var("APP__IMAGE_MODEL") {
        settings.image_model = v;
    }
    if let Some(v) = var("APP__IMAGE_SIZE") {
        settings.image_size = v;
    }

    if let Some(v) = var("APP__MAX_PROMPT_BODY_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_prompt_body_bytes = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
