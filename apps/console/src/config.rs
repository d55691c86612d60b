use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_base: String,
    pub api_path: String,
    pub token_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "https://vue3-course-api.hexschool.io/v2".into(),
            api_path: "product-console".into(),
            token_path: None,
            request_timeout_secs: 15,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Where the session token is kept between runs.
    pub fn resolved_token_path(&self) -> Option<PathBuf> {
        self.token_path.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("product-console").join("token"))
        })
    }
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(CONFIG_FILE).ok();
    layered_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the optional TOML file, then the environment.
pub fn layered_settings(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
            let text = |key: &str| {
                file_cfg
                    .get(key)
                    .and_then(|value| value.as_str().map(str::to_string))
            };
            if let Some(v) = text("api_base") {
                settings.api_base = v;
            }
            if let Some(v) = text("api_path") {
                settings.api_path = v;
            }
            if let Some(v) = text("token_path") {
                settings.token_path = Some(PathBuf::from(v));
            }
            if let Some(v) = text("log_filter") {
                settings.log_filter = v;
            }
            if let Some(v) = file_cfg
                .get("request_timeout_secs")
                .and_then(toml::Value::as_integer)
                .and_then(|secs| u64::try_from(secs).ok())
            {
                settings.request_timeout_secs = v;
            }
        }
    }

    if let Some(v) = env("CONSOLE_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = env("CONSOLE_API_PATH") {
        settings.api_path = v;
    }
    if let Some(v) = env("APP__API_PATH") {
        settings.api_path = v;
    }

    if let Some(v) = env("APP__TOKEN_PATH") {
        settings.token_path = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
