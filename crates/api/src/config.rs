use std::env;
use std::path::PathBuf;

use ecochat_agent::{ProviderConfig, DEFAULT_BASE_URL};
use ecochat_core::ModelMode;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub mode: ModelMode,
    pub model_path: PathBuf,
    pub intents_path: PathBuf,
    pub provider: ProviderConfig,
    pub seed: Option<u64>,
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let model_name = lookup("MODEL_NAME");
        if let Some(name) = model_name.as_deref() {
            if !ModelMode::is_recognized(name) {
                tracing::warn!(model_name = %name, "unrecognized MODEL_NAME, using the local classifier");
            }
        }

        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            bind: non_empty("ECOCHAT_BIND").unwrap_or_else(|| "127.0.0.1:5000".to_string()),
            mode: ModelMode::from_model_name(model_name.as_deref()),
            model_path: non_empty("ECOCHAT_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("model.json")),
            intents_path: non_empty("ECOCHAT_INTENTS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("intents_data.json")),
            provider: ProviderConfig {
                api_key: non_empty("OPENAI_API_KEY"),
                base_url: non_empty("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            },
            seed: non_empty("ECOCHAT_SEED").and_then(|value| value.parse::<u64>().ok()),
            allowed_origins: non_empty("ECOCHAT_ALLOWED_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
