use serde::{Deserialize, Serialize};

pub const FALLBACK_TAG: &str = "fallback";
pub const PROVIDER_TAG: &str = "provider";
pub const ERROR_TAG: &str = "error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentsFile {
    pub intents: Vec<IntentDefinition>,
}

impl IntentsFile {
    pub fn find(&self, tag: &str) -> Option<&IntentDefinition> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub tag: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub tag: Option<String>,
    pub confidence: f32,
}

impl ChatReply {
    pub fn new(text: impl Into<String>, tag: Option<&str>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            tag: tag.map(ToString::to_string),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelMode {
    Local,
    Provider(String),
}

impl ModelMode {
    pub fn from_model_name(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(name) if name.to_lowercase().starts_with("gpt") => Self::Provider(name.to_string()),
            _ => Self::Local,
        }
    }

    pub fn is_recognized(value: &str) -> bool {
        let lower = value.trim().to_lowercase();
        lower.is_empty() || lower == "local" || lower.starts_with("gpt")
    }

    pub fn label(&self) -> String {
        match self {
            Self::Local => "local".to_string(),
            Self::Provider(model) => format!("provider:{model}"),
        }
    }
}
