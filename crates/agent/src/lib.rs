mod provider;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use ecochat_core::{
    normalize_text, select_response, ChatReply, IntentsFile, ModelMode, ERROR_TAG, FALLBACK_TAG,
    PROVIDER_TAG,
};
use ecochat_ml::{load_artifacts, IntentClassifier, ModelError};
use ecochat_observability::AppMetrics;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub use provider::{ChatProvider, ProviderConfig, DEFAULT_BASE_URL};

pub const NOT_LOADED_MESSAGE: &str =
    "Sorry, my brain isn't loaded right now. Please run `ecochat train` and restart the server.";

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("OPENAI_API_KEY not set")]
    MissingApiKey,
    #[error("provider mode is selected but no provider client is configured")]
    ProviderNotConfigured,
    #[error("provider returned status {status}: {body}")]
    ProviderStatus { status: u16, body: String },
    #[error("provider response had no message content")]
    EmptyCompletion,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Classifier(#[from] ModelError),
}

#[derive(Clone)]
pub enum ModelState {
    Loaded {
        classifier: Arc<dyn IntentClassifier>,
        intents: Arc<IntentsFile>,
    },
    NotLoaded {
        reason: String,
    },
}

impl ModelState {
    pub fn load(model_path: impl AsRef<Path>, intents_path: impl AsRef<Path>) -> Self {
        match load_artifacts(model_path.as_ref(), intents_path.as_ref()) {
            Ok(artifacts) => {
                info!(
                    model = artifacts.model.model_name(),
                    model_path = %model_path.as_ref().display(),
                    classes = artifacts.model.classes().len(),
                    intents = artifacts.intents.intents.len(),
                    "model loaded successfully"
                );
                Self::loaded(Arc::new(artifacts.model), artifacts.intents)
            }
            Err(err) => {
                warn!(error = %err, "model not loaded, chat will answer with a notice");
                Self::NotLoaded {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn loaded(classifier: Arc<dyn IntentClassifier>, intents: IntentsFile) -> Self {
        Self::Loaded {
            classifier,
            intents: Arc::new(intents),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

pub struct Responder {
    mode: ModelMode,
    model: ModelState,
    provider: Option<ChatProvider>,
    rng: Mutex<StdRng>,
    metrics: Arc<AppMetrics>,
}

impl Responder {
    pub fn new(mode: ModelMode, model: ModelState, metrics: Arc<AppMetrics>) -> Self {
        Self {
            mode,
            model,
            provider: None,
            rng: Mutex::new(StdRng::from_os_rng()),
            metrics,
        }
    }

    pub fn with_provider(mut self, provider: ChatProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn mode(&self) -> &ModelMode {
        &self.mode
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    #[instrument(skip(self, message), fields(mode = %self.mode.label()))]
    pub async fn respond(&self, message: &str) -> ChatReply {
        let started = Instant::now();
        self.metrics.inc_request();

        let reply = match &self.mode {
            ModelMode::Provider(model) => match self.respond_with_provider(model, message).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(error = %err, "provider request failed");
                    self.metrics.inc_error();
                    ChatReply::new(
                        format!("Provider request failed: {err}"),
                        Some(ERROR_TAG),
                        0.0,
                    )
                }
            },
            ModelMode::Local => match self.respond_locally(message) {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(error = %err, "classification failed");
                    self.metrics.inc_error();
                    ChatReply::new(
                        format!("Sorry, something went wrong on my side: {err}"),
                        Some(ERROR_TAG),
                        0.0,
                    )
                }
            },
        };

        if reply.tag.as_deref() == Some(FALLBACK_TAG) {
            self.metrics.inc_fallback();
        }
        self.metrics.observe_latency(started.elapsed());
        info!(tag = ?reply.tag, confidence = reply.confidence, "reply selected");
        reply
    }

    async fn respond_with_provider(
        &self,
        model: &str,
        message: &str,
    ) -> Result<ChatReply, ResponderError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(ResponderError::ProviderNotConfigured)?;
        self.metrics.inc_provider_call();
        let text = provider.complete(model, message).await?;
        Ok(ChatReply::new(text, Some(PROVIDER_TAG), 1.0))
    }

    fn respond_locally(&self, message: &str) -> Result<ChatReply, ResponderError> {
        let (classifier, intents) = match &self.model {
            ModelState::Loaded {
                classifier,
                intents,
            } => (classifier, intents),
            ModelState::NotLoaded { .. } => {
                self.metrics.inc_not_loaded();
                return Ok(ChatReply::new(NOT_LOADED_MESSAGE, None, 0.0));
            }
        };

        let normalized = normalize_text(message);
        let prediction = classifier.predict(&normalized)?;
        self.metrics.inc_classifier_inference();

        let mut rng = self.rng.lock();
        Ok(select_response(&prediction, intents, &mut *rng))
    }
}
