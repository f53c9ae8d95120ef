mod artifacts;
mod naive_bayes;
pub mod trainer;

use std::path::PathBuf;

use ecochat_core::Prediction;
use thiserror::Error;

pub use artifacts::{load_artifacts, load_intents_source, write_json, ModelArtifacts};
pub use naive_bayes::{NaiveBayesModel, DEFAULT_ALPHA};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("training data is empty")]
    EmptyTrainingSet,
    #[error("training example {index} has an empty tag")]
    EmptyTag { index: usize },
    #[error("model has no classes")]
    NoClasses,
    #[error("model artifact is inconsistent: {0}")]
    Corrupt(String),
    #[error("model not found at {}, run `ecochat train` first", path.display())]
    Missing { path: PathBuf },
    #[error("failed reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait IntentClassifier: Send + Sync {
    fn model_name(&self) -> &'static str;

    fn predict(&self, normalized: &str) -> Result<Prediction, ModelError>;

    fn distribution(&self, _normalized: &str) -> Option<Vec<(String, f64)>> {
        None
    }
}
