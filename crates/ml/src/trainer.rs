use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ecochat_core::{normalize_text, IntentsFile};
use tracing::info;

use crate::{load_intents_source, write_json, NaiveBayesModel, DEFAULT_ALPHA};

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub samples: usize,
    pub classes: usize,
    pub vocabulary: usize,
    pub model_path: PathBuf,
    pub intents_path: PathBuf,
}

pub fn prepare_training_data(intents: &IntentsFile) -> Vec<(String, String)> {
    intents
        .intents
        .iter()
        .flat_map(|intent| {
            intent
                .patterns
                .iter()
                .map(move |pattern| (normalize_text(pattern), intent.tag.clone()))
        })
        .collect()
}

pub fn train(intents: &IntentsFile) -> Result<NaiveBayesModel> {
    let examples = prepare_training_data(intents);
    info!(samples = examples.len(), "training intent classifier");
    NaiveBayesModel::fit(&examples, DEFAULT_ALPHA).context("failed fitting naive bayes model")
}

pub fn train_and_persist(
    source: impl AsRef<Path>,
    model_out: impl AsRef<Path>,
    intents_out: impl AsRef<Path>,
) -> Result<TrainingSummary> {
    let source = source.as_ref();
    let intents = load_intents_source(source)
        .with_context(|| format!("failed loading intents from {}", source.display()))?;

    let samples = prepare_training_data(&intents).len();
    let model = train(&intents)?;

    write_json(model_out.as_ref(), &model).context("failed saving model artifact")?;
    write_json(intents_out.as_ref(), &intents).context("failed saving intents artifact")?;

    let summary = TrainingSummary {
        samples,
        classes: model.classes().len(),
        vocabulary: model.vocabulary_len(),
        model_path: model_out.as_ref().to_path_buf(),
        intents_path: intents_out.as_ref().to_path_buf(),
    };
    info!(
        samples = summary.samples,
        classes = summary.classes,
        vocabulary = summary.vocabulary,
        model_path = %summary.model_path.display(),
        "intent classifier trained"
    );
    Ok(summary)
}
