use std::collections::{BTreeMap, BTreeSet};

use ecochat_core::Prediction;
use serde::{Deserialize, Serialize};

use crate::{IntentClassifier, ModelError};

pub const DEFAULT_ALPHA: f64 = 1.0;
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    format_version: u32,
    alpha: f64,
    vocabulary: BTreeMap<String, usize>,
    classes: Vec<String>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl NaiveBayesModel {
    pub fn fit(examples: &[(String, String)], alpha: f64) -> Result<Self, ModelError> {
        if examples.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if let Some(index) = examples.iter().position(|(_, tag)| tag.trim().is_empty()) {
            return Err(ModelError::EmptyTag { index });
        }

        let vocabulary = examples
            .iter()
            .flat_map(|(text, _)| terms(text))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect::<BTreeMap<_, _>>();
        let classes = examples
            .iter()
            .map(|(_, tag)| tag.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let mut class_counts = vec![0_usize; classes.len()];
        let mut feature_counts = vec![vec![0.0_f64; vocabulary.len()]; classes.len()];

        for (text, tag) in examples {
            let class_idx = classes
                .binary_search(tag)
                .map_err(|_| ModelError::Corrupt(format!("unindexed class {tag}")))?;
            class_counts[class_idx] += 1;
            for term in terms(text) {
                if let Some(&feature_idx) = vocabulary.get(term) {
                    feature_counts[class_idx][feature_idx] += 1.0;
                }
            }
        }

        let total = examples.len() as f64;
        let class_log_prior = class_counts
            .iter()
            .map(|&count| (count as f64 / total).ln())
            .collect();

        let smoothing = alpha * vocabulary.len() as f64;
        let feature_log_prob = feature_counts
            .iter()
            .map(|counts| {
                let denominator = (counts.iter().sum::<f64>() + smoothing).ln();
                counts
                    .iter()
                    .map(|count| (count + alpha).ln() - denominator)
                    .collect()
            })
            .collect();

        Ok(Self {
            format_version: FORMAT_VERSION,
            alpha,
            vocabulary,
            classes,
            class_log_prior,
            feature_log_prob,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ModelError::Corrupt(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }
        if self.classes.is_empty() {
            return Err(ModelError::NoClasses);
        }
        if self.class_log_prior.len() != self.classes.len()
            || self.feature_log_prob.len() != self.classes.len()
        {
            return Err(ModelError::Corrupt(
                "class count does not match parameter rows".to_string(),
            ));
        }
        if self
            .feature_log_prob
            .iter()
            .any(|row| row.len() != self.vocabulary.len())
        {
            return Err(ModelError::Corrupt(
                "feature row length does not match vocabulary".to_string(),
            ));
        }
        if self.vocabulary.values().any(|&idx| idx >= self.vocabulary.len()) {
            return Err(ModelError::Corrupt("vocabulary index out of range".to_string()));
        }
        Ok(())
    }

    fn joint_log_likelihood(&self, text: &str) -> Vec<f64> {
        let mut jll = self.class_log_prior.clone();
        for term in terms(text) {
            let Some(&feature_idx) = self.vocabulary.get(term) else {
                continue;
            };
            for (class_idx, score) in jll.iter_mut().enumerate() {
                *score += self.feature_log_prob[class_idx][feature_idx];
            }
        }
        jll
    }

    pub fn predict_proba(&self, text: &str) -> Vec<f64> {
        let jll = self.joint_log_likelihood(text);
        let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_norm = max + jll.iter().map(|score| (score - max).exp()).sum::<f64>().ln();
        jll.iter().map(|score| (score - log_norm).exp()).collect()
    }

    pub fn predict_tag(&self, text: &str) -> Result<(&str, f64), ModelError> {
        let proba = self.predict_proba(text);
        let mut best: Option<(usize, f64)> = None;
        for (idx, &p) in proba.iter().enumerate() {
            if best.map_or(true, |(_, best_p)| p > best_p) {
                best = Some((idx, p));
            }
        }
        let (idx, p) = best.ok_or(ModelError::NoClasses)?;
        Ok((self.classes[idx].as_str(), p))
    }
}

impl IntentClassifier for NaiveBayesModel {
    fn model_name(&self) -> &'static str {
        "multinomial-naive-bayes"
    }

    fn predict(&self, normalized: &str) -> Result<Prediction, ModelError> {
        let (tag, probability) = self.predict_tag(normalized)?;
        Ok(Prediction {
            tag: tag.to_string(),
            confidence: Some(probability),
        })
    }

    fn distribution(&self, normalized: &str) -> Option<Vec<(String, f64)>> {
        let proba = self.predict_proba(normalized);
        Some(self.classes.iter().cloned().zip(proba).collect())
    }
}

fn terms(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(|term| term.chars().count() >= 2)
}
