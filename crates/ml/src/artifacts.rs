use std::fs;
use std::path::Path;

use ecochat_core::IntentsFile;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ModelError, NaiveBayesModel};

#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model: NaiveBayesModel,
    pub intents: IntentsFile,
}

pub fn load_artifacts(
    model_path: impl AsRef<Path>,
    intents_path: impl AsRef<Path>,
) -> Result<ModelArtifacts, ModelError> {
    let model_path = model_path.as_ref();
    if !model_path.exists() {
        return Err(ModelError::Missing {
            path: model_path.to_path_buf(),
        });
    }

    let model: NaiveBayesModel = read_json(model_path)?;
    model.validate()?;
    let intents: IntentsFile = read_json(intents_path.as_ref())?;

    Ok(ModelArtifacts { model, intents })
}

pub fn load_intents_source(path: impl AsRef<Path>) -> Result<IntentsFile, ModelError> {
    read_json(path.as_ref())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), ModelError> {
    let path = path.as_ref();
    let encoded = serde_json::to_vec_pretty(value).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, encoded).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let raw = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
