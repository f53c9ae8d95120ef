use rand::seq::IndexedRandom;
use rand::Rng;

use crate::humanize::{humanize, pick_fallback};
use crate::models::{ChatReply, IntentsFile, Prediction, FALLBACK_TAG};

pub const CONFIDENCE_THRESHOLD: f64 = 0.30;

pub fn fallback_reply<R: Rng + ?Sized>(confidence: f32, rng: &mut R) -> ChatReply {
    ChatReply::new(pick_fallback(rng), Some(FALLBACK_TAG), confidence)
}

pub fn select_response<R: Rng + ?Sized>(
    prediction: &Prediction,
    intents: &IntentsFile,
    rng: &mut R,
) -> ChatReply {
    if let Some(confidence) = prediction.confidence {
        if confidence < CONFIDENCE_THRESHOLD {
            return fallback_reply(confidence as f32, rng);
        }
    }

    let base = intents
        .find(&prediction.tag)
        .and_then(|intent| intent.responses.choose(rng))
        .filter(|response| !response.trim().is_empty());

    let Some(base) = base else {
        return fallback_reply(prediction.confidence.unwrap_or(0.0) as f32, rng);
    };

    ChatReply {
        text: humanize(base, &prediction.tag, rng),
        tag: Some(prediction.tag.clone()),
        confidence: prediction.confidence.unwrap_or(1.0) as f32,
    }
}
