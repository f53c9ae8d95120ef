pub mod humanize;
pub mod models;
pub mod normalize;
pub mod porter;
pub mod selector;

pub use models::*;
pub use normalize::normalize_text;
pub use porter::PorterStemmer;
pub use selector::{fallback_reply, select_response, CONFIDENCE_THRESHOLD};
