pub mod gemini;
pub mod lexicon;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub specialty: String,
    pub display_name: String,
}

/// Maps free-text symptoms to a medical specialty. Providers may time out
/// or return garbage; callers must treat them as unreliable and fall back
/// to [`lexicon::classify_text`], which never fails.
#[async_trait]
pub trait SpecialtyClassifier: Send + Sync {
    async fn classify(&self, symptom_text: &str) -> anyhow::Result<Classification>;
}
