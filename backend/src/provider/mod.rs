//! Generative-text providers.
//!
//! The synthesizer only sees [`GenerativeProvider`]: send a prompt, get raw
//! text back. Retrying, timeouts and output validation live above this layer,
//! so implementations make exactly one request per call.

use async_trait::async_trait;

mod error;
pub mod gemini;
pub mod scripted;

pub use error::ProviderError;
pub use gemini::{GeminiConfig, GeminiProvider};
pub use scripted::{ScriptedProvider, ScriptedReply};

/// Capability to turn a prompt into raw model output.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the model's raw text.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
