//! Deterministic provider that replays queued replies.
//!
//! Used by the test suites and for running the server offline. Every call
//! pops the next reply; once the script runs out the fallback (if any) is
//! returned forever.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{GenerativeProvider, ProviderError};

/// One scripted provider reply.
#[derive(Debug)]
pub enum ScriptedReply {
    /// Return this text.
    Text(String),
    /// Fail with this error.
    Fail(ProviderError),
    /// Sleep, then return the text. Lets tests trip the synthesizer timeout.
    Delayed(Duration, String),
}

impl ScriptedReply {
    pub fn text(s: impl Into<String>) -> Self {
        ScriptedReply::Text(s.into())
    }
}

#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Provider that answers every call with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Default::default()
        }
    }

    /// Reply with `text` once the script is exhausted.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerativeProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        let next = self.replies.lock().pop_front();
        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(err)) => Err(err),
            Some(ScriptedReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            None => self.fallback.clone().ok_or_else(|| {
                ProviderError::InvalidResponse("scripted provider has no replies left".to_string())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_falls_back() {
        let provider = ScriptedProvider::new([
            ScriptedReply::text("one"),
            ScriptedReply::Fail(ProviderError::api(503, "busy")),
        ])
        .with_fallback("rest");

        assert_eq!(provider.generate("p").await.unwrap(), "one");
        assert!(provider.generate("p").await.is_err());
        assert_eq!(provider.generate("p").await.unwrap(), "rest");
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.prompts(), vec!["p", "p", "p"]);
    }

    #[tokio::test]
    async fn exhausted_script_without_fallback_fails() {
        let provider = ScriptedProvider::new([]);
        assert!(matches!(
            provider.generate("p").await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
