//! Itinerary synthesis with bounded retries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::error::{AttemptError, SynthesisError};
use super::prompt::{self, Prompt};
use super::repair;
use crate::models::{Itinerary, TravelIntent};
use crate::provider::{GenerativeProvider, ProviderError};

/// Cap on any single pause between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// How hard the synthesizer tries before giving up.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Deadline for one provider call.
    pub attempt_timeout: Duration,
    /// Base pause before retrying a provider failure; doubles per attempt.
    /// Schema failures are retried immediately.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(30),
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    fn delay_after(&self, attempt: u32, err: &AttemptError) -> Duration {
        let AttemptError::Provider(provider_err) = err else {
            return Duration::ZERO;
        };
        let exponential = self
            .backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let delay = match provider_err {
            ProviderError::RateLimited {
                retry_after: Some(after),
            } => exponential.max(*after),
            _ => exponential,
        };
        delay.min(MAX_BACKOFF)
    }
}

/// Drives prompt -> provider -> validation until an itinerary passes or the
/// retry budget runs out.
#[derive(Clone)]
pub struct Synthesizer {
    provider: Arc<dyn GenerativeProvider>,
    policy: RetryPolicy,
}

impl Synthesizer {
    pub fn new(provider: Arc<dyn GenerativeProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Produce a validated itinerary for `intent`.
    ///
    /// The prompt is built once and resent unchanged. Attempts stop early on
    /// a provider failure that cannot succeed on retry.
    pub async fn synthesize(&self, intent: &TravelIntent) -> Result<Itinerary, SynthesisError> {
        let prompt = prompt::build(intent);
        let max_attempts = self.policy.max_attempts();
        let mut failures: Vec<AttemptError> = Vec::new();

        debug!(
            provider = self.provider.name(),
            destination = %intent.destination,
            days = intent.trip_length_days,
            max_attempts,
            "synthesize: called"
        );

        for attempt in 1..=max_attempts {
            match self.attempt(&prompt, intent).await {
                Ok(itinerary) => {
                    info!(
                        attempt,
                        days = itinerary.total_days,
                        destination = %itinerary.destination,
                        "synthesize: itinerary validated"
                    );
                    return Ok(itinerary);
                }
                Err(err) => {
                    match &err {
                        AttemptError::Schema(e) => warn!(
                            attempt,
                            reason = e.reason(),
                            detail = %e,
                            "synthesize: provider output rejected"
                        ),
                        AttemptError::Provider(e) => warn!(
                            attempt,
                            kind = e.kind(),
                            retryable = e.is_retryable(),
                            "synthesize: provider call failed"
                        ),
                    }

                    let retryable = err.is_retryable();
                    let delay = self.policy.delay_after(attempt, &err);
                    failures.push(err);

                    if !retryable {
                        break;
                    }
                    if attempt < max_attempts && !delay.is_zero() {
                        debug!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "synthesize: backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let err = SynthesisError {
            attempts: failures.len() as u32,
            failures,
        };
        error!(
            attempts = err.attempts,
            causes = ?err.failure_codes(),
            "synthesize: giving up"
        );
        Err(err)
    }

    async fn attempt(
        &self,
        prompt: &Prompt,
        intent: &TravelIntent,
    ) -> Result<Itinerary, AttemptError> {
        let timeout = self.policy.attempt_timeout;
        let raw = tokio::time::timeout(timeout, self.provider.generate(prompt.as_str()))
            .await
            .map_err(|_| ProviderError::Timeout(timeout))??;
        Ok(repair::validate(&raw, intent)?)
    }
}
