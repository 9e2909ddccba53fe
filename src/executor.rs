use crate::client::{GenerationReply, GenerationRequest, GenerationService};
use crate::error::{ServiceFailure, SweepError};
use crate::grid::Combination;
use crate::models::GenerationResult;
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Retry, backoff and timeout settings for generation calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each later one
    pub base_delay: Duration,
    /// Exclusive upper bound of the random jitter added to each delay
    pub max_jitter: Duration,
    /// Wall-clock budget of a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_jitter: Duration::from_millis(200),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `retry` (0-indexed): `base * 2^retry` plus jitter in `[0, max_jitter)`
    pub fn backoff_delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(retry));
        let jitter_nanos = self.max_jitter.as_nanos() as u64;
        let jitter = if jitter_nanos == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(rng.gen_range(0..jitter_nanos))
        };
        exponential.saturating_add(jitter)
    }
}

/// Runs one combination against a generation service under a retry policy
pub struct RunExecutor<S> {
    pub(crate) service: S,
    policy: RetryPolicy,
}

impl<S: GenerationService> RunExecutor<S> {
    pub fn new(service: S, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Generate text for one combination, retrying transient failures
    pub async fn execute(
        &self,
        prompt: &str,
        model: &str,
        combination: Combination,
    ) -> Result<GenerationResult, SweepError> {
        let request = GenerationRequest {
            prompt,
            model,
            combination,
        };

        let mut retry = 0;
        loop {
            let started = Instant::now();
            let attempt = self.attempt(&request).await;
            let latency = started.elapsed();

            let failure = match attempt {
                Ok(reply) => {
                    debug!(attempt = retry + 1, latency_ms = latency.as_millis() as u64, "generation succeeded");
                    return Ok(GenerationResult {
                        text: reply.text,
                        tokens_used: reply.tokens_used,
                        latency_ms: latency.as_millis() as u64,
                    });
                }
                Err(failure) if failure.is_retryable() => failure,
                Err(failure) => return Err(SweepError::TerminalService(failure)),
            };

            if retry >= self.policy.max_retries {
                return Err(SweepError::TransientService {
                    attempts: retry + 1,
                    source: failure,
                });
            }

            let delay = self.policy.backoff_delay(retry, &mut rand::thread_rng());
            warn!(
                attempt = retry + 1,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "generation attempt failed, retrying"
            );
            sleep(delay).await;
            retry += 1;
        }
    }

    /// One attempt, cancelled when it exceeds the attempt timeout
    async fn attempt(&self, request: &GenerationRequest<'_>) -> Result<GenerationReply, ServiceFailure> {
        match timeout(self.policy.attempt_timeout, self.service.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(ServiceFailure::Timeout(self.policy.attempt_timeout)),
        }
    }
}
