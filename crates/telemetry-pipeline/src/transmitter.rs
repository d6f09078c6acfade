// Copyright 2025-Present Operator Telemetry contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP delivery of validated collections to the remote collection service.
//!
//! [`Transmitter::transmit`] never fails outward: every failure path is
//! classified, logged, and folded into the returned [`TransmitOutcome`].
//! Transmission trouble must degrade telemetry, never the operator.

use crate::payload::CollectionPayload;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Per-attempt request timeout applied when the config does not override it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry budget and backoff schedule for one `transmit` call.
///
/// When attempts outnumber schedule entries the last entry repeats.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff.len() {
            0 => Duration::ZERO,
            len => {
                let idx = (attempt.saturating_sub(1) as usize).min(len - 1);
                self.backoff[idx]
            }
        }
    }
}

pub struct TransmitterConfig {
    /// Base URL of the collection service; `/v1/collections` is appended.
    pub server_url: String,
    pub api_key: String,
    pub https_proxy: Option<String>,
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum TransmitterError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Final disposition of one `transmit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// The service acknowledged the payload with a 2xx.
    Delivered { status: u16 },
    /// Terminal 4xx rejection; abandoned after a single attempt.
    Rejected { status: u16, message: String },
    /// The retry budget was spent on retryable failures; the payload is
    /// dropped, not re-queued.
    Exhausted { attempts: u32, reason: String },
}

impl TransmitOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, TransmitOutcome::Delivered { .. })
    }
}

enum AttemptFailure {
    /// Client error; retrying cannot help.
    Terminal { status: u16, message: String },
    /// Server error, timeout, network failure, or anything unclassified.
    /// Ambiguous failures retry rather than silently drop.
    Retryable { reason: String },
}

pub struct Transmitter {
    client: reqwest::Client,
    collections_url: String,
    api_key: String,
    retry_policy: RetryPolicy,
}

impl Transmitter {
    pub fn new(config: TransmitterConfig) -> Result<Self, TransmitterError> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
        if let Some(proxy) = &config.https_proxy {
            builder = builder.proxy(reqwest::Proxy::https(proxy)?);
        }
        let client = builder.build()?;

        let collections_url = format!(
            "{}/v1/collections",
            config.server_url.trim_end_matches('/')
        );

        Ok(Transmitter {
            client,
            collections_url,
            api_key: config.api_key,
            retry_policy: config.retry_policy,
        })
    }

    /// Deliver one payload, retrying retryable failures within the policy's
    /// budget. Never returns an error and never panics; the outcome value is
    /// the whole story.
    pub async fn transmit(&self, payload: &CollectionPayload) -> TransmitOutcome {
        let collection_id = payload.collection_id();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.attempt(payload).await {
                Ok(status) => {
                    debug!(
                        collection_id,
                        status, attempts, "collection delivered to remote service"
                    );
                    return TransmitOutcome::Delivered { status };
                }
                Err(AttemptFailure::Terminal { status, message }) => {
                    error!(
                        collection_id,
                        status,
                        message = %message,
                        "collection rejected by remote service, not retrying"
                    );
                    return TransmitOutcome::Rejected { status, message };
                }
                Err(AttemptFailure::Retryable { reason }) => {
                    if attempts >= self.retry_policy.max_attempts {
                        error!(
                            collection_id,
                            attempts,
                            reason = %reason,
                            "dropping collection after exhausting transmission attempts"
                        );
                        return TransmitOutcome::Exhausted { attempts, reason };
                    }
                    let delay = self.retry_policy.delay_for(attempts);
                    warn!(
                        collection_id,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "transmission attempt failed, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(&self, payload: &CollectionPayload) -> Result<u16, AttemptFailure> {
        let response = self
            .client
            .post(&self.collections_url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return Ok(status.as_u16());
                }
                let message = error_message(resp).await;
                if status.is_client_error() {
                    Err(AttemptFailure::Terminal {
                        status: status.as_u16(),
                        message,
                    })
                } else {
                    Err(AttemptFailure::Retryable {
                        reason: format!("{status}: {message}"),
                    })
                }
            }
            Err(e) if e.is_timeout() => Err(AttemptFailure::Retryable {
                reason: "request timed out".to_string(),
            }),
            Err(e) => Err(AttemptFailure::Retryable {
                reason: format!("network error: {e}"),
            }),
        }
    }
}

/// Pull a human-readable error out of a failure response. The service sends
/// `{"message": "..."}` bodies; anything else falls back to the raw text.
async fn error_message(resp: reqwest::Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    if text.is_empty() {
        "(no response body)".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_three_attempts_doubling_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_schedule_last_entry_repeats() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: vec![Duration::from_millis(10), Duration::from_millis(20)],
        };
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for(4), Duration::from_millis(20));
    }

    #[test]
    fn empty_backoff_schedule_means_no_delay() {
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff: vec![],
        };
        assert_eq!(policy.delay_for(1), Duration::ZERO);
    }

    #[test]
    fn collections_url_is_joined_without_double_slash() {
        let transmitter = Transmitter::new(TransmitterConfig {
            server_url: "https://collect.example.com/".to_string(),
            api_key: "key".to_string(),
            https_proxy: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        })
        .unwrap();
        assert_eq!(
            transmitter.collections_url,
            "https://collect.example.com/v1/collections"
        );
    }
}
