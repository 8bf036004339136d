//! Verified boundary location with bounded retries
//!
//! The locator does no recognition of its own. An external [`EventVerifier`]
//! (typically a speech recognizer) confirms that a trimmed clip still contains
//! the expected event; when it does not, the clip is re-located with a wider
//! pad. An unverified clip is never returned.

use serde::{Deserialize, Serialize};

use super::locator::{locate, TrimmedClip};
use super::{BoundaryConfig, TimeRange};
use crate::error::{BoundaryError, EngineError};
use crate::io::sample_buffer::SampleBuffer;

/// Oracle confirming that a clip contains an expected event
pub trait EventVerifier: Sync {
    /// True if `clip` contains `expected_event`
    fn verify(&self, clip: &SampleBuffer, expected_event: &str) -> bool;
}

impl<F> EventVerifier for F
where
    F: Fn(&SampleBuffer, &str) -> bool + Sync,
{
    fn verify(&self, clip: &SampleBuffer, expected_event: &str) -> bool {
        self(clip, expected_event)
    }
}

/// Verifier that accepts every clip
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl EventVerifier for AcceptAll {
    fn verify(&self, _clip: &SampleBuffer, _expected_event: &str) -> bool {
        true
    }
}

/// Retry policy for verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (default: 2)
    pub max_retries: u32,

    /// Extra pad per retry in ms (default: 25.0)
    pub widen_ms: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            widen_ms: 25.0,
        }
    }
}

/// Locate a clip and confirm it with a verifier, widening on rejection
///
/// Attempt `n` (0-based) pads the range by `pad_ms + widen_ms * n`.
/// `TooShort` results are retried like rejections since a wider pad can fix
/// them; `OutOfRange` is returned immediately.
///
/// # Arguments
///
/// * `buffer` - Source buffer
/// * `range` - Approximate time range of the event
/// * `expected_event` - Label handed to the verifier
/// * `config` - Base locator configuration
/// * `policy` - Retry policy
/// * `verifier` - Event oracle
///
/// # Errors
///
/// - `EngineError::Boundary` for an out-of-range request
/// - `EngineError::VerificationFailed` once all attempts are used up
pub fn locate_verified(
    buffer: &SampleBuffer,
    range: TimeRange,
    expected_event: &str,
    config: &BoundaryConfig,
    policy: &RetryPolicy,
    verifier: &dyn EventVerifier,
) -> Result<TrimmedClip, EngineError> {
    let attempts = policy.max_retries.saturating_add(1);

    for attempt in 0..attempts {
        let attempt_config = BoundaryConfig {
            pad_ms: config.pad_ms + policy.widen_ms.max(0.0) * attempt as f32,
            ..config.clone()
        };

        match locate(buffer, range, &attempt_config) {
            Ok(clip) => {
                if verifier.verify(&clip.buffer, expected_event) {
                    if attempt > 0 {
                        log::debug!(
                            "'{}' verified on attempt {} (pad {:.1} ms)",
                            expected_event,
                            attempt + 1,
                            attempt_config.pad_ms
                        );
                    }
                    return Ok(clip);
                }
                log::debug!(
                    "'{}' rejected by verifier on attempt {}",
                    expected_event,
                    attempt + 1
                );
            }
            Err(e @ BoundaryError::TooShort { .. }) => {
                log::debug!("'{}' attempt {}: {}", expected_event, attempt + 1, e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    log::warn!(
        "Verification failed for '{}' after {} attempt(s)",
        expected_event,
        attempts
    );
    Err(EngineError::VerificationFailed {
        event: expected_event.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn source() -> SampleBuffer {
        SampleBuffer::mono(vec![0.25; 32_000], 16_000).unwrap()
    }

    #[test]
    fn test_accepts_on_first_attempt() {
        let clip = locate_verified(
            &source(),
            TimeRange::new(0.5, 0.8),
            "word",
            &BoundaryConfig::default(),
            &RetryPolicy::default(),
            &AcceptAll,
        )
        .unwrap();
        assert!(clip.duration_ms() > 300.0);
    }

    #[test]
    fn test_retries_widen_until_accepted() {
        let calls = AtomicU32::new(0);
        // Accept only clips longer than 360 ms: needs the second widening
        let verifier = |clip: &SampleBuffer, _: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            clip.duration_ms() > 360
        };
        let config = BoundaryConfig {
            pad_ms: 0.0,
            ..BoundaryConfig::default()
        };
        let policy = RetryPolicy {
            max_retries: 3,
            widen_ms: 20.0,
        };
        let clip = locate_verified(
            &source(),
            TimeRange::new(0.5, 0.8),
            "word",
            &config,
            &policy,
            &verifier,
        )
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(clip.duration_ms() > 360.0);
    }

    #[test]
    fn test_exhausted_retries_fail() {
        let reject = |_: &SampleBuffer, _: &str| false;
        let result = locate_verified(
            &source(),
            TimeRange::new(0.5, 0.8),
            "never",
            &BoundaryConfig::default(),
            &RetryPolicy {
                max_retries: 2,
                widen_ms: 10.0,
            },
            &reject,
        );
        match result {
            Err(EngineError::VerificationFailed { event, attempts }) => {
                assert_eq!(event, "never");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected VerificationFailed, got {:?}", other.map(|c| c.end_frame)),
        }
    }

    #[test]
    fn test_out_of_range_is_not_retried() {
        let result = locate_verified(
            &source(),
            TimeRange::new(5.0, 6.0),
            "word",
            &BoundaryConfig::default(),
            &RetryPolicy::default(),
            &AcceptAll,
        );
        assert!(matches!(
            result,
            Err(EngineError::Boundary(BoundaryError::OutOfRange { .. }))
        ));
    }
}
