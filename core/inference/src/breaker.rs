//! Per-model circuit breaker.
//!
//! State lives behind a `Mutex<HashMap<String, ModelState>>` keyed by model
//! id, mirroring the workspace's shared-provider-map convention. Timing uses
//! a monotonic `Instant` so tests never depend on wall-clock time.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;
use tracing::warn;

/// Breaker status for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    /// Requests are admitted.
    Closed,
    /// Requests are rejected until the recovery window elapses.
    Open,
    /// One probe request is admitted to test recovery.
    HalfOpen,
}

/// Snapshot of one model's breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitState {
    /// Current status.
    pub status: CircuitStatus,
    /// Consecutive failures since the last success.
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone)]
struct ModelState {
    status: CircuitStatus,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Whether a half-open probe is currently outstanding.
    ///
    /// The source left concurrent half-open probes ambiguous; this
    /// implementation serializes them — only one probe is admitted at a
    /// time per model, across concurrent requests.
    probe_in_flight: bool,
}

impl Default for ModelState {
    fn default() -> Self {
        Self {
            status: CircuitStatus::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// Per-model health state machine: closed admits requests, open rejects
/// them for a recovery window, half-open admits one probe.
#[derive(Debug)]
pub struct CircuitBreaker {
    states: Mutex<HashMap<String, ModelState>>,
    failure_threshold: u32,
    recovery: Duration,
}

impl CircuitBreaker {
    /// Construct a breaker with the given failure threshold and recovery
    /// window.
    pub fn new(failure_threshold: u32, recovery: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            failure_threshold,
            recovery,
        }
    }

    /// Whether a request to `model` should be admitted right now.
    ///
    /// Lazily transitions Open → Half-Open once the recovery window has
    /// elapsed, admitting exactly the call that observes the transition.
    pub fn is_allowed(&self, model: &str) -> bool {
        #[expect(clippy::unwrap_used, reason = "poisoned lock is a bug, not a runtime condition")]
        let mut states = self.states.lock().unwrap();
        let state = states.entry(model.to_string()).or_default();
        match state.status {
            CircuitStatus::Closed => true,
            CircuitStatus::HalfOpen => {
                if state.probe_in_flight {
                    false
                } else {
                    state.probe_in_flight = true;
                    true
                }
            }
            CircuitStatus::Open => {
                let elapsed = state
                    .opened_at
                    .map(|opened_at| opened_at.elapsed() >= self.recovery)
                    .unwrap_or(false);
                if elapsed {
                    debug!(model, "circuit breaker recovery window elapsed, admitting probe");
                    state.status = CircuitStatus::HalfOpen;
                    state.probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call against `model`.
    pub fn record_success(&self, model: &str) {
        #[expect(clippy::unwrap_used, reason = "poisoned lock is a bug, not a runtime condition")]
        let mut states = self.states.lock().unwrap();
        let state = states.entry(model.to_string()).or_default();
        let was_open = state.status != CircuitStatus::Closed;
        state.status = CircuitStatus::Closed;
        state.consecutive_failures = 0;
        state.opened_at = None;
        state.probe_in_flight = false;
        if was_open {
            debug!(model, "circuit breaker closed after successful probe");
        }
    }

    /// Record a failed call against `model`.
    pub fn record_failure(&self, model: &str) {
        #[expect(clippy::unwrap_used, reason = "poisoned lock is a bug, not a runtime condition")]
        let mut states = self.states.lock().unwrap();
        let state = states.entry(model.to_string()).or_default();
        state.probe_in_flight = false;
        state.consecutive_failures += 1;
        match state.status {
            CircuitStatus::HalfOpen => {
                warn!(model, "circuit breaker probe failed, reopening");
                state.status = CircuitStatus::Open;
                state.opened_at = Some(Instant::now());
            }
            CircuitStatus::Closed if state.consecutive_failures >= self.failure_threshold => {
                warn!(
                    model,
                    failures = state.consecutive_failures,
                    "circuit breaker tripped open"
                );
                state.status = CircuitStatus::Open;
                state.opened_at = Some(Instant::now());
            }
            _ => {}
        }
    }

    /// Snapshot the current status for `model` without mutating probe state.
    pub fn status(&self, model: &str) -> CircuitState {
        #[expect(clippy::unwrap_used, reason = "poisoned lock is a bug, not a runtime condition")]
        let states = self.states.lock().unwrap();
        let state = states.get(model).cloned().unwrap_or_default();
        CircuitState {
            status: state.status,
            consecutive_failures: state.consecutive_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_millis(50))
    }

    #[test]
    fn closed_admits_until_threshold_then_opens() {
        let breaker = breaker();
        assert!(breaker.is_allowed("m"));
        breaker.record_failure("m");
        breaker.record_failure("m");
        assert!(breaker.is_allowed("m"));
        breaker.record_failure("m");
        assert_eq!(breaker.status("m").status, CircuitStatus::Open);
        assert!(!breaker.is_allowed("m"));
    }

    #[test]
    fn open_transitions_to_half_open_after_recovery_window() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure("m");
        }
        assert!(!breaker.is_allowed("m"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(breaker.is_allowed("m"));
        assert_eq!(breaker.status("m").status, CircuitStatus::HalfOpen);
    }

    #[test]
    fn half_open_admits_only_one_probe_at_a_time() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure("m");
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(breaker.is_allowed("m"));
        assert!(!breaker.is_allowed("m"));
    }

    #[test]
    fn half_open_success_closes_and_resets_counter() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure("m");
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(breaker.is_allowed("m"));
        breaker.record_success("m");
        let status = breaker.status("m");
        assert_eq!(status.status, CircuitStatus::Closed);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[test]
    fn half_open_failure_reopens_and_restarts_timer() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure("m");
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(breaker.is_allowed("m"));
        breaker.record_failure("m");
        assert_eq!(breaker.status("m").status, CircuitStatus::Open);
        assert!(!breaker.is_allowed("m"));
    }

    #[test]
    fn success_resets_failure_counter_while_closed() {
        let breaker = breaker();
        breaker.record_failure("m");
        breaker.record_failure("m");
        breaker.record_success("m");
        assert_eq!(breaker.status("m").consecutive_failures, 0);
    }
}
