//! # State convergence
//!
//! AWS mutations are asynchronous. After issuing one, a handler waits for the
//! resource to settle by polling it with a [`Probe`] until its status is one
//! of a set of targets, the deadline passes, or something unexpected happens.
//!
//! Every resource type shares the one loop in [`await_state`]; a resource
//! supplies only its status vocabulary (a [`ConvergenceSpec`]) and a probe.
use std::{
    collections::BTreeSet,
    time::{Duration, SystemTime},
};

use snafu::prelude::*;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Polling,
    probe::{Probe, RemoteError, StatusObservation},
};


/// What a "not found" probe result means during a wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotFound {
    /// The resource may not have propagated yet, keep polling.
    #[default]
    Pending,
    /// The resource is gone, which is what we were waiting for.
    Gone,
}

/// Parameters of one wait.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceSpec {
    /// Identifier handed to the probe and used in diagnostics.
    pub resource_id: String,
    pub pending: BTreeSet<String>,
    pub target: BTreeSet<String>,
    pub timeout: Duration,
    pub polling: Polling,
    pub not_found: NotFound,
}

fn status_set<S: Into<String>>(statuses: impl IntoIterator<Item = S>) -> BTreeSet<String> {
    statuses.into_iter().map(Into::into).collect()
}

impl ConvergenceSpec {
    pub fn new(resource_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            resource_id: resource_id.into(),
            pending: BTreeSet::default(),
            target: BTreeSet::default(),
            timeout,
            polling: Polling::default(),
            not_found: NotFound::default(),
        }
    }

    pub fn pending<S: Into<String>>(mut self, statuses: impl IntoIterator<Item = S>) -> Self {
        self.pending = status_set(statuses);
        self
    }

    pub fn target<S: Into<String>>(mut self, statuses: impl IntoIterator<Item = S>) -> Self {
        self.target = status_set(statuses);
        self
    }

    pub fn polling(mut self, polling: Polling) -> Self {
        self.polling = polling;
        self
    }

    pub fn not_found(mut self, not_found: NotFound) -> Self {
        self.not_found = not_found;
        self
    }

    /// Check the spec's invariants.
    pub fn validate(&self) -> Result<(), WaitError> {
        let id = &self.resource_id;
        if let Some(status) = self.pending.intersection(&self.target).next() {
            return InvalidSpecSnafu {
                id,
                reason: format!("status '{status}' is both pending and target"),
            }
            .fail();
        }
        ensure!(
            !self.target.is_empty() || self.not_found == NotFound::Gone,
            InvalidSpecSnafu {
                id,
                reason: "no target statuses, and 'not found' does not end the wait",
            }
        );
        let Polling {
            min_interval,
            interval,
            max_interval,
            backoff,
            ..
        } = &self.polling;
        ensure!(
            backoff.is_finite() && *backoff >= 1.0,
            InvalidSpecSnafu {
                id,
                reason: format!("backoff factor must be finite and at least 1, got {backoff}"),
            }
        );
        ensure!(
            min_interval <= max_interval,
            InvalidSpecSnafu {
                id,
                reason: format!(
                    "min interval {min_interval:?} is greater than max interval {max_interval:?}"
                ),
            }
        );
        // Growth from a zero sleep stays zero.
        let first_sleep = (*interval).clamp(*min_interval, *max_interval);
        ensure!(
            self.timeout.is_zero() || !first_sleep.is_zero(),
            InvalidSpecSnafu {
                id,
                reason: "the poll interval must be positive when the timeout is",
            }
        );
        Ok(())
    }

    fn expected(&self) -> Vec<String> {
        self.pending.iter().chain(&self.target).cloned().collect()
    }
}

/// The most recent non-terminal thing a wait saw.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Seen {
    #[default]
    Nothing,
    Status(String),
    NotFound,
    Transient(String),
}

impl core::fmt::Display for Seen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seen::Nothing => f.write_str("nothing"),
            Seen::Status(status) => write!(f, "status '{status}'"),
            Seen::NotFound => f.write_str("not found"),
            Seen::Transient(message) => write!(f, "transient error: {message}"),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum WaitError {
    #[snafu(display("Invalid wait for '{id}': {reason}"))]
    InvalidSpec { id: String, reason: String },

    #[snafu(display(
        "Polling '{id}' failed after {elapsed:?} (last seen {last_seen}): {source}"
    ))]
    Probe {
        id: String,
        last_seen: Seen,
        elapsed: Duration,
        source: RemoteError,
    },

    #[snafu(display(
        "Timed out after {elapsed:?} waiting for '{id}' to reach {target:?} (last seen {last_seen})"
    ))]
    Timeout {
        id: String,
        last_seen: Seen,
        elapsed: Duration,
        target: Vec<String>,
    },

    #[snafu(display(
        "'{id}' reached unexpected status '{status}' after {elapsed:?}, expected one of {expected:?}"
    ))]
    Unrecognized {
        id: String,
        status: String,
        elapsed: Duration,
        expected: Vec<String>,
    },

    #[snafu(display("Wait for '{id}' was cancelled after {elapsed:?} (last seen {last_seen})"))]
    Cancelled {
        id: String,
        last_seen: Seen,
        elapsed: Duration,
    },
}

impl WaitError {
    /// The last observation made before failing, if the wait got that far.
    pub fn last_seen(&self) -> Option<Seen> {
        match self {
            WaitError::InvalidSpec { .. } => None,
            WaitError::Unrecognized { status, .. } => Some(Seen::Status(status.clone())),
            WaitError::Probe { last_seen, .. }
            | WaitError::Timeout { last_seen, .. }
            | WaitError::Cancelled { last_seen, .. } => Some(last_seen.clone()),
        }
    }
}

/// How a successful wait ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<D> {
    /// The resource reached a target status.
    Reached(StatusObservation<D>),
    /// The resource no longer exists, under [`NotFound::Gone`].
    Gone,
}

impl<D> Outcome<D> {
    pub fn into_observation(self) -> Option<StatusObservation<D>> {
        match self {
            Outcome::Reached(observation) => Some(observation),
            Outcome::Gone => None,
        }
    }
}

/// Sleep, unless cancelled first. Returns `false` on cancellation.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

fn grow(interval: Duration, polling: &Polling) -> Duration {
    Duration::try_from_secs_f64(interval.as_secs_f64() * polling.backoff)
        .unwrap_or(polling.max_interval)
        .min(polling.max_interval)
}

/// Poll `probe` until the resource described by `spec` converges.
///
/// Returns as soon as the probe reports a target status (or "not found" under
/// [`NotFound::Gone`]). Fails immediately on a permanent probe error or on a
/// status that is neither pending nor target, and fails once `spec.timeout`
/// has elapsed without converging. The last poll happens at the deadline, so
/// a zero timeout polls exactly once.
///
/// Sleeps between polls start at the configured interval and grow by the
/// backoff factor up to the maximum interval. Cancelling `cancel` interrupts
/// the current sleep.
pub async fn await_state<P: Probe>(
    spec: &ConvergenceSpec,
    probe: &P,
    cancel: &CancellationToken,
) -> Result<Outcome<P::Detail>, WaitError> {
    spec.validate()?;
    let id = spec.resource_id.as_str();
    let polling = &spec.polling;
    let start = Instant::now();
    let since = SystemTime::now();
    let mut interval = polling
        .interval
        .clamp(polling.min_interval, polling.max_interval);
    let mut last_seen = Seen::Nothing;
    log::info!(
        "waiting up to {:?} for '{id}' to reach {:?}",
        spec.timeout,
        spec.target
    );

    if !polling.delay.is_zero() {
        log::debug!("  delaying first poll of '{id}' by {:?}", polling.delay);
        let delay = polling.delay.min(spec.timeout);
        if !pause(delay, cancel).await {
            return CancelledSnafu {
                id,
                last_seen,
                elapsed: start.elapsed(),
            }
            .fail();
        }
    }

    loop {
        ensure!(
            !cancel.is_cancelled(),
            CancelledSnafu {
                id,
                last_seen,
                elapsed: start.elapsed(),
            }
        );

        match probe.probe(id, since).await {
            Ok(observation) if spec.target.contains(&observation.status) => {
                log::info!(
                    "  '{id}' reached '{}' after {:?}",
                    observation.status,
                    start.elapsed()
                );
                return Ok(Outcome::Reached(observation));
            }
            Ok(observation) if spec.pending.contains(&observation.status) => {
                log::debug!("  '{id}' is '{}'", observation.status);
                last_seen = Seen::Status(observation.status);
            }
            Ok(observation) => {
                return UnrecognizedSnafu {
                    id,
                    status: observation.status,
                    elapsed: start.elapsed(),
                    expected: spec.expected(),
                }
                .fail();
            }
            Err(RemoteError::NotFound { message }) => match spec.not_found {
                NotFound::Gone => {
                    log::info!("  '{id}' is gone after {:?}", start.elapsed());
                    return Ok(Outcome::Gone);
                }
                NotFound::Pending => {
                    log::debug!("  '{id}' not found yet: {message}");
                    last_seen = Seen::NotFound;
                }
            },
            Err(RemoteError::Transient { message, .. }) => {
                log::warn!("  transient error polling '{id}', will retry: {message}");
                last_seen = Seen::Transient(message);
            }
            Err(source @ RemoteError::Permanent { .. }) => {
                return Err(WaitError::Probe {
                    id: id.to_owned(),
                    last_seen,
                    elapsed: start.elapsed(),
                    source,
                });
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= spec.timeout {
            return TimeoutSnafu {
                id,
                last_seen,
                elapsed,
                target: spec.target.iter().cloned().collect::<Vec<_>>(),
            }
            .fail();
        }

        let nap = interval.min(spec.timeout - elapsed);
        log::trace!("  sleeping {nap:?} before polling '{id}' again");
        if !pause(nap, cancel).await {
            return CancelledSnafu {
                id,
                last_seen,
                elapsed: start.elapsed(),
            }
            .fail();
        }
        interval = grow(interval, polling);
    }
}
