//! Remote state probes.
//!
//! A probe performs exactly one status query against a remote resource and
//! reports either a [`StatusObservation`] or a classified [`RemoteError`].
//! Probes are driven repeatedly by [`crate::converge::await_state`], or once
//! through [`Refresh`].
use std::{future::Future, time::SystemTime};

use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::{display::DisplayErrorContext, metadata::ProvideErrorMetadata};
use snafu::prelude::*;

/// Error codes that indicate throttling or a temporarily unavailable service,
/// regardless of the service being called.
pub const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottled",
    "RequestThrottledException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "SlowDown",
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "InternalFailure",
    "InternalError",
    "InternalServerError",
    "RequestTimeout",
    "RequestTimeoutException",
];

/// A remote failure, classified by how a caller should react to it.
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum RemoteError {
    #[snafu(display("not found: {message}"))]
    NotFound { message: String },

    #[snafu(display("transient error{}: {message}", fmt_code(code)))]
    Transient {
        code: Option<String>,
        message: String,
    },

    #[snafu(display("permanent error{}: {message}", fmt_code(code)))]
    Permanent {
        code: Option<String>,
        message: String,
    },
}

fn fmt_code(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl RemoteError {
    pub fn not_found(message: impl Into<String>) -> Self {
        RemoteError::NotFound {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        RemoteError::Transient {
            code: None,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        RemoteError::Permanent {
            code: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }

    /// The service error code, if the service provided one.
    pub fn code(&self) -> Option<&str> {
        match self {
            RemoteError::NotFound { .. } => None,
            RemoteError::Transient { code, .. } | RemoteError::Permanent { code, .. } => {
                code.as_deref()
            }
        }
    }
}

/// Per-resource table of service error codes.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCodes {
    /// Codes meaning the resource does not exist.
    pub not_found: &'static [&'static str],
    /// Codes that are worth retrying for this service, on top of
    /// [`TRANSIENT_CODES`].
    pub transient: &'static [&'static str],
}

impl ErrorCodes {
    pub const fn new(not_found: &'static [&'static str]) -> Self {
        Self {
            not_found,
            transient: &[],
        }
    }

    pub const fn with_transient(self, transient: &'static [&'static str]) -> Self {
        Self {
            not_found: self.not_found,
            transient,
        }
    }

    /// Classify a service error code.
    pub fn classify_code(&self, code: Option<&str>, message: impl Into<String>) -> RemoteError {
        let message = message.into();
        match code {
            Some(c) if self.not_found.contains(&c) => RemoteError::NotFound { message },
            Some(c) if TRANSIENT_CODES.contains(&c) || self.transient.contains(&c) => {
                RemoteError::Transient {
                    code: Some(c.to_owned()),
                    message,
                }
            }
            code => RemoteError::Permanent {
                code: code.map(str::to_owned),
                message,
            },
        }
    }

    /// Classify an error returned by an AWS SDK operation.
    ///
    /// Service errors are classified by their code. Failures that never got a
    /// service response (timeouts, dispatch and response failures) are
    /// transient, a request that could not be constructed is permanent.
    pub fn classify<E, R>(&self, err: SdkError<E, R>) -> RemoteError
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let message = DisplayErrorContext(&err).to_string();
        log::trace!("classifying sdk error: {message}");
        match &err {
            SdkError::ServiceError(context) => self.classify_code(context.err().code(), message),
            SdkError::ConstructionFailure(_) => RemoteError::Permanent {
                code: None,
                message,
            },
            _ => RemoteError::Transient {
                code: None,
                message,
            },
        }
    }
}

/// A point-in-time read of a remote resource.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusObservation<D> {
    pub status: String,
    pub detail: Option<D>,
    pub observed_at: SystemTime,
}

impl<D> StatusObservation<D> {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            detail: None,
            observed_at: SystemTime::now(),
        }
    }

    pub fn with_detail(mut self, detail: D) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Performs a single status query against a remote resource.
pub trait Probe {
    /// Structured payload carried along with each observation.
    type Detail;

    /// Query the resource `id` once.
    ///
    /// `since` is the time the surrounding wait started. Probes may use it
    /// to look for failures reported after that point.
    fn probe(
        &self,
        id: &str,
        since: SystemTime,
    ) -> impl Future<Output = Result<StatusObservation<Self::Detail>, RemoteError>>;
}

impl<P: Probe> Probe for &P {
    type Detail = P::Detail;

    fn probe(
        &self,
        id: &str,
        since: SystemTime,
    ) -> impl Future<Output = Result<StatusObservation<Self::Detail>, RemoteError>> {
        (**self).probe(id, since)
    }
}

/// A single refresh of a resource's state.
///
/// This is the probe contract in the shape host polling utilities expect:
/// a missing resource is `Ok(None)` rather than an error.
pub struct Refresh<'a, P> {
    probe: P,
    id: &'a str,
    since: SystemTime,
}

impl<'a, P: Probe> Refresh<'a, P> {
    pub fn new(probe: P, id: &'a str) -> Self {
        Self {
            probe,
            id,
            since: SystemTime::now(),
        }
    }

    /// Look for failures reported after `since` instead of after now.
    pub fn since(mut self, since: SystemTime) -> Self {
        self.since = since;
        self
    }

    pub async fn refresh(&self) -> Result<Option<StatusObservation<P::Detail>>, RemoteError> {
        match self.probe.probe(self.id, self.since).await {
            Ok(observation) => {
                log::debug!("refreshed '{}': {}", self.id, observation.status);
                Ok(Some(observation))
            }
            Err(RemoteError::NotFound { message }) => {
                log::debug!("refreshed '{}': not found ({message})", self.id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
