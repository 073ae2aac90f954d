// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the ingress operator.
//!
//! - [`StoreError`] - a single read or write against the API server failed
//! - [`AggregateError`] - independent step failures collected during one pass
//! - [`AdmissionError`] - admission either rejected the record or could not run
//! - [`ReconcileError`] - what a reconciliation pass hands back to the controller runtime
//!
//! Step functions use `anyhow` to attach context (`failed to ensure ...`) and
//! the aggregate keeps every sibling failure instead of stopping at the first.

use std::fmt;
use thiserror::Error;

/// Failure of a single request against the cluster store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Any API error other than an optimistic-concurrency conflict.
    #[error("{0}")]
    Api(kube::Error),

    /// The object was modified since it was read (HTTP 409).
    ///
    /// Treated like any other transient failure: the next pass re-reads and retries.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An object could not be handled because it is missing a required field
    /// or is of an unexpected variant.
    #[error("invalid object: {0}")]
    InvalidObject(String),
}

impl From<kube::Error> for StoreError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 409 => StoreError::Conflict(ae.message),
            other => StoreError::Api(other),
        }
    }
}

impl StoreError {
    /// Returns `true` when the error is an optimistic-concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Render a list of messages the way Kubernetes aggregates errors:
/// a single message as-is, several as `[a, b]`.
#[must_use]
pub fn format_messages(messages: &[String]) -> String {
    match messages {
        [single] => single.clone(),
        many => format!("[{}]", many.join(", ")),
    }
}

/// A set of independent failures collected during one reconciliation pass.
///
/// Empty aggregates are never constructed by the reconcilers; use
/// [`AggregateError::into_result`] to turn a possibly-empty list into `Ok(())`.
#[derive(Debug)]
pub struct AggregateError(Vec<anyhow::Error>);

impl AggregateError {
    #[must_use]
    pub fn new(errors: Vec<anyhow::Error>) -> Self {
        Self(errors)
    }

    /// `Ok(())` when no error was collected, otherwise the aggregate.
    ///
    /// # Errors
    ///
    /// Returns the aggregate when `errors` is non-empty.
    pub fn into_result(errors: Vec<anyhow::Error>) -> Result<(), AggregateError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[anyhow::Error] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Each collected error rendered with its full context chain.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| format!("{e:#}")).collect()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_messages(&self.messages()))
    }
}

impl std::error::Error for AggregateError {}

/// Terminal outcome of admission: the record is invalid or conflicts with another.
///
/// Never retried automatically. A user edit re-triggers admission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct AdmissionRejection {
    /// Human-readable reason, e.g. `domain is required` or `conflicts with: default`.
    pub reason: String,
}

/// Result of admission that did not accept the record.
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// Validation rejected the record. Reported through status and an event.
    #[error("ingresscontroller rejected: {0}")]
    Rejected(AdmissionRejection),

    /// Admission could not complete (listing records or writing status failed).
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Error returned to the controller runtime from a reconciliation pass.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("failed to get ingresscontroller {key}: {error}")]
    Fetch { key: String, error: StoreError },

    #[error("failed to get {kind} '{name}': {error}")]
    ClusterConfig {
        kind: &'static str,
        name: &'static str,
        error: StoreError,
    },

    #[error("failed to ensure ingress deletion: {0}")]
    Deletion(AggregateError),

    #[error("failed to admit ingresscontroller: {0:#}")]
    Admission(anyhow::Error),

    #[error("failed to ensure ingresscontroller: {0}")]
    Convergence(AggregateError),
}

impl ReconcileError {
    /// Short label used as the `error_type` metric dimension.
    #[must_use]
    pub fn metric_label(&self) -> &'static str {
        match self {
            ReconcileError::Fetch { .. } => "fetch",
            ReconcileError::ClusterConfig { .. } => "cluster_config",
            ReconcileError::Deletion(_) => "deletion",
            ReconcileError::Admission(_) => "admission",
            ReconcileError::Convergence(_) => "convergence",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
