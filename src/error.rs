//! Error types for the analysis core.

use thiserror::Error;

/// An error raised by the analysis core.
///
/// Termination of a trace is *not* an error; it is reported as a
/// [`Termination`](crate::trace::Termination) value by the trace executor.
#[derive(Debug, Error)]
pub enum Error {
    /// A malformed automaton, objective or controller request.
    ///
    /// These surface to the caller and are fatal for the current request.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A broken internal invariant or a collaborator violating its contract.
    ///
    /// The computation that raised this is bugged and its results must be
    /// discarded.
    #[error("invariant violation: {0}")]
    Invariant(String),
    /// A controller queried outside its configured domain.
    ///
    /// Fatal to the current trace, but the caller may recover by switching
    /// to a different controller.
    #[error("controller miss: {0}")]
    Transient(String),
}

impl Error {
    pub(crate) fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn invariant<S: Into<String>>(message: S) -> Self {
        Self::Invariant(message.into())
    }

    pub(crate) fn transient<S: Into<String>>(message: S) -> Self {
        Self::Transient(message.into())
    }
}
