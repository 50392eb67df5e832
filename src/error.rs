//! Error taxonomy for the simulator's public contract.
//!
//! All public operations fail only on precondition violations; the
//! propagator and FFR-local pass are total given a well-formed, installed
//! fault list and are never a source of errors themselves.

use thiserror::Error;

/// Errors surfaced synchronously at the call that violated a precondition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DruidError {
    /// Fault not in the installed fault list, an index out of range, or a
    /// test vector whose length does not match the bound circuit.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation requires a capability the simulator was not built with,
    /// e.g. querying the previous time frame on a non-prev-state simulator.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A value (e.g. a three-valued `X`) was given to a simulator that
    /// cannot represent it.
    #[error("value error: {0}")]
    ValueError(String),
}

/// Convenience alias for fallible public operations.
pub type Result<T> = std::result::Result<T, DruidError>;

impl DruidError {
    /// Log the error at `warn` level and return it, for use at the point
    /// where a public entry point is about to return `Err`.
    pub(crate) fn logged(self) -> Self {
        tracing::warn!(error = %self, "rejecting call");
        self
    }
}
