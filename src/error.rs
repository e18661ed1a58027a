//! Error types for sample-ring.
//!
//! Contract violations (zero capacity, waiting on the wrong role) fail fast
//! with a panic; the only recoverable runtime condition is a bounded wait
//! running out of time.

use std::time::Duration;

use crate::WaitRole;

/// Errors returned by the bounded (timeout) wait operations.
///
/// The unbounded waits never fail: a correctly paired producer/consumer
/// always signals the waiting side eventually. A bounded wait gives callers
/// an escape hatch when the opposite side may have stalled, e.g. a capture
/// device that stopped delivering samples.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// A bounded wait elapsed before the ring state changed.
    #[error("timed out after {timeout:?} waiting for {role}")]
    WaitTimedOut {
        /// What the caller was waiting for.
        role: WaitRole,
        /// How long the caller was prepared to wait.
        timeout: Duration,
    },
}
