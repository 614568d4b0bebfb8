//! Error types for engine-level (not stream-data-level) failures.
//!
//! A running stream's *data* errors travel as [`crate::event::Event::Error`]
//! and are generic over a user-chosen `Err` type parameter — they never go
//! through this module. `StreamError` is reserved for failures in the engine
//! itself: misconfigured dispatchers, exhausted throttle buffers that the
//! caller asked to be told about, and custom escape hatches for callers that
//! need to wrap their own error type into a `Result`.

use std::fmt;

/// Result alias for fallible engine operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors raised by the engine itself, as opposed to errors flowing through
/// a stream as data.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A dispatcher was asked to run work on a queue it doesn't recognize,
    /// or a `chain` was built with incompatible dispatchers.
    #[error("dispatch failed on queue '{queue}': {reason}")]
    Dispatch {
        /// Name of the queue the work was submitted to.
        queue: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A throttle, timer, or retry policy was constructed with an invalid
    /// configuration (e.g. a `Pressure` throttle with `limit == 0`).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A `Pressure` throttle's bounded FIFO overflowed and the caller asked
    /// for that to surface as an error rather than a silent drop.
    #[error("backpressure: {0}")]
    Backpressure(String),

    /// Escape hatch for callers embedding their own error type.
    #[error(transparent)]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl StreamError {
    /// Build a [`StreamError::Dispatch`] with the two pieces callers most
    /// often have at hand.
    pub fn dispatch(queue: impl Into<String>, reason: impl fmt::Display) -> Self {
        StreamError::Dispatch {
            queue: queue.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_error_formats_queue_and_reason() {
        let err = StreamError::dispatch("background", "no runtime handle");
        assert_eq!(
            err.to_string(),
            "dispatch failed on queue 'background': no runtime handle"
        );
    }
}
