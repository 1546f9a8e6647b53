//! Logging configuration passed to the server at construction.
//!
//! Routing decisions and faults are always emitted through `tracing`; the
//! subscriber decides what is shown. `verbose` additionally dumps raw
//! request and response XML at debug level.

/// Logging options for a [`Server`](crate::Server).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Dump raw request and response documents.
    pub verbose: bool,
}

impl LogConfig {
    /// Configuration with message dumps enabled.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}
