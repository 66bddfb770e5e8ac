//! Error types for the auction engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the auction run.

/// Top-level error for the auction engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: chronos_core::config::ConfigError,
    },

    /// The auction runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: chronos_core::RunnerError,
    },

    /// The demo bidder configuration could not be read.
    #[error("demo config error: {message}")]
    Demo {
        /// Description of the demo config failure.
        message: String,
    },

    /// Installing the Ctrl-C handler failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the signal failure.
        message: String,
    },

    /// The final report could not be rendered.
    #[error("report error: {message}")]
    Report {
        /// Description of the report failure.
        message: String,
    },
}
