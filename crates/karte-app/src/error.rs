//! Error types for the Karte binary.
//!
//! [`AppError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the Karte binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration was invalid.
    #[error("config error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// The assistant could not be constructed.
    #[error("assistant error: {source}")]
    Assistant {
        /// The underlying assistant error.
        #[from]
        source: karte_assistant::AssistantError,
    },

    /// Database connection or migration failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: karte_db::DbError,
    },

    /// The HTTP server failed to start or stopped with an error.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: karte_server::ServerError,
    },

    /// The geocoding client could not be built.
    #[error("geocoder error: {message}")]
    Geocoder {
        /// Description of the geocoder failure.
        message: String,
    },
}
