//! Engine startup errors.

/// Errors that can occur while bringing the engine up.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be loaded.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: burnrate_core::config::ConfigError,
    },

    /// The database could not be reached or migrated.
    #[error("database error: {source}")]
    Db {
        /// The underlying database error.
        #[from]
        source: burnrate_db::DbError,
    },

    /// World generation failed.
    #[error("world generation error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: burnrate_world::WorldError,
    },

    /// The clock could not be constructed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: burnrate_core::clock::ClockError,
    },

    /// The API server could not start.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: burnrate_api::server::ServerError,
    },
}
