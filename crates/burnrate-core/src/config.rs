//! Environment-driven engine configuration.
//!
//! All deployment knobs come from environment variables with defaults that
//! suit local development. Tests use [`EngineConfig::for_tests`], which
//! shrinks the tick interval to one second and the season to a handful of
//! ticks.

use std::time::Duration;

/// Milliseconds per tick in production: ten minutes.
const DEFAULT_TICK_INTERVAL_MS: u64 = 600_000;

/// Four weeks of ten-minute ticks.
const DEFAULT_SEASON_LENGTH_TICKS: u64 = 4032;

/// Default API bind address.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The offending variable.
        var: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Typed engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PostgreSQL connection URL. `None` runs fully in memory.
    pub database_url: Option<String>,
    /// Real-time milliseconds per tick.
    pub tick_interval_ms: u64,
    /// Ticks per season before a hard reset.
    pub season_length_ticks: u64,
    /// Bearer key for `/admin/*` routes. `None` disables them.
    pub admin_key: Option<String>,
    /// API listen address.
    pub bind_addr: String,
    /// CORS allow-list. Empty means allow any origin.
    pub cors_allowed_origins: Vec<String>,
    /// Seed for deterministic world generation.
    pub world_seed: u64,
}

impl EngineConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on unparseable numeric values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let tick_interval_ms = read_u64("TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS)?;
        if tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "TICK_INTERVAL_MS",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            database_url: read_opt("DATABASE_URL"),
            tick_interval_ms,
            season_length_ticks: read_u64("SEASON_LENGTH_TICKS", DEFAULT_SEASON_LENGTH_TICKS)?,
            admin_key: read_opt("ADMIN_KEY"),
            bind_addr: read_opt("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            cors_allowed_origins: read_opt("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty() && *s != "*")
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            world_seed: read_u64("WORLD_SEED", 0)?,
        })
    }

    /// A configuration suited to fast tests: one-second ticks, a
    /// twelve-tick season, no database.
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            tick_interval_ms: 1_000,
            season_length_ticks: 12,
            admin_key: Some("test-admin".to_owned()),
            bind_addr: "127.0.0.1:0".to_owned(),
            cors_allowed_origins: Vec::new(),
            world_seed: 42,
        }
    }

    /// The tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Ticks per quota day, derived from the tick interval.
    ///
    /// At the production interval of ten minutes this is 144; at the test
    /// interval of one second it is 86 400 -- quota days effectively never
    /// roll over in short tests, which is what they want.
    pub const fn ticks_per_day(&self) -> u64 {
        let interval = if self.tick_interval_ms == 0 {
            1
        } else {
            self.tick_interval_ms
        };
        let ticks = 86_400_000 / interval;
        if ticks == 0 { 1 } else { ticks }
    }
}

/// Read an optional string variable, treating empty as unset.
fn read_opt(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Read a u64 variable with a default.
fn read_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) if raw.trim().is_empty() => Ok(default),
        Ok(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
            var,
            reason: format!("{e}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ticks_per_day_at_production_interval() {
        let mut config = EngineConfig::for_tests();
        config.tick_interval_ms = DEFAULT_TICK_INTERVAL_MS;
        assert_eq!(config.ticks_per_day(), 144);
    }

    #[test]
    fn ticks_per_day_never_zero() {
        let mut config = EngineConfig::for_tests();
        config.tick_interval_ms = 172_800_000; // two days per tick
        assert_eq!(config.ticks_per_day(), 1);
    }

    #[test]
    fn test_config_is_fast() {
        let config = EngineConfig::for_tests();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.season_length_ticks, 12);
    }
}
