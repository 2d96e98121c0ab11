//! World clock and season tracking.
//!
//! The clock is the single source of truth for simulation time. It tracks
//! the current tick, the season number, and the tick at which the current
//! season began. Quota days are derived from the tick counter and the
//! configured ticks-per-day -- never stored independently.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong.
        reason: String,
    },
}

/// World clock tracking tick, season, and quota days.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorldClock {
    /// Current tick number.
    tick: u64,
    /// Current season number, starting at 1.
    season: u32,
    /// Tick at which the current season began.
    season_start_tick: u64,
    /// Ticks per season before a reset fires.
    season_length_ticks: u64,
    /// Ticks per quota day (derived from the real-time tick interval).
    ticks_per_day: u64,
}

impl WorldClock {
    /// Create a clock at tick 0, season 1.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if either length is zero.
    pub fn new(season_length_ticks: u64, ticks_per_day: u64) -> Result<Self, ClockError> {
        if season_length_ticks == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "season_length_ticks must be at least 1".to_owned(),
            });
        }
        if ticks_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_day must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick: 0,
            season: 1,
            season_start_tick: 0,
            season_length_ticks,
            ticks_per_day,
        })
    }

    /// Restore a clock from persisted parts.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if either length is zero.
    pub fn from_parts(
        tick: u64,
        season: u32,
        season_start_tick: u64,
        season_length_ticks: u64,
        ticks_per_day: u64,
    ) -> Result<Self, ClockError> {
        if season_length_ticks == 0 || ticks_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "lengths must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            season,
            season_start_tick,
            season_length_ticks,
            ticks_per_day,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] past `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current season number.
    pub const fn season(&self) -> u32 {
        self.season
    }

    /// Tick at which the current season began.
    pub const fn season_start_tick(&self) -> u64 {
        self.season_start_tick
    }

    /// Configured season length in ticks.
    pub const fn season_length_ticks(&self) -> u64 {
        self.season_length_ticks
    }

    /// Configured ticks per quota day.
    pub const fn ticks_per_day(&self) -> u64 {
        self.ticks_per_day
    }

    /// The quota day a given tick belongs to.
    pub const fn day_of(&self, tick: u64) -> u64 {
        tick / self.ticks_per_day
    }

    /// Ticks elapsed in the current season.
    pub const fn season_elapsed(&self) -> u64 {
        self.tick.saturating_sub(self.season_start_tick)
    }

    /// Whether the current season has run its full length.
    pub const fn season_expired(&self) -> bool {
        self.season_elapsed() >= self.season_length_ticks
    }

    /// Begin the next season at the current tick.
    pub const fn begin_next_season(&mut self) {
        self.season = self.season.saturating_add(1);
        self.season_start_tick = self.tick;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_tick_zero_season_one() {
        let clock = WorldClock::new(4032, 144).unwrap();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.season(), 1);
        assert!(!clock.season_expired());
    }

    #[test]
    fn clock_advances() {
        let mut clock = WorldClock::new(4032, 144).unwrap();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn day_rollover_follows_ticks_per_day() {
        let clock = WorldClock::new(4032, 144).unwrap();
        assert_eq!(clock.day_of(0), 0);
        assert_eq!(clock.day_of(143), 0);
        assert_eq!(clock.day_of(144), 1);
        assert_eq!(clock.day_of(287), 1);
    }

    #[test]
    fn season_expires_at_length() {
        let mut clock = WorldClock::new(10, 5).unwrap();
        for _ in 0..9 {
            let _ = clock.advance();
        }
        assert!(!clock.season_expired());
        let _ = clock.advance();
        assert!(clock.season_expired());

        clock.begin_next_season();
        assert_eq!(clock.season(), 2);
        assert_eq!(clock.season_start_tick(), 10);
        assert!(!clock.season_expired());
    }

    #[test]
    fn zero_lengths_rejected() {
        assert!(WorldClock::new(0, 144).is_err());
        assert!(WorldClock::new(4032, 0).is_err());
    }
}
