//! Tick claim and commit.
//!
//! Multiple server instances may run the tick scheduler concurrently
//! during rolling deploys; only one may advance each tick. The claim is
//! a compare-and-swap on `world_meta.last_tick_at`: the UPDATE succeeds
//! for exactly one instance per interval, everyone else yields.
//!
//! The commit is the batch-write primitive applied to a finished tick:
//! the world snapshot and the tick's events go out in sequence, and a
//! failure leaves `current_tick` unchanged in storage so the next firing
//! retries the whole tick.

use burnrate_core::WorldState;
use burnrate_types::Event;
use sqlx::PgPool;

use crate::error::DbError;
use crate::event_store::EventStore;
use crate::world_store::WorldStore;

/// Tick claim/commit operations.
pub struct TickPersist<'a> {
    pool: &'a PgPool,
}

impl<'a> TickPersist<'a> {
    /// Bind to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attempt to claim the next tick.
    ///
    /// Succeeds when at least `interval_ms` has elapsed since the stored
    /// `last_tick_at` (or the world has never ticked). Exactly one
    /// concurrent caller wins: the filtered UPDATE is atomic.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`] if the query fails.
    pub async fn claim_tick(&self, interval_ms: u64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE world_meta
              SET last_tick_at = now()
              WHERE id = 1
                AND (last_tick_at IS NULL
                     OR last_tick_at <= now() - ($1 || ' milliseconds')::interval)",
        )
        .bind(interval_ms.to_string())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Force a claim regardless of the elapsed interval. Backs the
    /// admin tick endpoint, which bypasses idempotency.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`] if the query fails.
    pub async fn force_claim(&self) -> Result<(), DbError> {
        sqlx::query("UPDATE world_meta SET last_tick_at = now() WHERE id = 1")
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Commit a finished tick: world snapshot first, then the tick's
    /// events.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`]; the caller treats any failure
    /// as "tick not persisted" and retries the whole tick on the next
    /// firing.
    pub async fn commit_tick(
        &self,
        state: &WorldState,
        events: &[Event],
    ) -> Result<(), DbError> {
        WorldStore::new(self.pool).save_world(state).await?;
        EventStore::new(self.pool).batch_insert(events).await?;
        Ok(())
    }
}
