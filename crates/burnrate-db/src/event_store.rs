//! Event store: batch insertion and history queries.
//!
//! Events are append-only audit records. They drive history queries,
//! webhooks, and analytics -- never state reconstruction; the aggregate
//! rows stay authoritative.

use burnrate_types::Event;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Default batch size for event inserts.
const DEFAULT_BATCH_SIZE: usize = 100;

/// Operations on the `events` table.
pub struct EventStore<'a> {
    pool: &'a PgPool,
    batch_size: usize,
}

impl<'a> EventStore<'a> {
    /// Bind an event store to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the batch size for inserts.
    #[must_use]
    pub const fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Batch-insert events, one transaction per chunk.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`] if any insert fails; the failing
    /// chunk rolls back.
    pub async fn batch_insert(&self, events: &[Event]) -> Result<(), DbError> {
        if events.is_empty() {
            return Ok(());
        }

        for chunk in events.chunks(self.batch_size) {
            let mut tx = self.pool.begin().await?;
            for event in chunk {
                // Idempotent on the event UUID: a retried tick commit or
                // an action whose write-through already landed must not
                // duplicate rows.
                sqlx::query(
                    r"INSERT INTO events (id, tick, event_type, actor_id, actor_kind, data, created_at)
                      VALUES ($1, $2, $3, $4, $5, $6, $7)
                      ON CONFLICT (id) DO NOTHING",
                )
                .bind(event.id.0)
                .bind(i64::try_from(event.tick).unwrap_or(i64::MAX))
                .bind(event.event_type.as_str())
                .bind(event.actor)
                .bind(format!("{:?}", event.actor_kind).to_lowercase())
                .bind(&event.data)
                .bind(event.at)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
        }

        tracing::debug!(count = events.len(), "events inserted");
        Ok(())
    }

    /// Query events for a tick, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`] if the query fails.
    pub async fn events_by_tick(&self, tick: u64) -> Result<Vec<EventRow>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT seq, id, tick, event_type, actor_id, actor_kind, data, created_at
              FROM events WHERE tick = $1 ORDER BY seq",
        )
        .bind(i64::try_from(tick).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Query events for an actor within a tick range.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`] if the query fails.
    pub async fn events_by_actor(
        &self,
        actor: Uuid,
        from_tick: u64,
        to_tick: u64,
    ) -> Result<Vec<EventRow>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT seq, id, tick, event_type, actor_id, actor_kind, data, created_at
              FROM events
              WHERE actor_id = $1 AND tick >= $2 AND tick < $3
              ORDER BY tick, seq",
        )
        .bind(actor)
        .bind(i64::try_from(from_tick).unwrap_or(i64::MAX))
        .bind(i64::try_from(to_tick).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// A row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Monotonic insertion sequence.
    pub seq: i64,
    /// The event's UUID.
    pub id: Uuid,
    /// Tick of the event.
    pub tick: i64,
    /// Event type as its stable string.
    pub event_type: String,
    /// Acting entity, if any.
    pub actor_id: Option<Uuid>,
    /// Actor kind as a string.
    pub actor_kind: String,
    /// Type-specific payload.
    pub data: serde_json::Value,
    /// Wall-clock timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}
