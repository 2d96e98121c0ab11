//! Shared application state for the API server.
//!
//! [`AppState`] wraps the world model in a `tokio::sync::RwLock`. The
//! tick scheduler (in the engine binary) takes the write guard for a
//! whole tick; action handlers take it for validate + mutate + persist,
//! which is the write-through rule: the updated view publishes only when
//! the guard drops after a successful persist.

use std::sync::Arc;
use std::time::Duration;

use burnrate_core::actions::{self, Action};
use burnrate_core::WorldState;
use burnrate_db::{EventStore, PostgresPool, WorldStore};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::ApiError;

/// Bounded-retry attempts for retryable persistence failures.
const PERSIST_ATTEMPTS: u32 = 3;

/// Base backoff between persistence retries.
const PERSIST_BACKOFF: Duration = Duration::from_millis(50);

/// Per-request deadline for action handling.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(5);

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// The world model. Write guard = exclusive world-write stance.
    pub world: Arc<RwLock<WorldState>>,
    /// Persistence pool; `None` runs fully in memory.
    pub store: Option<PostgresPool>,
    /// Admin bearer key; `None` disables `/admin/*`.
    pub admin_key: Option<String>,
}

impl AppState {
    /// Assemble application state.
    pub fn new(
        world: Arc<RwLock<WorldState>>,
        store: Option<PostgresPool>,
        admin_key: Option<String>,
    ) -> Self {
        Self {
            world,
            store,
            admin_key,
        }
    }

    /// Run an authenticated action under the write guard, persist
    /// write-through, and return the response body.
    ///
    /// Persistence failures retry with bounded backoff while the guard
    /// is held; if they exhaust, the in-memory mutation stands and the
    /// next tick commit re-persists the world (the snapshot is a full
    /// rewrite), so the client gets a transient error it can safely
    /// retry.
    ///
    /// # Errors
    ///
    /// Returns the typed [`ApiError`] for the failing stage.
    pub async fn perform(&self, api_key: &str, action: Action) -> Result<serde_json::Value, ApiError> {
        self.perform_at(api_key, action, Utc::now()).await
    }

    /// [`AppState::perform`] with an explicit action timestamp. The batch
    /// endpoint passes staggered timestamps so each entry consumes its
    /// own one-second rate slot.
    pub async fn perform_at(
        &self,
        api_key: &str,
        action: Action,
        now: chrono::DateTime<Utc>,
    ) -> Result<serde_json::Value, ApiError> {
        let work = async {
            let mut world = self.world.write().await;
            let outcome = actions::process(&mut world, api_key, &action, now)?;

            if let Some(pool) = &self.store {
                persist_action(pool, &world, &outcome.events).await;
            }
            Ok::<_, ApiError>(outcome.body)
        };

        match tokio::time::timeout(REQUEST_DEADLINE, work).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::RequestTimeout),
        }
    }

    /// Run the unauthenticated join action.
    ///
    /// # Errors
    ///
    /// Returns the typed [`ApiError`] for the failing stage.
    pub async fn perform_join(&self, name: &str) -> Result<serde_json::Value, ApiError> {
        let mut world = self.world.write().await;
        let outcome = actions::join(&mut world, name, Utc::now())?;
        if let Some(pool) = &self.store {
            persist_action(pool, &world, &outcome.events).await;
        }
        Ok(outcome.body)
    }

    /// Whether the given key grants admin access.
    pub fn is_admin(&self, presented: Option<&str>) -> bool {
        match (&self.admin_key, presented) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}

/// Write-through persistence for one action, with bounded retry on
/// retryable failures. An exhausted retry is logged and left for the
/// next tick commit to heal; the action itself has already applied.
async fn persist_action(
    pool: &PostgresPool,
    world: &WorldState,
    events: &[burnrate_types::Event],
) {
    for attempt in 1..=PERSIST_ATTEMPTS {
        let result = async {
            WorldStore::new(pool.pool()).save_world(world).await?;
            EventStore::new(pool.pool()).batch_insert(events).await
        }
        .await;

        match result {
            Ok(()) => return,
            Err(e) if e.is_retryable() && attempt < PERSIST_ATTEMPTS => {
                tracing::warn!(attempt, error = %e, "action persist retrying");
                tokio::time::sleep(PERSIST_BACKOFF * attempt).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "action persist failed; tick commit will heal");
                return;
            }
        }
    }
}

