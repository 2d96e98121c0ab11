//! The tick scheduler: fires on the configured interval, claims the
//! tick idempotently, runs the pipeline, commits, and dispatches
//! webhooks.
//!
//! With a database behind the server, the claim is the storage CAS --
//! during rolling deploys several instances fire together and exactly
//! one wins each tick. Without a database the claim is a local elapsed
//! check, which still makes a double-fired interval advance exactly one
//! tick.

use std::sync::Arc;
use std::time::Instant;

use burnrate_core::tick::run_tick;
use burnrate_core::{EngineConfig, WorldState};
use burnrate_db::{PostgresPool, TickPersist};
use burnrate_types::{ActorKind, Event, EventType};
use tokio::sync::RwLock;

use crate::webhook::Dispatcher;

/// Run the tick loop forever.
pub async fn run(
    config: EngineConfig,
    world: Arc<RwLock<WorldState>>,
    pool: Option<PostgresPool>,
    dispatcher: Dispatcher,
) {
    let interval_ms = config.tick_interval_ms;
    let mut interval = tokio::time::interval(config.tick_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first interval fire is immediate; consume it so tick 1 lands a
    // full interval after boot.
    interval.tick().await;

    let mut local_last: Option<Instant> = None;

    loop {
        interval.tick().await;

        let claimed = match &pool {
            Some(pool) => match TickPersist::new(pool.pool()).claim_tick(interval_ms).await {
                Ok(won) => won,
                Err(e) => {
                    tracing::warn!(error = %e, "tick claim failed; yielding this firing");
                    false
                }
            },
            None => {
                let due = local_last
                    .is_none_or(|last| last.elapsed().as_millis() >= u128::from(interval_ms));
                if due {
                    local_last = Some(Instant::now());
                }
                due
            }
        };
        if !claimed {
            continue;
        }

        let events = {
            let mut guard = world.write().await;
            match run_tick(&mut guard) {
                Ok(report) => {
                    tracing::debug!(tick = report.tick, "tick pipeline finished");
                }
                Err(e) => {
                    tracing::error!(error = %e, "tick aborted");
                    let tick = guard.clock.tick();
                    guard.record_event(Event::now(
                        EventType::TickAborted,
                        tick,
                        None,
                        ActorKind::System,
                        serde_json::json!({ "reason": e.to_string() }),
                    ));
                    continue;
                }
            }

            let events = std::mem::take(&mut guard.outbox);
            if let Some(pool) = &pool {
                if let Err(e) = TickPersist::new(pool.pool())
                    .commit_tick(&guard, &events)
                    .await
                {
                    // The in-memory tick stands; the snapshot is a full
                    // rewrite, so the next successful commit converges
                    // storage. Events go back on the outbox so none are
                    // lost to webhooks either.
                    tracing::error!(error = %e, "tick commit failed; will retry next tick");
                    guard.outbox = events;
                    continue;
                }
            }
            events
        };

        dispatcher.dispatch(&world, events).await;
    }
}
