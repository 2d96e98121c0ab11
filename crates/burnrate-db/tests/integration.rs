//! Round-trip tests against a live `PostgreSQL`.
//!
//! These are ignored by default: they need `DATABASE_URL` pointing at a
//! disposable database with the migrations' schema applied. Run with
//! `cargo test -p burnrate-db -- --ignored`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use burnrate_core::clock::WorldClock;
use burnrate_core::state::WorldState;
use burnrate_db::{PostgresPool, TickPersist, WorldStore};
use burnrate_world::generate_world;

async fn pool() -> PostgresPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = PostgresPool::connect_url(&url).await.unwrap();
    pool.run_migrations().await.unwrap();
    pool
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL via DATABASE_URL"]
async fn world_snapshot_round_trips() {
    let pool = pool().await;
    let graph = generate_world(7).unwrap();
    let clock = WorldClock::new(4_032, 144).unwrap();
    let state = WorldState::new(graph, clock);

    WorldStore::new(pool.pool()).save_world(&state).await.unwrap();
    let restored = WorldStore::new(pool.pool())
        .load_world(4_032, 144)
        .await
        .unwrap()
        .expect("world should exist after save");

    assert_eq!(restored.clock.tick(), state.clock.tick());
    assert_eq!(restored.graph.zone_count(), state.graph.zone_count());
    assert_eq!(restored.graph.route_count(), state.graph.route_count());
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL via DATABASE_URL"]
async fn tick_claim_is_exclusive_within_interval() {
    let pool = pool().await;
    let graph = generate_world(9).unwrap();
    let clock = WorldClock::new(4_032, 144).unwrap();
    let state = WorldState::new(graph, clock);
    WorldStore::new(pool.pool()).save_world(&state).await.unwrap();

    let persist = TickPersist::new(pool.pool());
    persist.force_claim().await.unwrap();

    // Immediately after a claim, a second claim within the interval
    // must yield.
    let won = persist.claim_tick(3_600_000).await.unwrap();
    assert!(!won, "second claim inside the interval should lose");
}
