//! Server binary for the Burnrate simulation.
//!
//! Wires together configuration, persistence, the in-memory world, the
//! HTTP API, the tick scheduler, and webhook dispatch.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the environment
//! 3. Connect to PostgreSQL and run migrations (when configured)
//! 4. Restore the world from storage, or generate a fresh one
//! 5. Start the API server
//! 6. Run the tick scheduler until shutdown

mod error;
mod scheduler;
mod webhook;

use std::sync::Arc;

use burnrate_api::AppState;
use burnrate_core::clock::WorldClock;
use burnrate_core::{EngineConfig, WorldState};
use burnrate_db::{PostgresPool, WorldStore};
use burnrate_world::generate_world;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::webhook::Dispatcher;

/// Application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("burnrate-engine starting");

    // 2. Configuration.
    let config = EngineConfig::from_env().map_err(EngineError::from)?;
    info!(
        tick_interval_ms = config.tick_interval_ms,
        season_length_ticks = config.season_length_ticks,
        ticks_per_day = config.ticks_per_day(),
        persistence = config.database_url.is_some(),
        "configuration loaded"
    );

    // 3. Persistence.
    let pool = match &config.database_url {
        Some(url) => {
            let pool = PostgresPool::connect_url(url)
                .await
                .map_err(EngineError::from)?;
            pool.run_migrations().await.map_err(EngineError::from)?;
            Some(pool)
        }
        None => {
            info!("no DATABASE_URL; running fully in memory");
            None
        }
    };

    // 4. World: restore or generate.
    let world = match &pool {
        Some(pool) => WorldStore::new(pool.pool())
            .load_world(config.season_length_ticks, config.ticks_per_day())
            .await
            .map_err(EngineError::from)?,
        None => None,
    };
    let world = match world {
        Some(state) => {
            info!(tick = state.clock.tick(), "world restored");
            state
        }
        None => {
            let graph = generate_world(config.world_seed).map_err(EngineError::from)?;
            let clock = WorldClock::new(config.season_length_ticks, config.ticks_per_day())
                .map_err(EngineError::from)?;
            let state = WorldState::new(graph, clock);
            if let Some(pool) = &pool {
                WorldStore::new(pool.pool())
                    .save_world(&state)
                    .await
                    .map_err(EngineError::from)?;
            }
            info!(
                zones = state.graph.zone_count(),
                routes = state.graph.route_count(),
                seed = config.world_seed,
                "fresh world generated"
            );
            state
        }
    };
    let world = Arc::new(RwLock::new(world));

    // 5. API server.
    let app_state = Arc::new(AppState::new(
        Arc::clone(&world),
        pool.clone(),
        config.admin_key.clone(),
    ));
    let (_addr, _server) = burnrate_api::spawn_server(
        &config.bind_addr,
        app_state,
        &config.cors_allowed_origins,
    )
    .await
    .map_err(EngineError::from)?;

    // 6. Tick scheduler (runs until the process is stopped).
    info!("entering tick loop");
    scheduler::run(config, world, pool, Dispatcher::new()).await;

    Ok(())
}
