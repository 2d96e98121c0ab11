//! Aggregate persistence: the write-through snapshot of the world.
//!
//! Every aggregate row carries its JSONB body; columns exist only where
//! a uniqueness constraint or an index needs them. [`WorldStore::save_world`]
//! is the batch-write primitive: one transaction rewrites every dirty
//! aggregate, so either the whole tick (or action) persists or none of
//! it does.

use burnrate_core::WorldState;
use burnrate_types::{ContractStatus, SeasonScore, ShipmentStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations over the aggregate tables.
pub struct WorldStore<'a> {
    pool: &'a PgPool,
}

impl<'a> WorldStore<'a> {
    /// Bind a store to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist the entire world in one transaction.
    ///
    /// This is deliberately a full rewrite: the world is small (tens of
    /// zones, hundreds of aggregates) and a wholesale write-through makes
    /// the recovery story trivial -- whatever committed last is the
    /// world.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`]; on any error the transaction
    /// rolls back and nothing is persisted.
    pub async fn save_world(&self, state: &WorldState) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"INSERT INTO world_meta (id, current_tick, season, season_start_tick, updated_at)
              VALUES (1, $1, $2, $3, now())
              ON CONFLICT (id) DO UPDATE
              SET current_tick = $1, season = $2, season_start_tick = $3, updated_at = now()",
        )
        .bind(i64::try_from(state.clock.tick()).unwrap_or(i64::MAX))
        .bind(i32::try_from(state.clock.season()).unwrap_or(i32::MAX))
        .bind(i64::try_from(state.clock.season_start_tick()).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await?;

        for zone in state.graph.zones() {
            upsert_body(&mut tx, "zones", zone.id.0, serde_json::to_value(zone)?).await?;
        }
        for route in state.graph.routes() {
            upsert_body(&mut tx, "routes", route.id.0, serde_json::to_value(route)?).await?;
        }

        for player in state.players.values() {
            sqlx::query(
                r"INSERT INTO players (id, name, api_key, body, updated_at)
                  VALUES ($1, $2, $3, $4, now())
                  ON CONFLICT (id) DO UPDATE
                  SET name = $2, api_key = $3, body = $4, updated_at = now()",
            )
            .bind(player.id.0)
            .bind(&player.name)
            .bind(&player.api_key)
            .bind(serde_json::to_value(player)?)
            .execute(&mut *tx)
            .await?;
        }

        for faction in state.factions.values() {
            sqlx::query(
                r"INSERT INTO factions (id, name, tag, body, updated_at)
                  VALUES ($1, $2, $3, $4, now())
                  ON CONFLICT (id) DO UPDATE
                  SET name = $2, tag = $3, body = $4, updated_at = now()",
            )
            .bind(faction.id.0)
            .bind(&faction.name)
            .bind(&faction.tag)
            .bind(serde_json::to_value(faction)?)
            .execute(&mut *tx)
            .await?;
        }

        // Shipments and units are deleted wholesale at season reset, so
        // the snapshot clears rows that no longer exist in memory.
        sqlx::query("DELETE FROM shipments WHERE NOT (id = ANY($1))")
            .bind(ids(state.shipments.keys().map(|k| k.0)))
            .execute(&mut *tx)
            .await?;
        for shipment in state.shipments.values() {
            sqlx::query(
                r"INSERT INTO shipments (id, owner_id, status, body, updated_at)
                  VALUES ($1, $2, $3, $4, now())
                  ON CONFLICT (id) DO UPDATE
                  SET owner_id = $2, status = $3, body = $4, updated_at = now()",
            )
            .bind(shipment.id.0)
            .bind(shipment.owner.0)
            .bind(status_str(shipment.status))
            .bind(serde_json::to_value(shipment)?)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM units WHERE NOT (id = ANY($1))")
            .bind(ids(state.units.keys().map(|k| k.0)))
            .execute(&mut *tx)
            .await?;
        for unit in state.units.values() {
            sqlx::query(
                r"INSERT INTO units (id, owner_id, body, updated_at)
                  VALUES ($1, $2, $3, now())
                  ON CONFLICT (id) DO UPDATE
                  SET owner_id = $2, body = $3, updated_at = now()",
            )
            .bind(unit.id.0)
            .bind(unit.owner.0)
            .bind(serde_json::to_value(unit)?)
            .execute(&mut *tx)
            .await?;
        }

        for contract in state.contracts.values() {
            sqlx::query(
                r"INSERT INTO contracts (id, status, body, updated_at)
                  VALUES ($1, $2, $3, now())
                  ON CONFLICT (id) DO UPDATE
                  SET status = $2, body = $3, updated_at = now()",
            )
            .bind(contract.id.0)
            .bind(contract_status_str(contract.status))
            .bind(serde_json::to_value(contract)?)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM intel_reports WHERE NOT (id = ANY($1))")
            .bind(ids(state.intel.keys().map(|k| k.0)))
            .execute(&mut *tx)
            .await?;
        for report in state.intel.values() {
            sqlx::query(
                r"INSERT INTO intel_reports (id, gatherer_id, faction_id, gathered_tick, body)
                  VALUES ($1, $2, $3, $4, $5)
                  ON CONFLICT (id) DO NOTHING",
            )
            .bind(report.id.0)
            .bind(report.gatherer.0)
            .bind(report.faction.map(|f| f.0))
            .bind(i64::try_from(report.gathered_tick).unwrap_or(i64::MAX))
            .bind(serde_json::to_value(report)?)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"INSERT INTO market_state (id, body, updated_at)
              VALUES (1, $1, now())
              ON CONFLICT (id) DO UPDATE SET body = $1, updated_at = now()",
        )
        .bind(serde_json::to_value(&state.market)?)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM webhooks WHERE NOT (id = ANY($1))")
            .bind(ids(state.webhooks.keys().map(|k| k.0)))
            .execute(&mut *tx)
            .await?;
        for webhook in state.webhooks.values() {
            sqlx::query(
                r"INSERT INTO webhooks (id, owner_id, body, updated_at)
                  VALUES ($1, $2, $3, now())
                  ON CONFLICT (id) DO UPDATE SET owner_id = $2, body = $3, updated_at = now()",
            )
            .bind(webhook.id.0)
            .bind(webhook.owner.0)
            .bind(serde_json::to_value(webhook)?)
            .execute(&mut *tx)
            .await?;
        }

        for row in state.scores.rows() {
            sqlx::query(
                r"INSERT INTO season_scores (season, entity, entity_kind, categories, total)
                  VALUES ($1, $2, $3, $4, $5)
                  ON CONFLICT (season, entity) DO UPDATE
                  SET categories = $4, total = $5",
            )
            .bind(i32::try_from(row.season).unwrap_or(i32::MAX))
            .bind(row.entity)
            .bind(format!("{:?}", row.entity_kind).to_lowercase())
            .bind(serde_json::to_value(&row.categories)?)
            .bind(row.total())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Restore the world from the aggregate tables, or `None` when the
    /// database has never been initialized.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DbError`] on query or body-decode failure.
    pub async fn load_world(
        &self,
        season_length_ticks: u64,
        ticks_per_day: u64,
    ) -> Result<Option<WorldState>, DbError> {
        let meta: Option<(i64, i32, i64)> = sqlx::query_as(
            "SELECT current_tick, season, season_start_tick FROM world_meta WHERE id = 1",
        )
        .fetch_optional(self.pool)
        .await?;
        let Some((tick, season, season_start)) = meta else {
            return Ok(None);
        };

        let clock = burnrate_core::WorldClock::from_parts(
            u64::try_from(tick).unwrap_or(0),
            u32::try_from(season).unwrap_or(1),
            u64::try_from(season_start).unwrap_or(0),
            season_length_ticks,
            ticks_per_day,
        )
        .map_err(|e| DbError::Config(e.to_string()))?;

        let mut graph = burnrate_world::WorldGraph::new();
        for body in self.bodies("zones").await? {
            let zone: burnrate_types::Zone = serde_json::from_value(body)?;
            graph
                .add_zone(zone)
                .map_err(|e| DbError::Other(e.to_string()))?;
        }
        for body in self.bodies("routes").await? {
            let route: burnrate_types::Route = serde_json::from_value(body)?;
            graph
                .add_route(route)
                .map_err(|e| DbError::Other(e.to_string()))?;
        }

        let mut state = WorldState::new(graph, clock);

        for body in self.bodies("players").await? {
            let player: burnrate_types::Player = serde_json::from_value(body)?;
            state.index_player(player);
        }
        for body in self.bodies("factions").await? {
            let faction: burnrate_types::Faction = serde_json::from_value(body)?;
            state.factions.insert(faction.id, faction);
        }
        for body in self.bodies("shipments").await? {
            let shipment: burnrate_types::Shipment = serde_json::from_value(body)?;
            state.shipments.insert(shipment.id, shipment);
        }
        for body in self.bodies("units").await? {
            let unit: burnrate_types::Unit = serde_json::from_value(body)?;
            state.units.insert(unit.id, unit);
        }
        for body in self.bodies("contracts").await? {
            let contract: burnrate_types::Contract = serde_json::from_value(body)?;
            state.contracts.insert(contract.id, contract);
        }
        for body in self.bodies("intel_reports").await? {
            let report: burnrate_types::IntelReport = serde_json::from_value(body)?;
            state.intel.insert(report.id, report);
        }
        for body in self.bodies("webhooks").await? {
            let webhook: burnrate_types::WebhookRegistration = serde_json::from_value(body)?;
            state.webhooks.insert(webhook.id, webhook);
        }

        let market: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT body FROM market_state WHERE id = 1")
                .fetch_optional(self.pool)
                .await?;
        if let Some((body,)) = market {
            state.market = serde_json::from_value(body)?;
        }

        let score_rows: Vec<(i32, Uuid, String, serde_json::Value)> = sqlx::query_as(
            "SELECT season, entity, entity_kind, categories FROM season_scores",
        )
        .fetch_all(self.pool)
        .await?;
        for (row_season, entity, kind, categories) in score_rows {
            let entity_kind = match kind.as_str() {
                "faction" => burnrate_types::ActorKind::Faction,
                "system" => burnrate_types::ActorKind::System,
                _ => burnrate_types::ActorKind::Player,
            };
            let mut row = SeasonScore::new(
                u32::try_from(row_season).unwrap_or(0),
                entity,
                entity_kind,
            );
            row.categories = serde_json::from_value(categories)?;
            state.scores.insert_row(row);
        }

        tracing::info!(
            tick = state.clock.tick(),
            players = state.players.len(),
            zones = state.graph.zone_count(),
            "world restored from PostgreSQL"
        );
        Ok(Some(state))
    }

    /// All JSONB bodies of a table.
    async fn bodies(&self, table: &str) -> Result<Vec<serde_json::Value>, DbError> {
        // Table names come from the fixed call sites above, never from
        // input.
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as(&format!("SELECT body FROM {table}"))
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(|(body,)| body).collect())
    }
}

/// Upsert an (id, body) row into a plain aggregate table.
async fn upsert_body(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    table: &str,
    id: Uuid,
    body: serde_json::Value,
) -> Result<(), DbError> {
    // Table names come from the fixed call sites, never from input.
    sqlx::query(&format!(
        "INSERT INTO {table} (id, body, updated_at) VALUES ($1, $2, now())
         ON CONFLICT (id) DO UPDATE SET body = $2, updated_at = now()"
    ))
    .bind(id)
    .bind(body)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Collect UUIDs for `ANY($1)` binding.
fn ids(iter: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    iter.collect()
}

/// Shipment status as a stable column value.
const fn status_str(status: ShipmentStatus) -> &'static str {
    match status {
        ShipmentStatus::InTransit => "in_transit",
        ShipmentStatus::Arrived => "arrived",
        ShipmentStatus::Intercepted => "intercepted",
        ShipmentStatus::Lost => "lost",
    }
}

/// Contract status as a stable column value.
const fn contract_status_str(status: ContractStatus) -> &'static str {
    match status {
        ContractStatus::Open => "open",
        ContractStatus::Accepted => "accepted",
        ContractStatus::Completed => "completed",
        ContractStatus::Cancelled => "cancelled",
        ContractStatus::Expired => "expired",
    }
}
