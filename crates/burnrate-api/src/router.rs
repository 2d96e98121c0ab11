//! Axum router construction.
//!
//! Assembles all REST routes into a single [`Router`] with CORS and
//! request tracing. The CORS allow-list comes from configuration; an
//! empty list allows any origin (development).

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    admin, contracts, factions, market, player, public, seasons, units, webhooks,
};
use crate::ratelimit::{self, IpLimiter};
use crate::state::AppState;

/// Build the complete router.
pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Public
        .route("/health", get(public::health))
        .route("/world/status", get(public::world_status))
        .route("/join", post(public::join))
        // Player identity and progression
        .route("/me", get(player::me))
        .route("/me/export", get(player::export))
        .route("/reputation", get(player::reputation))
        .route("/licenses", get(player::licenses))
        .route("/licenses/{kind}/unlock", post(player::unlock_license))
        .route("/tutorial/advance", post(player::advance_tutorial))
        .route("/events", get(player::events))
        // World reads
        .route("/world/zones", get(player::zones))
        .route("/world/zones/{id}", get(player::zone))
        .route("/routes", get(player::routes))
        .route("/zone/{id}/efficiency", get(player::zone_efficiency))
        // Logistics
        .route("/travel", post(player::travel))
        .route("/extract", post(player::extract))
        .route("/produce", post(player::produce))
        .route("/ship", post(player::ship))
        .route("/shipments", get(player::shipments))
        .route("/supply", post(player::supply))
        .route("/capture", post(player::capture))
        .route("/stockpile", post(player::stockpile))
        // Intel
        .route("/scan", post(player::scan))
        .route("/intel", get(player::intel_list))
        .route("/intel/{kind}/{id}", get(player::intel_target))
        // Market
        .route("/market/order", post(market::place_order))
        .route("/market/conditional", post(market::place_conditional))
        .route("/market/time-weighted", post(market::place_twap))
        .route("/market/orders", get(market::orders))
        .route("/market/orders/{id}", delete(market::cancel_order))
        .route("/market/units", get(market::units_for_sale))
        // Units
        .route("/units", get(units::list))
        .route("/units/build", post(units::build))
        .route("/units/{id}/escort", post(units::escort))
        .route("/units/{id}/raider", post(units::raider))
        .route("/units/{id}/recall", post(units::recall))
        .route("/units/{id}/sell", post(units::sell))
        .route("/hire/{unitId}", post(units::hire))
        // Factions
        .route("/factions", get(factions::list).post(factions::create))
        .route("/factions/{id}/join", post(factions::join))
        .route("/factions/leave", post(factions::leave))
        .route("/factions/mine", get(factions::mine))
        .route("/factions/intel", get(factions::shared_intel))
        .route("/factions/members/{id}/promote", post(factions::promote))
        .route("/factions/members/{id}/demote", post(factions::demote))
        .route("/factions/members/{id}/kick", post(factions::kick))
        .route("/factions/transfer-leadership", post(factions::transfer))
        .route("/factions/treasury/deposit", post(factions::treasury_deposit))
        .route("/factions/treasury/withdraw", post(factions::treasury_withdraw))
        .route("/factions/relations", post(factions::set_relation))
        .route("/faction/analytics", get(factions::analytics))
        .route("/faction/audit", get(factions::audit))
        // Doctrines
        .route("/doctrines", get(factions::doctrines).post(factions::create_doctrine))
        .route(
            "/doctrines/{id}",
            put(factions::update_doctrine).delete(factions::delete_doctrine),
        )
        // Contracts
        .route("/contracts", get(contracts::list).post(contracts::create))
        .route("/contracts/mine", get(contracts::mine))
        .route("/contracts/{id}/accept", post(contracts::accept))
        .route("/contracts/{id}/complete", post(contracts::complete))
        .route("/contracts/{id}", delete(contracts::cancel))
        // Seasons
        .route("/season", get(seasons::season))
        .route("/season/me", get(seasons::season_me))
        .route("/leaderboard", get(seasons::leaderboard))
        // Batch
        .route("/batch", post(player::batch))
        // Webhooks
        .route("/webhooks", get(webhooks::list).post(webhooks::register))
        .route("/webhooks/{id}", delete(webhooks::delete))
        // Admin
        .route("/admin/tick", post(admin::force_tick))
        .route("/admin/init-world", post(admin::init_world))
        .route("/admin/dashboard", get(admin::dashboard))
        .layer(axum::middleware::from_fn_with_state(
            Arc::new(IpLimiter::new()),
            ratelimit::enforce,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
