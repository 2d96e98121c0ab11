//! REST endpoint handlers, grouped by domain.
//!
//! Mutating handlers build an [`Action`](burnrate_core::Action) and run
//! it through [`AppState::perform`](crate::state::AppState::perform);
//! read handlers take the world's read guard and serialize views. No
//! handler touches storage directly except through the write-through
//! path in the app state.

pub mod admin;
pub mod contracts;
pub mod factions;
pub mod market;
pub mod player;
pub mod public;
pub mod seasons;
pub mod units;
pub mod webhooks;

use burnrate_core::{ActionError, WorldState};
use burnrate_types::Player;

use crate::error::ApiError;

/// Resolve the acting player for a read endpoint.
pub(crate) fn resolve_player<'a>(
    world: &'a WorldState,
    api_key: &str,
) -> Result<&'a Player, ApiError> {
    world
        .player_by_key(api_key)
        .and_then(|id| world.players.get(&id))
        .ok_or(ApiError::Action(ActionError::Unauthorized))
}

/// Run `validator` checks on a request DTO.
pub(crate) fn validate_dto<T: validator::Validate>(dto: &T) -> Result<(), ApiError> {
    dto.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}
