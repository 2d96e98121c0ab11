//! Webhook registration management. Operator tier and above.

use std::collections::BTreeSet;

use burnrate_types::{
    ActorKind, Event, EventType, PlayerId, PlayerTier, WebhookId, WebhookRegistration,
};
use serde_json::json;

use crate::actions::{ActionError, ActionOutcome, require_player};
use crate::state::WorldState;

/// Maximum live registrations per player.
const MAX_WEBHOOKS_PER_PLAYER: usize = 5;

/// Register a webhook. The HMAC secret is minted here and returned once.
pub fn register(
    state: &mut WorldState,
    player_id: PlayerId,
    url: &str,
    filter: &[EventType],
) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    if player.tier < PlayerTier::Operator {
        return Err(ActionError::Precondition(
            "webhooks require Operator tier or above".to_owned(),
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ActionError::Validation("url must be http(s)".to_owned()));
    }
    let existing = state
        .webhooks
        .values()
        .filter(|w| w.owner == player_id)
        .count();
    if existing >= MAX_WEBHOOKS_PER_PLAYER {
        return Err(ActionError::Precondition(format!(
            "webhook cap of {MAX_WEBHOOKS_PER_PLAYER} reached"
        )));
    }

    let tick = state.clock.tick();
    let secret = uuid::Uuid::new_v4().simple().to_string();
    let registration = WebhookRegistration {
        id: WebhookId::new(),
        owner: player_id,
        url: url.to_owned(),
        secret: secret.clone(),
        filter: filter.iter().copied().collect::<BTreeSet<_>>(),
        consecutive_failures: 0,
        disabled: false,
        created_tick: tick,
    };
    let webhook_id = registration.id;
    state.webhooks.insert(webhook_id, registration);

    let event = Event::now(
        EventType::WebhookRegistered,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "webhook": webhook_id }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "webhook": webhook_id, "secret": secret }),
        event,
    ))
}

/// Delete a webhook registration. Owner only.
pub fn delete(
    state: &mut WorldState,
    player_id: PlayerId,
    webhook_id: WebhookId,
) -> Result<ActionOutcome, ActionError> {
    let owner = state
        .webhooks
        .get(&webhook_id)
        .map(|w| w.owner)
        .ok_or_else(|| ActionError::NotFound("webhook".to_owned()))?;
    if owner != player_id {
        return Err(ActionError::Precondition(
            "webhook belongs to another player".to_owned(),
        ));
    }
    state.webhooks.remove(&webhook_id);
    Ok(ActionOutcome::body(json!({ "deleted": webhook_id })))
}
