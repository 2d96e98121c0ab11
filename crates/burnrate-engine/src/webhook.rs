//! Webhook dispatch: best-effort, signed, per-registration ordering.
//!
//! Each tick the scheduler drains the world's event outbox and hands it
//! here. Delivery is per registration, in tick order: every matched
//! event becomes an HTTP POST carrying the event body, a timestamp
//! header, and an HMAC-SHA256 signature over `"{timestamp}.{body}"`.
//! A 2xx resets the registration's failure counter; anything else
//! increments it, and five consecutive failures disable the
//! registration. Delivery never blocks the tick: the world lock is only
//! taken to snapshot targets and to write back counters.

use std::sync::Arc;
use std::time::Duration;

use burnrate_core::WorldState;
use burnrate_types::{Event, WebhookId};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;

/// Per-attempt delivery timeout.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Consecutive failures after which a registration is disabled.
const DISABLE_AFTER_FAILURES: u32 = 5;

type HmacSha256 = Hmac<Sha256>;

/// A snapshot of one registration taken under the read guard.
struct Target {
    id: WebhookId,
    url: String,
    secret: String,
    events: Vec<Event>,
}

/// The webhook delivery client.
pub struct Dispatcher {
    client: reqwest::Client,
}

impl Dispatcher {
    /// Build the dispatcher with the per-attempt timeout baked into the
    /// client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Deliver a tick's events to every matching registration.
    pub async fn dispatch(&self, world: &Arc<RwLock<WorldState>>, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }

        // Snapshot targets and their matched events under the read guard.
        let targets: Vec<Target> = {
            let guard = world.read().await;
            guard
                .webhooks
                .values()
                .filter(|w| !w.disabled)
                .map(|w| Target {
                    id: w.id,
                    url: w.url.clone(),
                    secret: w.secret.clone(),
                    events: events
                        .iter()
                        .filter(|e| w.matches(e.event_type))
                        .cloned()
                        .collect(),
                })
                .filter(|t| !t.events.is_empty())
                .collect()
        };
        if targets.is_empty() {
            return;
        }

        // Deliver per registration, events in tick order. No ordering
        // guarantee across registrations.
        let mut counter_updates: Vec<(WebhookId, bool)> = Vec::new();
        for target in targets {
            for event in &target.events {
                let delivered = self.deliver(&target, event).await;
                counter_updates.push((target.id, delivered));
                if !delivered {
                    // Stop this registration for the tick; the failure
                    // counter decides its fate.
                    break;
                }
            }
        }

        // Write counters back under the write guard.
        let mut guard = world.write().await;
        for (id, delivered) in counter_updates {
            if let Some(hook) = guard.webhooks.get_mut(&id) {
                if delivered {
                    hook.consecutive_failures = 0;
                } else {
                    hook.consecutive_failures = hook.consecutive_failures.saturating_add(1);
                    if hook.consecutive_failures >= DISABLE_AFTER_FAILURES && !hook.disabled {
                        hook.disabled = true;
                        tracing::warn!(webhook = %id, "webhook disabled after repeated failures");
                    }
                }
            }
        }
    }

    /// POST one signed event. Returns whether delivery succeeded (2xx).
    async fn deliver(&self, target: &Target, event: &Event) -> bool {
        let body = match serde_json::to_string(&serde_json::json!({ "event": event })) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "event serialization failed");
                return false;
            }
        };
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&target.secret, &timestamp, &body);

        let result = self
            .client
            .post(&target.url)
            .header("content-type", "application/json")
            .header("x-burnrate-timestamp", &timestamp)
            .header("x-burnrate-signature", signature)
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(
                    webhook = %target.id,
                    status = %response.status(),
                    "webhook delivery refused"
                );
                false
            }
            Err(e) => {
                tracing::debug!(webhook = %target.id, error = %e, "webhook delivery failed");
                false
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hex HMAC-SHA256 over `"{timestamp}.{body}"`.
fn sign(secret: &str, timestamp: &str, body: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail for our
    // hex-string secrets.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable() {
        let a = sign("secret", "1700000000", r#"{"event":{}}"#);
        let b = sign("secret", "1700000000", r#"{"event":{}}"#);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_varies_with_inputs() {
        let base = sign("secret", "1700000000", "body");
        assert_ne!(base, sign("other", "1700000000", "body"));
        assert_ne!(base, sign("secret", "1700000001", "body"));
        assert_ne!(base, sign("secret", "1700000000", "body2"));
    }
}
