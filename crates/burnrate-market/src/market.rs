//! Market state across all zones: books, conditional orders, TWAP orders,
//! and last-trade prices.
//!
//! The tick pipeline drives three stages through this type, in order:
//! TWAP progression (inject per-tick slices), conditional arming (move
//! triggered orders into the book), then matching per (zone, resource).
//! Conditional orders are never in the live book until armed; TWAP parents
//! never sit in the book at all -- only their slices do.

use std::collections::BTreeMap;

use burnrate_types::{
    ConditionalOrder, MarketOrder, OrderId, PlayerId, Resource, TwapOrder, ZoneId,
};

use crate::book::{Book, Trade};
use crate::error::MarketError;

/// A cancelled order's refund obligation, surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelledOrder {
    /// A plain book order (or armed conditional) was removed.
    Book(MarketOrder),
    /// An unarmed conditional was removed before entering the book.
    Conditional(MarketOrder),
    /// A TWAP parent was removed; the uninjected remainder needs refunding.
    Twap(TwapOrder),
}

/// All market state, keyed by (zone, resource).
///
/// The tuple-keyed maps serialize as entry lists: JSON objects cannot
/// carry composite keys, and the whole struct is persisted as a JSONB
/// aggregate.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MarketState {
    #[serde(with = "entry_list")]
    books: BTreeMap<(ZoneId, Resource), Book>,
    conditionals: Vec<ConditionalOrder>,
    twaps: Vec<TwapOrder>,
    #[serde(with = "entry_list")]
    last_trade: BTreeMap<(ZoneId, Resource), i64>,
}

/// Serde adapter for maps with composite keys: `[[key, value], ...]`.
mod entry_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
    {
        let entries: Vec<(K, V)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl MarketState {
    /// Empty market state.
    pub const fn new() -> Self {
        Self {
            books: BTreeMap::new(),
            conditionals: Vec::new(),
            twaps: Vec::new(),
            last_trade: BTreeMap::new(),
        }
    }

    /// The last trade price for a (zone, resource), if any trade happened.
    pub fn last_trade_price(&self, zone: ZoneId, resource: Resource) -> Option<i64> {
        self.last_trade.get(&(zone, resource)).copied()
    }

    /// Place a plain limit order into its book.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ZeroQuantity`] or [`MarketError::ZeroPrice`]
    /// on degenerate inputs.
    pub fn place_order(&mut self, order: MarketOrder) -> Result<(), MarketError> {
        if order.remaining == 0 {
            return Err(MarketError::ZeroQuantity);
        }
        if order.price <= 0 {
            return Err(MarketError::ZeroPrice);
        }
        self.books
            .entry((order.zone, order.resource))
            .or_default()
            .insert(order);
        Ok(())
    }

    /// Register a conditional order. It stays out of the book until armed.
    ///
    /// # Errors
    ///
    /// Same validation as [`MarketState::place_order`].
    pub fn place_conditional(&mut self, conditional: ConditionalOrder) -> Result<(), MarketError> {
        if conditional.order.remaining == 0 {
            return Err(MarketError::ZeroQuantity);
        }
        if conditional.order.price <= 0 {
            return Err(MarketError::ZeroPrice);
        }
        self.conditionals.push(conditional);
        Ok(())
    }

    /// Register a TWAP order. Slices are injected by the tick pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::BadSlice`] unless `0 < slice <= total`.
    pub fn place_twap(&mut self, twap: TwapOrder) -> Result<(), MarketError> {
        if twap.price <= 0 {
            return Err(MarketError::ZeroPrice);
        }
        if twap.slice == 0 || twap.slice > twap.total || twap.total == 0 {
            return Err(MarketError::BadSlice);
        }
        self.twaps.push(twap);
        Ok(())
    }

    /// Cancel an order of any variant owned by `owner`.
    ///
    /// Searches the live books, then unarmed conditionals, then TWAP
    /// parents. The returned value carries what must be refunded.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::OrderNotFound`] if no variant matches, or
    /// [`MarketError::NotOwner`] if it belongs to someone else.
    pub fn cancel(&mut self, id: OrderId, owner: PlayerId) -> Result<CancelledOrder, MarketError> {
        for book in self.books.values_mut() {
            if let Some(found) = book.find(id) {
                if found.owner != owner {
                    return Err(MarketError::NotOwner(id));
                }
                let removed = book.remove(id).ok_or(MarketError::OrderNotFound(id))?;
                return Ok(CancelledOrder::Book(removed));
            }
        }

        if let Some(pos) = self.conditionals.iter().position(|c| c.order.id == id) {
            if self.conditionals[pos].order.owner != owner {
                return Err(MarketError::NotOwner(id));
            }
            let removed = self.conditionals.remove(pos);
            return Ok(CancelledOrder::Conditional(removed.order));
        }

        if let Some(pos) = self.twaps.iter().position(|t| t.id == id) {
            if self.twaps[pos].owner != owner {
                return Err(MarketError::NotOwner(id));
            }
            let removed = self.twaps.remove(pos);
            return Ok(CancelledOrder::Twap(removed));
        }

        Err(MarketError::OrderNotFound(id))
    }

    /// Count a player's open orders across books, conditionals, and TWAPs.
    /// Used for tier order caps.
    pub fn open_order_count(&self, player: PlayerId) -> usize {
        let in_books: usize = self
            .books
            .values()
            .map(|b| b.orders().filter(|o| o.owner == player).count())
            .sum();
        let conditionals = self
            .conditionals
            .iter()
            .filter(|c| c.order.owner == player)
            .count();
        let twaps = self.twaps.iter().filter(|t| t.owner == player).count();
        in_books + conditionals + twaps
    }

    /// All resting orders at a zone, optionally filtered by resource.
    pub fn orders_at_zone(&self, zone: ZoneId, resource: Option<Resource>) -> Vec<&MarketOrder> {
        self.books
            .iter()
            .filter(|((z, r), _)| *z == zone && resource.is_none_or(|want| *r == want))
            .flat_map(|(_, book)| book.orders())
            .collect()
    }

    /// All of a player's open orders in the live books.
    pub fn orders_of_player(&self, player: PlayerId) -> Vec<&MarketOrder> {
        self.books
            .values()
            .flat_map(Book::orders)
            .filter(|o| o.owner == player)
            .collect()
    }

    /// Tick stage: inject one slice per active TWAP order as a plain limit
    /// order, decrement its clock, and drop exhausted parents.
    ///
    /// Returns the injected slice orders (the caller emits events; escrow
    /// was taken at parent placement).
    pub fn progress_twaps(&mut self, tick: u64) -> Vec<MarketOrder> {
        let mut injected = Vec::new();
        for twap in &mut self.twaps {
            if twap.ticks_remaining == 0 {
                continue;
            }
            let quantity = twap.slice.min(twap.total.saturating_sub(twap.injected));
            if quantity > 0 {
                let slice = MarketOrder {
                    id: OrderId::new(),
                    owner: twap.owner,
                    zone: twap.zone,
                    resource: twap.resource,
                    side: twap.side,
                    price: twap.price,
                    remaining: quantity,
                    original: quantity,
                    created_tick: tick,
                };
                twap.injected = twap.injected.saturating_add(quantity);
                injected.push(slice);
            }
            twap.ticks_remaining -= 1;
        }

        for slice in &injected {
            self.books
                .entry((slice.zone, slice.resource))
                .or_default()
                .insert(slice.clone());
        }
        self.twaps
            .retain(|t| t.ticks_remaining > 0 && t.injected < t.total);
        injected
    }

    /// Tick stage: re-evaluate every unarmed conditional against the
    /// current last-trade price at its zone; crossed triggers convert the
    /// conditional into a standard book order.
    ///
    /// Returns the IDs of orders that armed this tick.
    pub fn arm_conditionals(&mut self) -> Vec<OrderId> {
        let mut armed = Vec::new();
        let mut remaining = Vec::with_capacity(self.conditionals.len());

        for mut conditional in std::mem::take(&mut self.conditionals) {
            let last = self
                .last_trade
                .get(&(conditional.order.zone, conditional.order.resource))
                .copied();
            match last {
                Some(price) if !conditional.armed && conditional.trigger.crossed(price) => {
                    conditional.armed = true;
                    armed.push(conditional.order.id);
                    self.books
                        .entry((conditional.order.zone, conditional.order.resource))
                        .or_default()
                        .insert(conditional.order);
                }
                _ => remaining.push(conditional),
            }
        }

        self.conditionals = remaining;
        armed
    }

    /// Tick stage: run matching on every book and record last-trade prices.
    pub fn match_all(&mut self) -> Vec<Trade> {
        let mut all = Vec::new();
        for ((zone, resource), book) in &mut self.books {
            let trades = book.match_orders();
            if let Some(last) = trades.last() {
                self.last_trade.insert((*zone, *resource), last.price);
            }
            if !trades.is_empty() {
                tracing::debug!(
                    zone = %zone,
                    resource = ?resource,
                    count = trades.len(),
                    "trades executed"
                );
            }
            all.extend(trades);
        }
        self.books.retain(|_, book| !book.is_empty());
        all
    }

    /// Drop every order, book, and price record. Used at season reset.
    pub fn clear(&mut self) {
        self.books.clear();
        self.conditionals.clear();
        self.twaps.clear();
        self.last_trade.clear();
    }

    /// Record a last-trade price directly. Test and replay hook.
    pub fn set_last_trade(&mut self, zone: ZoneId, resource: Resource, price: i64) {
        self.last_trade.insert((zone, resource), price);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use burnrate_types::{OrderSide, PriceTrigger};

    use super::*;

    fn order(owner: PlayerId, zone: ZoneId, side: OrderSide, price: i64, qty: u32, tick: u64) -> MarketOrder {
        MarketOrder {
            id: OrderId::new(),
            owner,
            zone,
            resource: Resource::Ore,
            side,
            price,
            remaining: qty,
            original: qty,
            created_tick: tick,
        }
    }

    #[test]
    fn matching_updates_last_trade_price() {
        let zone = ZoneId::new();
        let mut market = MarketState::new();
        market.place_order(order(PlayerId::new(), zone, OrderSide::Sell, 12, 50, 10)).unwrap();
        market.place_order(order(PlayerId::new(), zone, OrderSide::Buy, 14, 30, 11)).unwrap();

        let trades = market.match_all();
        assert_eq!(trades.len(), 1);
        assert_eq!(market.last_trade_price(zone, Resource::Ore), Some(12));
    }

    #[test]
    fn conditional_arms_when_price_crosses() {
        let zone = ZoneId::new();
        let buyer = PlayerId::new();
        let mut market = MarketState::new();

        let conditional = ConditionalOrder {
            order: order(buyer, zone, OrderSide::Buy, 9, 20, 50),
            trigger: PriceTrigger::AtOrBelow(10),
            armed: false,
        };
        market.place_conditional(conditional).unwrap();

        // No last trade yet: nothing arms.
        assert!(market.arm_conditionals().is_empty());

        market.set_last_trade(zone, Resource::Ore, 10);
        let armed = market.arm_conditionals();
        assert_eq!(armed.len(), 1);

        // The armed order now rests in the book at its own limit of 9.
        let resting = market.orders_at_zone(zone, Some(Resource::Ore));
        assert_eq!(resting.len(), 1);
        assert_eq!(resting[0].price, 9);
    }

    #[test]
    fn armed_conditional_trades_against_matching_ask() {
        let zone = ZoneId::new();
        let mut market = MarketState::new();
        market
            .place_conditional(ConditionalOrder {
                order: order(PlayerId::new(), zone, OrderSide::Buy, 9, 20, 50),
                trigger: PriceTrigger::AtOrBelow(10),
                armed: false,
            })
            .unwrap();
        market.place_order(order(PlayerId::new(), zone, OrderSide::Sell, 9, 20, 55)).unwrap();

        market.set_last_trade(zone, Resource::Ore, 10);
        market.arm_conditionals();
        let trades = market.match_all();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 9);
        assert_eq!(trades[0].quantity, 20);
    }

    #[test]
    fn twap_injects_slices_and_expires() {
        let zone = ZoneId::new();
        let owner = PlayerId::new();
        let mut market = MarketState::new();
        market
            .place_twap(TwapOrder {
                id: OrderId::new(),
                owner,
                zone,
                resource: Resource::Ore,
                side: OrderSide::Sell,
                price: 10,
                total: 25,
                slice: 10,
                injected: 0,
                ticks_remaining: 3,
                created_tick: 1,
            })
            .unwrap();

        let first = market.progress_twaps(2);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].remaining, 10);

        let second = market.progress_twaps(3);
        assert_eq!(second[0].remaining, 10);

        // Final slice is the remainder.
        let third = market.progress_twaps(4);
        assert_eq!(third[0].remaining, 5);

        // Parent exhausted; nothing more to inject.
        assert!(market.progress_twaps(5).is_empty());
        assert_eq!(market.open_order_count(owner), 3);
    }

    #[test]
    fn cancel_returns_the_right_variant() {
        let zone = ZoneId::new();
        let owner = PlayerId::new();
        let mut market = MarketState::new();

        let plain = order(owner, zone, OrderSide::Sell, 10, 5, 1);
        let plain_id = plain.id;
        market.place_order(plain).unwrap();

        let cancelled = market.cancel(plain_id, owner).unwrap();
        assert!(
            matches!(&cancelled, CancelledOrder::Book(o) if o.remaining == 5),
            "unexpected variant: {cancelled:?}"
        );

        let stranger = PlayerId::new();
        let mine = order(owner, zone, OrderSide::Buy, 10, 5, 1);
        let mine_id = mine.id;
        market.place_order(mine).unwrap();
        assert!(matches!(
            market.cancel(mine_id, stranger),
            Err(MarketError::NotOwner(_))
        ));
    }

    #[test]
    fn order_cap_counts_all_variants() {
        let zone = ZoneId::new();
        let owner = PlayerId::new();
        let mut market = MarketState::new();
        market.place_order(order(owner, zone, OrderSide::Sell, 10, 5, 1)).unwrap();
        market
            .place_conditional(ConditionalOrder {
                order: order(owner, zone, OrderSide::Buy, 9, 5, 1),
                trigger: PriceTrigger::AtOrBelow(8),
                armed: false,
            })
            .unwrap();
        market
            .place_twap(TwapOrder {
                id: OrderId::new(),
                owner,
                zone,
                resource: Resource::Ore,
                side: OrderSide::Sell,
                price: 10,
                total: 20,
                slice: 5,
                injected: 0,
                ticks_remaining: 4,
                created_tick: 1,
            })
            .unwrap();
        assert_eq!(market.open_order_count(owner), 3);
    }
}
