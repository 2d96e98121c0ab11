//! A single (zone, resource) order book with price-time priority matching.
//!
//! Buys are kept sorted descending by price, sells ascending; ties break
//! toward the earlier tick, then the earlier (time-ordered) order ID.
//! Matching trades at the *resting* order's price: whichever of the two
//! orders arrived later is the taker and takes the maker's price.

use burnrate_types::{MarketOrder, OrderId, OrderSide, PlayerId, Resource, ZoneId};

/// An executed trade between two resting orders.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    /// The buy order involved.
    pub buy_order: OrderId,
    /// The sell order involved.
    pub sell_order: OrderId,
    /// The buying player.
    pub buyer: PlayerId,
    /// The selling player.
    pub seller: PlayerId,
    /// The zone whose book produced the trade.
    pub zone: ZoneId,
    /// The traded resource.
    pub resource: Resource,
    /// Execution price (the maker's limit).
    pub price: i64,
    /// Quantity traded.
    pub quantity: u32,
    /// The buyer's limit price, for escrow reconciliation.
    pub buyer_limit: i64,
}

/// Order book for one (zone, resource) pair.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Book {
    /// Bids, best (highest price, earliest) first.
    buys: Vec<MarketOrder>,
    /// Asks, best (lowest price, earliest) first.
    sells: Vec<MarketOrder>,
}

impl Book {
    /// An empty book.
    pub const fn new() -> Self {
        Self {
            buys: Vec::new(),
            sells: Vec::new(),
        }
    }

    /// Whether the book holds no orders at all.
    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }

    /// All resting orders, buys before sells.
    pub fn orders(&self) -> impl Iterator<Item = &MarketOrder> {
        self.buys.iter().chain(self.sells.iter())
    }

    /// Insert an order into its side, preserving price-time priority.
    pub fn insert(&mut self, order: MarketOrder) {
        match order.side {
            OrderSide::Buy => {
                // Descending price; within a price level, earlier first.
                let pos = self
                    .buys
                    .iter()
                    .position(|o| {
                        (o.price, std::cmp::Reverse((o.created_tick, o.id)))
                            < (order.price, std::cmp::Reverse((order.created_tick, order.id)))
                    })
                    .unwrap_or(self.buys.len());
                self.buys.insert(pos, order);
            }
            OrderSide::Sell => {
                let pos = self
                    .sells
                    .iter()
                    .position(|o| (o.price, o.created_tick, o.id) > (order.price, order.created_tick, order.id))
                    .unwrap_or(self.sells.len());
                self.sells.insert(pos, order);
            }
        }
    }

    /// Remove an order by ID, returning it.
    pub fn remove(&mut self, id: OrderId) -> Option<MarketOrder> {
        if let Some(pos) = self.buys.iter().position(|o| o.id == id) {
            return Some(self.buys.remove(pos));
        }
        if let Some(pos) = self.sells.iter().position(|o| o.id == id) {
            return Some(self.sells.remove(pos));
        }
        None
    }

    /// Find an order by ID.
    pub fn find(&self, id: OrderId) -> Option<&MarketOrder> {
        self.orders().find(|o| o.id == id)
    }

    /// Run matching to quiescence.
    ///
    /// While the best buy price is at or above the best sell price, trade
    /// `min(remaining)` at the maker's price. The maker is whichever order
    /// rested first (earlier tick, then earlier ID). Fully filled orders
    /// are removed; partial fills stay at book front.
    ///
    /// Wash pairs -- the same player on both sides -- never trade: the
    /// taker side is set aside for the rest of this matching pass and
    /// re-inserted afterwards, so it can still match other counterparties
    /// on a later pass.
    pub fn match_orders(&mut self) -> Vec<Trade> {
        let mut trades = Vec::new();
        let mut set_aside: Vec<MarketOrder> = Vec::new();

        loop {
            let (Some(buy), Some(sell)) = (self.buys.first(), self.sells.first()) else {
                break;
            };
            if buy.price < sell.price {
                break;
            }

            // Maker is the earlier order; the taker takes the maker price.
            let buy_is_maker = (buy.created_tick, buy.id) <= (sell.created_tick, sell.id);

            if buy.owner == sell.owner {
                // Wash pair: withhold the taker from this pass.
                let taker = if buy_is_maker {
                    self.sells.remove(0)
                } else {
                    self.buys.remove(0)
                };
                set_aside.push(taker);
                continue;
            }

            let price = if buy_is_maker { buy.price } else { sell.price };
            let quantity = buy.remaining.min(sell.remaining);

            trades.push(Trade {
                buy_order: buy.id,
                sell_order: sell.id,
                buyer: buy.owner,
                seller: sell.owner,
                zone: buy.zone,
                resource: buy.resource,
                price,
                quantity,
                buyer_limit: buy.price,
            });

            self.decrement_front(OrderSide::Buy, quantity);
            self.decrement_front(OrderSide::Sell, quantity);
        }

        for order in set_aside {
            self.insert(order);
        }
        trades
    }

    /// Reduce the front order of a side by `quantity`, removing it when
    /// fully filled.
    fn decrement_front(&mut self, side: OrderSide, quantity: u32) {
        let list = match side {
            OrderSide::Buy => &mut self.buys,
            OrderSide::Sell => &mut self.sells,
        };
        if let Some(front) = list.first_mut() {
            front.remaining = front.remaining.saturating_sub(quantity);
            if front.remaining == 0 {
                list.remove(0);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(
        owner: PlayerId,
        side: OrderSide,
        price: i64,
        qty: u32,
        tick: u64,
    ) -> MarketOrder {
        MarketOrder {
            id: OrderId::new(),
            owner,
            zone: ZoneId::new(),
            resource: Resource::Ore,
            side,
            price,
            remaining: qty,
            original: qty,
            created_tick: tick,
        }
    }

    #[test]
    fn crossing_orders_trade_at_maker_price() {
        let seller = PlayerId::new();
        let buyer = PlayerId::new();
        let mut book = Book::new();
        // Sell 50 @ 12 rests first; Buy 30 @ 14 arrives later.
        book.insert(order(seller, OrderSide::Sell, 12, 50, 10));
        book.insert(order(buyer, OrderSide::Buy, 14, 30, 11));

        let trades = book.match_orders();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 12, "taker takes maker's price");
        assert_eq!(trades[0].quantity, 30);
        assert_eq!(trades[0].buyer_limit, 14);

        // Seller's remainder rests at 20 @ 12; buy side is empty.
        let rest: Vec<&MarketOrder> = book.orders().collect();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].remaining, 20);
        assert_eq!(rest[0].price, 12);
    }

    #[test]
    fn non_crossing_orders_rest() {
        let mut book = Book::new();
        book.insert(order(PlayerId::new(), OrderSide::Sell, 15, 10, 1));
        book.insert(order(PlayerId::new(), OrderSide::Buy, 14, 10, 2));
        assert!(book.match_orders().is_empty());
        assert_eq!(book.orders().count(), 2);
    }

    #[test]
    fn price_priority_beats_time_priority() {
        let seller = PlayerId::new();
        let mut book = Book::new();
        let cheap = order(PlayerId::new(), OrderSide::Sell, 10, 5, 5);
        let cheap_id = cheap.id;
        book.insert(order(seller, OrderSide::Sell, 12, 5, 1));
        book.insert(cheap);
        book.insert(order(PlayerId::new(), OrderSide::Buy, 12, 5, 6));

        let trades = book.match_orders();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sell_order, cheap_id, "cheapest ask fills first");
        assert_eq!(trades[0].price, 10);
    }

    #[test]
    fn wash_trades_are_withheld() {
        let player = PlayerId::new();
        let mut book = Book::new();
        book.insert(order(player, OrderSide::Sell, 10, 10, 1));
        book.insert(order(player, OrderSide::Buy, 12, 10, 2));

        let trades = book.match_orders();
        assert!(trades.is_empty());
        // Both orders still rest for other counterparties.
        assert_eq!(book.orders().count(), 2);
    }

    #[test]
    fn wash_pair_does_not_block_other_counterparties() {
        let player = PlayerId::new();
        let other = PlayerId::new();
        let mut book = Book::new();
        book.insert(order(player, OrderSide::Sell, 10, 10, 1));
        book.insert(order(player, OrderSide::Buy, 12, 10, 2));
        book.insert(order(other, OrderSide::Buy, 11, 10, 3));

        let trades = book.match_orders();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buyer, other);
        assert_eq!(trades[0].seller, player);
        assert_eq!(trades[0].price, 10);
    }

    #[test]
    fn multiple_fills_sweep_the_book() {
        let buyer = PlayerId::new();
        let mut book = Book::new();
        book.insert(order(PlayerId::new(), OrderSide::Sell, 10, 5, 1));
        book.insert(order(PlayerId::new(), OrderSide::Sell, 11, 5, 2));
        book.insert(order(buyer, OrderSide::Buy, 11, 8, 3));

        let trades = book.match_orders();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, 10);
        assert_eq!(trades[0].quantity, 5);
        assert_eq!(trades[1].price, 11);
        assert_eq!(trades[1].quantity, 3);

        let rest: Vec<&MarketOrder> = book.orders().collect();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].remaining, 2);
    }
}
