//! Orderbook snapshots as returned by `GET /v2/orderbook`.

use {
    crate::order::SignedOrder,
    alloy::primitives::{U256, U512},
    serde::{Deserialize, Deserializer, Serialize},
    std::cmp::Ordering,
};

/// An order as listed by the relayer, with whatever metadata it attaches.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order: SignedOrder,
    #[serde(default)]
    pub meta_data: serde_json::Value,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    /// Sells the base asset: maker asset is base, taker asset is quote.
    Ask,
    /// Buys the base asset: maker asset is quote, taker asset is base.
    Bid,
}

/// A finite snapshot of the resting orders for one asset pair.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OrderBook {
    #[serde(default, deserialize_with = "records")]
    pub bids: Vec<OrderRecord>,
    #[serde(default, deserialize_with = "records")]
    pub asks: Vec<OrderRecord>,
}

impl OrderBook {
    /// Orders asks from the cheapest and bids from the highest price. Orders
    /// with equal prices keep the relayer's order. Orders without a price
    /// (a zero base or quote amount in the denominator) go last on both sides.
    pub fn sorted(mut self) -> Self {
        self.asks
            .sort_by(|a, b| compare_prices(&a.order, &b.order, Side::Ask));
        self.bids
            .sort_by(|a, b| compare_prices(&a.order, &b.order, Side::Bid));
        self
    }
}

/// Price of an order in quote per base as a fraction `(numerator,
/// denominator)`.
pub fn price(order: &SignedOrder, side: Side) -> (U256, U256) {
    let order = &order.order;
    match side {
        Side::Ask => (order.taker_asset_amount, order.maker_asset_amount),
        Side::Bid => (order.maker_asset_amount, order.taker_asset_amount),
    }
}

/// Best price first: ascending for asks, descending for bids. Prices are
/// compared exactly by cross multiplying in 512 bits, which is only a total
/// order for non-zero denominators.
fn compare_prices(a: &SignedOrder, b: &SignedOrder, side: Side) -> Ordering {
    let (a_num, a_den) = price(a, side);
    let (b_num, b_den) = price(b, side);
    match (a_den.is_zero(), b_den.is_zero()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let lhs = U512::from(a_num) * U512::from(b_den);
            let rhs = U512::from(b_num) * U512::from(a_den);
            match side {
                Side::Ask => lhs.cmp(&rhs),
                Side::Bid => rhs.cmp(&lhs),
            }
        }
    }
}

/// Accepts both the paginated SRA collection and a bare list of records.
fn records<'de, D>(deserializer: D) -> Result<Vec<OrderRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Records {
        Paginated { records: Vec<OrderRecord> },
        Bare(Vec<OrderRecord>),
    }

    Ok(match Records::deserialize(deserializer)? {
        Records::Paginated { records } => records,
        Records::Bare(records) => records,
    })
}
