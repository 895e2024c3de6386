use serde::Serialize;

use super::format::{dollars_fixed, dollars_grouped, fixed, grouped, plain};
use crate::types::{top_levels, MetricsSnapshot, OrderBookLevel};

pub const NOT_AVAILABLE: &str = "N/A";
pub const ZERO_AMOUNT: &str = "0.00";
pub const ZERO_LATENCY: &str = "0.00 ms";
pub const BOOK_HEADER: [&str; 2] = ["Price", "Quantity"];

/// Display text for every metric field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsView {
    pub best_bid: String,
    pub best_ask: String,
    pub mid_price: String,
    pub expected_slippage: String,
    pub expected_fees: String,
    pub market_impact: String,
    pub net_cost: String,
    pub maker_taker: String,
    pub internal_latency: String,
    pub last_update: String,
}

impl MetricsView {
    /// Each field falls back independently when the snapshot lacks it.
    pub fn render(snapshot: &MetricsSnapshot) -> Self {
        let price_1dp = |v: Option<f64>| {
            v.map(|v| dollars_grouped(v, 1))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let amount = |v: Option<f64>| {
            v.map(|v| dollars_fixed(v, 2))
                .unwrap_or_else(|| ZERO_AMOUNT.to_string())
        };
        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            best_bid: price_1dp(snapshot.best_bid),
            best_ask: price_1dp(snapshot.best_ask),
            mid_price: snapshot
                .mid_price
                .map(|v| dollars_grouped(v, 2))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            expected_slippage: amount(snapshot.expected_slippage),
            expected_fees: amount(snapshot.expected_fees),
            market_impact: amount(snapshot.market_impact),
            net_cost: amount(snapshot.net_cost),
            maker_taker: text(&snapshot.maker_taker),
            internal_latency: snapshot
                .internal_latency
                .map(|v| format!("{} ms", fixed(v, 2)))
                .unwrap_or_else(|| ZERO_LATENCY.to_string()),
            last_update: text(&snapshot.last_update),
        }
    }

    /// Label/value pairs in display order.
    pub fn rows(&self) -> [(&'static str, &str); 10] {
        [
            ("Best Bid", self.best_bid.as_str()),
            ("Best Ask", self.best_ask.as_str()),
            ("Mid Price", self.mid_price.as_str()),
            ("Expected Slippage", self.expected_slippage.as_str()),
            ("Expected Fees", self.expected_fees.as_str()),
            ("Market Impact", self.market_impact.as_str()),
            ("Net Cost", self.net_cost.as_str()),
            ("Maker/Taker", self.maker_taker.as_str()),
            ("Internal Latency", self.internal_latency.as_str()),
            ("Last Update", self.last_update.as_str()),
        ]
    }
}

impl Default for MetricsView {
    fn default() -> Self {
        Self::render(&MetricsSnapshot::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRow {
    pub price: String,
    pub quantity: String,
}

/// One side of the book as shown: a fixed header plus at most five rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderBookTable {
    pub rows: Vec<BookRow>,
}

impl OrderBookTable {
    /// Rebuilt from scratch on every message; no diffing against the
    /// previous table.
    pub fn from_levels(levels: &[OrderBookLevel]) -> Self {
        let rows = top_levels(levels)
            .iter()
            .map(|level| BookRow {
                price: grouped(level.price, 1),
                quantity: plain(level.quantity),
            })
            .collect();
        Self { rows }
    }

    pub fn header(&self) -> [&'static str; 2] {
        BOOK_HEADER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back() {
        let view = MetricsView::render(&MetricsSnapshot::default());
        assert_eq!(view.best_bid, "N/A");
        assert_eq!(view.best_ask, "N/A");
        assert_eq!(view.mid_price, "N/A");
        assert_eq!(view.expected_slippage, "0.00");
        assert_eq!(view.net_cost, "0.00");
        assert_eq!(view.maker_taker, "N/A");
        assert_eq!(view.internal_latency, "0.00 ms");
        assert_eq!(view.last_update, "N/A");
    }

    #[test]
    fn test_best_bid_one_decimal() {
        let snapshot = MetricsSnapshot {
            best_bid: Some(100.0),
            ..Default::default()
        };
        assert_eq!(MetricsView::render(&snapshot).best_bid, "$100.0");
    }

    #[test]
    fn test_populated_fields() {
        let snapshot = MetricsSnapshot {
            best_bid: Some(95000.1),
            best_ask: Some(95000.2),
            mid_price: Some(95000.15),
            expected_slippage: Some(0.5),
            expected_fees: Some(1.0),
            market_impact: Some(0.034),
            net_cost: Some(1534.0),
            maker_taker: Some("Taker: 100%, Maker: 0%".to_string()),
            internal_latency: Some(0.416),
            last_update: Some("2025-05-01T12:00:00Z".to_string()),
            ..Default::default()
        };

        let view = MetricsView::render(&snapshot);
        assert_eq!(view.best_bid, "$95,000.1");
        assert_eq!(view.best_ask, "$95,000.2");
        assert_eq!(view.mid_price, "$95,000.15");
        assert_eq!(view.expected_slippage, "$0.50");
        assert_eq!(view.expected_fees, "$1.00");
        assert_eq!(view.market_impact, "$0.03");
        assert_eq!(view.net_cost, "$1534.00");
        assert_eq!(view.maker_taker, "Taker: 100%, Maker: 0%");
        assert_eq!(view.internal_latency, "0.42 ms");
        assert_eq!(view.last_update, "2025-05-01T12:00:00Z");
    }

    #[test]
    fn test_book_table_truncates_in_order() {
        let levels: Vec<OrderBookLevel> = (0..8)
            .map(|i| OrderBookLevel::new(95000.0 + i as f64, 0.5 + i as f64))
            .collect();

        let table = OrderBookTable::from_levels(&levels);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.header(), ["Price", "Quantity"]);
        assert_eq!(
            table.rows[0],
            BookRow {
                price: "95,000.0".to_string(),
                quantity: "0.5".to_string()
            }
        );
        assert_eq!(table.rows[4].price, "95,004.0");
        assert_eq!(table.rows[4].quantity, "4.5");
    }

    #[test]
    fn test_empty_book() {
        assert!(OrderBookTable::from_levels(&[]).rows.is_empty());
    }
}
