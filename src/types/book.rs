use serde_json::Value;

use super::metrics::number_from_value;
use crate::errors::{ClientError, ClientResult};

/// Levels shown per side of the book.
pub const BOOK_DEPTH: usize = 5;

/// Order book level (bid or ask)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBookLevel {
    pub price: f64,
    pub quantity: f64,
}

impl OrderBookLevel {
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }

    /// Accepts `[price, qty]` as well as the exchange's longer
    /// `[price, qty, liquidated, orders]` form; numbers may arrive as strings.
    pub fn from_row(row: &Value) -> ClientResult<Self> {
        let raw = row
            .as_array()
            .ok_or_else(|| ClientError::Decode(format!("expected a [price, quantity] row, got {}", row)))?;
        if raw.len() < 2 {
            return Err(ClientError::Decode(format!(
                "expected at least [price, quantity], got {} element(s)",
                raw.len()
            )));
        }
        Ok(Self::new(number_from_value(&raw[0])?, number_from_value(&raw[1])?))
    }
}


/// First `BOOK_DEPTH` levels in the order the sender provided them.
pub fn top_levels(levels: &[OrderBookLevel]) -> &[OrderBookLevel] {
    &levels[..levels.len().min(BOOK_DEPTH)]
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_level_from_pair_and_okx_row() {
        let plain = OrderBookLevel::from_row(&json!([95000.5, 1.25])).unwrap();
        assert_eq!(plain, OrderBookLevel::new(95000.5, 1.25));

        let okx = OrderBookLevel::from_row(&json!(["95000.1", "0.5", "0", "3"])).unwrap();
        assert_eq!(okx, OrderBookLevel::new(95000.1, 0.5));
    }

    #[test]
    fn test_level_rejects_short_or_garbage_rows() {
        assert!(OrderBookLevel::from_row(&json!([1.0])).is_err());
        assert!(OrderBookLevel::from_row(&json!(["abc", 1])).is_err());
        assert!(OrderBookLevel::from_row(&json!({"price": 1})).is_err());
    }

    #[test]
    fn test_top_levels_keeps_order() {
        let levels: Vec<OrderBookLevel> = (0..8)
            .map(|i| OrderBookLevel::new(100.0 + i as f64, 1.0))
            .collect();

        let top = top_levels(&levels);
        assert_eq!(top.len(), BOOK_DEPTH);
        assert_eq!(top[0].price, 100.0);
        assert_eq!(top[4].price, 104.0);

        assert_eq!(top_levels(&levels[..2]).len(), 2);
    }
}
