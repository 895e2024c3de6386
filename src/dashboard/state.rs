use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::render::{MetricsView, OrderBookTable};
use crate::connection::StatusUpdate;
use crate::errors::{ClientError, ClientResult};
use crate::types::MetricsSnapshot;

const LABEL_WIDTH: usize = 20;
const COLUMN_WIDTH: usize = 14;

/// Everything the dashboard shows. Only the dispatch loop mutates it.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub status: StatusUpdate,
    pub metrics: MetricsView,
    pub asks: OrderBookTable,
    pub bids: OrderBookTable,
    pub raw_message: String,
    pub messages_received: u64,
    pub decode_errors: u64,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            status: StatusUpdate::idle(),
            metrics: MetricsView::default(),
            asks: OrderBookTable::default(),
            bids: OrderBookTable::default(),
            raw_message: String::new(),
            messages_received: 0,
            decode_errors: 0,
        }
    }

    pub fn set_status(&mut self, status: &StatusUpdate) {
        self.status = status.clone();
    }

    /// Replaces every metric and both book tables with what `text` carries.
    /// Fields with bad values fall back on their own. Only text that is not
    /// JSON leaves the previous metrics in place, reported in the
    /// raw-message area.
    pub fn apply_message(&mut self, text: &str, received_at: DateTime<Local>) -> ClientResult<()> {
        self.messages_received += 1;
        let stamp = format!("Last message: {}", received_at.format("%-I:%M:%S %p"));

        let decoded = serde_json::from_str::<Value>(text)
            .map_err(ClientError::from)
            .and_then(|value| MetricsSnapshot::from_value(&value).map(|snapshot| (value, snapshot)));

        match decoded {
            Ok((value, snapshot)) => {
                let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string());
                self.raw_message = format!("{}\n{}", stamp, pretty);
                self.metrics = MetricsView::render(&snapshot);
                self.asks = OrderBookTable::from_levels(&snapshot.asks);
                self.bids = OrderBookTable::from_levels(&snapshot.bids);
                Ok(())
            }
            Err(e) => {
                self.decode_errors += 1;
                self.raw_message = format!("{}\n\nError parsing message: {}", stamp, text);
                Err(e)
            }
        }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Trade Simulator ===")?;
        writeln!(
            f,
            "Status: {} [{}]",
            self.status.text,
            self.status.state.style_class()
        )?;
        writeln!(f)?;

        for (label, value) in self.metrics.rows() {
            writeln!(f, "{:<width$}{}", format!("{}:", label), value, width = LABEL_WIDTH)?;
        }

        for (title, table) in [("Asks", &self.asks), ("Bids", &self.bids)] {
            writeln!(f)?;
            writeln!(f, "{}", title)?;
            let [price, quantity] = table.header();
            writeln!(f, "{:<width$}{:>width$}", price, quantity, width = COLUMN_WIDTH)?;
            for row in &table.rows {
                writeln!(
                    f,
                    "{:<width$}{:>width$}",
                    row.price,
                    row.quantity,
                    width = COLUMN_WIDTH
                )?;
            }
        }
        Ok(())
    }
}
