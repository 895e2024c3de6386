use chrono::Local;
use std::io::{self, Write};
use tracing::{debug, error};

use super::commands::{Command, HELP};
use super::form::ParameterForm;
use crate::config::RuntimeConfig;
use crate::connection::{ConnectionManager, Event, Frontend, StatusUpdate, Transport};
use crate::dashboard::Dashboard;
use crate::types::TradeParameters;

/// Whether the dispatch loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Form plus dashboard: everything the connection manager reports to.
pub struct Session {
    pub form: ParameterForm,
    pub dashboard: Dashboard,
    dirty: bool,
}

impl Session {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            form: ParameterForm::new(&config.form, config.fee_tiers.clone()),
            dashboard: Dashboard::new(),
            dirty: false,
        }
    }

    /// True once since the last call if anything visible changed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn execute<T: Transport>(
        &mut self,
        command: Command,
        manager: &mut ConnectionManager<T>,
        out: &mut impl Write,
    ) -> io::Result<Flow> {
        debug!(?command, "Executing command");

        match command {
            Command::Quantity(text) => {
                self.form.set_quantity(&text);
                writeln!(
                    out,
                    "Quantity (USD): {} -> {}",
                    self.form.quantity_text(),
                    self.form.read().quantity_usd
                )?;
            }
            Command::Volatility(text) => {
                self.form.set_volatility(&text);
                writeln!(
                    out,
                    "Volatility: {} -> {}",
                    self.form.volatility_text(),
                    self.form.read().volatility
                )?;
            }
            Command::Tier(selector) => match self.form.select_tier(&selector) {
                Ok(preset) => writeln!(out, "Fee tier: {}", preset.describe())?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            Command::Send => manager.handle(Event::SendRequested, self),
            Command::Connect => manager.handle(Event::ConnectRequested, self),
            Command::Disconnect => manager.handle(Event::DisconnectRequested, self),
            Command::Show => write!(out, "{}", self.dashboard)?,
            Command::Raw => {
                if self.dashboard.raw_message.is_empty() {
                    writeln!(out, "No message received yet")?;
                } else {
                    writeln!(out, "{}", self.dashboard.raw_message)?;
                }
            }
            Command::Tiers => {
                for (i, preset) in self.form.presets().iter().enumerate() {
                    let marker = if i == self.form.selected_index() { "*" } else { " " };
                    writeln!(out, "{} {}: {}", marker, i, preset.describe())?;
                }
            }
            Command::Status => {
                writeln!(
                    out,
                    "{} [{}] url={} attempt={} messages={} decode_errors={}",
                    self.dashboard.status.text,
                    manager.state(),
                    manager.url(),
                    manager.generation(),
                    self.dashboard.messages_received,
                    self.dashboard.decode_errors
                )?;
                if manager.has_pending_reconnect() {
                    writeln!(out, "Reconnect pending")?;
                }
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }
}

impl Frontend for Session {
    fn set_status(&mut self, status: &StatusUpdate) {
        self.dashboard.set_status(status);
        self.dirty = true;
    }

    fn parameters(&self) -> TradeParameters {
        self.form.read()
    }

    fn deliver(&mut self, text: &str) {
        if let Err(e) = self.dashboard.apply_message(text, Local::now()) {
            error!("Error parsing message: {}", e);
        }
        self.dirty = true;
    }
}
