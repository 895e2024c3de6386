use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::profiles::{default_presets, FeeTierPreset};

pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:8000";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub backend: BackendSettings,
    pub form: FormSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
    pub fee_tiers: Vec<FeeTierPreset>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            form: FormSettings::default(),
            display: DisplaySettings::default(),
            logging: LoggingSettings::default(),
            fee_tiers: default_presets(),
        }
    }
}

impl RuntimeConfig {
    /// The backend URL is not checked here: a bad URL surfaces as a socket
    /// construction failure at connect time.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.backend.reconnect_delay_ms == 0 {
            errors.push("backend.reconnect_delay_ms must be > 0".to_string());
        }

        if self.fee_tiers.is_empty() {
            errors.push("at least one fee tier must be configured".to_string());
        }
        for tier in &self.fee_tiers {
            if tier.maker < 0.0 || tier.taker < 0.0 {
                errors.push(format!("fee tier '{}': rates must be >= 0", tier.name));
            }
        }
        if !self.fee_tiers.is_empty() && self.form.fee_tier >= self.fee_tiers.len() {
            errors.push(format!(
                "form.fee_tier {} is out of range (0..{})",
                self.form.fee_tier,
                self.fee_tiers.len()
            ));
        }

        if self.display.render_interval_ms == 0 {
            errors.push("display.render_interval_ms must be > 0".to_string());
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    pub url: String,
    pub reconnect_delay_ms: u64,
}

impl BackendSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

/// Initial contents of the parameter form. Quantity and volatility are kept
/// as text, like any other user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSettings {
    pub quantity_usd: String,
    pub volatility: String,
    pub fee_tier: usize,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            quantity_usd: "1000".to_string(),
            volatility: "60".to_string(),
            fee_tier: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub render_interval_ms: u64,
}

impl DisplaySettings {
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            render_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
