use crate::config::{FeeTierPreset, FormSettings};
use crate::errors::{ClientError, ClientResult};
use crate::types::{coerce_number, TradeParameters};

/// The parameter form: raw text for the two numeric inputs and a selection
/// among the configured fee tiers.
#[derive(Debug, Clone)]
pub struct ParameterForm {
    quantity_usd: String,
    volatility: String,
    tier: usize,
    presets: Vec<FeeTierPreset>,
}

impl ParameterForm {
    pub fn new(settings: &FormSettings, presets: Vec<FeeTierPreset>) -> Self {
        let tier = settings.fee_tier.min(presets.len().saturating_sub(1));
        Self {
            quantity_usd: settings.quantity_usd.clone(),
            volatility: settings.volatility.clone(),
            tier,
            presets,
        }
    }

    pub fn set_quantity(&mut self, text: &str) {
        self.quantity_usd = text.trim().to_string();
    }

    pub fn set_volatility(&mut self, text: &str) {
        self.volatility = text.trim().to_string();
    }

    /// Selects a tier by index or by case-insensitive name.
    pub fn select_tier(&mut self, selector: &str) -> ClientResult<&FeeTierPreset> {
        let selector = selector.trim();
        let index = match selector.parse::<usize>() {
            Ok(index) if index < self.presets.len() => Some(index),
            _ => self
                .presets
                .iter()
                .position(|p| p.name.eq_ignore_ascii_case(selector)),
        };

        let index = index.ok_or_else(|| ClientError::UnknownFeeTier {
            selector: selector.to_string(),
        })?;
        self.tier = index;
        Ok(&self.presets[index])
    }

    pub fn quantity_text(&self) -> &str {
        &self.quantity_usd
    }

    pub fn volatility_text(&self) -> &str {
        &self.volatility
    }

    pub fn selected_index(&self) -> usize {
        self.tier
    }

    pub fn selected(&self) -> Option<&FeeTierPreset> {
        self.presets.get(self.tier)
    }

    pub fn presets(&self) -> &[FeeTierPreset] {
        &self.presets
    }

    /// Reads the form as it stands now. Unparseable numbers become zero;
    /// nothing is rejected.
    pub fn read(&self) -> TradeParameters {
        let fee_tier = self
            .selected()
            .map(FeeTierPreset::rates)
            .unwrap_or_default();

        TradeParameters {
            quantity_usd: coerce_number(&self.quantity_usd),
            volatility: coerce_number(&self.volatility),
            fee_tier,
        }
    }
}
