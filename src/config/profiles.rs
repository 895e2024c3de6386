use serde::{Deserialize, Serialize};

use crate::types::FeeTier;

/// Fee schedule levels offered in the parameter form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeTierProfile {
    /// Regular user, default level. Matches the backend's own fallback rates.
    RegularLv1,
    RegularLv2,
    RegularLv3,
    RegularLv4,
    RegularLv5,
    /// Entry VIP level
    Vip1,
}

impl FeeTierProfile {
    pub fn all() -> Vec<FeeTierProfile> {
        vec![
            Self::RegularLv1,
            Self::RegularLv2,
            Self::RegularLv3,
            Self::RegularLv4,
            Self::RegularLv5,
            Self::Vip1,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            Self::RegularLv1 => "Regular Lv1",
            Self::RegularLv2 => "Regular Lv2",
            Self::RegularLv3 => "Regular Lv3",
            Self::RegularLv4 => "Regular Lv4",
            Self::RegularLv5 => "Regular Lv5",
            Self::Vip1 => "VIP 1",
        }
    }

    pub fn rates(&self) -> FeeTier {
        let (maker, taker) = match self {
            Self::RegularLv1 => (0.0008, 0.0010),
            Self::RegularLv2 => (0.0007, 0.0009),
            Self::RegularLv3 => (0.0006, 0.0008),
            Self::RegularLv4 => (0.0005, 0.0007),
            Self::RegularLv5 => (0.0004, 0.0006),
            Self::Vip1 => (0.00035, 0.0005),
        };
        FeeTier { maker, taker }
    }

    pub fn preset(&self) -> FeeTierPreset {
        let rates = self.rates();
        FeeTierPreset {
            name: self.name().to_string(),
            maker: rates.maker,
            taker: rates.taker,
        }
    }
}

/// A selectable fee tier, as stored in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTierPreset {
    pub name: String,
    pub maker: f64,
    pub taker: f64,
}

impl FeeTierPreset {
    pub fn rates(&self) -> FeeTier {
        FeeTier {
            maker: self.maker,
            taker: self.taker,
        }
    }

    /// Rates as percentages, for listings.
    pub fn describe(&self) -> String {
        format!(
            "{} (maker {:.3}%, taker {:.3}%)",
            self.name,
            self.maker * 100.0,
            self.taker * 100.0
        )
    }
}

pub fn default_presets() -> Vec<FeeTierPreset> {
    FeeTierProfile::all().iter().map(|p| p.preset()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets() {
        let presets = default_presets();
        assert_eq!(presets.len(), 6);
        assert_eq!(presets[0].name, "Regular Lv1");
        assert_eq!(presets[0].rates(), FeeTier { maker: 0.0008, taker: 0.0010 });
    }

    #[test]
    fn test_profiles_get_cheaper() {
        let presets = default_presets();
        for pair in presets.windows(2) {
            assert!(pair[1].taker < pair[0].taker);
            assert!(pair[1].maker < pair[0].maker);
        }
    }

    #[test]
    fn test_describe() {
        let preset = FeeTierProfile::RegularLv1.preset();
        assert_eq!(preset.describe(), "Regular Lv1 (maker 0.080%, taker 0.100%)");
    }
}
