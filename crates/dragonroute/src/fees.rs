use crate::errors::DragonrouteError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pool fee in hundredths of a basis point (3000 = 0.3%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeTier(u32);

pub const LOWEST: FeeTier = FeeTier(100);
pub const LOW: FeeTier = FeeTier(500);
pub const MEDIUM: FeeTier = FeeTier(1_000);
pub const HIGH: FeeTier = FeeTier(3_000);
pub const HIGHEST: FeeTier = FeeTier(10_000);

/// Every fee tier DragonSwap V3 deploys pools for, lowest first.
pub const DRAGONSWAP_FEE_TIERS: [FeeTier; 5] = [LOWEST, LOW, MEDIUM, HIGH, HIGHEST];

impl FeeTier {
    pub fn parse(pips: u32) -> Result<Self, DragonrouteError> {
        DRAGONSWAP_FEE_TIERS
            .iter()
            .copied()
            .find(|t| t.0 == pips)
            .ok_or(DragonrouteError::InvalidFeeTier(pips))
    }

    pub const fn pips(self) -> u32 {
        self.0
    }

    pub const fn name(self) -> &'static str {
        match self.0 {
            100 => "LOWEST",
            500 => "LOW",
            1_000 => "MEDIUM",
            3_000 => "HIGH",
            10_000 => "HIGHEST",
            _ => "CUSTOM",
        }
    }

    pub const fn description(self) -> &'static str {
        match self.0 {
            100 => "best for very stable pairs",
            500 => "best for stable pairs",
            1_000 => "best for most pairs",
            3_000 => "best for volatile pairs",
            10_000 => "best for exotic pairs",
            _ => "non-standard fee tier",
        }
    }

    pub const fn tick_spacing(self) -> Option<i32> {
        match self.0 {
            100 => Some(1),
            500 => Some(10),
            1_000 => Some(20),
            3_000 => Some(60),
            10_000 => Some(200),
            _ => None,
        }
    }

    /// "0.05%" style label, computed without floats.
    pub fn percent(self) -> String {
        let hundredths_bp = self.0;
        let whole = hundredths_bp / 10_000;
        let mut frac = format!("{:04}", hundredths_bp % 10_000);
        while frac.ends_with('0') {
            frac.pop();
        }
        if frac.is_empty() {
            format!("{whole}%")
        } else {
            format!("{whole}.{frac}%")
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.percent(), self.name())
    }
}
