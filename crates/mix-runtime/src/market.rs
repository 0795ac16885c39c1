//! Market condition providers used at the loop boundary.

use mix_core::{ChannelTable, MarketConditions};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of market conditions for each tick.
pub trait MarketProvider {
    /// Conditions for the given one-based tick.
    fn conditions(&mut self, tick: u64) -> MarketConditions;
}

/// Replays the same conditions every tick.
#[derive(Clone, Debug)]
pub struct FixedMarket(pub MarketConditions);

impl MarketProvider for FixedMarket {
    fn conditions(&mut self, _tick: u64) -> MarketConditions {
        self.0.clone()
    }
}

/// Seeded noise around a baseline; reproducible for a given seed.
#[derive(Clone, Debug)]
pub struct SeededMarket {
    rng: ChaCha8Rng,
    noise_frac: f64,
    competitor_baseline: ChannelTable<f64>,
}

impl SeededMarket {
    /// `noise_frac` is clamped into [0, 0.9].
    pub fn new(seed: u64, noise_frac: f64, competitor_baseline: ChannelTable<f64>) -> Self {
        let noise_frac = if noise_frac.is_finite() {
            noise_frac.clamp(0.0, 0.9)
        } else {
            0.0
        };
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise_frac,
            competitor_baseline,
        }
    }

    fn jitter(&mut self, scale: f64) -> f64 {
        let spread = self.noise_frac * scale;
        if spread == 0.0 {
            return 1.0;
        }
        1.0 + self.rng.gen_range(-spread..=spread)
    }
}

impl MarketProvider for SeededMarket {
    fn conditions(&mut self, _tick: u64) -> MarketConditions {
        let seasonality_index = self.jitter(1.0);
        let economic_index = self.jitter(0.5);
        let baseline = self.competitor_baseline.clone();
        let competitor_spend = baseline.map(|_, &b| (b * self.jitter(1.0)).max(0.0));
        MarketConditions {
            seasonality_index,
            competitor_spend,
            economic_index,
        }
    }
}
