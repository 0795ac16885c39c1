#![deny(warnings)]

//! Response curves: how channel spend turns into marketing effectiveness.
//!
//! This crate provides the pure building blocks of the response engine:
//! - Adstock carry-over of spend between ticks
//! - Hill saturation for diminishing returns
//! - Directed cross-channel synergy multipliers

use mix_core::{Channel, ChannelTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when building response configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ResponseError {
    /// Synergy coefficients must be finite and strictly positive.
    #[error("invalid synergy coefficient {value} for {target} <- {other}")]
    InvalidCoefficient {
        target: Channel,
        other: Channel,
        value: f64,
    },
    /// A channel cannot carry a synergy coefficient onto itself.
    #[error("self synergy is not allowed for {0}")]
    SelfSynergy(Channel),
}

/// Largest value below 1.0; saturation never reports full saturation.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Carry spend over from the previous tick.
///
/// `spend + decay_rate * previous`, with `decay_rate` in [0, 1).
///
/// Example:
/// assert_eq!(adstock(100.0, 50.0, 0.5), 125.0);
pub fn adstock(spend: f64, previous: f64, decay_rate: f64) -> f64 {
    spend + decay_rate * previous
}

/// Hill saturation of adstocked spend: `x^n / (S^n + x^n)`.
///
/// Returns exactly 0.5 at `x == S`, is increasing in `x` and stays below 1.
///
/// Example:
/// assert_eq!(saturation(100.0, 100.0, 2.0), 0.5);
pub fn saturation(adstocked: f64, half_saturation: f64, shape: f64) -> f64 {
    if adstocked <= 0.0 {
        return 0.0;
    }
    let xn = adstocked.powf(shape);
    let sn = half_saturation.powf(shape);
    (xn / (sn + xn)).min(BELOW_ONE)
}

/// One directed entry of the synergy table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynergyPair {
    /// Channel whose response is adjusted.
    pub target: Channel,
    /// Channel whose activity causes the adjustment.
    pub other: Channel,
    /// Multiplier applied to `target` while `other` is active.
    pub coefficient: f64,
}

/// Directed Channel x Channel synergy coefficients.
///
/// Entries not listed are 1.0 (no interaction). The table is not required
/// to be symmetric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SynergyPair>", into = "Vec<SynergyPair>")]
pub struct SynergyMatrix {
    coefficients: ChannelTable<ChannelTable<f64>>,
}

impl SynergyMatrix {
    /// A matrix with no interactions.
    pub fn identity() -> Self {
        Self {
            coefficients: ChannelTable::from_fn(|_| ChannelTable::from_fn(|_| 1.0)),
        }
    }

    /// Set the coefficient `other` applies to `target`.
    pub fn with_coefficient(
        mut self,
        target: Channel,
        other: Channel,
        coefficient: f64,
    ) -> Result<Self, ResponseError> {
        if target == other {
            return Err(ResponseError::SelfSynergy(target));
        }
        if !coefficient.is_finite() || coefficient <= 0.0 {
            return Err(ResponseError::InvalidCoefficient {
                target,
                other,
                value: coefficient,
            });
        }
        self.coefficients[target][other] = coefficient;
        Ok(self)
    }

    /// Coefficient `other` applies to `target`.
    pub fn coefficient(&self, target: Channel, other: Channel) -> f64 {
        self.coefficients[target][other]
    }

    /// Product of coefficients from every other active channel onto `target`.
    ///
    /// Exactly 1.0 when no other channel is active.
    pub fn multiplier(&self, target: Channel, active: &[Channel]) -> f64 {
        active
            .iter()
            .filter(|&&other| other != target)
            .map(|&other| self.coefficient(target, other))
            .product()
    }

    /// Adjust saturated responses for the channels active this tick.
    ///
    /// Inactive channels keep their base response.
    pub fn apply(&self, responses: &ChannelTable<f64>, active: &[Channel]) -> ChannelTable<f64> {
        responses.map(|channel, &base| {
            if active.contains(&channel) {
                base * self.multiplier(channel, active)
            } else {
                base
            }
        })
    }

    /// Non-identity entries in table order.
    pub fn pairs(&self) -> Vec<SynergyPair> {
        let mut out = Vec::new();
        for (target, row) in self.coefficients.iter() {
            for (other, &coefficient) in row.iter() {
                if target != other && coefficient != 1.0 {
                    out.push(SynergyPair {
                        target,
                        other,
                        coefficient,
                    });
                }
            }
        }
        out
    }
}

impl Default for SynergyMatrix {
    fn default() -> Self {
        use Channel::*;
        let defaults = [
            (Tv, Pr, 1.2),
            (Pr, Tv, 1.1),
            (Tv, Digital, 1.1),
            (Digital, Tv, 1.15),
            (Digital, Social, 1.05),
            (Social, Digital, 1.1),
            (Social, Events, 1.1),
            (Events, Social, 1.15),
            (Seo, Pr, 1.1),
            (Seo, Social, 1.05),
            (Seo, Digital, 1.08),
            (Radio, Print, 0.95),
            (Print, Radio, 0.95),
            (Print, Digital, 0.9),
            (Radio, Tv, 0.97),
        ];
        let mut coefficients = Self::identity().coefficients;
        for (target, other, value) in defaults {
            coefficients[target][other] = value;
        }
        Self { coefficients }
    }
}

impl TryFrom<Vec<SynergyPair>> for SynergyMatrix {
    type Error = ResponseError;

    fn try_from(pairs: Vec<SynergyPair>) -> Result<Self, Self::Error> {
        pairs.into_iter().try_fold(Self::identity(), |m, p| {
            m.with_coefficient(p.target, p.other, p.coefficient)
        })
    }
}

impl From<SynergyMatrix> for Vec<SynergyPair> {
    fn from(m: SynergyMatrix) -> Self {
        m.pairs()
    }
}
