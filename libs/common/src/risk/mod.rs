//! Heuristic scoring of reservations, listings and users
//!
//! Every scorer is a pure function over an entity and a handful of aggregate
//! counts. A score is the sum of fixed-weight contributions, clamped to
//! `[0, 1]`. [`RiskService`] gathers the inputs from the repositories and
//! persists the results.

mod listing;
mod reservation;
mod service;
mod trust;

use serde::Serialize;

pub use listing::{
    OCCUPANCY_HORIZON_DAYS, OccupancySignals, PricingSignals, PricingSuggestion,
    occupancy_prediction, suggest_price,
};
pub use reservation::{
    CancellationSignals, FraudSignals, OverbookingSignals, cancellation_risk, fraud_risk,
    overbooking_risk,
};
pub use service::{ReservationRiskReport, RiskService};
pub use trust::{TrustSignals, trust_score};

/// One weighted factor that fired while scoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub factor: &'static str,
    pub weight: f64,
}

/// A clamped score and the factors that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub score: f64,
    pub contributions: Vec<Contribution>,
}

impl Assessment {
    pub fn has_factor(&self, factor: &str) -> bool {
        self.contributions.iter().any(|c| c.factor == factor)
    }
}

/// Accumulates contributions and clamps on completion
#[derive(Debug, Default)]
pub(crate) struct ScoreCard {
    total: f64,
    contributions: Vec<Contribution>,
}

impl ScoreCard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add `weight` when `condition` holds
    pub(crate) fn add_if(&mut self, condition: bool, factor: &'static str, weight: f64) {
        if condition {
            self.add(factor, weight);
        }
    }

    pub(crate) fn add(&mut self, factor: &'static str, weight: f64) {
        if weight.is_finite() && weight != 0.0 {
            self.total += weight;
            self.contributions.push(Contribution { factor, weight });
        }
    }

    /// Totals are rounded to six decimals so weight sums land on their thresholds
    pub(crate) fn finish(self) -> Assessment {
        Assessment {
            score: clamp_unit((self.total * 1e6).round() / 1e6),
            contributions: self.contributions,
        }
    }
}

/// Clamp to `[0, 1]`; NaN collapses to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Ratio that treats an empty denominator as zero
pub(crate) fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
