use std::cmp::Ordering;

use crate::models::{LocationSummary, Trend};

pub const RATING_ATTENTION_THRESHOLD: f64 = 3.5;
pub const WASTE_ATTENTION_THRESHOLD: f64 = 1000.0;
pub const RATING_PENALTY_BASELINE: f64 = 4.2;
pub const WASTE_PENALTY_DIVISOR: f64 = 250.0;
pub const DECLINING_TREND_PENALTY: f64 = 1.5;

/// The slice of a summary the scorer reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInput {
    pub average_rating: Option<f64>,
    pub waste_cost: f64,
    pub trend: Trend,
}

impl From<&LocationSummary> for RiskInput {
    fn from(summary: &LocationSummary) -> Self {
        Self {
            average_rating: summary.average_rating,
            waste_cost: summary.waste_cost,
            trend: summary.trend,
        }
    }
}

/// Either clause alone raises the flag: a declining location with a poor
/// rating, or waste above the cost threshold.
pub fn needs_attention(input: &RiskInput) -> bool {
    let poor_and_declining = input.trend == Trend::Declining
        && input
            .average_rating
            .is_some_and(|rating| rating < RATING_ATTENTION_THRESHOLD);

    poor_and_declining || input.waste_cost > WASTE_ATTENTION_THRESHOLD
}

/// Ranking heuristic for flagged locations, not a probability.
/// `None` for locations that do not need attention.
pub fn risk_score(input: &RiskInput) -> Option<f64> {
    if !needs_attention(input) {
        return None;
    }

    // A location with no reviews takes no rating penalty.
    let rating_penalty = input
        .average_rating
        .map(|rating| (RATING_PENALTY_BASELINE - rating).max(0.0))
        .unwrap_or(0.0);
    let waste_penalty = input.waste_cost / WASTE_PENALTY_DIVISOR;
    let trend_penalty = if input.trend == Trend::Declining {
        DECLINING_TREND_PENALTY
    } else {
        0.0
    };

    Some(rating_penalty + waste_penalty + trend_penalty)
}

/// Fills `needs_attention` and `risk_score` on a summary in place.
pub fn apply(summary: &mut LocationSummary) {
    let input = RiskInput::from(&*summary);
    summary.needs_attention = needs_attention(&input);
    summary.risk_score = risk_score(&input);
}

/// Flagged locations, highest score first. Equal scores keep input order.
pub fn rank_at_risk(summaries: &[LocationSummary]) -> Vec<&LocationSummary> {
    let mut ranked: Vec<&LocationSummary> = summaries
        .iter()
        .filter(|summary| summary.needs_attention)
        .collect();

    ranked.sort_by(|a, b| {
        let a = a.risk_score.unwrap_or(0.0);
        let b = b.risk_score.unwrap_or(0.0);
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });
    ranked
}
