use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::aggregate;
use crate::error::AnalyticsError;
use crate::models::{SalesEvent, Trend};

pub const TREND_WINDOW_DAYS: i64 = 7;
/// Relative change that must be strictly exceeded to leave `Flat`.
pub const TREND_CHANGE_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSums {
    pub current: f64,
    pub prior: f64,
}

impl WindowSums {
    /// `None` when the prior window had no revenue.
    pub fn change(&self) -> Option<f64> {
        if self.prior == 0.0 {
            None
        } else {
            Some((self.current - self.prior) / self.prior)
        }
    }
}

/// Revenue in `[as_of - 6, as_of]` and `[as_of - 13, as_of - 7]`.
/// Days with no sales count as zero, so short histories never fail.
pub fn window_sums(
    sales: &[SalesEvent],
    location_id: &str,
    as_of: NaiveDate,
) -> Result<WindowSums, AnalyticsError> {
    let current_start = as_of - Duration::days(TREND_WINDOW_DAYS - 1);
    let prior_start = as_of - Duration::days(2 * TREND_WINDOW_DAYS - 1);
    let series = aggregate::daily_revenue(sales, location_id, prior_start, as_of)?;

    let mut sums = WindowSums {
        current: 0.0,
        prior: 0.0,
    };
    for (date, revenue) in series {
        if date >= current_start {
            sums.current += revenue;
        } else {
            sums.prior += revenue;
        }
    }

    Ok(sums)
}

pub fn classify_sums(sums: WindowSums) -> Trend {
    match sums.change() {
        None if sums.current > 0.0 => Trend::Improving,
        None => Trend::Flat,
        Some(change) if change > TREND_CHANGE_THRESHOLD => Trend::Improving,
        Some(change) if change < -TREND_CHANGE_THRESHOLD => Trend::Declining,
        Some(_) => Trend::Flat,
    }
}

pub fn classify_location(
    sales: &[SalesEvent],
    location_id: &str,
    as_of: NaiveDate,
) -> Result<Trend, AnalyticsError> {
    Ok(classify_sums(window_sums(sales, location_id, as_of)?))
}

/// Trend for every location that appears in `sales`.
pub fn trends_by_location(
    sales: &[SalesEvent],
    as_of: NaiveDate,
) -> Result<HashMap<String, Trend>, AnalyticsError> {
    let mut trends = HashMap::new();

    for sale in sales {
        if trends.contains_key(&sale.location_id) {
            continue;
        }
        let trend = classify_location(sales, &sale.location_id, as_of)?;
        trends.insert(sale.location_id.clone(), trend);
    }

    Ok(trends)
}
