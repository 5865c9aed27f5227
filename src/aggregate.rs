//! Per-location reductions over range-filtered event lists.
//!
//! Every function takes an inclusive `[start, end]` window and fails with
//! `InvalidRange` before touching any record when `start > end`. Locations with
//! no matching events are absent from the returned maps.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::error::AnalyticsError;
use crate::models::{DateRange, InventoryCategory, InventoryEvent, OrderType, ReviewEvent, SalesEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WasteBreakdown {
    pub waste_cost: f64,
    pub units_wasted: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingSummary {
    /// `None` when `review_count == 0`.
    pub average: Option<f64>,
    pub review_count: usize,
}

pub fn revenue_by_location(
    sales: &[SalesEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, f64>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut totals: HashMap<String, f64> = HashMap::new();

    for sale in sales.iter().filter(|sale| range.contains(sale.date)) {
        *totals.entry(sale.location_id.clone()).or_insert(0.0) += sale.revenue;
    }

    Ok(totals)
}

pub fn order_count_by_location(
    sales: &[SalesEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, u64>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut counts: HashMap<String, u64> = HashMap::new();

    for sale in sales.iter().filter(|sale| range.contains(sale.date)) {
        *counts.entry(sale.location_id.clone()).or_insert(0) += u64::from(sale.order_count);
    }

    Ok(counts)
}

/// `sum(revenue) / sum(order_count)` per location. A location that sold
/// nothing in range maps to `None` rather than dividing by zero.
pub fn average_order_value(
    sales: &[SalesEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, Option<f64>>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut totals: HashMap<String, (f64, u64)> = HashMap::new();

    for sale in sales.iter().filter(|sale| range.contains(sale.date)) {
        let entry = totals.entry(sale.location_id.clone()).or_insert((0.0, 0));
        entry.0 += sale.revenue;
        entry.1 += u64::from(sale.order_count);
    }

    Ok(totals
        .into_iter()
        .map(|(location_id, (revenue, orders))| (location_id, safe_ratio(revenue, orders)))
        .collect())
}

pub fn average_rating_by_location(
    reviews: &[ReviewEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, Option<f64>>, AnalyticsError> {
    Ok(rating_summary_by_location(reviews, start, end)?
        .into_iter()
        .map(|(location_id, summary)| (location_id, summary.average))
        .collect())
}

/// Equal-weight mean rating plus the number of reviews behind it.
pub fn rating_summary_by_location(
    reviews: &[ReviewEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, RatingSummary>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();

    for review in reviews.iter().filter(|review| range.contains(review.date)) {
        let entry = totals.entry(review.location_id.clone()).or_insert((0.0, 0));
        entry.0 += review.rating;
        entry.1 += 1;
    }

    Ok(totals
        .into_iter()
        .map(|(location_id, (sum, count))| {
            let summary = RatingSummary {
                average: safe_ratio(sum, count as u64),
                review_count: count,
            };
            (location_id, summary)
        })
        .collect())
}

pub fn waste_cost_by_location(
    inventory: &[InventoryEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, f64>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut totals: HashMap<String, f64> = HashMap::new();

    for item in inventory.iter().filter(|item| range.contains(item.date)) {
        *totals.entry(item.location_id.clone()).or_insert(0.0) += item.waste_cost;
    }

    Ok(totals)
}

pub fn waste_cost_by_category(
    inventory: &[InventoryEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, BTreeMap<InventoryCategory, WasteBreakdown>>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut totals: HashMap<String, BTreeMap<InventoryCategory, WasteBreakdown>> = HashMap::new();

    for item in inventory.iter().filter(|item| range.contains(item.date)) {
        let entry = totals
            .entry(item.location_id.clone())
            .or_default()
            .entry(item.category)
            .or_default();
        entry.waste_cost += item.waste_cost;
        entry.units_wasted += item.units_wasted;
    }

    Ok(totals)
}

pub fn revenue_by_order_type(
    sales: &[SalesEvent],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, BTreeMap<OrderType, f64>>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut totals: HashMap<String, BTreeMap<OrderType, f64>> = HashMap::new();

    for sale in sales.iter().filter(|sale| range.contains(sale.date)) {
        *totals
            .entry(sale.location_id.clone())
            .or_default()
            .entry(sale.order_type)
            .or_insert(0.0) += sale.revenue;
    }

    Ok(totals)
}

/// One `(date, revenue)` point per day of the window for a single location,
/// with days that have no sales filled as zero.
pub fn daily_revenue(
    sales: &[SalesEvent],
    location_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, f64)>, AnalyticsError> {
    let range = DateRange::new(start, end)?;
    let mut by_day: BTreeMap<NaiveDate, f64> = range.days().map(|day| (day, 0.0)).collect();

    for sale in sales
        .iter()
        .filter(|sale| sale.location_id == location_id && range.contains(sale.date))
    {
        *by_day.entry(sale.date).or_insert(0.0) += sale.revenue;
    }

    Ok(by_day.into_iter().collect())
}

fn safe_ratio(numerator: f64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator / denominator as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn sample_sale(location_id: &str, d: u32, revenue: f64, orders: u32) -> SalesEvent {
        SalesEvent {
            location_id: location_id.to_string(),
            date: day(d),
            order_type: OrderType::DineIn,
            revenue,
            order_count: orders,
        }
    }

    fn sample_review(location_id: &str, d: u32, rating: f64) -> ReviewEvent {
        ReviewEvent {
            location_id: location_id.to_string(),
            date: day(d),
            rating,
        }
    }

    fn sample_waste(location_id: &str, d: u32, category: InventoryCategory, cost: f64) -> InventoryEvent {
        InventoryEvent {
            location_id: location_id.to_string(),
            date: day(d),
            category,
            waste_cost: cost,
            units_wasted: 2.0,
        }
    }

    #[test]
    fn revenue_sums_only_inside_range() {
        let sales = vec![
            sample_sale("A", 1, 100.0, 4),
            sample_sale("A", 2, 50.0, 2),
            sample_sale("A", 5, 999.0, 9),
            sample_sale("B", 2, 75.0, 3),
        ];
        let totals = revenue_by_location(&sales, day(1), day(3)).unwrap();
        assert!((totals["A"] - 150.0).abs() < 0.001);
        assert!((totals["B"] - 75.0).abs() < 0.001);
        assert!(!totals.contains_key("C"));
    }

    #[test]
    fn revenue_is_additive_over_adjacent_windows() {
        let sales: Vec<SalesEvent> = (1..=9)
            .flat_map(|d| {
                vec![
                    sample_sale("A", d, 10.0 * d as f64, 1),
                    sample_sale("B", d, 3.5, 1),
                ]
            })
            .collect();

        let whole = revenue_by_location(&sales, day(1), day(9)).unwrap();
        let first = revenue_by_location(&sales, day(1), day(4)).unwrap();
        let second = revenue_by_location(&sales, day(5), day(9)).unwrap();

        for (location_id, total) in whole {
            let split = first.get(&location_id).copied().unwrap_or(0.0)
                + second.get(&location_id).copied().unwrap_or(0.0);
            assert!((total - split).abs() < 0.001);
        }
    }

    #[test]
    fn inverted_range_fails_before_matching() {
        let sales = vec![sample_sale("A", 1, 100.0, 1)];
        assert!(matches!(
            revenue_by_location(&sales, day(5), day(1)),
            Err(AnalyticsError::InvalidRange { .. })
        ));
        assert!(average_rating_by_location(&[], day(5), day(1)).is_err());
        assert!(waste_cost_by_location(&[], day(5), day(1)).is_err());
    }

    #[test]
    fn average_order_value_guards_zero_orders() {
        let sales = vec![
            sample_sale("A", 1, 120.0, 4),
            sample_sale("A", 2, 80.0, 6),
            sample_sale("B", 1, 0.0, 0),
        ];
        let aov = average_order_value(&sales, day(1), day(2)).unwrap();
        assert_eq!(aov["A"], Some(20.0));
        assert_eq!(aov["B"], None);
    }

    #[test]
    fn rating_is_equal_weight_mean() {
        let reviews = vec![
            sample_review("A", 1, 5.0),
            sample_review("A", 3, 3.0),
            sample_review("A", 3, 4.0),
        ];
        let ratings = average_rating_by_location(&reviews, day(1), day(3)).unwrap();
        assert_eq!(ratings["A"], Some(4.0));
    }

    #[test]
    fn location_without_reviews_has_no_rating() {
        let reviews = vec![sample_review("A", 10, 5.0)];
        let ratings = average_rating_by_location(&reviews, day(1), day(3)).unwrap();
        assert!(ratings.get("A").copied().flatten().is_none());
    }

    #[test]
    fn waste_groups_by_category() {
        let inventory = vec![
            sample_waste("A", 1, InventoryCategory::Produce, 40.0),
            sample_waste("A", 2, InventoryCategory::Produce, 10.0),
            sample_waste("A", 2, InventoryCategory::Dairy, 25.0),
        ];
        let totals = waste_cost_by_location(&inventory, day(1), day(2)).unwrap();
        assert!((totals["A"] - 75.0).abs() < 0.001);

        let breakdown = waste_cost_by_category(&inventory, day(1), day(2)).unwrap();
        let produce = breakdown["A"][&InventoryCategory::Produce];
        assert!((produce.waste_cost - 50.0).abs() < 0.001);
        assert!((produce.units_wasted - 4.0).abs() < 0.001);
        assert_eq!(breakdown["A"].len(), 2);
    }

    #[test]
    fn order_type_mix_splits_revenue() {
        let mut delivery = sample_sale("A", 1, 30.0, 1);
        delivery.order_type = OrderType::Delivery;
        let sales = vec![sample_sale("A", 1, 70.0, 2), delivery];
        let mix = revenue_by_order_type(&sales, day(1), day(1)).unwrap();
        assert_eq!(mix["A"][&OrderType::DineIn], 70.0);
        assert_eq!(mix["A"][&OrderType::Delivery], 30.0);
        assert!(!mix["A"].contains_key(&OrderType::Takeout));
    }

    #[test]
    fn daily_series_fills_missing_days() {
        let sales = vec![sample_sale("A", 1, 10.0, 1), sample_sale("A", 3, 30.0, 1)];
        let series = daily_revenue(&sales, "A", day(1), day(4)).unwrap();
        let values: Vec<f64> = series.iter().map(|(_, revenue)| *revenue).collect();
        assert_eq!(values, vec![10.0, 0.0, 30.0, 0.0]);
    }
}
