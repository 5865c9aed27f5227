use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::aggregate;
use crate::error::AnalyticsError;
use crate::models::{DateRange, Location, LocationSummary, RecordSet, Trend};
use crate::risk;
use crate::trend;

/// Explicit query parameters; nothing is read from ambient state.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Defaults to `end`.
    pub as_of: Option<NaiveDate>,
}

impl SummaryRequest {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            as_of: None,
        }
    }
}

/// One summary per reference location, in reference order. When `locations`
/// is empty the ids seen in the records are used, sorted.
pub fn summarize_locations(
    records: &RecordSet,
    locations: &[Location],
    request: SummaryRequest,
) -> Result<Vec<LocationSummary>, AnalyticsError> {
    let range = DateRange::new(request.start, request.end)?;
    records.validate()?;

    let (start, end) = (range.start(), range.end());
    let as_of = request.as_of.unwrap_or(end);

    let revenue = aggregate::revenue_by_location(&records.sales, start, end)?;
    let orders = aggregate::order_count_by_location(&records.sales, start, end)?;
    let aov = aggregate::average_order_value(&records.sales, start, end)?;
    let ratings = aggregate::rating_summary_by_location(&records.reviews, start, end)?;
    let waste = aggregate::waste_cost_by_location(&records.inventory, start, end)?;

    let location_ids = resolve_location_ids(records, locations);
    debug!(
        sales = records.sales.len(),
        reviews = records.reviews.len(),
        inventory = records.inventory.len(),
        locations = location_ids.len(),
        %start,
        %end,
        %as_of,
        "summarizing locations"
    );

    let mut summaries = Vec::with_capacity(location_ids.len());
    for location_id in location_ids {
        let rating = ratings.get(&location_id).copied().unwrap_or_default();
        let trend: Trend = trend::classify_location(&records.sales, &location_id, as_of)?;

        let mut summary = LocationSummary {
            total_revenue: revenue.get(&location_id).copied().unwrap_or(0.0),
            order_count: orders.get(&location_id).copied().unwrap_or(0),
            average_order_value: aov.get(&location_id).copied().flatten(),
            average_rating: rating.average,
            review_count: rating.review_count,
            waste_cost: waste.get(&location_id).copied().unwrap_or(0.0),
            trend,
            risk_score: None,
            needs_attention: false,
            location_id,
        };
        risk::apply(&mut summary);
        summaries.push(summary);
    }

    Ok(summaries)
}

fn resolve_location_ids(records: &RecordSet, locations: &[Location]) -> Vec<String> {
    let seen: HashSet<&str> = records
        .sales
        .iter()
        .map(|sale| sale.location_id.as_str())
        .chain(records.reviews.iter().map(|review| review.location_id.as_str()))
        .chain(records.inventory.iter().map(|item| item.location_id.as_str()))
        .collect();

    if locations.is_empty() {
        let mut ids: Vec<String> = seen.into_iter().map(str::to_string).collect();
        ids.sort();
        return ids;
    }

    let known: HashSet<&str> = locations.iter().map(|location| location.id.as_str()).collect();
    let orphaned = seen.iter().filter(|id| !known.contains(*id)).count();
    if orphaned > 0 {
        warn!(orphaned, "records reference locations missing from the reference list");
    }

    locations.iter().map(|location| location.id.clone()).collect()
}
