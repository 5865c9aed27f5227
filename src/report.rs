use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use chrono::NaiveDate;

use store_ops_analytics::aggregate::WasteBreakdown;
use store_ops_analytics::cohort::{self, Metric};
use store_ops_analytics::models::{InventoryCategory, Location, LocationSummary, Trend};
use store_ops_analytics::risk;

pub struct ReportContext<'a> {
    pub scope: Option<&'a str>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub locations: &'a [Location],
    pub summaries: &'a [LocationSummary],
    pub waste_by_category: &'a HashMap<String, BTreeMap<InventoryCategory, WasteBreakdown>>,
}

pub fn trend_mix(summaries: &[LocationSummary]) -> Vec<(Trend, usize)> {
    [Trend::Improving, Trend::Flat, Trend::Declining]
        .into_iter()
        .map(|trend| {
            let count = summaries.iter().filter(|summary| summary.trend == trend).count();
            (trend, count)
        })
        .collect()
}

pub fn build_report(ctx: &ReportContext<'_>) -> String {
    let mut output = String::new();
    let scope_label = ctx.scope.unwrap_or("all locations");

    let _ = writeln!(output, "# Store Operations Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} to {})",
        scope_label, ctx.start, ctx.end
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Portfolio");

    if ctx.summaries.is_empty() {
        let _ = writeln!(output, "No locations match this view.");
        return output;
    }

    let revenue: f64 = ctx.summaries.iter().map(|summary| summary.total_revenue).sum();
    let waste: f64 = ctx.summaries.iter().map(|summary| summary.waste_cost).sum();
    let _ = writeln!(output, "- Locations: {}", ctx.summaries.len());
    let _ = writeln!(output, "- Revenue: ${:.2}", revenue);
    let _ = writeln!(output, "- Waste cost: ${:.2}", waste);
    for metric in [Metric::Revenue, Metric::AverageOrderValue, Metric::WasteCost] {
        match cohort::cohort_average(ctx.summaries, metric) {
            Some(average) => {
                let _ = writeln!(output, "- Cohort mean {}: ${:.2}", metric, average);
            }
            None => {
                let _ = writeln!(output, "- Cohort mean {}: no data", metric);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trend Mix");
    for (trend, count) in trend_mix(ctx.summaries) {
        let _ = writeln!(output, "- {}: {} locations", trend, count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Needs Attention");

    let ranked = risk::rank_at_risk(ctx.summaries);
    if ranked.is_empty() {
        let _ = writeln!(output, "No locations need attention in this window.");
    } else {
        for summary in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} score {:.2} (trend {}, rating {}, waste ${:.2})",
                display_name(ctx.locations, &summary.location_id),
                summary.risk_score.unwrap_or(0.0),
                summary.trend,
                format_rating(summary),
                summary.waste_cost
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Waste Breakdown");

    let mut any_waste = false;
    for summary in ctx.summaries {
        let Some(categories) = ctx.waste_by_category.get(&summary.location_id) else {
            continue;
        };
        any_waste = true;
        let _ = writeln!(output, "### {}", display_name(ctx.locations, &summary.location_id));
        for (category, breakdown) in categories {
            let _ = writeln!(
                output,
                "- {}: ${:.2} ({:.1} units)",
                category, breakdown.waste_cost, breakdown.units_wasted
            );
        }
    }
    if !any_waste {
        let _ = writeln!(output, "No waste recorded for this window.");
    }

    output
}

pub fn display_name(locations: &[Location], location_id: &str) -> String {
    locations
        .iter()
        .find(|location| location.id == location_id)
        .map(|location| format!("{} ({}, {})", location.name, location.city, location.state))
        .unwrap_or_else(|| location_id.to_string())
}

pub fn format_rating(summary: &LocationSummary) -> String {
    match summary.average_rating {
        Some(rating) => format!("{:.2} from {} reviews", rating, summary.review_count),
        None => "no reviews".to_string(),
    }
}
