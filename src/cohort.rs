//! Peer benchmarking against the currently visible set of locations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Location, LocationSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Revenue,
    AverageOrderValue,
    WasteCost,
}

impl Metric {
    pub fn higher_is_better(&self) -> bool {
        match self {
            Metric::Revenue | Metric::AverageOrderValue => true,
            Metric::WasteCost => false,
        }
    }

    /// `None` when the summary has no value for this metric.
    pub fn value(&self, summary: &LocationSummary) -> Option<f64> {
        match self {
            Metric::Revenue => Some(summary.total_revenue),
            Metric::AverageOrderValue => summary.average_order_value,
            Metric::WasteCost => Some(summary.waste_cost),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::AverageOrderValue => "average order value",
            Metric::WasteCost => "waste cost",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    /// `None` when the cohort average is zero.
    pub ratio: Option<f64>,
    pub is_above_average: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationBenchmark {
    pub location_id: String,
    pub cohort_size: usize,
    pub revenue: Option<Benchmark>,
    pub average_order_value: Option<Benchmark>,
    pub waste_cost: Option<Benchmark>,
}

/// Mean of `metric` over the summaries that carry a value for it.
/// `None` for an empty cohort or when no summary has the metric.
pub fn cohort_average(summaries: &[LocationSummary], metric: Metric) -> Option<f64> {
    let values: Vec<f64> = summaries.iter().filter_map(|summary| metric.value(summary)).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn relative_benchmark(value: f64, cohort_avg: f64, higher_is_better: bool) -> Benchmark {
    if cohort_avg == 0.0 {
        return Benchmark {
            ratio: None,
            is_above_average: value > 0.0,
        };
    }

    let is_above_average = if higher_is_better {
        value >= cohort_avg
    } else {
        value <= cohort_avg
    };

    Benchmark {
        ratio: Some(value / cohort_avg),
        is_above_average,
    }
}

pub fn benchmark_metric(summary: &LocationSummary, cohort: &[LocationSummary], metric: Metric) -> Option<Benchmark> {
    let value = metric.value(summary)?;
    let average = cohort_average(cohort, metric)?;
    Some(relative_benchmark(value, average, metric.higher_is_better()))
}

pub fn benchmark_location(summary: &LocationSummary, cohort: &[LocationSummary]) -> LocationBenchmark {
    LocationBenchmark {
        location_id: summary.location_id.clone(),
        cohort_size: cohort.len(),
        revenue: benchmark_metric(summary, cohort, Metric::Revenue),
        average_order_value: benchmark_metric(summary, cohort, Metric::AverageOrderValue),
        waste_cost: benchmark_metric(summary, cohort, Metric::WasteCost),
    }
}

/// Upstream view filters. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortFilter {
    /// Case-insensitive substring over name, city, state and id.
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub needs_attention_only: bool,
}

impl CohortFilter {
    pub fn matches(&self, location: &Location, summary: &LocationSummary) -> bool {
        if self.needs_attention_only && !summary.needs_attention {
            return false;
        }
        if let Some(city) = non_empty(&self.city) {
            if !location.city.eq_ignore_ascii_case(city) {
                return false;
            }
        }
        if let Some(state) = non_empty(&self.state) {
            if !location.state.eq_ignore_ascii_case(state) {
                return false;
            }
        }
        if let Some(search) = non_empty(&self.search) {
            let needle = search.to_lowercase();
            let haystacks = [&location.name, &location.city, &location.state, &location.id];
            if !haystacks
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }

    /// Visible summaries, in input order. Summaries without a matching
    /// reference location are dropped.
    pub fn apply(&self, locations: &[Location], summaries: &[LocationSummary]) -> Vec<LocationSummary> {
        summaries
            .iter()
            .filter(|summary| {
                locations
                    .iter()
                    .find(|location| location.id == summary.location_id)
                    .is_some_and(|location| self.matches(location, summary))
            })
            .cloned()
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trend;

    fn sample_summary(location_id: &str, revenue: f64, aov: Option<f64>, waste: f64) -> LocationSummary {
        LocationSummary {
            location_id: location_id.to_string(),
            total_revenue: revenue,
            order_count: 10,
            average_order_value: aov,
            average_rating: Some(4.0),
            review_count: 2,
            waste_cost: waste,
            trend: Trend::Flat,
            risk_score: None,
            needs_attention: false,
        }
    }

    fn sample_location(id: &str, name: &str, city: &str, state: &str) -> Location {
        Location {
            id: id.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        }
    }

    #[test]
    fn singleton_cohort_is_always_average() {
        let only = sample_summary("A", 1800.0, Some(22.5), 340.0);
        let cohort = vec![only.clone()];
        let result = benchmark_location(&only, &cohort);

        for benchmark in [result.revenue, result.average_order_value, result.waste_cost] {
            let benchmark = benchmark.unwrap();
            assert_eq!(benchmark.ratio, Some(1.0));
            assert!(benchmark.is_above_average);
        }
    }

    #[test]
    fn lower_is_better_flips_comparison() {
        let cheap = relative_benchmark(200.0, 400.0, false);
        assert!(cheap.is_above_average);
        assert_eq!(cheap.ratio, Some(0.5));

        let low_revenue = relative_benchmark(200.0, 400.0, true);
        assert!(!low_revenue.is_above_average);
    }

    #[test]
    fn zero_cohort_average_has_no_ratio() {
        let benchmark = relative_benchmark(0.0, 0.0, true);
        assert_eq!(benchmark.ratio, None);
        assert!(!benchmark.is_above_average);

        let benchmark = relative_benchmark(5.0, 0.0, true);
        assert_eq!(benchmark.ratio, None);
        assert!(benchmark.is_above_average);
    }

    #[test]
    fn cohort_average_skips_missing_values() {
        let cohort = vec![
            sample_summary("A", 100.0, Some(10.0), 0.0),
            sample_summary("B", 300.0, None, 50.0),
        ];
        assert_eq!(cohort_average(&cohort, Metric::Revenue), Some(200.0));
        assert_eq!(cohort_average(&cohort, Metric::AverageOrderValue), Some(10.0));
        assert_eq!(cohort_average(&[], Metric::WasteCost), None);
    }

    #[test]
    fn filter_restricts_visible_cohort() {
        let locations = vec![
            sample_location("A", "Downtown Grill", "Austin", "TX"),
            sample_location("B", "Lakeside Cafe", "Dallas", "TX"),
            sample_location("C", "Harbor Deli", "Portland", "OR"),
        ];
        let mut flagged = sample_summary("C", 50.0, Some(5.0), 1500.0);
        flagged.needs_attention = true;
        let summaries = vec![
            sample_summary("A", 100.0, Some(10.0), 0.0),
            sample_summary("B", 300.0, Some(12.0), 50.0),
            flagged,
        ];

        let texas = CohortFilter {
            state: Some("tx".to_string()),
            ..CohortFilter::default()
        };
        assert_eq!(texas.apply(&locations, &summaries).len(), 2);

        let search = CohortFilter {
            search: Some("cafe".to_string()),
            ..CohortFilter::default()
        };
        let visible = search.apply(&locations, &summaries);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].location_id, "B");

        let attention = CohortFilter {
            needs_attention_only: true,
            ..CohortFilter::default()
        };
        assert_eq!(attention.apply(&locations, &summaries)[0].location_id, "C");
    }

    #[test]
    fn benchmark_reflects_visible_cohort_only() {
        let summaries = vec![
            sample_summary("A", 100.0, Some(10.0), 0.0),
            sample_summary("B", 300.0, Some(30.0), 50.0),
            sample_summary("C", 2000.0, Some(40.0), 10.0),
        ];
        let visible = &summaries[..2];
        let result = benchmark_metric(&summaries[0], visible, Metric::Revenue).unwrap();
        assert_eq!(result.ratio, Some(0.5));
        assert!(!result.is_above_average);
    }
}
