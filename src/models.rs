use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    DineIn,
    Takeout,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine-in",
            OrderType::Takeout => "takeout",
            OrderType::Delivery => "delivery",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dine-in" | "dine_in" | "dinein" => Ok(OrderType::DineIn),
            "takeout" | "take-out" => Ok(OrderType::Takeout),
            "delivery" => Ok(OrderType::Delivery),
            other => Err(AnalyticsError::UnknownOrderType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryCategory {
    Produce,
    Protein,
    Dairy,
    Bakery,
    Beverage,
    Dry,
    Other,
}

impl InventoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCategory::Produce => "produce",
            InventoryCategory::Protein => "protein",
            InventoryCategory::Dairy => "dairy",
            InventoryCategory::Bakery => "bakery",
            InventoryCategory::Beverage => "beverage",
            InventoryCategory::Dry => "dry",
            InventoryCategory::Other => "other",
        }
    }
}

impl fmt::Display for InventoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryCategory {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "produce" => Ok(InventoryCategory::Produce),
            "protein" | "meat" => Ok(InventoryCategory::Protein),
            "dairy" => Ok(InventoryCategory::Dairy),
            "bakery" => Ok(InventoryCategory::Bakery),
            "beverage" | "beverages" => Ok(InventoryCategory::Beverage),
            "dry" | "dry-goods" => Ok(InventoryCategory::Dry),
            "other" => Ok(InventoryCategory::Other),
            other => Err(AnalyticsError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesEvent {
    pub location_id: String,
    pub date: NaiveDate,
    pub order_type: OrderType,
    pub revenue: f64,
    pub order_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub location_id: String,
    pub date: NaiveDate,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEvent {
    pub location_id: String,
    pub date: NaiveDate,
    pub category: InventoryCategory,
    pub waste_cost: f64,
    pub units_wasted: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
}

/// Inclusive `[start, end]` date window. Only constructible with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        if start > end {
            return Err(AnalyticsError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Flat,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Flat => "flat",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-location rollup for one query. Rebuilt on every call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub location_id: String,
    pub total_revenue: f64,
    pub order_count: u64,
    /// `None` when the location has no orders in range.
    pub average_order_value: Option<f64>,
    /// `None` when the location has no reviews in range, never `0`.
    pub average_rating: Option<f64>,
    pub review_count: usize,
    pub waste_cost: f64,
    pub trend: Trend,
    /// Only present when `needs_attention` is set.
    pub risk_score: Option<f64>,
    pub needs_attention: bool,
}

/// The three already-filtered collections a loader hands to the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub sales: Vec<SalesEvent>,
    pub reviews: Vec<ReviewEvent>,
    pub inventory: Vec<InventoryEvent>,
}

impl RecordSet {
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty() && self.reviews.is_empty() && self.inventory.is_empty()
    }

    /// Rejects records that would corrupt numeric results downstream.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        for sale in &self.sales {
            if !sale.revenue.is_finite() || sale.revenue < 0.0 {
                return Err(invalid(
                    "sales",
                    &sale.location_id,
                    sale.date,
                    format!("revenue must be a non-negative number, got {}", sale.revenue),
                ));
            }
        }

        for review in &self.reviews {
            if !review.rating.is_finite() || !(1.0..=5.0).contains(&review.rating) {
                return Err(invalid(
                    "review",
                    &review.location_id,
                    review.date,
                    format!("rating must be within [1, 5], got {}", review.rating),
                ));
            }
        }

        for item in &self.inventory {
            if !item.waste_cost.is_finite() || item.waste_cost < 0.0 {
                return Err(invalid(
                    "inventory",
                    &item.location_id,
                    item.date,
                    format!("waste cost must be a non-negative number, got {}", item.waste_cost),
                ));
            }
            if !item.units_wasted.is_finite() || item.units_wasted < 0.0 {
                return Err(invalid(
                    "inventory",
                    &item.location_id,
                    item.date,
                    format!("units wasted must be a non-negative number, got {}", item.units_wasted),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(kind: &'static str, location_id: &str, date: NaiveDate, reason: String) -> AnalyticsError {
    AnalyticsError::InvalidRecord {
        kind,
        location_id: location_id.to_string(),
        date,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let err = DateRange::new(day(10), day(2)).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidRange { .. }));
    }

    #[test]
    fn date_range_is_inclusive() {
        let range = DateRange::new(day(1), day(3)).unwrap();
        assert!(range.contains(day(1)));
        assert!(range.contains(day(3)));
        assert!(!range.contains(day(4)));
        assert_eq!(range.days().count(), 3);
    }

    #[test]
    fn order_type_parses_dashboard_labels() {
        assert_eq!("Dine-In".parse::<OrderType>().unwrap(), OrderType::DineIn);
        assert_eq!("takeout".parse::<OrderType>().unwrap(), OrderType::Takeout);
        assert!("drive-thru".parse::<OrderType>().is_err());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = "cleaning".parse::<InventoryCategory>().unwrap_err();
        assert!(matches!(err, AnalyticsError::UnknownCategory(ref c) if c == "cleaning"));
    }

    #[test]
    fn validate_flags_out_of_range_rating() {
        let records = RecordSet {
            reviews: vec![ReviewEvent {
                location_id: "LOC-1".to_string(),
                date: day(1),
                rating: 6.0,
            }],
            ..RecordSet::default()
        };
        let err = records.validate().unwrap_err();
        assert!(err.to_string().contains("rating must be within"));
    }

    #[test]
    fn validate_flags_negative_revenue() {
        let records = RecordSet {
            sales: vec![SalesEvent {
                location_id: "LOC-1".to_string(),
                date: day(1),
                order_type: OrderType::Delivery,
                revenue: -4.0,
                order_count: 1,
            }],
            ..RecordSet::default()
        };
        assert!(matches!(
            records.validate(),
            Err(AnalyticsError::InvalidRecord { kind: "sales", .. })
        ));
    }
}
