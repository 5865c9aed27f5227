//! Location performance rollups for store-operations dashboards.
//!
//! Raw per-day sales, review and inventory records go in; per-location
//! summaries with a trend label, a needs-attention flag and a ranking score
//! come out, along with peer benchmarks against the visible cohort. Every
//! function is pure and synchronous, so callers may fan out across threads
//! freely as long as they do not share a map while it is being built.

pub mod aggregate;
pub mod cohort;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod risk;
pub mod trend;

pub use error::AnalyticsError;
pub use models::{LocationSummary, RecordSet, Trend};
pub use pipeline::{summarize_locations, SummaryRequest};
