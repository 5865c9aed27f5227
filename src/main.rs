use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use store_ops_analytics::aggregate;
use store_ops_analytics::cohort::{self, CohortFilter};
use store_ops_analytics::models::{Location, LocationSummary};
use store_ops_analytics::{risk, summarize_locations, SummaryRequest};

mod db;
mod report;

#[derive(Parser)]
#[command(name = "store-ops")]
#[command(about = "Location performance rollups, trend labels and risk flags", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load three demo locations with two weeks of activity
    Seed,
    /// Import records from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: ImportArg,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank locations that need attention
    Score {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print every visible summary as JSON instead of the ranked list
        #[arg(long)]
        json: bool,
    },
    /// Compare one location against the visible cohort
    Benchmark {
        #[arg(long)]
        location: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportArg {
    Locations,
    Sales,
    Reviews,
    Inventory,
}

impl From<ImportArg> for db::ImportKind {
    fn from(value: ImportArg) -> Self {
        match value {
            ImportArg::Locations => db::ImportKind::Locations,
            ImportArg::Sales => db::ImportKind::Sales,
            ImportArg::Reviews => db::ImportKind::Reviews,
            ImportArg::Inventory => db::ImportKind::Inventory,
        }
    }
}

#[derive(Args, Clone)]
#[command(group(
    ArgGroup::new("window")
        .args(["start", "since_days"])
        .multiple(false)
))]
struct ViewArgs {
    /// First day of the window (inclusive)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Window length in days ending at --end
    #[arg(long, default_value_t = 28)]
    since_days: i64,
    /// Last day of the window (inclusive), defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Date the trend windows end on, defaults to --end
    #[arg(long)]
    as_of: Option<NaiveDate>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    /// Only keep locations flagged as needing attention
    #[arg(long)]
    attention_only: bool,
}

impl ViewArgs {
    fn window(&self) -> (NaiveDate, NaiveDate) {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = self
            .start
            .unwrap_or_else(|| end - Duration::days(self.since_days.max(1) - 1));
        (start, end)
    }

    fn filter(&self) -> CohortFilter {
        CohortFilter {
            search: self.search.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            needs_attention_only: self.attention_only,
        }
    }

    fn scope_label(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.search, &self.city, &self.state]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

struct View {
    start: NaiveDate,
    end: NaiveDate,
    locations: Vec<Location>,
    records: store_ops_analytics::RecordSet,
    summaries: Vec<LocationSummary>,
}

async fn load_view(pool: &PgPool, args: &ViewArgs) -> anyhow::Result<View> {
    let (start, end) = args.window();
    let as_of = args.as_of.unwrap_or(end);

    let locations = db::fetch_locations(pool).await?;
    let records = db::fetch_record_set(pool, start, end, as_of).await?;
    let request = SummaryRequest {
        as_of: Some(as_of),
        ..SummaryRequest::new(start, end)
    };
    let all = summarize_locations(&records, &locations, request)?;
    let summaries = args.filter().apply(&locations, &all);
    info!(total = all.len(), visible = summaries.len(), %start, %end, "built location summaries");

    Ok(View {
        start,
        end,
        locations,
        records,
        summaries,
    })
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the store operations Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { kind, csv } => {
            let inserted = db::import_csv(&pool, kind.into(), &csv).await?;
            println!("Inserted {inserted} rows from {}.", csv.display());
        }
        Commands::Score { view, limit, json } => {
            let loaded = load_view(&pool, &view).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&loaded.summaries)?);
                return Ok(());
            }

            let ranked = risk::rank_at_risk(&loaded.summaries);
            if ranked.is_empty() {
                println!("No locations need attention for {} to {}.", loaded.start, loaded.end);
                return Ok(());
            }

            println!("Locations needing attention:");
            for summary in ranked.iter().take(limit) {
                println!(
                    "- {} score {:.2} (trend {}, rating {}, waste ${:.2})",
                    report::display_name(&loaded.locations, &summary.location_id),
                    summary.risk_score.unwrap_or(0.0),
                    summary.trend,
                    report::format_rating(summary),
                    summary.waste_cost
                );
            }
        }
        Commands::Benchmark { location, view } => {
            let loaded = load_view(&pool, &view).await?;
            let summary = loaded
                .summaries
                .iter()
                .find(|summary| summary.location_id == location)
                .with_context(|| format!("location {location} is not in the visible cohort"))?;

            let result = cohort::benchmark_location(summary, &loaded.summaries);
            println!(
                "{} against {} visible locations:",
                report::display_name(&loaded.locations, &location),
                result.cohort_size
            );
            let rows = [
                ("revenue", result.revenue),
                ("average order value", result.average_order_value),
                ("waste cost", result.waste_cost),
            ];
            for (label, benchmark) in rows {
                match benchmark {
                    Some(benchmark) => println!(
                        "- {}: {} ({})",
                        label,
                        benchmark
                            .ratio
                            .map(|ratio| format!("{:.2}x cohort mean", ratio))
                            .unwrap_or_else(|| "cohort mean is zero".to_string()),
                        if benchmark.is_above_average { "at or better than peers" } else { "behind peers" }
                    ),
                    None => println!("- {}: no data", label),
                }
            }
        }
        Commands::Report { view, out } => {
            let loaded = load_view(&pool, &view).await?;
            let waste_by_category =
                aggregate::waste_cost_by_category(&loaded.records.inventory, loaded.start, loaded.end)?;
            let scope = view.scope_label();
            let ctx = report::ReportContext {
                scope: scope.as_deref(),
                start: loaded.start,
                end: loaded.end,
                locations: &loaded.locations,
                summaries: &loaded.summaries,
                waste_by_category: &waste_by_category,
            };
            std::fs::write(&out, report::build_report(&ctx))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
