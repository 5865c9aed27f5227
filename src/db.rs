use std::path::Path;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use store_ops_analytics::models::{
    InventoryCategory, InventoryEvent, Location, OrderType, RecordSet, ReviewEvent, SalesEvent,
};
use store_ops_analytics::trend::TREND_WINDOW_DAYS;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Three demo stores with the last 14 days of activity.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let locations = vec![
        ("ATX-001", "Congress Ave Kitchen", "Austin", "TX"),
        ("DAL-002", "Deep Ellum Diner", "Dallas", "TX"),
        ("PDX-003", "Pearl District Deli", "Portland", "OR"),
    ];

    for (id, name, city, state) in &locations {
        upsert_location(pool, id, name, city, state).await?;
    }

    let today = Utc::now().date_naive();
    for offset in 0..(2 * TREND_WINDOW_DAYS) {
        let date = today - Duration::days(2 * TREND_WINDOW_DAYS - 1 - offset);
        let second_week = offset >= TREND_WINDOW_DAYS;

        // Austin ramps up, Dallas holds steady, Portland falls off.
        let daily = [
            ("ATX-001", if second_week { 2000.0 } else { 1000.0 }),
            ("DAL-002", 1500.0),
            ("PDX-003", if second_week { 500.0 } else { 2000.0 }),
        ];

        for (location_id, revenue) in daily {
            let sales = [
                (OrderType::DineIn, revenue * 0.5, 40),
                (OrderType::Takeout, revenue * 0.3, 25),
                (OrderType::Delivery, revenue * 0.2, 12),
            ];
            for (order_type, amount, orders) in sales {
                let source_key = format!("seed-sale-{location_id}-{date}-{order_type}");
                insert_sale(pool, location_id, date, order_type, amount, orders, &source_key).await?;
            }
        }

        if offset % 3 == 0 {
            let reviews = [("ATX-001", 4.6), ("PDX-003", 2.8)];
            for (location_id, rating) in reviews {
                let source_key = format!("seed-review-{location_id}-{date}");
                insert_review(pool, location_id, date, rating, &source_key).await?;
            }
        }

        let waste = [
            ("ATX-001", InventoryCategory::Produce, 12.0, 4.0),
            ("DAL-002", InventoryCategory::Protein, 95.0, 11.0),
            ("PDX-003", InventoryCategory::Dairy, 30.0, 6.0),
        ];
        for (location_id, category, cost, units) in waste {
            let source_key = format!("seed-waste-{location_id}-{date}-{category}");
            insert_inventory(pool, location_id, date, category, cost, units, &source_key).await?;
        }
    }

    Ok(())
}

pub async fn fetch_locations(pool: &PgPool) -> anyhow::Result<Vec<Location>> {
    let rows = sqlx::query("SELECT id, name, city, state FROM store_ops.locations ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Location {
            id: row.get("id"),
            name: row.get("name"),
            city: row.get("city"),
            state: row.get("state"),
        })
        .collect())
}

/// Loads events for `[start, end]`. Sales reach back far enough to cover both
/// trend windows ending at `as_of`.
pub async fn fetch_record_set(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
    as_of: NaiveDate,
) -> anyhow::Result<RecordSet> {
    let sales_start = start.min(as_of - Duration::days(2 * TREND_WINDOW_DAYS - 1));
    let sales_end = end.max(as_of);

    let mut sales = Vec::new();
    let rows = sqlx::query(
        "SELECT location_id, occurred_on, order_type, revenue, order_count \
         FROM store_ops.sales_events \
         WHERE occurred_on BETWEEN $1 AND $2",
    )
    .bind(sales_start)
    .bind(sales_end)
    .fetch_all(pool)
    .await?;

    for row in rows {
        let order_type: String = row.get("order_type");
        let order_count: i32 = row.get("order_count");
        sales.push(SalesEvent {
            location_id: row.get("location_id"),
            date: row.get("occurred_on"),
            order_type: order_type.parse()?,
            revenue: row.get("revenue"),
            order_count: u32::try_from(order_count).context("negative order count in sales_events")?,
        });
    }

    let reviews = sqlx::query(
        "SELECT location_id, occurred_on, rating \
         FROM store_ops.review_events \
         WHERE occurred_on BETWEEN $1 AND $2",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| ReviewEvent {
        location_id: row.get("location_id"),
        date: row.get("occurred_on"),
        rating: row.get("rating"),
    })
    .collect::<Vec<_>>();

    let mut inventory = Vec::new();
    let rows = sqlx::query(
        "SELECT location_id, occurred_on, category, waste_cost, units_wasted \
         FROM store_ops.inventory_events \
         WHERE occurred_on BETWEEN $1 AND $2",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    for row in rows {
        let category: String = row.get("category");
        inventory.push(InventoryEvent {
            location_id: row.get("location_id"),
            date: row.get("occurred_on"),
            category: category.parse()?,
            waste_cost: row.get("waste_cost"),
            units_wasted: row.get("units_wasted"),
        });
    }

    info!(
        sales = sales.len(),
        reviews = reviews.len(),
        inventory = inventory.len(),
        "loaded record set"
    );

    Ok(RecordSet {
        sales,
        reviews,
        inventory,
    })
}

#[derive(Debug, Clone, Copy)]
pub enum ImportKind {
    Locations,
    Sales,
    Reviews,
    Inventory,
}

pub async fn import_csv(pool: &PgPool, kind: ImportKind, csv_path: &Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    match kind {
        ImportKind::Locations => {
            for result in reader.deserialize::<Location>() {
                let row = result?;
                upsert_location(pool, &row.id, &row.name, &row.city, &row.state).await?;
                inserted += 1;
            }
        }
        ImportKind::Sales => {
            #[derive(serde::Deserialize)]
            struct CsvRow {
                location_id: String,
                date: NaiveDate,
                order_type: String,
                revenue: f64,
                order_count: u32,
                source_key: Option<String>,
            }

            for result in reader.deserialize::<CsvRow>() {
                let row = result?;
                let order_type: OrderType = row.order_type.parse()?;
                let source_key = source_key_or_new(row.source_key);
                if insert_sale(pool, &row.location_id, row.date, order_type, row.revenue, row.order_count, &source_key)
                    .await?
                {
                    inserted += 1;
                }
            }
        }
        ImportKind::Reviews => {
            #[derive(serde::Deserialize)]
            struct CsvRow {
                location_id: String,
                date: NaiveDate,
                rating: f64,
                source_key: Option<String>,
            }

            for result in reader.deserialize::<CsvRow>() {
                let row = result?;
                let source_key = source_key_or_new(row.source_key);
                if insert_review(pool, &row.location_id, row.date, row.rating, &source_key).await? {
                    inserted += 1;
                }
            }
        }
        ImportKind::Inventory => {
            #[derive(serde::Deserialize)]
            struct CsvRow {
                location_id: String,
                date: NaiveDate,
                category: String,
                waste_cost: f64,
                units_wasted: f64,
                source_key: Option<String>,
            }

            for result in reader.deserialize::<CsvRow>() {
                let row = result?;
                let category: InventoryCategory = row.category.parse()?;
                let source_key = source_key_or_new(row.source_key);
                if insert_inventory(
                    pool,
                    &row.location_id,
                    row.date,
                    category,
                    row.waste_cost,
                    row.units_wasted,
                    &source_key,
                )
                .await?
                {
                    inserted += 1;
                }
            }
        }
    }

    info!(?kind, inserted, path = %csv_path.display(), "csv import finished");
    Ok(inserted)
}

fn source_key_or_new(source_key: Option<String>) -> String {
    source_key.unwrap_or_else(|| format!("import-{}", Uuid::new_v4()))
}

async fn upsert_location(pool: &PgPool, id: &str, name: &str, city: &str, state: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO store_ops.locations (id, name, city, state)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, city = EXCLUDED.city, state = EXCLUDED.state
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(city)
    .bind(state)
    .execute(pool)
    .await?;
    Ok(())
}

async fn insert_sale(
    pool: &PgPool,
    location_id: &str,
    date: NaiveDate,
    order_type: OrderType,
    revenue: f64,
    order_count: u32,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO store_ops.sales_events
        (id, location_id, occurred_on, order_type, revenue, order_count, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(location_id)
    .bind(date)
    .bind(order_type.as_str())
    .bind(revenue)
    .bind(i32::try_from(order_count).context("order count out of range")?)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_review(
    pool: &PgPool,
    location_id: &str,
    date: NaiveDate,
    rating: f64,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO store_ops.review_events
        (id, location_id, occurred_on, rating, source_key)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(location_id)
    .bind(date)
    .bind(rating)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_inventory(
    pool: &PgPool,
    location_id: &str,
    date: NaiveDate,
    category: InventoryCategory,
    waste_cost: f64,
    units_wasted: f64,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO store_ops.inventory_events
        (id, location_id, occurred_on, category, waste_cost, units_wasted, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(location_id)
    .bind(date)
    .bind(category.as_str())
    .bind(waste_cost)
    .bind(units_wasted)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
