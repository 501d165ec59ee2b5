//! Database layer: migrations, cursor, event writes and read models.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::events::{EventKind, EventRecord, SaleEvent, SaleSummary};

const EVENT_COLUMNS: &str = "id, event_type, relay_id, actor, stable_coin, amount, \
     raised_amount, ledger, timestamp, contract_id, tx_hash, created_at";

/// Open a SQLite pool (creating the file when missing) and migrate it.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let url = if url.contains('?') || url.contains(":memory:") {
        url
    } else {
        format!("{url}?mode=rwc")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations applied");
    Ok(())
}

// ── Cursor ───────────────────────────────────────────────

/// Last-seen ledger, `0` when nothing was persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

// ── Writes ───────────────────────────────────────────────

/// Store a batch of events in one transaction. Rows already present
/// (same ledger, tx, type, relay and amount) are skipped, so re-polling a
/// ledger range is harmless. Returns the number of new rows.
pub async fn insert_events(pool: &SqlitePool, events: &[SaleEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_type, relay_id, actor, stable_coin, amount, raised_amount,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ev.event_type)
        .bind(&ev.relay_id)
        .bind(&ev.actor)
        .bind(&ev.stable_coin)
        .bind(&ev.amount)
        .bind(&ev.raised_amount)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?;
        count += result.rows_affected() as usize;
    }
    tx.commit().await?;
    Ok(count)
}

// ── Reads ────────────────────────────────────────────────

pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    Ok(sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?)
}

pub async fn get_events_for_relay(pool: &SqlitePool, relay_id: &str) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE relay_id = ?1 ORDER BY ledger ASC, id ASC"
    );
    Ok(sqlx::query_as::<_, EventRecord>(&sql)
        .bind(relay_id)
        .fetch_all(pool)
        .await?)
}

pub async fn get_events_for_contributor(
    pool: &SqlitePool,
    contributor: &str,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events \
         WHERE actor = ?1 AND event_type != ?2 ORDER BY ledger ASC, id ASC"
    );
    Ok(sqlx::query_as::<_, EventRecord>(&sql)
        .bind(contributor)
        .bind(EventKind::SaleStarted.as_str())
        .fetch_all(pool)
        .await?)
}

/// Rebuild the sale status and raised amount from indexed events.
///
/// Status follows the latest lifecycle event; the raised amount is the one
/// carried by the latest event that reports it.
pub async fn sale_summary(pool: &SqlitePool) -> Result<SaleSummary> {
    let lifecycle = [
        EventKind::SaleStarted,
        EventKind::SoftCapReached,
        EventKind::SaleFinished,
        EventKind::SaleFailed,
    ];
    let placeholders = vec!["?"; lifecycle.len()].join(", ");
    let sql = format!(
        "SELECT event_type FROM events WHERE event_type IN ({placeholders}) \
         ORDER BY ledger DESC, id DESC LIMIT 1"
    );
    let mut query = sqlx::query_as::<_, (String,)>(&sql);
    for kind in &lifecycle {
        query = query.bind(kind.as_str());
    }
    let status = query
        .fetch_optional(pool)
        .await?
        .and_then(|(event_type,)| {
            lifecycle
                .iter()
                .find(|k| k.as_str() == event_type)
                .and_then(EventKind::implied_status)
        })
        .unwrap_or("pending")
        .to_string();

    let raised: Option<(String,)> = sqlx::query_as(
        "SELECT raised_amount FROM events WHERE raised_amount IS NOT NULL \
         ORDER BY ledger DESC, id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    let soft_cap_reached: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM events WHERE event_type = ?1")
            .bind(EventKind::SoftCapReached.as_str())
            .fetch_one(pool)
            .await?;

    let relays: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE event_type = ?1")
        .bind(EventKind::RelayCreated.as_str())
        .fetch_one(pool)
        .await?;

    let contributions: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE event_type = ?1")
        .bind(EventKind::ContributionProcessed.as_str())
        .fetch_one(pool)
        .await?;

    let last_ledger: (Option<i64>,) = sqlx::query_as("SELECT MAX(ledger) FROM events")
        .fetch_one(pool)
        .await?;

    Ok(SaleSummary {
        status,
        raised_amount: raised.map(|(r,)| r).unwrap_or_else(|| "0".to_string()),
        soft_cap_reached: soft_cap_reached.0 > 0,
        relays: relays.0,
        contributions: contributions.0,
        last_ledger: last_ledger.0,
    })
}
