//! Background task that polls the RPC and stores decoded sale events.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Poll until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "indexer starting");

    let (mut current_ledger, mut cursor) = match resume_point(&state).await {
        Ok(point) => point,
        Err(e) => {
            warn!("could not read saved cursor, starting fresh: {e}");
            (state.config.start_ledger, None)
        }
    };
    info!(ledger = current_ledger, "resuming");

    let interval = Duration::from_secs(state.config.poll_interval_secs);
    while !shutdown.is_cancelled() {
        match poll_once(&state, current_ledger, cursor.as_deref(), &shutdown).await {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(e) if e.is_transient() => warn!("indexer poll failed, will retry: {e}"),
            Err(e) => error!("indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!(ledger = current_ledger, "indexer stopped");
}

async fn resume_point(state: &IndexerState) -> Result<(u32, Option<String>)> {
    let last_ledger = db::get_last_ledger(&state.pool).await?;
    let cursor = db::get_cursor_string(&state.pool).await?;
    Ok((next_start_ledger(last_ledger, state.config.start_ledger), cursor))
}

/// The saved ledger wins over the configured one once something was indexed.
fn next_start_ledger(saved: i64, configured: u32) -> u32 {
    match u32::try_from(saved) {
        Ok(ledger) if ledger > 0 => ledger,
        _ => configured,
    }
}

/// One poll: fetch a page, store it, persist the cursor.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    state: &IndexerState,
    start_ledger: u32,
    cursor: Option<&str>,
    shutdown: &CancellationToken,
) -> Result<(u32, Option<String>)> {
    let config = &state.config;
    let page = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        start_ledger,
        cursor,
        config.events_per_page,
        shutdown,
    )
    .await?;

    if shutdown.is_cancelled() {
        return Ok((start_ledger, cursor.map(String::from)));
    }

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            raw = page.events.len(),
            stored = inserted,
            "polled sale events"
        );
    }

    // A cursor keeps paginating the same range; otherwise jump to the tip.
    let next_ledger = page
        .latest_ledger
        .and_then(|l| u32::try_from(l).ok())
        .map_or(start_ledger, |l| l.max(start_ledger));
    let next_cursor = page.cursor.or_else(|| cursor.map(String::from));

    db::save_cursor(&state.pool, i64::from(next_ledger), next_cursor.as_deref()).await?;

    Ok((next_ledger, next_cursor))
}
