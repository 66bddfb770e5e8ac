//! Final report logged once the auction executes.

use chronos_core::AuctionHandle;
use chronos_core::display::{format_bid_time, format_price, format_slot};
use chronos_ledger::{LedgerSummary, leaderboard};
use tracing::info;

use crate::error::EngineError;

/// Leaderboard rows included in the report.
const LEADERBOARD_ROWS: usize = 10;

/// Log the ledger summary, the target slot and the head of the leaderboard.
pub async fn log_final_report(handle: &AuctionHandle) -> Result<LedgerSummary, EngineError> {
    let summary = handle.ledger_summary().await?;
    let summary_json = serde_json::to_string(&summary).map_err(|e| EngineError::Report {
        message: format!("failed to serialize ledger summary: {e}"),
    })?;

    let state = handle.state();
    info!(
        phase = %state.phase,
        target_slot = %format_slot(handle.target_slot()),
        final_slot = %format_slot(state.current_slot),
        final_price = %format_price(state.current_price),
        total_bids = summary.total_bids,
        total_volume = %summary.total_volume,
        distinct_wallets = summary.distinct_wallets,
        summary = %summary_json,
        "Mint finalized"
    );

    let ledger = handle.subscribe_ledger().borrow().clone();
    let current_wallet = handle.subscribe_wallet().borrow().clone();
    for entry in leaderboard(&ledger, current_wallet.as_ref())
        .iter()
        .take(LEADERBOARD_ROWS)
    {
        info!(
            rank = entry.rank,
            wallet = %entry.bid.wallet(),
            price = %format_price(entry.bid.price()),
            slot = %format_slot(entry.bid.slot()),
            time = %format_bid_time(entry.bid.timestamp_ms()),
            mine = entry.is_current_wallet,
            "Leaderboard"
        );
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chronos_core::config::{AuctionConfig, StartInstant};
    use chronos_core::start_auction;
    use chronos_core::time::ManualTimeSource;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn report_reflects_ledger() {
        let now = 1_700_000_000_000;
        let auction = AuctionConfig {
            start: StartInstant::At { at_ms: now - 150_000 },
            seed: Some(1),
            ..AuctionConfig::default()
        };
        let handle = start_auction(&auction, Arc::new(ManualTimeSource::new(now))).unwrap();
        handle.connect_wallet().await.unwrap();
        handle.submit_bid().await.unwrap().unwrap();
        handle.submit_bid().await.unwrap().unwrap();

        let summary = log_final_report(&handle).await.unwrap();
        assert_eq!(summary.total_bids, 2);
        assert_eq!(summary.highest_price.map(|p| p.to_string()).as_deref(), Some("6.00"));

        handle.shutdown().await.unwrap();
    }
}
