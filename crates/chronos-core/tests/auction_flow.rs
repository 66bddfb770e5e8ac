//! End-to-end tests for a running auction.
//!
//! Every test runs on a paused Tokio clock so the auction's five and a half
//! minutes pass in virtual time. Wall-clock time comes either from
//! [`TokioTimeSource`] (moves with the paused clock) or from
//! [`ManualTimeSource`] (moves only when the test says so).

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chronos_core::config::{AuctionConfig, StartInstant};
use chronos_core::time::{ManualTimeSource, TokioTimeSource};
use chronos_core::{RunnerError, start_auction};
use chronos_ledger::leaderboard;
use chronos_types::{AuctionPhase, Bid};
use rust_decimal_macros::dec;

const T0: i64 = 1_700_000_000_000;

fn config_started(ago_ms: i64) -> AuctionConfig {
    AuctionConfig {
        start: StartInstant::At { at_ms: T0 - ago_ms },
        seed: Some(2024),
        ..AuctionConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn full_auction_lifecycle() {
    let handle = start_auction(
        &config_started(290_000),
        Arc::new(TokioTimeSource::new(T0)),
    )
    .unwrap();

    // No wallet yet: ignored.
    assert!(handle.submit_bid().await.unwrap().is_none());
    assert!(handle.subscribe_ledger().borrow().is_empty());

    let wallet = handle.connect_wallet().await.unwrap();
    assert_eq!(handle.subscribe_wallet().borrow().as_ref(), Some(&wallet));

    // Active: price about 2.27 with ten seconds left.
    let active_bid = handle.submit_bid().await.unwrap().unwrap();
    assert_eq!(active_bid.price(), dec!(2.27));
    assert_eq!(handle.state().phase, AuctionPhase::Active);

    // Building: bids still accepted at the frozen price.
    let building = handle.wait_for_phase(AuctionPhase::Building).await.unwrap();
    assert_eq!(building.time_remaining_ms, 0);
    let building_bid = handle.submit_bid().await.unwrap().unwrap();
    assert!(building_bid.price() <= active_bid.price());
    assert!(building_bid.price() >= dec!(2.00));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.state().current_price, building.current_price);

    // Executed: terminal, bids ignored.
    let executed = handle.wait_for_phase(AuctionPhase::Executed).await.unwrap();
    assert_eq!(executed.current_price, building.current_price);
    assert!(handle.submit_bid().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_secs(30)).await;
    let state = handle.state();
    assert_eq!(state.phase, AuctionPhase::Executed);
    assert!(state.current_slot <= handle.target_slot());

    let ledger = handle.subscribe_ledger().borrow().clone();
    assert_eq!(ledger.len(), 2);
    assert!(
        ledger
            .windows(2)
            .all(|pair| pair.first().unwrap().timestamp_ms() <= pair.get(1).unwrap().timestamp_ms())
    );

    let summary = handle.ledger_summary().await.unwrap();
    assert_eq!(summary.total_bids, 2);
    assert_eq!(summary.distinct_wallets, 1);

    let board = leaderboard(&ledger, Some(&wallet));
    assert!(board.iter().all(|entry| entry.is_current_wallet));
    assert_eq!(board.last().map(|entry| entry.rank), Some(2));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slot_never_passes_target() {
    let mut config = config_started(0);
    config.slots.initial_slot = config.slots.target_slot - 20;
    let handle = start_auction(&config, Arc::new(TokioTimeSource::new(T0))).unwrap();
    let mut slots = handle.subscribe_slot();

    let mut previous = *slots.borrow();
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(400)).await;
        let slot = *slots.borrow_and_update();
        assert!(slot >= previous);
        assert!(slot <= handle.target_slot());
        previous = slot;
    }
    assert_eq!(previous, handle.target_slot());

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn skewed_clock_bids_are_ordered() {
    let clock = ManualTimeSource::new(T0);
    let handle = start_auction(&config_started(10_000), Arc::new(clock.clone())).unwrap();
    handle.connect_wallet().await.unwrap();

    let (t1, t2, t3) = (T0 + 1_000, T0 + 2_000, T0 + 3_000);
    for t in [t2, t1, t3] {
        clock.set(t);
        handle.submit_bid().await.unwrap().unwrap();
    }

    let order: Vec<i64> = handle
        .subscribe_ledger()
        .borrow()
        .iter()
        .map(Bid::timestamp_ms)
        .collect();
    assert_eq!(order, vec![t1, t2, t3]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn price_matches_schedule_at_half_window() {
    let clock = ManualTimeSource::new(T0);
    let handle = start_auction(&config_started(150_000), Arc::new(clock.clone())).unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    let state = handle.state();
    assert_eq!(state.phase, AuctionPhase::Active);
    assert_eq!(state.current_price, dec!(6));
    assert_eq!(state.time_remaining_ms, 150_000);

    clock.set(T0 + 150_000);
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(handle.state().phase, AuctionPhase::Building);
    assert_eq!(handle.state().current_price, dec!(6));

    clock.set(T0 + 180_000);
    let market = handle.wait_for_phase(AuctionPhase::Executed).await.unwrap();
    assert_eq!(market.phase, AuctionPhase::Executed);

    // A clock jumping backwards cannot reopen the auction.
    clock.set(T0);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.state().phase, AuctionPhase::Executed);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn history_is_bounded() {
    let handle = start_auction(&config_started(0), Arc::new(TokioTimeSource::new(T0))).unwrap();

    tokio::time::sleep(Duration::from_secs(90)).await;
    let history = handle.subscribe_history().borrow().clone();
    assert_eq!(history.len(), 60);
    let last = history.last().unwrap();
    assert!(last.elapsed_secs >= 89);
    assert!(
        history
            .windows(2)
            .all(|pair| pair.first().unwrap().price >= pair.get(1).unwrap().price)
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stopped_price_engine_ends_phase_wait() {
    let handle = start_auction(&config_started(0), Arc::new(ManualTimeSource::new(T0))).unwrap();
    let summary = handle.ledger_summary().await.unwrap();
    assert_eq!(summary.total_bids, 0);
    handle.shutdown().await.unwrap();

    let handle = start_auction(&config_started(0), Arc::new(ManualTimeSource::new(T0))).unwrap();
    handle.stop_price_engine();
    handle.stop_slot_clock();
    let err = handle.wait_for_phase(AuctionPhase::Executed).await.unwrap_err();
    assert!(matches!(err, RunnerError::PriceEngineStopped { .. }));
    handle.shutdown().await.unwrap();
}
