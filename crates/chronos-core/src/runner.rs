//! Auction runner: spawns the periodic tasks and hands back a handle.
//!
//! [`start_auction`] builds the three tasks that make up a running auction:
//!
//! - **Slot clock**: advances the [`SlotClock`] every slot period and
//!   publishes the clamped slot.
//! - **Price engine**: re-evaluates the [`PriceEngine`] every price period,
//!   publishes the market state and samples the price history. On reaching
//!   `Executed` it publishes the terminal state, stops the slot clock and
//!   exits.
//! - **Coordinator**: owns the ledger and wallet and serves commands (see
//!   [`Coordinator`]).
//!
//! Each task owns its state exclusively and observes its own
//! [`StopSignal`]. [`AuctionHandle::shutdown`] signals all of them and
//! awaits their join handles, so no timer outlives the handle.

use std::sync::Arc;
use std::time::Duration;

use chronos_ledger::LedgerSummary;
use chronos_types::{AuctionPhase, AuctionState, Bid, MarketState, PricePoint, WalletId};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::clock::SlotClock;
use crate::config::{AuctionConfig, ConfigError};
use crate::coordinator::{Command, Coordinator};
use crate::history::PriceHistory;
use crate::pricing::{DutchSchedule, PriceEngine};
use crate::time::TimeSource;

/// Capacity of the coordinator's command queue.
const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Errors surfaced by the auction handle.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration was rejected at start.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The coordinator task is gone and can no longer serve commands.
    #[error("auction coordinator has shut down")]
    CoordinatorClosed,

    /// The price engine stopped before the awaited phase was reached.
    #[error("price engine stopped before reaching phase {phase}")]
    PriceEngineStopped {
        /// The phase that was being awaited.
        phase: AuctionPhase,
    },

    /// A task panicked or was cancelled.
    #[error("{task} task failed: {message}")]
    TaskJoin {
        /// Name of the task.
        task: &'static str,
        /// Description of the failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// StopSignal
// ---------------------------------------------------------------------------

/// One-shot cancellation signal observed by a single task.
///
/// Clones share the same signal. Once stopped it stays stopped.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    /// Create an unsignalled stop signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal the task to stop.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal has fired.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// Validate `config`, spawn the auction tasks and return a handle to them.
///
/// The price engine is evaluated once before any task starts, so the first
/// published market state already reflects the configured start instant.
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`RunnerError::Config`] if the configuration is inconsistent.
pub fn start_auction(
    config: &AuctionConfig,
    time: Arc<dyn TimeSource>,
) -> Result<AuctionHandle, RunnerError> {
    config.validate()?;

    let now_ms = time.now_ms();
    let start_ms = config.start.resolve(now_ms);

    let mut engine = PriceEngine::new(DutchSchedule::from_config(&config.pricing), start_ms);
    let market = engine.tick(now_ms);

    let mut history = PriceHistory::from_config(&config.history);
    history.observe(engine.schedule(), start_ms, now_ms);

    let clock = SlotClock::new(config.slots.initial_slot, config.slots.target_slot);
    let (slot_rng, coordinator_rng) = match config.seed {
        Some(seed) => (
            SmallRng::seed_from_u64(seed.wrapping_add(1)),
            SmallRng::seed_from_u64(seed),
        ),
        None => (SmallRng::from_os_rng(), SmallRng::from_os_rng()),
    };

    let (slot_tx, slot_rx) = watch::channel(clock.current());
    let (market_tx, market_rx) = watch::channel(market);
    let (history_tx, history_rx) = watch::channel(history.snapshot());
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

    let coordinator = Coordinator::new(
        Arc::clone(&time),
        coordinator_rng,
        slot_rx.clone(),
        market_rx.clone(),
    );
    let ledger_rx = coordinator.subscribe_ledger();
    let wallet_rx = coordinator.subscribe_wallet();

    info!(
        target_slot = clock.target(),
        initial_slot = clock.current(),
        start_ms,
        elapsed_ms = engine.elapsed_ms(now_ms),
        phase = %market.phase,
        price = %market.current_price,
        seeded = config.seed.is_some(),
        "Auction starting"
    );

    let slot_stop = StopSignal::new();
    let price_stop = StopSignal::new();
    let coordinator_stop = StopSignal::new();

    let slot_task = tokio::spawn(run_slot_clock(SlotClockTask {
        clock,
        rng: slot_rng,
        period: Duration::from_millis(config.slots.tick_interval_ms),
        tx: slot_tx,
        stop: slot_stop.clone(),
    }));

    let price_task = tokio::spawn(run_price_engine(PriceEngineTask {
        engine,
        history,
        time,
        period: Duration::from_millis(config.pricing.tick_interval_ms),
        market_tx,
        history_tx,
        slot_stop: slot_stop.clone(),
        stop: price_stop.clone(),
    }));

    let coordinator_task = tokio::spawn(coordinator.run(command_rx, coordinator_stop.clone()));

    Ok(AuctionHandle {
        target_slot: config.slots.target_slot,
        commands: command_tx,
        slot: slot_rx,
        market: market_rx,
        history: history_rx,
        ledger: ledger_rx,
        wallet: wallet_rx,
        slot_stop,
        price_stop,
        coordinator_stop,
        tasks: vec![
            ("slot clock", slot_task),
            ("price engine", price_task),
            ("coordinator", coordinator_task),
        ],
    })
}

// ---------------------------------------------------------------------------
// Periodic tasks
// ---------------------------------------------------------------------------

struct SlotClockTask {
    clock: SlotClock,
    rng: SmallRng,
    period: Duration,
    tx: watch::Sender<u64>,
    stop: StopSignal,
}

async fn run_slot_clock(task: SlotClockTask) {
    let SlotClockTask {
        mut clock,
        mut rng,
        period,
        tx,
        stop,
    } = task;

    info!(slot = clock.current(), target = clock.target(), "Slot clock started");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first advance is one period in.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = stop.stopped() => break,
            _ = ticker.tick() => {
                let slot = clock.advance(&mut rng);
                tx.send_replace(slot);
                trace!(slot, remaining = clock.slots_remaining(), "Slot advanced");

                if clock.is_at_target() {
                    info!(slot, "Target slot reached");
                    break;
                }
            }
        }
    }

    info!(slot = clock.current(), "Slot clock stopped");
}

struct PriceEngineTask {
    engine: PriceEngine,
    history: PriceHistory,
    time: Arc<dyn TimeSource>,
    period: Duration,
    market_tx: watch::Sender<MarketState>,
    history_tx: watch::Sender<Arc<[PricePoint]>>,
    slot_stop: StopSignal,
    stop: StopSignal,
}

async fn run_price_engine(task: PriceEngineTask) {
    let PriceEngineTask {
        mut engine,
        mut history,
        time,
        period,
        market_tx,
        history_tx,
        slot_stop,
        stop,
    } = task;

    info!(
        start_price = %engine.schedule().start_price(),
        end_price = %engine.schedule().end_price(),
        duration_ms = engine.schedule().duration_ms(),
        build_window_ms = engine.schedule().build_window_ms(),
        "Price engine started"
    );

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = stop.stopped() => break,
            _ = ticker.tick() => {
                // --- Re-evaluate the schedule ---
                let now_ms = time.now_ms();
                let market = engine.tick(now_ms);
                market_tx.send_replace(market);
                trace!(
                    price = %market.current_price,
                    phase = %market.phase,
                    time_remaining_ms = market.time_remaining_ms,
                    "Price tick"
                );

                // --- Sample the chart ---
                if history.observe(engine.schedule(), engine.start_ms(), now_ms).is_some() {
                    history_tx.send_replace(history.snapshot());
                }

                // --- Terminal phase ---
                if market.phase.is_terminal() {
                    info!(final_price = %market.current_price, "Auction executed");
                    slot_stop.stop();
                    break;
                }
            }
        }
    }

    info!(phase = %engine.phase(), "Price engine stopped");
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running auction.
///
/// Subscriptions are plain `watch` receivers; commands go through the
/// coordinator. Dropping the handle signals every task to stop without
/// waiting for them; [`shutdown`](Self::shutdown) also joins them.
#[derive(Debug)]
pub struct AuctionHandle {
    target_slot: u64,
    commands: mpsc::Sender<Command>,
    slot: watch::Receiver<u64>,
    market: watch::Receiver<MarketState>,
    history: watch::Receiver<Arc<[PricePoint]>>,
    ledger: watch::Receiver<Arc<[Bid]>>,
    wallet: watch::Receiver<Option<WalletId>>,
    slot_stop: StopSignal,
    price_stop: StopSignal,
    coordinator_stop: StopSignal,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl AuctionHandle {
    /// The slot the auction executes at.
    pub const fn target_slot(&self) -> u64 {
        self.target_slot
    }

    /// Subscribe to the current (clamped) slot.
    pub fn subscribe_slot(&self) -> watch::Receiver<u64> {
        self.slot.clone()
    }

    /// Subscribe to price, phase, and time remaining.
    pub fn subscribe_market(&self) -> watch::Receiver<MarketState> {
        self.market.clone()
    }

    /// Subscribe to the price chart samples.
    pub fn subscribe_history(&self) -> watch::Receiver<Arc<[PricePoint]>> {
        self.history.clone()
    }

    /// Subscribe to the full ordered ledger.
    pub fn subscribe_ledger(&self) -> watch::Receiver<Arc<[Bid]>> {
        self.ledger.clone()
    }

    /// Subscribe to the connected wallet.
    pub fn subscribe_wallet(&self) -> watch::Receiver<Option<WalletId>> {
        self.wallet.clone()
    }

    /// Combined snapshot of slot and market state.
    pub fn state(&self) -> AuctionState {
        AuctionState::from_parts(self.target_slot, *self.slot.borrow(), *self.market.borrow())
    }

    /// Synthesize a wallet identity, replacing any connected one.
    pub async fn connect_wallet(&self) -> Result<WalletId, RunnerError> {
        self.request(|reply| Command::ConnectWallet { reply }).await
    }

    /// Clear the connected wallet. Returns the identity that was cleared.
    pub async fn disconnect_wallet(&self) -> Result<Option<WalletId>, RunnerError> {
        self.request(|reply| Command::DisconnectWallet { reply }).await
    }

    /// Submit a bid at the current price and slot.
    ///
    /// Returns `Ok(None)` when the bid was ignored (no wallet connected, or
    /// the auction has executed).
    pub async fn submit_bid(&self) -> Result<Option<Bid>, RunnerError> {
        self.request(|reply| Command::SubmitBid { reply }).await
    }

    /// Aggregate figures over the ledger.
    pub async fn ledger_summary(&self) -> Result<LedgerSummary, RunnerError> {
        self.request(|reply| Command::Summary { reply }).await
    }

    /// Wait until the auction reaches `phase` (or a later one).
    pub async fn wait_for_phase(&self, phase: AuctionPhase) -> Result<MarketState, RunnerError> {
        let mut market = self.market.clone();
        market
            .wait_for(|state| state.phase >= phase)
            .await
            .map(|state| *state)
            .map_err(|_err| RunnerError::PriceEngineStopped { phase })
    }

    /// Stop the slot clock. The published slot stays at its last value.
    pub fn stop_slot_clock(&self) {
        info!("Stopping slot clock");
        self.slot_stop.stop();
    }

    /// Stop the price engine. The published market state stays at its last
    /// value.
    pub fn stop_price_engine(&self) {
        info!("Stopping price engine");
        self.price_stop.stop();
    }

    /// Stop every task and wait for all of them to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::TaskJoin`] for the first task that panicked.
    /// Every task is awaited regardless.
    pub async fn shutdown(mut self) -> Result<(), RunnerError> {
        info!("Auction shutting down");
        self.stop_all();

        let mut first_error = None;
        for (task, handle) in std::mem::take(&mut self.tasks) {
            if let Err(err) = handle.await {
                warn!(task, error = %err, "Auction task failed");
                first_error.get_or_insert(RunnerError::TaskJoin {
                    task,
                    message: err.to_string(),
                });
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("Auction shut down");
                Ok(())
            }
        }
    }

    fn stop_all(&self) {
        self.slot_stop.stop();
        self.price_stop.stop();
        self.coordinator_stop.stop();
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RunnerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_err| RunnerError::CoordinatorClosed)?;
        response.await.map_err(|_err| RunnerError::CoordinatorClosed)
    }
}

impl Drop for AuctionHandle {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            debug!("Auction handle dropped, stopping tasks");
        }
        self.stop_all();
    }
}
