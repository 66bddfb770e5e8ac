//! The auction coordinator: owner of the ledger and the wallet.
//!
//! The coordinator runs as a single task. It reads the slot and market
//! state published by the periodic tasks, serializes every command it
//! receives over its `mpsc` channel, and publishes the ledger and wallet
//! through `watch` channels after each change. No other task touches the
//! ledger or the wallet, so nothing here needs a lock.

use std::sync::Arc;

use chronos_ledger::{BidLedger, LedgerError, LedgerSummary};
use chronos_types::{Bid, MarketState, WalletId};
use rand::rngs::SmallRng;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::runner::StopSignal;
use crate::time::TimeSource;
use crate::wallet::{generate_bid_id, generate_wallet};

/// A request to the coordinator, carrying its reply channel.
#[derive(Debug)]
pub enum Command {
    /// Synthesize a new wallet identity, replacing any previous one.
    ConnectWallet {
        /// Receives the new identity.
        reply: oneshot::Sender<WalletId>,
    },

    /// Clear the wallet identity.
    DisconnectWallet {
        /// Receives the identity that was cleared, if any.
        reply: oneshot::Sender<Option<WalletId>>,
    },

    /// Submit a bid at the current price and slot.
    SubmitBid {
        /// Receives the recorded bid, or `None` when the command was ignored.
        reply: oneshot::Sender<Option<Bid>>,
    },

    /// Compute aggregate figures over the ledger.
    Summary {
        /// Receives the summary.
        reply: oneshot::Sender<LedgerSummary>,
    },
}

/// Owner of the bid ledger and the connected wallet.
#[derive(Debug)]
pub struct Coordinator {
    time: Arc<dyn TimeSource>,
    rng: SmallRng,
    slot: watch::Receiver<u64>,
    market: watch::Receiver<MarketState>,
    ledger: BidLedger,
    wallet: Option<WalletId>,
    ledger_tx: watch::Sender<Arc<[Bid]>>,
    wallet_tx: watch::Sender<Option<WalletId>>,
}

impl Coordinator {
    /// Create a coordinator reading slot and market state from the given
    /// receivers.
    pub fn new(
        time: Arc<dyn TimeSource>,
        rng: SmallRng,
        slot: watch::Receiver<u64>,
        market: watch::Receiver<MarketState>,
    ) -> Self {
        let (ledger_tx, _) = watch::channel(Arc::<[Bid]>::from(Vec::new()));
        let (wallet_tx, _) = watch::channel(None);
        Self {
            time,
            rng,
            slot,
            market,
            ledger: BidLedger::new(),
            wallet: None,
            ledger_tx,
            wallet_tx,
        }
    }

    /// Subscribe to the ordered ledger.
    pub fn subscribe_ledger(&self) -> watch::Receiver<Arc<[Bid]>> {
        self.ledger_tx.subscribe()
    }

    /// Subscribe to the connected wallet.
    pub fn subscribe_wallet(&self) -> watch::Receiver<Option<WalletId>> {
        self.wallet_tx.subscribe()
    }

    /// The ledger.
    pub const fn ledger(&self) -> &BidLedger {
        &self.ledger
    }

    /// The connected wallet, if any.
    pub const fn wallet(&self) -> Option<&WalletId> {
        self.wallet.as_ref()
    }

    /// Synthesize a wallet identity and make it the connected one.
    pub fn connect_wallet(&mut self) -> WalletId {
        let wallet = generate_wallet(&mut self.rng);
        if let Some(previous) = self.wallet.replace(wallet.clone()) {
            debug!(previous = %previous, "Replacing connected wallet");
        }
        info!(wallet = %wallet, "Wallet connected");
        self.wallet_tx.send_replace(Some(wallet.clone()));
        wallet
    }

    /// Clear the connected wallet. Returns the identity that was cleared.
    pub fn disconnect_wallet(&mut self) -> Option<WalletId> {
        let previous = self.wallet.take();
        match &previous {
            Some(wallet) => {
                info!(wallet = %wallet, "Wallet disconnected");
                self.wallet_tx.send_replace(None);
            }
            None => debug!("Disconnect ignored: no wallet connected"),
        }
        previous
    }

    /// Record a bid at the current price and slot.
    ///
    /// Returns `None`, leaving the ledger unchanged, when no wallet is
    /// connected or the auction no longer accepts bids.
    pub fn submit_bid(&mut self) -> Option<Bid> {
        let Some(wallet) = self.wallet.clone().filter(|wallet| !wallet.is_empty()) else {
            debug!("Bid ignored: no wallet connected");
            return None;
        };

        let market = *self.market.borrow();
        if !market.phase.accepts_bids() {
            debug!(phase = %market.phase, wallet = %wallet, "Bid ignored: auction closed");
            return None;
        }

        let slot = *self.slot.borrow();
        let bid = Bid::new(
            generate_bid_id(&mut self.rng),
            wallet,
            market.current_price,
            self.time.now_ms(),
            slot,
        );

        match self.ledger.record(bid) {
            Ok(recorded) => {
                let recorded = recorded.clone();
                info!(
                    bid_id = %recorded.id(),
                    wallet = %recorded.wallet(),
                    price = %recorded.price(),
                    slot,
                    phase = %market.phase,
                    total_bids = self.ledger.len(),
                    "Bid recorded"
                );
                self.ledger_tx.send_replace(self.ledger.snapshot());
                Some(recorded)
            }
            Err(LedgerError::DuplicateBid { id }) => {
                warn!(bid_id = %id, "Bid ignored: duplicate id");
                None
            }
            Err(err) => {
                warn!(error = %err, "Bid ignored: ledger rejected it");
                None
            }
        }
    }

    /// Aggregate figures over the ledger.
    pub fn summary(&self) -> LedgerSummary {
        self.ledger.summary()
    }

    /// Execute one command and send its reply.
    pub fn handle(&mut self, command: Command) {
        let delivered = match command {
            Command::ConnectWallet { reply } => reply.send(self.connect_wallet()).is_ok(),
            Command::DisconnectWallet { reply } => reply.send(self.disconnect_wallet()).is_ok(),
            Command::SubmitBid { reply } => reply.send(self.submit_bid()).is_ok(),
            Command::Summary { reply } => reply.send(self.summary()).is_ok(),
        };
        if !delivered {
            debug!("Command reply dropped: caller went away");
        }
    }

    /// Serve commands until the stop signal fires or every sender is gone.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, stop: StopSignal) {
        info!("Coordinator started");
        loop {
            tokio::select! {
                () = stop.stopped() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
        info!(total_bids = self.ledger.len(), "Coordinator stopped");
    }
}
