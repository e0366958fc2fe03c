//! Automation controller
//!
//! Owns every piece of mutable engine state (order tracker, pending guard,
//! per-instrument modes, activity log) and mutates it from exactly one task:
//! a single event loop consuming control commands, feed snapshots, and
//! command acknowledgments. Feed bursts are coalesced into one tick, and a
//! fallback interval re-runs the last snapshot so a quiet feed cannot stall
//! guard expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::TradingBackend;
use crate::config::{BotConfig, PolicyConfig};
use crate::engine::activity::{ActivityEntry, ActivityLog};
use crate::engine::decision::{self, ExclusionFilter, PairView, QuoteAction};
use crate::engine::dispatcher::{AckPayload, CommandAck, DispatchCommand, Dispatcher};
use crate::engine::pending::PendingGuard;
use crate::engine::tracker::OrderTracker;
use crate::errors::ControllerError;
use crate::feed::{FeedPoller, FeedSnapshot};
use crate::types::{MarketSide, OrderStatus, PairKey, QuoteMode, RestingOrder, Ticker};

/// Operator-facing commands, answered over oneshot channels
#[derive(Debug)]
pub enum ControlCommand {
    SetMode {
        ticker: Ticker,
        mode: QuoteMode,
        reply: oneshot::Sender<Result<(), ControllerError>>,
    },
    GetModes {
        reply: oneshot::Sender<HashMap<Ticker, QuoteMode>>,
    },
    GetActivityLog {
        reply: oneshot::Sender<Vec<ActivityEntry>>,
    },
    DisableAll {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Cheaply cloneable handle the operator layer talks to the engine through
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<ControlCommand>,
}

impl ControllerHandle {
    pub async fn set_mode(&self, ticker: Ticker, mode: QuoteMode) -> Result<(), ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ControlCommand::SetMode { ticker, mode, reply })
            .await
            .map_err(|_| ControllerError::NotRunning)?;
        rx.await.map_err(|_| ControllerError::NotRunning)?
    }

    pub async fn modes(&self) -> Result<HashMap<Ticker, QuoteMode>, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ControlCommand::GetModes { reply })
            .await
            .map_err(|_| ControllerError::NotRunning)?;
        rx.await.map_err(|_| ControllerError::NotRunning)
    }

    pub async fn activity_log(&self) -> Result<Vec<ActivityEntry>, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ControlCommand::GetActivityLog { reply })
            .await
            .map_err(|_| ControllerError::NotRunning)?;
        rx.await.map_err(|_| ControllerError::NotRunning)
    }

    pub async fn disable_all(&self) -> Result<(), ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ControlCommand::DisableAll { reply })
            .await
            .map_err(|_| ControllerError::NotRunning)?;
        rx.await.map_err(|_| ControllerError::NotRunning)
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(ControlCommand::Shutdown).await;
    }
}

pub struct AutomationController {
    policy: PolicyConfig,
    exclusion: ExclusionFilter,
    /// Instrument registry: known tickers and their display titles
    titles: HashMap<Ticker, String>,
    modes: HashMap<Ticker, QuoteMode>,
    /// Modes published to the feed poller
    modes_tx: watch::Sender<HashMap<Ticker, QuoteMode>>,
    tracker: OrderTracker,
    guard: PendingGuard,
    activity: ActivityLog,
    dispatcher: Dispatcher,
    /// Most recent coherent world view; re-evaluated on fallback ticks
    last_snapshot: Option<FeedSnapshot>,
    fallback_tick: Duration,
}

impl AutomationController {
    pub fn new(
        config: &BotConfig,
        dispatcher: Dispatcher,
        modes_tx: watch::Sender<HashMap<Ticker, QuoteMode>>,
    ) -> Self {
        let titles: HashMap<Ticker, String> = config
            .instruments
            .iter()
            .map(|i| (Ticker::from(i.ticker.as_str()), i.title.clone()))
            .collect();
        // Every known instrument starts off; automation is opt-in per pair
        let modes: HashMap<Ticker, QuoteMode> =
            titles.keys().map(|t| (t.clone(), QuoteMode::Off)).collect();

        Self {
            policy: config.policy.clone(),
            exclusion: ExclusionFilter::from_policy(&config.policy),
            titles,
            modes,
            modes_tx,
            tracker: OrderTracker::new(),
            guard: PendingGuard::new(),
            activity: ActivityLog::new(),
            dispatcher,
            last_snapshot: None,
            fallback_tick: config.poll_interval(),
        }
    }

    /// Wire up and start the full engine: dispatcher, feed poller, and the
    /// controller event loop. Returns the operator handle and the loop's task.
    pub fn spawn(
        config: BotConfig,
        backend: Arc<dyn TradingBackend>,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (ack_tx, ack_rx) = mpsc::channel(64);
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let (modes_tx, modes_rx) = watch::channel(HashMap::new());

        let dispatcher = Dispatcher::new(Arc::clone(&backend), ack_tx);
        let poller = FeedPoller::new(backend, modes_rx, feed_tx, config.poll_interval());
        let controller = Self::new(&config, dispatcher, modes_tx);

        let join = tokio::spawn(async move {
            let poller_task = tokio::spawn(poller.run());
            controller.run(cmd_rx, feed_rx, ack_rx).await;
            poller_task.abort();
        });

        (ControllerHandle { commands: cmd_tx }, join)
    }

    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<ControlCommand>,
        mut feed_rx: mpsc::Receiver<FeedSnapshot>,
        mut ack_rx: mpsc::Receiver<CommandAck>,
    ) {
        info!(
            instruments = self.titles.len(),
            fallback_ms = self.fallback_tick.as_millis() as u64,
            "Automation controller started"
        );
        let mut fallback = tokio::time::interval(self.fallback_tick);
        fallback.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if !self.handle_control(cmd) {
                                break;
                            }
                        }
                        // All operator handles dropped
                        None => break,
                    }
                }
                Some(snapshot) = feed_rx.recv() => {
                    // Coalesce a burst of snapshots into one tick
                    let mut latest = snapshot;
                    let mut coalesced = 0usize;
                    while let Ok(next) = feed_rx.try_recv() {
                        latest = next;
                        coalesced += 1;
                    }
                    if coalesced > 0 {
                        debug!(coalesced, "Coalesced feed burst");
                    }
                    self.apply_snapshot(latest);
                    self.run_tick(Instant::now());
                }
                Some(ack) = ack_rx.recv() => {
                    self.handle_ack(ack, Instant::now());
                }
                _ = fallback.tick() => {
                    self.run_tick(Instant::now());
                }
            }
        }
        info!("Automation controller stopped");
    }

    /// Returns false when the loop should exit
    fn handle_control(&mut self, cmd: ControlCommand) -> bool {
        match cmd {
            ControlCommand::SetMode { ticker, mode, reply } => {
                let _ = reply.send(self.set_mode(ticker, mode));
            }
            ControlCommand::GetModes { reply } => {
                let _ = reply.send(self.modes.clone());
            }
            ControlCommand::GetActivityLog { reply } => {
                let _ = reply.send(self.activity.entries());
            }
            ControlCommand::DisableAll { reply } => {
                self.disable_all();
                let _ = reply.send(());
            }
            ControlCommand::Shutdown => return false,
        }
        true
    }

    /// Enable or disable quoting for one instrument. Unknown tickers are
    /// rejected here and never reach the decision loop.
    pub fn set_mode(&mut self, ticker: Ticker, mode: QuoteMode) -> Result<(), ControllerError> {
        if !self.titles.contains_key(&ticker) {
            return Err(ControllerError::UnknownInstrument(ticker.0));
        }
        info!(ticker = %ticker, mode = %mode, "Quote mode changed");
        self.modes.insert(ticker, mode);
        self.publish_modes();
        Ok(())
    }

    pub fn disable_all(&mut self) {
        info!("Disabling automation for all instruments");
        for mode in self.modes.values_mut() {
            *mode = QuoteMode::Off;
        }
        self.publish_modes();
    }

    fn publish_modes(&self) {
        let _ = self.modes_tx.send(self.modes.clone());
    }

    /// Reconcile against backend truth and remember the snapshot for
    /// fallback re-evaluation.
    pub fn apply_snapshot(&mut self, snapshot: FeedSnapshot) {
        self.tracker.reconcile(&snapshot.orders);
        self.last_snapshot = Some(snapshot);
    }

    /// One decision cycle over every enabled pair. Individual pairs are
    /// independent; a failure on one never stops the rest.
    pub fn run_tick(&mut self, now: Instant) {
        let released = self.guard.purge_expired(now);
        if released > 0 {
            debug!(released, "Pending guard entries released");
        }

        let Some(snapshot) = &self.last_snapshot else {
            return;
        };

        // Decide first (pure, immutable borrows), then dispatch
        let mut commands: Vec<(PairKey, DispatchCommand)> = Vec::new();
        for (ticker, mode) in &self.modes {
            if mode.is_off() {
                continue;
            }
            let Some(book) = snapshot.books.get(ticker) else {
                // Stale or missing book is a NoAction, not an error
                continue;
            };
            let title = self.titles.get(ticker).map(String::as_str).unwrap_or("");

            for side in [MarketSide::Yes, MarketSide::No] {
                if !mode.allows(side) {
                    continue;
                }
                let key = PairKey::new(ticker.clone(), side);
                if self.guard.contains(&key) {
                    debug!(key = %key, "Command in flight, skipping pair");
                    continue;
                }

                let view = PairView {
                    key: &key,
                    title,
                    book,
                    own_order: self.tracker.get(&key),
                    position_toward: snapshot.positions.position_toward(ticker, side),
                };
                match decision::evaluate(&view, &self.policy, &self.exclusion) {
                    QuoteAction::Hold => {}
                    QuoteAction::Place { price, quantity } => {
                        commands.push((key, DispatchCommand::Place { price, quantity }));
                    }
                    QuoteAction::Cancel { order_id, reason } => {
                        commands.push((key, DispatchCommand::Cancel { order_id, reason }));
                    }
                }
            }
        }

        for (key, command) in commands {
            // Hold the key before the call leaves, so the next tick cannot
            // double-dispatch while this one is in flight. The deadline set
            // here is the no-ack timeout.
            let settle = match &command {
                DispatchCommand::Place { .. } => self.policy.place_settle(),
                DispatchCommand::Cancel { .. } => self.policy.cancel_settle(),
            };
            self.guard.hold(key.clone(), now + settle);

            match &command {
                DispatchCommand::Place { price, quantity } => {
                    self.activity
                        .record_place(key.ticker.clone(), key.side, *price, *quantity);
                }
                DispatchCommand::Cancel { order_id, reason } => {
                    self.activity.record_cancel(
                        key.ticker.clone(),
                        key.side,
                        order_id,
                        &reason.to_string(),
                    );
                }
            }

            self.dispatcher.dispatch(key, command);
        }
    }

    /// Apply a command acknowledgment: optimistic tracker update plus guard
    /// re-arm. Failures leave the guard entry to expire on its own (fail-open).
    pub fn handle_ack(&mut self, ack: CommandAck, now: Instant) {
        match ack.result {
            Ok(AckPayload::Placed { order_id }) => {
                if let DispatchCommand::Place { price, quantity } = ack.command {
                    self.tracker.record_placed(RestingOrder {
                        order_id,
                        ticker: ack.key.ticker.clone(),
                        side: ack.key.side,
                        price,
                        quantity_remaining: quantity,
                        status: OrderStatus::Resting,
                    });
                }
                self.guard.settle(&ack.key, now + self.policy.place_settle());
            }
            Ok(AckPayload::Canceled) => {
                self.tracker.remove(&ack.key);
                self.guard.settle(&ack.key, now + self.policy.cancel_settle());
            }
            Err(detail) => {
                warn!(key = %ack.key, detail = %detail, "Command failed, awaiting guard expiry");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn activity_entries(&self) -> Vec<ActivityEntry> {
        self.activity.entries()
    }

    #[cfg(test)]
    pub(crate) fn mode_of(&self, ticker: &Ticker) -> Option<QuoteMode> {
        self.modes.get(ticker).copied()
    }

    #[cfg(test)]
    pub(crate) fn tracked_orders(&self) -> usize {
        self.tracker.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PlaceOrderRequest;
    use crate::config::InstrumentConfig;
    use crate::engine::activity::ActivityKind;
    use crate::errors::BackendError;
    use crate::feed::{RawOrder, RawOrderBook, RawPosition};
    use crate::types::{BidLevel, OrderBookSnapshot, PositionBook};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every command; queries return empty defaults (the poller is
    /// not running in these tests).
    #[derive(Default)]
    struct MockBackend {
        placed: Mutex<Vec<PlaceOrderRequest>>,
        cancelled: Mutex<Vec<String>>,
        next_id: AtomicUsize,
    }

    impl MockBackend {
        fn place_calls(&self) -> usize {
            self.placed.lock().unwrap().len()
        }

        fn cancel_calls(&self) -> usize {
            self.cancelled.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TradingBackend for MockBackend {
        async fn orderbook(&self, _ticker: &Ticker) -> Result<RawOrderBook, BackendError> {
            Ok(RawOrderBook { yes: None, no: None })
        }

        async fn resting_orders(&self) -> Result<Vec<RawOrder>, BackendError> {
            Ok(Vec::new())
        }

        async fn positions(&self) -> Result<Vec<RawPosition>, BackendError> {
            Ok(Vec::new())
        }

        async fn place_order(&self, request: &PlaceOrderRequest) -> Result<String, BackendError> {
            self.placed.lock().unwrap().push(request.clone());
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(format!("mock-{}", id))
        }

        async fn cancel_order(&self, order_id: &str) -> Result<(), BackendError> {
            self.cancelled.lock().unwrap().push(order_id.to_string());
            Ok(())
        }
    }

    fn test_config() -> BotConfig {
        BotConfig {
            instruments: vec![InstrumentConfig {
                ticker: "KXTEST-A".to_string(),
                title: "Test market".to_string(),
            }],
            ..BotConfig::default()
        }
    }

    fn ticker() -> Ticker {
        Ticker::from("KXTEST-A")
    }

    fn setup(
        backend: Arc<MockBackend>,
    ) -> (AutomationController, mpsc::Receiver<CommandAck>) {
        let (ack_tx, ack_rx) = mpsc::channel(16);
        let (modes_tx, _modes_rx) = watch::channel(HashMap::new());
        let dispatcher = Dispatcher::new(backend, ack_tx);
        (
            AutomationController::new(&test_config(), dispatcher, modes_tx),
            ack_rx,
        )
    }

    /// Book where only the yes side qualifies (no-side depth too thin)
    fn quoting_snapshot() -> FeedSnapshot {
        let book = OrderBookSnapshot {
            yes_bids: vec![BidLevel::new(70, 200)],
            no_bids: vec![BidLevel::new(20, 10)],
        };
        FeedSnapshot {
            books: [(ticker(), book)].into_iter().collect(),
            orders: Vec::new(),
            positions: PositionBook::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn places_once_then_quiesces() {
        let backend = Arc::new(MockBackend::default());
        let (mut ctl, mut ack_rx) = setup(Arc::clone(&backend));

        ctl.set_mode(ticker(), QuoteMode::Both).unwrap();
        ctl.apply_snapshot(quoting_snapshot());
        ctl.run_tick(Instant::now());

        let ack = ack_rx.recv().await.expect("placement ack");
        assert_eq!(backend.place_calls(), 1);
        ctl.handle_ack(ack, Instant::now());
        assert_eq!(ctl.tracked_orders(), 1);

        // Guard still holds the key: immediate re-tick dispatches nothing
        ctl.run_tick(Instant::now());
        assert_eq!(backend.place_calls(), 1);

        // After the settle delay the pair re-qualifies, but the resting order
        // is already optimal: the fixed point is quiescent
        tokio::time::advance(Duration::from_millis(2500)).await;
        let mut snapshot = quoting_snapshot();
        snapshot.orders = vec![RestingOrder {
            order_id: "mock-0".to_string(),
            ticker: ticker(),
            side: MarketSide::Yes,
            price: 71,
            quantity_remaining: 50,
            status: OrderStatus::Resting,
        }];
        ctl.apply_snapshot(snapshot);
        ctl.run_tick(Instant::now());
        assert_eq!(backend.place_calls(), 1);
        assert_eq!(backend.cancel_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_key_is_skipped_not_duplicated() {
        let backend = Arc::new(MockBackend::default());
        let (mut ctl, mut ack_rx) = setup(Arc::clone(&backend));

        ctl.set_mode(ticker(), QuoteMode::YesOnly).unwrap();

        // An existing order that the moving book has outbid
        let mut snapshot = quoting_snapshot();
        snapshot.orders = vec![RestingOrder {
            order_id: "ord-old".to_string(),
            ticker: ticker(),
            side: MarketSide::Yes,
            price: 65,
            quantity_remaining: 50,
            status: OrderStatus::Resting,
        }];
        ctl.apply_snapshot(snapshot.clone());
        ctl.run_tick(Instant::now());

        // Second tick before the ack: same cancel is recomputed but must be
        // skipped while the guard holds
        ctl.apply_snapshot(snapshot);
        ctl.run_tick(Instant::now());

        let _ = ack_rx.recv().await.expect("cancel ack");
        assert_eq!(backend.cancel_calls(), 1);
        assert_eq!(backend.place_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_ack_removes_order_and_rearms_guard() {
        let backend = Arc::new(MockBackend::default());
        let (mut ctl, mut ack_rx) = setup(Arc::clone(&backend));

        ctl.set_mode(ticker(), QuoteMode::YesOnly).unwrap();
        let mut snapshot = quoting_snapshot();
        snapshot.orders = vec![RestingOrder {
            order_id: "ord-old".to_string(),
            ticker: ticker(),
            side: MarketSide::Yes,
            price: 65,
            quantity_remaining: 50,
            status: OrderStatus::Resting,
        }];
        ctl.apply_snapshot(snapshot);
        ctl.run_tick(Instant::now());

        let ack = ack_rx.recv().await.expect("cancel ack");
        ctl.handle_ack(ack, Instant::now());
        assert_eq!(ctl.tracked_orders(), 0);

        // Still settling: no replacement yet
        ctl.run_tick(Instant::now());
        assert_eq!(backend.place_calls(), 0);

        // Past the cancel settle delay the key frees and the bot re-quotes
        tokio::time::advance(Duration::from_millis(600)).await;
        ctl.run_tick(Instant::now());
        let _ = ack_rx.recv().await.expect("placement ack");
        assert_eq!(backend.place_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_command_frees_key_after_guard_expiry() {
        struct FailingBackend;

        #[async_trait]
        impl TradingBackend for FailingBackend {
            async fn orderbook(&self, _t: &Ticker) -> Result<RawOrderBook, BackendError> {
                Ok(RawOrderBook { yes: None, no: None })
            }
            async fn resting_orders(&self) -> Result<Vec<RawOrder>, BackendError> {
                Ok(Vec::new())
            }
            async fn positions(&self) -> Result<Vec<RawPosition>, BackendError> {
                Ok(Vec::new())
            }
            async fn place_order(&self, _r: &PlaceOrderRequest) -> Result<String, BackendError> {
                Err(BackendError::Api { status: 503, detail: "unavailable".into() })
            }
            async fn cancel_order(&self, _id: &str) -> Result<(), BackendError> {
                Err(BackendError::Api { status: 503, detail: "unavailable".into() })
            }
        }

        let (ack_tx, mut ack_rx) = mpsc::channel(16);
        let (modes_tx, _modes_rx) = watch::channel(HashMap::new());
        let dispatcher = Dispatcher::new(Arc::new(FailingBackend), ack_tx);
        let mut ctl = AutomationController::new(&test_config(), dispatcher, modes_tx);

        ctl.set_mode(ticker(), QuoteMode::YesOnly).unwrap();
        ctl.apply_snapshot(quoting_snapshot());
        ctl.run_tick(Instant::now());

        let ack = ack_rx.recv().await.expect("failure ack");
        assert!(ack.result.is_err());
        ctl.handle_ack(ack, Instant::now());

        // No retry while the original guard deadline holds
        ctl.run_tick(Instant::now());
        assert!(ack_rx.try_recv().is_err());

        // One missed cycle, then the key is eligible again
        tokio::time::advance(Duration::from_millis(2100)).await;
        ctl.run_tick(Instant::now());
        assert!(ack_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn unknown_instrument_is_rejected_at_the_boundary() {
        let backend = Arc::new(MockBackend::default());
        let (mut ctl, _ack_rx) = setup(backend);

        let result = ctl.set_mode(Ticker::from("KXNOPE"), QuoteMode::Both);
        assert!(matches!(result, Err(ControllerError::UnknownInstrument(t)) if t == "KXNOPE"));
    }

    #[tokio::test(start_paused = true)]
    async fn disable_all_stops_quoting() {
        let backend = Arc::new(MockBackend::default());
        let (mut ctl, _ack_rx) = setup(Arc::clone(&backend));

        ctl.set_mode(ticker(), QuoteMode::Both).unwrap();
        ctl.disable_all();
        assert_eq!(ctl.mode_of(&ticker()), Some(QuoteMode::Off));

        ctl.apply_snapshot(quoting_snapshot());
        ctl.run_tick(Instant::now());
        assert_eq!(backend.place_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatched_actions_are_logged_most_recent_first() {
        let backend = Arc::new(MockBackend::default());
        let (mut ctl, mut ack_rx) = setup(Arc::clone(&backend));

        ctl.set_mode(ticker(), QuoteMode::YesOnly).unwrap();
        ctl.apply_snapshot(quoting_snapshot());
        ctl.run_tick(Instant::now());
        let ack = ack_rx.recv().await.unwrap();
        ctl.handle_ack(ack, Instant::now());

        // Book moves up: the resting order gets outbid and cancelled
        tokio::time::advance(Duration::from_millis(2500)).await;
        let mut snapshot = quoting_snapshot();
        snapshot
            .books
            .get_mut(&ticker())
            .unwrap()
            .yes_bids = vec![BidLevel::new(75, 300)];
        snapshot.orders = vec![RestingOrder {
            order_id: "mock-0".to_string(),
            ticker: ticker(),
            side: MarketSide::Yes,
            price: 71,
            quantity_remaining: 50,
            status: OrderStatus::Resting,
        }];
        ctl.apply_snapshot(snapshot);
        ctl.run_tick(Instant::now());
        let _ = ack_rx.recv().await.unwrap();

        let entries = ctl.activity_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ActivityKind::Cancel);
        assert!(entries[0].detail.contains("outbid"));
        assert_eq!(entries[1].kind, ActivityKind::Place);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_engine_answers_operator_commands() {
        let backend = Arc::new(MockBackend::default());
        let (handle, join) = AutomationController::spawn(test_config(), backend);

        handle.set_mode(ticker(), QuoteMode::Both).await.unwrap();
        let modes = handle.modes().await.unwrap();
        assert_eq!(modes.get(&ticker()), Some(&QuoteMode::Both));

        assert!(matches!(
            handle.set_mode(Ticker::from("KXNOPE"), QuoteMode::Both).await,
            Err(ControllerError::UnknownInstrument(_))
        ));

        handle.disable_all().await.unwrap();
        let modes = handle.modes().await.unwrap();
        assert_eq!(modes.get(&ticker()), Some(&QuoteMode::Off));

        assert!(handle.activity_log().await.unwrap().is_empty());

        handle.shutdown().await;
        join.await.unwrap();
    }
}
