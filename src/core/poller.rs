//! Keeps a reservation list fresh.
//!
//! One poll cycle refreshes the credential, fetches, and on failure
//! retries after a fixed delay until its retry credits run out, at which
//! point a single error notification goes out and the last good list is
//! kept. [`ResilientPoller::start`] runs a cycle immediately and then on
//! every refresh tick. Only one cycle may be in flight: a tick that lands
//! while a cycle (including its retry sleeps) is running is skipped.

use crate::domain::model::{Reservation, ReservationQuery};
use crate::domain::ports::{IdentityProvider, Notification, Notifier, ReservationSource};
use crate::utils::error::{DeskError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub type Snapshot = Option<Arc<Vec<Reservation>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub refresh_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            refresh_interval: Duration::from_millis(10_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Fetching,
    Retrying,
}

#[derive(Debug, Clone)]
pub struct PollState {
    pub retries_remaining: u32,
    pub last_result: Snapshot,
    pub active: bool,
    pub phase: PollPhase,
}

/// How a single cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Updated { count: usize, attempts: u32 },
    Exhausted { attempts: u32 },
    /// Another cycle was already in flight.
    Skipped,
    Cancelled,
}

pub struct ResilientPoller {
    inner: Arc<Inner>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    identity: Arc<dyn IdentityProvider>,
    source: Arc<dyn ReservationSource>,
    notifier: Arc<dyn Notifier>,
    config: PollerConfig,
    query: Mutex<ReservationQuery>,
    state: Mutex<PollState>,
    in_flight: AtomicBool,
    cancel: Mutex<CancellationToken>,
    latest: watch::Sender<Snapshot>,
    last_error: Mutex<Option<DeskError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag however the cycle ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ResilientPoller {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        source: Arc<dyn ReservationSource>,
        notifier: Arc<dyn Notifier>,
        query: ReservationQuery,
        config: PollerConfig,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                identity,
                source,
                notifier,
                config,
                query: Mutex::new(query),
                state: Mutex::new(PollState {
                    retries_remaining: config.max_retries,
                    last_result: None,
                    active: false,
                    phase: PollPhase::Idle,
                }),
                in_flight: AtomicBool::new(false),
                cancel: Mutex::new(CancellationToken::new()),
                latest,
                last_error: Mutex::new(None),
            }),
            ticker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> PollerConfig {
        self.inner.config
    }

    /// Runs one cycle with the given retry credits.
    pub async fn poll(&self, retries_remaining: u32) -> CycleOutcome {
        self.inner.run_cycle(retries_remaining).await
    }

    /// Immediate cycle, then one per refresh interval until [`stop`](Self::stop).
    /// Calling it on a running poller does nothing.
    pub fn start(&self) {
        let mut ticker = lock(&self.ticker);
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let token = CancellationToken::new();
        *lock(&self.inner.cancel) = token.clone();
        lock(&self.inner.state).active = true;

        let inner = Arc::clone(&self.inner);
        let interval = inner.config.refresh_interval;
        tracing::debug!(?interval, "starting reservation poller");

        *ticker = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        let inner = Arc::clone(&inner);
                        tokio::spawn(async move {
                            let retries = inner.config.max_retries;
                            inner.run_cycle(retries).await;
                        });
                    }
                }
            }
            tracing::debug!("reservation poller stopped");
        }));
    }

    /// Cancels the refresh timer and any pending retry. Idempotent.
    pub fn stop(&self) {
        lock(&self.inner.cancel).cancel();
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
        let mut state = lock(&self.inner.state);
        state.active = false;
        state.phase = PollPhase::Idle;
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner.state).active
    }

    /// Takes effect from the next fetch attempt.
    pub fn set_query(&self, query: ReservationQuery) {
        *lock(&self.inner.query) = query;
    }

    pub fn latest(&self) -> Snapshot {
        self.inner.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.latest.subscribe()
    }

    pub fn state(&self) -> PollState {
        lock(&self.inner.state).clone()
    }

    /// The error that ended the last exhausted cycle, if any.
    pub fn take_last_error(&self) -> Option<DeskError> {
        lock(&self.inner.last_error).take()
    }
}

impl Drop for ResilientPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    async fn run_cycle(&self, retries_remaining: u32) -> CycleOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("poll cycle already in flight, skipping");
            return CycleOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.in_flight);

        let token = lock(&self.cancel).clone();
        let mut retries = retries_remaining;
        let mut attempts = 0;

        loop {
            if token.is_cancelled() {
                return self.finish(CycleOutcome::Cancelled);
            }

            self.set_phase(PollPhase::Fetching, retries);
            attempts += 1;

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return self.finish(CycleOutcome::Cancelled),
                result = self.fetch_once() => result,
            };

            match result {
                Ok(reservations) => {
                    let count = reservations.len();
                    tracing::debug!(count, attempts, "reservations refreshed");
                    lock(&self.last_error).take();
                    self.publish(reservations);
                    return self.finish(CycleOutcome::Updated { count, attempts });
                }
                Err(e) => {
                    tracing::warn!(
                        kind = ?e.failure_kind(),
                        retries_remaining = retries,
                        "reservation fetch failed: {}",
                        e
                    );

                    if retries == 0 {
                        self.notifier
                            .notify(Notification::error("Reservations could not be loaded"));
                        *lock(&self.last_error) = Some(e);
                        return self.finish(CycleOutcome::Exhausted { attempts });
                    }

                    retries -= 1;
                    self.set_phase(PollPhase::Retrying, retries);
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return self.finish(CycleOutcome::Cancelled),
                        _ = tokio::time::sleep(self.config.retry_delay) => {}
                    }
                }
            }
        }
    }

    async fn fetch_once(&self) -> Result<Vec<Reservation>> {
        let token = self.identity.bearer_token().await?;
        let query = lock(&self.query).clone();
        let reservations = self.source.fetch_reservations(&token, &query).await?;

        // the server may ignore the range, so it is re-applied here
        Ok(match query.range {
            Some(range) => range.apply(reservations),
            None => reservations,
        })
    }

    fn publish(&self, reservations: Vec<Reservation>) {
        let snapshot = Arc::new(reservations);
        lock(&self.state).last_result = Some(Arc::clone(&snapshot));
        self.latest.send_replace(Some(snapshot));
    }

    fn set_phase(&self, phase: PollPhase, retries_remaining: u32) {
        let mut state = lock(&self.state);
        state.phase = phase;
        state.retries_remaining = retries_remaining;
    }

    fn finish(&self, outcome: CycleOutcome) -> CycleOutcome {
        let mut state = lock(&self.state);
        state.phase = PollPhase::Idle;
        state.retries_remaining = self.config.max_retries;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::StaticTokenProvider;
    use crate::adapters::notify::ChannelNotifier;
    use crate::domain::model::{NewReservation, ReservationStatus};
    use crate::domain::ports::NotificationLevel;
    use crate::utils::error::DeskError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::Instant;

    fn reservation(id: &str) -> Reservation {
        let departure = Utc.with_ymd_and_hms(2025, 8, 1, 10, 0, 0).unwrap();
        Reservation {
            id: id.to_string(),
            flight_number: "TK42".to_string(),
            departure_date: departure,
            arrival_date: departure,
            status: ReservationStatus::Active,
            passengers: vec![],
        }
    }

    fn server_error() -> DeskError {
        DeskError::StatusError {
            status: 500,
            message: "unavailable".to_string(),
        }
    }

    /// Plays back scripted results, then keeps failing.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<Reservation>>>>,
        calls: AtomicUsize,
        call_times: Mutex<Vec<Instant>>,
        latency: Duration,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<Reservation>>>) -> Arc<Self> {
            Self::with_latency(script, Duration::ZERO)
        }

        fn with_latency(script: Vec<Result<Vec<Reservation>>>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                call_times: Mutex::new(Vec::new()),
                latency,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReservationSource for ScriptedSource {
        async fn fetch_reservations(
            &self,
            token: &str,
            _query: &ReservationQuery,
        ) -> Result<Vec<Reservation>> {
            assert_eq!(token, "test-token");
            self.calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.call_times).push(Instant::now());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            lock(&self.script).pop_front().unwrap_or_else(|| Err(server_error()))
        }

        async fn create_reservation(&self, _: &str, _: &NewReservation) -> Result<()> {
            Ok(())
        }

        async fn seed_reservations(&self, _: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn seed_users(&self, _: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    /// Holds every fetch until the test opens the gate.
    #[derive(Default)]
    struct GatedSource {
        gate: tokio::sync::Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReservationSource for GatedSource {
        async fn fetch_reservations(
            &self,
            _token: &str,
            _query: &ReservationQuery,
        ) -> Result<Vec<Reservation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(vec![reservation("late")])
        }

        async fn create_reservation(&self, _: &str, _: &NewReservation) -> Result<()> {
            Ok(())
        }

        async fn seed_reservations(&self, _: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn seed_users(&self, _: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    struct BrokenIdentity;

    #[async_trait]
    impl IdentityProvider for BrokenIdentity {
        async fn bearer_token(&self) -> Result<String> {
            Err(DeskError::credential("refresh token revoked"))
        }
    }

    fn poller_with(
        source: Arc<ScriptedSource>,
    ) -> (ResilientPoller, UnboundedReceiver<Notification>) {
        let (notifier, rx) = ChannelNotifier::new();
        let poller = ResilientPoller::new(
            Arc::new(StaticTokenProvider::new("test-token")),
            source,
            Arc::new(notifier),
            ReservationQuery::default(),
            PollerConfig::default(),
        );
        (poller, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let source = ScriptedSource::new(vec![Ok(vec![reservation("a"), reservation("b")])]);
        let (poller, mut rx) = poller_with(source.clone());

        let started = Instant::now();
        let outcome = poller.poll(3).await;

        assert_eq!(outcome, CycleOutcome::Updated { count: 2, attempts: 1 });
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(source.calls(), 1);
        assert_eq!(poller.latest().unwrap().len(), 2);
        assert_eq!(poller.state().retries_remaining, 3);
        assert_eq!(poller.state().phase, PollPhase::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_notify_once_and_keep_last_result() {
        let source = ScriptedSource::new(vec![Ok(vec![reservation("kept")])]);
        let (poller, mut rx) = poller_with(source.clone());
        poller.poll(3).await;

        let started = Instant::now();
        let outcome = poller.poll(3).await;

        // the first attempt plus three retries, one second apart
        assert_eq!(outcome, CycleOutcome::Exhausted { attempts: 4 });
        assert_eq!(source.calls(), 5);
        assert_eq!(started.elapsed(), Duration::from_millis(3000));

        let times = lock(&source.call_times).clone();
        for pair in times[1..].windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_millis(1000));
        }

        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(rx.try_recv().is_err());

        let latest = poller.latest().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, "kept");

        assert!(matches!(
            poller.take_last_error(),
            Some(DeskError::StatusError { status: 500, .. })
        ));
        assert!(poller.take_last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let source = ScriptedSource::new(vec![
            Err(server_error()),
            Err(server_error()),
            Ok(vec![reservation("fresh")]),
        ]);
        let (poller, mut rx) = poller_with(source.clone());

        let outcome = poller.poll(3).await;

        assert_eq!(outcome, CycleOutcome::Updated { count: 1, attempts: 3 });
        assert_eq!(poller.state().retries_remaining, 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_credits_notifies_after_single_attempt() {
        let source = ScriptedSource::new(vec![]);
        let (poller, mut rx) = poller_with(source.clone());

        assert_eq!(poller.poll(0).await, CycleOutcome::Exhausted { attempts: 1 });
        assert_eq!(source.calls(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(poller.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_credential_failure_consumes_retries() {
        let source = ScriptedSource::new(vec![Ok(vec![reservation("never")])]);
        let (notifier, mut rx) = ChannelNotifier::new();
        let poller = ResilientPoller::new(
            Arc::new(BrokenIdentity),
            source.clone(),
            Arc::new(notifier),
            ReservationQuery::default(),
            PollerConfig::default(),
        );

        assert_eq!(poller.poll(2).await, CycleOutcome::Exhausted { attempts: 3 });
        assert_eq!(source.calls(), 0);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rearms_every_interval() {
        let script = (0..5).map(|_| Ok(vec![reservation("x")])).collect();
        let source = ScriptedSource::new(script);
        let (poller, _rx) = poller_with(source.clone());
        let mut updates = poller.subscribe();

        poller.start();
        assert!(poller.is_active());
        updates.changed().await.unwrap();
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_millis(9_000)).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(source.calls(), 2);

        poller.stop();
        assert!(!poller.is_active());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_skipped_while_cycle_in_flight() {
        let script = (0..5).map(|_| Ok(vec![reservation("slow")])).collect();
        let source = ScriptedSource::with_latency(script, Duration::from_secs(15));
        let (poller, _rx) = poller_with(source.clone());

        poller.start();
        tokio::time::sleep(Duration::from_secs(12)).await;
        // the 10s tick found the first fetch still running
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(source.calls(), 2);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_retry() {
        let source = ScriptedSource::new(vec![]);
        let (poller, mut rx) = poller_with(source.clone());

        poller.start();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(poller.state().phase, PollPhase::Retrying);

        poller.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(source.calls(), 1);
        assert!(rx.try_recv().is_err());
        assert_eq!(poller.poll(3).await, CycleOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let script = (0..3).map(|_| Ok(vec![reservation("again")])).collect();
        let source = ScriptedSource::new(script);
        let (poller, _rx) = poller_with(source.clone());

        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.stop();
        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(source.calls(), 2);
        assert!(poller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_wins_when_fetch_completes_in_same_wakeup() {
        let source = Arc::new(GatedSource::default());
        let (notifier, _rx) = ChannelNotifier::new();
        let poller = ResilientPoller::new(
            Arc::new(StaticTokenProvider::new("test-token")),
            source.clone(),
            Arc::new(notifier),
            ReservationQuery::default(),
            PollerConfig::default(),
        );

        poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        // both the fetch and the cancellation are ready when the cycle next runs
        source.gate.notify_one();
        poller.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(poller.latest().is_none());
        assert!(poller.state().last_result.is_none());
    }
}
