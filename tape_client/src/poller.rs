//! Periodic polling with cancellation.
//!
//! A driver task ticks a [`tokio::time::interval`] and starts one poll unit per
//! tick. Each unit is an independent task bound to a child of the poller's
//! [`CancellationToken`]; units may overlap, and whichever settles last writes
//! last. Teardown cancels the token, which aborts in-flight requests and stops
//! the ticker, then waits for every unit so nothing writes afterwards.
//!
//! Without a source the poller never starts a task and the snapshot stays
//! `idle` with no endpoint. Periods shorter than [`MIN_POLL_INTERVAL`] are
//! raised to it.
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::fetcher::QuoteSource;
use crate::model::{PollState, QuoteSnapshot};

/// Shortest accepted polling period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Owner of a running poller. Dropping it cancels polling; [`PollerHandle::shutdown`]
/// additionally waits until no task can touch the state any more.
pub struct PollerHandle {
    state: Arc<watch::Sender<QuoteSnapshot>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl PollerHandle {
    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<QuoteSnapshot> {
        self.state.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> QuoteSnapshot {
        self.state.borrow().clone()
    }

    /// Abort in-flight requests, stop the ticker and wait for all poll tasks.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        debug!("Poller stopped");
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Entry point for starting a poller.
pub struct QuotePoller;

impl QuotePoller {
    /// Start polling `source` every `interval`, beginning immediately.
    ///
    /// `None` means no endpoint is configured: no task is spawned and no
    /// request is ever made. Must be called within a Tokio runtime.
    pub fn spawn(source: Option<Arc<dyn QuoteSource>>, interval: Duration) -> PollerHandle {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let endpoint = source.as_ref().map(|s| s.endpoint().to_string());
        let (tx, _) = watch::channel(QuoteSnapshot::new(endpoint));
        let state = Arc::new(tx);
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        match source {
            Some(source) => {
                info!("Polling {} every {:?}", source.endpoint(), interval);
                tracker.spawn(drive(
                    source,
                    interval,
                    Arc::clone(&state),
                    cancel.clone(),
                    tracker.clone(),
                ));
            }
            None => info!("No quote endpoint configured; polling disabled"),
        }

        PollerHandle {
            state,
            cancel,
            tracker,
        }
    }
}

async fn drive(
    source: Arc<dyn QuoteSource>,
    interval: Duration,
    state: Arc<watch::Sender<QuoteSnapshot>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tracker.spawn(poll_once(
                    Arc::clone(&source),
                    Arc::clone(&state),
                    cancel.child_token(),
                ));
            }
        }
    }
    debug!("Poll driver stopped");
}

/// One cancellable poll: mark loading, fetch, settle.
async fn poll_once(
    source: Arc<dyn QuoteSource>,
    state: Arc<watch::Sender<QuoteSnapshot>>,
    cancel: CancellationToken,
) {
    if cancel.is_cancelled() {
        return;
    }
    update(&state, &cancel, PollState::begin);

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Poll aborted");
            return;
        }
        outcome = source.fetch_quotes() => outcome,
    };

    match &outcome {
        Ok(quotes) => debug!("Poll returned {} quotes", quotes.len()),
        Err(e) => warn!("Poll failed: {}", e),
    }
    update(&state, &cancel, |poll| poll.settle(outcome, Utc::now()));
}

/// Apply `change` unless the poll has been cancelled. The check runs under the
/// channel lock, so a write can never slip in after cancellation is observed.
fn update(
    state: &watch::Sender<QuoteSnapshot>,
    cancel: &CancellationToken,
    change: impl FnOnce(&mut PollState),
) {
    state.send_if_modified(|snapshot| {
        if cancel.is_cancelled() {
            return false;
        }
        change(&mut snapshot.state);
        true
    });
}
