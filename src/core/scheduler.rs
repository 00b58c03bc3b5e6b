//! Periodic price feed polling.
//!
//! The fetch runs on its own task and hands results back over a channel,
//! so whoever owns the rate snapshot keeps reacting to input while a
//! request is in flight.

use crate::core::price::{FeedQuery, PriceFeed};
use crate::core::rates::PriceTable;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument};

pub struct RefreshScheduler {
    handle: Option<JoinHandle<()>>,
    trigger: Arc<Notify>,
}

impl RefreshScheduler {
    /// Starts polling. The first fetch happens immediately, then once per
    /// `period` or whenever [`RefreshScheduler::refresh_now`] is called.
    pub fn start(
        feed: Arc<dyn PriceFeed>,
        query: FeedQuery,
        period: Duration,
        results: mpsc::Sender<Result<PriceTable>>,
    ) -> Self {
        let trigger = Arc::new(Notify::new());
        let handle = tokio::spawn(poll(feed, query, period, results, Arc::clone(&trigger)));
        Self {
            handle: Some(handle),
            trigger,
        }
    }

    /// Requests a fetch outside the regular schedule.
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancels polling. Later calls are no-ops.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Stopping refresh scheduler");
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[instrument(name = "RefreshLoop", skip_all, fields(period = ?period))]
async fn poll(
    feed: Arc<dyn PriceFeed>,
    query: FeedQuery,
    period: Duration,
    results: mpsc::Sender<Result<PriceTable>>,
    trigger: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => debug!("Scheduled refresh"),
            _ = trigger.notified() => {
                debug!("Manual refresh");
                interval.reset();
            }
        }

        let result = feed.fetch_rates(&query).await;
        if results.send(result).await.is_err() {
            debug!("Result receiver dropped, ending refresh loop");
            break;
        }
    }
}
