// src/poller.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::dashboard::Dashboard;

/// Clears the busy flag when the trigger task ends, even by panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the periodic bot-trigger loop. Dropping it stops the loop.
pub struct Poller {
    task: JoinHandle<()>,
}

impl Poller {
    /// Invokes the dashboard's bot trigger every `period`, skipping ticks
    /// while the previous invocation is still running.
    pub fn spawn(dashboard: Arc<Dashboard>, period: Duration) -> Self {
        let busy = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if busy
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    debug!("previous bot trigger still running, skipping tick");
                    continue;
                }
                let guard = BusyGuard(busy.clone());
                let dashboard = dashboard.clone();
                tokio::spawn(async move {
                    let _guard = guard;
                    dashboard.trigger_bot().await;
                });
            }
        });
        info!(?period, "bot poller started");
        Self { task }
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
        debug!("bot poller stopped");
    }
}
