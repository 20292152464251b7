//! Periodic flush driver: one tokio task ticking the relay's flush cycle,
//! with graceful cancellation and a bounded final flush on shutdown.
//!
//! Errors raised by a tick are reported through `tracing` and never cancel
//! future ticks; the queue state those errors preserved is retried on the
//! next tick. A delivery that outlives the period delays the next tick
//! rather than overlapping it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::constants::{DEFAULT_FLUSH_PERIOD, SHUTDOWN_WAIT};
use crate::relay::ChannelRelay;

/// Handle to the scheduled flush task.
pub struct FlushScheduler {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FlushScheduler {
    /// Schedules `relay` to flush every [`DEFAULT_FLUSH_PERIOD`].
    pub fn start(relay: Arc<ChannelRelay>) -> Self {
        Self::start_with_period(relay, DEFAULT_FLUSH_PERIOD)
    }

    /// Schedules `relay` to flush every `period`, first tick one period
    /// from now.
    pub fn start_with_period(relay: Arc<ChannelRelay>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        if let Err(e) = relay.flush().await {
                            error!("scheduled flush failed: {e}");
                        }
                    }
                    () = token.cancelled() => {
                        debug!("flush scheduler stopping, performing final flush");
                        if let Err(e) = relay.flush().await {
                            error!("final flush failed: {e}");
                        }
                        break;
                    }
                }
            }
        });

        FlushScheduler { cancel, task }
    }

    /// Stops the scheduler: cancels the pending tick, lets the task run one
    /// final flush, and waits a bounded time for it to finish. A timeout is
    /// tolerated; losing the last tidbit of output during shutdown is
    /// acceptable.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if tokio::time::timeout(SHUTDOWN_WAIT, self.task).await.is_err() {
            warn!(
                "flush task did not stop within {:?}, abandoning final flush",
                SHUTDOWN_WAIT
            );
        }
    }
}
