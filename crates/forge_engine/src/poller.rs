use std::sync::mpsc;
use std::time::Duration;

use forge_logging::forge_debug;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::EngineEvent;

const TARGET: &str = "forge::poll";

/// Receives poll ticks from the background ticker.
pub trait TickSink: Send + Sync + 'static {
    fn tick(&self);
}

pub struct ChannelTickSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelTickSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl TickSink for ChannelTickSink {
    fn tick(&self) {
        let _ = self.tx.send(EngineEvent::PollTick);
    }
}

/// A running ticker. Dropping the handle stops it.
pub struct PollerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancels the ticker. A tick already being delivered may still arrive.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled() || self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Starts a ticker on `runtime` firing every `period`, the first tick immediately.
pub fn spawn_poller(runtime: &Handle, period: Duration, sink: impl TickSink) -> PollerHandle {
    let token = CancellationToken::new();
    let child = token.clone();
    let period = period.max(Duration::from_millis(1));

    let task = runtime.spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        forge_debug!(target: TARGET, "poller started, period {:?}", period);
        loop {
            tokio::select! {
                biased;
                _ = child.cancelled() => break,
                _ = ticker.tick() => {
                    if child.is_cancelled() {
                        break;
                    }
                    sink.tick();
                }
            }
        }
        forge_debug!(target: TARGET, "poller stopped");
    });

    PollerHandle { token, task }
}
