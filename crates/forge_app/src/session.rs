use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use forge_core::{update, AppState, AppViewModel, Msg};
use forge_logging::forge_trace;

use crate::config::ForgeConfig;
use crate::effects::EffectRunner;

/// Single-threaded message loop: every state change goes through `update`.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    settle_timeout: Duration,
}

impl Session {
    pub fn new(config: &ForgeConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::with_poll_config(config.poll_config()),
            runner: EffectRunner::new(config.engine_settings())?,
            settle_timeout: config.settle_timeout(),
        })
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies `msg`, runs its effects, and returns the new view if anything changed.
    pub fn dispatch(&mut self, msg: Msg) -> Option<AppViewModel> {
        forge_trace!(target: "forge::session", "msg {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        was_dirty.then_some(view)
    }

    /// Dispatches responses until no request is outstanding.
    pub fn settle(&mut self) -> Result<AppViewModel> {
        let deadline = Instant::now() + self.settle_timeout;
        while self.state.outstanding_requests() > 0 {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                bail!(
                    "timed out waiting for {} responses",
                    self.state.outstanding_requests()
                );
            };
            if let Some(msg) = self.runner.next_msg(remaining) {
                self.dispatch(msg);
            }
        }
        Ok(self.view())
    }

    /// Dispatches engine messages until `done` holds for the latest view.
    ///
    /// `on_change` sees every view produced by a state change.
    pub fn run_until(
        &mut self,
        mut done: impl FnMut(&AppState, &AppViewModel) -> bool,
        mut on_change: impl FnMut(&AppViewModel),
    ) {
        let mut view = self.view();
        while !done(&self.state, &view) {
            let Some(msg) = self.runner.next_msg(Duration::from_millis(250)) else {
                continue;
            };
            if let Some(changed) = self.dispatch(msg) {
                on_change(&changed);
                view = changed;
            }
        }
    }

    pub fn check_health(&self) -> Result<()> {
        self.runner.check_health(self.settle_timeout)
    }
}
