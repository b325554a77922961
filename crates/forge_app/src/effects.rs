use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use forge_core::{Effect, Msg};
use forge_engine::{EngineCommand, EngineEvent, EngineHandle, EngineSettings};
use forge_logging::forge_debug;

use crate::convert::{effect_to_command, event_to_msg};

/// Ticket used for requests that bypass the core.
const DIRECT_TICKET: u64 = 0;

/// Runs core effects on the engine and turns engine events back into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings) -> Result<Self> {
        let engine = EngineHandle::new(settings)?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            forge_debug!(target: "forge::effects", "effect {:?}", effect);
            self.engine.send(effect_to_command(effect));
        }
    }

    /// Waits up to `timeout` for the next event the core handles.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let event = self.engine.recv_timeout(remaining)?;
            if let Some(msg) = event_to_msg(event) {
                return Some(msg);
            }
        }
    }

    pub fn check_health(&self, timeout: Duration) -> Result<()> {
        self.engine.send(EngineCommand::CheckHealth {
            ticket: DIRECT_TICKET,
        });
        let deadline = Instant::now() + timeout;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match self.engine.recv_timeout(remaining) {
                Some(EngineEvent::HealthChecked { result, .. }) => {
                    return result.map_err(|err| anyhow!("service is unhealthy: {err}"));
                }
                Some(_) => continue,
                None => break,
            }
        }
        Err(anyhow!("no health answer within {:?}", timeout))
    }
}
