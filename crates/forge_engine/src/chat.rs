use std::time::Duration;

use forge_logging::{forge_debug, forge_warn};
use tokio::time::{sleep, Instant};

use crate::{ApiError, ForgeApi, MessageRecord};

const TARGET: &str = "forge::chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatReloadSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ChatReloadSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

/// The last message log fetched while waiting for a sent message to appear.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageReload {
    pub messages: Vec<MessageRecord>,
    /// Whether the log grew past the baseline before the timeout.
    pub visible: bool,
}

/// Re-fetches the project's messages until there are more than `baseline` of them
/// or `settings.timeout` has passed.
///
/// Failed fetches inside the window are retried; the error is returned only when
/// no fetch succeeded at all.
pub async fn await_messages(
    api: &dyn ForgeApi,
    project_id: &str,
    baseline: usize,
    settings: ChatReloadSettings,
) -> Result<MessageReload, ApiError> {
    let deadline = Instant::now() + settings.timeout;
    let mut last: Option<Vec<MessageRecord>> = None;
    let mut last_error = None;

    loop {
        match api.get_messages(project_id).await {
            Ok(messages) if messages.len() > baseline => {
                forge_debug!(
                    target: TARGET,
                    "project {} shows {} messages",
                    project_id,
                    messages.len()
                );
                return Ok(MessageReload {
                    messages,
                    visible: true,
                });
            }
            Ok(messages) => last = Some(messages),
            Err(err) => {
                forge_warn!(target: TARGET, "reloading messages of {} failed: {}", project_id, err);
                last_error = Some(err);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        sleep(settings.interval.min(deadline - now)).await;
    }

    match (last, last_error) {
        (Some(messages), _) => {
            forge_warn!(
                target: TARGET,
                "sent message did not appear in project {} within {:?}",
                project_id,
                settings.timeout
            );
            Ok(MessageReload {
                messages,
                visible: false,
            })
        }
        (None, Some(err)) => Err(err),
        (None, None) => Ok(MessageReload {
            messages: Vec::new(),
            visible: false,
        }),
    }
}
