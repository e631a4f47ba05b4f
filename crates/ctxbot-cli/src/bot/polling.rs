use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use ctxbot_lib::config::{POLL_RETRY_DELAY_SECS, POLL_TIMEOUT_SECS};

use super::Bot;

#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
    /// Long-poll timeout passed to `getUpdates`.
    pub timeout_secs: u64,
    /// Pause after a failed `getUpdates` call.
    pub retry_delay: Duration,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            timeout_secs: POLL_TIMEOUT_SECS,
            retry_delay: Duration::from_secs(POLL_RETRY_DELAY_SECS),
        }
    }
}

/// Long-poll Telegram until `shutdown` resolves.
///
/// Any registered webhook is removed first, since Telegram refuses
/// `getUpdates` while one is set. Each update is handled on its own task.
pub async fn run_polling<F>(bot: Bot, options: PollingOptions, shutdown: F)
where
    F: Future<Output = ()>,
{
    let api = bot.telegram().clone();
    if let Err(e) = api.delete_webhook().await {
        warn!(error = %e, "Failed to delete webhook, polling may be rejected");
    }
    info!(timeout_secs = options.timeout_secs, "Polling for updates");

    tokio::pin!(shutdown);
    let mut offset = 0i64;
    loop {
        let batch = tokio::select! {
            () = &mut shutdown => break,
            batch = api.get_updates(offset, options.timeout_secs) => batch,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    debug!(update_id = update.update_id, "Dispatching update");
                    bot.dispatch(update);
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(options.retry_delay) => {}
                }
            }
        }
    }
    info!("Polling stopped");
}
