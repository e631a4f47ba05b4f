use std::io::Write;

use tracing::{error, info, warn};

use ctxbot_lib::output::ConsoleIO;
use ctxbot_lib::pipeline::Retriever;
use ctxbot_lib::runtime::Runtime;

use crate::bot::Bot;
use crate::bot::polling::{PollingOptions, run_polling};
use crate::bot::webhook::run_webhook;

/// Run the `ctxbot serve` command: start the bot and serve until Ctrl-C.
pub async fn run_serve<IO: ConsoleIO>(
    webhook: bool,
    runtime: &Runtime,
    io: &mut IO,
) -> anyhow::Result<()> {
    let bot = Bot::from_runtime(runtime)?;
    let features = bot.context().features();
    if let Some(retriever) = bot.context().retriever.clone() {
        spawn_reload_on_hangup(retriever, runtime);
    }

    if webhook {
        let settings = &runtime.settings.webhook;
        writeln!(
            io.stderr(),
            "ctxbot serving webhook on {}{} ({features})",
            settings.addr,
            settings.path
        )?;
        run_webhook(bot, settings, shutdown_signal()).await?;
    } else {
        writeln!(io.stderr(), "ctxbot polling for updates ({features})")?;
        run_polling(bot, PollingOptions::default(), shutdown_signal()).await;
    }
    Ok(())
}

/// Reload the knowledge base from the configured paths on every SIGHUP.
/// A failed reload keeps serving the previous one.
#[cfg(unix)]
fn spawn_reload_on_hangup(retriever: Retriever, runtime: &Runtime) {
    use tokio::signal::unix::{SignalKind, signal};

    let index_path = runtime.settings.index_path.clone();
    let chunks_path = runtime.settings.chunks_path.clone();
    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Failed to listen for SIGHUP, knowledge reload disabled");
            return;
        }
    };
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            if let Err(e) = retriever.reload(&index_path, &chunks_path) {
                warn!(error = %e, "Knowledge reload failed, keeping the current index");
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_retriever: Retriever, _runtime: &Runtime) {}

/// Resolves on Ctrl-C. If the signal handler cannot be installed, never
/// resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use ctxbot_lib::output::BufferedIO;
    use ctxbot_test_util::fixtures::settings_with;
    use ctxbot_test_util::services::FakeServices;

    #[tokio::test]
    async fn try_run_serve_fails_without_index() {
        let tmp = tempfile::tempdir().unwrap();
        let index = tmp.path().join("missing.index");
        let chunks = tmp.path().join("missing.json");
        let runtime = FakeServices::new(8).into_runtime(settings_with(
            None,
            &[
                ("CTXBOT_INDEX_PATH", index.to_str().unwrap()),
                ("CTXBOT_CHUNKS_PATH", chunks.to_str().unwrap()),
            ],
        ));
        let mut io = BufferedIO::new();

        let err = crate::try_run(&["ctxbot", "serve"], &runtime, &mut io)
            .await
            .unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.starts_with("Knowledge base unavailable"), "{chain}");
        assert!(chain.contains("missing.index"), "{chain}");
        assert!(io.stderr_to_string().is_empty());
    }

    #[tokio::test]
    async fn try_run_serve_rejects_unknown_flag() {
        let runtime = FakeServices::new(8).into_runtime(settings_with(None, &[]));
        let mut io = BufferedIO::new();
        let err = crate::try_run(&["ctxbot", "serve", "--bogus"], &runtime, &mut io)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }
}
