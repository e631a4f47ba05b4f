pub mod bot;
pub mod cli;
pub mod commands;
pub mod logging;

#[cfg(test)]
pub mod test_util;

use clap::Parser;

use ctxbot_lib::output::ConsoleIO;
use ctxbot_lib::runtime::Runtime;

use cli::{Cli, Command, IndexCommand, ModelCommand};

/// Main CLI entry point. Parses args and dispatches to the appropriate command.
pub async fn try_run<IO: ConsoleIO>(
    args: &[&str],
    runtime: &Runtime,
    io: &mut IO,
) -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(args)?;
    run_command(cli, runtime, io).await
}

/// Like [`try_run`], but the runtime is built by `load` only after the
/// arguments parse, so `--help` and usage errors work with a broken
/// environment.
pub async fn try_run_with_loader<IO, F>(
    args: &[&str],
    load: F,
    io: &mut IO,
) -> anyhow::Result<()>
where
    IO: ConsoleIO,
    F: FnOnce() -> anyhow::Result<Runtime>,
{
    let cli = Cli::try_parse_from(args)?;
    let runtime = load()?;
    run_command(cli, &runtime, io).await
}

async fn run_command<IO: ConsoleIO>(
    cli: Cli,
    runtime: &Runtime,
    io: &mut IO,
) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve { webhook } => commands::serve::run_serve(webhook, runtime, io).await,
        Command::Retrieve { query, k } => {
            commands::retrieve::run_retrieve(&query, k, runtime, io).await
        }
        Command::Ask { query, k } => commands::ask::run_ask(&query, k, runtime, io).await,
        Command::Index { index_command } => match index_command {
            IndexCommand::Build {
                chunks,
                source,
                out,
                metric,
            } => commands::index::run_index_build(
                &commands::index::BuildOptions {
                    chunks,
                    source,
                    out,
                    metric: metric.into(),
                },
                runtime,
                io,
            ),
        },
        Command::Model { model_command } => match model_command {
            ModelCommand::Download { force } => {
                commands::model::run_model_download(force, runtime, io)
            }
        },
    }
}
