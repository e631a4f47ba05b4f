use std::io::Write;

use tracing::info;

use ctxbot_lib::output::ConsoleIO;
use ctxbot_lib::runtime::Runtime;

use super::resolve_query;

/// Run the `ctxbot ask` command: retrieve, then answer from the chunks.
pub async fn run_ask<IO: ConsoleIO>(
    query: &str,
    k: Option<usize>,
    runtime: &Runtime,
    io: &mut IO,
) -> anyhow::Result<()> {
    let query = resolve_query(query, io)?;
    let k = k.unwrap_or(runtime.settings.top_k);

    let responder = runtime.require_responder()?;
    let retriever = runtime.retriever()?;

    let chunks = retriever.retrieve_async(&query, k).await?;
    info!(chunks = chunks.len(), "Answering question");
    let answer = responder.answer(&query, &chunks).await?;

    writeln!(io.stdout(), "{answer}")?;
    Ok(())
}
