use std::fmt::Write as _;
use std::io::Write;

use ctxbot_lib::index::RetrievedChunk;
use ctxbot_lib::output::ConsoleIO;
use ctxbot_lib::runtime::Runtime;

use super::resolve_query;

/// Run the `ctxbot retrieve` command.
pub async fn run_retrieve<IO: ConsoleIO>(
    query: &str,
    k: Option<usize>,
    runtime: &Runtime,
    io: &mut IO,
) -> anyhow::Result<()> {
    let query = resolve_query(query, io)?;
    let k = k.unwrap_or(runtime.settings.top_k);

    let retriever = runtime.retriever()?;
    let hits = retriever.retrieve_async(&query, k).await?;

    if hits.is_empty() {
        writeln!(io.stdout(), "No chunks found.")?;
    } else {
        write!(io.stdout(), "{}", format_hits(&hits))?;
    }
    Ok(())
}

fn format_hits(hits: &[RetrievedChunk]) -> String {
    let mut out = String::from("## Retrieved chunks\n\n");
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "### Chunk {} (id: {}, distance: {:.4})\n{}\n\n",
            i + 1,
            hit.chunk.id,
            hit.distance,
            hit.chunk.content
        );
    }
    out
}
