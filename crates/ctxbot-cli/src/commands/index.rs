use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;

use ctxbot_lib::config::EMBED_BATCH_SIZE;
use ctxbot_lib::index::{ChunkStore, FlatIndex, Metric};
use ctxbot_lib::output::ConsoleIO;
use ctxbot_lib::pipeline::chunker::split_document;
use ctxbot_lib::runtime::Runtime;

/// Arguments of `ctxbot index build`.
#[derive(Debug)]
pub struct BuildOptions {
    pub chunks: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub metric: Metric,
}

/// Run the `ctxbot index build` command.
pub fn run_index_build<IO: ConsoleIO>(
    options: &BuildOptions,
    runtime: &Runtime,
    io: &mut IO,
) -> anyhow::Result<()> {
    let chunks_path = options
        .chunks
        .clone()
        .unwrap_or_else(|| runtime.settings.chunks_path.clone());
    let out_path = options
        .out
        .clone()
        .unwrap_or_else(|| runtime.settings.index_path.clone());

    let encoder = runtime.services.encoder(&runtime.settings)?;

    let store = if let Some(source) = &options.source {
        let text = std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        let pieces = split_document(&text, encoder.tokenizer());
        if pieces.is_empty() {
            anyhow::bail!("{} contains no text to index", source.display());
        }
        let store = ChunkStore::from_texts(pieces);
        store.save(&chunks_path)?;
        writeln!(
            io.stderr(),
            "Split {} into {} chunks -> {}",
            source.display(),
            store.len(),
            chunks_path.display()
        )?;
        store
    } else {
        ChunkStore::load(&chunks_path)?
    };

    if store.is_empty() {
        anyhow::bail!("{} holds no chunks", chunks_path.display());
    }

    let mut index = FlatIndex::new(encoder.dimension(), options.metric);
    let texts: Vec<&str> = store.iter().map(|c| c.content.as_str()).collect();
    for (batch_no, batch) in texts.chunks(EMBED_BATCH_SIZE).enumerate() {
        debug!(batch = batch_no, size = batch.len(), "Embedding chunk batch");
        for vector in encoder.encode_batch(batch)? {
            index.add(&vector)?;
        }
    }
    index.save(&out_path)?;

    writeln!(
        io.stdout(),
        "Indexed {} chunks into {} (dimension {}, metric {})",
        index.len(),
        out_path.display(),
        index.dimension(),
        metric_name(options.metric)
    )?;
    Ok(())
}

fn metric_name(metric: Metric) -> &'static str {
    match metric {
        Metric::L2 => "l2",
        Metric::InnerProduct => "ip",
    }
}
