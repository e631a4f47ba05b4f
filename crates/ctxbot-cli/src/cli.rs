use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use ctxbot_lib::index::Metric;

#[derive(Parser, Debug)]
#[command(
    name = "ctxbot",
    about = "Telegram bot answering from a local knowledge base, an LLM and web search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the Telegram bot until interrupted.
    Serve {
        /// Receive updates through a webhook server instead of long polling.
        #[arg(long)]
        webhook: bool,
    },

    /// Print the chunks nearest to a query. Use `-` to read the query from stdin.
    Retrieve {
        query: String,
        /// Number of chunks to return (defaults to `CTXBOT_TOP_K`).
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Answer a question from the knowledge base. Use `-` to read it from stdin.
    Ask {
        query: String,
        /// Number of chunks to use as context (defaults to `CTXBOT_TOP_K`).
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Manage the vector index.
    Index {
        #[command(subcommand)]
        index_command: IndexCommand,
    },

    /// Manage the embedding model.
    Model {
        #[command(subcommand)]
        model_command: ModelCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Embed every chunk and write the index file.
    Build {
        /// Chunk file to read, or to write when `--source` is given
        /// (defaults to `CTXBOT_CHUNKS_PATH`).
        #[arg(long)]
        chunks: Option<PathBuf>,
        /// Markdown document to split into chunks first.
        #[arg(long)]
        source: Option<PathBuf>,
        /// Index file to write (defaults to `CTXBOT_INDEX_PATH`).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Distance metric of the index.
        #[arg(long, value_enum, default_value_t = MetricArg::L2)]
        metric: MetricArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Download the embedding model files from Hugging Face.
    Download {
        /// Force re-download even if files already exist.
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricArg {
    /// Squared Euclidean distance.
    L2,
    /// Inner product (use with normalized embeddings).
    Ip,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::L2 => Self::L2,
            MetricArg::Ip => Self::InnerProduct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_retrieve_with_k() {
        let cli = Cli::try_parse_from(["ctxbot", "retrieve", "what is mcp", "-k", "5"]).unwrap();
        match cli.command {
            Command::Retrieve { query, k } => {
                assert_eq!(query, "what is mcp");
                assert_eq!(k, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_index_build_defaults() {
        let cli = Cli::try_parse_from(["ctxbot", "index", "build"]).unwrap();
        let Command::Index {
            index_command:
                IndexCommand::Build {
                    chunks,
                    source,
                    out,
                    metric,
                },
        } = cli.command
        else {
            panic!("expected index build");
        };
        assert_eq!(chunks, None);
        assert_eq!(source, None);
        assert_eq!(out, None);
        assert_eq!(metric, MetricArg::L2);
    }

    #[test]
    fn parse_metric_ip() {
        let cli = Cli::try_parse_from(["ctxbot", "index", "build", "--metric", "ip"]).unwrap();
        let Command::Index {
            index_command: IndexCommand::Build { metric, .. },
        } = cli.command
        else {
            panic!("expected index build");
        };
        assert_eq!(Metric::from(metric), Metric::InnerProduct);
    }

    #[test]
    fn serve_requires_no_args() {
        let cli = Cli::try_parse_from(["ctxbot", "serve", "--webhook"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { webhook: true }));
    }
}
