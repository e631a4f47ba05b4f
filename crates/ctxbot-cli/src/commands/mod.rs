pub mod ask;
pub mod index;
pub mod model;
pub mod retrieve;
pub mod serve;

use ctxbot_lib::output::ConsoleIO;
use ctxbot_lib::pipeline::{QueryClass, classify_query};

/// Resolve the query argument: `-` reads it from stdin. Empty queries are an
/// error.
pub(crate) fn resolve_query<IO: ConsoleIO>(raw: &str, io: &mut IO) -> anyhow::Result<String> {
    let text = if raw == "-" {
        io.read_input()?
    } else {
        raw.to_string()
    };
    match classify_query(&text) {
        QueryClass::Searchable(query) => Ok(query.to_string()),
        QueryClass::Rejected { reason } => anyhow::bail!("Query rejected: {reason}."),
    }
}
