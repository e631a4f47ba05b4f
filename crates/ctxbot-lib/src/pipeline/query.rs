/// Classification result for a user query.
#[derive(Debug, PartialEq, Eq)]
pub enum QueryClass<'a> {
    /// The trimmed query, ready to be embedded.
    Searchable(&'a str),
    /// The query must not reach the pipeline.
    Rejected {
        /// Human-readable reason for the rejection.
        reason: &'static str,
    },
}

/// Decide whether a raw query may be embedded and searched.
///
/// Whitespace around the query is dropped. Empty queries, and queries made up
/// only of control characters, are rejected.
pub fn classify_query(raw: &str) -> QueryClass<'_> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return QueryClass::Rejected {
            reason: "empty query",
        };
    }

    if trimmed.chars().all(char::is_control) {
        return QueryClass::Rejected {
            reason: "no printable text",
        };
    }

    QueryClass::Searchable(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_are_rejected() {
        for raw in ["", "   ", "\n\t "] {
            assert_eq!(
                classify_query(raw),
                QueryClass::Rejected {
                    reason: "empty query"
                }
            );
        }
    }

    #[test]
    fn control_only_is_rejected() {
        assert_eq!(
            classify_query("\u{7}\u{1b}"),
            QueryClass::Rejected {
                reason: "no printable text"
            }
        );
    }

    #[test]
    fn searchable_query_is_trimmed() {
        assert_eq!(
            classify_query("  What is Claude?\n"),
            QueryClass::Searchable("What is Claude?")
        );
    }

    #[test]
    fn single_word_and_cjk_are_searchable() {
        assert_eq!(classify_query("MCP"), QueryClass::Searchable("MCP"));
        assert_eq!(classify_query("安全性"), QueryClass::Searchable("安全性"));
    }
}
