/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Target chunk size in tokens when splitting a source document.
pub const CHUNK_TARGET_TOKENS: usize = 256;

/// Number of overlap tokens between adjacent chunks of a source document.
pub const CHUNK_OVERLAP_TOKENS: usize = 40;

/// Target chunk size in characters, used when no tokenizer is available.
pub const CHUNK_TARGET_CHARS: usize = 1000;

/// Overlap in characters between adjacent chunks when sizing by characters.
pub const CHUNK_OVERLAP_CHARS: usize = 150;

/// Number of chunks embedded per batch while building an index.
pub const EMBED_BATCH_SIZE: usize = 32;

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Default sampling temperature for generation requests.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default cap on generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 750;

/// OpenAI-compatible endpoint used when `LLM_BASE_URL` is unset.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Chat model used when `LLM_MODEL` is unset.
pub const DEFAULT_LLM_MODEL: &str = "gemma2-9b-it";

/// HTTP timeout for a single generation request.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Pause between generation retries. Retries are disabled unless
/// `LLM_MAX_RETRIES` is set.
pub const LLM_RETRY_BACKOFF_MS: u64 = 500;

/// Tavily search endpoint.
pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Number of results requested from web search.
pub const WEB_SEARCH_MAX_RESULTS: usize = 5;

/// HTTP timeout for web search requests.
pub const WEB_SEARCH_TIMEOUT_SECS: u64 = 30;

/// Telegram Bot API base URL (the token is appended as `/bot<token>`).
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Maximum characters per outgoing Telegram message segment.
///
/// Telegram's hard limit is 4096; the margin leaves room for headers.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

/// Long-poll timeout passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Delay before re-polling after a failed `getUpdates` call.
pub const POLL_RETRY_DELAY_SECS: u64 = 3;

/// Index file used when `CTXBOT_INDEX_PATH` is unset.
pub const DEFAULT_INDEX_PATH: &str = "anthropic_embeddings.index";

/// Chunk file used when `CTXBOT_CHUNKS_PATH` is unset.
pub const DEFAULT_CHUNKS_PATH: &str = "chunks.json";

/// Language news summaries are written in.
pub const DEFAULT_SUMMARY_LANGUAGE: &str = "Russian";

/// Webhook route used when `WEBHOOK_PATH` is unset.
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/telegram_webhook";

/// Webhook listen address used when `WEBHOOK_ADDR` is unset.
pub const DEFAULT_WEBHOOK_ADDR: &str = "0.0.0.0:8000";
