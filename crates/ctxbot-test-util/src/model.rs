use std::path::PathBuf;

/// Return the model cache directory for tests.
///
/// Checks `CTXBOT_MODEL_DIR` first, falling back to `~/.ctxbot/models/`.
pub fn model_dir() -> PathBuf {
    std::env::var("CTXBOT_MODEL_DIR").map_or_else(
        |_| {
            dirs::home_dir()
                .expect("home dir")
                .join(".ctxbot")
                .join("models")
        },
        PathBuf::from,
    )
}
