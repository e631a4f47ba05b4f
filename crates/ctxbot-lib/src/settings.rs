//! Runtime settings read from environment variables.
//!
//! Layered with `figment`: built-in defaults first, then the environment. The
//! binary loads a `.env` file before this runs, so every variable may also
//! come from there. Tests build settings through [`Settings::from_lookup`] and
//! never touch the process environment.
//!
//! Env values are parsed by figment, so a purely numeric secret must be
//! quoted (`WEBHOOK_SECRET='"12345"'`) to stay a string.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Serialized};
use figment::value::{Dict, Value};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_CHUNKS_PATH, DEFAULT_INDEX_PATH, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL,
    DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_SUMMARY_LANGUAGE, DEFAULT_TEMPERATURE,
    DEFAULT_TOP_K, DEFAULT_WEBHOOK_PATH,
};
use crate::error::ConfigError;

/// Every variable the bot reads.
pub const ENV_VARS: &[&str] = &[
    "TELEGRAM_TOKEN",
    "LLM_API_KEY",
    "GROQ_API_KEY",
    "LLM_BASE_URL",
    "LLM_MODEL",
    "LLM_TEMPERATURE",
    "LLM_MAX_TOKENS",
    "LLM_TIMEOUT_SECS",
    "LLM_MAX_RETRIES",
    "TAVILY_API_KEY",
    "CTXBOT_KNOWLEDGE",
    "CTXBOT_INDEX_PATH",
    "CTXBOT_CHUNKS_PATH",
    "CTXBOT_MODEL_DIR",
    "CTXBOT_TOP_K",
    "CTXBOT_SUMMARY_LANGUAGE",
    "CTXBOT_CHAT",
    "WEBHOOK_PATH",
    "WEBHOOK_ADDR",
    "WEBHOOK_URL",
    "WEBHOOK_SECRET",
];

/// Settings for the OpenAI-compatible generation API.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Settings for webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookSettings {
    pub path: String,
    pub addr: SocketAddr,
    /// Public URL registered with Telegram on startup, if any.
    pub public_url: Option<String>,
    /// Expected value of the `X-Telegram-Bot-Api-Secret-Token` header.
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub telegram_token: Option<String>,
    pub llm: LlmSettings,
    pub tavily_api_key: Option<String>,
    /// Whether the bot serves the knowledge-base commands. When enabled, a
    /// missing or invalid index is fatal at startup.
    pub knowledge_enabled: bool,
    pub index_path: PathBuf,
    pub chunks_path: PathBuf,
    pub model_dir: PathBuf,
    pub top_k: usize,
    pub summary_language: String,
    /// Whether free text (not a command) is forwarded to the LLM.
    pub chat_enabled: bool,
    pub webhook: WebhookSettings,
}

/// The environment as figment extracts it: one field per variable, keyed by
/// the lowercased name. Text values and the address stay optional so blank
/// or absent ones fall back to their defaults after extraction.
#[derive(Debug, Serialize, Deserialize)]
struct EnvVars {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    telegram_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    llm_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    groq_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    llm_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    llm_model: Option<String>,
    llm_temperature: f32,
    llm_max_tokens: u32,
    llm_timeout_secs: u64,
    llm_max_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tavily_api_key: Option<String>,
    #[serde(deserialize_with = "figment::util::bool_from_str_or_int")]
    ctxbot_knowledge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ctxbot_index_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ctxbot_chunks_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ctxbot_model_dir: Option<String>,
    ctxbot_top_k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ctxbot_summary_language: Option<String>,
    #[serde(deserialize_with = "figment::util::bool_from_str_or_int")]
    ctxbot_chat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    webhook_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    webhook_addr: Option<SocketAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    webhook_secret: Option<String>,
}

impl Default for EnvVars {
    fn default() -> Self {
        Self {
            telegram_token: None,
            llm_api_key: None,
            groq_api_key: None,
            llm_base_url: None,
            llm_model: None,
            llm_temperature: DEFAULT_TEMPERATURE,
            llm_max_tokens: DEFAULT_MAX_TOKENS,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            llm_max_retries: 0,
            tavily_api_key: None,
            ctxbot_knowledge: true,
            ctxbot_index_path: None,
            ctxbot_chunks_path: None,
            ctxbot_model_dir: None,
            ctxbot_top_k: DEFAULT_TOP_K,
            ctxbot_summary_language: None,
            ctxbot_chat: true,
            webhook_path: None,
            webhook_addr: None,
            webhook_url: None,
            webhook_secret: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::extract(defaults().merge(Env::raw().only(ENV_VARS)))
    }

    /// Read settings through an arbitrary variable lookup. Values are parsed
    /// the same way figment parses the environment.
    ///
    /// Blank text values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars: Dict = ENV_VARS
            .iter()
            .filter_map(|var| {
                let raw = lookup(var)?;
                let value = raw
                    .trim()
                    .parse::<Value>()
                    .unwrap_or_else(|_| Value::from(raw.clone()));
                Some((var.to_ascii_lowercase(), value))
            })
            .collect();
        Self::extract(defaults().merge(Serialized::defaults(vars)))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let vars: EnvVars = figment.extract().map_err(|e| extract_error(&e))?;
        vars.validate()?;
        Ok(vars.into_settings())
    }

    /// Telegram bot token, or an error naming the missing variable.
    pub fn require_telegram_token(&self) -> Result<&str, ConfigError> {
        self.telegram_token
            .as_deref()
            .ok_or(ConfigError::Missing {
                var: "TELEGRAM_TOKEN",
            })
    }
}

impl EnvVars {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::Invalid {
                var: "LLM_TEMPERATURE",
                value: self.llm_temperature.to_string(),
                reason: "must be between 0.0 and 2.0".into(),
            });
        }
        if self.llm_max_tokens == 0 {
            return Err(ConfigError::Invalid {
                var: "LLM_MAX_TOKENS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.ctxbot_top_k == 0 {
            return Err(ConfigError::Invalid {
                var: "CTXBOT_TOP_K",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        if let Some(path) = non_blank(self.webhook_path.as_deref())
            && !path.starts_with('/')
        {
            return Err(ConfigError::Invalid {
                var: "WEBHOOK_PATH",
                value: path.to_string(),
                reason: "must start with '/'".into(),
            });
        }
        Ok(())
    }

    fn into_settings(self) -> Settings {
        let text = |value: Option<String>, default: &str| {
            non_blank(value.as_deref()).unwrap_or(default).to_string()
        };
        let optional = |value: Option<String>| non_blank(value.as_deref()).map(str::to_string);

        Settings {
            telegram_token: optional(self.telegram_token),
            llm: LlmSettings {
                api_key: optional(self.llm_api_key).or_else(|| optional(self.groq_api_key)),
                base_url: text(self.llm_base_url, DEFAULT_LLM_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                model: text(self.llm_model, DEFAULT_LLM_MODEL),
                temperature: self.llm_temperature,
                max_tokens: self.llm_max_tokens,
                timeout: Duration::from_secs(self.llm_timeout_secs),
                max_retries: self.llm_max_retries,
            },
            tavily_api_key: optional(self.tavily_api_key),
            knowledge_enabled: self.ctxbot_knowledge,
            index_path: PathBuf::from(text(self.ctxbot_index_path, DEFAULT_INDEX_PATH)),
            chunks_path: PathBuf::from(text(self.ctxbot_chunks_path, DEFAULT_CHUNKS_PATH)),
            model_dir: optional(self.ctxbot_model_dir)
                .map_or_else(default_model_dir, PathBuf::from),
            top_k: self.ctxbot_top_k,
            summary_language: text(self.ctxbot_summary_language, DEFAULT_SUMMARY_LANGUAGE),
            chat_enabled: self.ctxbot_chat,
            webhook: WebhookSettings {
                path: text(self.webhook_path, DEFAULT_WEBHOOK_PATH),
                addr: self.webhook_addr.unwrap_or_else(default_webhook_addr),
                public_url: optional(self.webhook_url),
                secret: optional(self.webhook_secret),
            },
        }
    }
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(EnvVars::default()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Name the offending variable in figment's error. Field keys are the
/// lowercased variable names.
fn extract_error(e: &figment::Error) -> ConfigError {
    ConfigError::Parse {
        var: e
            .path
            .last()
            .map_or_else(|| "environment".to_string(), |key| key.to_ascii_uppercase()),
        reason: e.kind.to_string(),
    }
}

/// `~/.ctxbot/models`, or a relative fallback when there is no home directory.
fn default_model_dir() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(".ctxbot").join("models"),
        |home| home.join(".ctxbot").join("models"),
    )
}

fn default_webhook_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::DEFAULT_WEBHOOK_ADDR;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.telegram_token, None);
        assert_eq!(settings.llm.api_key, None);
        assert_eq!(settings.llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(settings.llm.model, "gemma2-9b-it");
        assert!((settings.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.llm.max_tokens, 750);
        assert_eq!(settings.llm.timeout, Duration::from_secs(60));
        assert_eq!(settings.llm.max_retries, 0);
        assert!(settings.knowledge_enabled);
        assert_eq!(settings.index_path, PathBuf::from("anthropic_embeddings.index"));
        assert_eq!(settings.chunks_path, PathBuf::from("chunks.json"));
        assert_eq!(settings.top_k, 3);
        assert_eq!(settings.summary_language, "Russian");
        assert!(settings.chat_enabled);
        assert_eq!(settings.webhook.path, "/api/telegram_webhook");
        assert_eq!(settings.webhook.addr.to_string(), DEFAULT_WEBHOOK_ADDR);
    }

    #[test]
    fn groq_key_is_used_when_llm_key_is_absent() {
        let settings = settings_from(&[("GROQ_API_KEY", "gsk-1")]).unwrap();
        assert_eq!(settings.llm.api_key.as_deref(), Some("gsk-1"));

        let settings =
            settings_from(&[("GROQ_API_KEY", "gsk-1"), ("LLM_API_KEY", "sk-2")]).unwrap();
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-2"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let settings = settings_from(&[
            ("TELEGRAM_TOKEN", "  "),
            ("LLM_MODEL", ""),
            ("WEBHOOK_PATH", " "),
        ])
        .unwrap();
        assert_eq!(settings.telegram_token, None);
        assert_eq!(settings.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(settings.webhook.path, DEFAULT_WEBHOOK_PATH);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let settings = settings_from(&[("LLM_BASE_URL", "http://localhost:11434/v1/")]).unwrap();
        assert_eq!(settings.llm.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = settings_from(&[
            ("CTXBOT_TOP_K", "7"),
            ("LLM_TEMPERATURE", "0.9"),
            ("LLM_MAX_RETRIES", "2"),
            ("CTXBOT_CHAT", "false"),
            ("CTXBOT_KNOWLEDGE", "off"),
            ("WEBHOOK_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(settings.top_k, 7);
        assert!((settings.llm.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(settings.llm.max_retries, 2);
        assert!(!settings.chat_enabled);
        assert!(!settings.knowledge_enabled);
        assert_eq!(settings.webhook.addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = settings_from(&[("CTXBOT_TOP_K", "three")]).unwrap_err();
        assert!(
            matches!(&err, ConfigError::Parse { var, .. } if var == "CTXBOT_TOP_K"),
            "{err}"
        );
        assert!(err.to_string().starts_with("invalid value for CTXBOT_TOP_K: "), "{err}");
    }

    #[test]
    fn invalid_address_is_an_error() {
        let err = settings_from(&[("WEBHOOK_ADDR", "not-an-addr")]).unwrap_err();
        assert!(
            matches!(&err, ConfigError::Parse { var, .. } if var == "WEBHOOK_ADDR"),
            "{err}"
        );
    }

    #[test]
    fn text_values_keep_their_text() {
        let settings = settings_from(&[
            ("TELEGRAM_TOKEN", "123456:ABC-def"),
            ("CTXBOT_INDEX_PATH", "/var/lib/ctxbot/kb.index"),
            ("WEBHOOK_URL", "https://bot.example.com/api/telegram_webhook"),
        ])
        .unwrap();
        assert_eq!(settings.telegram_token.as_deref(), Some("123456:ABC-def"));
        assert_eq!(settings.index_path, PathBuf::from("/var/lib/ctxbot/kb.index"));
        assert_eq!(
            settings.webhook.public_url.as_deref(),
            Some("https://bot.example.com/api/telegram_webhook")
        );
    }

    #[test]
    fn bools_accept_common_spellings() {
        for (raw, expected) in [("1", true), ("yes", true), ("0", false), ("no", false)] {
            let settings = settings_from(&[("CTXBOT_CHAT", raw)]).unwrap();
            assert_eq!(settings.chat_enabled, expected, "{raw}");
        }
    }

    #[test]
    fn unrelated_variables_are_ignored() {
        let settings = settings_from(&[("HOME", "/root"), ("PATH", "/usr/bin")]).unwrap();
        assert_eq!(settings, settings_from(&[]).unwrap());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(settings_from(&[("CTXBOT_TOP_K", "0")]).is_err());
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let err = settings_from(&[("LLM_TEMPERATURE", "3.5")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value \"3.5\" for LLM_TEMPERATURE: must be between 0.0 and 2.0"
        );
    }

    #[test]
    fn invalid_bool_is_rejected() {
        assert!(settings_from(&[("CTXBOT_CHAT", "maybe")]).is_err());
    }

    #[test]
    fn webhook_path_must_be_absolute() {
        assert!(settings_from(&[("WEBHOOK_PATH", "hook")]).is_err());
    }

    #[test]
    fn missing_telegram_token_is_named() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(
            settings.require_telegram_token().unwrap_err().to_string(),
            "environment variable TELEGRAM_TOKEN is not set"
        );
    }
}
