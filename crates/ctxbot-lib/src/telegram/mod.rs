//! Telegram Bot API: wire types, HTTP client, command parsing and message
//! splitting.

pub mod api;
pub mod command;
pub mod split;
pub mod types;

pub use api::{HttpTelegramApi, TelegramApi};
pub use command::{Command, parse_command};
pub use split::split_message;
pub use types::{ApiResponse, Chat, Message, Update, User};
