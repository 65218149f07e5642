// Watchdog Infrastructure - HTTP Adapters
// Implements: RelayApi (relay HTTP/JSON), Notifier (Telegram bot API)

pub mod error;
pub mod relay;
pub mod telegram;

pub use error::HttpAdapterError;
pub use relay::HttpRelayApi;
pub use telegram::{BotCredentials, TelegramNotifier};
