pub mod ai;
pub mod config;
pub mod context;
pub mod conversation;
pub mod country;
pub mod error;
pub mod gateway;
pub mod market;
pub mod state;

// Re-export main types for convenience
pub use ai::GeminiClient;
pub use config::Config;
pub use context::ChatContext;
pub use conversation::{ChatRequest, Completion, Conversation, SendRejected};
pub use country::{Country, CountrySelector, PRESET_COUNTRIES};
pub use error::GatewayError;
pub use gateway::{ChatGateway, ChatReply, MarketGateway};
pub use market::{CoinGeckoClient, CoinRecord, MarketEvent, MarketPhase, MarketPoller, MarketWidget};
pub use state::{HistoryTurn, Message, MessageBody, Role, Source};
