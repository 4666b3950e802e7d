//! Seams to the two remote services.
//!
//! Front ends and tests talk to these traits; the concrete clients live in
//! [`crate::ai`] and [`crate::market`].

use async_trait::async_trait;

use crate::conversation::ChatRequest;
use crate::error::GatewayError;
use crate::market::CoinRecord;
use crate::state::Source;

/// A generated answer plus whatever citations came with it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatReply {
    pub text: String,
    pub sources: Vec<Source>,
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError>;
}

#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// One page of up to 100 coins ranked by market cap.
    async fn fetch_markets(&self) -> Result<Vec<CoinRecord>, GatewayError>;
}
