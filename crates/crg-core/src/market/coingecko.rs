use async_trait::async_trait;
use reqwest::Client;

use crate::error::GatewayError;
use crate::gateway::MarketGateway;
use super::coin::CoinRecord;

/// Market gateway backed by the public CoinGecko REST API
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn markets_url(&self) -> String {
        format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=100&page=1&sparkline=false",
            self.base_url
        )
    }
}

#[async_trait]
impl MarketGateway for CoinGeckoClient {
    async fn fetch_markets(&self) -> Result<Vec<CoinRecord>, GatewayError> {
        let response = self.client.get(self.markets_url()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = GatewayError::from_status(status, text);
            tracing::warn!("market fetch failed: {}", err);
            return Err(err);
        }

        let body = response.text().await?;
        let coins: Vec<CoinRecord> = serde_json::from_str(&body)?;
        tracing::debug!(count = coins.len(), "market data fetched");
        Ok(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markets_url_requests_first_page_of_100() {
        let client = CoinGeckoClient::new("https://api.coingecko.com/api/v3/");
        assert_eq!(
            client.markets_url(),
            "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=100&page=1&sparkline=false"
        );
    }
}
