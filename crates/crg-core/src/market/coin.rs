use serde::{Deserialize, Serialize};

/// One row of the CoinGecko `/coins/markets` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub price_change_percentage_24h: Option<f64>,
}

impl CoinRecord {
    pub fn matches(&self, lowered_term: &str) -> bool {
        self.name.to_lowercase().contains(lowered_term) || self.symbol.to_lowercase().contains(lowered_term)
    }
}

/// Coins whose name or symbol contains `term`, case-insensitively, in list order.
pub fn filter_coins(coins: &[CoinRecord], term: &str) -> Vec<CoinRecord> {
    let term = term.to_lowercase();
    coins.iter().filter(|c| c.matches(&term)).cloned().collect()
}

#[cfg(test)]
pub(crate) fn sample_coins() -> Vec<CoinRecord> {
    let coin = |id: &str, symbol: &str, name: &str, rank: u32, price: f64| CoinRecord {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        image: format!("https://assets.example/{}.png", id),
        current_price: Some(price),
        market_cap: Some(price * 1_000_000.0),
        market_cap_rank: Some(rank),
        price_change_percentage_24h: Some(-1.5),
    };
    vec![
        coin("bitcoin", "btc", "Bitcoin", 1, 67_000.0),
        coin("ethereum", "eth", "Ethereum", 2, 3_500.0),
        coin("tether", "usdt", "Tether", 3, 1.0),
        coin("wrapped-bitcoin", "wbtc", "Wrapped Bitcoin", 15, 66_900.0),
        coin("dogecoin", "doge", "Dogecoin", 8, 0.15),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_name_or_symbol() {
        let coins = sample_coins();
        let ids: Vec<String> = filter_coins(&coins, "BTC").into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["bitcoin", "wrapped-bitcoin"]);

        let ids: Vec<String> = filter_coins(&coins, "coin").into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["bitcoin", "wrapped-bitcoin", "dogecoin"]);
    }

    #[test]
    fn test_filter_is_deterministic() {
        let coins = sample_coins();
        assert_eq!(filter_coins(&coins, "eth"), filter_coins(&coins, "eth"));
        assert_eq!(filter_coins(&coins, "").len(), coins.len());
        assert!(filter_coins(&coins, "solana").is_empty());
    }

    #[test]
    fn test_deserialize_tolerates_nulls() {
        let json = r#"[{
            "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
            "image": "https://example/btc.png", "current_price": 67000.5,
            "market_cap": 1320000000000, "market_cap_rank": 1,
            "price_change_percentage_24h": null, "total_volume": 123
        }]"#;
        let coins: Vec<CoinRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(coins[0].market_cap_rank, Some(1));
        assert_eq!(coins[0].price_change_percentage_24h, None);
        assert_eq!(coins[0].market_cap, Some(1.32e12));
    }
}
