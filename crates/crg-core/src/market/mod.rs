pub mod coin;
pub mod coingecko;
pub mod format;
pub mod poller;
pub mod widget;

pub use coin::{filter_coins, CoinRecord};
pub use coingecko::CoinGeckoClient;
pub use poller::{MarketEvent, MarketPoller};
pub use widget::{MarketPhase, MarketWidget};
