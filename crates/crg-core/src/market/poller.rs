use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::GatewayError;
use crate::gateway::MarketGateway;
use super::coin::CoinRecord;

#[derive(Debug)]
pub enum MarketEvent {
    FetchStarted,
    FetchFinished(Result<Vec<CoinRecord>, GatewayError>),
}

/// Background refresh loop for the market popup.
///
/// Fetches once immediately, then on every tick of `period` and on each
/// manual [`refresh`](Self::refresh). Fetches run one at a time inside the
/// task. Dropping the poller aborts the task, so nothing polls while the
/// popup is hidden.
pub struct MarketPoller {
    task: JoinHandle<()>,
    refresh_tx: mpsc::UnboundedSender<()>,
    events: mpsc::UnboundedReceiver<MarketEvent>,
}

impl MarketPoller {
    pub fn start(gateway: Arc<dyn MarketGateway>, period: Duration) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<()>();

        tracing::info!(period_secs = period.as_secs(), "market polling started");

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    cmd = refresh_rx.recv() => {
                        if cmd.is_none() {
                            break;
                        }
                    }
                }

                if event_tx.send(MarketEvent::FetchStarted).is_err() {
                    break;
                }
                let result = gateway.fetch_markets().await;
                if event_tx.send(MarketEvent::FetchFinished(result)).is_err() {
                    break;
                }
            }
        });

        Self { task, refresh_tx, events }
    }

    /// Ask for an out-of-band fetch.
    pub fn refresh(&self) -> bool {
        self.refresh_tx.send(()).is_ok()
    }

    /// Non-blocking read for the UI loop.
    pub fn try_next(&mut self) -> Option<MarketEvent> {
        self.events.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<MarketEvent> {
        self.events.recv().await
    }

    pub fn stop(self) {
        // Drop does the work
    }
}

impl Drop for MarketPoller {
    fn drop(&mut self) {
        self.task.abort();
        tracing::info!("market polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::coin::sample_coins;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingGateway {
        calls: AtomicUsize,
    }

    impl CountingGateway {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketGateway for CountingGateway {
        async fn fetch_markets(&self) -> Result<Vec<CoinRecord>, GatewayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 1 {
                Err(GatewayError::RateLimited)
            } else {
                Ok(sample_coins())
            }
        }
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_every_period() {
        let gateway = Arc::new(CountingGateway::default());
        let _poller = MarketPoller::start(gateway.clone(), Duration::from_secs(30));

        settle().await;
        assert_eq!(gateway.calls(), 1);

        tokio::time::advance(Duration::from_secs(29)).await;
        settle().await;
        assert_eq!(gateway.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(gateway.calls(), 2);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fetches_after_stop() {
        let gateway = Arc::new(CountingGateway::default());
        let poller = MarketPoller::start(gateway.clone(), Duration::from_secs(30));
        settle().await;
        assert_eq!(gateway.calls(), 1);

        poller.stop();
        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_fetches_without_waiting() {
        let gateway = Arc::new(CountingGateway::default());
        let poller = MarketPoller::start(gateway.clone(), Duration::from_secs(30));
        settle().await;

        assert!(poller.refresh());
        settle().await;
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_bracket_each_fetch() {
        let gateway = Arc::new(CountingGateway::default());
        let mut poller = MarketPoller::start(gateway.clone(), Duration::from_secs(30));

        assert!(matches!(poller.next().await, Some(MarketEvent::FetchStarted)));
        match poller.next().await {
            Some(MarketEvent::FetchFinished(Ok(coins))) => assert_eq!(coins.len(), 5),
            other => panic!("unexpected event: {:?}", other),
        }

        // second fetch is rate limited
        assert!(poller.refresh());
        assert!(matches!(poller.next().await, Some(MarketEvent::FetchStarted)));
        assert!(matches!(
            poller.next().await,
            Some(MarketEvent::FetchFinished(Err(GatewayError::RateLimited)))
        ));
        assert!(poller.try_next().is_none());
    }
}
