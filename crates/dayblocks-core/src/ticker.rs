//! One-second tick service.
//!
//! The ticker owns a broadcast channel; the sequence runner and any display
//! consumers subscribe to it. [`Ticker::start`] drives it from a tokio
//! interval, [`Ticker::fire`] emits a tick by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

const CHANNEL_CAPACITY: usize = 64;

/// A single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub seq: u64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Ticker {
    tx: broadcast::Sender<Tick>,
    seq: Arc<AtomicU64>,
}

impl Ticker {
    /// A ticker with no background task. Ticks only happen through [`fire`](Self::fire).
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawn an interval task firing every `period`.
    ///
    /// The task runs until the returned handle is aborted.
    pub fn start(&self, period: Duration) -> JoinHandle<()> {
        let ticker = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if ticker.fire().is_none() {
                    trace!("tick dropped, no subscribers");
                }
            }
        })
    }

    /// Emit one tick now. Returns `None` when nobody is subscribed.
    pub fn fire(&self) -> Option<Tick> {
        let tick = Tick {
            seq: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
            at: Utc::now(),
        };
        self.tx.send(tick).ok().map(|_| tick)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Tick> {
        self.tx.subscribe()
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fire_reaches_every_subscriber() {
        let ticker = Ticker::new();
        let mut a = ticker.subscribe();
        let mut b = ticker.subscribe();

        let tick = ticker.fire().unwrap();
        assert_eq!(tick.seq, 1);
        assert_eq!(a.recv().await.unwrap(), tick);
        assert_eq!(b.recv().await.unwrap(), tick);
    }

    #[test]
    fn fire_without_subscribers_is_none() {
        let ticker = Ticker::new();
        assert!(ticker.fire().is_none());
    }

    #[tokio::test]
    async fn started_ticker_delivers_ticks() {
        let ticker = Ticker::new();
        let mut rx = ticker.subscribe();
        let handle = ticker.start(Duration::from_millis(10));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second.seq > first.seq);
        handle.abort();
    }
}
