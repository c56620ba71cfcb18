use std::future::Future;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, PartialEq)]
pub enum Gated<T> {
    Completed(T),
    /// A newer call through the same gate started before this one finished.
    Superseded,
}

/// Latest-wins guard: starting a call cancels the one still in flight.
#[derive(Default)]
pub struct LatestWins {
    current: Mutex<Option<CancellationToken>>,
}

impl LatestWins {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, T>(&self, work: F) -> Gated<T>
    where
        F: Future<Output = T>,
    {
        let token = CancellationToken::new();
        let previous = self.current.lock().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("In-flight request superseded");
                Gated::Superseded
            }
            out = work => Gated::Completed(out),
        }
    }

    /// Cancel whatever is in flight without starting anything new.
    pub fn cancel(&self) {
        let token = self.current.lock().take();
        if let Some(token) = token {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn newer_call_supersedes_older() {
        let gate = Arc::new(LatestWins::new());

        let slow = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "slow"
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let fast = gate.run(async { "fast" }).await;
        assert_eq!(fast, Gated::Completed("fast"));
        assert_eq!(slow.await.unwrap(), Gated::Superseded);
    }

    #[tokio::test]
    async fn sequential_calls_all_complete() {
        let gate = LatestWins::new();
        assert_eq!(gate.run(async { 1 }).await, Gated::Completed(1));
        assert_eq!(gate.run(async { 2 }).await, Gated::Completed(2));
    }

    #[tokio::test]
    async fn explicit_cancel_stops_in_flight_call() {
        let gate = Arc::new(LatestWins::new());
        let pending = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run(tokio::time::sleep(Duration::from_secs(30))).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.cancel();
        assert_eq!(pending.await.unwrap(), Gated::Superseded);
    }
}
