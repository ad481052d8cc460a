use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

/// Stand-in for real work (cooking, driving). Suspends the calling task only.
#[async_trait]
pub trait SimulatedDelay: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioDelay;

#[async_trait]
impl SimulatedDelay for TokioDelay {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested pause.
#[derive(Debug, Default)]
pub struct RecordedDelay {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordedDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().await.clone()
    }

    pub async fn total(&self) -> Duration {
        self.pauses.lock().await.iter().sum()
    }
}

#[async_trait]
impl SimulatedDelay for RecordedDelay {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().await.push(duration);
    }
}
