use crate::feed_types::FeatureCollection;
use crate::state::TrainSnapshot;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error! Status: {0}")]
    Status(u16),

    #[error("invalid train feed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can produce a fresh snapshot of train positions.
pub trait TrainSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<TrainSnapshot, FetchError>> + Send;
}

pub struct DigitrafficClient {
    client: reqwest::Client,
    url: String,
}

impl DigitrafficClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url })
    }
}

impl TrainSource for DigitrafficClient {
    async fn fetch(&self) -> Result<TrainSnapshot, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header("Digitraffic-User", env!("CARGO_PKG_NAME"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let doc: FeatureCollection = serde_json::from_slice(&body)?;
        let snapshot = TrainSnapshot::from_feed(doc, Utc::now());
        debug!(trains = snapshot.len(), "Fetched train locations");
        Ok(snapshot)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays queued results; once drained, every fetch fails with 503.
    #[derive(Default)]
    pub struct ScriptedSource {
        responses: Mutex<VecDeque<Result<TrainSnapshot, FetchError>>>,
        pub fetches: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_ok(&self, snapshot: TrainSnapshot) {
            self.responses.lock().unwrap().push_back(Ok(snapshot));
        }

        pub fn push_err(&self, err: FetchError) {
            self.responses.lock().unwrap().push_back(Err(err));
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl TrainSource for ScriptedSource {
        async fn fetch(&self) -> Result<TrainSnapshot, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Status(503)))
        }
    }
}
