use async_trait::async_trait;

use crate::domain::leaderboard::{NewScore, ScoreRecord};

// Port for the append-only single-player score store.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn append(&self, score: NewScore) -> Result<ScoreRecord, String>;
    async fn list(&self) -> Result<Vec<ScoreRecord>, String>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}
