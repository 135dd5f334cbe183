use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::domain::leaderboard::{NewScore, ScoreRecord};
use crate::domain::ports::{Clock, ScoreStore};
use crate::interface_adapters::hub::ConnectionHub;
use crate::use_cases::MatchOrchestrator;

// Application state shared by websocket and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: MatchOrchestrator,
    // Outbound queues; also the orchestrator's notifier.
    pub hub: Arc<ConnectionHub>,
    pub scores: InMemoryScoreStore,
}

// Append-only in-memory score store; ids are assigned in submission order.
#[derive(Clone, Default)]
pub struct InMemoryScoreStore {
    pub records: Arc<Mutex<Vec<ScoreRecord>>>,
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn append(&self, score: NewScore) -> Result<ScoreRecord, String> {
        let mut records = self.records.lock().await;
        let record = ScoreRecord::from_new(records.len() as u64 + 1, score);
        records.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<ScoreRecord>, String> {
        Ok(self.records.lock().await.clone())
    }
}

// System clock adapter for production use.
#[derive(Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
