use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::PlayerId;
use crate::domain::leaderboard::{NewScore, ScoreRecord};
use crate::domain::ports::{Clock, ScoreStore};
use crate::use_cases::types::{Notifier, ServerEvent};

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub append: bool,
    pub list: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    records: Arc<Mutex<Vec<ScoreRecord>>>,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn stored(&self) -> Vec<ScoreRecord> {
        self.records.lock().expect("records mutex poisoned").clone()
    }
}

#[async_trait]
impl ScoreStore for RecordingStore {
    async fn append(&self, score: NewScore) -> Result<ScoreRecord, String> {
        if self.failures.append {
            return Err("append failed".to_string());
        }

        let mut guard = self.records.lock().expect("records mutex poisoned");
        let record = ScoreRecord::from_new(guard.len() as u64 + 1, score);
        guard.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<ScoreRecord>, String> {
        if self.failures.list {
            return Err("list failed".to_string());
        }

        Ok(self.records.lock().expect("records mutex poisoned").clone())
    }
}

// Captures every notification with its recipient list.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<(Vec<PlayerId>, ServerEvent)>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<(Vec<PlayerId>, ServerEvent)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    pub(crate) fn received_by(&self, player_id: PlayerId) -> Vec<ServerEvent> {
        self.events()
            .into_iter()
            .filter(|(recipients, _)| recipients.contains(&player_id))
            .map(|(_, event)| event)
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.sent.lock().expect("notifier mutex poisoned").clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipients: &[PlayerId], event: &ServerEvent) {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push((recipients.to_vec(), event.clone()));
    }
}
