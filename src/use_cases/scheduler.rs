// Deferred, cancellable room tasks (effect expiry timers and gravity tickers).

use crate::domain::{PlayerId, PowerUpKind, RoomId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Gravity {
        room_id: RoomId,
    },
    Effect {
        room_id: RoomId,
        player_id: PlayerId,
        kind: PowerUpKind,
    },
}

impl TaskKey {
    pub fn room_id(&self) -> &str {
        match self {
            TaskKey::Gravity { room_id } | TaskKey::Effect { room_id, .. } => room_id,
        }
    }
}

struct Scheduled {
    generation: u64,
    handle: AbortHandle,
}

/// At most one live task per key. Rescheduling a key aborts the previous task.
#[derive(Default)]
pub struct TaskScheduler {
    next_generation: AtomicU64,
    tasks: Mutex<HashMap<TaskKey, Scheduled>>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TaskKey, Scheduled>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn schedule<F>(self: &Arc<Self>, key: TaskKey, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let scheduler = Arc::clone(self);
        let finished_key = key.clone();

        // Registered under the lock so a fast task cannot release before insertion.
        let mut tasks = self.tasks();
        let handle = tokio::spawn(async move {
            task.await;
            scheduler.release(&finished_key, generation);
        });
        let scheduled = Scheduled {
            generation,
            handle: handle.abort_handle(),
        };
        if let Some(previous) = tasks.insert(key, scheduled) {
            previous.handle.abort();
        }
    }

    fn release(&self, key: &TaskKey, generation: u64) {
        let mut tasks = self.tasks();
        if tasks
            .get(key)
            .is_some_and(|scheduled| scheduled.generation == generation)
        {
            tasks.remove(key);
        }
    }

    pub fn cancel(&self, key: &TaskKey) -> bool {
        match self.tasks().remove(key) {
            Some(scheduled) => {
                scheduled.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every task belonging to `room_id`.
    pub fn cancel_room(&self, room_id: &str) -> usize {
        let mut tasks = self.tasks();
        let keys: Vec<TaskKey> = tasks
            .keys()
            .filter(|key| key.room_id() == room_id)
            .cloned()
            .collect();
        for key in &keys {
            if let Some(scheduled) = tasks.remove(key) {
                scheduled.handle.abort();
            }
        }
        if !keys.is_empty() {
            debug!(room_id, cancelled = keys.len(), "room tasks cancelled");
        }
        keys.len()
    }

    pub fn is_scheduled(&self, key: &TaskKey) -> bool {
        self.tasks().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks().is_empty()
    }
}
