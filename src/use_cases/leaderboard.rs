use crate::domain::PlayerId;
use crate::domain::errors::LeaderboardError;
use crate::domain::leaderboard::{Leaderboard, NewScore, Period, ScoreRecord, rank_scores};
use crate::domain::ports::{Clock, ScoreStore};
use crate::use_cases::registry::{Registry, lock_session};

// Validated input for the score submission use case.
pub struct ScoreSubmission {
    pub player_name: String,
    pub score: i64,
    pub lines: Option<u32>,
    pub level: Option<u32>,
    pub date: Option<String>,
}

// Single-player score submission with injected dependencies.
pub struct SubmitScoreUseCase<C, S> {
    pub clock: C,
    pub store: S,
}

impl<C, S> SubmitScoreUseCase<C, S>
where
    C: Clock,
    S: ScoreStore,
{
    pub async fn execute(&self, payload: ScoreSubmission) -> Result<ScoreRecord, LeaderboardError> {
        let player_name = payload.player_name.trim();
        if player_name.is_empty() {
            return Err(LeaderboardError::InvalidName);
        }
        let score = u64::try_from(payload.score).map_err(|_| LeaderboardError::InvalidScore)?;

        let new_score = NewScore {
            player_name: player_name.to_string(),
            score,
            lines: payload.lines.unwrap_or(0),
            level: payload.level.unwrap_or(1),
            date: payload.date,
            submitted_at: self.clock.now_epoch_seconds(),
        };

        self.store
            .append(new_score)
            .await
            .map_err(|_| LeaderboardError::StorageFailure)
    }
}

// Ranked single-player scores for a time window.
pub struct LeaderboardUseCase<C, S> {
    pub clock: C,
    pub store: S,
}

impl<C, S> LeaderboardUseCase<C, S>
where
    C: Clock,
    S: ScoreStore,
{
    pub async fn execute(&self, period: Period, limit: usize) -> Result<Leaderboard, LeaderboardError> {
        let records = self
            .store
            .list()
            .await
            .map_err(|_| LeaderboardError::StorageFailure)?;
        Ok(rank_scores(
            records,
            period,
            self.clock.now_epoch_seconds(),
            limit,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub rank: u32,
    pub player_id: PlayerId,
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    /// Wins over games played, 0.0 before the first finished match.
    pub win_rate: f64,
}

/// Win/loss table of the currently registered players.
pub fn multiplayer_standings(registry: &Registry, limit: usize) -> Vec<Standing> {
    let mut rows: Vec<(PlayerId, String, u32, u32)> = registry
        .players()
        .iter()
        .map(|session| {
            let session = lock_session(session);
            (session.id, session.display_name.clone(), session.wins, session.losses)
        })
        .collect();
    rows.sort_by(|a, b| b.2.cmp(&a.2).then(a.3.cmp(&b.3)).then(a.0.cmp(&b.0)));

    rows.into_iter()
        .take(limit)
        .zip(1..)
        .map(|((player_id, display_name, wins, losses), rank)| {
            let played = wins + losses;
            let win_rate = if played == 0 {
                0.0
            } else {
                f64::from(wins) / f64::from(played)
            };
            Standing {
                rank,
                player_id,
                display_name,
                wins,
                losses,
                win_rate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerSession;
    use crate::use_cases::test_support::{FailureFlags, FixedClock, RecordingStore};

    const NOW: u64 = 1_700_000_000;

    fn submission(name: &str, score: i64) -> ScoreSubmission {
        ScoreSubmission {
            player_name: name.to_string(),
            score,
            lines: Some(12),
            level: Some(2),
            date: Some("2024-01-01T00:00:00Z".to_string()),
        }
    }

    #[tokio::test]
    async fn when_submission_is_valid_then_score_is_stored_with_server_time() {
        let store = RecordingStore::new();
        let use_case = SubmitScoreUseCase {
            clock: FixedClock(NOW),
            store: store.clone(),
        };

        let record = use_case
            .execute(submission("  Ann ", 500))
            .await
            .expect("valid submission");

        assert_eq!(record.player_name, "Ann");
        assert_eq!(record.score, 500);
        assert_eq!(record.submitted_at, NOW);
        assert_eq!(store.stored(), vec![record]);
    }

    #[tokio::test]
    async fn when_name_is_blank_then_submission_is_rejected() {
        let store = RecordingStore::new();
        let use_case = SubmitScoreUseCase {
            clock: FixedClock(NOW),
            store: store.clone(),
        };

        let result = use_case.execute(submission("   ", 10)).await;

        assert_eq!(result, Err(LeaderboardError::InvalidName));
        assert!(store.stored().is_empty());
    }

    #[tokio::test]
    async fn when_score_is_negative_then_submission_is_rejected() {
        let use_case = SubmitScoreUseCase {
            clock: FixedClock(NOW),
            store: RecordingStore::new(),
        };

        assert_eq!(
            use_case.execute(submission("Ann", -1)).await,
            Err(LeaderboardError::InvalidScore)
        );
        assert!(use_case.execute(submission("Ann", 0)).await.is_ok());
    }

    #[tokio::test]
    async fn when_store_fails_then_storage_failure_is_returned() {
        let use_case = SubmitScoreUseCase {
            clock: FixedClock(NOW),
            store: RecordingStore::new().with_failures(FailureFlags {
                append: true,
                ..FailureFlags::default()
            }),
        };

        assert_eq!(
            use_case.execute(submission("Ann", 5)).await,
            Err(LeaderboardError::StorageFailure)
        );
    }

    #[tokio::test]
    async fn when_highest_score_is_submitted_then_it_ranks_first() {
        let store = RecordingStore::new();
        let submit = SubmitScoreUseCase {
            clock: FixedClock(NOW),
            store: store.clone(),
        };
        submit.execute(submission("Bob", 200)).await.expect("stored");
        submit.execute(submission("Ann", 500)).await.expect("stored");

        let leaderboard = LeaderboardUseCase {
            clock: FixedClock(NOW),
            store,
        }
        .execute(Period::All, 50)
        .await
        .expect("leaderboard");

        assert_eq!(leaderboard.total, 2);
        assert_eq!(leaderboard.entries[0].rank, 1);
        assert_eq!(leaderboard.entries[0].record.player_name, "Ann");
    }

    #[tokio::test]
    async fn when_period_excludes_old_scores_then_they_are_filtered() {
        let store = RecordingStore::new();
        SubmitScoreUseCase {
            clock: FixedClock(NOW - 3 * 86_400),
            store: store.clone(),
        }
        .execute(submission("Old", 900))
        .await
        .expect("stored");
        SubmitScoreUseCase {
            clock: FixedClock(NOW),
            store: store.clone(),
        }
        .execute(submission("New", 100))
        .await
        .expect("stored");

        let use_case = LeaderboardUseCase {
            clock: FixedClock(NOW),
            store,
        };
        let daily = use_case.execute(Period::Daily, 50).await.expect("daily");
        let weekly = use_case.execute(Period::Weekly, 50).await.expect("weekly");

        assert_eq!(daily.total, 1);
        assert_eq!(daily.entries[0].record.player_name, "New");
        assert_eq!(weekly.total, 2);
        assert_eq!(weekly.entries[0].record.player_name, "Old");
    }

    #[tokio::test]
    async fn when_listing_fails_then_storage_failure_is_returned() {
        let use_case = LeaderboardUseCase {
            clock: FixedClock(NOW),
            store: RecordingStore::new().with_failures(FailureFlags {
                list: true,
                ..FailureFlags::default()
            }),
        };

        assert_eq!(
            use_case.execute(Period::All, 50).await,
            Err(LeaderboardError::StorageFailure)
        );
    }

    #[test]
    fn standings_rank_by_wins_then_fewer_losses() {
        let registry = Registry::new();
        for (id, name, wins, losses) in [(1, "Ann", 2, 3), (2, "Bob", 2, 1), (3, "Cid", 0, 0)] {
            let mut session = PlayerSession::new(id, name.to_string());
            session.wins = wins;
            session.losses = losses;
            registry.insert_player(session);
        }

        let standings = multiplayer_standings(&registry, 50);

        let names: Vec<&str> = standings.iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Ann", "Cid"]);
        assert_eq!(standings[0].rank, 1);
        assert!((standings[0].win_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(standings[2].win_rate, 0.0);
        assert_eq!(multiplayer_standings(&registry, 1).len(), 1);
    }
}
