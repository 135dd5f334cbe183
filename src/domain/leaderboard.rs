// Single-player score records and leaderboard ranking.

const DAY_SECONDS: u64 = 24 * 60 * 60;

/// Validated score ready to be appended to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub player_name: String,
    pub score: u64,
    pub lines: u32,
    pub level: u32,
    /// Client-supplied date label, echoed back untouched.
    pub date: Option<String>,
    pub submitted_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub id: u64,
    pub player_name: String,
    pub score: u64,
    pub lines: u32,
    pub level: u32,
    pub date: Option<String>,
    pub submitted_at: u64,
}

impl ScoreRecord {
    pub fn from_new(id: u64, score: NewScore) -> Self {
        Self {
            id,
            player_name: score.player_name,
            score: score.score,
            lines: score.lines,
            level: score.level,
            date: score.date,
            submitted_at: score.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    All,
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// Unknown labels fall back to `All`.
    pub fn parse(value: &str) -> Self {
        match value {
            "daily" => Period::Daily,
            "weekly" => Period::Weekly,
            "monthly" => Period::Monthly,
            _ => Period::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    fn window_seconds(self) -> Option<u64> {
        match self {
            Period::All => None,
            Period::Daily => Some(DAY_SECONDS),
            Period::Weekly => Some(7 * DAY_SECONDS),
            Period::Monthly => Some(30 * DAY_SECONDS),
        }
    }

    pub fn includes(self, submitted_at: u64, now: u64) -> bool {
        match self.window_seconds() {
            None => true,
            Some(window) => submitted_at >= now.saturating_sub(window),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedScore {
    pub rank: u32,
    pub record: ScoreRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    pub entries: Vec<RankedScore>,
    /// Matching records before `limit` was applied.
    pub total: usize,
    pub period: Period,
}

/// Filters by period, sorts by score (highest first, earlier submission wins ties),
/// truncates to `limit` and numbers the result from 1.
pub fn rank_scores(
    mut records: Vec<ScoreRecord>,
    period: Period,
    now: u64,
    limit: usize,
) -> Leaderboard {
    records.retain(|record| period.includes(record.submitted_at, now));
    records.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
    let total = records.len();
    let entries = records
        .into_iter()
        .take(limit)
        .zip(1..)
        .map(|(record, rank)| RankedScore { rank, record })
        .collect();
    Leaderboard {
        entries,
        total,
        period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, score: u64, submitted_at: u64) -> ScoreRecord {
        ScoreRecord {
            id,
            player_name: format!("p{id}"),
            score,
            lines: 0,
            level: 1,
            date: None,
            submitted_at,
        }
    }

    #[test]
    fn ranks_descending_by_score() {
        let board = rank_scores(
            vec![record(1, 100, 0), record(2, 500, 0), record(3, 300, 0)],
            Period::All,
            1_000,
            50,
        );
        let ids: Vec<u64> = board.entries.iter().map(|e| e.record.id).collect();
        let ranks: Vec<u32> = board.entries.iter().map(|e| e.rank).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn period_filter_runs_before_ranking() {
        let now = 100 * DAY_SECONDS;
        let board = rank_scores(
            vec![
                record(1, 900, now - 2 * DAY_SECONDS),
                record(2, 200, now - 60),
                record(3, 400, now - 3_600),
            ],
            Period::Daily,
            now,
            50,
        );
        assert_eq!(board.total, 2);
        assert_eq!(board.entries[0].record.id, 3);
        assert_eq!(board.entries[0].rank, 1);
    }

    #[test]
    fn limit_truncates_after_counting() {
        let board = rank_scores(
            vec![record(1, 1, 0), record(2, 2, 0), record(3, 3, 0)],
            Period::All,
            0,
            2,
        );
        assert_eq!(board.total, 3);
        assert_eq!(board.entries.len(), 2);
    }

    #[test]
    fn ties_keep_submission_order() {
        let board = rank_scores(vec![record(2, 50, 0), record(1, 50, 0)], Period::All, 0, 10);
        assert_eq!(board.entries[0].record.id, 1);
    }

    #[test]
    fn unknown_period_falls_back_to_all() {
        assert_eq!(Period::parse("yearly"), Period::All);
        assert_eq!(Period::parse("weekly"), Period::Weekly);
    }
}
