use uuid::Uuid;

use super::HabitEngine;
use crate::error::Result;
use crate::models::StreakHistory;

/// Consistency over the union span of all runs: summed completed days divided
/// by the days from the earliest start to the latest end, saturating at 1.
pub fn union_quality(history: &[StreakHistory]) -> f64 {
    let (Some(earliest), Some(latest)) = (
        history.iter().map(StreakHistory::start_day).min(),
        history.iter().map(StreakHistory::end_day).max(),
    ) else {
        return 0.0;
    };

    let total_days = (latest - earliest).num_days() + 1;
    let completed: i64 = history.iter().map(|h| h.completed_days).sum();
    ratio(completed, total_days)
}

/// Consistency over the summed per-run spans, with no union taken.
///
/// Disagrees with [`union_quality`] when runs overlap or leave gaps; both are
/// kept because they answer different questions.
pub fn bulk_quality(history: &[StreakHistory]) -> f64 {
    let total_days: i64 = history.iter().map(StreakHistory::span_days).sum();
    let completed: i64 = history.iter().map(|h| h.completed_days).sum();
    ratio(completed, total_days)
}

fn ratio(completed: i64, total_days: i64) -> f64 {
    if total_days <= 0 {
        return 0.0;
    }
    (completed as f64 / total_days as f64).clamp(0.0, 1.0)
}

impl HabitEngine {
    /// Recompute `streak_quality` from history and persist it.
    pub fn recompute_quality(&self, habit_id: Uuid) -> Result<f64> {
        let history = self.db.list_streak_history(habit_id)?;
        let quality = union_quality(&history);
        self.db.set_streak_quality(habit_id, quality, self.now())?;
        tracing::debug!(%habit_id, quality, runs = history.len(), "Recomputed streak quality");
        Ok(quality)
    }

    /// Like [`recompute_quality`](Self::recompute_quality), but a failure only
    /// leaves the cached value stale until the next mutation.
    pub(crate) fn refresh_quality(&self, habit_id: Uuid) -> Option<f64> {
        match self.recompute_quality(habit_id) {
            Ok(q) => Some(q),
            Err(e) => {
                tracing::warn!(%habit_id, "Failed to recompute streak quality: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn run(start: (i32, u32, u32), end: (i32, u32, u32), completed: i64) -> StreakHistory {
        let at = |(y, m, d): (i32, u32, u32)| Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap();
        let start_date = at(start);
        let end_date = at(end);
        StreakHistory {
            id: Uuid::new_v4(),
            habit_id: Uuid::nil(),
            start_date,
            end_date,
            streak_length: (end_date.date_naive() - start_date.date_naive()).num_days() + 1,
            completed_days: completed,
            created_at: end_date,
        }
    }

    #[test]
    fn empty_history_scores_zero() {
        assert_eq!(union_quality(&[]), 0.0);
        assert_eq!(bulk_quality(&[]), 0.0);
    }

    #[test]
    fn gap_between_runs_lowers_union_quality() {
        // 10-day and 6-day runs inside a 20-day union
        let history = vec![
            run((2024, 1, 1), (2024, 1, 10), 10),
            run((2024, 1, 15), (2024, 1, 20), 6),
        ];
        assert!((union_quality(&history) - 0.8).abs() < 1e-9);
        assert!((bulk_quality(&history) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_runs_saturate_union_quality() {
        let history = vec![
            run((2024, 1, 1), (2024, 1, 10), 10),
            run((2024, 1, 5), (2024, 1, 12), 8),
        ];
        assert_eq!(union_quality(&history), 1.0);
        assert!(bulk_quality(&history) <= 1.0);
    }

    #[test]
    fn single_day_run_spans_one_day() {
        let h = run((2024, 5, 1), (2024, 5, 1), 1);
        assert_eq!(h.span_days(), 1);
        assert!(h.intersects(
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        ));
    }
}
