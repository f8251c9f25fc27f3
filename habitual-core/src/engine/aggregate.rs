use chrono::NaiveDate;
use uuid::Uuid;

use super::{bulk_quality, HabitEngine};
use crate::error::{HabitError, Result};
use crate::models::{DashboardMetrics, Heatmap, StreakStats};

impl HabitEngine {
    /// Completions per UTC day for `user_id` over `[start, end]`, keyed by ISO date.
    pub fn get_heatmap_data(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Heatmap> {
        if end < start {
            return Err(HabitError::invalid(format!(
                "heatmap range end {} precedes start {}",
                end, start
            )));
        }
        self.db.completion_counts_by_day(user_id, start, end)
    }

    pub fn get_dashboard_metrics(&self, user_id: &str) -> Result<DashboardMetrics> {
        self.db.dashboard_metrics(user_id)
    }

    pub fn get_streak_stats(&self, habit_id: Uuid) -> Result<StreakStats> {
        let habit = self.get_habit(habit_id)?;
        let history = self.db.list_streak_history(habit_id)?;

        Ok(StreakStats {
            habit_id,
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            streak_quality: habit.streak_quality,
            runs: history.len(),
            total_completed_days: history.iter().map(|h| h.completed_days).sum(),
            bulk_quality: bulk_quality(&history),
        })
    }
}
