use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::HabitEngine;
use crate::error::{HabitError, Result};
use crate::models::{NewStreakHistory, StreakHistory};

/// Days to attribute to a new run given the existing runs it intersects.
///
/// Only the span of the first intersecting run is subtracted. With several
/// intersecting runs this undercounts the true overlap; that approximation is
/// intentional and stored history depends on it.
pub fn adjusted_completed_days(streak_length: i64, overlapping: &[StreakHistory]) -> i64 {
    match overlapping.first() {
        Some(first) => (streak_length - first.span_days()).max(0),
        None => streak_length,
    }
}

impl HabitEngine {
    /// Retire a streak run into history, ending on `last_completed_date`.
    pub fn log_streak_history(
        &self,
        habit_id: Uuid,
        streak_length: i64,
        last_completed_date: DateTime<Utc>,
    ) -> Result<StreakHistory> {
        let entry = self.plan_streak_history(habit_id, streak_length, last_completed_date)?;
        let history = self.db.insert_streak_history(&entry, self.now())?;
        log_history(&history);
        Ok(history)
    }

    /// Build the history row for a run without writing it.
    pub(crate) fn plan_streak_history(
        &self,
        habit_id: Uuid,
        streak_length: i64,
        last_completed_date: DateTime<Utc>,
    ) -> Result<NewStreakHistory> {
        if streak_length < 1 {
            return Err(HabitError::invalid(format!(
                "streak length must be positive, got {}",
                streak_length
            )));
        }

        let start_date = last_completed_date - Duration::days(streak_length - 1);
        let overlapping = self.db.find_overlapping_history(
            habit_id,
            start_date.date_naive(),
            last_completed_date.date_naive(),
        )?;
        if overlapping.len() > 1 {
            tracing::debug!(
                %habit_id,
                overlaps = overlapping.len(),
                "Streak run overlaps several history rows; subtracting the first only"
            );
        }

        Ok(NewStreakHistory {
            habit_id,
            start_date,
            end_date: last_completed_date,
            streak_length,
            completed_days: adjusted_completed_days(streak_length, &overlapping),
        })
    }

    pub fn list_streak_history(&self, habit_id: Uuid) -> Result<Vec<StreakHistory>> {
        self.db.list_streak_history(habit_id)
    }
}

pub(crate) fn log_history(history: &StreakHistory) {
    tracing::info!(
        habit_id = %history.habit_id,
        streak_length = history.streak_length,
        completed_days = history.completed_days,
        "Logged streak history {} .. {}",
        history.start_day(),
        history.end_day()
    );
}
