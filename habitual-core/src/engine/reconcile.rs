use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::history::log_history;
use super::HabitEngine;
use crate::effects::{Effect, NotificationKind, Outcome};
use crate::error::Result;
use crate::models::{AnalyticsPayload, Habit};

/// Retired streaks shorter than this do not notify the user.
const BROKEN_STREAK_NOTIFY_THRESHOLD: i64 = 3;

/// One habit that could not be reconciled. The scan carried on without it.
#[derive(Debug, Clone, Serialize)]
pub struct PartialReconciliationFailure {
    pub habit_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Habits examined.
    pub scanned: usize,
    /// Habits whose streak was retired and reset.
    pub affected: usize,
    pub failures: Vec<PartialReconciliationFailure>,
}

impl HabitEngine {
    /// Clear `is_completed` on every habit whose last completion falls on an
    /// earlier UTC day. Leaves streak counters alone. Returns rows changed.
    pub fn reset_daily_completions(&self) -> Result<usize> {
        let now = self.now();
        let reset = self.db.reset_stale_completions(now.date_naive(), now)?;
        tracing::info!(reset, "Reset daily completion flags for {}", now.date_naive());
        Ok(reset)
    }

    /// Retire every streak not completed today or yesterday (UTC).
    ///
    /// Habits are processed independently. A failure on one is recorded in
    /// the report and the scan continues with the rest.
    pub fn check_and_reset_broken_streaks(&self) -> Result<Outcome<ReconcileReport>> {
        let now = self.now();
        let today = now.date_naive();
        let habits = self.db.list_streaking_habits()?;

        let mut report = ReconcileReport {
            scanned: habits.len(),
            ..Default::default()
        };
        let mut effects = Vec::new();

        for habit in habits.iter().filter(|h| h.is_streak_broken(today)) {
            match self.retire_streak(habit, now) {
                Ok(Some(mut retired)) => {
                    report.affected += 1;
                    effects.append(&mut retired);
                }
                Ok(None) => {
                    tracing::debug!(habit_id = %habit.id, "Habit changed since scan; left as is");
                }
                Err(e) => {
                    tracing::error!(habit_id = %habit.id, "Failed to reset broken streak: {}", e);
                    report.failures.push(PartialReconciliationFailure {
                        habit_id: habit.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            scanned = report.scanned,
            affected = report.affected,
            failed = report.failures.len(),
            "Broken streak check finished"
        );
        Ok(Outcome::new(report, effects))
    }

    /// Zero the counter and log the run, then rescore. `None` if the habit
    /// changed since it was scanned.
    fn retire_streak(&self, habit: &Habit, now: DateTime<Utc>) -> Result<Option<Vec<Effect>>> {
        let streak_length = habit.current_streak;
        let last_completed = habit.last_completed_date.unwrap_or(now);

        let entry = self.plan_streak_history(habit.id, streak_length, last_completed)?;
        let Some(history) = self.db.retire_streak(habit, &entry, now)? else {
            return Ok(None);
        };
        log_history(&history);
        self.refresh_quality(habit.id);

        self.record(
            habit.id,
            &habit.user_id,
            AnalyticsPayload::StreakBroken {
                streak_length,
                last_completed_date: last_completed,
            },
        );

        let mut effects = Vec::with_capacity(2);
        if streak_length >= BROKEN_STREAK_NOTIFY_THRESHOLD {
            effects.push(Effect::notify(
                habit.id,
                &habit.user_id,
                NotificationKind::StreakBroken,
                json!({ "title": habit.title, "streak_length": streak_length }),
            ));
        }
        effects.push(self.invalidation(
            &habit.user_id,
            habit.id,
            "streak_broken",
            json!({ "streak_length": streak_length }),
        ));
        Ok(Some(effects))
    }
}
