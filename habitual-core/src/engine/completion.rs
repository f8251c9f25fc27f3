use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use super::HabitEngine;
use crate::effects::{Effect, NotificationKind, Outcome};
use crate::error::{HabitError, Result};
use crate::models::{is_milestone, AnalyticsPayload, Habit, HabitCompletionLog};

impl HabitEngine {
    /// Mark a habit completed for the day of `completion_date` (default: now).
    ///
    /// Each call increments the streak again. Callers must not mark the same
    /// day twice without an unmark in between.
    pub fn mark_completed(
        &self,
        habit_id: Uuid,
        user_id: &str,
        completion_date: Option<DateTime<Utc>>,
    ) -> Result<Outcome<Habit>> {
        let now = self.now();
        let completed_at = completion_date.unwrap_or(now);

        let mut habit = self
            .db
            .increment_streak(habit_id, user_id, completed_at, now)?
            .ok_or(HabitError::NotFound(habit_id))?;

        self.db.insert_completion(&HabitCompletionLog {
            id: Uuid::new_v4(),
            habit_id,
            user_id: user_id.to_string(),
            date: completed_at,
            created_at: now,
        })?;

        if let Some(quality) = self.refresh_quality(habit_id) {
            habit.streak_quality = quality;
        }

        let streak = habit.current_streak;
        self.record(
            habit_id,
            user_id,
            AnalyticsPayload::Completed {
                current_streak: streak,
                completion_date: completed_at,
            },
        );
        if streak == 1 {
            self.record(
                habit_id,
                user_id,
                AnalyticsPayload::StreakStarted {
                    start_date: completed_at,
                },
            );
        }

        let mut effects = Vec::with_capacity(3);
        if is_milestone(streak) {
            self.record(
                habit_id,
                user_id,
                AnalyticsPayload::StreakMilestone { milestone: streak },
            );
            effects.push(Effect::notify(
                habit_id,
                user_id,
                NotificationKind::StreakMilestone,
                json!({ "title": habit.title, "milestone": streak }),
            ));
        }
        effects.push(Effect::notify(
            habit_id,
            user_id,
            NotificationKind::Completed,
            json!({ "title": habit.title, "current_streak": streak }),
        ));
        effects.push(self.invalidation(
            user_id,
            habit_id,
            "completed",
            json!({ "current_streak": streak, "date": completed_at.date_naive() }),
        ));

        tracing::info!(%habit_id, streak, longest = habit.longest_streak, "Habit marked completed");
        Ok(Outcome::new(habit, effects))
    }

    /// Undo the most recent completion: decrement the streak, clear the
    /// completed flag and drop one log row for `last_completed_date`'s day.
    pub fn unmark_completed(&self, habit_id: Uuid, user_id: &str) -> Result<Outcome<Habit>> {
        let now = self.now();

        let mut habit = self
            .db
            .decrement_streak(habit_id, user_id, now)?
            .ok_or(HabitError::NotFound(habit_id))?;

        if let Some(last) = habit.last_completed_date {
            let removed = self
                .db
                .remove_completion_on_day(habit_id, user_id, last.date_naive())?;
            if !removed {
                tracing::debug!(%habit_id, "No completion log row for {}", last.date_naive());
            }
        }

        if let Some(quality) = self.refresh_quality(habit_id) {
            habit.streak_quality = quality;
        }

        let streak = habit.current_streak;
        self.record(
            habit_id,
            user_id,
            AnalyticsPayload::Uncompleted {
                current_streak: streak,
            },
        );
        if streak < 0 {
            tracing::warn!(%habit_id, streak, "Streak counter went negative after unmark");
        }

        let effects = vec![self.invalidation(
            user_id,
            habit_id,
            "uncompleted",
            json!({ "current_streak": streak }),
        )];

        tracing::info!(%habit_id, streak, "Habit unmarked");
        Ok(Outcome::new(habit, effects))
    }
}
