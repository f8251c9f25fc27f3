use serde_json::json;
use uuid::Uuid;

use super::HabitEngine;
use crate::effects::Outcome;
use crate::error::{HabitError, Result};
use crate::models::{AnalyticsPayload, CreateHabitInput, Habit, UpdateHabitInput};

impl HabitEngine {
    pub fn create_habit(&self, input: CreateHabitInput) -> Result<Outcome<Habit>> {
        input.validate()?;

        let now = self.now();
        let habit = Habit {
            id: Uuid::new_v4(),
            user_id: input.user_id.trim().to_string(),
            title: input.title.trim().to_string(),
            description: input.description,
            start_day: input.start_day.unwrap_or_else(|| now.date_naive()),
            end_day: input.end_day,
            current_streak: 0,
            longest_streak: 0,
            is_completed: false,
            last_completed_date: None,
            streak_start_date: None,
            streak_quality: 0.0,
            created_at: now,
            updated_at: now,
        };
        if let Some(end) = habit.end_day {
            if end < habit.start_day {
                return Err(HabitError::invalid(format!(
                    "end_day {} precedes start_day {}",
                    end, habit.start_day
                )));
            }
        }

        self.db.insert_habit(&habit)?;
        self.record(
            habit.id,
            &habit.user_id,
            AnalyticsPayload::Created {
                title: habit.title.clone(),
            },
        );
        tracing::info!(habit_id = %habit.id, user_id = %habit.user_id, "Created habit");

        let effects = vec![self.invalidation(
            &habit.user_id,
            habit.id,
            "created",
            json!({ "title": habit.title }),
        )];
        Ok(Outcome::new(habit, effects))
    }

    pub fn get_habit(&self, habit_id: Uuid) -> Result<Habit> {
        self.db
            .get_habit(habit_id)?
            .ok_or(HabitError::NotFound(habit_id))
    }

    /// Fetch a habit on behalf of a user-facing read, leaving a `view` event.
    pub fn view_habit(&self, habit_id: Uuid) -> Result<Habit> {
        let habit = self.get_habit(habit_id)?;
        self.record(habit.id, &habit.user_id, AnalyticsPayload::View);
        Ok(habit)
    }

    pub fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>> {
        self.db.list_habits_for_user(user_id)
    }

    pub fn update_habit(&self, habit_id: Uuid, input: UpdateHabitInput) -> Result<Outcome<Habit>> {
        if input.is_empty() {
            return Err(HabitError::invalid("update contains no fields"));
        }
        let existing = self.get_habit(habit_id)?;
        input.validate_against(&existing)?;

        let habit = self
            .db
            .update_habit_details(habit_id, &input, self.now())?
            .ok_or(HabitError::NotFound(habit_id))?;

        let fields = input.changed_fields();
        self.record(
            habit_id,
            &habit.user_id,
            AnalyticsPayload::Updated {
                fields: fields.clone(),
            },
        );
        tracing::info!(%habit_id, ?fields, "Updated habit");

        let effects = vec![self.invalidation(
            &habit.user_id,
            habit_id,
            "updated",
            json!({ "fields": fields }),
        )];
        Ok(Outcome::new(habit, effects))
    }

    /// Hard delete. Completion logs and streak history cascade with the row.
    pub fn delete_habit(&self, habit_id: Uuid) -> Result<Outcome<()>> {
        let habit = self.get_habit(habit_id)?;
        if !self.db.delete_habit(habit_id)? {
            return Err(HabitError::NotFound(habit_id));
        }

        self.record(
            habit_id,
            &habit.user_id,
            AnalyticsPayload::Deleted {
                title: habit.title.clone(),
            },
        );
        tracing::info!(%habit_id, "Deleted habit");

        let effects = vec![self.invalidation(
            &habit.user_id,
            habit_id,
            "deleted",
            json!({ "title": habit.title }),
        )];
        Ok(Outcome::new((), effects))
    }
}
