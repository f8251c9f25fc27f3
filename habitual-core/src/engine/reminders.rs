use serde_json::json;

use super::HabitEngine;
use crate::effects::{Effect, NotificationKind, Outcome};
use crate::error::Result;
use crate::models::AnalyticsPayload;

impl HabitEngine {
    /// Request a reminder for every habit due today that is still open.
    /// Returns how many reminders were requested.
    pub fn send_due_reminders(&self) -> Result<Outcome<usize>> {
        let today = self.now().date_naive();
        let habits = self.db.list_due_uncompleted_habits(today)?;

        let mut effects = Vec::with_capacity(habits.len());
        for habit in &habits {
            self.record(habit.id, &habit.user_id, AnalyticsPayload::ReminderSent { day: today });
            effects.push(Effect::notify(
                habit.id,
                &habit.user_id,
                NotificationKind::Reminder,
                json!({ "title": habit.title, "current_streak": habit.current_streak }),
            ));
        }

        tracing::info!(count = habits.len(), "Requested reminders for {}", today);
        Ok(Outcome::new(habits.len(), effects))
    }
}
