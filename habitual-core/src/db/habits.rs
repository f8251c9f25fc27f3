use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::history::insert_history_row;
use super::{day, get_day, get_opt_day, get_opt_ts, get_ts, get_uuid, ts, Database};
use crate::error::Result;
use crate::models::{DashboardMetrics, Habit, NewStreakHistory, StreakHistory, UpdateHabitInput};

const HABIT_COLUMNS: &str = "id, user_id, title, description, start_day, end_day, \
    current_streak, longest_streak, is_completed, last_completed_date, streak_start_date, \
    streak_quality, created_at, updated_at";

fn habit_from_row(row: &Row) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: get_uuid(row, 0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        start_day: get_day(row, 4)?,
        end_day: get_opt_day(row, 5)?,
        current_streak: row.get(6)?,
        longest_streak: row.get(7)?,
        is_completed: row.get(8)?,
        last_completed_date: get_opt_ts(row, 9)?,
        streak_start_date: get_opt_ts(row, 10)?,
        streak_quality: row.get(11)?,
        created_at: get_ts(row, 12)?,
        updated_at: get_ts(row, 13)?,
    })
}

impl Database {
    pub fn insert_habit(&self, habit: &Habit) -> Result<()> {
        self.conn()?.execute(
            &format!(
                "INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                HABIT_COLUMNS
            ),
            params![
                habit.id.to_string(),
                habit.user_id,
                habit.title,
                habit.description,
                day(habit.start_day),
                habit.end_day.map(day),
                habit.current_streak,
                habit.longest_streak,
                habit.is_completed,
                habit.last_completed_date.as_ref().map(ts),
                habit.streak_start_date.as_ref().map(ts),
                habit.streak_quality,
                ts(&habit.created_at),
                ts(&habit.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_habit(&self, id: Uuid) -> Result<Option<Habit>> {
        let habit = self
            .conn()?
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                [id.to_string()],
                habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    pub fn list_habits_for_user(&self, user_id: &str) -> Result<Vec<Habit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habits WHERE user_id = ?1 ORDER BY created_at, id",
            HABIT_COLUMNS
        ))?;
        let habits = stmt
            .query_map([user_id], habit_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    /// Every habit, across all users, whose streak counter is positive.
    pub fn list_streaking_habits(&self) -> Result<Vec<Habit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habits WHERE current_streak > 0 ORDER BY created_at, id",
            HABIT_COLUMNS
        ))?;
        let habits = stmt
            .query_map([], habit_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    /// Habits due on `today` that have not been completed yet.
    pub fn list_due_uncompleted_habits(&self, today: NaiveDate) -> Result<Vec<Habit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habits
             WHERE is_completed = 0
               AND start_day <= ?1
               AND (end_day IS NULL OR end_day >= ?1)
             ORDER BY created_at, id",
            HABIT_COLUMNS
        ))?;
        let habits = stmt
            .query_map([day(today)], habit_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    pub fn update_habit_details(
        &self,
        id: Uuid,
        input: &UpdateHabitInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Habit>> {
        let habit = self
            .conn()?
            .query_row(
                &format!(
                    "UPDATE habits SET
                        title = COALESCE(?2, title),
                        description = CASE WHEN ?7 THEN NULL ELSE COALESCE(?3, description) END,
                        start_day = COALESCE(?4, start_day),
                        end_day = CASE WHEN ?8 THEN NULL ELSE COALESCE(?5, end_day) END,
                        updated_at = ?6
                     WHERE id = ?1
                     RETURNING {}",
                    HABIT_COLUMNS
                ),
                params![
                    id.to_string(),
                    input.title.as_deref().map(str::trim),
                    input.description,
                    input.start_day.map(day),
                    input.end_day.map(day),
                    ts(&now),
                    input.clear_description,
                    input.clear_end_day,
                ],
                habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    /// Hard delete. Logs and history go with it through the foreign keys.
    pub fn delete_habit(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn()?
            .execute("DELETE FROM habits WHERE id = ?1", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Atomically bump the streak counter and mark the habit completed.
    ///
    /// Every right-hand side reads the pre-update row, so `longest_streak`
    /// is compared against the incremented value within the same statement.
    pub fn increment_streak(
        &self,
        id: Uuid,
        user_id: &str,
        completed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<Habit>> {
        let habit = self
            .conn()?
            .query_row(
                &format!(
                    "UPDATE habits SET
                        current_streak = current_streak + 1,
                        longest_streak = MAX(longest_streak, current_streak + 1),
                        is_completed = 1,
                        last_completed_date = ?3,
                        streak_start_date = COALESCE(streak_start_date, ?3),
                        updated_at = ?4
                     WHERE id = ?1 AND user_id = ?2
                     RETURNING {}",
                    HABIT_COLUMNS
                ),
                params![id.to_string(), user_id, ts(&completed_at), ts(&now)],
                habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    /// Atomically decrement the streak counter. There is no floor at zero.
    /// A counter that falls to zero or below drops its streak start.
    pub fn decrement_streak(
        &self,
        id: Uuid,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Habit>> {
        let habit = self
            .conn()?
            .query_row(
                &format!(
                    "UPDATE habits SET
                        current_streak = current_streak - 1,
                        is_completed = 0,
                        streak_start_date = CASE WHEN current_streak - 1 <= 0
                            THEN NULL ELSE streak_start_date END,
                        updated_at = ?3
                     WHERE id = ?1 AND user_id = ?2
                     RETURNING {}",
                    HABIT_COLUMNS
                ),
                params![id.to_string(), user_id, ts(&now)],
                habit_from_row,
            )
            .optional()?;
        Ok(habit)
    }

    pub fn set_streak_quality(&self, id: Uuid, quality: f64, now: DateTime<Utc>) -> Result<bool> {
        let rows = self.conn()?.execute(
            "UPDATE habits SET streak_quality = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), quality, ts(&now)],
        )?;
        Ok(rows > 0)
    }

    /// Clear the completed flag on habits last completed before `today`.
    pub fn reset_stale_completions(&self, today: NaiveDate, now: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn()?.execute(
            "UPDATE habits SET is_completed = 0, updated_at = ?2
             WHERE is_completed = 1
               AND last_completed_date IS NOT NULL
               AND date(last_completed_date) < ?1",
            params![day(today), ts(&now)],
        )?;
        Ok(rows)
    }

    /// Zero the streak counter of `seen` and file `entry` in its history, as
    /// one transaction.
    ///
    /// The reset only applies while the row still holds the counter and last
    /// completion read in `seen`. If a mark or another reconciler got there
    /// first nothing is written and `None` comes back.
    pub fn retire_streak(
        &self,
        seen: &Habit,
        entry: &NewStreakHistory,
        now: DateTime<Utc>,
    ) -> Result<Option<StreakHistory>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "UPDATE habits SET current_streak = 0, streak_start_date = NULL, updated_at = ?4
             WHERE id = ?1 AND current_streak = ?2 AND last_completed_date IS ?3",
            params![
                seen.id.to_string(),
                seen.current_streak,
                seen.last_completed_date.as_ref().map(ts),
                ts(&now),
            ],
        )?;
        if rows == 0 {
            return Ok(None);
        }

        let history = entry.to_history(now);
        insert_history_row(&tx, &history)?;
        tx.commit()?;
        Ok(Some(history))
    }

    pub fn dashboard_metrics(&self, user_id: &str) -> Result<DashboardMetrics> {
        let metrics = self.conn()?.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN is_completed = 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN is_completed = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(MAX(current_streak), 0)
             FROM habits WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(DashboardMetrics {
                    total: row.get(0)?,
                    active: row.get(1)?,
                    completed: row.get(2)?,
                    max_current_streak: row.get(3)?,
                })
            },
        )?;
        Ok(metrics)
    }
}
