use chrono::NaiveDate;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{day, get_ts, get_uuid, ts, Database};
use crate::error::Result;
use crate::models::{HabitCompletionLog, Heatmap};

fn completion_from_row(row: &Row) -> rusqlite::Result<HabitCompletionLog> {
    Ok(HabitCompletionLog {
        id: get_uuid(row, 0)?,
        habit_id: get_uuid(row, 1)?,
        user_id: row.get(2)?,
        date: get_ts(row, 3)?,
        created_at: get_ts(row, 4)?,
    })
}

impl Database {
    pub fn insert_completion(&self, log: &HabitCompletionLog) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO habit_completion_logs (id, habit_id, user_id, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                log.id.to_string(),
                log.habit_id.to_string(),
                log.user_id,
                ts(&log.date),
                ts(&log.created_at),
            ],
        )?;
        Ok(())
    }

    /// Remove one completion row for the habit on the given UTC day, the most
    /// recently written one first. Returns whether a row was removed.
    pub fn remove_completion_on_day(
        &self,
        habit_id: Uuid,
        user_id: &str,
        on: NaiveDate,
    ) -> Result<bool> {
        let rows = self.conn()?.execute(
            "DELETE FROM habit_completion_logs WHERE id = (
                SELECT id FROM habit_completion_logs
                WHERE habit_id = ?1 AND user_id = ?2 AND date(date) = ?3
                ORDER BY created_at DESC, rowid DESC
                LIMIT 1
             )",
            params![habit_id.to_string(), user_id, day(on)],
        )?;
        Ok(rows > 0)
    }

    pub fn list_completions_for_habit(&self, habit_id: Uuid) -> Result<Vec<HabitCompletionLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, user_id, date, created_at FROM habit_completion_logs
             WHERE habit_id = ?1 ORDER BY date, rowid",
        )?;
        let logs = stmt
            .query_map([habit_id.to_string()], completion_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    /// Per-day completion counts for a user over `[start, end]`, across all
    /// of the user's habits.
    pub fn completion_counts_by_day(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Heatmap> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT date(date) AS day, COUNT(*) FROM habit_completion_logs
             WHERE user_id = ?1 AND date(date) BETWEEN ?2 AND ?3
             GROUP BY day
             ORDER BY day",
        )?;
        let counts = stmt
            .query_map(params![user_id, day(start), day(end)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Heatmap>>()?;
        Ok(counts)
    }
}
