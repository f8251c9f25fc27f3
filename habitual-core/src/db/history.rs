use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{day, get_ts, get_uuid, ts, Database};
use crate::error::Result;
use crate::models::{NewStreakHistory, StreakHistory};

const HISTORY_COLUMNS: &str =
    "id, habit_id, start_date, end_date, streak_length, completed_days, created_at";

fn history_from_row(row: &Row) -> rusqlite::Result<StreakHistory> {
    Ok(StreakHistory {
        id: get_uuid(row, 0)?,
        habit_id: get_uuid(row, 1)?,
        start_date: get_ts(row, 2)?,
        end_date: get_ts(row, 3)?,
        streak_length: row.get(4)?,
        completed_days: row.get(5)?,
        created_at: get_ts(row, 6)?,
    })
}

pub(super) fn insert_history_row(conn: &Connection, history: &StreakHistory) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO streak_history ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            HISTORY_COLUMNS
        ),
        params![
            history.id.to_string(),
            history.habit_id.to_string(),
            ts(&history.start_date),
            ts(&history.end_date),
            history.streak_length,
            history.completed_days,
            ts(&history.created_at),
        ],
    )?;
    Ok(())
}

impl Database {
    pub fn insert_streak_history(
        &self,
        entry: &NewStreakHistory,
        now: DateTime<Utc>,
    ) -> Result<StreakHistory> {
        let history = entry.to_history(now);
        insert_history_row(&*self.conn()?, &history)?;
        Ok(history)
    }

    pub fn list_streak_history(&self, habit_id: Uuid) -> Result<Vec<StreakHistory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM streak_history WHERE habit_id = ?1 ORDER BY start_date, rowid",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt
            .query_map([habit_id.to_string()], history_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// History rows whose UTC day range intersects `[start, end]`, earliest first.
    pub fn find_overlapping_history(
        &self,
        habit_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StreakHistory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM streak_history
             WHERE habit_id = ?1 AND date(start_date) <= ?3 AND date(end_date) >= ?2
             ORDER BY start_date, rowid",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt
            .query_map(
                params![habit_id.to_string(), day(start), day(end)],
                history_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
