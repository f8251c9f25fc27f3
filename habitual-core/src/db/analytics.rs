use rusqlite::{params, Row};
use uuid::Uuid;

use super::{get_ts, get_uuid, ts, Database};
use crate::error::Result;
use crate::models::{AnalyticsAction, HabitAnalyticsEvent};

fn event_from_row(row: &Row) -> rusqlite::Result<HabitAnalyticsEvent> {
    let action: String = row.get(3)?;
    let metadata: String = row.get(5)?;
    Ok(HabitAnalyticsEvent {
        id: get_uuid(row, 0)?,
        habit_id: get_uuid(row, 1)?,
        user_id: row.get(2)?,
        action: AnalyticsAction::from_str(&action).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, action.clone(), rusqlite::types::Type::Text)
        })?,
        timestamp: get_ts(row, 4)?,
        metadata: serde_json::from_str(&metadata).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

impl Database {
    pub fn insert_analytics_event(&self, event: &HabitAnalyticsEvent) -> Result<()> {
        let metadata = serde_json::to_string(&event.metadata)?;
        self.conn()?.execute(
            "INSERT INTO habit_analytics_events (id, habit_id, user_id, action, timestamp, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.id.to_string(),
                event.habit_id.to_string(),
                event.user_id,
                event.action.as_str(),
                ts(&event.timestamp),
                metadata,
            ],
        )?;
        Ok(())
    }

    pub fn list_analytics_events(&self, habit_id: Uuid) -> Result<Vec<HabitAnalyticsEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, user_id, action, timestamp, metadata
             FROM habit_analytics_events WHERE habit_id = ?1 ORDER BY timestamp, rowid",
        )?;
        let events = stmt
            .query_map([habit_id.to_string()], event_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }
}
