use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A retired streak run. Rows are never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakHistory {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Value the streak counter had reached when it broke.
    pub streak_length: i64,
    /// Days attributed to this run after overlap adjustment.
    pub completed_days: i64,
    pub created_at: DateTime<Utc>,
}

impl StreakHistory {
    pub fn start_day(&self) -> NaiveDate {
        self.start_date.date_naive()
    }

    pub fn end_day(&self) -> NaiveDate {
        self.end_date.date_naive()
    }

    /// Inclusive number of UTC calendar days covered by the run.
    pub fn span_days(&self) -> i64 {
        (self.end_day() - self.start_day()).num_days() + 1
    }

    pub fn intersects(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_day() <= end && self.end_day() >= start
    }
}

#[derive(Debug, Clone)]
pub struct NewStreakHistory {
    pub habit_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub streak_length: i64,
    pub completed_days: i64,
}

impl NewStreakHistory {
    pub fn to_history(&self, created_at: DateTime<Utc>) -> StreakHistory {
        StreakHistory {
            id: Uuid::new_v4(),
            habit_id: self.habit_id,
            start_date: self.start_date,
            end_date: self.end_date,
            streak_length: self.streak_length,
            completed_days: self.completed_days,
            created_at,
        }
    }
}
