use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per mark-completed call. Repeated marks on a day are not merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitCompletionLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// ISO day (`YYYY-MM-DD`) to number of completions on that day.
pub type Heatmap = BTreeMap<String, i64>;
