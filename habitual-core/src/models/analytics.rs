use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsAction {
    Created,
    Updated,
    Deleted,
    Completed,
    Uncompleted,
    StreakStarted,
    StreakBroken,
    StreakMilestone,
    ReminderSent,
    View,
}

impl AnalyticsAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Completed => "completed",
            Self::Uncompleted => "uncompleted",
            Self::StreakStarted => "streak_started",
            Self::StreakBroken => "streak_broken",
            Self::StreakMilestone => "streak_milestone",
            Self::ReminderSent => "reminder_sent",
            Self::View => "view",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "deleted" => Some(Self::Deleted),
            "completed" => Some(Self::Completed),
            "uncompleted" => Some(Self::Uncompleted),
            "streak_started" => Some(Self::StreakStarted),
            "streak_broken" => Some(Self::StreakBroken),
            "streak_milestone" => Some(Self::StreakMilestone),
            "reminder_sent" => Some(Self::ReminderSent),
            "view" => Some(Self::View),
            _ => None,
        }
    }
}

/// Known metadata shapes, one per action kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticsPayload {
    Created {
        title: String,
    },
    Updated {
        fields: Vec<String>,
    },
    Deleted {
        title: String,
    },
    Completed {
        current_streak: i64,
        completion_date: DateTime<Utc>,
    },
    Uncompleted {
        current_streak: i64,
    },
    StreakStarted {
        start_date: DateTime<Utc>,
    },
    StreakBroken {
        streak_length: i64,
        last_completed_date: DateTime<Utc>,
    },
    StreakMilestone {
        milestone: i64,
    },
    ReminderSent {
        day: NaiveDate,
    },
    View,
}

impl AnalyticsPayload {
    pub fn action(&self) -> AnalyticsAction {
        match self {
            Self::Created { .. } => AnalyticsAction::Created,
            Self::Updated { .. } => AnalyticsAction::Updated,
            Self::Deleted { .. } => AnalyticsAction::Deleted,
            Self::Completed { .. } => AnalyticsAction::Completed,
            Self::Uncompleted { .. } => AnalyticsAction::Uncompleted,
            Self::StreakStarted { .. } => AnalyticsAction::StreakStarted,
            Self::StreakBroken { .. } => AnalyticsAction::StreakBroken,
            Self::StreakMilestone { .. } => AnalyticsAction::StreakMilestone,
            Self::ReminderSent { .. } => AnalyticsAction::ReminderSent,
            Self::View => AnalyticsAction::View,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitAnalyticsEvent {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: String,
    pub action: AnalyticsAction,
    pub timestamp: DateTime<Utc>,
    pub metadata: AnalyticsPayload,
}

impl HabitAnalyticsEvent {
    /// The action is derived from the payload so the two cannot disagree.
    pub fn new(
        habit_id: Uuid,
        user_id: &str,
        timestamp: DateTime<Utc>,
        metadata: AnalyticsPayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id,
            user_id: user_id.to_string(),
            action: metadata.action(),
            timestamp,
            metadata,
        }
    }
}
