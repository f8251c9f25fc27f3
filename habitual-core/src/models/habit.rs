use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HabitError, Result};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Streak lengths that trigger a milestone notification.
pub const STREAK_MILESTONES: [i64; 10] = [3, 7, 14, 21, 30, 60, 90, 100, 180, 365];

pub fn is_milestone(streak: i64) -> bool {
    STREAK_MILESTONES.contains(&streak)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_day: NaiveDate,
    pub end_day: Option<NaiveDate>,
    pub current_streak: i64,
    pub longest_streak: i64,
    /// Completed for the current UTC day.
    pub is_completed: bool,
    pub last_completed_date: Option<DateTime<Utc>>,
    pub streak_start_date: Option<DateTime<Utc>>,
    pub streak_quality: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// A habit is due only inside its `[start_day, end_day]` window.
    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.start_day <= day && self.end_day.map_or(true, |end| day <= end)
    }

    /// Broken means the last completion was neither today nor yesterday (UTC).
    pub fn is_streak_broken(&self, today: NaiveDate) -> bool {
        match self.last_completed_date {
            None => true,
            Some(last) => last.date_naive() < today - chrono::Duration::days(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHabitInput {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to the current UTC day.
    pub start_day: Option<NaiveDate>,
    pub end_day: Option<NaiveDate>,
}

impl CreateHabitInput {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(HabitError::invalid("user_id must not be empty"));
        }
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;
        if let (Some(start), Some(end)) = (self.start_day, self.end_day) {
            validate_window(start, Some(end))?;
        }
        Ok(())
    }
}

/// Partial update. Absent fields keep their stored value; the `clear_*`
/// flags null out the optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHabitInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_day: Option<NaiveDate>,
    pub end_day: Option<NaiveDate>,
    #[serde(default)]
    pub clear_description: bool,
    #[serde(default)]
    pub clear_end_day: bool,
}

impl UpdateHabitInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_day.is_none()
            && self.end_day.is_none()
            && !self.clear_description
            && !self.clear_end_day
    }

    /// Names of the fields this update touches, for the audit trail.
    pub fn changed_fields(&self) -> Vec<String> {
        [
            ("title", self.title.is_some()),
            ("description", self.description.is_some() || self.clear_description),
            ("start_day", self.start_day.is_some()),
            ("end_day", self.end_day.is_some() || self.clear_end_day),
        ]
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| name.to_string())
        .collect()
    }

    /// Validate the update against the habit it will be applied to.
    pub fn validate_against(&self, habit: &Habit) -> Result<()> {
        if self.clear_description && self.description.is_some() {
            return Err(HabitError::invalid("description given together with clear_description"));
        }
        if self.clear_end_day && self.end_day.is_some() {
            return Err(HabitError::invalid("end_day given together with clear_end_day"));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_description(self.description.as_deref())?;
        let end_day = if self.clear_end_day {
            None
        } else {
            self.end_day.or(habit.end_day)
        };
        validate_window(self.start_day.unwrap_or(habit.start_day), end_day)
    }
}

fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(HabitError::invalid("title must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(HabitError::invalid(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(HabitError::invalid(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        ))),
        _ => Ok(()),
    }
}

fn validate_window(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(HabitError::invalid(format!(
            "end_day {} precedes start_day {}",
            end, start
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total: i64,
    /// Habits not yet completed today.
    pub active: i64,
    pub completed: i64,
    pub max_current_streak: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakStats {
    pub habit_id: Uuid,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub streak_quality: f64,
    /// Number of retired streak runs.
    pub runs: usize,
    pub total_completed_days: i64,
    /// Consistency over the summed run spans rather than their union.
    pub bulk_quality: f64,
}
