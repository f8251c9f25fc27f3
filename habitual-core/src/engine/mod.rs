//! The habit streak engine.
//!
//! [`HabitEngine`] owns the state transitions: habit CRUD, mark/unmark,
//! streak retirement into history, quality scoring, the daily reconciliation
//! jobs and the read-side aggregates. Storage goes through [`Database`], time
//! through the injected [`Clock`]. Notifications and cache invalidations are
//! returned as effects, never performed here.

mod aggregate;
mod catalog;
mod completion;
mod history;
mod quality;
mod reconcile;
mod reminders;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Database;
use crate::effects::Effect;
use crate::models::{AnalyticsPayload, HabitAnalyticsEvent};

pub use history::adjusted_completed_days;
pub use quality::{bulk_quality, union_quality};
pub use reconcile::{PartialReconciliationFailure, ReconcileReport};

#[derive(Clone)]
pub struct HabitEngine {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl HabitEngine {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Append to the analytics trail. Failures are logged, never returned.
    fn record(&self, habit_id: Uuid, user_id: &str, payload: AnalyticsPayload) {
        let event = HabitAnalyticsEvent::new(habit_id, user_id, self.now(), payload);
        if let Err(e) = self.db.insert_analytics_event(&event) {
            tracing::warn!(
                %habit_id,
                "Failed to record {} analytics event: {}",
                event.action.as_str(),
                e
            );
        }
    }

    fn invalidation(
        &self,
        user_id: &str,
        habit_id: Uuid,
        action: &str,
        details: serde_json::Value,
    ) -> Effect {
        Effect::invalidate(user_id, habit_id, action, self.now(), details)
    }
}
