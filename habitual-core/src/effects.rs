//! Outbound side effects.
//!
//! Engine operations do not talk to the notification or cache-invalidation
//! collaborators directly. They return an [`Outcome`] carrying the primary
//! result plus an ordered list of [`Effect`]s, and the caller hands those to
//! an [`EffectSink`]. Sink failures are logged and never reach the caller.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Completed,
    StreakMilestone,
    StreakBroken,
    Reminder,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::StreakMilestone => "streak_milestone",
            Self::StreakBroken => "streak_broken",
            Self::Reminder => "reminder",
        }
    }
}

/// Fire-and-forget request for the delivery subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub habit_id: Uuid,
    pub user_id: String,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
}

/// Signal for downstream dashboard caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheInvalidation {
    pub user_id: String,
    pub entity_id: Uuid,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Notify(NotificationRequest),
    InvalidateCache(CacheInvalidation),
}

impl Effect {
    pub fn notify(
        habit_id: Uuid,
        user_id: &str,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Self {
        Self::Notify(NotificationRequest {
            habit_id,
            user_id: user_id.to_string(),
            kind,
            payload,
        })
    }

    pub fn invalidate(
        user_id: &str,
        entity_id: Uuid,
        action: &str,
        timestamp: DateTime<Utc>,
        details: serde_json::Value,
    ) -> Self {
        Self::InvalidateCache(CacheInvalidation {
            user_id: user_id.to_string(),
            entity_id,
            action: action.to_string(),
            timestamp,
            details,
        })
    }

    pub fn notification_kind(&self) -> Option<NotificationKind> {
        match self {
            Self::Notify(req) => Some(req.kind),
            Self::InvalidateCache(_) => None,
        }
    }
}

/// Executes effects against the outside world.
pub trait EffectSink: Send + Sync {
    fn notify(&self, request: &NotificationRequest) -> anyhow::Result<()>;

    fn invalidate(&self, event: &CacheInvalidation) -> anyhow::Result<()>;
}

/// Execute effects in order. Failures are logged and skipped.
pub fn dispatch(sink: &dyn EffectSink, effects: &[Effect]) {
    for effect in effects {
        let result = match effect {
            Effect::Notify(req) => sink.notify(req),
            Effect::InvalidateCache(event) => sink.invalidate(event),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to dispatch effect {:?}: {:#}", effect, e);
        }
    }
}

/// Primary result of an engine operation plus the effects it produced.
#[derive(Debug, Clone)]
#[must_use = "effects are lost unless the outcome is dispatched"]
pub struct Outcome<T> {
    pub value: T,
    pub effects: Vec<Effect>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, effects: Vec<Effect>) -> Self {
        Self { value, effects }
    }

    pub fn pure(value: T) -> Self {
        Self {
            value,
            effects: Vec::new(),
        }
    }

    /// Hand the effects to `sink` and return the primary value.
    pub fn dispatch(self, sink: &dyn EffectSink) -> T {
        dispatch(sink, &self.effects);
        self.value
    }
}

/// Default sink: records the effect in the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EffectSink for TracingSink {
    fn notify(&self, request: &NotificationRequest) -> anyhow::Result<()> {
        tracing::info!(
            habit_id = %request.habit_id,
            user_id = %request.user_id,
            kind = request.kind.as_str(),
            "notification requested"
        );
        Ok(())
    }

    fn invalidate(&self, event: &CacheInvalidation) -> anyhow::Result<()> {
        tracing::debug!(
            user_id = %event.user_id,
            entity_id = %event.entity_id,
            action = %event.action,
            "cache invalidated"
        );
        Ok(())
    }
}

/// Keeps every dispatched effect in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    effects: Mutex<Vec<Effect>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn notifications(&self) -> Vec<NotificationRequest> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Notify(req) => Some(req),
                Effect::InvalidateCache(_) => None,
            })
            .collect()
    }

    fn push(&self, effect: Effect) {
        self.effects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(effect);
    }
}

impl EffectSink for RecordingSink {
    fn notify(&self, request: &NotificationRequest) -> anyhow::Result<()> {
        self.push(Effect::Notify(request.clone()));
        Ok(())
    }

    fn invalidate(&self, event: &CacheInvalidation) -> anyhow::Result<()> {
        self.push(Effect::InvalidateCache(event.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl EffectSink for FailingSink {
        fn notify(&self, _: &NotificationRequest) -> anyhow::Result<()> {
            anyhow::bail!("delivery offline")
        }

        fn invalidate(&self, _: &CacheInvalidation) -> anyhow::Result<()> {
            anyhow::bail!("bus offline")
        }
    }

    fn sample() -> Vec<Effect> {
        let id = Uuid::new_v4();
        vec![
            Effect::notify(id, "u1", NotificationKind::Completed, serde_json::json!({})),
            Effect::invalidate("u1", id, "completed", Utc::now(), serde_json::json!({})),
        ]
    }

    #[test]
    fn failing_sink_does_not_lose_the_value() {
        let outcome = Outcome::new(42, sample());
        assert_eq!(outcome.dispatch(&FailingSink), 42);
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        Outcome::new((), sample()).dispatch(&sink);
        let effects = sink.effects();
        assert_eq!(effects.len(), 2);
        assert_eq!(
            effects[0].notification_kind(),
            Some(NotificationKind::Completed)
        );
        assert!(matches!(effects[1], Effect::InvalidateCache(_)));
    }
}
