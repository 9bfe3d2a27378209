//! Schedule change events and the bus that distributes them.
//!
//! Events are invalidation signals only: they say which family changed and,
//! when it is known, which week. Consumers re-read the schedule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::calendar;

/// Every event the schedule layer publishes. The `event` tag carries the
/// wire name (`task-assigned`, `week-schedule-updated`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ScheduleEvent {
    /// A task was assigned to a member on a date
    #[serde(rename_all = "camelCase")]
    TaskAssigned {
        family_id: Uuid,
        #[serde(default)]
        date: Option<NaiveDate>,
    },

    #[serde(rename_all = "camelCase")]
    TaskUnassigned {
        family_id: Uuid,
        #[serde(default)]
        date: Option<NaiveDate>,
    },

    /// Task or template attributes changed; usually affects many weeks
    #[serde(rename_all = "camelCase")]
    TaskScheduleUpdated {
        family_id: Uuid,
        #[serde(default)]
        week_start: Option<NaiveDate>,
    },

    /// Overrides of a week were written. Without a week the scope is
    /// unknown and every cached week is dropped.
    #[serde(rename_all = "camelCase")]
    WeekScheduleUpdated {
        family_id: Uuid,
        #[serde(default)]
        week_start: Option<NaiveDate>,
    },

    /// A week's overrides were cleared
    #[serde(rename_all = "camelCase")]
    WeekScheduleReverted { family_id: Uuid, week_start: NaiveDate },
}

/// Which cached weeks an event affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    /// Exactly one week, keyed by its Monday
    Week(NaiveDate),
    /// Some unknown set of weeks: mark everything stale
    Ambiguous,
    /// Drop the whole cache
    Global,
}

impl ScheduleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleEvent::TaskAssigned { .. } => "task-assigned",
            ScheduleEvent::TaskUnassigned { .. } => "task-unassigned",
            ScheduleEvent::TaskScheduleUpdated { .. } => "task-schedule-updated",
            ScheduleEvent::WeekScheduleUpdated { .. } => "week-schedule-updated",
            ScheduleEvent::WeekScheduleReverted { .. } => "week-schedule-reverted",
        }
    }

    pub fn family_id(&self) -> Uuid {
        match self {
            ScheduleEvent::TaskAssigned { family_id, .. }
            | ScheduleEvent::TaskUnassigned { family_id, .. }
            | ScheduleEvent::TaskScheduleUpdated { family_id, .. }
            | ScheduleEvent::WeekScheduleUpdated { family_id, .. }
            | ScheduleEvent::WeekScheduleReverted { family_id, .. } => *family_id,
        }
    }

    pub fn scope(&self) -> EventScope {
        match self {
            ScheduleEvent::TaskAssigned { date, .. } | ScheduleEvent::TaskUnassigned { date, .. } => {
                date.map_or(EventScope::Ambiguous, |d| EventScope::Week(calendar::week_start_of(d)))
            }
            ScheduleEvent::TaskScheduleUpdated { week_start, .. } => week_start
                .map_or(EventScope::Ambiguous, |w| EventScope::Week(calendar::week_start_of(w))),
            ScheduleEvent::WeekScheduleUpdated { week_start, .. } => week_start
                .map_or(EventScope::Global, |w| EventScope::Week(calendar::week_start_of(w))),
            ScheduleEvent::WeekScheduleReverted { week_start, .. } => {
                EventScope::Week(calendar::week_start_of(*week_start))
            }
        }
    }
}

/// Fan-out of [`ScheduleEvent`]s over a tokio broadcast channel.
///
/// Publishing never blocks; a subscriber that falls more than `capacity`
/// events behind receives `RecvError::Lagged`.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ScheduleEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of subscribers reached, or the event back when
    /// nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: ScheduleEvent) -> Result<usize, broadcast::error::SendError<ScheduleEvent>> {
        self.tx.send(event)
    }

    /// Emits, ignoring the no-subscriber case.
    pub fn emit_lossy(&self, event: ScheduleEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 18).unwrap()
    }

    fn thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 21).unwrap()
    }

    #[rstest]
    #[case::assigned_on_date(ScheduleEvent::TaskAssigned { family_id: Uuid::nil(), date: Some(thursday()) }, EventScope::Week(monday()))]
    #[case::unassigned_no_date(ScheduleEvent::TaskUnassigned { family_id: Uuid::nil(), date: None }, EventScope::Ambiguous)]
    #[case::template_edit(ScheduleEvent::TaskScheduleUpdated { family_id: Uuid::nil(), week_start: None }, EventScope::Ambiguous)]
    #[case::week_update(ScheduleEvent::WeekScheduleUpdated { family_id: Uuid::nil(), week_start: Some(monday()) }, EventScope::Week(monday()))]
    #[case::global_update(ScheduleEvent::WeekScheduleUpdated { family_id: Uuid::nil(), week_start: None }, EventScope::Global)]
    #[case::revert(ScheduleEvent::WeekScheduleReverted { family_id: Uuid::nil(), week_start: monday() }, EventScope::Week(monday()))]
    fn test_event_scope(#[case] event: ScheduleEvent, #[case] expected: EventScope) {
        assert_eq!(event.scope(), expected);
    }

    #[test]
    fn test_wire_format_uses_contract_names() {
        let family_id = Uuid::now_v7();
        let event = ScheduleEvent::WeekScheduleUpdated {
            family_id,
            week_start: Some(monday()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "week-schedule-updated");
        assert_eq!(json["weekStart"], "2025-08-18");
        assert_eq!(json["event"], event.name());

        let parsed: ScheduleEvent =
            serde_json::from_str(&format!(r#"{{"event":"task-assigned","familyId":"{}"}}"#, family_id)).unwrap();
        assert_eq!(parsed, ScheduleEvent::TaskAssigned { family_id, date: None });
    }

    #[test]
    fn test_unknown_event_name_rejected() {
        let json = r#"{"event":"task-exploded","familyId":"00000000-0000-0000-0000-000000000000"}"#;
        assert!(serde_json::from_str::<ScheduleEvent>(json).is_err());
    }

    #[tokio::test]
    async fn test_bus_delivers_to_all_subscribers() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = ScheduleEvent::WeekScheduleReverted {
            family_id: Uuid::nil(),
            week_start: monday(),
        };
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);
        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(ScheduleEvent::TaskScheduleUpdated { family_id: Uuid::nil(), week_start: None }).is_err());
        bus.emit_lossy(ScheduleEvent::TaskScheduleUpdated { family_id: Uuid::nil(), week_start: None });
    }
}
