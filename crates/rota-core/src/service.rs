//! Request/response boundary over the stores and the engine.
//!
//! Every read resolves from a fresh [`ScheduleSnapshot`]; the service keeps
//! no schedule state of its own. Writes validate, persist and then publish
//! a [`ScheduleEvent`] on the bus.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::info;
use uuid::Uuid;

use crate::calendar;
use crate::error::{CoreError, OverrideField, OverrideViolation};
use crate::events::{EventBus, ScheduleEvent};
use crate::fairness::{self, SplitOptions, TaskSplit};
use crate::models::{ApplyOverrideRequest, OverrideAction, ResolvedWeekSchedule};
use crate::repository::ScheduleStore;
use crate::resolution::{ResolutionEngine, ScheduleSnapshot};
use crate::shifts::{self, Shift, ShiftStatus};
use crate::sync::WeekFetcher;
use crate::validation;

pub struct ScheduleService<S> {
    store: Arc<S>,
    events: EventBus,
}

impl<S> Clone for ScheduleService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            events: self.events.clone(),
        }
    }
}

impl<S: ScheduleStore> ScheduleService<S> {
    pub fn new(store: S, events: EventBus) -> Self {
        Self::from_shared(Arc::new(store), events)
    }

    pub fn from_shared(store: Arc<S>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn load_snapshot(&self, family_id: Uuid, weeks: &[NaiveDate]) -> Result<ScheduleSnapshot, CoreError> {
        ScheduleSnapshot::load(self.store.as_ref(), family_id, weeks).await
    }

    /// Resolved schedule of the week starting at `week_start` (a Monday).
    pub async fn schedule(&self, family_id: Uuid, week_start: NaiveDate) -> Result<ResolvedWeekSchedule, CoreError> {
        calendar::validate_week_start(week_start)?;
        let snapshot = self.load_snapshot(family_id, &[week_start]).await?;
        Ok(ResolutionEngine::new(&snapshot).resolve(week_start))
    }

    /// The only write path into the override store. The batch is validated
    /// as a whole before anything is written; the re-resolved week is
    /// returned.
    pub async fn apply_override(
        &self,
        family_id: Uuid,
        request: ApplyOverrideRequest,
    ) -> Result<ResolvedWeekSchedule, CoreError> {
        let week_start = request.week_start_date;
        if !calendar::is_week_start(week_start) {
            return Err(CoreError::InvalidOverride(OverrideViolation::request(
                OverrideField::WeekStartDate,
                format!("{} is not a Monday", week_start),
            )));
        }

        let snapshot = self.load_snapshot(family_id, &[]).await?;
        validation::validate_override_batch(
            week_start,
            &request.task_overrides,
            request.replace_existing,
            &snapshot.tasks,
            &snapshot.members,
        )
        .map_err(CoreError::InvalidOverride)?;

        let saved = self
            .store
            .save_task_overrides(family_id, week_start, &request.task_overrides, request.replace_existing)
            .await?;
        info!(
            %family_id,
            %week_start,
            added = request.task_overrides.len(),
            stored = saved.task_overrides.len(),
            replace_existing = request.replace_existing,
            "applied week overrides"
        );

        for task_override in &request.task_overrides {
            let date = Some(task_override.assigned_date);
            match task_override.action {
                OverrideAction::Add | OverrideAction::Reassign if task_override.new_member_id.is_some() => {
                    self.events.emit_lossy(ScheduleEvent::TaskAssigned { family_id, date });
                }
                OverrideAction::Add | OverrideAction::Reassign => {}
                OverrideAction::Remove => {
                    self.events.emit_lossy(ScheduleEvent::TaskUnassigned { family_id, date });
                }
            }
        }
        self.events.emit_lossy(ScheduleEvent::WeekScheduleUpdated {
            family_id,
            week_start: Some(week_start),
        });

        self.schedule(family_id, week_start).await
    }

    /// Drops a week's overrides, returning the week to its template.
    /// Returns whether anything was stored.
    pub async fn revert_week(&self, family_id: Uuid, week_start: NaiveDate) -> Result<bool, CoreError> {
        calendar::validate_week_start(week_start)?;
        let cleared = self.store.clear_week_override(family_id, week_start).await?;
        if cleared {
            info!(%family_id, %week_start, "reverted week overrides");
            self.events
                .emit_lossy(ScheduleEvent::WeekScheduleReverted { family_id, week_start });
        }
        Ok(cleared)
    }

    /// Fairness over the `options.window_weeks` weeks ending with the week
    /// of `anchor`.
    pub async fn task_split(&self, family_id: Uuid, anchor: NaiveDate, options: SplitOptions) -> Result<TaskSplit, CoreError> {
        let weeks = calendar::trailing_week_starts(anchor, options.window_weeks.max(1));
        let snapshot = self.load_snapshot(family_id, &weeks).await?;
        let engine = ResolutionEngine::new(&snapshot);
        let resolved: Vec<ResolvedWeekSchedule> = weeks.iter().map(|w| engine.resolve(*w)).collect();
        Ok(fairness::compute_task_split(&resolved, &snapshot.members))
    }

    /// Shifts on one date.
    pub async fn shifts_for_date(&self, family_id: Uuid, date: NaiveDate) -> Result<Vec<Shift>, CoreError> {
        let week_start = calendar::week_start_of(date);
        let schedule = self.schedule(family_id, week_start).await?;
        Ok(schedule.day(date).map(shifts::shifts_for_day).unwrap_or_default())
    }

    /// Current and next shift of a member, looking from the day before
    /// `now` to the end of its week.
    pub async fn shift_status(&self, family_id: Uuid, member_id: Uuid, now: NaiveDateTime) -> Result<ShiftStatus, CoreError> {
        let today = now.date();
        let yesterday = today - Duration::days(1);
        let mut weeks = vec![calendar::week_start_of(yesterday)];
        if calendar::week_start_of(today) != weeks[0] {
            weeks.push(calendar::week_start_of(today));
        }

        let snapshot = self.load_snapshot(family_id, &weeks).await?;
        let engine = ResolutionEngine::new(&snapshot);
        let resolved: Vec<ResolvedWeekSchedule> = weeks.iter().map(|w| engine.resolve(*w)).collect();

        let days = resolved
            .iter()
            .flat_map(|s| s.days.iter())
            .filter(|d| d.date >= yesterday && d.date <= calendar::week_end(calendar::week_start_of(today)));
        Ok(shifts::shift_status(days, member_id, now))
    }

    /// Publishes a change to tasks or templates, which may touch any week.
    pub fn notify_template_change(&self, family_id: Uuid) {
        self.events.emit_lossy(ScheduleEvent::TaskScheduleUpdated {
            family_id,
            week_start: None,
        });
    }
}

#[async_trait]
impl<S: ScheduleStore + 'static> WeekFetcher for ScheduleService<S> {
    async fn fetch_week(&self, family_id: Uuid, week_start: NaiveDate) -> Result<ResolvedWeekSchedule, CoreError> {
        self.schedule(family_id, week_start).await
    }
}
