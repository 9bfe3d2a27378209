//! Shift Grouper: folds a day's resolved tasks into contiguous blocks of
//! duty per assignee, and derives a member's current/next shift.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::calendar;
use crate::models::{Member, ResolvedDay, ResolvedTask};

/// Consecutive tasks of one assignee. Never empty.
///
/// `member_id` is the id of the joined member record, so a task whose
/// member no longer exists counts as unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub member_id: Option<Uuid>,
    pub member: Option<Member>,
    tasks: Vec<ResolvedTask>,
}

impl Shift {
    pub fn tasks(&self) -> &[ResolvedTask] {
        &self.tasks
    }

    pub fn start_time(&self) -> NaiveTime {
        self.tasks
            .first()
            .map_or(NaiveTime::MIN, ResolvedTask::effective_start_time)
    }

    /// Minutes after midnight.
    pub fn start_minute(&self) -> i64 {
        calendar::minute_of_day(self.start_time())
    }

    /// Start of the last task plus its duration, in minutes after midnight.
    /// May run past [`calendar::MINUTES_PER_DAY`].
    pub fn end_minute(&self) -> i64 {
        self.tasks.last().map_or(0, |last| {
            calendar::minute_of_day(last.effective_start_time()) + i64::from(last.effective_duration())
        })
    }

    /// Span from first start to computed end; gaps between tasks count.
    pub fn duration_minutes(&self) -> i64 {
        self.end_minute() - self.start_minute()
    }

    pub fn member_name(&self) -> Option<&str> {
        self.member.as_ref().map(|m| m.name.as_str())
    }
}

/// Groups tasks into shifts.
///
/// Tasks are ordered by effective start time (stable, so equal times keep
/// their resolved order) and a new shift opens on every change of
/// assignee. The same member appearing again after someone else gets a
/// separate shift.
pub fn group_shifts(tasks: &[ResolvedTask]) -> Vec<Shift> {
    let mut sorted: Vec<&ResolvedTask> = tasks.iter().collect();
    sorted.sort_by_key(|t| t.effective_start_time());

    let mut shifts: Vec<Shift> = Vec::new();
    for task in sorted {
        let assignee = task.member.as_ref().map(|m| m.id);
        match shifts.last_mut() {
            Some(current) if current.member_id == assignee => current.tasks.push(task.clone()),
            _ => shifts.push(Shift {
                member_id: assignee,
                member: task.member.clone(),
                tasks: vec![task.clone()],
            }),
        }
    }
    shifts
}

#[inline]
pub fn shifts_for_day(day: &ResolvedDay) -> Vec<Shift> {
    group_shifts(&day.tasks)
}

/// A member's shift placed on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: i64,
    pub task_names: Vec<String>,
}

impl ShiftSummary {
    fn from_shift(date: NaiveDate, shift: &Shift) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        Self {
            date,
            start: midnight + Duration::minutes(shift.start_minute()),
            end: midnight + Duration::minutes(shift.end_minute()),
            duration_minutes: shift.duration_minutes(),
            task_names: shift.tasks.iter().map(|t| t.task.name.clone()).collect(),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStatus {
    pub current: Option<ShiftSummary>,
    pub next: Option<ShiftSummary>,
}

/// Current and next shift of `member_id` as of `now`.
///
/// Pass the day before `now` along with the rest so a shift running past
/// midnight is still reported as current.
pub fn shift_status<'a, I>(days: I, member_id: Uuid, now: NaiveDateTime) -> ShiftStatus
where
    I: IntoIterator<Item = &'a ResolvedDay>,
{
    let mut summaries: Vec<ShiftSummary> = days
        .into_iter()
        .flat_map(|day| {
            shifts_for_day(day)
                .into_iter()
                .filter(|s| s.member_id == Some(member_id))
                .map(|s| ShiftSummary::from_shift(day.date, &s))
                .collect::<Vec<_>>()
        })
        .collect();
    summaries.sort_by_key(|s| s.start);

    let current = summaries.iter().find(|s| s.contains(now)).cloned();
    let next = summaries.into_iter().find(|s| s.start > now);
    ShiftStatus { current, next }
}
