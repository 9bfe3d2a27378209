//! Write-time checks for override batches.
//!
//! A batch is accepted or rejected as a whole, before anything touches the
//! store. The first offending override is reported with its position and
//! field.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar;
use crate::error::{OverrideField, OverrideViolation};
use crate::models::{Member, OverrideAction, Task, TaskOverride};

/// Validates an override batch for the week starting at `week_start`
/// against the family's tasks and members.
pub fn validate_override_batch(
    week_start: NaiveDate,
    overrides: &[TaskOverride],
    replace_existing: bool,
    tasks: &[Task],
    members: &[Member],
) -> Result<(), OverrideViolation> {
    if !calendar::is_week_start(week_start) {
        return Err(OverrideViolation::request(
            OverrideField::WeekStartDate,
            format!("{} is not a Monday", week_start),
        ));
    }

    // An empty replace clears the week; an empty append does nothing.
    if overrides.is_empty() && !replace_existing {
        return Err(OverrideViolation::request(
            OverrideField::TaskOverrides,
            "at least one override is required",
        ));
    }

    let tasks: HashMap<Uuid, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    let members: HashMap<Uuid, &Member> = members.iter().map(|m| (m.id, m)).collect();

    for (index, task_override) in overrides.iter().enumerate() {
        validate_one(week_start, index, task_override, &tasks, &members)?;
    }
    Ok(())
}

fn validate_one(
    week_start: NaiveDate,
    index: usize,
    o: &TaskOverride,
    tasks: &HashMap<Uuid, &Task>,
    members: &HashMap<Uuid, &Member>,
) -> Result<(), OverrideViolation> {
    let fail = |field, reason: String| Err(OverrideViolation::at(index, field, reason));

    if !calendar::is_within_week(week_start, o.assigned_date) {
        return fail(
            OverrideField::AssignedDate,
            format!(
                "{} is outside the week {} to {}",
                o.assigned_date,
                week_start,
                calendar::week_end(week_start)
            ),
        );
    }

    let Some(task) = tasks.get(&o.task_id) else {
        return fail(OverrideField::TaskId, format!("unknown task {}", o.task_id));
    };
    if !task.active && o.action != OverrideAction::Remove {
        return fail(
            OverrideField::TaskId,
            format!("task '{}' is deactivated", task.name),
        );
    }

    if let Some(id) = o.original_member_id {
        if !members.contains_key(&id) {
            return fail(OverrideField::OriginalMemberId, format!("unknown member {}", id));
        }
    }
    if let Some(id) = o.new_member_id {
        if !members.contains_key(&id) {
            return fail(OverrideField::NewMemberId, format!("unknown member {}", id));
        }
    }
    if let Some(duration) = o.override_duration {
        if duration <= 0 {
            return fail(
                OverrideField::OverrideDuration,
                format!("duration must be a positive number of minutes, got {}", duration),
            );
        }
    }

    match o.action {
        OverrideAction::Add => {
            if o.original_member_id.is_some() {
                return fail(
                    OverrideField::OriginalMemberId,
                    "ADD takes no original member".to_string(),
                );
            }
        }
        OverrideAction::Remove => {
            if o.new_member_id.is_some() {
                return fail(OverrideField::NewMemberId, "REMOVE takes no new member".to_string());
            }
            if o.override_time.is_some() {
                return fail(OverrideField::OverrideTime, "REMOVE takes no time".to_string());
            }
            if o.override_duration.is_some() {
                return fail(OverrideField::OverrideDuration, "REMOVE takes no duration".to_string());
            }
        }
        OverrideAction::Reassign => {
            let changes_something = o.original_member_id != o.new_member_id
                || o.override_time.is_some()
                || o.override_duration.is_some();
            if !changes_something {
                return fail(
                    OverrideField::NewMemberId,
                    "REASSIGN must change the member, time or duration".to_string(),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, Utc};
    use rstest::rstest;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 18).unwrap()
    }

    struct Family {
        tasks: Vec<Task>,
        members: Vec<Member>,
    }

    impl Family {
        fn task(&self) -> Uuid {
            self.tasks[0].id
        }

        fn retired(&self) -> Uuid {
            self.tasks[1].id
        }

        fn member(&self) -> Uuid {
            self.members[0].id
        }

        fn check(&self, overrides: &[TaskOverride]) -> Result<(), OverrideViolation> {
            validate_override_batch(monday(), overrides, false, &self.tasks, &self.members)
        }
    }

    fn family() -> Family {
        let family_id = Uuid::now_v7();
        Family {
            tasks: vec![
                Task {
                    family_id,
                    name: "Dishes".into(),
                    ..Default::default()
                },
                Task {
                    family_id,
                    name: "Ironing".into(),
                    active: false,
                    ..Default::default()
                },
            ],
            members: vec![Member {
                id: Uuid::now_v7(),
                family_id,
                name: "alice".into(),
                is_virtual: false,
                created_at: Utc::now(),
            }],
        }
    }

    #[test]
    fn test_valid_batch() {
        let f = family();
        let batch = vec![
            TaskOverride::add(monday(), f.task(), Some(f.member())),
            TaskOverride::remove(monday() + Duration::days(6), f.task(), None),
            TaskOverride::reassign(monday(), f.task(), Some(f.member()), None),
            TaskOverride::remove(monday(), f.retired(), None),
        ];
        assert_eq!(f.check(&batch), Ok(()));
    }

    #[test]
    fn test_week_start_must_be_monday() {
        let f = family();
        let err = validate_override_batch(monday() + Duration::days(1), &[], true, &f.tasks, &f.members)
            .unwrap_err();
        assert_eq!(err.field, OverrideField::WeekStartDate);
        assert_eq!(err.index, None);
    }

    #[test]
    fn test_empty_batch_only_with_replace() {
        let f = family();
        assert_eq!(
            f.check(&[]).unwrap_err().field,
            OverrideField::TaskOverrides
        );
        assert!(validate_override_batch(monday(), &[], true, &f.tasks, &f.members).is_ok());
    }

    #[rstest]
    #[case::before_week(-1)]
    #[case::after_week(7)]
    fn test_assigned_date_outside_week(#[case] offset: i64) {
        let f = family();
        let batch = vec![
            TaskOverride::add(monday(), f.task(), None),
            TaskOverride::add(monday() + Duration::days(offset), f.task(), None),
        ];
        let err = f.check(&batch).unwrap_err();
        assert_eq!(err.index, Some(1));
        assert_eq!(err.field, OverrideField::AssignedDate);
    }

    #[test]
    fn test_unknown_references() {
        let f = family();

        let err = f.check(&[TaskOverride::add(monday(), Uuid::now_v7(), None)]).unwrap_err();
        assert_eq!(err.field, OverrideField::TaskId);

        let err = f
            .check(&[TaskOverride::add(monday(), f.task(), Some(Uuid::now_v7()))])
            .unwrap_err();
        assert_eq!(err.field, OverrideField::NewMemberId);

        let err = f
            .check(&[TaskOverride::remove(monday(), f.task(), Some(Uuid::now_v7()))])
            .unwrap_err();
        assert_eq!(err.field, OverrideField::OriginalMemberId);
    }

    #[test]
    fn test_deactivated_task_cannot_be_added() {
        let f = family();
        let err = f.check(&[TaskOverride::add(monday(), f.retired(), None)]).unwrap_err();
        assert_eq!(err.field, OverrideField::TaskId);
        assert!(err.reason.contains("deactivated"));
    }

    #[rstest]
    #[case::remove_with_time(
        |f: &Family| TaskOverride::remove(monday(), f.task(), None).with_time(NaiveTime::MIN),
        OverrideField::OverrideTime
    )]
    #[case::remove_with_new_member(
        |f: &Family| TaskOverride { new_member_id: Some(f.member()), ..TaskOverride::remove(monday(), f.task(), None) },
        OverrideField::NewMemberId
    )]
    #[case::add_with_original(
        |f: &Family| TaskOverride { original_member_id: Some(f.member()), ..TaskOverride::add(monday(), f.task(), None) },
        OverrideField::OriginalMemberId
    )]
    #[case::zero_duration(
        |f: &Family| TaskOverride::add(monday(), f.task(), None).with_duration(0),
        OverrideField::OverrideDuration
    )]
    #[case::noop_reassign(
        |f: &Family| TaskOverride::reassign(monday(), f.task(), Some(f.member()), Some(f.member())),
        OverrideField::NewMemberId
    )]
    fn test_malformed_actions(#[case] build: fn(&Family) -> TaskOverride, #[case] field: OverrideField) {
        let f = family();
        let err = f.check(&[build(&f)]).unwrap_err();
        assert_eq!(err.index, Some(0));
        assert_eq!(err.field, field);
    }
}
