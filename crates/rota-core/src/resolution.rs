//! The Resolution Engine.
//!
//! Merges the three schedule layers (day templates, the week template that
//! assigns them to weekdays, and the week's date-scoped overrides) into one
//! [`ResolvedWeekSchedule`]. Resolution works on a [`ScheduleSnapshot`] read
//! up front, so [`ResolutionEngine::resolve`] itself is synchronous, never
//! fails and is deterministic for a given snapshot.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calendar::{self, WeekParity};
use crate::error::CoreError;
use crate::models::{
    DayTemplate, Member, OverrideAction, ResolvedDay, ResolvedTask, ResolvedWeekSchedule, Task,
    TaskOverride, TaskSource, TemplateRef, WeekOverride, WeekTemplate,
};
use crate::repository::ScheduleStore;

/// Store state needed to resolve one or more weeks of a family.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    pub family_id: Uuid,
    /// Includes deactivated tasks so old assignments keep resolving
    pub tasks: Vec<Task>,
    pub members: Vec<Member>,
    pub day_templates: Vec<DayTemplate>,
    pub week_templates: Vec<WeekTemplate>,
    pub week_overrides: Vec<WeekOverride>,
}

impl ScheduleSnapshot {
    /// Reads templates plus the overrides of every week in `weeks`.
    ///
    /// Any store failure becomes a single [`CoreError::ScheduleUnavailable`];
    /// no partial snapshot is ever returned.
    pub async fn load<S>(store: &S, family_id: Uuid, weeks: &[NaiveDate]) -> Result<Self, CoreError>
    where
        S: ScheduleStore + ?Sized,
    {
        Self::try_load(store, family_id, weeks)
            .await
            .map_err(CoreError::unavailable)
    }

    async fn try_load<S>(store: &S, family_id: Uuid, weeks: &[NaiveDate]) -> Result<Self, CoreError>
    where
        S: ScheduleStore + ?Sized,
    {
        let tasks = store.find_tasks(family_id, true).await?;
        let members = store.find_members(family_id).await?;
        let day_templates = store.find_day_templates(family_id).await?;
        let week_templates = store.find_week_templates(family_id).await?;

        let mut week_overrides = Vec::with_capacity(weeks.len());
        for week in weeks {
            if let Some(found) = store.find_week_override(family_id, *week).await? {
                week_overrides.push(found);
            }
        }

        Ok(Self {
            family_id,
            tasks,
            members,
            day_templates,
            week_templates,
            week_overrides,
        })
    }
}

/// Picks the effective week template for a week of the given parity.
///
/// Templates whose apply rule is unset or matches the parity compete on
/// priority; only when none qualify do default templates get a turn. Ties
/// go to the most recently created template, then to the greater id.
pub fn select_base_template(templates: &[WeekTemplate], parity: WeekParity) -> Option<&WeekTemplate> {
    let rank = |a: &&WeekTemplate, b: &&WeekTemplate| {
        a.priority
            .cmp(&b.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    };

    templates
        .iter()
        .filter(|t| t.apply_rule.map_or(true, |rule| rule.matches(parity)))
        .max_by(rank)
        .or_else(|| templates.iter().filter(|t| t.is_default).max_by(rank))
}

/// One assignment while a day is being resolved, before it is joined with
/// its task and member.
#[derive(Debug, Clone, PartialEq)]
struct Assignment {
    task_id: Uuid,
    member_id: Option<Uuid>,
    override_time: Option<NaiveTime>,
    override_duration: Option<i32>,
    source: TaskSource,
}

impl Assignment {
    fn from_override(task_override: &TaskOverride) -> Self {
        Self {
            task_id: task_override.task_id,
            member_id: task_override.new_member_id,
            override_time: task_override.override_time,
            override_duration: task_override.override_duration,
            source: TaskSource::Override,
        }
    }
}

/// Indexed, read-only view over a [`ScheduleSnapshot`].
pub struct ResolutionEngine<'a> {
    family_id: Uuid,
    tasks: HashMap<Uuid, &'a Task>,
    members: HashMap<Uuid, &'a Member>,
    day_templates: HashMap<Uuid, &'a DayTemplate>,
    week_templates: &'a [WeekTemplate],
    overrides: HashMap<NaiveDate, &'a WeekOverride>,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(snapshot: &'a ScheduleSnapshot) -> Self {
        Self {
            family_id: snapshot.family_id,
            tasks: snapshot.tasks.iter().map(|t| (t.id, t)).collect(),
            members: snapshot.members.iter().map(|m| (m.id, m)).collect(),
            day_templates: snapshot.day_templates.iter().map(|d| (d.id, d)).collect(),
            week_templates: &snapshot.week_templates,
            overrides: snapshot
                .week_overrides
                .iter()
                .filter(|o| o.family_id == snapshot.family_id)
                .map(|o| (o.week_start_date, o))
                .collect(),
        }
    }

    /// Resolves the week containing `week_start`.
    pub fn resolve(&self, week_start: NaiveDate) -> ResolvedWeekSchedule {
        let week_start = calendar::week_start_of(week_start);
        let base = select_base_template(self.week_templates, calendar::week_parity(week_start));
        let week_override = self.overrides.get(&week_start).copied();

        let days: Vec<ResolvedDay> = calendar::week_dates(week_start)
            .into_iter()
            .map(|date| {
                let mut assignments = self.expand_base_day(base, date);
                if let Some(week_override) = week_override {
                    for task_override in week_override
                        .task_overrides
                        .iter()
                        .filter(|o| o.assigned_date == date)
                    {
                        apply_override(&mut assignments, task_override);
                    }
                }
                ResolvedDay {
                    date,
                    tasks: self.decorate(date, assignments),
                }
            })
            .collect();

        let has_overrides = week_override.map_or(false, |o| !o.task_overrides.is_empty());

        debug!(
            family_id = %self.family_id,
            %week_start,
            base_template = ?base.map(|t| t.id),
            has_overrides,
            tasks = days.iter().map(|d| d.tasks.len()).sum::<usize>(),
            "resolved week"
        );

        ResolvedWeekSchedule {
            family_id: self.family_id,
            week_start_date: week_start,
            base_template: base.map(|t| TemplateRef {
                id: t.id,
                name: t.name.clone(),
            }),
            has_overrides,
            days,
        }
    }

    fn expand_base_day(&self, base: Option<&WeekTemplate>, date: NaiveDate) -> Vec<Assignment> {
        let Some(day_template_id) = base.and_then(|t| t.day_template_for(calendar::day_of_week(date)))
        else {
            return Vec::new();
        };

        let Some(day_template) = self.day_templates.get(&day_template_id) else {
            warn!(%day_template_id, %date, "week template references unknown day template, day left empty");
            return Vec::new();
        };

        day_template
            .items
            .iter()
            .map(|item| Assignment {
                task_id: item.task_id,
                member_id: item.member_id,
                override_time: item.override_time,
                override_duration: item.override_duration,
                source: TaskSource::Template,
            })
            .collect()
    }

    /// Joins assignments with their task and member records.
    fn decorate(&self, date: NaiveDate, assignments: Vec<Assignment>) -> Vec<ResolvedTask> {
        assignments
            .into_iter()
            .filter_map(|a| {
                let Some(task) = self.tasks.get(&a.task_id) else {
                    warn!(task_id = %a.task_id, %date, "dropping assignment of unknown task");
                    return None;
                };
                let member = a.member_id.and_then(|id| {
                    let found = self.members.get(&id).map(|m| (*m).clone());
                    if found.is_none() {
                        warn!(member_id = %id, task_id = %a.task_id, %date, "assignment names unknown member");
                    }
                    found
                });
                Some(ResolvedTask {
                    task_id: a.task_id,
                    member_id: a.member_id,
                    override_time: a.override_time,
                    override_duration: a.override_duration,
                    source: a.source,
                    task: (*task).clone(),
                    member,
                })
            })
            .collect()
    }
}

/// Applies one override to the assignments of its day.
fn apply_override(assignments: &mut Vec<Assignment>, task_override: &TaskOverride) {
    match task_override.action {
        OverrideAction::Add => assignments.push(Assignment::from_override(task_override)),
        OverrideAction::Remove => {
            let position = assignments.iter().position(|a| {
                a.task_id == task_override.task_id
                    && task_override
                        .original_member_id
                        .map_or(true, |original| a.member_id == Some(original))
            });
            if let Some(position) = position {
                assignments.remove(position);
            }
        }
        OverrideAction::Reassign => {
            let target = assignments.iter_mut().find(|a| {
                a.task_id == task_override.task_id && a.member_id == task_override.original_member_id
            });
            match target {
                Some(target) => {
                    target.member_id = task_override.new_member_id;
                    if task_override.override_time.is_some() {
                        target.override_time = task_override.override_time;
                    }
                    if task_override.override_duration.is_some() {
                        target.override_duration = task_override.override_duration;
                    }
                    target.source = TaskSource::Override;
                }
                None => {
                    debug!(
                        task_id = %task_override.task_id,
                        date = %task_override.assigned_date,
                        "reassign found no matching assignment, adding instead"
                    );
                    assignments.push(Assignment::from_override(task_override));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplyRule, DayTemplateItem, WeekTemplateDay};
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ISO week 34 of 2025 (even)
    fn even_monday() -> NaiveDate {
        date(2025, 8, 18)
    }

    // ISO week 35 of 2025 (odd)
    fn odd_monday() -> NaiveDate {
        date(2025, 8, 25)
    }

    struct Fixture {
        snapshot: ScheduleSnapshot,
        dishes: Uuid,
        laundry: Uuid,
        alice: Uuid,
        bob: Uuid,
    }

    fn fixture() -> Fixture {
        let family_id = Uuid::now_v7();
        let dishes = Task {
            family_id,
            name: "Dishes".into(),
            default_start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            default_duration: 30,
            ..Default::default()
        };
        let laundry = Task {
            family_id,
            name: "Laundry".into(),
            default_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            default_duration: 60,
            ..Default::default()
        };
        let member = |name: &str| Member {
            id: Uuid::now_v7(),
            family_id,
            name: name.into(),
            is_virtual: false,
            created_at: Utc::now(),
        };
        let alice = member("alice");
        let bob = member("bob");

        let day_template_id = Uuid::now_v7();
        let monday_list = DayTemplate {
            id: day_template_id,
            family_id,
            name: "Weekday".into(),
            description: None,
            created_at: Utc::now(),
            items: vec![DayTemplateItem {
                id: Uuid::now_v7(),
                day_template_id,
                position: 0,
                task_id: dishes.id,
                member_id: Some(alice.id),
                override_time: None,
                override_duration: None,
            }],
        };

        let week = week_template(family_id, "W", 1, None, false, 0);
        let week = with_day(week, 1, day_template_id);

        Fixture {
            dishes: dishes.id,
            laundry: laundry.id,
            alice: alice.id,
            bob: bob.id,
            snapshot: ScheduleSnapshot {
                family_id,
                tasks: vec![dishes, laundry],
                members: vec![alice, bob],
                day_templates: vec![monday_list],
                week_templates: vec![week],
                week_overrides: vec![],
            },
        }
    }

    fn week_template(
        family_id: Uuid,
        name: &str,
        priority: i32,
        apply_rule: Option<ApplyRule>,
        is_default: bool,
        age_days: i64,
    ) -> WeekTemplate {
        WeekTemplate {
            id: Uuid::now_v7(),
            family_id,
            name: name.into(),
            is_default,
            apply_rule,
            priority,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() - Duration::days(age_days),
            days: vec![],
        }
    }

    fn with_day(mut template: WeekTemplate, day_of_week: u8, day_template_id: Uuid) -> WeekTemplate {
        template.days.push(WeekTemplateDay {
            week_template_id: template.id,
            day_of_week,
            day_template_id,
        });
        template
    }

    fn with_overrides(snapshot: &mut ScheduleSnapshot, overrides: Vec<TaskOverride>) {
        snapshot.week_overrides = vec![WeekOverride {
            family_id: snapshot.family_id,
            week_start_date: even_monday(),
            task_overrides: overrides,
            updated_at: Utc::now(),
        }];
    }

    fn monday_tasks(schedule: &ResolvedWeekSchedule) -> Vec<(Uuid, Option<Uuid>, TaskSource)> {
        schedule.days[0]
            .tasks
            .iter()
            .map(|t| (t.task_id, t.member_id, t.source))
            .collect()
    }

    #[test]
    fn test_template_only_week() {
        let fx = fixture();
        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());

        assert_eq!(schedule.days.len(), 7);
        assert_eq!(schedule.days[0].date, even_monday());
        assert_eq!(schedule.days[6].date, date(2025, 8, 24));
        assert!(!schedule.has_overrides);
        assert_eq!(schedule.base_template.as_ref().map(|t| t.name.as_str()), Some("W"));

        let monday = &schedule.days[0].tasks;
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].task_id, fx.dishes);
        assert_eq!(monday[0].member_id, Some(fx.alice));
        assert_eq!(monday[0].override_time, None);
        assert_eq!(monday[0].override_duration, None);
        assert_eq!(monday[0].source, TaskSource::Template);
        assert_eq!(monday[0].member_name(), Some("alice"));
        assert!(schedule.days[1..].iter().all(|d| d.tasks.is_empty()));
    }

    #[test]
    fn test_sunday_slot_is_last_day_of_week() {
        let mut fx = fixture();
        let list = fx.snapshot.day_templates[0].id;
        let mut template = fx.snapshot.week_templates.remove(0);
        template.days.clear();
        fx.snapshot.week_templates.push(with_day(template, 0, list));

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert!(schedule.days[0].tasks.is_empty());
        assert_eq!(schedule.days[6].date, date(2025, 8, 24));
        assert_eq!(schedule.days[6].tasks.len(), 1);
    }

    #[test]
    fn test_resolve_normalizes_week_start() {
        let fx = fixture();
        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(date(2025, 8, 21));
        assert_eq!(schedule.week_start_date, even_monday());
    }

    #[rstest]
    #[case::priority_wins(vec![("low", 1, None, false, 0), ("high", 5, None, false, 9)], "high")]
    #[case::parity_filters_before_priority(vec![("odd", 9, Some(ApplyRule::OddWeeks), false, 0), ("any", 1, None, false, 0)], "any")]
    #[case::matching_parity(vec![("even", 2, Some(ApplyRule::EvenWeeks), false, 0), ("any", 1, None, false, 0)], "even")]
    #[case::tie_goes_to_newest(vec![("older", 3, None, false, 10), ("newer", 3, None, false, 1)], "newer")]
    #[case::default_fallback(vec![("odd", 9, Some(ApplyRule::OddWeeks), false, 0), ("fallback", 0, Some(ApplyRule::OddWeeks), true, 0)], "fallback")]
    #[case::default_does_not_beat_candidate(vec![("default", 9, None, true, 0), ("plain", 10, None, false, 0)], "plain")]
    #[case::newest_of_several_defaults(vec![("a", 0, Some(ApplyRule::OddWeeks), true, 5), ("b", 0, Some(ApplyRule::OddWeeks), true, 2)], "b")]
    fn test_base_template_ladder(
        #[case] templates: Vec<(&str, i32, Option<ApplyRule>, bool, i64)>,
        #[case] expected: &str,
    ) {
        let family_id = Uuid::now_v7();
        let templates: Vec<WeekTemplate> = templates
            .into_iter()
            .map(|(name, priority, rule, is_default, age)| {
                week_template(family_id, name, priority, rule, is_default, age)
            })
            .collect();

        let selected = select_base_template(&templates, WeekParity::Even);
        assert_eq!(selected.map(|t| t.name.as_str()), Some(expected));
    }

    #[test]
    fn test_no_qualifying_template_yields_empty_week() {
        let mut fx = fixture();
        fx.snapshot.week_templates[0].apply_rule = Some(ApplyRule::OddWeeks);

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert_eq!(schedule.base_template, None);
        assert!(schedule.days.iter().all(|d| d.tasks.is_empty()));

        let odd = ResolutionEngine::new(&fx.snapshot).resolve(odd_monday());
        assert!(odd.base_template.is_some());
    }

    #[test]
    fn test_reassign() {
        let mut fx = fixture();
        with_overrides(
            &mut fx.snapshot,
            vec![TaskOverride::reassign(even_monday(), fx.dishes, Some(fx.alice), Some(fx.bob))],
        );

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert!(schedule.has_overrides);
        assert_eq!(
            monday_tasks(&schedule),
            vec![(fx.dishes, Some(fx.bob), TaskSource::Override)]
        );
    }

    #[test]
    fn test_reassign_keeps_time_unless_supplied() {
        let mut fx = fixture();
        let seven = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        with_overrides(
            &mut fx.snapshot,
            vec![TaskOverride::reassign(even_monday(), fx.dishes, Some(fx.alice), Some(fx.bob))
                .with_time(seven)],
        );

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        let task = &schedule.days[0].tasks[0];
        assert_eq!(task.effective_start_time(), seven);
        assert_eq!(task.effective_duration(), 30);
    }

    #[test]
    fn test_reassign_without_match_appends() {
        let mut fx = fixture();
        with_overrides(
            &mut fx.snapshot,
            vec![TaskOverride::reassign(even_monday(), fx.dishes, Some(fx.bob), Some(fx.alice))],
        );

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert_eq!(
            monday_tasks(&schedule),
            vec![
                (fx.dishes, Some(fx.alice), TaskSource::Template),
                (fx.dishes, Some(fx.alice), TaskSource::Override),
            ]
        );
    }

    #[test]
    fn test_remove_missing_is_noop_but_counts() {
        let mut fx = fixture();
        with_overrides(
            &mut fx.snapshot,
            vec![TaskOverride::remove(even_monday(), fx.laundry, None)],
        );

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert!(schedule.has_overrides);
        assert_eq!(
            monday_tasks(&schedule),
            vec![(fx.dishes, Some(fx.alice), TaskSource::Template)]
        );
    }

    #[test]
    fn test_remove_without_member_matches_any_assignee() {
        let mut fx = fixture();
        with_overrides(&mut fx.snapshot, vec![TaskOverride::remove(even_monday(), fx.dishes, None)]);

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert!(schedule.days[0].tasks.is_empty());
    }

    #[test]
    fn test_remove_with_member_requires_match() {
        let mut fx = fixture();
        with_overrides(
            &mut fx.snapshot,
            vec![TaskOverride::remove(even_monday(), fx.dishes, Some(fx.bob))],
        );

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert_eq!(schedule.days[0].tasks.len(), 1);
    }

    #[test]
    fn test_add_then_remove_restores_day() {
        let fx = fixture();
        let before = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());

        let mut fx = fx;
        with_overrides(
            &mut fx.snapshot,
            vec![
                TaskOverride::add(even_monday(), fx.laundry, Some(fx.bob)),
                TaskOverride::remove(even_monday(), fx.laundry, Some(fx.bob)),
            ],
        );
        let after = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());

        let strip = |s: &ResolvedWeekSchedule| -> Vec<Vec<(Uuid, Option<Uuid>)>> {
            s.days
                .iter()
                .map(|d| d.tasks.iter().map(|t| (t.task_id, t.member_id)).collect())
                .collect()
        };
        assert_eq!(strip(&before), strip(&after));
        assert!(after.has_overrides);
    }

    #[test]
    fn test_add_allows_duplicates() {
        let mut fx = fixture();
        with_overrides(
            &mut fx.snapshot,
            vec![
                TaskOverride::add(even_monday(), fx.dishes, Some(fx.bob)).with_time(NaiveTime::from_hms_opt(7, 0, 0).unwrap()),
            ],
        );

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert_eq!(schedule.days[0].tasks.len(), 2);
        assert!(schedule.days[0].tasks.iter().all(|t| t.task_id == fx.dishes));
    }

    #[test]
    fn test_overrides_apply_in_stored_order() {
        let mut fx = fixture();
        with_overrides(
            &mut fx.snapshot,
            vec![
                TaskOverride::reassign(even_monday(), fx.dishes, Some(fx.alice), Some(fx.bob)),
                TaskOverride::remove(even_monday(), fx.dishes, Some(fx.bob)),
            ],
        );

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert!(schedule.days[0].tasks.is_empty());
    }

    #[test]
    fn test_overrides_target_only_their_date() {
        let mut fx = fixture();
        let tuesday = even_monday() + Duration::days(1);
        with_overrides(&mut fx.snapshot, vec![TaskOverride::add(tuesday, fx.laundry, None)]);

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert_eq!(schedule.days[0].tasks.len(), 1);
        assert_eq!(schedule.days[1].tasks.len(), 1);
        assert_eq!(schedule.days[1].tasks[0].member_id, None);
    }

    #[test]
    fn test_other_weeks_overrides_ignored() {
        let mut fx = fixture();
        with_overrides(&mut fx.snapshot, vec![TaskOverride::remove(even_monday(), fx.dishes, None)]);

        let next = ResolutionEngine::new(&fx.snapshot).resolve(even_monday() + Duration::weeks(2));
        assert!(!next.has_overrides);
        assert_eq!(next.days[0].tasks.len(), 1);
    }

    #[test]
    fn test_unknown_references_are_dropped() {
        let mut fx = fixture();
        let ghost_member = Uuid::now_v7();
        with_overrides(
            &mut fx.snapshot,
            vec![
                TaskOverride::add(even_monday(), Uuid::now_v7(), None),
                TaskOverride::add(even_monday(), fx.laundry, Some(ghost_member)),
            ],
        );
        let week_template_id = fx.snapshot.week_templates[0].id;
        fx.snapshot.week_templates[0].days.push(WeekTemplateDay {
            week_template_id,
            day_of_week: 2,
            day_template_id: Uuid::now_v7(),
        });

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        let monday = &schedule.days[0].tasks;
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[1].member_id, Some(ghost_member));
        assert_eq!(monday[1].member, None);
        assert!(schedule.days[1].tasks.is_empty());
    }

    #[test]
    fn test_deactivated_task_still_resolves() {
        let mut fx = fixture();
        fx.snapshot.tasks[0].active = false;

        let schedule = ResolutionEngine::new(&fx.snapshot).resolve(even_monday());
        assert_eq!(schedule.days[0].tasks.len(), 1);
        assert!(!schedule.days[0].tasks[0].is_task_active());
    }

    proptest! {
        #[test]
        fn prop_resolution_is_deterministic(
            raw in prop::collection::vec(
                (0..7i64, 0..2usize, 0..3u8, prop::option::of(0..2usize), prop::option::of(0..2usize)),
                0..12,
            )
        ) {
            let mut fx = fixture();
            let tasks = [fx.dishes, fx.laundry];
            let members = [fx.alice, fx.bob];
            let overrides = raw
                .into_iter()
                .map(|(offset, task, action, original, new)| TaskOverride {
                    assigned_date: even_monday() + Duration::days(offset),
                    task_id: tasks[task],
                    action: match action {
                        0 => OverrideAction::Add,
                        1 => OverrideAction::Remove,
                        _ => OverrideAction::Reassign,
                    },
                    original_member_id: original.map(|i| members[i]),
                    new_member_id: new.map(|i| members[i]),
                    override_time: None,
                    override_duration: None,
                })
                .collect();
            with_overrides(&mut fx.snapshot, overrides);

            let engine = ResolutionEngine::new(&fx.snapshot);
            let first = serde_json::to_string(&engine.resolve(even_monday())).unwrap();
            let second = serde_json::to_string(&ResolutionEngine::new(&fx.snapshot).resolve(even_monday())).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
