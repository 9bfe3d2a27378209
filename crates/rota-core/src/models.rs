use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::{self, WeekParity};

// ============================================================================
// Template Store
// ============================================================================

/// A household chore. Identity is immutable; deleting a task only clears
/// `active` so templates and overrides that reference it keep resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(with = "calendar::hhmm")]
    pub default_start_time: NaiveTime,
    /// Minutes, always > 0
    pub default_duration: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            family_id: Uuid::nil(),
            name: "".to_string(),
            icon: None,
            color: None,
            default_start_time: NaiveTime::MIN,
            default_duration: 30,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// A family member. Virtual members (young children, pets) take assignments
/// but are left out of fairness statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub is_virtual: bool,
    pub created_at: DateTime<Utc>,
}

/// Reusable, date-independent list of assignments for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DayTemplate {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Ordered by `position`; loaded separately from `day_template_items`
    #[sqlx(skip)]
    pub items: Vec<DayTemplateItem>,
}

/// Template-level override of a task's default assignee, time and duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DayTemplateItem {
    pub id: Uuid,
    pub day_template_id: Uuid,
    pub position: i64,
    pub task_id: Uuid,
    pub member_id: Option<Uuid>,
    #[serde(default, with = "calendar::hhmm::option")]
    pub override_time: Option<NaiveTime>,
    pub override_duration: Option<i32>,
}

/// Restricts a week template to even or odd ISO weeks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyRule {
    EvenWeeks,
    OddWeeks,
}

impl ApplyRule {
    pub fn matches(&self, parity: WeekParity) -> bool {
        matches!(
            (self, parity),
            (ApplyRule::EvenWeeks, WeekParity::Even) | (ApplyRule::OddWeeks, WeekParity::Odd)
        )
    }
}

impl std::fmt::Display for ApplyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyRule::EvenWeeks => write!(f, "EVEN_WEEKS"),
            ApplyRule::OddWeeks => write!(f, "ODD_WEEKS"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid apply rule: {0}")]
pub struct ParseApplyRuleError(String);

impl FromStr for ApplyRule {
    type Err = ParseApplyRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "even_weeks" | "even" => Ok(ApplyRule::EvenWeeks),
            "odd_weeks" | "odd" => Ok(ApplyRule::OddWeeks),
            _ => Err(ParseApplyRuleError(s.to_string())),
        }
    }
}

/// Weekly plan: one day template per weekday slot, selected by parity and
/// priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeekTemplate {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub apply_rule: Option<ApplyRule>,
    /// Higher wins
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    /// 0-7 slots, at most one per weekday
    #[sqlx(skip)]
    pub days: Vec<WeekTemplateDay>,
}

impl WeekTemplate {
    /// Day template assigned to a storage weekday (`0 = Sunday`).
    pub fn day_template_for(&self, day_of_week: u8) -> Option<Uuid> {
        self.days
            .iter()
            .find(|d| d.day_of_week == day_of_week)
            .map(|d| d.day_template_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeekTemplateDay {
    pub week_template_id: Uuid,
    /// `0 = Sunday` … `6 = Saturday`
    pub day_of_week: u8,
    pub day_template_id: Uuid,
}

// ============================================================================
// Override Store
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OverrideAction {
    Add,
    Remove,
    Reassign,
}

impl std::fmt::Display for OverrideAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideAction::Add => write!(f, "ADD"),
            OverrideAction::Remove => write!(f, "REMOVE"),
            OverrideAction::Reassign => write!(f, "REASSIGN"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid override action: {0}")]
pub struct ParseOverrideActionError(String);

impl FromStr for OverrideAction {
    type Err = ParseOverrideActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(OverrideAction::Add),
            "remove" => Ok(OverrideAction::Remove),
            "reassign" => Ok(OverrideAction::Reassign),
            _ => Err(ParseOverrideActionError(s.to_string())),
        }
    }
}

/// One date-scoped correction on top of the template-derived schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverride {
    pub assigned_date: NaiveDate,
    pub task_id: Uuid,
    pub action: OverrideAction,
    #[serde(default)]
    pub original_member_id: Option<Uuid>,
    #[serde(default)]
    pub new_member_id: Option<Uuid>,
    #[serde(default, with = "calendar::hhmm::option")]
    pub override_time: Option<NaiveTime>,
    #[serde(default)]
    pub override_duration: Option<i32>,
}

impl TaskOverride {
    pub fn add(assigned_date: NaiveDate, task_id: Uuid, member_id: Option<Uuid>) -> Self {
        Self {
            assigned_date,
            task_id,
            action: OverrideAction::Add,
            original_member_id: None,
            new_member_id: member_id,
            override_time: None,
            override_duration: None,
        }
    }

    pub fn remove(assigned_date: NaiveDate, task_id: Uuid, member_id: Option<Uuid>) -> Self {
        Self {
            assigned_date,
            task_id,
            action: OverrideAction::Remove,
            original_member_id: member_id,
            new_member_id: None,
            override_time: None,
            override_duration: None,
        }
    }

    pub fn reassign(
        assigned_date: NaiveDate,
        task_id: Uuid,
        from: Option<Uuid>,
        to: Option<Uuid>,
    ) -> Self {
        Self {
            assigned_date,
            task_id,
            action: OverrideAction::Reassign,
            original_member_id: from,
            new_member_id: to,
            override_time: None,
            override_duration: None,
        }
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.override_time = Some(time);
        self
    }

    pub fn with_duration(mut self, minutes: i32) -> Self {
        self.override_duration = Some(minutes);
        self
    }
}

/// Overrides for one family and one ISO week, in stored (application) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekOverride {
    pub family_id: Uuid,
    /// Always a Monday
    pub week_start_date: NaiveDate,
    pub task_overrides: Vec<TaskOverride>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Resolved schedule (derived, never persisted)
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskSource {
    Template,
    Override,
}

impl std::fmt::Display for TaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskSource::Template => write!(f, "template"),
            TaskSource::Override => write!(f, "override"),
        }
    }
}

/// A concrete assignment on a concrete date, joined with its task and
/// member for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTask {
    pub task_id: Uuid,
    pub member_id: Option<Uuid>,
    #[serde(with = "calendar::hhmm::option")]
    pub override_time: Option<NaiveTime>,
    pub override_duration: Option<i32>,
    pub source: TaskSource,
    pub task: Task,
    /// `None` when unassigned or when the member record is gone
    pub member: Option<Member>,
}

impl ResolvedTask {
    #[inline]
    pub fn effective_start_time(&self) -> NaiveTime {
        self.override_time.unwrap_or(self.task.default_start_time)
    }

    #[inline]
    pub fn effective_duration(&self) -> i32 {
        self.override_duration.unwrap_or(self.task.default_duration)
    }

    /// False for tasks deactivated after assignment; the UI grays these out.
    #[inline]
    pub fn is_task_active(&self) -> bool {
        self.task.active
    }

    pub fn member_name(&self) -> Option<&str> {
        self.member.as_ref().map(|m| m.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDay {
    pub date: NaiveDate,
    pub tasks: Vec<ResolvedTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRef {
    pub id: Uuid,
    pub name: String,
}

/// The single source of truth for one family and one week: seven days,
/// Monday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWeekSchedule {
    pub family_id: Uuid,
    pub week_start_date: NaiveDate,
    pub base_template: Option<TemplateRef>,
    pub has_overrides: bool,
    pub days: Vec<ResolvedDay>,
}

impl ResolvedWeekSchedule {
    pub fn day(&self, date: NaiveDate) -> Option<&ResolvedDay> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &ResolvedTask> {
        self.days.iter().flat_map(|d| d.tasks.iter())
    }
}

// ============================================================================
// Data Transfer Objects (DTOs)
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewTaskData {
    pub family_id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub default_start_time: NaiveTime,
    pub default_duration: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub name: Option<String>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub default_start_time: Option<NaiveTime>,
    pub default_duration: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewMemberData {
    pub family_id: Uuid,
    pub name: String,
    pub is_virtual: bool,
}

#[derive(Debug, Clone)]
pub struct NewDayTemplateData {
    pub family_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDayTemplateItem {
    pub task_id: Uuid,
    pub member_id: Option<Uuid>,
    pub override_time: Option<NaiveTime>,
    pub override_duration: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewWeekTemplateData {
    pub family_id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub apply_rule: Option<ApplyRule>,
    pub priority: i32,
}

/// Body of the override write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOverrideRequest {
    pub week_start_date: NaiveDate,
    pub task_overrides: Vec<TaskOverride>,
    /// `true`: atomically replace the week's override set.
    /// `false`: append after the existing overrides.
    #[serde(default)]
    pub replace_existing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_rule_matches_parity() {
        assert!(ApplyRule::EvenWeeks.matches(WeekParity::Even));
        assert!(!ApplyRule::EvenWeeks.matches(WeekParity::Odd));
        assert!(ApplyRule::OddWeeks.matches(WeekParity::Odd));
    }

    #[test]
    fn test_apply_rule_from_str() {
        assert_eq!("even".parse::<ApplyRule>(), Ok(ApplyRule::EvenWeeks));
        assert_eq!("ODD_WEEKS".parse::<ApplyRule>(), Ok(ApplyRule::OddWeeks));
        assert_eq!("odd-weeks".parse::<ApplyRule>(), Ok(ApplyRule::OddWeeks));
        assert!("weekly".parse::<ApplyRule>().is_err());
    }

    #[test]
    fn test_override_action_from_str() {
        assert_eq!("reassign".parse::<OverrideAction>(), Ok(OverrideAction::Reassign));
        assert!("move".parse::<OverrideAction>().is_err());
    }

    #[test]
    fn test_task_override_wire_format() {
        let task_id = Uuid::now_v7();
        let json = format!(
            r#"{{"assignedDate":"2025-08-18","taskId":"{}","action":"ADD","overrideTime":"19:30"}}"#,
            task_id
        );
        let parsed: TaskOverride = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.action, OverrideAction::Add);
        assert_eq!(parsed.override_time, NaiveTime::from_hms_opt(19, 30, 0));
        assert_eq!(parsed.new_member_id, None);

        let malformed = json.replace("ADD", "MOVE");
        assert!(serde_json::from_str::<TaskOverride>(&malformed).is_err());
    }

    #[test]
    fn test_resolved_task_effective_values() {
        let task = Task {
            default_start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            default_duration: 30,
            ..Default::default()
        };
        let mut resolved = ResolvedTask {
            task_id: task.id,
            member_id: None,
            override_time: None,
            override_duration: None,
            source: TaskSource::Template,
            task,
            member: None,
        };
        assert_eq!(resolved.effective_start_time(), NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(resolved.effective_duration(), 30);

        resolved.override_time = NaiveTime::from_hms_opt(7, 15, 0);
        resolved.override_duration = Some(10);
        assert_eq!(resolved.effective_start_time(), NaiveTime::from_hms_opt(7, 15, 0).unwrap());
        assert_eq!(resolved.effective_duration(), 10);
    }
}
