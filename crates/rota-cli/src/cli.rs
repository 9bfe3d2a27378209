use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rota_core::models::{ApplyRule, OverrideAction};

/// Rota: weekly household chore schedules with per-date overrides
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage tasks
    Task(TaskCommand),
    /// Manage family members
    Member(MemberCommand),
    /// Manage day templates
    Day(DayCommand),
    /// Manage week templates
    Week(WeekCommand),
    /// Apply or revert overrides for a week
    Override(OverrideCommand),
    /// Show the resolved schedule of a week
    Schedule(ScheduleCommand),
    /// Show the shifts of a day
    Shifts(ShiftsCommand),
    /// Show how task minutes are split between members
    Split(SplitCommand),
    /// Show a member's current and next shift
    Status(StatusCommand),
    /// Browse weeks interactively
    Browse(BrowseCommand),
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Parser, Debug, Clone)]
pub struct TaskCommand {
    #[command(subcommand)]
    pub command: TaskSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskSubcommand {
    /// Add a new task
    Add(AddTaskCommand),
    /// List tasks
    List(ListTasksCommand),
    /// Edit a task
    Edit(EditTaskCommand),
    /// Deactivate a task; existing assignments keep showing it
    Deactivate(DeactivateTaskCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddTaskCommand {
    /// The name of the task
    pub name: String,
    /// Default start time (HH:MM, 24h)
    #[arg(long, default_value = "09:00")]
    pub at: String,
    /// Default duration in minutes
    #[arg(long, default_value_t = 30)]
    pub duration: i32,
    #[arg(long)]
    pub icon: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListTasksCommand {
    /// Include deactivated tasks
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EditTaskCommand {
    /// Task name or ID prefix
    pub task: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub at: Option<String>,

    #[arg(long)]
    pub duration: Option<i32>,

    #[arg(long)]
    pub icon: Option<String>,
    #[arg(long, conflicts_with = "icon")]
    pub icon_clear: bool,

    #[arg(long)]
    pub color: Option<String>,
    #[arg(long, conflicts_with = "color")]
    pub color_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeactivateTaskCommand {
    /// Task name or ID prefix
    pub task: String,
}

// ============================================================================
// Members
// ============================================================================

#[derive(Parser, Debug, Clone)]
pub struct MemberCommand {
    #[command(subcommand)]
    pub command: MemberSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum MemberSubcommand {
    /// Add a family member
    Add(AddMemberCommand),
    /// List family members
    List,
}

#[derive(Parser, Debug, Clone)]
pub struct AddMemberCommand {
    pub name: String,
    /// Takes assignments but is left out of fairness statistics
    #[arg(long = "virtual")]
    pub is_virtual: bool,
}

// ============================================================================
// Templates
// ============================================================================

#[derive(Parser, Debug, Clone)]
pub struct DayCommand {
    #[command(subcommand)]
    pub command: DaySubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DaySubcommand {
    /// Create a day template
    Add(AddDayCommand),
    /// Append a task to a day template
    Item(AddDayItemCommand),
    /// Remove an item from a day template
    Unitem(RemoveDayItemCommand),
    /// List day templates with their items
    List,
}

#[derive(Parser, Debug, Clone)]
pub struct AddDayCommand {
    pub name: String,
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AddDayItemCommand {
    /// Day template name or ID prefix
    pub day: String,
    /// Task name or ID prefix
    pub task: String,
    /// Member name or ID prefix; unassigned when omitted
    #[arg(short, long)]
    pub member: Option<String>,
    /// Start time override (HH:MM)
    #[arg(long)]
    pub at: Option<String>,
    /// Duration override in minutes
    #[arg(long)]
    pub duration: Option<i32>,
}

#[derive(Parser, Debug, Clone)]
pub struct RemoveDayItemCommand {
    /// Day template name or ID prefix
    pub day: String,
    /// 1-based position of the item as shown by `day list`
    pub position: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct WeekCommand {
    #[command(subcommand)]
    pub command: WeekSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum WeekSubcommand {
    /// Create a week template
    Add(AddWeekCommand),
    /// Assign a day template to a weekday
    SetDay(SetWeekDayCommand),
    /// Clear a weekday slot
    ClearDay(ClearWeekDayCommand),
    /// List week templates
    List,
}

#[derive(Parser, Debug, Clone)]
pub struct AddWeekCommand {
    pub name: String,
    /// Fallback template when no other template applies
    #[arg(long)]
    pub default: bool,
    /// Only apply in even or odd ISO weeks
    #[arg(long, value_enum)]
    pub rule: Option<RuleArg>,
    /// Higher priority wins
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub priority: i32,
}

#[derive(Parser, Debug, Clone)]
pub struct SetWeekDayCommand {
    /// Week template name or ID prefix
    pub week: String,
    /// Weekday (mon, tue, ... or monday, tuesday, ...)
    pub weekday: String,
    /// Day template name or ID prefix
    pub day: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ClearWeekDayCommand {
    pub week: String,
    pub weekday: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleArg {
    Even,
    Odd,
}

impl From<RuleArg> for ApplyRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Even => ApplyRule::EvenWeeks,
            RuleArg::Odd => ApplyRule::OddWeeks,
        }
    }
}

// ============================================================================
// Overrides
// ============================================================================

#[derive(Parser, Debug, Clone)]
pub struct OverrideCommand {
    #[command(subcommand)]
    pub command: OverrideSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum OverrideSubcommand {
    /// Apply one override, or a batch from a JSON file
    Apply(ApplyOverrideCommand),
    /// Drop all overrides of a week
    Revert(RevertOverrideCommand),
    /// Show the stored overrides of a week
    Show(ShowOverrideCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ApplyOverrideCommand {
    /// JSON file holding an `applyOverride` request body
    #[arg(long, conflicts_with_all = ["action", "date", "task"])]
    pub file: Option<PathBuf>,

    #[arg(long, value_enum, required_unless_present = "file")]
    pub action: Option<ActionArg>,
    /// Date of the override (e.g. 2025-08-19, "next tuesday")
    #[arg(long, required_unless_present = "file")]
    pub date: Option<String>,
    /// Task name or ID prefix
    #[arg(long, required_unless_present = "file")]
    pub task: Option<String>,
    /// Member the change applies to (REMOVE, REASSIGN)
    #[arg(long)]
    pub from: Option<String>,
    /// Member receiving the task (ADD, REASSIGN)
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub at: Option<String>,
    #[arg(long)]
    pub duration: Option<i32>,

    /// Replace the week's overrides instead of appending
    #[arg(long)]
    pub replace: bool,
    /// Skip confirmation prompts
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RevertOverrideCommand {
    /// Any date in the week (defaults to this week)
    #[arg(long)]
    pub week: Option<String>,
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowOverrideCommand {
    #[arg(long)]
    pub week: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionArg {
    Add,
    Remove,
    Reassign,
}

impl From<ActionArg> for OverrideAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Add => OverrideAction::Add,
            ActionArg::Remove => OverrideAction::Remove,
            ActionArg::Reassign => OverrideAction::Reassign,
        }
    }
}

// ============================================================================
// Views
// ============================================================================

#[derive(Parser, Debug, Clone)]
pub struct ScheduleCommand {
    /// Any date in the week (defaults to this week)
    #[arg(long)]
    pub week: Option<String>,
    /// Print the resolved schedule as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ShiftsCommand {
    /// Defaults to today
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SplitCommand {
    /// Last week of the window (defaults to this week)
    #[arg(long)]
    pub week: Option<String>,
    /// Number of weeks in the window
    #[arg(long)]
    pub window: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusCommand {
    /// Member name or ID prefix (defaults to the configured member)
    #[arg(long)]
    pub member: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BrowseCommand {
    /// Week to start on (defaults to this week)
    #[arg(long)]
    pub week: Option<String>,
}
