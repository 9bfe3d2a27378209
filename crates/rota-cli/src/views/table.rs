use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use chrono_humanize::{HumanTime, Humanize};
use comfy_table::{Attribute, Cell, Color, Row, Table};
use rota_core::calendar::{self, format_clock_time, format_minute_of_day};
use rota_core::fairness::TaskSplit;
use rota_core::models::{
    DayTemplate, Member, OverrideAction, ResolvedWeekSchedule, Task, TaskSource, WeekOverride,
    WeekTemplate,
};
use rota_core::shifts::{Shift, ShiftStatus, ShiftSummary};
use uuid::Uuid;

use crate::util::short_id;

fn names<'a, I>(items: I) -> HashMap<Uuid, &'a str>
where
    I: IntoIterator<Item = (Uuid, &'a str)>,
{
    items.into_iter().collect()
}

fn name_or<'a>(lookup: &HashMap<Uuid, &'a str>, id: Option<Uuid>, missing: &'a str) -> &'a str {
    id.and_then(|id| lookup.get(&id).copied()).unwrap_or(missing)
}

pub fn display_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Starts", "Minutes", "Status"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(task.id)));

        let mut name = String::new();
        if let Some(icon) = &task.icon {
            name.push_str(icon);
            name.push(' ');
        }
        name.push_str(&task.name);
        let name_cell = if task.active {
            Cell::new(name)
        } else {
            Cell::new(name).add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey)
        };
        row.add_cell(name_cell);

        row.add_cell(Cell::new(format_clock_time(task.default_start_time)));
        row.add_cell(Cell::new(task.default_duration));
        row.add_cell(if task.active {
            Cell::new("active").fg(Color::Green)
        } else {
            Cell::new("inactive").fg(Color::DarkGrey)
        });
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_members(members: &[Member]) {
    if members.is_empty() {
        println!("No members found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Kind", "Joined"]);
    for member in members {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(member.id)));
        row.add_cell(Cell::new(&member.name));
        row.add_cell(if member.is_virtual {
            Cell::new("virtual").fg(Color::DarkGrey)
        } else {
            Cell::new("member")
        });
        row.add_cell(Cell::new(member.created_at.humanize()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_day_templates(templates: &[DayTemplate], tasks: &[Task], members: &[Member]) {
    if templates.is_empty() {
        println!("No day templates found.");
        return;
    }

    let task_names = names(tasks.iter().map(|t| (t.id, t.name.as_str())));
    let member_names = names(members.iter().map(|m| (m.id, m.name.as_str())));
    let task_defaults: HashMap<Uuid, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

    let mut table = Table::new();
    table.set_header(vec!["Template", "#", "Task", "Member", "Time", "Minutes"]);
    for template in templates {
        if template.items.is_empty() {
            table.add_row(vec![
                Cell::new(&template.name).add_attribute(Attribute::Bold),
                Cell::new("-"),
                Cell::new("(empty)").fg(Color::DarkGrey),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
            ]);
        }
        for (n, item) in template.items.iter().enumerate() {
            let default = task_defaults.get(&item.task_id);
            let time = item
                .override_time
                .or(default.map(|t| t.default_start_time))
                .map(format_clock_time)
                .unwrap_or_default();
            let minutes = item
                .override_duration
                .or(default.map(|t| t.default_duration))
                .map(|d| d.to_string())
                .unwrap_or_default();

            table.add_row(vec![
                if n == 0 {
                    Cell::new(&template.name).add_attribute(Attribute::Bold)
                } else {
                    Cell::new("")
                },
                Cell::new(n + 1),
                Cell::new(name_or(&task_names, Some(item.task_id), "(unknown task)")),
                Cell::new(name_or(&member_names, item.member_id, "unassigned")),
                Cell::new(time),
                Cell::new(minutes),
            ]);
        }
    }

    println!("{table}");
}

pub fn display_week_templates(templates: &[WeekTemplate], day_templates: &[DayTemplate]) {
    if templates.is_empty() {
        println!("No week templates found.");
        return;
    }

    let day_names = names(day_templates.iter().map(|d| (d.id, d.name.as_str())));

    let mut header = vec!["ID".to_string(), "Name".to_string(), "Rule".to_string(), "Prio".to_string()];
    // Monday first, as the schedule is shown
    let slots: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 0];
    for slot in &slots {
        if let Some(weekday) = calendar::weekday_from_day_of_week(*slot) {
            header.push(weekday.to_string());
        }
    }

    let mut table = Table::new();
    table.set_header(header);
    for template in templates {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(template.id)));
        let mut name = Cell::new(&template.name);
        if template.is_default {
            name = Cell::new(format!("{} (default)", template.name)).add_attribute(Attribute::Bold);
        }
        row.add_cell(name);
        row.add_cell(Cell::new(
            template.apply_rule.map_or("every week".to_string(), |r| r.to_string()),
        ));
        row.add_cell(Cell::new(template.priority));
        for slot in &slots {
            let day = template.day_template_for(*slot);
            row.add_cell(match day {
                Some(_) => Cell::new(name_or(&day_names, day, "?")),
                None => Cell::new("-").fg(Color::DarkGrey),
            });
        }
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_schedule(schedule: &ResolvedWeekSchedule, today: NaiveDate) {
    let base = schedule
        .base_template
        .as_ref()
        .map_or("no template".to_string(), |t| t.name.clone());
    println!(
        "Week of {} ({}){}",
        schedule.week_start_date,
        base,
        if schedule.has_overrides { ", with overrides" } else { "" }
    );

    let mut table = Table::new();
    table.set_header(vec!["Day", "Time", "Task", "Member", "Minutes"]);

    for day in &schedule.days {
        let label = day.date.format("%a %d %b").to_string();
        let label_cell = if day.date == today {
            Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
        } else {
            Cell::new(label)
        };

        if day.tasks.is_empty() {
            table.add_row(vec![label_cell, Cell::new(""), Cell::new("-").fg(Color::DarkGrey), Cell::new(""), Cell::new("")]);
            continue;
        }

        let mut tasks: Vec<_> = day.tasks.iter().collect();
        tasks.sort_by_key(|t| t.effective_start_time());
        for (n, task) in tasks.into_iter().enumerate() {
            let mut task_cell = Cell::new(&task.task.name);
            if !task.is_task_active() {
                task_cell = task_cell.add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey);
            } else if task.source == TaskSource::Override {
                task_cell = task_cell.fg(Color::Yellow);
            }
            let member_cell = match (task.member_name(), task.member_id) {
                (Some(name), _) => Cell::new(name),
                (None, Some(id)) => Cell::new(short_id(id)).fg(Color::DarkGrey),
                (None, None) => Cell::new("unassigned").fg(Color::DarkGrey),
            };

            table.add_row(vec![
                if n == 0 { label_cell.clone() } else { Cell::new("") },
                Cell::new(format_clock_time(task.effective_start_time())),
                task_cell,
                member_cell,
                Cell::new(task.effective_duration()),
            ]);
        }
    }

    println!("{table}");
}

pub fn display_shifts(date: NaiveDate, shifts: &[Shift]) {
    if shifts.is_empty() {
        println!("No shifts on {}.", date);
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["From", "To", "Member", "Tasks"]);
    for shift in shifts {
        let tasks: Vec<&str> = shift.tasks().iter().map(|t| t.task.name.as_str()).collect();
        table.add_row(vec![
            Cell::new(format_minute_of_day(shift.start_minute())),
            Cell::new(format_minute_of_day(shift.end_minute())),
            match shift.member_name() {
                Some(name) => Cell::new(name),
                None => Cell::new("unassigned").fg(Color::DarkGrey),
            },
            Cell::new(tasks.join(", ")),
        ]);
    }

    println!("Shifts on {}", date.format("%A %Y-%m-%d"));
    println!("{table}");
}

pub fn display_split(split: &TaskSplit) {
    if let (Some(first), Some(last)) = (split.weeks.first(), split.weeks.last()) {
        println!("Task split for weeks {} to {}", first, calendar::week_end(*last));
    }

    if split.member_stats.is_empty() {
        println!("No members found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Member", "Tasks", "Minutes", "Share"]);
    for stat in &split.member_stats {
        table.add_row(vec![
            Cell::new(&stat.name),
            Cell::new(stat.task_count),
            Cell::new(stat.minutes),
            Cell::new(format!("{:.1}%", stat.share)),
        ]);
    }
    println!("{table}");

    let score_color = match split.fairness_score {
        s if s >= 80.0 => Color::Green,
        s if s >= 50.0 => Color::Yellow,
        _ => Color::Red,
    };
    let mut summary = Table::new();
    summary.add_row(vec![Cell::new("Total minutes"), Cell::new(split.total_minutes)]);
    summary.add_row(vec![Cell::new("Unassigned minutes"), Cell::new(split.unassigned_minutes)]);
    summary.add_row(vec![
        Cell::new("Average per member"),
        Cell::new(format!("{:.0}", split.average_minutes_per_member)),
    ]);
    summary.add_row(vec![
        Cell::new("Fairness"),
        Cell::new(format!("{:.0}/100", split.fairness_score)).fg(score_color),
    ]);
    println!("{summary}");
}

fn describe_shift(shift: &ShiftSummary) -> String {
    format!(
        "{} {}-{} ({})",
        shift.date.format("%a"),
        shift.start.format("%H:%M"),
        shift.end.format("%H:%M"),
        shift.task_names.join(", ")
    )
}

pub fn display_status(member: &Member, status: &ShiftStatus, now: NaiveDateTime) {
    match &status.current {
        Some(current) => println!(
            "{} is on duty: {}, ends {}",
            member.name,
            describe_shift(current),
            HumanTime::from(current.end - now)
        ),
        None => println!("{} is off duty.", member.name),
    }
    match &status.next {
        Some(next) => println!(
            "Next shift: {}, {}",
            describe_shift(next),
            HumanTime::from(next.start - now)
        ),
        None => println!("No more shifts this week."),
    }
}

pub fn display_overrides(week_override: Option<&WeekOverride>, tasks: &[Task], members: &[Member]) {
    let overrides = match week_override {
        Some(o) if !o.task_overrides.is_empty() => o,
        _ => {
            println!("No overrides for this week.");
            return;
        }
    };

    let task_names = names(tasks.iter().map(|t| (t.id, t.name.as_str())));
    let member_names = names(members.iter().map(|m| (m.id, m.name.as_str())));

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Action", "Task", "From", "To", "Time", "Minutes"]);
    for (n, o) in overrides.task_overrides.iter().enumerate() {
        let action = Cell::new(o.action).fg(match o.action {
            OverrideAction::Add => Color::Green,
            OverrideAction::Remove => Color::Red,
            OverrideAction::Reassign => Color::Yellow,
        });
        table.add_row(vec![
            Cell::new(n + 1),
            Cell::new(o.assigned_date.format("%a %Y-%m-%d")),
            action,
            Cell::new(name_or(&task_names, Some(o.task_id), "(unknown task)")),
            Cell::new(name_or(&member_names, o.original_member_id, "-")),
            Cell::new(name_or(&member_names, o.new_member_id, "-")),
            Cell::new(o.override_time.map(format_clock_time).unwrap_or_default()),
            Cell::new(o.override_duration.map(|d| d.to_string()).unwrap_or_default()),
        ]);
    }

    println!("Overrides for week of {}", overrides.week_start_date);
    println!("{table}");
}
