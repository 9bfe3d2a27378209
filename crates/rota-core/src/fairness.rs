//! Fairness Analyzer: how evenly task minutes are spread over the real
//! members of a family across a trailing window of weeks.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Member, ResolvedWeekSchedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOptions {
    pub window_weeks: u32,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self { window_weeks: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStat {
    pub member_id: Uuid,
    pub name: String,
    pub minutes: i64,
    pub task_count: usize,
    /// Percentage of the minutes done by real members
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSplit {
    /// Week starts covered, oldest first
    pub weeks: Vec<NaiveDate>,
    /// Real members only, in member order
    pub member_stats: Vec<MemberStat>,
    /// All resolved minutes, unassigned and virtual members included
    pub total_minutes: i64,
    pub unassigned_minutes: i64,
    pub average_minutes_per_member: f64,
    pub fairness_score: f64,
}

/// Aggregates resolved weeks into per-member statistics.
pub fn compute_task_split(weeks: &[ResolvedWeekSchedule], members: &[Member]) -> TaskSplit {
    let mut minutes: HashMap<Uuid, (i64, usize)> = HashMap::new();
    let mut total_minutes = 0i64;
    let mut unassigned_minutes = 0i64;

    for task in weeks.iter().flat_map(|w| w.tasks()) {
        let duration = i64::from(task.effective_duration());
        total_minutes += duration;
        match task.member_id {
            Some(member_id) => {
                let entry = minutes.entry(member_id).or_default();
                entry.0 += duration;
                entry.1 += 1;
            }
            None => unassigned_minutes += duration,
        }
    }

    let real: Vec<&Member> = members.iter().filter(|m| !m.is_virtual).collect();
    let real_minutes: Vec<i64> = real
        .iter()
        .map(|m| minutes.get(&m.id).map_or(0, |(min, _)| *min))
        .collect();
    let real_total: i64 = real_minutes.iter().sum();

    let member_stats = real
        .iter()
        .zip(&real_minutes)
        .map(|(member, &member_minutes)| MemberStat {
            member_id: member.id,
            name: member.name.clone(),
            minutes: member_minutes,
            task_count: minutes.get(&member.id).map_or(0, |(_, count)| *count),
            share: if real_total > 0 {
                member_minutes as f64 * 100.0 / real_total as f64
            } else {
                0.0
            },
        })
        .collect();

    let average_minutes_per_member = if real.is_empty() {
        0.0
    } else {
        total_minutes as f64 / real.len() as f64
    };

    let mut covered: Vec<NaiveDate> = weeks.iter().map(|w| w.week_start_date).collect();
    covered.sort();
    covered.dedup();

    TaskSplit {
        weeks: covered,
        member_stats,
        total_minutes,
        unassigned_minutes,
        average_minutes_per_member,
        fairness_score: fairness_score(&real_minutes),
    }
}

/// Scores an allocation of minutes on 0 to 100.
///
/// `100 × (1 − cv / √(n − 1))` where `cv` is the population coefficient of
/// variation. `cv / √(n − 1)` is 0 for an equal split and 1 when one member
/// does everything, so the score spans the full range for any group size.
/// Fewer than two members, or no minutes at all, score 100.
pub fn fairness_score(minutes: &[i64]) -> f64 {
    let n = minutes.len();
    let total: i64 = minutes.iter().sum();
    if n <= 1 || total <= 0 {
        return 100.0;
    }

    let n_f = n as f64;
    let mean = total as f64 / n_f;
    let variance = minutes
        .iter()
        .map(|&m| {
            let diff = m as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n_f;
    let cv = variance.sqrt() / mean;
    let normalized = cv / (n_f - 1.0).sqrt();

    (100.0 * (1.0 - normalized)).clamp(0.0, 100.0)
}
