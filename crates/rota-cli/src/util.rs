use anyhow::{anyhow, Result};
use rota_core::error::CoreError;
use rota_core::models::{DayTemplate, Member, Task, WeekTemplate};
use rota_core::repository::{MemberRepository, TaskRepository, TemplateRepository};
use uuid::Uuid;

/// Anything addressable by name or short ID on the command line.
pub trait Named {
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn id(&self) -> Uuid {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named!(Task, Member, DayTemplate, WeekTemplate);

/// Picks one item by exact name (case-insensitive), full ID or ID prefix of
/// at least two characters.
pub fn pick<'a, T: Named>(items: &'a [T], needle: &str, kind: &str) -> Result<&'a T> {
    let needle = needle.trim();
    let lower = needle.to_lowercase();

    let by_name: Vec<&T> = items.iter().filter(|i| i.name().to_lowercase() == lower).collect();
    if by_name.len() == 1 {
        return Ok(by_name[0]);
    }

    let candidates: Vec<&T> = if by_name.len() > 1 {
        by_name
    } else if needle.len() >= 2 {
        items
            .iter()
            .filter(|i| i.id().to_string().starts_with(&lower))
            .collect()
    } else {
        Vec::new()
    };

    match candidates.as_slice() {
        [one] => Ok(*one),
        [] => Err(anyhow!(CoreError::NotFound(format!(
            "No {} found matching '{}'",
            kind, needle
        )))),
        many => Err(anyhow!(CoreError::AmbiguousId(
            many.iter()
                .map(|i| (i.id().to_string(), i.name().to_string()))
                .collect()
        ))),
    }
}

pub async fn resolve_task(repo: &impl TaskRepository, family_id: Uuid, needle: &str) -> Result<Task> {
    let tasks = repo.find_tasks(family_id, true).await?;
    pick(&tasks, needle, "task").cloned()
}

pub async fn resolve_member(repo: &impl MemberRepository, family_id: Uuid, needle: &str) -> Result<Member> {
    let members = repo.find_members(family_id).await?;
    pick(&members, needle, "member").cloned()
}

pub async fn resolve_day_template(
    repo: &impl TemplateRepository,
    family_id: Uuid,
    needle: &str,
) -> Result<DayTemplate> {
    let templates = repo.find_day_templates(family_id).await?;
    pick(&templates, needle, "day template").cloned()
}

pub async fn resolve_week_template(
    repo: &impl TemplateRepository,
    family_id: Uuid,
    needle: &str,
) -> Result<WeekTemplate> {
    let templates = repo.find_week_templates(family_id).await?;
    pick(&templates, needle, "week template").cloned()
}

pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}
