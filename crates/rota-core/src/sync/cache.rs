//! Keyed cache of resolved weeks with an explicit per-entry state machine.
//!
//! ```text
//! absent -> loading -> present -> stale -> loading -> present ...
//!              \-> failed (no data)    \-> stale (fetch failed, data kept)
//! ```
//!
//! The cache does no I/O. Fetches are represented by [`FetchTicket`]s and a
//! response is committed only while its ticket is the latest one issued for
//! that week; anything superseded, invalidated or abandoned is discarded.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar;
use crate::models::ResolvedWeekSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Loading,
    Present,
    Stale,
    Failed,
}

/// What a reader sees for one week.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead {
    Absent,
    /// A fetch is in flight; `previous` is the last data held for this week
    Loading {
        previous: Option<Arc<ResolvedWeekSchedule>>,
    },
    Present(Arc<ResolvedWeekSchedule>),
    /// Known-outdated data. `error` is set when the refresh itself failed.
    Stale {
        schedule: Arc<ResolvedWeekSchedule>,
        error: Option<String>,
    },
    /// The fetch failed and there is nothing to show.
    Failed { error: String },
}

impl CacheRead {
    pub fn schedule(&self) -> Option<&Arc<ResolvedWeekSchedule>> {
        match self {
            CacheRead::Present(schedule) | CacheRead::Stale { schedule, .. } => Some(schedule),
            CacheRead::Loading { previous } => previous.as_ref(),
            CacheRead::Absent | CacheRead::Failed { .. } => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CacheRead::Loading { .. })
    }
}

/// Identifies one fetch of one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub week: NaiveDate,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidate {
    Week(NaiveDate),
    All,
}

#[derive(Debug, Clone)]
struct Entry {
    state: EntryState,
    schedule: Option<Arc<ResolvedWeekSchedule>>,
    error: Option<String>,
    inflight: Option<u64>,
}

impl Entry {
    fn read(&self) -> CacheRead {
        match (self.state, &self.schedule) {
            (EntryState::Loading, previous) => CacheRead::Loading {
                previous: previous.clone(),
            },
            (EntryState::Present, Some(schedule)) => CacheRead::Present(schedule.clone()),
            (EntryState::Stale, Some(schedule)) => CacheRead::Stale {
                schedule: schedule.clone(),
                error: self.error.clone(),
            },
            (EntryState::Failed, _) | (_, None) => CacheRead::Failed {
                error: self.error.clone().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct WeekCache {
    entries: BTreeMap<NaiveDate, Entry>,
    generation: u64,
}

impl WeekCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, week: NaiveDate) -> CacheRead {
        self.entries
            .get(&calendar::week_start_of(week))
            .map_or(CacheRead::Absent, Entry::read)
    }

    pub fn state(&self, week: NaiveDate) -> Option<EntryState> {
        self.entries.get(&calendar::week_start_of(week)).map(|e| e.state)
    }

    pub fn is_loading(&self, week: NaiveDate) -> bool {
        self.state(week) == Some(EntryState::Loading)
    }

    /// Moves the week to `loading` and issues the ticket its response must
    /// present. Any earlier ticket for the week stops being accepted.
    pub fn begin_fetch(&mut self, week: NaiveDate) -> FetchTicket {
        let week = calendar::week_start_of(week);
        self.generation += 1;
        let generation = self.generation;

        let entry = self.entries.entry(week).or_insert(Entry {
            state: EntryState::Loading,
            schedule: None,
            error: None,
            inflight: None,
        });
        entry.state = EntryState::Loading;
        entry.error = None;
        entry.inflight = Some(generation);

        debug!(%week, generation, "cache entry loading");
        FetchTicket { week, generation }
    }

    fn current_entry(&mut self, ticket: FetchTicket) -> Option<&mut Entry> {
        self.entries
            .get_mut(&ticket.week)
            .filter(|e| e.inflight == Some(ticket.generation))
    }

    /// Commits a fetched schedule. Returns `false` when the ticket is no
    /// longer the latest request for its week.
    pub fn complete(&mut self, ticket: FetchTicket, schedule: ResolvedWeekSchedule) -> bool {
        let Some(entry) = self.current_entry(ticket) else {
            debug!(week = %ticket.week, generation = ticket.generation, "discarding superseded response");
            return false;
        };
        entry.state = EntryState::Present;
        entry.schedule = Some(Arc::new(schedule));
        entry.error = None;
        entry.inflight = None;
        true
    }

    /// Records a failed fetch. Existing data is kept and served as stale.
    pub fn fail(&mut self, ticket: FetchTicket, error: impl Into<String>) -> bool {
        let Some(entry) = self.current_entry(ticket) else {
            return false;
        };
        entry.state = if entry.schedule.is_some() {
            EntryState::Stale
        } else {
            EntryState::Failed
        };
        entry.error = Some(error.into());
        entry.inflight = None;
        true
    }

    /// Forgets a cancelled fetch: data already held goes back to stale, an
    /// entry without data disappears.
    pub fn abandon(&mut self, ticket: FetchTicket) -> bool {
        let Some(entry) = self.current_entry(ticket) else {
            return false;
        };
        if entry.schedule.is_some() {
            entry.state = EntryState::Stale;
            entry.inflight = None;
        } else {
            self.entries.remove(&ticket.week);
        }
        true
    }

    /// Stores a schedule directly, superseding any fetch in flight.
    pub fn set(&mut self, schedule: ResolvedWeekSchedule) {
        let week = calendar::week_start_of(schedule.week_start_date);
        self.entries.insert(
            week,
            Entry {
                state: EntryState::Present,
                schedule: Some(Arc::new(schedule)),
                error: None,
                inflight: None,
            },
        );
    }

    /// Marks one week outdated and returns the state it was in.
    ///
    /// A fetch in flight may have started before the change, so it is
    /// superseded as well; the caller decides whether to restart it.
    pub fn mark_stale(&mut self, week: NaiveDate) -> Option<EntryState> {
        let week = calendar::week_start_of(week);
        let entry = self.entries.get_mut(&week)?;
        let previous = entry.state;

        match previous {
            EntryState::Present => entry.state = EntryState::Stale,
            EntryState::Loading => {
                entry.inflight = None;
                if entry.schedule.is_some() {
                    entry.state = EntryState::Stale;
                } else {
                    self.entries.remove(&week);
                }
            }
            EntryState::Stale | EntryState::Failed => {}
        }
        debug!(%week, ?previous, "cache entry marked stale");
        Some(previous)
    }

    /// [`mark_stale`](Self::mark_stale) for every cached week.
    pub fn mark_all_stale(&mut self) -> Vec<(NaiveDate, EntryState)> {
        let weeks = self.weeks();
        weeks
            .into_iter()
            .filter_map(|week| self.mark_stale(week).map(|previous| (week, previous)))
            .collect()
    }

    /// Drops entries; pending responses for them will be discarded.
    /// Returns how many entries were removed.
    pub fn invalidate(&mut self, scope: Invalidate) -> usize {
        match scope {
            Invalidate::Week(week) => {
                usize::from(self.entries.remove(&calendar::week_start_of(week)).is_some())
            }
            Invalidate::All => {
                let removed = self.entries.len();
                self.entries.clear();
                debug!(removed, "cache cleared");
                removed
            }
        }
    }

    /// Drops every entry outside `start..=end` (week starts) that has no
    /// fetch in flight. Returns how many entries were removed.
    pub fn retain_window(&mut self, start: NaiveDate, end: NaiveDate) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|week, entry| (start..=end).contains(week) || entry.inflight.is_some());
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(%start, %end, evicted, "evicted weeks outside the window");
        }
        evicted
    }

    /// Cached weeks in ascending order.
    pub fn weeks(&self) -> Vec<NaiveDate> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
