//! Client Cache & Sync Layer.
//!
//! [`ScheduleSync`] keeps a rolling window of resolved weeks fresh for one
//! family. Reads are served from the [`WeekCache`] without waiting; misses
//! and refreshes run as background tokio tasks whose completion bumps a
//! revision counter that views watch to re-render. Push events mark weeks
//! stale or clear the cache, see [`ScheduleSync::handle_event`].

pub mod cache;

pub use cache::{CacheRead, EntryState, FetchTicket, Invalidate, WeekCache};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calendar;
use crate::error::CoreError;
use crate::events::{EventScope, ScheduleEvent};
use crate::models::ResolvedWeekSchedule;

/// Source of resolved weeks, usually a [`ScheduleService`](crate::service::ScheduleService).
#[async_trait]
pub trait WeekFetcher: Send + Sync {
    async fn fetch_week(&self, family_id: Uuid, week_start: NaiveDate) -> Result<ResolvedWeekSchedule, CoreError>;
}

#[async_trait]
impl<T: WeekFetcher + ?Sized> WeekFetcher for Arc<T> {
    async fn fetch_week(&self, family_id: Uuid, week_start: NaiveDate) -> Result<ResolvedWeekSchedule, CoreError> {
        (**self).fetch_week(family_id, week_start).await
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Weeks on each side of the displayed week that are prefetched and
    /// whose fetches survive navigation
    pub prefetch_radius: u32,
    /// Weeks on each side of the displayed week kept in the cache; entries
    /// further away are evicted on navigation. Never less than the prefetch
    /// radius.
    pub retention_radius: u32,
    /// Buffer of the push-event channel
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            prefetch_radius: 1,
            retention_radius: 8,
            event_capacity: 100,
        }
    }
}

/// What to render for one week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekView {
    pub week_start: NaiveDate,
    pub read: CacheRead,
    /// The previously shown schedule, kept on screen while this week has
    /// nothing to show yet
    pub placeholder: Option<Arc<ResolvedWeekSchedule>>,
}

impl WeekView {
    /// The schedule to draw: this week's data if any, else the placeholder.
    pub fn visible(&self) -> Option<&Arc<ResolvedWeekSchedule>> {
        self.read.schedule().or(self.placeholder.as_ref())
    }
}

#[derive(Default)]
struct SyncState {
    cache: WeekCache,
    displayed: Option<NaiveDate>,
    last_shown: Option<Arc<ResolvedWeekSchedule>>,
    inflight: HashMap<NaiveDate, (FetchTicket, JoinHandle<()>)>,
}

struct Inner<F> {
    family_id: Uuid,
    fetcher: F,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    state: Mutex<SyncState>,
    revision: watch::Sender<u64>,
}

/// Cache-first view of a family's weeks. Cheap to clone; clones share state.
///
/// Every method that may start a fetch must be called inside a tokio
/// runtime.
pub struct ScheduleSync<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for ScheduleSync<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: WeekFetcher + 'static> ScheduleSync<F> {
    pub fn new(family_id: Uuid, fetcher: F, config: SyncConfig) -> Self {
        Self::with_clock(family_id, fetcher, config, Arc::new(SystemClock))
    }

    pub fn with_clock(family_id: Uuid, fetcher: F, config: SyncConfig, clock: Arc<dyn Clock>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                family_id,
                fetcher,
                clock,
                config,
                state: Mutex::new(SyncState::default()),
                revision,
            }),
        }
    }

    pub fn family_id(&self) -> Uuid {
        self.inner.family_id
    }

    pub fn config(&self) -> SyncConfig {
        self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|r| *r += 1);
    }

    /// Cache-first read. A miss starts a fetch and reports `Loading`; stale
    /// data is returned as [`CacheRead::Stale`] while a refresh runs.
    pub fn get(&self, week: NaiveDate) -> CacheRead {
        let week = calendar::week_start_of(week);
        let mut state = self.lock();
        let read = state.cache.read(week);
        match read {
            CacheRead::Absent => {
                self.spawn_fetch(&mut state, week);
                state.cache.read(week)
            }
            CacheRead::Stale { .. } => {
                self.spawn_fetch(&mut state, week);
                read
            }
            _ => read,
        }
    }

    /// Forces a fetch of `week`, whatever its state.
    pub fn refresh(&self, week: NaiveDate) {
        let week = calendar::week_start_of(week);
        let mut state = self.lock();
        self.restart_fetch(&mut state, week);
        drop(state);
        self.bump();
    }

    /// Makes `week` the displayed week.
    ///
    /// Present data is served without a fetch. Otherwise a fetch starts and
    /// the previously shown schedule is offered as placeholder. Adjacent
    /// weeks within the prefetch radius are loaded in the background and
    /// fetches outside it are cancelled. Cached weeks beyond the retention
    /// radius are evicted.
    pub fn navigate(&self, week: NaiveDate) -> WeekView {
        let week = calendar::week_start_of(week);
        let radius = i64::from(self.inner.config.prefetch_radius);
        let mut state = self.lock();
        state.displayed = Some(week);

        match state.cache.read(week) {
            CacheRead::Present(_) | CacheRead::Loading { .. } => {}
            CacheRead::Absent | CacheRead::Stale { .. } | CacheRead::Failed { .. } => {
                self.spawn_fetch(&mut state, week);
            }
        }

        for offset in 1..=radius {
            for adjacent in [calendar::shift_weeks(week, -offset), calendar::shift_weeks(week, offset)] {
                if state.cache.read(adjacent) == CacheRead::Absent {
                    self.spawn_fetch(&mut state, adjacent);
                }
            }
        }

        let window_start = calendar::shift_weeks(week, -radius);
        let window_end = calendar::shift_weeks(week, radius);
        let outside: Vec<NaiveDate> = state
            .inflight
            .keys()
            .copied()
            .filter(|w| *w < window_start || *w > window_end)
            .collect();
        for stray in outside {
            self.cancel_fetch(&mut state, stray);
        }

        let retain = i64::from(self.inner.config.retention_radius.max(self.inner.config.prefetch_radius));
        state
            .cache
            .retain_window(calendar::shift_weeks(week, -retain), calendar::shift_weeks(week, retain));

        let view = Self::view_of(&mut state, week);
        drop(state);
        self.bump();
        view
    }

    pub fn navigate_today(&self) -> WeekView {
        self.navigate(self.inner.clock.today())
    }

    pub fn navigate_by(&self, weeks: i64) -> WeekView {
        let current = self
            .displayed()
            .unwrap_or_else(|| calendar::week_start_of(self.inner.clock.today()));
        self.navigate(calendar::shift_weeks(current, weeks))
    }

    pub fn displayed(&self) -> Option<NaiveDate> {
        self.lock().displayed
    }

    /// The displayed week as it stands now, without starting anything.
    pub fn view(&self) -> Option<WeekView> {
        let mut state = self.lock();
        let week = state.displayed?;
        Some(Self::view_of(&mut state, week))
    }

    fn view_of(state: &mut SyncState, week: NaiveDate) -> WeekView {
        let read = state.cache.read(week);
        let placeholder = match &read {
            CacheRead::Present(schedule) | CacheRead::Stale { schedule, .. } => {
                state.last_shown = Some(Arc::clone(schedule));
                None
            }
            CacheRead::Loading { previous: Some(previous) } => {
                state.last_shown = Some(Arc::clone(previous));
                None
            }
            CacheRead::Loading { previous: None } | CacheRead::Absent | CacheRead::Failed { .. } => {
                state.last_shown.clone()
            }
        };
        WeekView {
            week_start: week,
            read,
            placeholder,
        }
    }

    /// Applies one push event.
    ///
    /// - a single week: the entry goes stale; it is refetched now if it is
    ///   displayed or was loading, else on the next navigation to it
    /// - ambiguous: every entry goes stale, same refetch rule
    /// - global: the cache is emptied and only the displayed week refetched
    ///
    /// Events of other families are ignored.
    pub fn handle_event(&self, event: &ScheduleEvent) {
        if event.family_id() != self.inner.family_id {
            debug!(event = event.name(), "ignoring event for another family");
            return;
        }

        let scope = event.scope();
        debug!(event = event.name(), ?scope, "schedule event");

        let mut state = self.lock();
        match scope {
            EventScope::Week(week) => {
                let previous = state.cache.mark_stale(week);
                if state.displayed == Some(week) || previous == Some(EntryState::Loading) {
                    self.restart_fetch(&mut state, week);
                }
            }
            EventScope::Ambiguous => {
                for (week, previous) in state.cache.mark_all_stale() {
                    if state.displayed == Some(week) || previous == EntryState::Loading {
                        self.restart_fetch(&mut state, week);
                    }
                }
            }
            EventScope::Global => {
                self.clear(&mut state);
                if let Some(week) = state.displayed {
                    self.spawn_fetch(&mut state, week);
                }
            }
        }
        drop(state);
        self.bump();
    }

    /// Drops cached weeks without refetching; the next read of a dropped
    /// week reports `Loading`.
    pub fn invalidate(&self, scope: Invalidate) -> usize {
        let mut state = self.lock();
        let removed = match scope {
            Invalidate::Week(week) => {
                let week = calendar::week_start_of(week);
                self.cancel_fetch(&mut state, week);
                state.cache.invalidate(Invalidate::Week(week))
            }
            Invalidate::All => self.clear(&mut state),
        };
        drop(state);
        self.bump();
        removed
    }

    /// Consumes events until the channel closes. A lagged receiver may
    /// have missed anything, so lag is treated as a global change.
    pub fn listen(&self, mut events: broadcast::Receiver<ScheduleEvent>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => this.handle_event(&event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "event stream lagged, dropping cached weeks");
                        this.handle_event(&ScheduleEvent::WeekScheduleUpdated {
                            family_id: this.inner.family_id,
                            week_start: None,
                        });
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Revision counter, bumped after every change worth re-rendering.
    pub fn subscribe_updates(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn inflight(&self) -> Vec<NaiveDate> {
        let mut weeks: Vec<NaiveDate> = self.lock().inflight.keys().copied().collect();
        weeks.sort();
        weeks
    }

    /// Waits until no fetch is in flight.
    pub async fn wait_idle(&self) {
        let mut updates = self.subscribe_updates();
        loop {
            if self.lock().inflight.is_empty() {
                return;
            }
            if updates.changed().await.is_err() {
                return;
            }
        }
    }

    fn clear(&self, state: &mut SyncState) -> usize {
        for (_, (_, handle)) in state.inflight.drain() {
            handle.abort();
        }
        state.cache.invalidate(Invalidate::All)
    }

    fn cancel_fetch(&self, state: &mut SyncState, week: NaiveDate) {
        if let Some((ticket, handle)) = state.inflight.remove(&week) {
            handle.abort();
            state.cache.abandon(ticket);
            debug!(%week, "cancelled fetch");
        }
    }

    fn restart_fetch(&self, state: &mut SyncState, week: NaiveDate) {
        if let Some((_, handle)) = state.inflight.remove(&week) {
            handle.abort();
        }
        self.spawn_fetch(state, week);
    }

    fn spawn_fetch(&self, state: &mut SyncState, week: NaiveDate) {
        if state.inflight.contains_key(&week) {
            return;
        }
        let ticket = state.cache.begin_fetch(week);
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let result = this
                .inner
                .fetcher
                .fetch_week(this.inner.family_id, ticket.week)
                .await;
            this.finish(ticket, result);
        });
        state.inflight.insert(week, (ticket, handle));
    }

    fn finish(&self, ticket: FetchTicket, result: Result<ResolvedWeekSchedule, CoreError>) {
        let mut state = self.lock();
        if state
            .inflight
            .get(&ticket.week)
            .is_some_and(|(current, _)| *current == ticket)
        {
            state.inflight.remove(&ticket.week);
        }

        let committed = match result {
            Ok(schedule) => state.cache.complete(ticket, schedule),
            Err(err) => {
                warn!(week = %ticket.week, error = %err, "week fetch failed");
                state.cache.fail(ticket, err.to_string())
            }
        };
        drop(state);

        debug!(week = %ticket.week, committed, "fetch finished");
        self.bump();
    }
}
