use chrono::{NaiveDate, NaiveDateTime};
use rota_core::repository::SqliteRepository;
use rota_core::service::ScheduleService;
use rota_core::sync::Clock;
use uuid::Uuid;

use crate::config::Config;
use crate::timezone::ZonedClock;

pub mod browse;
pub mod day;
pub mod member;
pub mod overrides;
pub mod schedule;
pub mod split;
pub mod status;
pub mod task;
pub mod week;

/// Everything a command needs: the service over the opened database, the
/// loaded configuration and the household clock.
pub struct Context {
    pub service: ScheduleService<SqliteRepository>,
    pub config: Config,
    pub clock: ZonedClock,
}

impl Context {
    pub fn family_id(&self) -> Uuid {
        self.config.family_id
    }

    pub fn store(&self) -> &SqliteRepository {
        self.service.store()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}
