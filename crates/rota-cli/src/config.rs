use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use rota_core::fairness::SplitOptions;
use rota_core::sync::SyncConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timezone::detect_system_timezone;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    /// Family every command operates on
    pub family_id: Uuid,
    /// "Me" for `rota status`; name or ID prefix
    pub member: Option<String>,
    /// IANA name used to decide what "today" and "now" are
    pub timezone: String,
    /// Used when `RUST_LOG` is unset
    pub log_filter: String,
    pub schedule: ScheduleConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub fairness_window_weeks: u32,
    pub prefetch_radius: u32,
    pub retention_radius: u32,
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "rota.db".to_string(),
            family_id: Uuid::nil(),
            member: None,
            timezone: detect_system_timezone(),
            log_filter: "rota=warn".to_string(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            fairness_window_weeks: SplitOptions::default().window_weeks,
            prefetch_radius: sync.prefetch_radius,
            retention_radius: sync.retention_radius,
            event_capacity: sync.event_capacity,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Defaults, then `rota.toml`, then `ROTA_*` variables
    /// (`ROTA_SCHEDULE__PREFETCH_RADIUS` for nested keys).
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("rota.toml"))
            .merge(Env::prefixed("ROTA_").split("__"))
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            window_weeks: self.schedule.fairness_window_weeks,
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            prefetch_radius: self.schedule.prefetch_radius,
            retention_radius: self.schedule.retention_radius,
            event_capacity: self.schedule.event_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::new()?;
            assert_eq!(config.database_path, "rota.db");
            assert_eq!(config.family_id, Uuid::nil());
            assert_eq!(config.schedule.fairness_window_weeks, 4);
            assert_eq!(config.sync_config(), SyncConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "rota.toml",
                r#"
                    database_path = "house.db"
                    member = "alice"

                    [schedule]
                    fairness_window_weeks = 8
                "#,
            )?;
            jail.set_env("ROTA_DATABASE_PATH", "/tmp/override.db");
            jail.set_env("ROTA_SCHEDULE__PREFETCH_RADIUS", "2");

            let config = Config::new()?;
            assert_eq!(config.database_path, "/tmp/override.db");
            assert_eq!(config.member.as_deref(), Some("alice"));
            assert_eq!(config.split_options().window_weeks, 8);
            assert_eq!(config.schedule.prefetch_radius, 2);
            Ok(())
        });
    }
}
