use clap::Parser;
use owo_colors::{OwoColorize, Style};
use rota_core::db;
use rota_core::error::CoreError;
use rota_core::events::EventBus;
use rota_core::repository::SqliteRepository;
use rota_core::service::ScheduleService;
use tracing::debug;

mod cli;
mod commands;
mod config;
mod parser;
mod timezone;
mod util;
mod views;

use commands::Context;
use timezone::{normalize_timezone_input, ZonedClock};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, config).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli, config: config::Config) -> anyhow::Result<()> {
    let tz = normalize_timezone_input(&config.timezone)?;
    debug!(
        database = %config.database_path,
        family_id = %config.family_id,
        timezone = %tz,
        "opening schedule store"
    );
    let pool = db::establish_connection(&config.database_path).await?;
    let events = EventBus::new(config.schedule.event_capacity);

    let ctx = Context {
        service: ScheduleService::new(SqliteRepository::new(pool), events),
        config,
        clock: ZonedClock::new(tz),
    };

    match cli.command {
        cli::Commands::Task(command) => commands::task::task_command(&ctx, command.command).await,
        cli::Commands::Member(command) => {
            commands::member::member_command(&ctx, command.command).await
        }
        cli::Commands::Day(command) => commands::day::day_command(&ctx, command.command).await,
        cli::Commands::Week(command) => commands::week::week_command(&ctx, command.command).await,
        cli::Commands::Override(command) => {
            commands::overrides::override_command(&ctx, command.command).await
        }
        cli::Commands::Schedule(command) => commands::schedule::show_schedule(&ctx, command).await,
        cli::Commands::Shifts(command) => commands::schedule::show_shifts(&ctx, command).await,
        cli::Commands::Split(command) => commands::split::show_split(&ctx, command).await,
        cli::Commands::Status(command) => commands::status::show_status(&ctx, command).await,
        cli::Commands::Browse(command) => commands::browse::browse(&ctx, command).await,
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::AmbiguousId(matches) => {
                eprintln!("{}", "Error: Ambiguous name or ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, name) in matches {
                    eprintln!("  {} ({})", id.yellow(), name);
                }
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidOverride(violation) => {
                eprintln!("{} Override rejected, nothing was saved.", "Error:".style(error_style));
                match violation.index {
                    Some(index) => eprintln!(
                        "  override #{}, field {}: {}",
                        index + 1,
                        violation.field.yellow(),
                        violation.reason
                    ),
                    None => eprintln!("  field {}: {}", violation.field.yellow(), violation.reason),
                }
            }
            CoreError::ScheduleUnavailable(s) => {
                eprintln!(
                    "{} Schedule unavailable, try again: {}",
                    "Error:".style(error_style),
                    s
                );
            }
            _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
