use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use crate::{
    models::{is_allowed_duration, ALLOWED_DURATIONS_MINUTES},
    settings::{SettingsStore, TimerSettings},
    store::{open_store, MemoryStore, SessionStore, StoreBackend},
    timer::{TimerController, TimerEvent, TimerStatus},
    utils::format::{format_minutes, format_mmss, render_progress_bar},
};

#[derive(Debug, Parser)]
#[command(name = "stillpoint", version, about = "Meditation session timer")]
pub struct Cli {
    /// Directory holding settings and session history.
    #[arg(long, env = "STILLPOINT_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "json", global = true)]
    pub backend: StoreBackend,

    /// Keep history in memory only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a session in the terminal (p = pause, r = resume, q = stop).
    Run {
        #[arg(short, long)]
        minutes: Option<u32>,
    },
    /// List completed sessions, newest first.
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show totals and the current streak.
    Stats,
    /// Show or change timer settings.
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub default_minutes: Option<u32>,
    #[arg(long)]
    pub tick_ms: Option<u64>,
    #[arg(long)]
    pub heartbeat_ticks: Option<u32>,
}

pub async fn execute(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;

    if let Command::Config(args) = &cli.command {
        return configure(&settings_store, args);
    }

    let settings = settings_store.timer().with_env_overrides();
    let store: Arc<dyn SessionStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::from(open_store(cli.backend, data_dir)?)
    };
    let controller = TimerController::new(store, &settings);

    match cli.command {
        Command::Run { minutes } => run_session(&controller, minutes).await,
        Command::History { limit } => {
            print_history(&controller, limit).await;
            Ok(())
        }
        Command::Stats => {
            print_stats(&controller).await;
            Ok(())
        }
        Command::Config(_) => Ok(()),
    }
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".stillpoint")
    })
}

fn configure(store: &SettingsStore, args: &ConfigArgs) -> Result<()> {
    let mut settings = store.timer();
    let changed =
        args.default_minutes.is_some() || args.tick_ms.is_some() || args.heartbeat_ticks.is_some();

    if let Some(minutes) = args.default_minutes {
        if !is_allowed_duration(minutes) {
            bail!("unsupported session length {minutes}; choose one of {ALLOWED_DURATIONS_MINUTES:?}");
        }
        settings.default_duration_minutes = minutes;
    }
    if let Some(tick_ms) = args.tick_ms {
        settings.tick_interval_ms = tick_ms;
    }
    if let Some(ticks) = args.heartbeat_ticks {
        settings.heartbeat_every_ticks = ticks;
    }

    if changed {
        store.update_timer(settings)?;
    }
    print_settings(&store.timer());
    Ok(())
}

fn print_settings(settings: &TimerSettings) {
    println!("default length : {} minutes", settings.default_duration_minutes);
    println!("tick interval  : {} ms", settings.tick_interval_ms);
    println!("heartbeat every: {} ticks", settings.heartbeat_every_ticks);
}

async fn run_session(controller: &TimerController, minutes: Option<u32>) -> Result<()> {
    if let Some(minutes) = minutes {
        if !controller.update_duration(minutes).await {
            bail!("unsupported session length {minutes}; choose one of {ALLOWED_DURATIONS_MINUTES:?}");
        }
    }

    let mut events = controller.subscribe();
    let started = controller.start().await?;
    let total = started.remaining_seconds;
    println!(
        "Sitting for {} minutes. p = pause, r = resume, q = stop",
        started.selected_duration_minutes
    );

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(TimerEvent::Heartbeat(snapshot)) => {
                    let remaining = Duration::from_secs_f64(snapshot.remaining_seconds);
                    let progress = if total > 0.0 { 1.0 - snapshot.remaining_seconds / total } else { 1.0 };
                    print!("\r{} {}", format_mmss(remaining), render_progress_bar(progress, 30));
                    std::io::stdout().flush().context("failed to flush stdout")?;
                }
                Ok(TimerEvent::SessionCompleted { record }) => {
                    println!("\nSession complete: {} minutes.", record.duration_minutes());
                }
                Ok(TimerEvent::PersistenceFailed { message }) => {
                    eprintln!("\nHistory could not be saved: {message}");
                }
                Ok(TimerEvent::StateChanged(snapshot)) => match snapshot.status {
                    TimerStatus::Idle => break,
                    TimerStatus::Paused => println!("\nPaused."),
                    TimerStatus::Running | TimerStatus::Completed => {}
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            line = input.next_line(), if stdin_open => match line? {
                Some(command) => match command.trim() {
                    "p" => {
                        if let Err(err) = controller.pause().await {
                            eprintln!("{err}");
                        }
                    }
                    "r" => {
                        if let Err(err) = controller.resume().await {
                            eprintln!("{err}");
                        }
                    }
                    "q" => {
                        controller.stop().await;
                        println!("\nStopped. This session was not recorded.");
                        break;
                    }
                    _ => {}
                },
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                controller.stop().await;
                println!("\nStopped. This session was not recorded.");
                break;
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

async fn print_history(controller: &TimerController, limit: usize) {
    let history = controller.history().await;
    if history.is_empty() {
        println!("No sessions yet.");
        return;
    }

    for record in history.iter().rev().take(limit) {
        println!(
            "{}  {:>3} min  {}",
            record.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            record.duration_minutes(),
            if record.completed { "completed" } else { "incomplete" }
        );
    }
}

async fn print_stats(controller: &TimerController) {
    let stats = controller.stats(Utc::now().date_naive()).await;
    println!("sessions      : {}", stats.total_sessions);
    println!("total time    : {}", format_minutes(stats.total_seconds));
    println!("longest       : {}", format_minutes(u64::from(stats.longest_session_seconds)));
    println!("today         : {}", stats.sessions_today);
    println!("streak        : {} days", stats.current_streak_days);
    if let Some(last) = stats.last_session_at {
        println!(
            "last session  : {}",
            last.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_minutes() {
        let cli = Cli::try_parse_from(["stillpoint", "--backend", "sqlite", "run", "-m", "15"]).unwrap();
        assert_eq!(cli.backend, StoreBackend::Sqlite);
        assert!(matches!(cli.command, Command::Run { minutes: Some(15) }));
    }

    #[test]
    fn test_configure_rejects_unknown_length() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let args = ConfigArgs {
            default_minutes: Some(8),
            tick_ms: None,
            heartbeat_ticks: None,
        };

        assert!(configure(&store, &args).is_err());
        assert_eq!(store.timer(), TimerSettings::default());
    }

    #[test]
    fn test_configure_persists_changes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let args = ConfigArgs {
            default_minutes: Some(20),
            tick_ms: Some(250),
            heartbeat_ticks: None,
        };

        configure(&store, &args).unwrap();
        let reopened = SettingsStore::new(path).unwrap().timer();
        assert_eq!(reopened.default_duration_minutes, 20);
        assert_eq!(reopened.tick_interval_ms, 250);
    }
}
