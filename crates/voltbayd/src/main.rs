//! voltbayd - The voltbay charging station service
//!
//! This is the main entry point for the kiosk backend.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Station engine and tick runtime
//! - Event logging and the optional operator console

mod console;

use anyhow::{Context, Result};
use clap::Parser;
use console::{ConsoleCommand, HELP, parse_line};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use voltbay_api::{Event, StationEvent, StationSnapshot};
use voltbay_config::load_config_or_default;
use voltbay_core::Station;
use voltbay_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use voltbay_util::{default_config_path, format_datetime_full};

/// voltbayd - State manager for a charging-station kiosk
#[derive(Parser, Debug)]
#[command(name = "voltbayd")]
#[command(about = "State manager for a charging-station kiosk", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/voltbay/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set VOLTBAY_DATA_DIR env var)
    #[arg(short, long, env = "VOLTBAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Read operator commands from stdin
    #[arg(long)]
    console: bool,
}

/// Main service state
struct Service {
    station: Arc<Station>,
    store: Arc<dyn Store>,
    console: bool,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let config = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            station = %config.station.name,
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.station.data_dir.clone());

        // Create data directory
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("voltbay.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Log service start
        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        let station = Station::new(&config, store.clone()).context("Failed to start station")?;

        Ok(Self {
            station: Arc::new(station),
            store,
            console: args.console,
        })
    }

    async fn run(self) -> Result<()> {
        // Event log
        let events = self.station.subscribe();
        tokio::spawn(Self::log_events(events));

        // Operator console
        let (console_tx, mut console_rx) = mpsc::channel::<String>(16);
        if self.console {
            tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            if console_tx.send(line).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "Console read failed");
                            break;
                        }
                    }
                }
            });
            println!("{}", HELP);
        } else {
            drop(console_tx);
        }

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                Some(line) = console_rx.recv() => {
                    match parse_line(&line) {
                        Ok(Some(ConsoleCommand::Quit)) => {
                            info!("Quit requested from console");
                            break;
                        }
                        Ok(Some(command)) => {
                            let reply = Self::handle_command(&self.station, command).await;
                            println!("{}", reply);
                        }
                        Ok(None) => {}
                        Err(e) => println!("error: {}", e),
                    }
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down voltbayd");

        if let Some(session) = self.station.current_session().await
            && session.is_active
        {
            info!(
                session_id = %session.session_id,
                remaining_seconds = session.remaining_seconds,
                "Session still active at shutdown"
            );
        }
        self.station.shutdown().await;

        // Log shutdown
        if let Err(e) = self.store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped)) {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    async fn log_events(mut events: broadcast::Receiver<Event>) {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event log fell behind");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match &event.payload {
                StationEvent::SessionTick(info) => {
                    debug!(
                        session_id = %info.session_id,
                        remaining = %info.countdown(),
                        "Tick"
                    );
                }
                StationEvent::StateChanged(_) => {}
                other => info!(event = ?other, "Station event"),
            }
        }
    }

    async fn handle_command(station: &Station, command: ConsoleCommand) -> String {
        if command.requires_admin() {
            let is_admin = station
                .current_user()
                .await
                .is_some_and(|auth| auth.role.is_admin());
            if !is_admin {
                return "error: admin login required".to_string();
            }
        }

        let outcome: voltbay_util::Result<String> = match command {
            ConsoleCommand::Login(code) => station
                .login(&code)
                .await
                .map(|auth| format!("welcome, {}", auth.label)),
            ConsoleCommand::Logout => Ok(match station.logout().await {
                Some(auth) => format!("goodbye, {}", auth.label),
                None => "nobody was logged in".to_string(),
            }),
            ConsoleCommand::Start { slot, confirm_code } => station
                .start_for_current_user(slot, &confirm_code)
                .await
                .map(|info| {
                    format!(
                        "charging started for {} ({} min)",
                        info.label, info.duration_minutes
                    )
                }),
            ConsoleCommand::Stop(code) => station.stop_charging(&code).await.map(|result| {
                format!(
                    "charging stopped with {} remaining",
                    voltbay_util::format_countdown(result.remaining_seconds)
                )
            }),
            ConsoleCommand::Acknowledge => station
                .acknowledge_completion()
                .await
                .map(|()| "session cleared".to_string()),
            ConsoleCommand::Dismiss(identity) => station.dismiss(&identity).await.map(|removed| {
                if removed {
                    format!("{} dismissed", identity)
                } else {
                    format!("{} is not on the roster", identity)
                }
            }),
            ConsoleCommand::Emergency => Ok(if station.trigger_emergency_stop().await {
                "EMERGENCY STOP ACTIVE".to_string()
            } else {
                "emergency stop already active".to_string()
            }),
            ConsoleCommand::Reset => Ok(if station.reset_emergency_stop().await {
                "emergency stop cleared".to_string()
            } else {
                "emergency stop was not active".to_string()
            }),
            ConsoleCommand::ShowDurations => {
                let d = station.durations().await;
                Ok(format!("short {} / medium {} / long {} min", d.short, d.medium, d.long))
            }
            ConsoleCommand::SetDurations(durations) => station
                .set_durations(durations)
                .await
                .map(|()| "durations updated".to_string()),
            ConsoleCommand::ListCodes => Ok(station.user_codes().await.join(" ")),
            ConsoleCommand::AddCode(code) => station
                .add_user_code(&code)
                .await
                .map(|position| format!("code added as user {}", position)),
            ConsoleCommand::RemoveCode(code) => station.remove_user_code(&code).await.map(|removed| {
                if removed {
                    "code removed".to_string()
                } else {
                    "code not found".to_string()
                }
            }),
            ConsoleCommand::Status => Ok(render_status(&station.snapshot().await)),
            ConsoleCommand::Help => Ok(HELP.to_string()),
            ConsoleCommand::Quit => Ok(String::new()),
        };

        match outcome {
            Ok(reply) => reply,
            Err(e) => format!("error: {}", e),
        }
    }
}

fn render_status(snapshot: &StationSnapshot) -> String {
    let mut out = format!("{}\n", snapshot.station_name);
    if snapshot.emergency_stop {
        out.push_str("  EMERGENCY STOP ACTIVE\n");
    }
    match &snapshot.current_user {
        Some(auth) => out.push_str(&format!("  logged in: {}\n", auth.label)),
        None => out.push_str("  logged in: nobody\n"),
    }
    if let Some(session) = &snapshot.current_session {
        out.push_str(&format!(
            "  current: {} {} ({:.0}%) {:?}, started {}\n",
            session.label,
            session.countdown(),
            session.progress_percent(),
            session.phase,
            format_datetime_full(&session.started_at)
        ));
    }
    for entry in &snapshot.roster {
        out.push_str(&format!(
            "  roster: {} {} {:?}\n",
            entry.owner,
            entry.countdown(),
            entry.phase
        ));
    }
    out.push_str(&format!(
        "  durations: {}/{}/{} min, {} user codes",
        snapshot.durations.short,
        snapshot.durations.medium,
        snapshot.durations.long,
        snapshot.user_code_count
    ));
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "voltbayd starting"
    );

    let service = match Service::new(&args) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Failed to initialize service");
            return Err(e);
        }
    };
    service.run().await
}
