//! Stoplight - floating traffic-light overlay daemon
//!
//! Without a subcommand this runs the daemon: the IPC server on a background
//! tokio runtime and the overlay owner on the main thread. Subcommands are
//! thin clients that talk to a running daemon.

use clap::Parser;
use stoplight::client;
use stoplight::config::{self, Config};
use stoplight::headless::{self, HeadlessWindowing};
use stoplight::ipc::{self, IpcMessage, IpcResponse};
use stoplight::overlay::{CommandParams, Dispatcher, OverlayEvent, RawCommand, ScreenMetrics};
use stoplight::server::{self, COMMAND_QUEUE, Envelope};
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "stoplight", about = "Floating traffic-light overlay daemon")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run without a window, logging what would be drawn
    #[arg(long)]
    headless: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args, Debug, Default)]
struct SettingsArgs {
    /// Opacity, 0 to 1
    #[arg(long)]
    transparency: Option<f64>,
    /// Size fraction, 0 to 1
    #[arg(long)]
    size: Option<f64>,
    /// Horizontal position fraction, 0 = left, 1 = right
    #[arg(long)]
    x: Option<f64>,
    /// Vertical position fraction, 0 = top, 1 = bottom
    #[arg(long)]
    y: Option<f64>,
}

#[derive(clap::Args, Debug, Default)]
struct SignalArgs {
    /// red, yellow or green
    #[arg(long)]
    color: Option<String>,
    /// Seconds shown on the badge
    #[arg(long, allow_negative_numbers = true)]
    countdown: Option<i64>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show the overlay
    Create {
        #[command(flatten)]
        settings: SettingsArgs,
        #[command(flatten)]
        signal: SignalArgs,
    },
    /// Change the lit color and countdown
    UpdateState {
        #[command(flatten)]
        signal: SignalArgs,
    },
    /// Change size, opacity and position
    UpdateSettings {
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Move the overlay
    UpdatePosition {
        #[arg(long)]
        x: Option<f64>,
        #[arg(long)]
        y: Option<f64>,
    },
    /// Remove the overlay
    Stop,
    /// Check whether the daemon is running
    Ping,
    /// Print overlay events as JSON lines
    Watch,
    /// Show the config path and effective configuration
    Config {
        /// Write the effective configuration to disk
        #[arg(long)]
        write_defaults: bool,
    },
}

fn params(settings: SettingsArgs, signal: SignalArgs) -> CommandParams {
    CommandParams {
        transparency: settings.transparency,
        size_fraction: settings.size,
        position_x: settings.x,
        position_y: settings.y,
        color: signal.color,
        countdown: signal.countdown,
    }
}

impl Command {
    /// The wire message for client subcommands, `None` for local ones.
    fn into_message(self) -> Option<IpcMessage> {
        let raw = match self {
            Command::Create { settings, signal } => {
                RawCommand::new("create", params(settings, signal))
            }
            Command::UpdateState { signal } => {
                RawCommand::new("updateState", params(SettingsArgs::default(), signal))
            }
            Command::UpdateSettings { settings } => {
                RawCommand::new("updateSettings", params(settings, SignalArgs::default()))
            }
            Command::UpdatePosition { x, y } => RawCommand::new(
                "updatePosition",
                CommandParams {
                    position_x: x,
                    position_y: y,
                    ..CommandParams::default()
                },
            ),
            Command::Stop => RawCommand::new("stop", CommandParams::default()),
            Command::Ping => return Some(IpcMessage::Ping),
            Command::Watch | Command::Config { .. } => return None,
        };
        Some(IpcMessage::Command(raw))
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("STOPLIGHT_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();
}

/// Run a client subcommand. Returns the process exit code.
fn run_client(command: Command) -> i32 {
    let path = ipc::socket_path();
    match command {
        Command::Config { write_defaults } => {
            let config = config::load_config();
            match config::config_path() {
                Some(p) => println!("{}", p.display()),
                None => println!("(no config directory)"),
            }
            match serde_json::to_string_pretty(&config) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("{e}"),
            }
            if write_defaults && let Err(e) = config::save_config(&config) {
                eprintln!("failed to write config: {e}");
                return 1;
            }
            0
        }
        Command::Watch => {
            let result = client::watch(&path, |response| {
                if let IpcResponse::Event(event) = response
                    && let Ok(json) = serde_json::to_string(&event)
                {
                    println!("{json}");
                }
                true
            });
            match result {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("daemon not running ({}): {}", path.display(), e);
                    1
                }
            }
        }
        other => {
            let Some(message) = other.into_message() else {
                return 0;
            };
            match client::request(&path, &message) {
                Ok(response) => {
                    if let Ok(json) = serde_json::to_string(&response) {
                        println!("{json}");
                    }
                    i32::from(matches!(response, IpcResponse::Error { .. }))
                }
                Err(e) => {
                    eprintln!("daemon not running ({}): {}", path.display(), e);
                    1
                }
            }
        }
    }
}

/// Spawn the tokio runtime with the IPC server in a background thread.
fn spawn_server(events: broadcast::Sender<OverlayEvent>) -> mpsc::Receiver<Envelope> {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
        rt.block_on(async move {
            server::start(&ipc::socket_path(), tx, events).await;
        });
    });
    rx
}

fn run_headless(config: &Config) {
    let screen = ScreenMetrics::new(
        config.screen_width,
        config.screen_height,
        config.density_or(1.0),
    );
    let mut ws = HeadlessWindowing::new(screen);
    let mut dispatcher = Dispatcher::new(config.double_tap());
    let commands = spawn_server(dispatcher.event_sender());
    info!("headless overlay on {}x{}", screen.width, screen.height);
    headless::run_owner(&mut ws, &mut dispatcher, commands);
}

#[cfg(feature = "gui")]
fn run_daemon(config: Config, headless: bool) {
    if headless {
        run_headless(&config);
        return;
    }
    let dispatcher = Dispatcher::new(config.double_tap());
    let commands = spawn_server(dispatcher.event_sender());
    // Run gpui on main thread (blocks)
    stoplight::ui::run_overlay(config, dispatcher, commands);
}

#[cfg(not(feature = "gui"))]
fn run_daemon(config: Config, _headless: bool) {
    run_headless(&config);
}

fn main() {
    let cli = Cli::parse();

    // Handle subcommands that exit early
    if let Some(command) = cli.command {
        std::process::exit(run_client(command));
    }

    init_tracing(cli.verbose);
    run_daemon(config::load_config(), cli.headless);
}
