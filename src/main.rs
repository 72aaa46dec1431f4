use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use spectra_controller::config::CONFIG_FILE;
use spectra_controller::{Channel, ControllerConfig, Filter, LightEngine, SharedLightEngine};

/// Command line front-end for the light engine
#[derive(Parser, Debug)]
#[command(name = "spectra_controller")]
#[command(author, version, about = "Control a SPECTRA X light engine over serial", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Config file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Serial port (e.g., /dev/ttyUSB0 or COM3), overrides the config file
    #[arg(short, long)]
    port: Option<String>,

    /// Read timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log the engine temperature every N seconds
    #[arg(long)]
    poll_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    Ports,
    /// Write the effective settings to the config file
    SaveConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = ControllerConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(ms) = cli.timeout_ms {
        config.read_timeout_ms = ms;
    }
    if cli.poll_secs.is_some() {
        config.poll_interval_secs = cli.poll_secs;
    }

    match cli.command {
        Some(Commands::Ports) => list_ports(),
        Some(Commands::SaveConfig) => {
            config.save(&cli.config)?;
            println!("Saved {}", cli.config.display());
            Ok(())
        }
        None => run(&config),
    }
}

fn list_ports() -> anyhow::Result<()> {
    let ports = serialport::available_ports().context("failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}

fn run(config: &ControllerConfig) -> anyhow::Result<()> {
    let engine = LightEngine::open(&config.port, config.read_timeout())
        .with_context(|| format!("failed to connect to light engine on {}", config.port))?;
    let engine = SharedLightEngine::new(engine);
    info!("connected on {}", config.port);

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let poller = config.poll_interval().map(|interval| {
        let engine = engine.clone();
        thread::spawn(move || poll_temperature(engine, interval, stop_rx))
    });

    println!("Commands: toggle <channel>..., intensity <0-255> <channel>..., temp, status, off, quit");
    println!("Channels: red, green, cyan, uv, filter, blue, teal");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = parts.split_first() else {
            continue;
        };
        match cmd {
            "quit" | "exit" => break,
            _ => {
                if let Err(e) = execute(&engine, cmd, args) {
                    println!("Error: {e:#}");
                }
            }
        }
        io::stdout().flush()?;
    }

    drop(stop_tx);
    if let Some(poller) = poller {
        if poller.join().is_err() {
            warn!("temperature poller panicked");
        }
    }
    engine.close()?;
    println!("Exiting...");
    Ok(())
}

fn execute(engine: &SharedLightEngine, cmd: &str, args: &[&str]) -> anyhow::Result<()> {
    match cmd {
        "toggle" => {
            anyhow::ensure!(!args.is_empty(), "usage: toggle <channel>...");
            engine.toggle_named(args)?;
            print_status(engine);
        }
        "intensity" => {
            let Some((level, names)) = args.split_first() else {
                anyhow::bail!("usage: intensity <0-255> <channel>...");
            };
            anyhow::ensure!(!names.is_empty(), "usage: intensity <0-255> <channel>...");
            let level: u8 = level
                .parse()
                .with_context(|| format!("intensity must be 0-255, got {level}"))?;
            engine.set_intensity_named(names, level)?;
            println!("Intensity set to {level}");
        }
        "temp" => println!("Engine temp: {:.2}deg", engine.temperature()?),
        "status" => print_status(engine),
        "off" => {
            engine.disable_all()?;
            print_status(engine);
        }
        _ => println!("Unknown command: {cmd}"),
    }
    Ok(())
}

fn print_status(engine: &SharedLightEngine) {
    let on: Vec<&str> = Channel::ALL
        .iter()
        .filter(|&&c| c != Channel::Filter && engine.is_enabled(c))
        .map(|c| c.name())
        .collect();
    let filter = match engine.filter_position() {
        Filter::Yellow => "yellow",
        Filter::Green => "green",
    };
    println!(
        "Register 0x{:02X}, on: [{}], filter: {filter}",
        engine.enable_register(),
        on.join(", ")
    );
}

fn poll_temperature(engine: SharedLightEngine, interval: Duration, stop: mpsc::Receiver<()>) {
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => match engine.temperature() {
                Ok(celsius) => info!("engine temperature {celsius:.1} C"),
                Err(e) => warn!("temperature read failed: {e}"),
            },
            _ => break,
        }
    }
}
