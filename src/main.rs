use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serial_input::link::joybus;
use serial_input::transport::SystemBackend;
use serial_input::version::{CONFIG_API_VERSION, INPUT_API_VERSION, PLUGIN_NAME, PLUGIN_VERSION};
use serial_input::{PluginConfig, SerialInput, SLOT_COUNT};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(version, about = "Serial controller adapter diagnostics")]
struct Args {
    /// Log transport details
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial devices that can be assigned to a controller slot
    List {
        /// Scan this directory instead of /dev
        #[arg(long)]
        dev_dir: Option<PathBuf>,
    },

    /// Bind the configured slots and poll each bound controller
    Probe {
        /// Config file, defaults to the user config directory
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of button reads per controller
        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Write a default config file
    InitConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup(args.verbose)?;
    info!(
        "{} {} (input API {}, config API {})",
        PLUGIN_NAME, PLUGIN_VERSION, INPUT_API_VERSION, CONFIG_API_VERSION
    );

    match args.command {
        Command::List { dev_dir } => list(dev_dir),
        Command::Probe { config, count } => probe(config, count),
        Command::InitConfig { config } => {
            let path = config_path(config)?;
            PluginConfig::default().save(&path)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
    Ok(())
}

fn config_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => PluginConfig::default_path(),
    }
}

fn list(dev_dir: Option<PathBuf>) -> Result<()> {
    let mut config = PluginConfig::default();
    config.transport.dev_dir = dev_dir;

    let mut input = SerialInput::from_config(SystemBackend, &config);
    input.initialize_ports();

    for (index, device) in input.registry().devices().iter().enumerate() {
        println!("{index:>3}  {:<16} {}", device.name(), device.path().display());
    }
    Ok(())
}

fn probe(config: Option<PathBuf>, count: usize) -> Result<()> {
    let path = config_path(config)?;
    let config = PluginConfig::load_or_default(&path)?;

    let mut input = SerialInput::from_config(SystemBackend, &config);
    input.initialize_ports();
    let outcomes = input.initiate_controllers(&config);

    if !outcomes.iter().any(|outcome| outcome.is_bound()) {
        return Err(eyre!(
            "No controller bound, enable a slot in {}",
            path.display()
        ));
    }

    for slot in 0..SLOT_COUNT {
        if !input.is_present(slot) {
            continue;
        }
        let mut status = joybus::info_request();
        match input.exchange(slot, Some(&mut status[..])) {
            Ok(()) => println!("controller {} status  {}", slot + 1, hex(&status[3..])),
            Err(e) => {
                error!("Controller {} did not answer status request: {}", slot + 1, e);
                continue;
            }
        }

        for _ in 0..count {
            let mut buttons = joybus::read_buttons_request();
            input.exchange(slot, Some(&mut buttons[..]))?;
            println!("controller {} buttons {}", slot + 1, hex(&buttons[3..]));
        }
    }

    input.shutdown();
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
