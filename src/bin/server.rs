//! meshgate Daemon
//!
//! Runs the gateway: serial link, broker connection and the console on stdin.

use std::io::{self, BufRead};
use std::thread;

use clap::Parser;
use crossbeam::channel::{self, Sender};
use meshgate::broker::RumqttBroker;
use meshgate::serial::{SerialPortBus, SerialTransport};
use meshgate::settings::SettingsStore;
use meshgate::{Gateway, GatewayConfig, GatewayEvent, Runtime};
use tracing_subscriber::{fmt, EnvFilter};

/// meshgate Daemon
#[derive(Parser, Debug)]
#[command(name = "meshgate")]
#[command(about = "Broker-to-serial gateway for the mesh controller")]
#[command(version)]
struct Args {
    /// Settings record file
    #[arg(short, long, default_value = "./meshgate_settings.bin")]
    settings: String,

    /// Serial device of the mesh controller
    #[arg(short = 'p', long, default_value = "/dev/ttyUSB0")]
    serial_port: String,

    /// UART baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Receive poll interval in milliseconds
    #[arg(long, default_value = "200")]
    poll_ms: u64,

    /// Broker connect timeout in milliseconds
    #[arg(long, default_value = "10000")]
    connect_timeout_ms: u64,

    /// Skip the start-up broker connection
    #[arg(long)]
    no_connect: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,meshgate=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("meshgate v{}", meshgate::VERSION);
    tracing::info!("Settings file: {}", args.settings);
    tracing::info!("Serial port: {} @ {} baud", args.serial_port, args.baud);

    // Build config from args
    let config = match GatewayConfig::builder()
        .settings_path(&args.settings)
        .serial_path(&args.serial_port)
        .baud_rate(args.baud)
        .poll_interval_ms(args.poll_ms)
        .connect_timeout_ms(args.connect_timeout_ms)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let settings = match SettingsStore::open(&config.settings_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open settings: {}", e);
            std::process::exit(1);
        }
    };
    if settings.was_first_run() {
        tracing::info!("First run, default settings written");
    }

    // Serial link; a configuration failure leaves the gateway running without it
    let bus = SerialPortBus::new(&config.serial_path);
    let mut transport = SerialTransport::new(bus, config.uart, config.ring_capacity)
        .with_rx_chunk(config.rx_chunk_size);
    if transport.configure().is_err() {
        tracing::warn!("Continuing without serial link; mesh commands will fail");
    }

    // Unbounded: the pump must never block while the runtime waits on the client
    let (broker_tx, broker_rx) = channel::unbounded();
    let broker = RumqttBroker::new(broker_tx, config.connect_timeout())
        .with_request_capacity(config.request_queue_capacity);
    let mut gateway = Gateway::new(broker, transport, settings);

    if !args.no_connect {
        if let Err(e) = gateway.connect() {
            tracing::warn!("Start-up connect failed: {} (use mqtt_connect to retry)", e);
        }
    }

    let (event_tx, event_rx) = channel::unbounded();
    spawn_console_reader(event_tx);

    let mut runtime = Runtime::new(
        gateway,
        event_rx,
        broker_rx,
        config.poll_interval(),
        io::stdout(),
    );
    if let Err(e) = runtime.run() {
        tracing::error!("Runtime error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Gateway stopped");
}

/// Forward stdin lines to the runtime; EOF requests shutdown
fn spawn_console_reader(events: Sender<GatewayEvent>) {
    let spawned = thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if events.send(GatewayEvent::Console(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Console read failed: {}", e);
                        break;
                    }
                }
            }
            let _ = events.send(GatewayEvent::Shutdown);
        });

    if let Err(e) = spawned {
        tracing::error!("Failed to start console reader: {}", e);
        std::process::exit(1);
    }
}
