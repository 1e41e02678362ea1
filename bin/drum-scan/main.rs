use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use moku_drum::{load_config_or_default, DrumController, MokuClient};

/// Drumhead resonance sweep with a Moku:Go lock-in amplifier
#[derive(Parser, Debug)]
#[command(name = "drum-scan")]
#[command(about = "Frequency sweep of a drumhead's amplitude response", long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Device address, overrides the configured one
    #[arg(short, long)]
    address: Option<String>,

    /// Claim ownership even if the device is already owned
    #[arg(long)]
    force_connect: bool,

    /// Sweep start frequency [Hz]
    #[arg(long, default_value_t = 250.0)]
    start: f64,

    /// Sweep stop frequency [Hz]
    #[arg(long, default_value_t = 400.0)]
    stop: f64,

    /// Number of sweep points
    #[arg(long, default_value_t = 76)]
    steps: usize,

    /// Settle delay after each frequency change [s], overrides the
    /// configured one
    #[arg(long)]
    settle: Option<f64>,

    /// Skip the terminal plot at the end of the sweep
    #[arg(long)]
    no_plot: bool,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn linspace(start: f64, stop: f64, steps: usize) -> Vec<f64> {
    if steps < 2 {
        return vec![start];
    }
    let delta = (stop - start) / (steps - 1) as f64;
    (0..steps).map(|i| start + i as f64 * delta).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config_or_default(args.config.as_deref());

    let log_level = args
        .log_level
        .unwrap_or_else(|| config.logging.log_level.clone());
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // No cancellation exists mid-scan; an interrupt terminates the process
    ctrlc::set_handler(|| {
        eprintln!();
        eprintln!("Interrupted, exiting without releasing the device");
        std::process::exit(130);
    })?;

    let address = args.address.unwrap_or_else(|| config.moku.address.clone());
    let force_connect = args.force_connect || config.moku.force_connect;

    info!("Connecting to Moku at {}", address);
    let client = MokuClient::builder()
        .address(&address)
        .port(config.moku.port)
        .force_connect(force_connect)
        .connect_timeout(Duration::from_secs(config.moku.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.moku.read_timeout_secs))
        .build()?;

    let mut controller = DrumController::new(Box::new(client), config.scan.clone());
    controller.configure(&config.profile)?;

    let frequencies = linspace(args.start, args.stop, args.steps);
    let settle = args
        .settle
        .map(Duration::from_secs_f64)
        .unwrap_or_else(|| config.scan.settle());

    info!(
        "Sweeping {} points from {:.2} Hz to {:.2} Hz, settle {:?}",
        frequencies.len(),
        args.start,
        args.stop,
        settle
    );

    let result = controller.scan(&frequencies, settle, !args.no_plot)?;

    if let Some((peak_freq, peak_amp)) = result
        .points()
        .iter()
        .filter_map(|(f, r)| match r {
            moku_drum::SampleReading::Value(v) => Some((*f, *v)),
            moku_drum::SampleReading::Unavailable => None,
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
    {
        info!("Peak response {:.6} at {:.2} Hz", peak_amp, peak_freq);
    } else {
        warn!("No valid readings in sweep");
    }

    controller.close()?;
    info!("Device released");

    Ok(())
}
