pub mod actuator;
pub mod config;
pub mod controller;
pub mod error;
pub mod moku;
pub mod plotting;
pub mod types;

pub use actuator::ScanActuator;
pub use config::{load_config, load_config_or_default, AppConfig, ScanTiming};
pub use controller::DrumController;
pub use error::MokuError;
pub use moku::{
    ChannelData, ConnectionConfig, LockInInterface, MokuClient, MokuClientBuilder,
    AUX_FREQUENCY_UNCHANGED, DEFAULT_ADDRESS, DEFAULT_PORT,
};
pub use plotting::{plot_sweep, render_polar_map};
pub use types::{
    Amplitude, Frequency, LockinProfile, SampleReading, ScanResult, SpatialScanResult,
};
