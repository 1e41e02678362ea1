pub mod client;
pub mod interface;
pub mod protocol;

pub use client::data::ChannelData;
pub use client::{ConnectionConfig, MokuClient, MokuClientBuilder, DEFAULT_ADDRESS, DEFAULT_PORT};
pub use interface::{LockInInterface, AUX_FREQUENCY_UNCHANGED};
