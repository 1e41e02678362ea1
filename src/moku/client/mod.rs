use super::protocol::{Protocol, HEADER_SIZE};
use crate::error::MokuError;
use crate::types::MokuValue;
use log::{debug, warn};
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

pub mod data;
pub mod lockin;
pub mod lockin_impl;
pub mod ownership;

/// Default device address: link-local IPv6 literal as shown in the Moku GUI
/// under Device Info.
pub const DEFAULT_ADDRESS: &str = "[fe80::7269:79ff:feb9:502e]";
/// Default command service port
pub const DEFAULT_PORT: u16 = 8090;

/// Connection configuration for the Moku TCP client.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing the initial TCP connection
    pub connect_timeout: Duration,
    /// Timeout for reading data from the instrument
    pub read_timeout: Duration,
    /// Timeout for writing data to the instrument
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Builder for constructing [`MokuClient`] instances.
///
/// A built client is a claimed session: `build()` connects and claims
/// ownership of the device, failing if another owner holds it and
/// `force_connect` was not set.
///
/// # Examples
///
/// ```no_run
/// use moku_drum::MokuClient;
///
/// let client = MokuClient::builder()
///     .address("[fe80::7269:79ff:feb9:502e]")
///     .force_connect(true)
///     .build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MokuClientBuilder {
    address: String,
    port: u16,
    force_connect: bool,
    config: ConnectionConfig,
}

impl Default for MokuClientBuilder {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            force_connect: false,
            config: ConnectionConfig::default(),
        }
    }
}

impl MokuClientBuilder {
    pub fn address(mut self, addr: &str) -> Self {
        self.address = addr.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Claim ownership even if the device is already owned elsewhere
    pub fn force_connect(mut self, force: bool) -> Self {
        self.force_connect = force;
        self
    }

    /// Set the full connection configuration
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Connect and claim ownership of the device
    pub fn build(self) -> Result<MokuClient, MokuError> {
        let socket_addr: SocketAddr = format!("{}:{}", self.address, self.port)
            .parse()
            .map_err(|_| MokuError::InvalidAddress(self.address.clone()))?;

        debug!("Connecting to Moku at {}", self.address);

        let stream = TcpStream::connect_timeout(&socket_addr, self.config.connect_timeout)
            .map_err(|e| {
                warn!("Failed to connect to {}: {}", self.address, e);
                if e.kind() == std::io::ErrorKind::TimedOut {
                    MokuError::Timeout
                } else {
                    MokuError::Io {
                        source: e,
                        context: format!("Failed to connect to {}", self.address),
                    }
                }
            })?;

        stream.set_read_timeout(Some(self.config.read_timeout))?;
        stream.set_write_timeout(Some(self.config.write_timeout))?;

        let mut client = MokuClient {
            stream,
            config: self.config,
        };

        // Session invariant: a connected client is a claimed session
        client.claim_ownership(self.force_connect)?;
        debug!("Connected and claimed ownership of Moku");

        Ok(client)
    }
}

/// TCP client for the Moku:Go command service.
///
/// Holds no instrument state locally: all lock-in state lives on the device
/// and is opaque to this client. One client corresponds to one ownership
/// claim; [`MokuClient::relinquish_ownership`] releases it.
pub struct MokuClient {
    stream: TcpStream,
    config: ConnectionConfig,
}

impl MokuClient {
    /// Connect to a device with default configuration and claim ownership
    pub fn new(addr: &str, force_connect: bool) -> Result<Self, MokuError> {
        Self::builder().address(addr).force_connect(force_connect).build()
    }

    /// Create a builder for flexible configuration
    pub fn builder() -> MokuClientBuilder {
        MokuClientBuilder::default()
    }

    /// Get the current connection configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Send one command and read its response.
    ///
    /// Low-level path used by the typed command wrappers: serializes `args`
    /// according to `arg_formats`, frames and sends the command, then reads
    /// and parses the response according to `return_formats`, checking the
    /// trailing error block.
    pub fn quick_send(
        &mut self,
        command: &str,
        args: Vec<MokuValue>,
        arg_formats: Vec<&str>,
        return_formats: Vec<&str>,
    ) -> Result<Vec<MokuValue>, MokuError> {
        debug!("Sending {command} ({} args)", args.len());

        let mut body = Vec::new();
        for (arg, format) in args.iter().zip(arg_formats.iter()) {
            Protocol::serialize_value(arg, format, &mut body)?;
        }

        let header = Protocol::command_header(command, body.len() as u32);

        self.stream.write_all(&header).map_err(|e| MokuError::Io {
            source: e,
            context: "Writing command header".to_string(),
        })?;

        if !body.is_empty() {
            self.stream.write_all(&body).map_err(|e| MokuError::Io {
                source: e,
                context: "Writing command body".to_string(),
            })?;
        }

        let response_header = Protocol::read_exact_bytes::<HEADER_SIZE>(&mut self.stream)?;
        let body_size = Protocol::validate_response_header(&response_header, command)?;

        let response_body = if body_size > 0 {
            Protocol::read_variable_bytes(&mut self.stream, body_size as usize)?
        } else {
            Vec::new()
        };

        let result = Protocol::parse_response_with_error_check(&response_body, &return_formats)?;

        debug!("{command} ok ({} values)", result.len());
        Ok(result)
    }
}
