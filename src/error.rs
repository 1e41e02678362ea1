use thiserror::Error;

#[derive(Error, Debug)]
pub enum MokuError {
    #[error("IO error: {context}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("Connection timeout")]
    Timeout,
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Type error: {0}")]
    Type(String),
    #[error("Command mismatch: expected {expected}, got {actual}")]
    CommandMismatch { expected: String, actual: String },
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Instrument error {code}: {message}")]
    InstrumentError { code: i32, message: String },
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Actuator error: {0}")]
    Actuator(String),
}

impl From<std::io::Error> for MokuError {
    fn from(source: std::io::Error) -> Self {
        MokuError::Io {
            source,
            context: "I/O".to_string(),
        }
    }
}
