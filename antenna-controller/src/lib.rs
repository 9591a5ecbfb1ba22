pub mod command;
pub mod link;
pub mod mock;
pub mod serial;

pub use command::RotatorCommand;
pub use link::RotatorLink;

use std::time::Duration;

pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Grace period after opening the port, while the rotator's microcontroller
/// goes through its reset sequence. Writes sent earlier are lost.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("rotator is not connected")]
    Unavailable,
    #[error("could not open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("error writing to serial port: {0}")]
    Write(#[from] std::io::Error),
}

/// Where and how to open the rotator's serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout. Commands are write-only, so this rarely matters.
    pub timeout: Duration,
}

impl PortSettings {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub trait AntennaController: Send {
    /// Sends a pointing command to the antenna rotator.
    fn send(&mut self, command: &RotatorCommand) -> Result<(), LinkError>;
}

/// Opens connections to a rotator.
pub trait Connector: Send + Sync {
    fn connect(&self, settings: &PortSettings) -> Result<Box<dyn AntennaController>, LinkError>;
}
