use crate::{AntennaController, Connector, LinkError, PortSettings, RotatorCommand, SETTLE_DELAY};
use std::{
    sync::{Mutex, MutexGuard, PoisonError, RwLock},
    thread,
    time::Duration,
};

struct Connection {
    port: String,
    controller: Box<dyn AntennaController>,
}

/// The single serial connection to the rotator.
///
/// Holds at most one open connection. `open`, `send` and `close` all take the
/// same lock, so commands from concurrent callers are never interleaved on the
/// wire. The connection is released when the link is closed or dropped.
///
/// `is_open` and `port` read a separate snapshot and never wait on that lock,
/// so they answer immediately even during the settle delay or a slow write.
///
/// ```text
/// Closed --open ok--> Open --close--> Closed
/// Closed --open fails--> Closed
/// Open --send fails--> Open
/// ```
pub struct RotatorLink {
    connector: Box<dyn Connector>,
    settle: Duration,
    connection: Mutex<Option<Connection>>,
    // Written only while `connection` is held.
    open_port: RwLock<Option<String>>,
}

impl RotatorLink {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_settle_delay(connector, SETTLE_DELAY)
    }

    pub fn with_settle_delay(connector: impl Connector + 'static, settle: Duration) -> Self {
        Self {
            connector: Box::new(connector),
            settle,
            connection: Mutex::new(None),
            open_port: RwLock::new(None),
        }
    }

    /// Opens a connection, closing any connection that was already open.
    ///
    /// Blocks for the settle delay before returning so the first command is
    /// not lost while the rotator resets.
    pub fn open(&self, settings: &PortSettings) -> Result<(), LinkError> {
        let mut connection = self.lock();

        if let Some(previous) = connection.take() {
            self.set_open_port(None);
            log::info!("Closing serial port {} before reopening", previous.port);
        }

        log::info!(
            "Attempting to open serial port: {} at {} baud...",
            settings.port,
            settings.baud_rate
        );

        let controller = self.connector.connect(settings)?;

        thread::sleep(self.settle);

        *connection = Some(Connection {
            port: settings.port.clone(),
            controller,
        });
        self.set_open_port(Some(settings.port.clone()));

        log::info!("Serial port {} opened successfully", settings.port);

        Ok(())
    }

    /// Writes a command to the open connection.
    ///
    /// A failed write leaves the connection open; the caller decides whether
    /// to retry or give up.
    pub fn send(&self, command: &RotatorCommand) -> Result<(), LinkError> {
        let mut connection = self.lock();

        let connection = connection.as_mut().ok_or(LinkError::Unavailable)?;

        connection.controller.send(command).inspect_err(|error| {
            log::error!("Error writing to serial port {}: {}", connection.port, error)
        })
    }

    /// Closes the connection. Returns whether one was open.
    pub fn close(&self) -> bool {
        let mut connection = self.lock();

        match connection.take() {
            Some(connection) => {
                self.set_open_port(None);
                log::info!("Closing serial port {}", connection.port);
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.port().is_some()
    }

    /// The port of the open connection, if any.
    ///
    /// A port that is still settling is not reported yet.
    pub fn port(&self) -> Option<String> {
        self.open_port
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_open_port(&self, port: Option<String>) {
        *self
            .open_port
            .write()
            .unwrap_or_else(PoisonError::into_inner) = port;
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        // A panic mid-write leaves nothing half-updated worth refusing over.
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
