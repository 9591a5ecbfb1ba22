use crate::{AntennaController, Connector, LinkError, PortSettings, RotatorCommand};
use serialport::SerialPort;
use std::io::Write;

/// A controller for an antenna rotator, reached over a serial port.
///
/// The port is closed when the controller is dropped.
pub struct SerialAntennaController {
    port: Box<dyn SerialPort>,
}

impl SerialAntennaController {
    /// Opens the serial port described by `settings`.
    pub fn new(settings: &PortSettings) -> Result<Self, LinkError> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.timeout)
            .open()
            .map_err(|source| LinkError::Open {
                port: settings.port.clone(),
                source,
            })?;

        Ok(Self { port })
    }
}

impl AntennaController for SerialAntennaController {
    fn send(&mut self, command: &RotatorCommand) -> Result<(), LinkError> {
        self.port.write_all(command.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}

/// Opens real serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn connect(&self, settings: &PortSettings) -> Result<Box<dyn AntennaController>, LinkError> {
        Ok(Box::new(SerialAntennaController::new(settings)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_fails() {
        let settings = PortSettings::new("/dev/this-port-does-not-exist");

        let result = SerialConnector.connect(&settings);

        match result {
            Err(LinkError::Open { port, .. }) => {
                assert_eq!(port, "/dev/this-port-does-not-exist")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opening a missing port should fail"),
        }
    }
}
