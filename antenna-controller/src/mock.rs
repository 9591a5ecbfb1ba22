use crate::{AntennaController, Connector, LinkError, PortSettings, RotatorCommand};
use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, Default)]
struct MockState {
    opened: Vec<String>,
    closed: Vec<String>,
    sent: Vec<String>,
    /// Writes left before every further write fails. `None` never fails.
    write_budget: Option<usize>,
    refuse_open: bool,
}

/// An in-memory rotator. Records every open, close and command it sees.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `writes` commands, then fails every write as if unplugged.
    pub fn failing_after(writes: usize) -> Self {
        let connector = Self::new();
        connector.state().write_budget = Some(writes);
        connector
    }

    /// Every `connect` fails as if the port did not exist.
    pub fn refusing_open() -> Self {
        let connector = Self::new();
        connector.state().refuse_open = true;
        connector
    }

    /// Ports opened so far, in order.
    pub fn opened(&self) -> Vec<String> {
        self.state().opened.clone()
    }

    /// Ports closed so far, in order.
    pub fn closed(&self) -> Vec<String> {
        self.state().closed.clone()
    }

    /// Commands written so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.state().sent.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connector for MockConnector {
    fn connect(&self, settings: &PortSettings) -> Result<Box<dyn AntennaController>, LinkError> {
        let mut state = self.state();

        if state.refuse_open {
            return Err(LinkError::Open {
                port: settings.port.clone(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such port"),
            });
        }

        state.opened.push(settings.port.clone());

        Ok(Box::new(MockController {
            port: settings.port.clone(),
            state: self.state.clone(),
        }))
    }
}

pub struct MockController {
    port: String,
    state: Arc<Mutex<MockState>>,
}

impl AntennaController for MockController {
    fn send(&mut self, command: &RotatorCommand) -> Result<(), LinkError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match state.write_budget {
            Some(0) => {
                return Err(LinkError::Write(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "mock rotator unplugged",
                )));
            }
            Some(ref mut left) => *left -= 1,
            None => {}
        }

        log::debug!("[MOCK] {} <- {}", self.port, command);
        state.sent.push(command.as_str().to_string());

        Ok(())
    }
}

impl Drop for MockController {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed.push(self.port.clone());
    }
}
