use crate::{
    pipeline::{Pipeline, PipelineError},
    time::{Clock, time_of_day},
};
use antenna_controller::RotatorCommand;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};
use tracking::{Degrees, OrbitalElements, Pointing};

/// What a single iteration of the loop did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Sent(RotatorCommand),
    BelowHorizon { elevation: Degrees },
}

/// Follows one satellite, sending a fresh pointing command every `interval`.
pub struct ContinuousDriver {
    pipeline: Arc<Pipeline>,
    clock: Arc<dyn Clock>,
    elements: OrbitalElements,
    interval: Duration,
}

impl ContinuousDriver {
    pub fn new(
        pipeline: Arc<Pipeline>,
        clock: Arc<dyn Clock>,
        elements: OrbitalElements,
        interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            clock,
            elements,
            interval,
        }
    }

    /// Computes, gates and, if the satellite is up, sends one command.
    pub fn tick(&self) -> Result<Tick, PipelineError> {
        let at = self.clock.now();

        match self.pipeline.point(&self.elements, at)? {
            Pointing::Visible(angle) => {
                let command = self.pipeline.dispatch(&angle)?;
                log::info!("Sent: {}", command);
                Ok(Tick::Sent(command))
            }
            Pointing::BelowHorizon { elevation, .. } => {
                log::info!(
                    "Satellite {} is below the horizon at {}. No data sent.",
                    self.elements.name,
                    time_of_day(at)
                );
                Ok(Tick::BelowHorizon { elevation })
            }
        }
    }

    /// Ticks until `stop` is set or an iteration fails.
    ///
    /// A failed send ends the loop; a satellite below the horizon does not.
    /// `stop` is only checked between iterations, so the sleep itself is not
    /// interrupted.
    pub fn run(&self, stop: &AtomicBool) -> Result<(), PipelineError> {
        log::info!("Starting satellite tracking for: {}", self.elements.name);

        while !stop.load(Ordering::Relaxed) {
            if let Err(error) = self.tick() {
                log::error!("Tracking stopped: {}. Exiting.", error);
                return Err(error);
            }

            thread::sleep(self.interval);
        }

        log::info!("Stopped tracking {}", self.elements.name);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use antenna_controller::{LinkError, PortSettings, RotatorLink, mock::MockConnector};
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use tracking::{Observation, Propagator, TrackingError};

    /// Replays a fixed list of elevations, then raises `stop`.
    struct Script {
        elevations: Mutex<Vec<Degrees>>,
        stop: Arc<AtomicBool>,
    }

    impl Script {
        fn new(elevations: &[Degrees], stop: Arc<AtomicBool>) -> Self {
            let mut elevations = elevations.to_vec();
            elevations.reverse();
            Self {
                elevations: Mutex::new(elevations),
                stop,
            }
        }
    }

    impl Propagator for Script {
        fn observe(
            &self,
            _elements: &OrbitalElements,
            _at: DateTime<Utc>,
        ) -> Result<Observation, TrackingError> {
            let mut elevations = self.elevations.lock().unwrap();
            let elevation = elevations.pop().unwrap_or(-10.0);
            if elevations.is_empty() {
                self.stop.store(true, Ordering::Relaxed);
            }

            Ok(Observation {
                azimuth: 200.2,
                elevation,
                range: 1500.0,
            })
        }
    }

    fn driver(script: Script, connector: &MockConnector) -> ContinuousDriver {
        let link = RotatorLink::with_settle_delay(connector.clone(), Duration::ZERO);
        link.open(&PortSettings::new("/dev/ttyUSB0")).unwrap();

        ContinuousDriver::new(
            Arc::new(Pipeline::new(script).with_link(Arc::new(link))),
            Arc::new(FixedClock(Utc::now())),
            OrbitalElements::new("ISS (ZARYA)", "1 25544U", "2 25544"),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_tick_sends_when_visible() {
        let stop = Arc::new(AtomicBool::new(false));
        let connector = MockConnector::new();
        let driver = driver(Script::new(&[12.5, 1.0], stop), &connector);

        let tick = driver.tick().unwrap();

        assert_eq!(tick, Tick::Sent(RotatorCommand::new(200.2, 12.5)));
        assert_eq!(connector.sent(), vec!["<AZ200><EL12>\n"]);
    }

    #[test]
    fn test_tick_below_horizon_sends_nothing() {
        let stop = Arc::new(AtomicBool::new(false));
        let connector = MockConnector::new();
        let driver = driver(Script::new(&[-3.0, 1.0], stop), &connector);

        let tick = driver.tick().unwrap();

        assert_eq!(tick, Tick::BelowHorizon { elevation: -3.0 });
        assert!(connector.sent().is_empty());
    }

    #[test]
    fn test_run_continues_past_below_horizon() {
        let stop = Arc::new(AtomicBool::new(false));
        let connector = MockConnector::new();
        let driver = driver(
            Script::new(&[-5.0, 0.0, -0.001, 45.4, -20.0], stop.clone()),
            &connector,
        );

        driver.run(&stop).unwrap();

        assert_eq!(connector.sent(), vec!["<AZ200><EL0>\n", "<AZ200><EL45>\n"]);
    }

    #[test]
    fn test_run_stops_on_write_failure() {
        let stop = Arc::new(AtomicBool::new(false));
        let connector = MockConnector::failing_after(2);
        let driver = driver(
            Script::new(&[10.0, 20.0, 30.0, 40.0, 50.0], stop.clone()),
            &connector,
        );

        let result = driver.run(&stop);

        assert!(matches!(
            result,
            Err(PipelineError::Link(LinkError::Write(_)))
        ));
        assert_eq!(connector.sent(), vec!["<AZ200><EL10>\n", "<AZ200><EL20>\n"]);
        assert!(!stop.load(Ordering::Relaxed));
    }

    #[test]
    fn test_run_returns_immediately_when_stopped() {
        let stop = Arc::new(AtomicBool::new(true));
        let connector = MockConnector::new();
        let driver = driver(Script::new(&[10.0], stop.clone()), &connector);

        driver.run(&stop).unwrap();

        assert!(connector.sent().is_empty());
    }
}
