//! The pointing pipeline: propagate, gate, format, send.
//!
//! Both driving modes (the continuous loop and the HTTP handlers) are built on
//! the same [`Pipeline`]. Whether a rotator is attached is decided at
//! construction time.

use antenna_controller::{LinkError, RotatorCommand, RotatorLink};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracking::{
    Degrees, OrbitalElements, Pointing, PointingAngle, Propagator, TrackingError,
    catalog::CatalogError,
};

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("azimuth must be between 0 and 360 degrees, got {0}")]
    Azimuth(Degrees),
    #[error("elevation must be between 0 and 90 degrees, got {0}")]
    Elevation(Degrees),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("no rotator is attached to this ground station")]
    Detached,
}

/// A position requested by an operator rather than computed from an orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualPosition {
    azimuth: Degrees,
    elevation: Degrees,
}

impl ManualPosition {
    /// Out-of-range values are rejected, never clamped.
    pub fn new(azimuth: Degrees, elevation: Degrees) -> Result<Self, ValidationError> {
        if !(0.0..=360.0).contains(&azimuth) {
            return Err(ValidationError::Azimuth(azimuth));
        }

        if !(0.0..=90.0).contains(&elevation) {
            return Err(ValidationError::Elevation(elevation));
        }

        Ok(Self { azimuth, elevation })
    }

    pub fn azimuth(&self) -> Degrees {
        self.azimuth
    }

    pub fn elevation(&self) -> Degrees {
        self.elevation
    }
}

pub struct Pipeline {
    propagator: Box<dyn Propagator>,
    link: Option<Arc<RotatorLink>>,
}

impl Pipeline {
    /// A pipeline that only computes angles.
    pub fn new(propagator: impl Propagator + 'static) -> Self {
        Self {
            propagator: Box::new(propagator),
            link: None,
        }
    }

    /// Attach a rotator link that commands are dispatched to.
    pub fn with_link(mut self, link: Arc<RotatorLink>) -> Self {
        self.link = Some(link);
        self
    }

    pub fn link(&self) -> Option<&Arc<RotatorLink>> {
        self.link.as_ref()
    }

    pub fn is_link_open(&self) -> bool {
        self.link.as_ref().is_some_and(|link| link.is_open())
    }

    /// Computes the satellite's position at `at` and runs it through the visibility gate.
    pub fn point(
        &self,
        elements: &OrbitalElements,
        at: DateTime<Utc>,
    ) -> Result<Pointing, PipelineError> {
        let observation = self.propagator.observe(elements, at)?;

        log::debug!(
            "{}: Az={:.2}°, El={:.2}°, range={:.1} km",
            elements.name,
            observation.azimuth,
            observation.elevation,
            observation.range
        );

        Ok(Pointing::gate(&observation))
    }

    /// Formats a gated angle and sends it to the rotator.
    ///
    /// Only a [`PointingAngle`] can be dispatched here, so below-horizon
    /// positions never reach the link.
    pub fn dispatch(&self, angle: &PointingAngle) -> Result<RotatorCommand, PipelineError> {
        let command = RotatorCommand::new(angle.azimuth(), angle.elevation());
        self.send(&command)?;
        Ok(command)
    }

    /// Sends an operator-supplied position, bypassing propagation and the gate.
    pub fn set_position(&self, position: ManualPosition) -> Result<RotatorCommand, PipelineError> {
        let command = RotatorCommand::new(position.azimuth, position.elevation);
        self.send(&command)?;
        Ok(command)
    }

    fn send(&self, command: &RotatorCommand) -> Result<(), PipelineError> {
        let link = self.link.as_ref().ok_or(PipelineError::Detached)?;
        link.send(command)?;
        Ok(())
    }
}
