use chrono::{DateTime, Utc};
use predict_rs::{
    consts::{DEG_TO_RAD, RAD_TO_DEG},
    observer, orbit,
    predict::PredictObserver,
};
use serde::{Deserialize, Serialize};
pub use sgp4::Elements;

pub mod catalog;

pub type Degrees = f64;
pub type Meters = f64;
pub type Kilometers = f64;

/// The ground station is the fixed location the satellite is observed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundStation {
    /// Ground station latitude, in degrees.
    latitude: Degrees,
    /// Ground station longitude, in degrees.
    longitude: Degrees,
    /// Ground station altitude, in meters.
    altitude: Meters,
}

impl GroundStation {
    pub fn new(latitude: Degrees, longitude: Degrees, altitude: Meters) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn latitude(&self) -> Degrees {
        self.latitude
    }

    pub fn longitude(&self) -> Degrees {
        self.longitude
    }

    pub fn altitude(&self) -> Meters {
        self.altitude
    }
}

/// A two-line element set, as stored in the satellite catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub name: String,
    #[serde(rename = "tle_line1")]
    pub line1: String,
    #[serde(rename = "tle_line2")]
    pub line2: String,
}

impl OrbitalElements {
    pub fn new(
        name: impl Into<String>,
        line1: impl Into<String>,
        line2: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            line1: line1.into(),
            line2: line2.into(),
        }
    }

    /// Parses the TLE lines into SGP4 elements.
    pub fn parse(&self) -> Result<Elements, TrackingError> {
        Elements::from_tle(
            Some(self.name.clone()),
            self.line1.trim().as_bytes(),
            self.line2.trim().as_bytes(),
        )
        .map_err(|error| TrackingError::InvalidElements {
            name: self.name.clone(),
            reason: format!("{error:?}"),
        })
    }
}

/// The predicted observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Azimuth, in degrees, within `[0, 360)`.
    pub azimuth: Degrees,
    /// Elevation, in degrees, within `[-90, 90]`.
    pub elevation: Degrees,
    /// Distance from the ground station to the satellite, in kilometers.
    pub range: Kilometers,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("invalid TLE for {name}: {reason}")]
    InvalidElements { name: String, reason: String },
    #[error("orbital elements rejected by SGP4: {0:?}")]
    Elements(sgp4::ElementsError),
    #[error("orbit prediction failed: {0:?}")]
    OrbitPrediction(orbit::OrbitPredictionError),
}

/// The tracker predicts the position of a satellite relative to the ground station.
pub struct Tracker {
    observer: PredictObserver,
    elements: Elements,
    constants: sgp4::Constants,
}

impl Tracker {
    pub fn new(station: &GroundStation, elements: Elements) -> Result<Self, TrackingError> {
        let constants =
            sgp4::Constants::from_elements(&elements).map_err(TrackingError::Elements)?;

        let observer = PredictObserver {
            name: "".to_string(),
            latitude: station.latitude * DEG_TO_RAD,
            longitude: station.longitude * DEG_TO_RAD,
            altitude: station.altitude,
            min_elevation: 0.0,
        };

        Ok(Self {
            observer,
            elements,
            constants,
        })
    }

    /// Predict the observation of the satellite at a given time.
    pub fn track(&self, at: DateTime<Utc>) -> Result<Observation, TrackingError> {
        let orbit = orbit::predict_orbit(&self.elements, &self.constants, at.timestamp() as f64)
            .map_err(TrackingError::OrbitPrediction)?;

        let observation = observer::predict_observe_orbit(&self.observer, &orbit);

        Ok(Observation {
            azimuth: normalize_azimuth(observation.azimuth * RAD_TO_DEG),
            elevation: observation.elevation * RAD_TO_DEG,
            range: observation.range,
        })
    }
}

fn normalize_azimuth(azimuth: Degrees) -> Degrees {
    let azimuth = azimuth.rem_euclid(360.0);
    // rem_euclid may round up to exactly 360 for tiny negative inputs.
    if azimuth >= 360.0 { 0.0 } else { azimuth }
}

/// Computes where a satellite is, as seen from somewhere, at some instant.
pub trait Propagator: Send + Sync {
    fn observe(
        &self,
        elements: &OrbitalElements,
        at: DateTime<Utc>,
    ) -> Result<Observation, TrackingError>;
}

/// SGP4 propagation followed by a topocentric observation from a fixed station.
///
/// Nothing is cached: every call parses the elements and propagates from scratch.
#[derive(Debug, Clone)]
pub struct Sgp4Propagator {
    station: GroundStation,
}

impl Sgp4Propagator {
    pub fn new(station: GroundStation) -> Self {
        Self { station }
    }

    pub fn station(&self) -> &GroundStation {
        &self.station
    }
}

impl Propagator for Sgp4Propagator {
    fn observe(
        &self,
        elements: &OrbitalElements,
        at: DateTime<Utc>,
    ) -> Result<Observation, TrackingError> {
        let tracker = Tracker::new(&self.station, elements.parse()?)?;
        tracker.track(at)
    }
}

/// Whether a satellite at `elevation` is above the true horizon.
///
/// Exactly 0° counts as visible. Local obstructions are ignored.
pub fn is_visible(elevation: Degrees) -> bool {
    elevation >= 0.0
}

/// A pointing angle for a satellite that passed the visibility gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointingAngle {
    azimuth: Degrees,
    elevation: Degrees,
}

impl PointingAngle {
    pub fn azimuth(&self) -> Degrees {
        self.azimuth
    }

    pub fn elevation(&self) -> Degrees {
        self.elevation
    }
}

/// Result of running an observation through the visibility gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointing {
    Visible(PointingAngle),
    BelowHorizon { azimuth: Degrees, elevation: Degrees },
}

impl Pointing {
    pub fn gate(observation: &Observation) -> Self {
        if is_visible(observation.elevation) {
            Pointing::Visible(PointingAngle {
                azimuth: observation.azimuth,
                elevation: observation.elevation,
            })
        } else {
            Pointing::BelowHorizon {
                azimuth: observation.azimuth,
                elevation: observation.elevation,
            }
        }
    }

    pub fn angle(&self) -> Option<&PointingAngle> {
        match self {
            Pointing::Visible(angle) => Some(angle),
            Pointing::BelowHorizon { .. } => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub const ISS_LINE1: &str =
        "1 25544U 98067A   25235.75642456  .00011222  00000+0  20339-3 0  9993";
    pub const ISS_LINE2: &str =
        "2 25544  51.6355 332.1708 0003307 260.2831  99.7785 15.50129787525648";

    fn lucknow() -> GroundStation {
        GroundStation::new(26.8467, 80.9462, 120.0)
    }

    fn observation(elevation: Degrees) -> Observation {
        Observation {
            azimuth: 118.4,
            elevation,
            range: 900.0,
        }
    }

    #[test]
    fn test_zero_elevation_is_visible() {
        assert!(is_visible(0.0));
        assert!(is_visible(45.0));
    }

    #[test]
    fn test_negative_elevation_is_not_visible() {
        assert!(!is_visible(-0.001));
        assert!(!is_visible(-90.0));
    }

    #[test]
    fn test_gate_keeps_angle_when_visible() {
        let pointing = Pointing::gate(&observation(32.7));

        let angle = pointing.angle().expect("satellite should be visible");
        assert_eq!(angle.azimuth(), 118.4);
        assert_eq!(angle.elevation(), 32.7);
    }

    #[test]
    fn test_gate_reports_below_horizon() {
        let pointing = Pointing::gate(&observation(-12.5));

        assert_eq!(
            pointing,
            Pointing::BelowHorizon {
                azimuth: 118.4,
                elevation: -12.5
            }
        );
        assert!(pointing.angle().is_none());
    }

    #[test]
    fn test_normalize_azimuth() {
        assert_eq!(normalize_azimuth(0.0), 0.0);
        assert_eq!(normalize_azimuth(360.0), 0.0);
        assert!((normalize_azimuth(-90.0) - 270.0).abs() < 1e-9);
        assert!((normalize_azimuth(450.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_tle_is_rejected() {
        let elements = OrbitalElements::new("BROKEN", "1 not a tle", "2 not a tle either");

        let result = Sgp4Propagator::new(lucknow()).observe(&elements, Utc::now());

        assert!(matches!(
            result,
            Err(TrackingError::InvalidElements { ref name, .. }) if name == "BROKEN"
        ));
    }

    #[test]
    fn test_observe_iss_returns_angles_in_range() {
        let elements = OrbitalElements::new("ISS (ZARYA)", ISS_LINE1, ISS_LINE2);
        let propagator = Sgp4Propagator::new(lucknow());

        // Shortly after the TLE epoch, so propagation error stays small.
        let at = Utc.with_ymd_and_hms(2025, 8, 24, 3, 0, 0).unwrap();

        let observation = propagator.observe(&elements, at).unwrap();

        assert!((0.0..360.0).contains(&observation.azimuth));
        assert!((-90.0..=90.0).contains(&observation.elevation));
        assert!(observation.range > 0.0);
    }

    #[test]
    fn test_observe_is_not_cached() {
        let elements = OrbitalElements::new("ISS (ZARYA)", ISS_LINE1, ISS_LINE2);
        let propagator = Sgp4Propagator::new(lucknow());
        let at = Utc.with_ymd_and_hms(2025, 8, 24, 3, 0, 0).unwrap();

        let first = propagator.observe(&elements, at).unwrap();
        let later = propagator
            .observe(&elements, at + chrono::Duration::seconds(60))
            .unwrap();

        // The ISS moves several hundred kilometers in a minute.
        assert_ne!(first, later);
    }
}
