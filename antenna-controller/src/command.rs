use std::fmt;

/// A pointing command in the rotator's wire format: `<AZ{az}><EL{el}>\n`.
///
/// Both angles are rounded half-to-even to whole degrees. No clamping is done
/// here, so an azimuth of 359.6 goes out as `AZ360`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorCommand(String);

impl RotatorCommand {
    pub fn new(azimuth: f64, elevation: f64) -> Self {
        let azimuth = azimuth.round_ties_even() as i64;
        let elevation = elevation.round_ties_even() as i64;

        Self(format!("<AZ{azimuth}><EL{elevation}>\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RotatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.trim_end())
    }
}
