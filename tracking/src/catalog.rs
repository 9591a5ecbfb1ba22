//! Static satellite catalog.
//!
//! The catalog is a JSON document of the form
//!
//! ```json
//! {
//!   "satellites": [
//!     { "name": "ISS (ZARYA)", "tle_line1": "1 25544U ...", "tle_line2": "2 25544 ..." }
//!   ]
//! }
//! ```
//!
//! It is loaded once at startup and only ever looked up by exact name.

use crate::OrbitalElements;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("satellite {0:?} not found in catalog")]
    NotFound(String),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    satellites: Vec<OrbitalElements>,
}

impl Catalog {
    pub fn new(satellites: Vec<OrbitalElements>) -> Self {
        Self { satellites }
    }

    /// Load the catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;

        log::info!(
            "Loaded {} satellites from {}",
            catalog.satellites.len(),
            path.display()
        );

        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a satellite by its exact display name.
    pub fn find(&self, name: &str) -> Result<&OrbitalElements, CatalogError> {
        self.satellites
            .iter()
            .find(|satellite| satellite.name == name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.satellites.iter().map(|satellite| satellite.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{ISS_LINE1, ISS_LINE2};
    use std::io::Write;

    fn catalog_json() -> String {
        serde_json::json!({
            "satellites": [
                { "name": "ISS (ZARYA)", "tle_line1": ISS_LINE1, "tle_line2": ISS_LINE2 },
                {
                    "name": "SAOCOM 1A",
                    "tle_line1": "1 43641U 18076A   25153.18667784  .00000524  00000-0  72414-4 0  9996",
                    "tle_line2": "2 43641  97.8889 340.3845 0001448  91.2759 268.8620 14.82151789359810"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_find_by_exact_name() {
        let catalog = Catalog::from_json(&catalog_json()).unwrap();

        let iss = catalog.find("ISS (ZARYA)").unwrap();
        assert_eq!(iss.line1, ISS_LINE1);
        assert_eq!(iss.line2, ISS_LINE2);
    }

    #[test]
    fn test_find_is_case_sensitive() {
        let catalog = Catalog::from_json(&catalog_json()).unwrap();

        let result = catalog.find("iss (zarya)");
        assert!(matches!(result, Err(CatalogError::NotFound(ref name)) if name == "iss (zarya)"));
    }

    #[test]
    fn test_names_preserve_catalog_order() {
        let catalog = Catalog::from_json(&catalog_json()).unwrap();

        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["ISS (ZARYA)", "SAOCOM 1A"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(catalog_json().as_bytes()).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert!(catalog.find("SAOCOM 1A").is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load("/definitely/not/here/satellites.json");
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }

    #[test]
    fn test_malformed_catalog() {
        let result = Catalog::from_json(r#"{ "satellites": [ { "name": "X" } ] }"#);
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }
}
