//! Airport directory.
//!
//! The directory is derived offline from a public aviation dataset (filtered
//! to non-closed public-use fields of the configured size classes, with
//! `towered` derived from the presence of a tower frequency record). At
//! runtime it is a read-only JSON array; a small hardcoded default list keeps
//! the application usable when the file is missing.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// One airport record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    /// ICAO-style identifier, e.g. `KADH`.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Short name used in phraseology, e.g. `Ada`.
    pub abridged: String,
    /// City served.
    #[serde(default)]
    pub city: String,
    /// State or region.
    #[serde(default)]
    pub state: String,
    /// Runway designators.
    #[serde(default)]
    pub runways: Vec<String>,
    /// Whether the field has an active control tower frequency.
    pub towered: bool,
    /// Dataset size classification, if present.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Airport {
    /// The short name used in phraseology, falling back to the full name.
    #[must_use]
    pub fn short_name(&self) -> &str {
        if self.abridged.is_empty() {
            &self.name
        } else {
            &self.abridged
        }
    }
}

/// The loaded airport directory.
#[derive(Debug, Clone)]
pub struct AirportDirectory {
    airports: Vec<Airport>,
}

impl Default for AirportDirectory {
    fn default() -> Self {
        Self {
            airports: default_airports(),
        }
    }
}

impl AirportDirectory {
    /// Load the directory from a JSON dataset file.
    ///
    /// Any failure degrades to the hardcoded default list with a warning.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(directory) => directory,
            Err(err) => {
                warn!("failed to load airport directory, using defaults: {err}");
                Self::default()
            }
        }
    }

    /// Load the directory, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset file cannot be read or parsed.
    pub fn try_load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::DatasetRead {
            path: path.to_path_buf(),
            source,
        })?;
        let airports: Vec<Airport> =
            serde_json::from_str(&raw).map_err(|source| Error::DatasetParse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("loaded {} airports from {}", airports.len(), path.display());
        Ok(Self { airports })
    }

    /// Build a directory from explicit records (fixtures, tests).
    #[must_use]
    pub fn from_airports(airports: Vec<Airport>) -> Self {
        Self { airports }
    }

    /// Look up an airport by identifier, case-insensitively, accepting the
    /// bare identifier without the leading `K` for US fields.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Airport> {
        let lower = id.to_lowercase();
        let with_k = format!("k{lower}");
        self.airports
            .iter()
            .find(|a| a.id.to_lowercase() == lower)
            .or_else(|| self.airports.iter().find(|a| a.id.to_lowercase() == with_k))
    }

    /// Ranked search over identifier, name, short name, and city.
    ///
    /// Exact identifier matches win outright; otherwise results are ordered
    /// exact city/short-name match, identifier prefix, name/city prefix,
    /// substring. At most ten results are returned.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Airport> {
        const MAX_RESULTS: usize = 10;
        const SCAN_CAP: usize = 50;

        if term.len() < 2 {
            return Vec::new();
        }
        let lower = term.to_lowercase();
        let with_k = format!("k{lower}");

        let exact_id: Vec<&Airport> = self
            .airports
            .iter()
            .filter(|a| a.id.to_lowercase() == lower)
            .collect();
        if !exact_id.is_empty() {
            return exact_id.into_iter().take(MAX_RESULTS).collect();
        }

        let exact_with_k: Vec<&Airport> = self
            .airports
            .iter()
            .filter(|a| a.id.to_lowercase() == with_k)
            .collect();
        if !exact_with_k.is_empty() {
            return exact_with_k.into_iter().take(MAX_RESULTS).collect();
        }

        let mut exact_city = Vec::new();
        let mut id_prefix = Vec::new();
        let mut starts_with = Vec::new();
        let mut other = Vec::new();

        for airport in &self.airports {
            let id = airport.id.to_lowercase();
            let city = airport.city.to_lowercase();
            let name = airport.name.to_lowercase();
            let abridged = airport.abridged.to_lowercase();

            if city == lower || abridged == lower {
                exact_city.push(airport);
            } else if id.starts_with(&lower) || id.starts_with(&with_k) {
                id_prefix.push(airport);
            } else if city.starts_with(&lower)
                || abridged.starts_with(&lower)
                || name.starts_with(&lower)
            {
                starts_with.push(airport);
            } else if id.contains(&lower)
                || name.contains(&lower)
                || city.contains(&lower)
                || abridged.contains(&lower)
            {
                other.push(airport);
            }

            if exact_city.len() + id_prefix.len() + starts_with.len() + other.len() >= SCAN_CAP {
                break;
            }
        }

        exact_city
            .into_iter()
            .chain(id_prefix)
            .chain(starts_with)
            .chain(other)
            .take(MAX_RESULTS)
            .collect()
    }

    /// All airports in the directory.
    #[must_use]
    pub fn airports(&self) -> &[Airport] {
        &self.airports
    }

    /// Number of airports in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.airports.len()
    }

    /// Check whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}

/// Hardcoded fallback directory used when the dataset file is unavailable.
fn default_airports() -> Vec<Airport> {
    let mk = |id: &str, name: &str, abridged: &str, city: &str, runways: &[&str], towered| {
        Airport {
            id: id.to_string(),
            name: name.to_string(),
            abridged: abridged.to_string(),
            city: city.to_string(),
            state: "OK".to_string(),
            runways: runways.iter().map(ToString::to_string).collect(),
            towered,
            kind: None,
        }
    };
    vec![
        mk("KADH", "Ada Municipal", "Ada", "Ada", &["17", "35"], false),
        mk(
            "KOKC",
            "Will Rogers World",
            "Will Rogers",
            "Oklahoma City",
            &["17L", "35R", "13", "31"],
            true,
        ),
        mk(
            "KOUN",
            "Max Westheimer",
            "Max Westheimer",
            "Norman",
            &["03", "21", "17", "35"],
            true,
        ),
        mk(
            "KPWA",
            "Wiley Post",
            "Wiley Post",
            "Oklahoma City",
            &["17L", "35R", "17R", "35L"],
            true,
        ),
        mk(
            "KTUL",
            "Tulsa International",
            "Tulsa",
            "Tulsa",
            &["18L", "36R", "18R", "36L"],
            true,
        ),
    ]
}
