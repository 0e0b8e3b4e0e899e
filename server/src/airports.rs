use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use shared::models::{Airport, LatLon};

/// Immutable airport directory, loaded once at startup and shared read-only
/// across requests.
pub struct Directory {
    airports: Vec<Airport>,
}

#[derive(Clone, Debug, Default)]
pub struct AirportQuery {
    pub search: Option<String>,
    pub origin: Option<LatLon>,
    pub offset: usize,
    pub limit: usize,
}

impl Directory {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read airports dataset: {}", path.display()))?;
        let airports: Vec<Airport> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse airports dataset: {}", path.display()))?;

        Ok(Self::new(airports))
    }

    pub fn new(airports: Vec<Airport>) -> Self {
        Self { airports }
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    /// Look up an airport by its ICAO code.
    pub fn get(&self, id: &str) -> Option<&Airport> {
        self.airports.iter().find(|airport| airport.id == id)
    }

    /// Filter by search text, rank by distance to the origin, then page.
    /// The filter runs before ranking so the whole filtered set is ranked,
    /// and the page window is applied last.
    pub fn query(&self, query: &AirportQuery) -> Vec<Airport> {
        let mut results: Vec<&Airport> = match query.search.as_deref() {
            Some(search) if !search.is_empty() => {
                let search = search.to_lowercase();
                self.airports
                    .iter()
                    .filter(|airport| {
                        airport.city.to_lowercase().contains(&search)
                            || airport.id.to_lowercase().contains(&search)
                            || airport.name.to_lowercase().contains(&search)
                    })
                    .collect()
            }
            _ => self.airports.iter().collect(),
        };

        if let Some(origin) = &query.origin {
            let mut ranked: Vec<(f64, &Airport)> = results
                .into_iter()
                .map(|airport| (airport.coordinates.distance_km(origin), airport))
                .collect();

            // Stable sort: equally distant airports keep their dataset order
            ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            results = ranked.into_iter().map(|(_, airport)| airport).collect();
        }

        let start = query.offset.min(results.len());
        let end = query.offset.saturating_add(query.limit).min(results.len());

        results[start..end].iter().map(|&airport| airport.clone()).collect()
    }
}
