//! Flight routes: ordered stops with per-stop intentions.
//!
//! A route is the engine's primary input. Each consecutive pair of stops
//! forms a leg; the intention recorded on an intermediate stop governs which
//! departure blocks are synthesized when the flight continues from it.

use serde::{Deserialize, Serialize};

use crate::dataset::Airport;

/// What the pilot intends to do at an intermediate stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intention {
    /// Land and take off again without stopping.
    TouchAndGo,
    /// Come to a stop on the runway, then take off.
    StopAndGo,
    /// Land and exit the runway.
    FullStop,
    /// Land, taxi back along the runway, and take off.
    TaxiBack,
}

/// Position of a stop within the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    /// The departure field.
    Dep,
    /// An intermediate stop.
    Stop,
    /// The final destination.
    Arr,
}

/// One stop on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// The airport, if one has been chosen. A leg touching a stop with no
    /// airport is skipped entirely during generation.
    pub airport: Option<Airport>,
    /// Position of this stop within the route.
    pub kind: StopKind,
    /// Intention at this stop, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intention: Option<Intention>,
}

impl Stop {
    /// A departure stop.
    #[must_use]
    pub fn departure(airport: Airport) -> Self {
        Self {
            airport: Some(airport),
            kind: StopKind::Dep,
            intention: None,
        }
    }

    /// An intermediate stop with the given intention.
    #[must_use]
    pub fn intermediate(airport: Airport, intention: Option<Intention>) -> Self {
        Self {
            airport: Some(airport),
            kind: StopKind::Stop,
            intention,
        }
    }

    /// The final destination.
    #[must_use]
    pub fn arrival(airport: Airport) -> Self {
        Self {
            airport: Some(airport),
            kind: StopKind::Arr,
            intention: None,
        }
    }
}

/// An ordered list of stops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// The stops, departure first.
    pub stops: Vec<Stop>,
}

impl Route {
    /// Build a route from stops.
    #[must_use]
    pub fn new(stops: Vec<Stop>) -> Self {
        Self { stops }
    }

    /// A direct route between two airports.
    #[must_use]
    pub fn direct(from: Airport, to: Airport) -> Self {
        Self {
            stops: vec![Stop::departure(from), Stop::arrival(to)],
        }
    }

    /// Number of legs (consecutive stop pairs).
    #[must_use]
    pub fn leg_count(&self) -> usize {
        self.stops.len().saturating_sub(1)
    }

    /// Iterate legs as `(leg_index, from, to)`.
    pub fn legs(&self) -> impl Iterator<Item = (usize, &Stop, &Stop)> {
        self.stops
            .windows(2)
            .enumerate()
            .map(|(i, pair)| (i, &pair[0], &pair[1]))
    }

    /// The departure stop's airport, if set.
    #[must_use]
    pub fn departure_airport(&self) -> Option<&Airport> {
        self.stops.first().and_then(|s| s.airport.as_ref())
    }

    /// The final stop's airport, if set.
    #[must_use]
    pub fn arrival_airport(&self) -> Option<&Airport> {
        self.stops.last().and_then(|s| s.airport.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Airport;

    fn airport(id: &str, towered: bool) -> Airport {
        Airport {
            id: id.to_string(),
            name: format!("{id} Field"),
            abridged: id.to_string(),
            city: String::new(),
            state: String::new(),
            runways: vec![],
            towered,
            kind: None,
        }
    }

    #[test]
    fn test_direct_route() {
        let route = Route::direct(airport("KADH", false), airport("KOKC", true));
        assert_eq!(route.stops.len(), 2);
        assert_eq!(route.leg_count(), 1);
        assert_eq!(route.stops[0].kind, StopKind::Dep);
        assert_eq!(route.stops[1].kind, StopKind::Arr);
    }

    #[test]
    fn test_legs_iteration() {
        let route = Route::new(vec![
            Stop::departure(airport("KADH", false)),
            Stop::intermediate(airport("KOUN", true), Some(Intention::TouchAndGo)),
            Stop::arrival(airport("KOKC", true)),
        ]);

        let legs: Vec<_> = route.legs().collect();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].0, 0);
        assert_eq!(
            legs[0].1.airport.as_ref().map(|a| a.id.as_str()),
            Some("KADH")
        );
        assert_eq!(
            legs[1].2.airport.as_ref().map(|a| a.id.as_str()),
            Some("KOKC")
        );
    }

    #[test]
    fn test_empty_route_has_no_legs() {
        let route = Route::default();
        assert_eq!(route.leg_count(), 0);
        assert!(route.legs().next().is_none());
        assert!(route.departure_airport().is_none());
    }

    #[test]
    fn test_intention_serde() {
        let json = serde_json::to_string(&Intention::TouchAndGo).unwrap();
        assert_eq!(json, "\"touch_and_go\"");
        let parsed: Intention = serde_json::from_str("\"taxi_back\"").unwrap();
        assert_eq!(parsed, Intention::TaxiBack);
    }

    #[test]
    fn test_endpoint_airports() {
        let route = Route::direct(airport("KADH", false), airport("KTUL", true));
        assert_eq!(route.departure_airport().map(|a| a.id.as_str()), Some("KADH"));
        assert_eq!(route.arrival_airport().map(|a| a.id.as_str()), Some("KTUL"));
    }
}
