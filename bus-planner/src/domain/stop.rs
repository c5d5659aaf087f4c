//! Stops: boardable quays and the stations that group them.

use super::{DomainError, LatLon};

/// GTFS `location_type` of a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationType {
    /// A boardable platform (`0` or empty).
    Quay,
    /// A station grouping quays (`1`).
    Station,
    /// Entrances, generic nodes and boarding areas (`2`..=`4`).
    Other(u8),
}

impl LocationType {
    /// Parse the raw feed value. Unknown values are treated as quays.
    pub fn from_gtfs(raw: &str) -> Self {
        match raw.trim() {
            "" | "0" => Self::Quay,
            "1" => Self::Station,
            other => match other.parse::<u8>() {
                Ok(n) if (2..=4).contains(&n) => Self::Other(n),
                _ => Self::Quay,
            },
        }
    }

    /// Returns true for stops riders can be routed to or from.
    pub fn is_searchable(&self) -> bool {
        matches!(self, Self::Quay | Self::Station)
    }
}

/// A stop from the feed.
///
/// The id is guaranteed non-empty; parent references are checked against
/// the whole stop table when the index is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub location: LatLon,
    pub parent_id: Option<String>,
    pub location_type: LocationType,
}

impl Stop {
    /// Create a stop, rejecting empty ids.
    ///
    /// An empty parent id is normalised to `None`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: LatLon,
        parent_id: Option<String>,
        location_type: LocationType,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyId("stop"));
        }
        let name = name.into();
        let name = if name.is_empty() { id.clone() } else { name };

        Ok(Self {
            id,
            name,
            location,
            parent_id: parent_id.filter(|p| !p.is_empty()),
            location_type,
        })
    }

    pub fn is_station(&self) -> bool {
        self.location_type == LocationType::Station
    }

    pub fn is_quay(&self) -> bool {
        self.location_type == LocationType::Quay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> LatLon {
        LatLon::new(45.184, 0.72)
    }

    #[test]
    fn location_type_parsing() {
        assert_eq!(LocationType::from_gtfs(""), LocationType::Quay);
        assert_eq!(LocationType::from_gtfs("0"), LocationType::Quay);
        assert_eq!(LocationType::from_gtfs(" 1 "), LocationType::Station);
        assert_eq!(LocationType::from_gtfs("2"), LocationType::Other(2));
        assert_eq!(LocationType::from_gtfs("9"), LocationType::Quay);
        assert!(!LocationType::Other(3).is_searchable());
    }

    #[test]
    fn rejects_empty_id() {
        let err = Stop::new("", "Somewhere", point(), None, LocationType::Quay);
        assert_eq!(err, Err(DomainError::EmptyId("stop")));
    }

    #[test]
    fn empty_parent_becomes_none() {
        let stop = Stop::new("S1", "Gare", point(), Some(String::new()), LocationType::Quay).unwrap();
        assert!(stop.parent_id.is_none());
    }

    #[test]
    fn empty_name_falls_back_to_id() {
        let stop = Stop::new("S1", "", point(), None, LocationType::Quay).unwrap();
        assert_eq!(stop.name, "S1");
    }
}
