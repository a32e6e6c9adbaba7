//! Map projection of stored places.
//!
//! Turns place snapshots into the data a map view needs: one annotation per
//! place and the region the camera should show. Drawing is left to the
//! front end.

use serde::{Deserialize, Serialize};

use crate::place::{Coordinate, Place, PlaceId};

/// Span in degrees used when framing the whole collection.
pub const OVERVIEW_SPAN_DEGREES: f64 = 0.05;

/// Span in degrees used when framing a single place.
pub const DETAIL_SPAN_DEGREES: f64 = 0.01;

/// Title for an annotation whose place has no name.
const UNTITLED: &str = "Place";

/// Symbol a place is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Favorite place.
    Star,
    /// Any other place.
    Pin,
}

/// One place on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// The place this annotation links to.
    pub id: PlaceId,
    /// Label shown next to the marker.
    pub title: String,
    /// Where the marker goes.
    pub coordinate: Coordinate,
    /// Which symbol to draw.
    pub marker: Marker,
}

impl Annotation {
    /// Build the annotation for a place.
    #[must_use]
    pub fn from_place(place: &Place) -> Self {
        let title = if place.name.is_empty() {
            UNTITLED.to_string()
        } else {
            place.name.clone()
        };
        let marker = if place.is_favorite {
            Marker::Star
        } else {
            Marker::Pin
        };

        Self {
            id: place.id,
            title,
            coordinate: place.coordinate(),
            marker,
        }
    }
}

/// Annotations for a snapshot, in the snapshot's order.
#[must_use]
pub fn annotations(places: &[Place]) -> Vec<Annotation> {
    places.iter().map(Annotation::from_place).collect()
}

/// A rectangular area of the map, as a center and a span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Center of the region.
    pub center: Coordinate,
    /// North-south extent in degrees.
    pub latitude_delta: f64,
    /// East-west extent in degrees.
    pub longitude_delta: f64,
}

impl Region {
    /// A square region around `center`.
    #[must_use]
    pub const fn around(center: Coordinate, span: f64) -> Self {
        Self {
            center,
            latitude_delta: span,
            longitude_delta: span,
        }
    }

    /// Starting region for the map of all places.
    ///
    /// Centers on the first place of the snapshot; with the default
    /// name-ordered listing that is the alphabetically first place.
    /// Returns `None` for an empty snapshot, leaving the camera to the map.
    #[must_use]
    pub fn overview(places: &[Place]) -> Option<Self> {
        places
            .first()
            .map(|place| Self::around(place.coordinate(), OVERVIEW_SPAN_DEGREES))
    }

    /// Region for a single place's detail view.
    #[must_use]
    pub fn detail(place: &Place) -> Self {
        Self::around(place.coordinate(), DETAIL_SPAN_DEGREES)
    }

    /// Whether `point` lies inside the region (edges included).
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        let half_lat = self.latitude_delta / 2.0;
        let half_lon = self.longitude_delta / 2.0;
        (point.latitude - self.center.latitude).abs() <= half_lat
            && (point.longitude - self.center.longitude).abs() <= half_lon
    }
}
