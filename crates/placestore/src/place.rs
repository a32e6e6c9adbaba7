//! Core place types for placestore.
//!
//! This module defines the record the store persists, plus the field sets
//! callers hand to the store when creating or editing one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque identifier of a stored place.
///
/// Assigned by the store at creation and never reused, even after the
/// place is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(i64);

impl PlaceId {
    /// Wrap a raw row id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PlaceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A latitude/longitude pair in degrees.
///
/// No range checking is done here; whatever the location provider or the
/// user supplies is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Parses `"<lat>,<lon>"`, with optional whitespace around either number.
impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lat, lon) = s.split_once(',').ok_or_else(|| {
            Error::validation("coordinate", format!("expected \"lat,lon\", got \"{s}\""))
        })?;

        Ok(Self::new(
            parse_degrees("latitude", lat)?,
            parse_degrees("longitude", lon)?,
        ))
    }
}

fn parse_degrees(field: &'static str, raw: &str) -> Result<f64> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| Error::validation(field, format!("not a number: \"{raw}\"")))
}

/// A bookmarked place of interest.
///
/// Values handed out by the store are snapshots: changing a field here has
/// no effect on what is stored. Route every change through
/// [`PlaceStore`](crate::store::PlaceStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Unique identifier assigned by the store.
    pub id: PlaceId,

    /// Display name. May be empty.
    pub name: String,

    /// Free-form category. Empty when unset.
    pub category: String,

    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Free-text notes. Empty when unset.
    pub notes: String,

    /// Whether the user marked this place as a favorite.
    pub is_favorite: bool,

    /// When the place was created.
    pub created_at: DateTime<Utc>,

    /// When the place was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Place {
    /// The place's location.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Name to show for this place, falling back when the name is empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unknown Place"
        } else {
            &self.name
        }
    }

    /// Category to show for this place, falling back when none is set.
    #[must_use]
    pub fn display_category(&self) -> &str {
        if self.category.is_empty() {
            "Uncategorized"
        } else {
            &self.category
        }
    }
}

/// Field values for a place that has not been stored yet.
///
/// Unset fields default to empty text, `0.0` degrees and not-favorite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceDraft {
    /// Display name.
    pub name: String,
    /// Free-form category.
    pub category: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Free-text notes.
    pub notes: String,
    /// Favorite flag.
    pub is_favorite: bool,
}

impl PlaceDraft {
    /// Start a draft with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the location.
    #[must_use]
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.latitude = coordinate.latitude;
        self.longitude = coordinate.longitude;
        self
    }

    /// Set the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set the favorite flag.
    #[must_use]
    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    /// Check the rules an edit form applies before saving.
    ///
    /// The store accepts any draft; front ends call this to refuse a save
    /// with a blank name or a non-finite coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        if !self.latitude.is_finite() {
            return Err(Error::validation("latitude", "must be a finite number"));
        }
        if !self.longitude.is_finite() {
            return Err(Error::validation("longitude", "must be a finite number"));
        }
        Ok(())
    }
}

/// A partial update: only the fields that are `Some` are changed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacePatch {
    /// New name.
    pub name: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New latitude.
    pub latitude: Option<f64>,
    /// New longitude.
    pub longitude: Option<f64>,
    /// New notes.
    pub notes: Option<String>,
    /// New favorite flag.
    pub is_favorite: Option<bool>,
}

impl PlacePatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that overwrites every editable field with the draft's values.
    ///
    /// This is what an edit form that re-submits all of its fields produces.
    #[must_use]
    pub fn replace_with(draft: &PlaceDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
            category: Some(draft.category.clone()),
            latitude: Some(draft.latitude),
            longitude: Some(draft.longitude),
            notes: Some(draft.notes.clone()),
            is_favorite: Some(draft.is_favorite),
        }
    }

    /// Change the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Change the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Change the location.
    #[must_use]
    pub fn coordinate(mut self, coordinate: Coordinate) -> Self {
        self.latitude = Some(coordinate.latitude);
        self.longitude = Some(coordinate.longitude);
        self
    }

    /// Change the notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Change the favorite flag.
    #[must_use]
    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.notes.is_none()
            && self.is_favorite.is_none()
    }

    /// Apply the patch to a snapshot, leaving absent fields untouched.
    ///
    /// Timestamps are not touched; the store owns them.
    pub fn apply_to(&self, place: &mut Place) {
        if let Some(name) = &self.name {
            place.name.clone_from(name);
        }
        if let Some(category) = &self.category {
            place.category.clone_from(category);
        }
        if let Some(latitude) = self.latitude {
            place.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            place.longitude = longitude;
        }
        if let Some(notes) = &self.notes {
            place.notes.clone_from(notes);
        }
        if let Some(is_favorite) = self.is_favorite {
            place.is_favorite = is_favorite;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_place() -> Place {
        let now = Utc::now();
        Place {
            id: PlaceId::new(1),
            name: "Pike Place Market".to_string(),
            category: "Market".to_string(),
            latitude: 47.609,
            longitude: -122.342,
            notes: String::new(),
            is_favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_place_id_display_and_parse() {
        let id = PlaceId::new(17);
        assert_eq!(id.to_string(), "17");
        assert_eq!(" 17 ".parse::<PlaceId>().unwrap(), id);
        assert!("abc".parse::<PlaceId>().is_err());
    }

    #[test]
    fn test_place_id_serializes_as_number() {
        let json = serde_json::to_string(&PlaceId::new(5)).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn test_coordinate_parse() {
        let coord: Coordinate = "47.609, -122.342".parse().unwrap();
        assert!((coord.latitude - 47.609).abs() < f64::EPSILON);
        assert!((coord.longitude + 122.342).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coordinate_parse_accepts_out_of_range() {
        let coord: Coordinate = "123.0,500.0".parse().unwrap();
        assert!((coord.latitude - 123.0).abs() < f64::EPSILON);
        assert!((coord.longitude - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coordinate_parse_errors() {
        let err = "47.6".parse::<Coordinate>().unwrap_err();
        assert!(err.is_validation_error());

        let err = "north,-122".parse::<Coordinate>().unwrap_err();
        assert!(err.to_string().contains("latitude"));

        let err = "47.6,west".parse::<Coordinate>().unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn test_coordinate_display() {
        let coord = Coordinate::new(47.609_12, -122.342_34);
        assert_eq!(coord.to_string(), "47.6091, -122.3423");
    }

    #[test]
    fn test_display_fallbacks() {
        let mut place = sample_place();
        assert_eq!(place.display_name(), "Pike Place Market");
        assert_eq!(place.display_category(), "Market");

        place.name.clear();
        place.category.clear();
        assert_eq!(place.display_name(), "Unknown Place");
        assert_eq!(place.display_category(), "Uncategorized");
    }

    #[test]
    fn test_draft_defaults() {
        let draft = PlaceDraft::new("Cafe");
        assert_eq!(draft.name, "Cafe");
        assert!(draft.category.is_empty());
        assert!(draft.notes.is_empty());
        assert!(!draft.is_favorite);
        assert!(draft.latitude.abs() < f64::EPSILON);
    }

    #[test]
    fn test_draft_builder() {
        let draft = PlaceDraft::new("Space Needle")
            .with_category("Landmark")
            .with_coordinate(Coordinate::new(47.6205, -122.3493))
            .with_notes("Go at sunset")
            .favorite(true);

        assert_eq!(draft.category, "Landmark");
        assert_eq!(draft.notes, "Go at sunset");
        assert!(draft.is_favorite);
        assert!((draft.longitude + 122.3493).abs() < f64::EPSILON);
    }

    #[test]
    fn test_draft_validate() {
        assert!(PlaceDraft::new("Somewhere").validate().is_ok());

        let err = PlaceDraft::new("   ").validate().unwrap_err();
        assert!(err.to_string().contains("name"));

        let err = PlaceDraft::new("Nowhere")
            .with_coordinate(Coordinate::new(f64::NAN, 0.0))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_patch_apply_only_changes_present_fields() {
        let original = sample_place();
        let mut place = original.clone();

        PlacePatch::new().notes("Fish throwing").apply_to(&mut place);

        assert_eq!(place.notes, "Fish throwing");
        assert_eq!(place.name, original.name);
        assert_eq!(place.category, original.category);
        assert_eq!(place.is_favorite, original.is_favorite);
        assert!((place.latitude - original.latitude).abs() < f64::EPSILON);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(PlacePatch::new().is_empty());
        assert!(!PlacePatch::new().favorite(true).is_empty());
        assert!(!PlacePatch::new()
            .coordinate(Coordinate::new(1.0, 2.0))
            .is_empty());
    }

    #[test]
    fn test_patch_replace_with_draft() {
        let draft = PlaceDraft::new("Gas Works Park")
            .with_category("Park")
            .favorite(true);
        let mut place = sample_place();

        PlacePatch::replace_with(&draft).apply_to(&mut place);

        assert_eq!(place.name, "Gas Works Park");
        assert_eq!(place.category, "Park");
        assert!(place.is_favorite);
        assert!(place.latitude.abs() < f64::EPSILON);
    }

    #[test]
    fn test_place_serialization() {
        let place = sample_place();
        let json = serde_json::to_string(&place).unwrap();
        let deserialized: Place = serde_json::from_str(&json).unwrap();
        assert_eq!(place, deserialized);
    }
}
