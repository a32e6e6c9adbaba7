//! Text rendering for `placectl` output.

use std::fmt::Write;

use crate::map::{Annotation, Marker, Region};
use crate::place::Place;
use crate::store::PlaceStats;

const FAVORITE_MARK: char = '*';

fn favorite_mark(place: &Place) -> char {
    if place.is_favorite {
        FAVORITE_MARK
    } else {
        ' '
    }
}

/// One line per place.
#[must_use]
pub fn place_line(place: &Place) -> String {
    format!(
        "{:>4} {} {} ({}) @ {}",
        place.id,
        favorite_mark(place),
        place.display_name(),
        place.display_category(),
        place.coordinate()
    )
}

/// Aligned table with a header row.
#[must_use]
pub fn places_table(places: &[Place]) -> String {
    let name_width = places
        .iter()
        .map(|p| p.display_name().chars().count())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(0);
    let category_width = places
        .iter()
        .map(|p| p.display_category().chars().count())
        .chain(std::iter::once("CATEGORY".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:1}  {:<name_width$}  {:<category_width$}  LOCATION",
        "ID", "", "NAME", "CATEGORY"
    );
    for place in places {
        let _ = writeln!(
            out,
            "{:>4}  {:1}  {:<name_width$}  {:<category_width$}  {}",
            place.id,
            favorite_mark(place),
            place.display_name(),
            place.display_category(),
            place.coordinate()
        );
    }
    out
}

/// Multi-line view of a single place.
#[must_use]
pub fn place_detail(place: &Place) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", place.display_name());
    let _ = writeln!(out, "{}", "-".repeat(place.display_name().chars().count()));
    let _ = writeln!(out, "Id:        {}", place.id);
    let _ = writeln!(out, "Category:  {}", place.display_category());
    let _ = writeln!(out, "Latitude:  {:.4}", place.latitude);
    let _ = writeln!(out, "Longitude: {:.4}", place.longitude);
    let _ = writeln!(
        out,
        "Favorite:  {}",
        if place.is_favorite { "yes" } else { "no" }
    );
    let _ = writeln!(out, "Created:   {}", place.created_at.to_rfc3339());
    let _ = writeln!(out, "Updated:   {}", place.updated_at.to_rfc3339());
    if !place.notes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", place.notes);
    }
    out
}

/// Annotations followed by the starting region, if any.
#[must_use]
pub fn map_text(annotations: &[Annotation], region: Option<&Region>) -> String {
    let mut out = String::new();
    if let Some(region) = region {
        let _ = writeln!(
            out,
            "Region: {} (span {:.2} x {:.2})",
            region.center, region.latitude_delta, region.longitude_delta
        );
    }
    for annotation in annotations {
        let symbol = match annotation.marker {
            Marker::Star => "star",
            Marker::Pin => "pin ",
        };
        let _ = writeln!(
            out,
            "{symbol} {:>4} {} @ {}",
            annotation.id, annotation.title, annotation.coordinate
        );
    }
    out
}

/// Human-readable statistics.
#[must_use]
pub fn stats_text(stats: &PlaceStats, database: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "placectl stats");
    let _ = writeln!(out, "--------------");
    let _ = writeln!(out, "Database:       {database}");
    let _ = writeln!(out, "Schema version: {}", stats.schema_version);
    let _ = writeln!(out, "Size:           {} bytes", stats.db_size_bytes);
    let _ = writeln!(out, "Places:         {}", stats.total_places);
    let _ = writeln!(out, "Favorites:      {}", stats.favorite_places);
    let _ = writeln!(out, "Categories:     {}", stats.categories);
    match stats.last_modified {
        Some(ts) => {
            let _ = writeln!(out, "Last change:    {}", ts.to_rfc3339());
        }
        None => {
            let _ = writeln!(out, "Last change:    never");
        }
    }
    out
}
