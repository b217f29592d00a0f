use std::rc::Rc;

use serde::Serialize;

use crate::codec::parse_line_string;
use crate::error::TripGeoError;
use crate::geometry_types::{Geometry, Point};
use crate::trip::{StoredGeometry, TripRecord};

/// A trip's single renderable geometry.
#[derive(Debug, Clone)]
pub struct TripGeometry {
    pub geometry: Geometry,
    pub trip: Rc<TripRecord>,
}

/// A record skipped during normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub trip_id: i64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct NormalizedTrips {
    pub geometries: Vec<TripGeometry>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Pick the geometry to render for one trip.
///
/// A stored path wins over the standalone point; a trip with neither
/// renders nothing. A blank text path counts as no path.
pub fn normalize_trip(trip: &TripRecord) -> Result<Option<Geometry>, TripGeoError> {
    let path = trip
        .trip_path
        .as_ref()
        .filter(|path| !matches!(path, StoredGeometry::Text(text) if text.trim().is_empty()));
    if let Some(path) = path {
        return stored_line(trip.id, path).map(Some);
    }

    match (trip.lat, trip.long) {
        (Some(lat), Some(long)) => {
            let point = Point::new(long, lat);
            if !point.is_valid() {
                return Err(malformed(trip.id, format!("point ({long}, {lat}) out of range")));
            }
            Ok(Some(Geometry::Point(point)))
        }
        _ => Ok(None),
    }
}

/// Normalize a whole trip set. A bad record is skipped with a diagnostic
/// and never affects its siblings.
pub fn normalize_trips(trips: Vec<TripRecord>) -> NormalizedTrips {
    let mut out = NormalizedTrips::default();

    for trip in trips {
        match normalize_trip(&trip) {
            Ok(Some(geometry)) => out.geometries.push(TripGeometry {
                geometry,
                trip: Rc::new(trip),
            }),
            Ok(None) => {}
            Err(e) => {
                log::warn!("skipping trip {}: {e}", trip.id);
                out.diagnostics.push(Diagnostic {
                    trip_id: trip.id,
                    message: e.to_string(),
                });
            }
        }
    }

    out
}

fn stored_line(trip_id: i64, path: &StoredGeometry) -> Result<Geometry, TripGeoError> {
    let points = match path {
        StoredGeometry::Text(text) => {
            parse_line_string(text).map_err(|e| malformed(trip_id, e.to_string()))?
        }
        StoredGeometry::GeoJson(geometry) => match &geometry.value {
            geojson::Value::LineString(coords) => coords
                .iter()
                .map(|c| match c.as_slice() {
                    [lon, lat, ..] => Ok(Point::new(*lon, *lat)),
                    _ => Err(malformed(trip_id, "position with fewer than 2 values".to_string())),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(malformed(
                    trip_id,
                    format!("expected LineString, got {}", geojson_type(other)),
                ));
            }
        },
        StoredGeometry::Invalid(value) => {
            return Err(malformed(trip_id, format!("unrecognized trip path {value}")));
        }
    };

    if points.is_empty() {
        return Err(malformed(trip_id, "line has no vertices".to_string()));
    }
    if let Some(bad) = points.iter().find(|p| !p.is_valid()) {
        return Err(malformed(
            trip_id,
            format!("vertex ({}, {}) out of range", bad.lon, bad.lat),
        ));
    }

    Ok(Geometry::Line(points))
}

fn geojson_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn malformed(trip_id: i64, reason: String) -> TripGeoError {
    TripGeoError::MalformedStoredGeometry { trip_id, reason }
}
