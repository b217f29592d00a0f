use serde::{Deserialize, Serialize};

use crate::codec::format_geography_point;
use crate::error::TripGeoError;
use crate::options::SniffOptions;
use crate::parser::convert_track_file;
use crate::track_file::TrackFile;

/// A trip path as stored by the backend.
///
/// Inserts send canonical text; the per-user summary procedure returns a
/// GeoJSON geometry object. Anything else is kept as `Invalid` so one bad
/// row does not fail the whole trip set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredGeometry {
    Text(String),
    GeoJson(geojson::Geometry),
    Invalid(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPhoto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "signedUrl")]
    pub signed_url: Option<String>,
    #[serde(default)]
    pub is_cover_photo: bool,
}

/// A trip as read back for the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub long: Option<f64>,
    #[serde(default)]
    pub trip_path: Option<StoredGeometry>,
    #[serde(default)]
    pub photos: Vec<TripPhoto>,
}

impl TripRecord {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            created_at: None,
            lat: None,
            long: None,
            trip_path: None,
            photos: Vec::new(),
        }
    }

    pub fn with_point(mut self, lat: f64, long: f64) -> Self {
        self.lat = Some(lat);
        self.long = Some(long);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.trip_path = Some(StoredGeometry::Text(path.into()));
        self
    }

    pub fn cover_photo(&self) -> Option<&TripPhoto> {
        self.photos.iter().find(|p| p.is_cover_photo)
    }
}

/// Raw input of the create-trip form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripForm {
    pub title: String,
    pub description: String,
    /// Free text `"longitude, latitude"`.
    pub gps_reference: String,
    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: String,
}

/// Insert payload for a new trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTrip {
    pub title: String,
    pub description: String,
    pub gps_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_path: Option<String>,
    #[serde(skip)]
    pub tags: Vec<String>,
}

impl TripForm {
    /// Check required fields and format the GPS reference.
    pub fn prepare(&self, trip_path: Option<String>) -> Result<NewTrip, TripGeoError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let gps_reference = format_geography_point(required("gps_reference", &self.gps_reference)?)?;

        Ok(NewTrip {
            title: title.to_string(),
            description: description.to_string(),
            gps_reference,
            trip_path,
            tags: parse_tags(&self.tags),
        })
    }

    /// Like [`TripForm::prepare`], converting an optional uploaded track
    /// file first. A file that yields no track leaves `trip_path` unset.
    pub async fn prepare_with_track<F: TrackFile>(
        &self,
        track: Option<&F>,
        opts: &SniffOptions,
    ) -> Result<NewTrip, TripGeoError> {
        let trip_path = match track {
            Some(file) => convert_track_file(file, opts).await,
            None => None,
        };
        self.prepare(trip_path)
    }
}

/// Split comma-separated tags, trimming and dropping blanks and repeats.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, TripGeoError> {
    let value = value.trim();
    if value.is_empty() {
        Err(TripGeoError::MissingField(field))
    } else {
        Ok(value)
    }
}
