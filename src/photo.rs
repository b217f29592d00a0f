use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::backend::ObjectStore;
use crate::codec::format_point;
use crate::error::TripGeoError;
use crate::geometry_types::Point;

/// The subset of EXIF tags the photo form asks the metadata reader for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExifOutput {
    #[serde(default, rename = "DateTimeOriginal")]
    pub date_time_original: Option<String>,
    /// Degrees, minutes, seconds.
    #[serde(default, rename = "GPSLatitude")]
    pub gps_latitude: Option<[f64; 3]>,
    #[serde(default, rename = "GPSLongitude")]
    pub gps_longitude: Option<[f64; 3]>,
    /// `N` or `S`.
    #[serde(default, rename = "GPSLatitudeRef")]
    pub gps_latitude_ref: Option<String>,
    /// `E` or `W`.
    #[serde(default, rename = "GPSLongitudeRef")]
    pub gps_longitude_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoMetadata {
    pub gps: Option<Point>,
    pub date: Option<String>,
}

impl PhotoMetadata {
    pub fn from_exif(exif: &ExifOutput) -> Self {
        let gps = match (exif.gps_latitude, exif.gps_longitude) {
            (Some(lat), Some(lon)) => {
                let point = Point::new(
                    dms_to_decimal(lon, exif.gps_longitude_ref.as_deref()),
                    dms_to_decimal(lat, exif.gps_latitude_ref.as_deref()),
                );
                point.is_valid().then_some(point)
            }
            _ => None,
        };

        Self {
            gps,
            date: exif.date_time_original.clone(),
        }
    }
}

/// `d + m/60 + s/3600`, negated for southern and western hemispheres.
pub fn dms_to_decimal(dms: [f64; 3], hemisphere: Option<&str>) -> f64 {
    let [d, m, s] = dms;
    let value = d + m / 60.0 + s / 3600.0;
    match hemisphere.map(str::trim) {
        Some("S" | "s" | "W" | "w") => -value.abs(),
        _ => value,
    }
}

/// Object key for a user's photo: `<user_id>/<photo_id>-<file_name>`.
pub fn storage_key(user_id: &str, photo_id: &str, file_name: &str) -> String {
    format!("{user_id}/{photo_id}-{file_name}")
}

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub metadata: PhotoMetadata,
    pub title: Option<String>,
    pub note: Option<String>,
    pub is_cover_photo: bool,
}

/// Row stored for an uploaded photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedPhoto {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub is_cover_photo: bool,
}

/// Upload every photo concurrently and wait for all of them.
///
/// Results keep input order. If any upload fails the whole batch fails,
/// reporting how many failed and the first failure in input order.
pub async fn upload_photos<S: ObjectStore>(
    store: &S,
    user_id: &str,
    photos: &[PhotoUpload],
) -> Result<Vec<UploadedPhoto>, TripGeoError> {
    let results = join_all(photos.iter().map(|photo| upload_photo(store, user_id, photo))).await;

    let total = results.len();
    let mut uploaded = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(photo) => uploaded.push(photo),
            Err(e) => failures.push(e),
        }
    }

    match failures.first() {
        None => {
            log::info!("uploaded {total} photos for {user_id}");
            Ok(uploaded)
        }
        Some(first) => {
            for e in &failures {
                log::warn!("photo upload failed: {e}");
            }
            Err(TripGeoError::Upload {
                failed: failures.len(),
                total,
                first: first.to_string(),
            })
        }
    }
}

async fn upload_photo<S: ObjectStore>(
    store: &S,
    user_id: &str,
    photo: &PhotoUpload,
) -> Result<UploadedPhoto, TripGeoError> {
    let key = storage_key(user_id, &photo.id, &photo.file_name);
    store.upload(&key, &photo.bytes).await?;

    Ok(UploadedPhoto {
        url: store.public_url(&key),
        name: key,
        gps_reference: photo.metadata.gps.as_ref().map(format_point),
        date: photo.metadata.date.clone(),
        title: photo.title.clone(),
        note: photo.note.clone(),
        is_cover_photo: photo.is_cover_photo,
    })
}
