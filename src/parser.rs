use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::codec::line_string_from_pairs;
use crate::error::{TripGeoError, UnsupportedFile};
use crate::options::SniffOptions;
use crate::track_file::{read_track_document, TrackFile};

type Result<T> = std::result::Result<T, TripGeoError>;

/// A `<trkpt>` coordinate pair with attribute values kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPoint {
    pub lat: String,
    pub lon: String,
}

/// Every `<trkpt>` in a document, in document order.
#[derive(Debug, Default)]
pub struct TrackScan {
    /// Number of `<trkpt>` elements seen, including dropped ones.
    pub elements: usize,
    /// Points that carried both `lat` and `lon`.
    pub points: Vec<TrackPoint>,
}

/// Collect `<trkpt>` attributes from a GPX document.
///
/// Only attributes are read, so self-closing points and points with child
/// elements are treated alike. Points from all tracks and segments are
/// returned in the order they appear.
pub fn scan_track_points(xml: &str) -> Result<TrackScan> {
    let mut reader = Reader::from_str(xml);
    let mut scan = TrackScan::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    scan.elements += 1;
                    if let Some(pt) = parse_lat_lon(&e)? {
                        scan.points.push(pt);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TripGeoError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(scan)
}

/// Serialize the document's track points as `LINESTRING(lon lat, ...)`.
pub fn line_string_from_gpx(xml: &str) -> Result<String> {
    let scan = scan_track_points(xml)?;
    if scan.elements == 0 {
        return Err(UnsupportedFile::NoTrackPoints.into());
    }
    if scan.points.is_empty() {
        return Err(UnsupportedFile::NoCoordinates.into());
    }
    if scan.points.len() < scan.elements {
        log::debug!(
            "dropped {} of {} <trkpt> elements without lat/lon",
            scan.elements - scan.points.len(),
            scan.elements
        );
    }

    Ok(line_string_from_pairs(
        scan.points.iter().map(|pt| (pt.lon.as_str(), pt.lat.as_str())),
    ))
}

/// Read an uploaded track file and convert it to canonical line text.
///
/// Never fails: any problem is logged and yields `None`, so trip creation
/// can carry on without a track.
pub async fn convert_track_file<F: TrackFile>(file: &F, opts: &SniffOptions) -> Option<String> {
    match try_convert_track_file(file, opts).await {
        Ok(line) => Some(line),
        Err(e) => {
            log::warn!("could not extract a track: {e}");
            None
        }
    }
}

pub async fn try_convert_track_file<F: TrackFile>(file: &F, opts: &SniffOptions) -> Result<String> {
    let xml = read_track_document(file, opts).await?;
    line_string_from_gpx(&xml)
}

/// Read `lat`/`lon` from a point's start tag. `None` if either is missing.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<Option<TrackPoint>> {
    let mut lat: Option<String> = None;
    let mut lon: Option<String> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| TripGeoError::XmlParse(e.into()))?;
        // Undecodable values count as missing
        let Ok(val) = attr.unescape_value() else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(val.into_owned()),
            b"lon" => lon = Some(val.into_owned()),
            _ => {}
        }
    }

    Ok(lat.zip(lon).map(|(lat, lon)| TrackPoint { lat, lon }))
}
