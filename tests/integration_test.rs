use futures::executor::block_on;
use trip_diary_geo::backend::{Session, TripSource};
use trip_diary_geo::codec::{format_geography_point, parse_line_string, parse_point};
use trip_diary_geo::error::{TripGeoError, UnsupportedFile};
use trip_diary_geo::geometry_types::GeometryKind;
use trip_diary_geo::options::{RenderOptions, SniffOptions};
use trip_diary_geo::parser::{convert_track_file, try_convert_track_file};
use trip_diary_geo::renderer::{MapRenderer, RenderState};
use trip_diary_geo::track_file::BytesTrackFile;
use trip_diary_geo::trip::TripRecord;

fn load_fixture(path: &str) -> Vec<u8> {
    std::fs::read(format!("tests/fixtures/{path}")).unwrap()
}

fn convert(path: &str, content_type: &str) -> Option<String> {
    let file = BytesTrackFile::new(content_type, load_fixture(path));
    block_on(convert_track_file(&file, &SniffOptions::default()))
}

fn load_trips() -> Vec<TripRecord> {
    serde_json::from_slice(&load_fixture("trips/mixed_trips.json")).unwrap()
}

struct FixtureSource;

impl TripSource for FixtureSource {
    async fn fetch_user_trips(&self, _user_id: &str) -> Result<Vec<TripRecord>, TripGeoError> {
        Ok(load_trips())
    }
}

// ---- coordinate codec ----

#[test]
fn test_form_input_reads_back() {
    let text = format_geography_point("14.41, 50.08").unwrap();
    let p = parse_point(&text).unwrap();
    assert_eq!((p.lon, p.lat), (14.41, 50.08));
}

#[test]
fn test_codec_rejections() {
    assert!(matches!(
        format_geography_point("14.41"),
        Err(TripGeoError::Format { .. })
    ));
    assert!(parse_point("POINT 14.41 50.08").is_err());
}

// ---- track files ----

#[test]
fn test_01_simple_track_all_content_types() {
    let expected = "LINESTRING(14.4 50.1, 14.5 50.2, 14.6 50.3)";
    for content_type in ["", "application/gpx+xml", "text/xml", "application/octet-stream"] {
        assert_eq!(
            convert("tracks/01_simple_track.gpx", content_type).as_deref(),
            Some(expected),
            "content type '{content_type}'"
        );
    }
}

#[test]
fn test_01_simple_track_unknown_type_rejected() {
    let file = BytesTrackFile::new("image/png", load_fixture("tracks/01_simple_track.gpx"));
    let err = block_on(try_convert_track_file(&file, &SniffOptions::default())).unwrap_err();
    assert!(matches!(
        err,
        TripGeoError::UnsupportedFile(UnsupportedFile::ContentType(_))
    ));
}

#[test]
fn test_02_multi_segment_keeps_document_order() {
    let line = convert("tracks/02_multi_segment.gpx", "application/gpx+xml").unwrap();
    assert_eq!(
        line,
        "LINESTRING(13.8000 48.9700, 13.8050 48.9720, 13.8122 48.9747, 13.8200 48.9800, 13.8300 48.9850)"
    );
    // Stored text is readable by the map side
    assert_eq!(parse_line_string(&line).unwrap().len(), 5);
}

#[test]
fn test_03_namespaced_points_with_children() {
    let line = convert("tracks/03_garmin_extensions.gpx", "").unwrap();
    assert_eq!(line, "LINESTRING(16.6068 49.1951, 16.6081 49.1960)");
}

#[test]
fn test_04_no_track_points_is_none() {
    assert_eq!(convert("tracks/04_waypoints_only.gpx", "application/gpx+xml"), None);

    let file = BytesTrackFile::new("", load_fixture("tracks/04_waypoints_only.gpx"));
    let err = block_on(try_convert_track_file(&file, &SniffOptions::default())).unwrap_err();
    assert!(matches!(
        err,
        TripGeoError::UnsupportedFile(UnsupportedFile::NoTrackPoints)
    ));
}

#[test]
fn test_05_points_missing_attributes_dropped() {
    assert_eq!(
        convert("tracks/05_missing_attributes.gpx", "text/xml").as_deref(),
        Some("LINESTRING(14.4 50.1, 14.5 50.2)")
    );
}

#[test]
fn test_06_untyped_non_xml_is_none() {
    assert_eq!(convert("tracks/06_not_xml.csv", ""), None);
    assert_eq!(convert("tracks/06_not_xml.csv", "application/octet-stream"), None);
}

// ---- renderer ----

#[test]
fn test_corrupt_geojson_row_keeps_siblings() {
    let json = r#"[
        {"id": 1, "title": "good", "lat": 50.08, "long": 14.41, "trip_path": null},
        {"id": 2, "title": "bad", "lat": 50.0, "long": 14.0,
         "trip_path": {"type": "LineString", "coordinates": "corrupt"}}
    ]"#;
    let trips: Vec<TripRecord> = serde_json::from_str(json).unwrap();

    let mut renderer = MapRenderer::new(RenderOptions::default());
    renderer.initialize();
    renderer.begin_load(Session::new("user-1"));
    renderer.finish_load(Ok(trips));

    assert_eq!(*renderer.state(), RenderState::Populated);
    let ids: Vec<i64> = renderer
        .layer()
        .unwrap()
        .features()
        .iter()
        .map(|f| f.trip.id)
        .collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(renderer.diagnostics()[0].trip_id, 2);
}

#[test]
fn test_mixed_trip_set_renders_valid_records() {
    let mut renderer = MapRenderer::new(RenderOptions::default());
    renderer.initialize();
    block_on(renderer.refresh(&FixtureSource, Session::new("user-1")));

    assert_eq!(*renderer.state(), RenderState::Populated);
    let layer = renderer.layer().unwrap();
    let rendered: Vec<(i64, GeometryKind)> = layer
        .features()
        .iter()
        .map(|f| (f.trip.id, f.geometry.kind()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            (1, GeometryKind::Line),
            (2, GeometryKind::Point),
            (5, GeometryKind::Line),
            (7, GeometryKind::Point)
        ]
    );

    let skipped: Vec<i64> = renderer.diagnostics().iter().map(|d| d.trip_id).collect();
    assert_eq!(skipped, vec![3, 6]);
}

#[test]
fn test_path_only_and_point_only_emit_two_features() {
    let mut renderer = MapRenderer::new(RenderOptions::default());
    renderer.initialize();
    renderer.begin_load(Session::new("user-1"));
    renderer.finish_load(Ok(vec![
        TripRecord::new(1, "path").with_path("LINESTRING(14.4 50.1, 14.5 50.2)"),
        TripRecord::new(2, "point").with_point(50.08, 14.41),
    ]));

    let fc = renderer.feature_collection();
    assert_eq!(fc.features.len(), 2);
    let styles: Vec<&str> = fc
        .features
        .iter()
        .map(|f| f.properties.as_ref().unwrap()["style"]["type"].as_str().unwrap())
        .collect();
    assert_eq!(styles, vec!["stroke", "circle"]);
}

#[test]
fn test_click_surfaces_single_trip() {
    let mut renderer = MapRenderer::new(RenderOptions::default());
    renderer.initialize();
    block_on(renderer.refresh(&FixtureSource, Session::new("user-1")));

    // On the Brno segment
    let selected = renderer.click([16.6075, 49.19555]).unwrap();
    assert_eq!(selected.trip.title, "Brno ride");

    // Switching selection replaces it
    let selected = renderer.click([14.395, 50.0833]).unwrap();
    assert_eq!(selected.trip.id, 2);
    assert_eq!(selected.coordinate, [14.395, 50.0833]);

    // Empty water clears it
    assert!(renderer.click([0.0, 0.0]).is_none());
    assert!(renderer.selection().is_none());
}
