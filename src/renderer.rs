//! Trip map: turns a user's trip set into styled, clickable features.
//!
//! The renderer owns the map view and its single trip overlay. Every data
//! refresh replaces the overlay wholesale; features are never patched in
//! place. Clicks are resolved through an R-tree over feature envelopes.

use std::rc::Rc;

use geojson::{Feature, FeatureCollection};
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::backend::{Session, TripSource};
use crate::error::TripGeoError;
use crate::geometry_types::{Geometry, GeometryKind, Point};
use crate::normalizer::{normalize_trips, Diagnostic, TripGeometry};
use crate::options::{RenderOptions, StyleOptions, ViewOptions};
use crate::trip::TripRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureStyle {
    /// Stroked path for lines.
    Stroke { color: String, width: f64 },
    /// Filled circular marker with an outline, for points.
    Circle {
        radius: f64,
        fill: String,
        stroke: String,
        stroke_width: f64,
    },
}

impl FeatureStyle {
    pub fn for_kind(kind: GeometryKind, style: &StyleOptions) -> Self {
        match kind {
            GeometryKind::Line => Self::Stroke {
                color: style.line_color.clone(),
                width: style.line_width,
            },
            GeometryKind::Point => Self::Circle {
                radius: style.point_radius,
                fill: style.point_fill.clone(),
                stroke: style.point_stroke.clone(),
                stroke_width: style.point_stroke_width,
            },
        }
    }

    fn to_properties(&self) -> Map<String, JsonValue> {
        let mut props = Map::new();
        match self {
            Self::Stroke { color, width } => {
                props.insert("type".to_string(), JsonValue::from("stroke"));
                props.insert("color".to_string(), JsonValue::from(color.as_str()));
                props.insert("width".to_string(), JsonValue::from(*width));
            }
            Self::Circle {
                radius,
                fill,
                stroke,
                stroke_width,
            } => {
                props.insert("type".to_string(), JsonValue::from("circle"));
                props.insert("radius".to_string(), JsonValue::from(*radius));
                props.insert("fill".to_string(), JsonValue::from(fill.as_str()));
                props.insert("stroke".to_string(), JsonValue::from(stroke.as_str()));
                props.insert("strokeWidth".to_string(), JsonValue::from(*stroke_width));
            }
        }
        props
    }
}

/// A feature on the trip overlay, tagged with the trip it came from.
#[derive(Debug, Clone)]
pub struct RenderedFeature {
    pub geometry: Geometry,
    pub style: FeatureStyle,
    pub trip: Rc<TripRecord>,
}

impl RenderedFeature {
    /// Squared distance from `coord` to the nearest part of the geometry.
    pub fn distance_2(&self, coord: [f64; 2]) -> f64 {
        match &self.geometry {
            Geometry::Point(p) => squared_distance(p.as_array(), coord),
            Geometry::Line(points) => match points.as_slice() {
                [single] => squared_distance(single.as_array(), coord),
                _ => points
                    .windows(2)
                    .map(|w| segment_distance_2(&w[0], &w[1], coord))
                    .fold(f64::INFINITY, f64::min),
            },
        }
    }

    fn to_feature(&self) -> Feature {
        let mut props = Map::new();
        props.insert("tripId".to_string(), JsonValue::from(self.trip.id));
        props.insert("title".to_string(), JsonValue::from(self.trip.title.as_str()));
        props.insert(
            "kind".to_string(),
            JsonValue::from(self.geometry.kind().as_str()),
        );
        props.insert(
            "style".to_string(),
            JsonValue::Object(self.style.to_properties()),
        );

        Feature {
            bbox: None,
            geometry: Some(self.geometry.to_geojson()),
            id: Some(geojson::feature::Id::Number(self.trip.id.into())),
            properties: Some(props),
            foreign_members: None,
        }
    }
}

/// R-tree entry pointing back into the layer's feature list.
#[derive(Debug, Clone, Copy)]
struct IndexedFeature {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// The trip overlay for one trip set.
#[derive(Debug)]
pub struct FeatureLayer {
    features: Vec<RenderedFeature>,
    index: RTree<IndexedFeature>,
}

impl FeatureLayer {
    pub fn build(geometries: Vec<TripGeometry>, style: &StyleOptions) -> Self {
        let features: Vec<RenderedFeature> = geometries
            .into_iter()
            .map(|g| RenderedFeature {
                style: FeatureStyle::for_kind(g.geometry.kind(), style),
                geometry: g.geometry,
                trip: g.trip,
            })
            .collect();

        let indexed: Vec<IndexedFeature> = features
            .iter()
            .enumerate()
            .map(|(idx, f)| IndexedFeature {
                idx,
                envelope: envelope_of(f.geometry.points()),
            })
            .collect();

        Self {
            features,
            index: RTree::bulk_load(indexed),
        }
    }

    pub fn features(&self) -> &[RenderedFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Nearest feature within `tolerance` of `coord`. On a tie the feature
    /// drawn last (topmost) wins.
    pub fn hit_test(&self, coord: [f64; 2], tolerance: f64) -> Option<&RenderedFeature> {
        let [x, y] = coord;
        let query = AABB::from_corners([x - tolerance, y - tolerance], [x + tolerance, y + tolerance]);
        let max_2 = tolerance * tolerance;

        self.index
            .locate_in_envelope_intersecting(&query)
            .filter_map(|entry| {
                let feature = self.features.get(entry.idx)?;
                let d2 = feature.distance_2(coord);
                (d2 <= max_2).then_some((entry.idx, d2))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
            .and_then(|(idx, _)| self.features.get(idx))
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.iter().map(RenderedFeature::to_feature).collect(),
            foreign_members: None,
        }
    }
}

/// The interactive map the overlay is drawn on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub projection: String,
    pub tile_url: String,
}

impl MapView {
    fn new(options: &ViewOptions) -> Self {
        Self {
            center: options.center,
            zoom: options.zoom,
            projection: options.projection.clone(),
            tile_url: options.tile_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderState {
    Empty,
    Loading,
    Populated,
    Failed(String),
}

impl RenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Populated => "populated",
            Self::Failed(_) => "failed",
        }
    }
}

/// The trip currently shown in the detail popup.
#[derive(Debug, Clone)]
pub struct Selection {
    pub trip: Rc<TripRecord>,
    /// Map coordinate the popup is anchored to.
    pub coordinate: [f64; 2],
}

#[derive(Debug)]
pub struct MapRenderer {
    options: RenderOptions,
    view: Option<MapView>,
    session: Option<Session>,
    state: RenderState,
    /// Settled trip set waiting for the view to exist.
    pending: Option<Vec<TripGeometry>>,
    layer: Option<FeatureLayer>,
    selection: Option<Selection>,
    diagnostics: Vec<Diagnostic>,
}

impl MapRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            view: None,
            session: None,
            state: RenderState::Empty,
            pending: None,
            layer: None,
            selection: None,
            diagnostics: Vec::new(),
        }
    }

    /// Create the map view. Calling it again returns the existing view.
    pub fn initialize(&mut self) -> &MapView {
        if self.view.is_none() {
            log::debug!("initializing map view");
            self.view = Some(MapView::new(&self.options.view));
            self.build_layer();
        }
        self.view.get_or_insert_with(|| MapView::new(&self.options.view))
    }

    pub fn is_initialized(&self) -> bool {
        self.view.is_some()
    }

    /// Enter `Loading` for a (possibly new) session. The previous overlay
    /// and selection belong to the old scope and are dropped.
    pub fn begin_load(&mut self, session: Session) {
        log::debug!("loading trips for {}", session.user_id);
        self.session = Some(session);
        self.state = RenderState::Loading;
        self.pending = None;
        self.layer = None;
        self.selection = None;
        self.diagnostics.clear();
    }

    /// Settle a fetch. The last call wins; superseded fetches are not
    /// detected.
    pub fn finish_load(&mut self, result: Result<Vec<TripRecord>, TripGeoError>) {
        match result {
            Ok(trips) => {
                let normalized = normalize_trips(trips);
                log::info!(
                    "loaded {} renderable trips, {} skipped",
                    normalized.geometries.len(),
                    normalized.diagnostics.len()
                );
                self.diagnostics = normalized.diagnostics;
                self.pending = Some(normalized.geometries);
                self.state = RenderState::Populated;
                self.build_layer();
            }
            Err(e) => {
                log::warn!("trip fetch failed: {e}");
                self.pending = None;
                self.layer = None;
                self.selection = None;
                self.state = RenderState::Failed(e.to_string());
            }
        }
    }

    /// Fetch the session's trips from `source` and render them.
    pub async fn refresh<S: TripSource>(&mut self, source: &S, session: Session) {
        let user_id = session.user_id.clone();
        self.begin_load(session);
        let result = source.fetch_user_trips(&user_id).await;
        self.finish_load(result);
    }

    /// Resolve a click at a map coordinate. A hit replaces the selection,
    /// a miss clears it.
    pub fn click(&mut self, coordinate: [f64; 2]) -> Option<&Selection> {
        let hit = self
            .layer
            .as_ref()
            .and_then(|layer| layer.hit_test(coordinate, self.options.hit_tolerance))
            .map(|feature| Rc::clone(&feature.trip));

        self.selection = hit.map(|trip| Selection { trip, coordinate });
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn layer(&self) -> Option<&FeatureLayer> {
        self.layer.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The current overlay as GeoJSON; empty when nothing is drawn.
    pub fn feature_collection(&self) -> FeatureCollection {
        match &self.layer {
            Some(layer) => layer.to_feature_collection(),
            None => FeatureCollection {
                bbox: None,
                features: Vec::new(),
                foreign_members: None,
            },
        }
    }

    /// Swap in a fresh overlay once both the view and a settled trip set
    /// exist.
    fn build_layer(&mut self) {
        if self.view.is_none() {
            return;
        }
        if let Some(geometries) = self.pending.take() {
            self.layer = Some(FeatureLayer::build(geometries, &self.options.style));
            self.selection = None;
        }
    }
}

fn envelope_of(points: &[Point]) -> AABB<[f64; 2]> {
    let (min, max) = points.iter().fold(
        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
        |(min, max), p| {
            (
                [min[0].min(p.lon), min[1].min(p.lat)],
                [max[0].max(p.lon), max[1].max(p.lat)],
            )
        },
    );
    AABB::from_corners(min, max)
}

fn squared_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

fn segment_distance_2(a: &Point, b: &Point, coord: [f64; 2]) -> f64 {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let len_2 = dx * dx + dy * dy;
    if len_2 == 0.0 {
        return squared_distance(a.as_array(), coord);
    }
    let t = (((coord[0] - a.lon) * dx + (coord[1] - a.lat) * dy) / len_2).clamp(0.0, 1.0);
    squared_distance([a.lon + t * dx, a.lat + t * dy], coord)
}
