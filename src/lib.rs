pub mod backend;
pub mod codec;
pub mod error;
pub mod geometry_types;
pub mod js_file;
pub mod normalizer;
pub mod options;
pub mod parser;
pub mod photo;
pub mod renderer;
pub mod track_file;
pub mod trip;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::backend::Session;
use crate::error::TripGeoError;
use crate::js_file::JsTrackFile;
use crate::options::{RenderOptions, SniffOptions};
use crate::renderer::MapRenderer;
use crate::trip::TripRecord;

#[derive(Serialize)]
struct LatLong {
    lat: f64,
    long: f64,
}

#[derive(Serialize)]
struct SelectionView<'a> {
    trip: &'a TripRecord,
    coordinate: [f64; 2],
}

/// Convert `"longitude, latitude"` into `POINT(lon lat)`.
#[wasm_bindgen(js_name = formatGeographyPoint)]
pub fn format_geography_point(input: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    Ok(codec::format_geography_point(input)?)
}

/// Parse `POINT(lon lat)` into `{ lat, long }`.
#[wasm_bindgen(js_name = parsePoint)]
pub fn parse_point(point: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let p = codec::parse_point(point)?;
    to_js(&LatLong {
        lat: p.lat,
        long: p.lon,
    })
}

/// Convert an uploaded track file to `LINESTRING(...)`, or `null` if no
/// track could be extracted.
#[wasm_bindgen(js_name = trackFileToLineString)]
pub async fn track_file_to_line_string(file: JsTrackFile, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: SniffOptions = parse_options(options)?;
    Ok(match parser::convert_track_file(&file, &opts).await {
        Some(line) => JsValue::from_str(&line),
        None => JsValue::NULL,
    })
}

/// The trip map, driven by the page: the page fetches trips for the
/// session and hands the result over.
#[wasm_bindgen]
pub struct TripMap {
    renderer: MapRenderer,
}

#[wasm_bindgen]
impl TripMap {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<TripMap, JsValue> {
        console_error_panic_hook::set_once();

        let opts: RenderOptions = parse_options(options)?;
        Ok(Self {
            renderer: MapRenderer::new(opts),
        })
    }

    /// Create the view once; later calls return the same view settings.
    pub fn initialize(&mut self) -> Result<JsValue, JsValue> {
        to_js(self.renderer.initialize())
    }

    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&mut self, user_id: String) {
        self.renderer.begin_load(Session::new(user_id));
    }

    /// Settle the pending load with rows from the per-user trip procedure.
    #[wasm_bindgen(js_name = loadTrips)]
    pub fn load_trips(&mut self, records: JsValue) -> Result<(), JsValue> {
        match serde_wasm_bindgen::from_value::<Vec<TripRecord>>(records) {
            Ok(trips) => {
                self.renderer.finish_load(Ok(trips));
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.renderer
                    .finish_load(Err(TripGeoError::Fetch(message.clone())));
                Err(JsValue::from_str(&message))
            }
        }
    }

    #[wasm_bindgen(js_name = loadFailed)]
    pub fn load_failed(&mut self, message: String) {
        self.renderer.finish_load(Err(TripGeoError::Fetch(message)));
    }

    pub fn state(&self) -> String {
        self.renderer.state().as_str().to_string()
    }

    /// The trip overlay as a GeoJSON FeatureCollection.
    pub fn features(&self) -> Result<JsValue, JsValue> {
        to_js(&self.renderer.feature_collection())
    }

    /// Resolve a click at map coordinate `(x, y)`. Returns the selected
    /// trip and anchor, or `null` when nothing was hit.
    pub fn click(&mut self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        self.renderer.click([x, y]);
        self.selection()
    }

    pub fn selection(&self) -> Result<JsValue, JsValue> {
        match self.renderer.selection() {
            Some(selection) => to_js(&SelectionView {
                trip: &selection.trip,
                coordinate: selection.coordinate,
            }),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn diagnostics(&self) -> Result<JsValue, JsValue> {
        to_js(self.renderer.diagnostics())
    }
}

fn parse_options<T: DeserializeOwned + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// Serialize maps as plain objects so GeoJSON properties stay JSON-shaped.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
