use js_sys::{Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::TripGeoError;
use crate::track_file::TrackFile;

type Result<T> = std::result::Result<T, TripGeoError>;

#[wasm_bindgen]
extern "C" {
    /// A browser `File` (or any `Blob`) picked for upload.
    #[wasm_bindgen(js_name = Blob)]
    pub type JsTrackFile;

    #[wasm_bindgen(method, getter, js_name = type)]
    fn js_type(this: &JsTrackFile) -> String;

    #[wasm_bindgen(method, js_name = slice)]
    fn js_slice(this: &JsTrackFile, start: f64, end: f64) -> JsTrackFile;

    #[wasm_bindgen(method, js_name = text)]
    fn js_text(this: &JsTrackFile) -> Promise;

    #[wasm_bindgen(method, js_name = arrayBuffer)]
    fn js_array_buffer(this: &JsTrackFile) -> Promise;
}

impl TrackFile for JsTrackFile {
    fn content_type(&self) -> String {
        self.js_type()
    }

    async fn read_range(&self, start: usize, end: usize) -> Result<Vec<u8>> {
        read_buffer(&self.js_slice(start as f64, end as f64)).await
    }

    async fn read_text(&self) -> Result<String> {
        let value = JsFuture::from(self.js_text()).await.map_err(js_error)?;
        value
            .as_string()
            .ok_or_else(|| TripGeoError::FileRead("text() did not resolve to a string".to_string()))
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        read_buffer(self).await
    }
}

async fn read_buffer(blob: &JsTrackFile) -> Result<Vec<u8>> {
    let buffer = JsFuture::from(blob.js_array_buffer())
        .await
        .map_err(js_error)?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn js_error(e: JsValue) -> TripGeoError {
    TripGeoError::FileRead(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}
