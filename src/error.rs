use wasm_bindgen::JsValue;

/// Why a track file could not be turned into a line geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedFile {
    /// Declared content type is neither empty, XML, nor octet-stream.
    ContentType(String),
    /// Untyped file whose leading bytes do not look like a GPX document.
    NotGpx,
    /// The document holds no `<trkpt>` elements.
    NoTrackPoints,
    /// Every `<trkpt>` lacked a `lat` or `lon` attribute.
    NoCoordinates,
}

impl std::fmt::Display for UnsupportedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContentType(ct) => write!(f, "unsupported content type '{ct}'"),
            Self::NotGpx => write!(f, "content does not look like a GPX document"),
            Self::NoTrackPoints => write!(f, "no <trkpt> elements found"),
            Self::NoCoordinates => write!(f, "no <trkpt> element carries both lat and lon"),
        }
    }
}

#[derive(Debug)]
pub enum TripGeoError {
    Format {
        input: String,
        reason: &'static str,
    },
    UnsupportedFile(UnsupportedFile),
    MalformedStoredGeometry {
        trip_id: i64,
        reason: String,
    },
    XmlParse(quick_xml::Error),
    FileRead(String),
    MissingField(&'static str),
    Fetch(String),
    Storage {
        key: String,
        reason: String,
    },
    Upload {
        failed: usize,
        total: usize,
        first: String,
    },
}

impl std::fmt::Display for TripGeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format { input, reason } => {
                write!(f, "Invalid coordinate format '{input}': {reason}")
            }
            Self::UnsupportedFile(reason) => write!(f, "Unsupported track file: {reason}"),
            Self::MalformedStoredGeometry { trip_id, reason } => {
                write!(f, "Malformed stored geometry for trip {trip_id}: {reason}")
            }
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::FileRead(e) => write!(f, "File read error: {e}"),
            Self::MissingField(field) => write!(f, "Missing required field '{field}'"),
            Self::Fetch(e) => write!(f, "Failed to fetch trips: {e}"),
            Self::Storage { key, reason } => write!(f, "Storage error for '{key}': {reason}"),
            Self::Upload {
                failed,
                total,
                first,
            } => write!(f, "{failed} of {total} uploads failed, first error: {first}"),
        }
    }
}

impl std::error::Error for TripGeoError {}

impl From<quick_xml::Error> for TripGeoError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<UnsupportedFile> for TripGeoError {
    fn from(reason: UnsupportedFile) -> Self {
        Self::UnsupportedFile(reason)
    }
}

impl From<TripGeoError> for JsValue {
    fn from(e: TripGeoError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
