use serde::Deserialize;

/// How a track file's content type is disambiguated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SniffOptions {
    /// Bytes read from an untyped file to guess whether it is XML (default: 200)
    #[serde(default = "default_sniff_bytes")]
    pub sniff_bytes: usize,

    /// Substrings that must all appear in the sniffed prefix (default: `<gpx`, `<?xml`)
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,

    /// Declared content types read directly as XML text. Any `+xml` type also qualifies.
    #[serde(default = "default_xml_content_types")]
    pub xml_content_types: Vec<String>,
}

impl Default for SniffOptions {
    fn default() -> Self {
        Self {
            sniff_bytes: default_sniff_bytes(),
            markers: default_markers(),
            xml_content_types: default_xml_content_types(),
        }
    }
}

impl SniffOptions {
    pub fn is_xml_content_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence.ends_with("+xml") || self.xml_content_types.iter().any(|ct| *ct == essence)
    }

    pub fn looks_like_gpx(&self, prefix: &str) -> bool {
        self.markers.iter().all(|marker| prefix.contains(marker.as_str()))
    }
}

/// Visual style per geometry kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    #[serde(default = "default_line_color")]
    pub line_color: String,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default = "default_point_radius")]
    pub point_radius: f64,
    #[serde(default = "default_point_fill")]
    pub point_fill: String,
    #[serde(default = "default_point_stroke")]
    pub point_stroke: String,
    #[serde(default = "default_point_stroke_width")]
    pub point_stroke_width: f64,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            line_color: default_line_color(),
            line_width: default_line_width(),
            point_radius: default_point_radius(),
            point_fill: default_point_fill(),
            point_stroke: default_point_stroke(),
            point_stroke_width: default_point_stroke_width(),
        }
    }
}

/// Initial map view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOptions {
    /// `[lon, lat]` (default: Prague)
    #[serde(default = "default_center")]
    pub center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_projection")]
    pub projection: String,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            center: default_center(),
            zoom: default_zoom(),
            projection: default_projection(),
            tile_url: default_tile_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    #[serde(default)]
    pub style: StyleOptions,

    #[serde(default)]
    pub view: ViewOptions,

    /// Click hit-test radius in map units (default: 0.001)
    #[serde(default = "default_hit_tolerance")]
    pub hit_tolerance: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: StyleOptions::default(),
            view: ViewOptions::default(),
            hit_tolerance: default_hit_tolerance(),
        }
    }
}

fn default_sniff_bytes() -> usize {
    200
}

fn default_markers() -> Vec<String> {
    vec!["<gpx".to_string(), "<?xml".to_string()]
}

fn default_xml_content_types() -> Vec<String> {
    vec![
        "application/gpx+xml".to_string(),
        "application/xml".to_string(),
        "text/xml".to_string(),
    ]
}

fn default_line_color() -> String {
    "blue".to_string()
}

fn default_line_width() -> f64 {
    3.0
}

fn default_point_radius() -> f64 {
    7.0
}

fn default_point_fill() -> String {
    "black".to_string()
}

fn default_point_stroke() -> String {
    "white".to_string()
}

fn default_point_stroke_width() -> f64 {
    2.0
}

fn default_center() -> [f64; 2] {
    [14.41, 50.08]
}

fn default_zoom() -> u8 {
    13
}

fn default_projection() -> String {
    "EPSG:4326".to_string()
}

fn default_tile_url() -> String {
    "https://{a-c}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_hit_tolerance() -> f64 {
    0.001
}
