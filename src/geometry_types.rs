use serde::Serialize;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Finite and inside the WGS84 longitude/latitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GeometryKind {
    Point,
    Line,
}

impl GeometryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Line => "Line",
        }
    }
}

/// A renderable geometry, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    /// Vertices in track order.
    Line(Vec<Point>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::Line(_) => GeometryKind::Line,
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            Self::Point(p) => std::slice::from_ref(p),
            Self::Line(points) => points,
        }
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = match self {
            Self::Point(p) => geojson::Value::Point(vec![p.lon, p.lat]),
            Self::Line(points) => {
                geojson::Value::LineString(points.iter().map(|p| vec![p.lon, p.lat]).collect())
            }
        };
        geojson::Geometry::new(value)
    }
}
