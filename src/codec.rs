use crate::error::TripGeoError;
use crate::geometry_types::Point;

type Result<T> = std::result::Result<T, TripGeoError>;

const POINT_TAG: &str = "POINT";
const LINE_TAG: &str = "LINESTRING";

/// Convert free-text `"longitude, latitude"` into `POINT(<lon> <lat>)`.
///
/// Tokens are inserted verbatim; numeric validation happens when the
/// point is parsed back with [`parse_point`].
pub fn format_geography_point(input: &str) -> Result<String> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [lon, lat] if !lon.is_empty() && !lat.is_empty() => Ok(format!("POINT({lon} {lat})")),
        [_, _] => Err(format_error(input, "longitude and latitude must not be empty")),
        _ => Err(format_error(
            input,
            "expected format \"longitude, latitude\"",
        )),
    }
}

/// Parse the first `POINT( <lon> <lat> )` found in `text`.
pub fn parse_point(text: &str) -> Result<Point> {
    text.match_indices(POINT_TAG)
        .find_map(|(idx, _)| point_body(&text[idx + POINT_TAG.len()..]))
        .ok_or_else(|| format_error(text, "expected POINT(lon lat)"))
}

/// Render a point as canonical geometry text.
pub fn format_point(point: &Point) -> String {
    format!("{POINT_TAG}({} {})", point.lon, point.lat)
}

/// Wrap `(lon, lat)` token pairs as `LINESTRING(lon lat, lon lat, ...)`.
pub fn line_string_from_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let joined: Vec<String> = pairs
        .into_iter()
        .map(|(lon, lat)| format!("{lon} {lat}"))
        .collect();
    format!("{LINE_TAG}({})", joined.join(", "))
}

pub fn format_line_string(points: &[Point]) -> String {
    let tokens: Vec<(String, String)> = points
        .iter()
        .map(|p| (p.lon.to_string(), p.lat.to_string()))
        .collect();
    line_string_from_pairs(tokens.iter().map(|(lon, lat)| (lon.as_str(), lat.as_str())))
}

/// Parse canonical line text into its vertices, in order.
///
/// Accepts an optional PostGIS `SRID=<n>;` prefix.
pub fn parse_line_string(text: &str) -> Result<Vec<Point>> {
    let trimmed = text.trim();
    let body = match trimmed.strip_prefix("SRID=") {
        Some(rest) => rest
            .split_once(';')
            .map(|(_, wkt)| wkt.trim_start())
            .ok_or_else(|| format_error(text, "SRID prefix without ';'"))?,
        None => trimmed,
    };

    let rest = body
        .strip_prefix(LINE_TAG)
        .ok_or_else(|| format_error(text, "expected LINESTRING"))?;
    let rest = rest
        .trim_start()
        .strip_prefix('(')
        .ok_or_else(|| format_error(text, "expected '(' after LINESTRING"))?;

    let mut points = Vec::new();
    let mut rest = rest.trim_start();
    loop {
        let (point, after) =
            coordinate_pair(rest).ok_or_else(|| format_error(text, "expected 'lon lat' pair"))?;
        points.push(point);
        let after = after.trim_start();
        if let Some(next) = after.strip_prefix(',') {
            rest = next.trim_start();
        } else if let Some(tail) = after.strip_prefix(')') {
            if !tail.trim().is_empty() {
                return Err(format_error(text, "trailing content after ')'"));
            }
            break;
        } else {
            return Err(format_error(text, "expected ',' or ')'"));
        }
    }

    Ok(points)
}

/// `\s*(\s*<num>\s+<num>\s*\)` following the `POINT` keyword.
fn point_body(s: &str) -> Option<Point> {
    let s = s.trim_start().strip_prefix('(')?.trim_start();
    let (point, rest) = coordinate_pair(s)?;
    rest.trim_start().strip_prefix(')').map(|_| point)
}

/// `<num>\s+<num>`, returning the point and the unconsumed remainder.
fn coordinate_pair(s: &str) -> Option<(Point, &str)> {
    let (lon, rest) = number(s)?;
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let (lat, rest) = number(trimmed)?;
    Some((Point::new(lon, lat), rest))
}

/// `[-+]?[0-9]*\.?[0-9]+` anchored at the start of `s`.
fn number(s: &str) -> Option<(f64, &str)> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let int_digits = end - int_start;
    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    } else if int_digits == 0 {
        return None;
    }

    let (token, rest) = s.split_at(end);
    token.parse::<f64>().ok().map(|value| (value, rest))
}

fn format_error(input: &str, reason: &'static str) -> TripGeoError {
    TripGeoError::Format {
        input: input.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_geography_point() {
        assert_eq!(
            format_geography_point("14.41, 50.08").unwrap(),
            "POINT(14.41 50.08)"
        );
        assert_eq!(
            format_geography_point("  -0.1276 ,51.5072  ").unwrap(),
            "POINT(-0.1276 51.5072)"
        );
    }

    #[test]
    fn test_format_tokens_are_verbatim() {
        // No numeric validation at this stage
        assert_eq!(format_geography_point("east, north").unwrap(), "POINT(east north)");
    }

    #[test]
    fn test_format_rejects_wrong_token_count() {
        assert!(matches!(
            format_geography_point("14.41"),
            Err(TripGeoError::Format { .. })
        ));
        assert!(format_geography_point("1, 2, 3").is_err());
        assert!(format_geography_point(" , ").is_err());
    }

    #[test]
    fn test_parse_point() {
        let p = parse_point("POINT(14.41 50.08)").unwrap();
        assert_eq!(p.lon, 14.41);
        assert_eq!(p.lat, 50.08);
    }

    #[test]
    fn test_parse_point_whitespace_and_signs() {
        let p = parse_point("POINT (  -73.9857   +40.7484 )").unwrap();
        assert_eq!(p.lon, -73.9857);
        assert_eq!(p.lat, 40.7484);

        let p = parse_point("SRID=4326;POINT(.5 -.25)").unwrap();
        assert_eq!(p.lon, 0.5);
        assert_eq!(p.lat, -0.25);
    }

    #[test]
    fn test_parse_point_rejects_malformed() {
        assert!(matches!(
            parse_point("POINT 14.41 50.08"),
            Err(TripGeoError::Format { .. })
        ));
        assert!(parse_point("POINT(14.41)").is_err());
        assert!(parse_point("POINT(14.4150.08)").is_err());
        assert!(parse_point("POINT(1e5 2)").is_err());
        assert!(parse_point("POINT(5. 2)").is_err());
        assert!(parse_point("").is_err());
    }

    #[test]
    fn test_round_trip() {
        for (lon, lat) in [(14.41, 50.08), (-180.0, -90.0), (180.0, 90.0), (0.0, 0.0), (-122.4194, 37.7749)] {
            let text = format_geography_point(&format!("{lon}, {lat}")).unwrap();
            let p = parse_point(&text).unwrap();
            assert_eq!((p.lon, p.lat), (lon, lat), "round trip of {text}");
        }
    }

    #[test]
    fn test_format_point_reparses() {
        let p = Point::new(1e-7, -45.5);
        assert_eq!(parse_point(&format_point(&p)).unwrap(), p);
    }

    #[test]
    fn test_line_string_from_pairs() {
        let text = line_string_from_pairs([("14.4", "50.1"), ("14.5", "50.2")]);
        assert_eq!(text, "LINESTRING(14.4 50.1, 14.5 50.2)");
    }

    #[test]
    fn test_parse_line_string() {
        let points = parse_line_string("LINESTRING(14.4 50.1, 14.5 50.2,14.6   50.3)").unwrap();
        assert_eq!(
            points,
            vec![
                Point::new(14.4, 50.1),
                Point::new(14.5, 50.2),
                Point::new(14.6, 50.3)
            ]
        );
    }

    #[test]
    fn test_parse_line_string_srid_prefix() {
        let points = parse_line_string("SRID=4326;LINESTRING(1 2, 3 4)").unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_parse_line_string_rejects_malformed() {
        assert!(parse_line_string("LINESTRING()").is_err());
        assert!(parse_line_string("LINESTRING(1 2, )").is_err());
        assert!(parse_line_string("LINESTRING(1 2, 3 4").is_err());
        assert!(parse_line_string("LINESTRING(1 2) extra").is_err());
        assert!(parse_line_string("POINT(1 2)").is_err());
        assert!(parse_line_string("LINESTRING(abc 2)").is_err());
    }

    #[test]
    fn test_format_line_string_round_trip() {
        let points = vec![Point::new(14.4, 50.1), Point::new(-3.25, 0.5)];
        let text = format_line_string(&points);
        assert_eq!(text, "LINESTRING(14.4 50.1, -3.25 0.5)");
        assert_eq!(parse_line_string(&text).unwrap(), points);
    }
}
