//! Input cleaning for raw location records.

use serde_json::Value;

use crate::model::Point;
use route_common::{Result, RouteError};

/// Fewest usable coordinates a route can be computed for.
pub const MIN_POINTS: usize = 2;

pub const INSUFFICIENT_POINTS_MESSAGE: &str = "At least 2 valid coordinates are required.";

/// Keeps the records whose `lat` and `lng` are both present and parse as valid coordinates.
///
/// Values may be JSON numbers or numeric strings. Anything else (missing field, `null`,
/// empty string, garbage, out-of-range) drops the record without failing the call.
/// Surviving points are numbered `0..n` in input order.
///
/// # Errors
///
/// Returns [`RouteError::Validation`] when fewer than [`MIN_POINTS`] records survive.
pub fn sanitize(records: &[Value]) -> Result<Vec<Point>> {
    let mut points = Vec::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        match (field(record, "lat"), field(record, "lng")) {
            (Some(lat), Some(lng)) if Point::is_valid_coordinate(lat, lng) => {
                points.push(Point::new(points.len(), lat, lng));
            }
            _ => tracing::debug!(position, "dropping location without usable lat/lng"),
        }
    }

    if points.len() < MIN_POINTS {
        return Err(RouteError::validation(INSUFFICIENT_POINTS_MESSAGE));
    }

    tracing::debug!(kept = points.len(), received = records.len(), "sanitized locations");
    Ok(points)
}

fn field(record: &Value, name: &str) -> Option<f64> {
    let value = match record.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_numbers_and_numeric_strings() {
        let records = vec![
            json!({"lat": 47.5, "lng": 19.0}),
            json!({"lat": "47.6", "lng": " 19.1 "}),
        ];
        let points = sanitize(&records).unwrap();
        assert_eq!(points, vec![Point::new(0, 47.5, 19.0), Point::new(1, 47.6, 19.1)]);
    }

    #[test]
    fn drops_missing_empty_and_unparseable_entries() {
        let records = vec![
            json!({"lat": 47.5, "lng": 19.0}),
            json!({"lat": 47.5}),
            json!({"lng": 19.0}),
            json!({"lat": "", "lng": 19.0}),
            json!({"lat": null, "lng": 19.0}),
            json!({"lat": "north", "lng": 19.0}),
            json!({"lat": "NaN", "lng": 19.0}),
            json!({"lat": "inf", "lng": 19.0}),
            json!({"lat": 95.0, "lng": 19.0}),
            json!({"lat": true, "lng": 19.0}),
            json!("47.5,19.0"),
            json!({"lat": 47.7, "lng": 19.2}),
        ];
        let points = sanitize(&records).unwrap();
        assert_eq!(points.len(), 2);
        // indices follow the sanitized sequence, not the raw one
        assert_eq!(points[1], Point::new(1, 47.7, 19.2));
    }

    #[test]
    fn fewer_than_two_points_is_a_validation_error() {
        let err = sanitize(&[json!({"lat": 47.5, "lng": 19.0}), json!({"lat": ""})]).unwrap_err();
        assert!(matches!(err, RouteError::Validation(_)));
        assert!(matches!(sanitize(&[]), Err(RouteError::Validation(_))));
    }
}
