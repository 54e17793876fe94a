// src/models/geo.rs
// DOCUMENTATION: Point handling between PostGIS, GeoJSON and flat lat/lng
// PURPOSE: Keep the lng/lat axis order in one place

use crate::errors::BoardError;
use geo_types::Point;
use geojson::{Geometry, Value as GeoJsonValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Build a point from latitude/longitude (X = lng, Y = lat)
pub fn point_from_lat_lng(lat: f64, lng: f64) -> Point<f64> {
    Point::new(lng, lat)
}

/// Reject coordinates outside WGS84 bounds
pub fn validate_lat_lng(lat: f64, lng: f64) -> Result<(), BoardError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(BoardError::ValidationError(format!(
            "latitude {} out of range",
            lat
        )));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(BoardError::ValidationError(format!(
            "longitude {} out of range",
            lng
        )));
    }
    Ok(())
}

/// Encode a point as a GeoJSON geometry
pub fn to_geojson(point: &Point<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::Point(vec![point.x(), point.y()]))
}

/// Decode a GeoJSON geometry; anything but a point with two coordinates is None
pub fn from_geojson(geometry: &Geometry) -> Option<Point<f64>> {
    match &geometry.value {
        GeoJsonValue::Point(coords) if coords.len() >= 2 => Some(Point::new(coords[0], coords[1])),
        _ => None,
    }
}

/// Serde adapter for `Option<Point<f64>>` fields carried as GeoJSON
pub mod optional_geojson_point {
    use super::*;

    pub fn serialize<S>(value: &Option<Point<f64>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(point) => to_geojson(point).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Point<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let geometry = Option::<Geometry>::deserialize(deserializer)?;
        Ok(geometry.as_ref().and_then(from_geojson))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(default, with = "optional_geojson_point")]
        location: Option<Point<f64>>,
    }

    #[test]
    fn test_axis_order() {
        let p = point_from_lat_lng(40.4168, -3.7038);
        assert_eq!(p.x(), -3.7038);
        assert_eq!(p.y(), 40.4168);
    }

    #[test]
    fn test_geojson_uses_lng_lat() {
        let wrapper = Wrapper {
            location: Some(point_from_lat_lng(10.0, 20.0)),
        };
        let value = serde_json::to_value(&wrapper).unwrap();
        assert_eq!(value["location"]["type"], "Point");
        assert_eq!(value["location"]["coordinates"], json!([20.0, 10.0]));
    }

    #[test]
    fn test_decode_point_and_reject_others() {
        let parsed: Wrapper = serde_json::from_value(json!({
            "location": {"type": "Point", "coordinates": [2.35, 48.85]}
        }))
        .unwrap();
        let p = parsed.location.unwrap();
        assert_eq!((p.x(), p.y()), (2.35, 48.85));

        let line: Wrapper = serde_json::from_value(json!({
            "location": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}
        }))
        .unwrap();
        assert!(line.location.is_none());

        let missing: Wrapper = serde_json::from_value(json!({})).unwrap();
        assert!(missing.location.is_none());
    }

    #[test]
    fn test_short_coordinate_array_never_yields_a_point() {
        let parsed = serde_json::from_value::<Wrapper>(json!({
            "location": {"type": "Point", "coordinates": [1.0]}
        }));
        assert!(matches!(parsed, Err(_) | Ok(Wrapper { location: None })));

        let geometry = Geometry::new(GeoJsonValue::Point(vec![1.0]));
        assert!(from_geojson(&geometry).is_none());
    }

    #[test]
    fn test_validate_lat_lng() {
        assert!(validate_lat_lng(0.0, 0.0).is_ok());
        assert!(validate_lat_lng(90.0, 180.0).is_ok());
        assert!(validate_lat_lng(91.0, 0.0).is_err());
        assert!(validate_lat_lng(0.0, -181.0).is_err());
        assert!(validate_lat_lng(f64::NAN, 0.0).is_err());
    }
}
