use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default neighborhood radius in degrees.
///
/// Roughly 55km of latitude: photos taken around the same region end up in
/// one cluster, while separate cities a few hundred kilometers apart do not.
pub const DEFAULT_EPSILON_DEGREES: f64 = 0.5;

/// Default density threshold, counting the point itself. With 1 every valid
/// point seeds at least a singleton cluster.
pub const DEFAULT_MIN_POINTS: usize = 1;

/// Default number of tags reported for the dominant cluster.
pub const DEFAULT_TOP_TAGS: usize = 3;

/// A validated geographic position in degrees.
///
/// Latitude is always within [-90, 90] and longitude within [-180, 180];
/// there is no way to build an out-of-range point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LatLng")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Build a point, returning `None` for non-finite or out-of-range values
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if lat.abs() > 90.0 || lng.abs() > 180.0 {
            return None;
        }
        Some(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Planar point in (lng, lat) order, as used for clustering
    pub fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl TryFrom<LatLng> for GeoPoint {
    type Error = String;

    fn try_from(value: LatLng) -> Result<Self, Self::Error> {
        GeoPoint::new(value.lat, value.lng)
            .ok_or_else(|| format!("position out of range: ({}, {})", value.lat, value.lng))
    }
}

/// Image metadata as stored in the document store.
///
/// Only `location.position` and `tags` matter for recommendations. Decoding
/// never fails on a malformed field: a `location` or `position` of the wrong
/// shape reads as absent, and `title`/`location`/`icon` are kept untyped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocationRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<RawLocation>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
}

/// Deserialize a field as `None` when its shape doesn't match
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// A non-list reads as no tags; non-string items are dropped
fn lenient_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(tag) => Some(tag),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::Null) | None => None,
        Some(_) => Some(Vec::new()),
    })
}

impl RawLocationRecord {
    /// Record with a numeric position and the given tags
    pub fn at(lat: f64, lng: f64, tags: &[&str]) -> Self {
        Self {
            location: Some(RawLocation {
                position: Some(RawPosition {
                    lat: Value::from(lat),
                    lng: Value::from(lng),
                }),
                ..RawLocation::default()
            }),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        }
    }

    /// Decode one stored or submitted record; anything that is not an
    /// object decodes as a record without a location
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<RawPosition>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub icon: Option<Value>,
}

/// Coordinates exactly as stored: numbers, numeric strings or garbage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPosition {
    #[serde(default)]
    pub lat: Value,
    #[serde(default)]
    pub lng: Value,
}

/// A validated position with its content tags
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub position: GeoPoint,
    pub tags: Vec<String>,
}

/// One group of spatially close records.
///
/// `members` are indices into the validated record set, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: usize,
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Tags of every member in member order, duplicates kept
    pub fn tags<'a>(&'a self, records: &'a [TaggedRecord]) -> impl Iterator<Item = &'a str> + 'a {
        self.members
            .iter()
            .filter_map(move |&idx| records.get(idx))
            .flat_map(|record| record.tags.iter().map(String::as_str))
    }
}

/// Summary of the dominant cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub position: GeoPoint,
    pub tags: Vec<String>,
}

/// Why no recommendation could be made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoRecommendationReason {
    NoInputRecords,
    NoValidLocations,
}

impl NoRecommendationReason {
    /// Stable machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoInputRecords => "no input records",
            Self::NoValidLocations => "no valid locations",
        }
    }

    /// Message shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoInputRecords => "no images uploaded",
            Self::NoValidLocations => "no valid locations",
        }
    }
}

/// Result of one recommendation computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationOutcome {
    Recommended(Recommendation),
    NoRecommendation(NoRecommendationReason),
}

impl RecommendationOutcome {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Self::Recommended(rec) => Some(rec),
            Self::NoRecommendation(_) => None,
        }
    }
}

/// Neighbor search strategy used by the clustering engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborIndexKind {
    #[default]
    Linear,
    Grid,
}

/// Clustering and aggregation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringParams {
    pub epsilon: f64,
    pub min_points: usize,
    pub top_tags: usize,
    pub neighbor_index: NeighborIndexKind,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON_DEGREES,
            min_points: DEFAULT_MIN_POINTS,
            top_tags: DEFAULT_TOP_TAGS,
            neighbor_index: NeighborIndexKind::Linear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_range() {
        assert!(GeoPoint::new(90.0, 180.0).is_some());
        assert!(GeoPoint::new(-90.0, -180.0).is_some());
        assert!(GeoPoint::new(90.1, 0.0).is_none());
        assert!(GeoPoint::new(0.0, -180.5).is_none());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_none());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_geo_point_rejects_out_of_range_json() {
        let ok: Result<GeoPoint, _> = serde_json::from_str(r#"{"lat": 10.0, "lng": 20.0}"#);
        assert_eq!(ok.unwrap(), GeoPoint::new(10.0, 20.0).unwrap());

        let bad: Result<GeoPoint, _> = serde_json::from_str(r#"{"lat": 1234, "lng": 5432}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_raw_record_decodes_camel_case_document() {
        let json = r#"{
            "location": {
                "position": {"lat": "49.19", "lng": -122.69},
                "title": "Crescent Beach",
                "icon": "beach"
            },
            "tags": ["beach"],
            "ownerId": "ignored"
        }"#;

        let record: RawLocationRecord = serde_json::from_str(json).unwrap();
        let position = record.location.unwrap().position.unwrap();
        assert_eq!(position.lat, Value::from("49.19"));
        assert_eq!(record.tags.unwrap(), vec!["beach"]);
    }

    #[test]
    fn test_raw_record_ignores_display_field_types() {
        let json = r#"{"location":{"position":{"lat":49.2,"lng":-123.1},"title":5,"icon":["x"]},"tags":["beach"]}"#;

        let record: RawLocationRecord = serde_json::from_str(json).unwrap();
        let location = record.location.unwrap();
        assert_eq!(location.position.unwrap().lat, Value::from(49.2));
        assert_eq!(location.title, Some(Value::from(5)));
        assert_eq!(record.tags.unwrap(), vec!["beach"]);
    }

    #[test]
    fn test_raw_record_lenient_tags() {
        let record: RawLocationRecord =
            serde_json::from_str(r#"{"tags":["beach",7,null,"sunset"]}"#).unwrap();
        assert_eq!(record.tags.unwrap(), vec!["beach", "sunset"]);

        let record: RawLocationRecord = serde_json::from_str(r#"{"tags":"beach"}"#).unwrap();
        assert_eq!(record.tags.unwrap(), Vec::<String>::new());

        let record: RawLocationRecord = serde_json::from_str(r#"{"tags":null}"#).unwrap();
        assert!(record.tags.is_none());
    }

    #[test]
    fn test_malformed_location_reads_as_absent() {
        let record: RawLocationRecord = serde_json::from_str(r#"{"location":"n/a"}"#).unwrap();
        assert!(record.location.is_none());

        let record: RawLocationRecord =
            serde_json::from_str(r#"{"location":{"position":[1,2]}}"#).unwrap();
        assert!(record.location.unwrap().position.is_none());

        let record = RawLocationRecord::from_value(Value::from("garbage"));
        assert!(record.location.is_none());
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(NoRecommendationReason::NoInputRecords.reason(), "no input records");
        assert_eq!(NoRecommendationReason::NoInputRecords.message(), "no images uploaded");
        assert_eq!(NoRecommendationReason::NoValidLocations.message(), "no valid locations");
    }

    #[test]
    fn test_cluster_tags_keep_duplicates() {
        let point = GeoPoint::new(1.0, 1.0).unwrap();
        let records = vec![
            TaggedRecord { position: point, tags: vec!["a".into(), "b".into()] },
            TaggedRecord { position: point, tags: vec!["a".into()] },
        ];
        let cluster = Cluster { id: 0, members: vec![0, 1] };

        let tags: Vec<&str> = cluster.tags(&records).collect();
        assert_eq!(tags, vec!["a", "b", "a"]);
    }
}
