use serde_json::Value;
use crate::models::{GeoPoint, NoRecommendationReason, RawLocationRecord, TaggedRecord};

/// Turn raw image records into validated, tagged positions.
///
/// This is the first stage of the recommendation pipeline. Records with a
/// missing location, non-numeric coordinates or coordinates out of range are
/// dropped silently; input order is preserved for the survivors.
///
/// # Returns
/// * `Err(NoInputRecords)` when no record carries a location at all
/// * `Err(NoValidLocations)` when located records exist but none is valid
pub fn extract_tagged_records(
    records: &[RawLocationRecord],
) -> Result<Vec<TaggedRecord>, NoRecommendationReason> {
    if records.iter().all(|record| record.location.is_none()) {
        return Err(NoRecommendationReason::NoInputRecords);
    }

    let valid: Vec<TaggedRecord> = records.iter().filter_map(to_tagged_record).collect();

    if valid.is_empty() {
        return Err(NoRecommendationReason::NoValidLocations);
    }

    Ok(valid)
}

/// Validate a single record
pub fn to_tagged_record(record: &RawLocationRecord) -> Option<TaggedRecord> {
    let position = record.location.as_ref()?.position.as_ref()?;
    let lat = coordinate(&position.lat)?;
    let lng = coordinate(&position.lng)?;

    Some(TaggedRecord {
        position: GeoPoint::new(lat, lng)?,
        tags: record.tags.clone().unwrap_or_default(),
    })
}

/// Read a coordinate stored either as a JSON number or a numeric string
fn coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawLocation, RawPosition};

    fn record_with(lat: Value, lng: Value) -> RawLocationRecord {
        RawLocationRecord {
            location: Some(RawLocation {
                position: Some(RawPosition { lat, lng }),
                ..RawLocation::default()
            }),
            tags: None,
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_tagged_records(&[]), Err(NoRecommendationReason::NoInputRecords));
    }

    #[test]
    fn test_records_without_location_count_as_empty() {
        let records = vec![RawLocationRecord::default(), RawLocationRecord::default()];
        assert_eq!(
            extract_tagged_records(&records),
            Err(NoRecommendationReason::NoInputRecords)
        );
    }

    #[test]
    fn test_out_of_range_is_no_valid_locations() {
        let records = vec![RawLocationRecord::at(1234.0, 5432.0, &["x"])];
        assert_eq!(
            extract_tagged_records(&records),
            Err(NoRecommendationReason::NoValidLocations)
        );
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let record = record_with(Value::from(" 49.25 "), Value::from("-123.1"));
        let tagged = to_tagged_record(&record).unwrap();
        assert_eq!(tagged.position.lat(), 49.25);
        assert_eq!(tagged.position.lng(), -123.1);
        assert!(tagged.tags.is_empty());
    }

    #[test]
    fn test_non_numeric_coordinates_are_dropped() {
        assert!(to_tagged_record(&record_with(Value::from("north"), Value::from(1.0))).is_none());
        assert!(to_tagged_record(&record_with(Value::from("NaN"), Value::from(1.0))).is_none());
        assert!(to_tagged_record(&record_with(Value::from(1.0), Value::from("inf"))).is_none());
        assert!(to_tagged_record(&record_with(Value::Null, Value::from(1.0))).is_none());
        assert!(to_tagged_record(&record_with(Value::Bool(true), Value::from(1.0))).is_none());
    }

    #[test]
    fn test_location_without_position_is_dropped() {
        let record = RawLocationRecord {
            location: Some(RawLocation::default()),
            tags: Some(vec!["lost".to_string()]),
        };
        assert!(to_tagged_record(&record).is_none());
        assert_eq!(
            extract_tagged_records(&[record]),
            Err(NoRecommendationReason::NoValidLocations)
        );
    }

    #[test]
    fn test_keeps_valid_records_in_order() {
        let records = vec![
            RawLocationRecord::at(10.0, 10.0, &["first"]),
            RawLocationRecord::default(),
            RawLocationRecord::at(91.0, 10.0, &["bad"]),
            RawLocationRecord::at(-10.0, -10.0, &["second"]),
        ];

        let valid = extract_tagged_records(&records).unwrap();
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].tags, vec!["first"]);
        assert_eq!(valid[1].tags, vec!["second"]);
    }
}
