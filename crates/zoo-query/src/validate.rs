//! Request validation: schema first, then the date range.

use crate::QueryError;
use zoo_types::{parse_utc_timestamp, QueryRequest, QueryRequestBody};

/// Parse and validate a raw JSON body.
///
/// Any syntax error, missing or `null` field, or wrongly typed field is `SchemaInvalid`.
/// Dates that do not parse, or a start after the end, are `DateRangeInvalid`.
pub fn parse_request(body: &[u8]) -> Result<QueryRequest, QueryError> {
    let body: QueryRequestBody =
        serde_json::from_slice(body).map_err(|e| QueryError::SchemaInvalid(e.to_string()))?;
    validate_request(body)
}

pub fn validate_request(body: QueryRequestBody) -> Result<QueryRequest, QueryError> {
    if body.tags.is_empty() {
        return Err(QueryError::SchemaInvalid(
            "tags must contain at least one tag".to_string(),
        ));
    }
    let start_date = parse_utc_timestamp(&body.start_date).ok_or_else(|| {
        QueryError::DateRangeInvalid(format!("startDate {:?} is not a valid timestamp", body.start_date))
    })?;
    let end_date = parse_utc_timestamp(&body.end_date).ok_or_else(|| {
        QueryError::DateRangeInvalid(format!("endDate {:?} is not a valid timestamp", body.end_date))
    })?;
    if start_date > end_date {
        return Err(QueryError::DateRangeInvalid(
            "startDate must not be after endDate".to_string(),
        ));
    }
    Ok(QueryRequest {
        tags: body.tags,
        start_date,
        end_date,
        app_context_guid: body.app_context_guid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    fn valid() -> serde_json::Value {
        json!({
            "tags": [{ "tagName": "A", "tagId": 1 }, { "tagName": "B", "tagId": 2 }],
            "startDate": "2025-03-19T04:00:00Z",
            "endDate": "2025-03-19T05:00:00Z",
            "appContextGuid": "G1"
        })
    }

    #[test]
    fn accepts_valid_request() {
        let req = parse_request(&body(valid())).unwrap();
        assert_eq!(req.tags.len(), 2);
        assert_eq!(req.tags[1].tag_name, "B");
        assert_eq!(req.app_context_guid, "G1");
        assert!(req.start_date < req.end_date);
    }

    #[test]
    fn missing_or_null_fields_are_schema_errors() {
        for field in ["tags", "startDate", "endDate", "appContextGuid"] {
            let mut v = valid();
            v.as_object_mut().unwrap().remove(field);
            let err = parse_request(&body(v)).unwrap_err();
            assert_eq!(err.code(), "JH-4001", "missing {}", field);

            let mut v = valid();
            v[field] = serde_json::Value::Null;
            let err = parse_request(&body(v)).unwrap_err();
            assert_eq!(err.code(), "JH-4001", "null {}", field);
        }
    }

    #[test]
    fn wrong_types_are_schema_errors() {
        let cases = [
            ("tags", json!("A,B")),
            ("tags", json!([{ "tagName": "A", "tagId": "1" }])),
            ("tags", json!([{ "tagId": 1 }])),
            ("tags", json!([])),
            ("startDate", json!(20250319)),
            ("appContextGuid", json!(17)),
        ];
        for (field, value) in cases {
            let mut v = valid();
            v[field] = value.clone();
            let err = parse_request(&body(v)).unwrap_err();
            assert_eq!(err.code(), "JH-4001", "{} = {}", field, value);
        }
        assert_eq!(parse_request(b"{not json").unwrap_err().code(), "JH-4001");
    }

    #[test]
    fn unparsable_dates_are_range_errors() {
        let mut v = valid();
        v["endDate"] = json!("tomorrow");
        assert_eq!(parse_request(&body(v)).unwrap_err().code(), "JH-4002");
    }

    #[test]
    fn start_after_end_is_range_error_regardless_of_tags() {
        let mut v = valid();
        v["startDate"] = json!("2025-03-19T06:00:00Z");
        assert_eq!(parse_request(&body(v)).unwrap_err().code(), "JH-4002");

        let mut v = valid();
        v["tags"] = json!([{ "tagName": "Z", "tagId": 999 }]);
        v["startDate"] = json!("2025-03-20T00:00:00Z");
        assert_eq!(parse_request(&body(v)).unwrap_err().code(), "JH-4002");
    }

    #[test]
    fn equal_bounds_are_valid() {
        let mut v = valid();
        v["endDate"] = v["startDate"].clone();
        assert!(parse_request(&body(v)).is_ok());
    }
}
