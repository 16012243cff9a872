//! Grouping store rows per tag and shaping one response entry per requested tag.

use std::collections::{BTreeSet, HashMap};
use zoo_types::{QueryRequest, RangeQuery, TagEventRow, TagResponse, TimeSeriesEvent};

/// Store query for a validated request: distinct tag ids, ascending.
pub fn range_query_for(req: &QueryRequest) -> RangeQuery {
    let tag_ids: BTreeSet<i64> = req.tags.iter().map(|t| t.tag_id).collect();
    RangeQuery {
        tag_ids: tag_ids.into_iter().collect(),
        start: req.start_date,
        end: req.end_date,
    }
}

/// Partition rows by tag id, each list ordered by timestamp.
pub fn group_by_tag(rows: Vec<TagEventRow>) -> HashMap<i64, Vec<TimeSeriesEvent>> {
    let mut grouped: HashMap<i64, Vec<TimeSeriesEvent>> = HashMap::new();
    for row in rows {
        grouped.entry(row.tag_id).or_default().push(row.into_event());
    }
    for events in grouped.values_mut() {
        events.sort_by(|a, b| a.time_stamp.cmp(&b.time_stamp));
    }
    grouped
}

/// One entry per requested tag, in request order. Tags without rows get `events = []`.
pub fn shape_responses(
    req: &QueryRequest,
    grouped: &HashMap<i64, Vec<TimeSeriesEvent>>,
) -> Vec<TagResponse> {
    req.tags
        .iter()
        .map(|tag| TagResponse {
            tag_name: tag.tag_name.clone(),
            tag_id: tag.tag_id,
            app_context_guid: req.app_context_guid.clone(),
            events: grouped.get(&tag.tag_id).cloned().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use zoo_types::TagRequest;

    fn request(tags: &[(&str, i64)]) -> QueryRequest {
        QueryRequest {
            tags: tags
                .iter()
                .map(|(name, id)| TagRequest {
                    tag_name: name.to_string(),
                    tag_id: *id,
                })
                .collect(),
            start_date: Utc.with_ymd_and_hms(2025, 3, 19, 4, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 3, 19, 5, 0, 0).unwrap(),
            app_context_guid: "G1".to_string(),
        }
    }

    fn row(tag_id: i64, minute: u32, value: f64) -> TagEventRow {
        TagEventRow {
            tag_id,
            time_stamp: Utc.with_ymd_and_hms(2025, 3, 19, 4, minute, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn range_query_dedups_and_sorts_ids() {
        let q = range_query_for(&request(&[("C", 3), ("A", 1), ("A again", 1)]));
        assert_eq!(q.tag_ids, vec![1, 3]);
    }

    #[test]
    fn grouping_orders_each_tag_by_time() {
        let grouped = group_by_tag(vec![row(1, 20, 2.0), row(2, 5, 9.0), row(1, 10, 1.0)]);
        let one: Vec<f64> = grouped[&1].iter().map(|e| e.value).collect();
        assert_eq!(one, vec![1.0, 2.0]);
        assert_eq!(grouped[&2].len(), 1);
    }

    #[test]
    fn every_requested_tag_appears_in_request_order() {
        let req = request(&[("B", 2), ("A", 1), ("Dup", 2)]);
        let grouped = group_by_tag(vec![row(2, 10, 3.5)]);
        let out = shape_responses(&req, &grouped);
        let names: Vec<&str> = out.iter().map(|t| t.tag_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "Dup"]);
        assert_eq!(out[0].events.len(), 1);
        assert!(out[1].events.is_empty());
        assert_eq!(out[2].events, out[0].events);
        assert!(out.iter().all(|t| t.app_context_guid == "G1"));
    }
}
