//! Aggregation of StatRecords across matched events.
//!
//! Every field of an aggregate is the sum of that field over the contributing
//! records that carry it, except the averaged rate fields which hold the mean.
//! A field no contributing record carries stays absent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::EventRecord;
use crate::filter::EventPredicate;
use crate::stats::{is_averaged_field, is_derived_field, StatRecord, DERIVED_FIELDS};

/// Earliest and latest contributing dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
    pub label: String,
}

impl DateRange {
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Self {
        let label = if earliest == latest {
            format_date(earliest)
        } else {
            format!("{} - {}", format_date(earliest), format_date(latest))
        };
        Self {
            earliest,
            latest,
            label,
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

/// Composite statistics over one or more events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRecord {
    pub stats: StatRecord,
    pub event_count: usize,
    pub date_range: DateRange,
    /// Ordered by (date, id).
    pub event_ids: Vec<String>,
}

impl AggregateRecord {
    /// Aggregate of a single event.
    pub fn single(event: &EventRecord) -> Self {
        Self {
            stats: event.stats.clone(),
            event_count: 1,
            date_range: DateRange::new(event.date, event.date),
            event_ids: vec![event.id.clone()],
        }
    }

}

/// Sum the given events into one record.
///
/// Returns `None` when there is nothing to aggregate: callers report that as
/// "not found" instead of a zero-valued aggregate.
pub fn aggregate<'a, I>(events: I) -> Option<AggregateRecord>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut events: Vec<&EventRecord> = events.into_iter().collect();
    if events.is_empty() {
        return None;
    }
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    let mut carriers: BTreeMap<&str, usize> = BTreeMap::new();
    for event in &events {
        for (field, value) in event.stats.iter().filter(|(f, _)| !is_derived_field(f)) {
            *sums.entry(field).or_insert(0.0) += value;
            *carriers.entry(field).or_insert(0) += 1;
        }
    }

    let mut stats: StatRecord = sums
        .into_iter()
        .map(|(field, sum)| {
            let value = if is_averaged_field(field) {
                sum / carriers[field] as f64
            } else {
                sum
            };
            (field, value)
        })
        .collect();

    // A stored total stands in for its components on that record only.
    for (derived, _) in DERIVED_FIELDS {
        if events.iter().any(|e| e.stats.stores(derived)) {
            let total = events.iter().filter_map(|e| e.stats.get(derived)).sum::<f64>();
            stats.set(*derived, total);
        }
    }

    let earliest = events.first().map(|e| e.date)?;
    let latest = events.last().map(|e| e.date)?;

    Some(AggregateRecord {
        stats,
        event_count: events.len(),
        date_range: DateRange::new(earliest, latest),
        event_ids: events.iter().map(|e| e.id.clone()).collect(),
    })
}

/// Aggregate the events that satisfy `predicate`.
pub fn aggregate_matching(
    events: &[EventRecord],
    predicate: &EventPredicate,
) -> Option<AggregateRecord> {
    aggregate(events.iter().filter(|e| predicate.matches(e)))
}
