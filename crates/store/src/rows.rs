//! Row types and their mapping to domain records.
//!
//! `Date` columns travel as days since 1970-01-01 in RowBinary; JSON columns
//! travel as strings.

use analytics_core::{
    ChartConfiguration, ChartType, ElementConfig, Error, EventRecord, Result, StatRecord,
};
use chrono::NaiveDate;
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column list for `SELECT`s into [`EventRow`].
pub const EVENT_COLUMNS: &str = "event_id, event_name, event_date, partner_id, opponent_id, \
                                 hashtags, categorized_hashtags, stats";

/// Column list for `SELECT`s into [`ChartRow`].
pub const CHART_COLUMNS: &str =
    "chart_id, title, subtitle, chart_type, elements, display_order, is_active";

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Days since the Unix epoch, as ClickHouse `Date` stores them.
pub fn to_day_number(date: NaiveDate) -> Result<u16> {
    let days = (date - epoch()).num_days();
    u16::try_from(days).map_err(|_| {
        Error::invalid_format(format!("date {} is outside the storable range", date))
    })
}

pub fn from_day_number(days: u16) -> NaiveDate {
    epoch() + chrono::Duration::days(i64::from(days))
}

/// One row of the `events` table.
#[derive(Debug, Clone, PartialEq, Row, Serialize, Deserialize)]
pub struct EventRow {
    pub event_id: String,
    pub event_name: String,
    pub event_date: u16,
    pub partner_id: Option<String>,
    pub opponent_id: Option<String>,
    pub hashtags: Vec<String>,
    pub categorized_hashtags: String,
    pub stats: String,
}

impl TryFrom<&EventRecord> for EventRow {
    type Error = Error;

    fn try_from(event: &EventRecord) -> Result<Self> {
        event.stats.validate()?;
        Ok(Self {
            event_id: event.id.clone(),
            event_name: event.name.clone(),
            event_date: to_day_number(event.date)?,
            partner_id: event.partner_id.clone(),
            opponent_id: event.opponent_id.clone(),
            hashtags: event.hashtags.clone(),
            categorized_hashtags: serde_json::to_string(&event.categorized_hashtags)?,
            stats: serde_json::to_string(&event.stats)?,
        })
    }
}

impl TryFrom<EventRow> for EventRecord {
    type Error = Error;

    fn try_from(row: EventRow) -> Result<Self> {
        let categorized_hashtags: BTreeMap<String, Vec<String>> =
            if row.categorized_hashtags.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&row.categorized_hashtags)?
            };
        let stats: StatRecord = if row.stats.is_empty() {
            StatRecord::new()
        } else {
            serde_json::from_str(&row.stats)?
        };
        stats.validate()?;

        Ok(Self {
            id: row.event_id,
            name: row.event_name,
            date: from_day_number(row.event_date),
            partner_id: row.partner_id.filter(|p| !p.is_empty()),
            opponent_id: row.opponent_id.filter(|p| !p.is_empty()),
            hashtags: row.hashtags,
            categorized_hashtags,
            stats,
        })
    }
}

/// One row of the `chart_configurations` table.
#[derive(Debug, Clone, PartialEq, Row, Serialize, Deserialize)]
pub struct ChartRow {
    pub chart_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub chart_type: String,
    pub elements: String,
    pub display_order: i32,
    pub is_active: u8,
}

impl TryFrom<&ChartConfiguration> for ChartRow {
    type Error = Error;

    fn try_from(config: &ChartConfiguration) -> Result<Self> {
        Ok(Self {
            chart_id: config.chart_id.clone(),
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            chart_type: config.chart_type.as_str().to_string(),
            elements: serde_json::to_string(&config.elements)?,
            display_order: config.order,
            is_active: u8::from(config.is_active),
        })
    }
}

impl TryFrom<ChartRow> for ChartConfiguration {
    type Error = Error;

    fn try_from(row: ChartRow) -> Result<Self> {
        let chart_type: ChartType =
            serde_json::from_value(serde_json::Value::String(row.chart_type))?;
        let elements: Vec<ElementConfig> = serde_json::from_str(&row.elements)?;
        Ok(Self {
            chart_id: row.chart_id,
            title: row.title,
            subtitle: row.subtitle.filter(|s| !s.is_empty()),
            chart_type,
            elements,
            order: row.display_order,
            is_active: row.is_active != 0,
        })
    }
}

/// Convert rows, skipping ones that fail to decode.
///
/// Returns the decoded records and the ids of the rows that were skipped.
pub fn decode_rows<R, T, F>(rows: Vec<R>, id_of: F) -> (Vec<T>, Vec<String>)
where
    T: TryFrom<R, Error = Error>,
    F: Fn(&R) -> String,
{
    let mut decoded = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for row in rows {
        let id = id_of(&row);
        match T::try_from(row) {
            Ok(record) => decoded.push(record),
            Err(e) => {
                tracing::warn!(row_id = %id, error = %e, "Skipping undecodable row");
                skipped.push(id);
            }
        }
    }
    (decoded, skipped)
}
