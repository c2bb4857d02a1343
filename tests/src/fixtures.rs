//! Test fixtures: events and chart configurations.

use analytics_core::{ChartConfiguration, ChartType, ElementConfig, EventRecord, StatRecord};
use chrono::NaiveDate;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn stats(pairs: &[(&str, f64)]) -> StatRecord {
    pairs.iter().copied().collect()
}

/// Event with a unique id.
pub fn unique_event(when: NaiveDate, pairs: &[(&str, f64)]) -> EventRecord {
    let id = format!("evt-{}", Uuid::new_v4());
    EventRecord::new(id.clone(), id, when).with_stats(stats(pairs))
}

/// Fixture between `home` and `away` with the given stadium crowd.
pub fn game(id: &str, when: NaiveDate, home: &str, away: &str, fans: f64) -> EventRecord {
    EventRecord::new(id, format!("{} vs {}", home, away), when)
        .with_partner(home)
        .with_opponent(away)
        .with_stats(stats(&[("stadium", fans)]))
}

/// Two `#budapest` events (100 and 150 stadium fans) and one elsewhere.
pub fn budapest_events() -> Vec<EventRecord> {
    vec![
        EventRecord::new("bp-1", "Budapest opener", date(2024, 1, 5))
            .with_partner("ftc")
            .with_hashtags(["budapest", "derby"])
            .with_category("city", ["budapest"])
            .with_stats(stats(&[("stadium", 100.0), ("female", 40.0), ("male", 60.0)])),
        EventRecord::new("bp-2", "Budapest return", date(2024, 1, 28))
            .with_partner("mtk")
            .with_hashtags(["Budapest"])
            .with_stats(stats(&[("stadium", 150.0), ("female", 70.0), ("male", 80.0)])),
        EventRecord::new("vie-1", "Vienna cup", date(2024, 2, 10))
            .with_partner("rapid")
            .with_hashtags(["vienna"])
            .with_category("city", ["vienna"])
            .with_stats(stats(&[("stadium", 999.0)])),
    ]
}

/// Home crowds averaging 500 and away crowds averaging 400 for `ftc`.
pub fn home_away_events() -> Vec<EventRecord> {
    vec![
        game("h1", date(2024, 9, 1), "ftc", "mtk", 450.0),
        game("h2", date(2024, 9, 15), "ftc", "dvtk", 550.0),
        game("a1", date(2024, 9, 8), "mtk", "ftc", 380.0),
        game("a2", date(2024, 9, 22), "dvtk", "ftc", 420.0),
        game("old", date(2024, 3, 1), "ftc", "mtk", 500.0),
    ]
}

/// Three steady home games followed by a collapse in attendance.
pub fn attendance_drop_events() -> Vec<EventRecord> {
    vec![
        game("w1", date(2024, 10, 1), "ftc", "mtk", 1000.0),
        game("w2", date(2024, 10, 8), "ftc", "dvtk", 1000.0),
        game("w3", date(2024, 10, 15), "ftc", "zte", 1000.0),
        game("w4", date(2024, 10, 22), "ftc", "pmfc", 500.0),
    ]
}

pub fn element(id: &str, formula: &str) -> ElementConfig {
    ElementConfig {
        id: id.into(),
        label: id.into(),
        formula: formula.into(),
        color: "#3b82f6".into(),
        format: None,
    }
}

pub fn chart(
    id: &str,
    chart_type: ChartType,
    order: i32,
    elements: Vec<ElementConfig>,
) -> ChartConfiguration {
    ChartConfiguration {
        chart_id: id.into(),
        title: id.into(),
        subtitle: None,
        chart_type,
        elements,
        order,
        is_active: true,
    }
}

/// Gender pie, fans KPI, an attendee KPI and a bar chart with one bad formula.
pub fn standard_charts() -> Vec<ChartConfiguration> {
    vec![
        chart(
            "gender",
            ChartType::Pie,
            1,
            vec![element("female", "female"), element("male", "male")],
        ),
        chart("fans", ChartType::Kpi, 2, vec![element("fans", "totalFans")]),
        chart("attendees", ChartType::Kpi, 3, vec![element("attendees", "eventAttendees")]),
        chart(
            "broken",
            ChartType::Bar,
            4,
            vec![
                element("a", "female"),
                element("b", "male"),
                element("c", "female +"),
                element("d", "male"),
                element("e", "female"),
            ],
        ),
    ]
}
