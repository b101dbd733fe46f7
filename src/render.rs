//! Display data for list entries and map markers.
//!
//! Nothing here touches a UI; the view and map collaborators decide how to
//! draw what these functions return.

use crate::types::{DerivedMetric, TypeMetric, WorkoutId, WorkoutKind, WorkoutRecord};
use chrono::{Local, TimeZone};
use std::fmt;

/// Zoom used for the initial map view and when jumping to a workout.
pub const MAP_ZOOM_LEVEL: u8 = 13;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

/// One row of the workout list. `id` routes clicks back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub kind: WorkoutKind,
    pub title: String,
    pub details: Vec<Detail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPopup {
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
    pub class_name: String,
    pub content: String,
}

/// "Running on April 14", dated on the local calendar.
pub fn title(record: &WorkoutRecord) -> String {
    title_in(record, &Local)
}

pub fn title_in<Tz>(record: &WorkoutRecord, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "{} on {}",
        record.kind().label(),
        record.created_at().with_timezone(tz).format("%B %-d")
    )
}

pub fn list_entry(record: &WorkoutRecord) -> ListEntry {
    let kind = record.kind();
    let derived = match record.derived() {
        DerivedMetric::Pace(v) => Detail {
            icon: "⚡️",
            value: format!("{v:.1}"),
            unit: "min/km",
        },
        DerivedMetric::Speed(v) => Detail {
            icon: "⚡️",
            value: format!("{v:.1}"),
            unit: "km/h",
        },
    };
    let metric = match record.metric() {
        TypeMetric::Cadence(v) => Detail {
            icon: "🦶🏼",
            value: plain(v),
            unit: "spm",
        },
        TypeMetric::ElevationGain(v) => Detail {
            icon: "⛰",
            value: plain(v),
            unit: "m",
        },
    };

    ListEntry {
        id: record.id().clone(),
        kind,
        title: title(record),
        details: vec![
            Detail {
                icon: kind.icon(),
                value: plain(record.distance_km()),
                unit: "km",
            },
            Detail {
                icon: "⏱",
                value: plain(record.duration_min()),
                unit: "min",
            },
            derived,
            metric,
        ],
    }
}

pub fn marker_popup(record: &WorkoutRecord) -> MarkerPopup {
    let kind = record.kind();
    MarkerPopup {
        max_width: 250,
        min_width: 100,
        auto_close: false,
        close_on_click: false,
        class_name: format!("{kind}-popup"),
        content: format!("{} {}", kind.icon(), title(record)),
    }
}

/// Values as the user typed them: `5` rather than `5.0`.
fn plain(v: f64) -> String {
    format!("{v}")
}
