//! Calendar month grid, scrolling timeline and recent list

use chrono::{Datelike, Duration, Months, NaiveDate};
use perfmap_common::Performance;
use std::collections::HashMap;

use crate::aggregation::month_label;

/// Cells in a month grid: five Sunday-first weeks
pub const GRID_CELLS: usize = 35;

/// Days shown on the timeline
pub const TIMELINE_DAYS: usize = 120;

/// Width of one timeline day, in view units
pub const DAY_WIDTH: f64 = 102.0;

/// One cell of the month grid
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    /// Whether the date belongs to the displayed month
    pub in_month: bool,
    pub is_today: bool,
    pub events: Vec<&'a Performance>,
}

/// One column of the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDay<'a> {
    pub date: NaiveDate,
    /// Month name shown above the first day and every 1st
    pub month_label: Option<&'static str>,
    pub is_today: bool,
    pub events: Vec<&'a Performance>,
}

fn by_date(events: &[Performance]) -> HashMap<NaiveDate, Vec<&Performance>> {
    let mut days: HashMap<NaiveDate, Vec<&Performance>> = HashMap::new();
    for event in events {
        if let Some(date) = event.date {
            days.entry(date).or_default().push(event);
        }
    }
    days
}

/// 35-cell grid for `year`-`month`, starting on the Sunday on or before the 1st
///
/// `None` when the year/month pair is not a valid date.
pub fn month_grid(
    events: &[Performance],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Option<Vec<DayCell<'_>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let start = first - Duration::days(i64::from(first.weekday().num_days_from_sunday()));
    let mut days = by_date(events);

    Some(
        start
            .iter_days()
            .take(GRID_CELLS)
            .map(|date| DayCell {
                date,
                in_month: date.month() == month && date.year() == year,
                is_today: date == today,
                events: days.remove(&date).unwrap_or_default(),
            })
            .collect(),
    )
}

/// First day of the timeline: one calendar month before today
pub fn timeline_start(today: NaiveDate) -> NaiveDate {
    today.checked_sub_months(Months::new(1)).unwrap_or(today)
}

/// 120 consecutive days from [`timeline_start`]
pub fn timeline(events: &[Performance], today: NaiveDate) -> Vec<TimelineDay<'_>> {
    let mut days = by_date(events);
    timeline_start(today)
        .iter_days()
        .take(TIMELINE_DAYS)
        .enumerate()
        .map(|(i, date)| TimelineDay {
            date,
            month_label: (i == 0 || date.day() == 1).then(|| month_label(date.month())),
            is_today: date == today,
            events: days.remove(&date).unwrap_or_default(),
        })
        .collect()
}

/// Horizontal offset of a date's column on the timeline
pub fn timeline_offset(today: NaiveDate, date: NaiveDate) -> f64 {
    (date - timeline_start(today)).num_days() as f64 * DAY_WIDTH
}

/// Events by date descending, undated last
pub fn recent(events: &[Performance]) -> Vec<&Performance> {
    let mut sorted: Vec<&Performance> = events.iter().collect();
    sorted.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted
}
