//! Statistics over the in-memory event list
//!
//! All functions are pure. Count rankings are stable: equal counts keep the
//! order in which their labels first appeared.

use chrono::Datelike;
use perfmap_common::province::normalize;
use perfmap_common::Performance;
use serde::Serialize;
use std::collections::HashMap;

/// Month names in calendar order
pub const MONTH_LABELS: [&str; 12] = [
    "一月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "十一月", "十二月",
];

/// Bucket label for events without a date
pub const UNKNOWN_MONTH: &str = "未知";

/// Group label for events without a venue
pub const UNSET_VENUE: &str = "未设置场馆";

/// Label for events with a blank type
pub const OTHER_TYPE: &str = "其他";

/// Group label for events with a blank artist
pub const UNKNOWN_ARTIST: &str = "未知艺人";

/// Length of the artist and province rankings
pub const TOP_N: usize = 10;

/// A label with its event count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

/// Events in one month of the year (any year)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// 1-12, or `None` for the undated bucket
    pub month: Option<u32>,
    pub label: String,
    pub count: usize,
}

/// Events sharing a venue
#[derive(Debug, Clone, PartialEq)]
pub struct VenueGroup<'a> {
    pub venue: String,
    pub events: Vec<&'a Performance>,
}

/// One artist's events within a filtered list
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistGroup<'a> {
    pub artist: String,
    pub events: Vec<&'a Performance>,
}

/// Everything the province panel shows
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceDetail<'a> {
    /// Per-type counts over every event in the province
    pub types: Vec<CountEntry>,
    /// The active type filter, if any
    pub selected_type: Option<String>,
    /// Events passing the filter, grouped by artist
    pub artists: Vec<ArtistGroup<'a>>,
}

impl ProvinceDetail<'_> {
    /// Events remaining after the type filter
    pub fn shown(&self) -> usize {
        self.artists.iter().map(|group| group.events.len()).sum()
    }
}

/// Headline figures for the statistics view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    pub total: usize,
    pub by_month: Vec<MonthCount>,
    pub top_artists: Vec<CountEntry>,
    pub top_provinces: Vec<CountEntry>,
}

pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_LABELS.get(i as usize))
        .copied()
        .unwrap_or(UNKNOWN_MONTH)
}

/// Count labels in first-appearance order, then rank by count descending
fn ranked(labels: impl Iterator<Item = String>) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for label in labels {
        match positions.get(&label) {
            Some(&i) => entries[i].count += 1,
            None => {
                positions.insert(label.clone(), entries.len());
                entries.push(CountEntry { label, count: 1 });
            }
        }
    }
    // sort_by is stable
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Events per month, in calendar order, with undated events last
///
/// Only months that have events appear. Counts always sum to `events.len()`.
pub fn by_month(events: &[Performance]) -> Vec<MonthCount> {
    let mut counts = [0usize; 12];
    let mut undated = 0;
    for event in events {
        match event.date {
            Some(date) => counts[date.month0() as usize] += 1,
            None => undated += 1,
        }
    }

    let mut months: Vec<MonthCount> = counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .map(|(i, &count)| MonthCount {
            month: Some(i as u32 + 1),
            label: MONTH_LABELS[i].to_string(),
            count,
        })
        .collect();
    if undated > 0 {
        months.push(MonthCount {
            month: None,
            label: UNKNOWN_MONTH.to_string(),
            count: undated,
        });
    }
    months
}

/// Every artist with its event count, most frequent first
pub fn artist_counts(events: &[Performance]) -> Vec<CountEntry> {
    ranked(events.iter().map(|event| event.artist.clone()))
}

pub fn top_artists(events: &[Performance]) -> Vec<CountEntry> {
    let mut counts = artist_counts(events);
    counts.truncate(TOP_N);
    counts
}

/// Every normalized province with its event count, most frequent first
pub fn province_counts(events: &[Performance]) -> Vec<CountEntry> {
    ranked(events.iter().map(|event| normalize(&event.province)))
}

pub fn top_provinces(events: &[Performance]) -> Vec<CountEntry> {
    let mut counts = province_counts(events);
    counts.truncate(TOP_N);
    counts
}

/// Events grouped by venue, groups in first-appearance order
pub fn by_venue(events: &[Performance]) -> Vec<VenueGroup<'_>> {
    let mut groups: Vec<VenueGroup<'_>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for event in events {
        let venue = event
            .venue
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNSET_VENUE);
        match positions.get(venue) {
            Some(&i) => groups[i].events.push(event),
            None => {
                positions.insert(venue, groups.len());
                groups.push(VenueGroup {
                    venue: venue.to_string(),
                    events: vec![event],
                });
            }
        }
    }
    groups
}

/// An artist's events by date ascending, undated last
pub fn for_artist<'a>(events: &'a [Performance], artist: &str) -> Vec<&'a Performance> {
    let mut matching: Vec<&Performance> = events.iter().filter(|e| e.artist == artist).collect();
    matching.sort_by_key(|e| (e.date.is_none(), e.date));
    matching
}

/// Events whose province normalizes to the same key as `province`
pub fn in_province<'a>(events: &'a [Performance], province: &str) -> Vec<&'a Performance> {
    let key = normalize(province);
    events
        .iter()
        .filter(|e| normalize(&e.province) == key)
        .collect()
}

/// Events dated in the given month (1-12) of any year
pub fn in_month(events: &[Performance], month: u32) -> Vec<&Performance> {
    events
        .iter()
        .filter(|e| e.date.map(|d| d.month()) == Some(month))
        .collect()
}

fn type_of(event: &Performance) -> &str {
    let kind = event.kind.trim();
    if kind.is_empty() {
        OTHER_TYPE
    } else {
        kind
    }
}

/// Events per type, in first-appearance order
pub fn type_counts(events: &[&Performance]) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = Vec::new();
    for event in events {
        let kind = type_of(event);
        match entries.iter_mut().find(|entry| entry.label == kind) {
            Some(entry) => entry.count += 1,
            None => entries.push(CountEntry {
                label: kind.to_string(),
                count: 1,
            }),
        }
    }
    entries
}

/// Events of one type; `None` keeps everything
pub fn by_type<'a>(events: &[&'a Performance], kind: Option<&str>) -> Vec<&'a Performance> {
    match kind {
        Some(kind) => events
            .iter()
            .copied()
            .filter(|event| type_of(event) == kind)
            .collect(),
        None => events.to_vec(),
    }
}

/// Events grouped by artist, groups in first-appearance order
pub fn by_artist_in<'a>(events: &[&'a Performance]) -> Vec<ArtistGroup<'a>> {
    let mut groups: Vec<ArtistGroup<'a>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for &event in events {
        let artist = match event.artist.trim() {
            "" => UNKNOWN_ARTIST,
            name => name,
        };
        match positions.get(artist) {
            Some(&i) => groups[i].events.push(event),
            None => {
                positions.insert(artist, groups.len());
                groups.push(ArtistGroup {
                    artist: artist.to_string(),
                    events: vec![event],
                });
            }
        }
    }
    groups
}

/// Type counts, filter and artist grouping for one province's events
///
/// Counts always cover the whole province so every type stays selectable.
pub fn province_detail<'a>(events: &[&'a Performance], kind: Option<&str>) -> ProvinceDetail<'a> {
    ProvinceDetail {
        types: type_counts(events),
        selected_type: kind.map(str::to_string),
        artists: by_artist_in(&by_type(events, kind)),
    }
}

pub fn market_summary(events: &[Performance]) -> MarketSummary {
    MarketSummary {
        total: events.len(),
        by_month: by_month(events),
        top_artists: top_artists(events),
        top_provinces: top_provinces(events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn event(artist: &str, province: &str, date: Option<&str>) -> Performance {
        Performance {
            id: 0,
            artist: artist.to_string(),
            kind: "concert".to_string(),
            province: province.to_string(),
            city: None,
            venue: None,
            notes: None,
            date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            poster: None,
            created_at: Utc::now(),
        }
    }

    fn with_venue(mut e: Performance, venue: &str) -> Performance {
        e.venue = Some(venue.to_string());
        e
    }

    fn entry(label: &str, count: usize) -> CountEntry {
        CountEntry {
            label: label.to_string(),
            count,
        }
    }

    #[test]
    fn test_artist_counts_simple() {
        let events = vec![event("A", "浙江", None), event("A", "浙江", None), event("B", "浙江", None)];
        assert_eq!(artist_counts(&events), vec![entry("A", 2), entry("B", 1)]);
    }

    #[test]
    fn test_artist_ties_keep_first_appearance() {
        let events = vec![
            event("C", "x", None),
            event("B", "x", None),
            event("A", "x", None),
            event("B", "x", None),
            event("A", "x", None),
        ];
        assert_eq!(
            artist_counts(&events),
            vec![entry("B", 2), entry("A", 2), entry("C", 1)]
        );
    }

    #[test]
    fn test_top_artists_truncates() {
        let events: Vec<Performance> = (0..15)
            .map(|i| event(&format!("artist-{}", i), "x", None))
            .collect();
        let top = top_artists(&events);
        assert_eq!(top.len(), TOP_N);
        assert_eq!(top[0].label, "artist-0");
    }

    #[test]
    fn test_province_counts_normalize() {
        let events = vec![
            event("A", "四川省", None),
            event("B", "广西壮族自治区", None),
            event("C", "四川", None),
        ];
        assert_eq!(province_counts(&events), vec![entry("四川", 2), entry("广西", 1)]);
    }

    #[test]
    fn test_by_month_calendar_order_and_totals() {
        let events = vec![
            event("A", "x", Some("2024-11-02")),
            event("A", "x", None),
            event("A", "x", Some("2023-02-14")),
            event("A", "x", Some("2024-11-20")),
            event("A", "x", Some("2025-01-01")),
        ];
        let months = by_month(&events);

        let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["一月", "二月", "十一月", "未知"]);
        assert_eq!(months[2].count, 2);
        assert_eq!(months[3].month, None);
        assert_eq!(months.iter().map(|m| m.count).sum::<usize>(), events.len());
    }

    #[test]
    fn test_by_month_order_independent_of_input_order() {
        let mut events = vec![
            event("A", "x", Some("2024-12-01")),
            event("A", "x", Some("2024-03-01")),
            event("A", "x", Some("2024-07-01")),
        ];
        let forward = by_month(&events);
        events.reverse();
        assert_eq!(by_month(&events), forward);
        assert!(by_month(&[]).is_empty());
    }

    #[test]
    fn test_month_label_bounds() {
        assert_eq!(month_label(1), "一月");
        assert_eq!(month_label(12), "十二月");
        assert_eq!(month_label(0), UNKNOWN_MONTH);
        assert_eq!(month_label(13), UNKNOWN_MONTH);
    }

    #[test]
    fn test_by_venue_groups_in_first_appearance_order() {
        let events = vec![
            with_venue(event("A", "x", None), "Arena"),
            event("B", "x", None),
            with_venue(event("C", "x", None), "Club"),
            with_venue(event("D", "x", None), "Arena"),
            with_venue(event("E", "x", None), "  "),
        ];
        let groups = by_venue(&events);

        let venues: Vec<&str> = groups.iter().map(|g| g.venue.as_str()).collect();
        assert_eq!(venues, vec!["Arena", UNSET_VENUE, "Club"]);
        assert_eq!(groups[0].events.len(), 2);
        assert_eq!(groups[1].events.len(), 2);
    }

    #[test]
    fn test_for_artist_sorted_ascending_undated_last() {
        let events = vec![
            event("A", "x", None),
            event("A", "x", Some("2024-06-01")),
            event("B", "x", Some("2024-01-01")),
            event("A", "x", Some("2024-02-01")),
        ];
        let dates: Vec<Option<NaiveDate>> = for_artist(&events, "A").iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 1),
                NaiveDate::from_ymd_opt(2024, 6, 1),
                None
            ]
        );
    }

    #[test]
    fn test_in_province_and_in_month() {
        let events = vec![
            event("A", "浙江省", Some("2024-05-01")),
            event("B", "浙江", Some("2023-05-30")),
            event("C", "四川省", Some("2024-06-01")),
        ];
        assert_eq!(in_province(&events, "浙江").len(), 2);
        assert_eq!(in_month(&events, 5).len(), 2);
        assert_eq!(in_month(&events, 8).len(), 0);
    }

    #[test]
    fn test_market_summary() {
        let events = vec![event("A", "浙江省", Some("2024-05-01")), event("B", "四川省", None)];
        let summary = market_summary(&events);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_month.len(), 2);
        assert_eq!(summary.top_artists.len(), 2);
        assert_eq!(summary.top_provinces[0].label, "浙江");
    }

    fn with_kind(mut e: Performance, kind: &str) -> Performance {
        e.kind = kind.to_string();
        e
    }

    #[test]
    fn test_type_counts_first_appearance_and_blank_type() {
        let events = vec![
            with_kind(event("A", "x", None), "音乐节"),
            with_kind(event("B", "x", None), "演唱会"),
            with_kind(event("C", "x", None), " "),
            with_kind(event("D", "x", None), "演唱会"),
        ];
        let refs: Vec<&Performance> = events.iter().collect();
        assert_eq!(
            type_counts(&refs),
            vec![entry("音乐节", 1), entry("演唱会", 2), entry(OTHER_TYPE, 1)]
        );
    }

    #[test]
    fn test_by_type_filter() {
        let events = vec![
            with_kind(event("A", "x", None), "音乐节"),
            with_kind(event("B", "x", None), "演唱会"),
            with_kind(event("C", "x", None), ""),
        ];
        let refs: Vec<&Performance> = events.iter().collect();
        assert_eq!(by_type(&refs, None).len(), 3);

        let festivals = by_type(&refs, Some("音乐节"));
        assert_eq!(festivals.len(), 1);
        assert_eq!(festivals[0].artist, "A");

        let other = by_type(&refs, Some(OTHER_TYPE));
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].artist, "C");
        assert!(by_type(&refs, Some("livehouse")).is_empty());
    }

    #[test]
    fn test_by_artist_in_groups() {
        let events = vec![
            event("B", "x", Some("2024-01-01")),
            event("A", "x", None),
            event("", "x", None),
            event("B", "x", Some("2024-02-01")),
        ];
        let refs: Vec<&Performance> = events.iter().collect();
        let groups = by_artist_in(&refs);

        let artists: Vec<&str> = groups.iter().map(|g| g.artist.as_str()).collect();
        assert_eq!(artists, vec!["B", "A", UNKNOWN_ARTIST]);
        assert_eq!(groups[0].events.len(), 2);
        assert_eq!(groups.iter().map(|g| g.events.len()).sum::<usize>(), events.len());
    }

    #[test]
    fn test_province_detail_filter_keeps_all_type_counts() {
        let events = vec![
            with_kind(event("A", "浙江省", None), "音乐节"),
            with_kind(event("B", "浙江", None), "演唱会"),
            with_kind(event("A", "浙江", None), "演唱会"),
            with_kind(event("C", "四川", None), "演唱会"),
        ];
        let zhejiang = in_province(&events, "浙江省");

        let all = province_detail(&zhejiang, None);
        assert_eq!(all.shown(), 3);
        assert_eq!(all.selected_type, None);
        assert_eq!(all.artists.len(), 2);

        let concerts = province_detail(&zhejiang, Some("演唱会"));
        assert_eq!(concerts.types, all.types);
        assert_eq!(concerts.selected_type.as_deref(), Some("演唱会"));
        assert_eq!(concerts.shown(), 2);
        let artists: Vec<&str> = concerts.artists.iter().map(|g| g.artist.as_str()).collect();
        assert_eq!(artists, vec!["B", "A"]);
    }
}
