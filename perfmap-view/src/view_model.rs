//! View state shared between sibling views
//!
//! The owner hands `&mut ViewModel` to whichever view needs it; e.g. the
//! calendar's "today" button scrolls the timeline through
//! [`ViewModel::scroll_to_today`].

use chrono::NaiveDate;
use perfmap_common::Performance;

use crate::calendar::{self, TimelineDay};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    today: NaiveDate,
    scroll_offset: f64,
    selected_artist: Option<String>,
    selected_province: Option<String>,
}

impl ViewModel {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            scroll_offset: 0.0,
            selected_artist: None,
            selected_province: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Move to a new day; the timeline window moves with it
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.scroll_offset = 0.0;
    }

    /// Timeline window around today
    pub fn timeline<'a>(&self, events: &'a [Performance]) -> Vec<TimelineDay<'a>> {
        calendar::timeline(events, self.today)
    }

    /// Scroll the timeline so today's column is at the left edge
    ///
    /// Returns the new offset.
    pub fn scroll_to_today(&mut self) -> f64 {
        self.scroll_offset = calendar::timeline_offset(self.today, self.today);
        self.scroll_offset
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn select_artist(&mut self, artist: Option<String>) {
        self.selected_artist = artist;
    }

    pub fn selected_artist(&self) -> Option<&str> {
        self.selected_artist.as_deref()
    }

    pub fn select_province(&mut self, province: Option<String>) {
        self.selected_province = province;
    }

    pub fn selected_province(&self) -> Option<&str> {
        self.selected_province.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DAY_WIDTH;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_scroll_to_today() {
        let mut model = ViewModel::new(date(2024, 6, 15));
        assert_eq!(model.scroll_offset(), 0.0);

        let offset = model.scroll_to_today();
        assert_eq!(offset, 31.0 * DAY_WIDTH);
        assert_eq!(model.scroll_offset(), offset);

        // Today's column sits at the returned offset
        let days = model.timeline(&[]);
        let index = days.iter().position(|d| d.is_today).unwrap();
        assert_eq!(index as f64 * DAY_WIDTH, offset);
    }

    #[test]
    fn test_scroll_shared_between_views() {
        fn calendar_today_button(model: &mut ViewModel) {
            model.scroll_to_today();
        }

        let mut model = ViewModel::new(date(2024, 3, 1));
        calendar_today_button(&mut model);
        // February has 29 days in 2024
        assert_eq!(model.scroll_offset(), 29.0 * DAY_WIDTH);

        model.set_today(date(2024, 3, 2));
        assert_eq!(model.scroll_offset(), 0.0);
    }

    #[test]
    fn test_selection() {
        let mut model = ViewModel::new(date(2024, 1, 1));
        model.select_artist(Some("A".to_string()));
        model.select_province(Some("浙江".to_string()));
        assert_eq!(model.selected_artist(), Some("A"));
        assert_eq!(model.selected_province(), Some("浙江"));
        model.select_artist(None);
        assert_eq!(model.selected_artist(), None);
    }
}
