use chrono::{Duration, NaiveDate, NaiveTime};

use crate::models::TimeSlot;

/// Number of days, starting today, offered by the date picker.
pub const DATE_WINDOW_DAYS: u32 = 14;

/// Business hours and slot grid for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSchedule {
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    pub interval_minutes: u32,
    pub slots_per_day: u32,
}

impl Default for SlotSchedule {
    fn default() -> Self {
        Self {
            opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            closing: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            interval_minutes: 30,
            slots_per_day: 16,
        }
    }
}

impl SlotSchedule {
    /// Candidate slots for `date`, one every `interval_minutes` from opening.
    /// A slot whose end would fall after closing is left out; `is_available`
    /// is asked once per kept slot.
    pub fn generate(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        mut is_available: impl FnMut() -> bool,
    ) -> Vec<TimeSlot> {
        let day_start = date.and_time(self.opening);
        let closing = date.and_time(self.closing);

        (0..self.slots_per_day)
            .filter_map(|i| {
                let start = day_start + Duration::minutes(i64::from(i * self.interval_minutes));
                let end = start + Duration::minutes(i64::from(duration_minutes));
                // A slot ending exactly at closing is still offered.
                if end > closing {
                    return None;
                }
                Some(TimeSlot {
                    id: format!("slot-{i}"),
                    start_time: start,
                    end_time: end,
                    available: is_available(),
                })
            })
            .collect()
    }
}

pub fn date_options(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    today.iter_days().take(days as usize).collect()
}

pub fn within_window(today: NaiveDate, date: NaiveDate) -> bool {
    date >= today && date < today + Duration::days(i64::from(DATE_WINDOW_DAYS))
}
