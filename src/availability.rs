//! Weekly opening-hours model and feasibility queries.
//!
//! Policy: fail open. A day with no schedule entry, or a raw entry that
//! does not parse, is treated as open all day. A false "closed" answer
//! silently drops a place from the trip, which hurts planning more than
//! the occasional over-optimistic schedule does. See `DaySchedule`.

use std::collections::HashMap;

use chrono::{NaiveTime, Weekday};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::model::TimePoint;

/// How far ahead `next_open` searches, in days.
const LOOKAHEAD_DAYS: u8 = 3;

/// Day keys of the wire form, Monday first.
const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// One weekday's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySchedule {
    /// Closed for the whole day.
    Closed,
    /// Open between `open` and `close`, both inclusive. `close < open`
    /// means the window wraps past midnight (e.g. 22:00-02:00).
    Window { open: NaiveTime, close: NaiveTime },
}

/// Per-weekday schedule table. A `None` day means open all day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningHours {
    days: [Option<DaySchedule>; 7],
}

/// Wire form of a single day: `{"open":"09:00","close":"17:00"}` or
/// `{"closed":true}`. Anything malformed degrades to "no entry".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDaySchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
}

impl From<DaySchedule> for RawDaySchedule {
    fn from(schedule: DaySchedule) -> Self {
        match schedule {
            DaySchedule::Closed => Self {
                closed: Some(true),
                ..Self::default()
            },
            DaySchedule::Window { open, close } => Self {
                open: Some(open.format("%H:%M").to_string()),
                close: Some(close.format("%H:%M").to_string()),
                closed: None,
            },
        }
    }
}

impl OpeningHours {
    /// Open all week, every day.
    pub fn always_open() -> Self {
        Self::default()
    }

    pub fn closed_all_week() -> Self {
        Self {
            days: [Some(DaySchedule::Closed); 7],
        }
    }

    pub fn with_day(mut self, weekday: Weekday, schedule: DaySchedule) -> Self {
        self.days[weekday.num_days_from_monday() as usize] = Some(schedule);
        self
    }

    pub fn day(&self, weekday: Weekday) -> Option<DaySchedule> {
        self.days[weekday.num_days_from_monday() as usize]
    }

    /// Builds a table from the wire form: day name (case-insensitive)
    /// to raw entry. Unknown day names and malformed entries are
    /// dropped, which makes the affected day open all day.
    pub fn from_raw(raw: &HashMap<String, RawDaySchedule>) -> Self {
        let mut days = [None; 7];
        for (name, entry) in raw {
            match DAY_NAMES.iter().position(|d| d.eq_ignore_ascii_case(name)) {
                Some(i) => days[i] = parse_raw_day(entry),
                None => warn!(day = %name, "unknown weekday in opening hours, ignoring"),
            }
        }
        Self { days }
    }
}

impl Serialize for OpeningHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let scheduled = self.days.iter().flatten().count();
        let mut map = serializer.serialize_map(Some(scheduled))?;
        for (i, day) in self.days.iter().enumerate() {
            if let Some(schedule) = day {
                map.serialize_entry(DAY_NAMES[i], &RawDaySchedule::from(*schedule))?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OpeningHours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, RawDaySchedule>::deserialize(deserializer)?;
        Ok(Self::from_raw(&raw))
    }
}

fn parse_raw_day(raw: &RawDaySchedule) -> Option<DaySchedule> {
    if raw.closed == Some(true) {
        return Some(DaySchedule::Closed);
    }
    match (raw.open.as_deref(), raw.close.as_deref()) {
        (Some(open), Some(close)) => match (parse_hhmm(open), parse_hhmm(close)) {
            (Some(open), Some(close)) => Some(DaySchedule::Window { open, close }),
            _ => {
                warn!(open, close, "unparseable opening hours, treating day as open");
                None
            }
        },
        _ => None,
    }
}

fn parse_hhmm(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M").ok()
}

/// Is the place open at this weekday + time-of-day?
///
/// Bounds are inclusive at both ends. For wrapping windows the test is
/// `time >= open || time <= close`.
pub fn is_open(hours: &OpeningHours, at: &TimePoint) -> bool {
    match hours.day(at.weekday) {
        None => true,
        Some(DaySchedule::Closed) => false,
        Some(DaySchedule::Window { open, close }) => {
            if close < open {
                at.time >= open || at.time <= close
            } else {
                at.time >= open && at.time <= close
            }
        }
    }
}

/// The next instant the place opens, searching at most three days ahead
/// of `from`. Returns `None` when nothing opens inside the horizon, in
/// which case the place is treated as permanently closed for planning.
///
/// If the place is already open at `from`, that instant is returned.
pub fn next_open(hours: &OpeningHours, from: &TimePoint) -> Option<TimePoint> {
    if is_open(hours, from) {
        return Some(*from);
    }

    for offset in 0..=i64::from(LOOKAHEAD_DAYS) {
        let day_start = from.plus_minutes(offset * 24 * 60);
        match hours.day(day_start.weekday) {
            Some(DaySchedule::Closed) => continue,
            Some(DaySchedule::Window { open, .. }) => {
                if offset == 0 {
                    // Same day: only a still-upcoming open counts.
                    if from.time < open {
                        return Some(TimePoint::new(from.weekday, open));
                    }
                } else {
                    return Some(TimePoint::new(day_start.weekday, open));
                }
            }
            None => {
                // Unscheduled day is open all day; can only be reached
                // with offset > 0 because offset 0 was open already.
                if offset > 0 {
                    return Some(TimePoint::new(day_start.weekday, NaiveTime::MIN));
                }
            }
        }
    }

    None
}
