#![forbid(unsafe_code)]

use crate::ids::ItemId;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Weekday};

pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_DAY: i64 = 24 * 60 * MS_PER_MINUTE;
pub const DEFAULT_WINDOW_DAYS: usize = 7;
/// Public demo bookings open this many days ahead of today.
pub const BOOKING_HORIZON_DAYS: i64 = 60;
/// Start hours offered to the public, inclusive.
pub const BOOKING_HOURS: std::ops::RangeInclusive<i64> = 9..=16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CalendarError {
    InvalidDate,
    InvalidClock,
    InvalidHour,
    EmptySlot,
    OutOfRange,
    PastDate,
    BeyondHorizon,
    OutsideBookingHours,
}

impl CalendarError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidDate => "date must be YYYY-MM-DD",
            Self::InvalidClock => "time must be HH:MM",
            Self::InvalidHour => "hour must be within 0..=23",
            Self::EmptySlot => "end must be after start",
            Self::OutOfRange => "timestamp out of range",
            Self::PastDate => "date must not be in the past",
            Self::BeyondHorizon => "demos can be booked at most 60 days ahead",
            Self::OutsideBookingHours => "demos start between 09:00 and 16:00",
        }
    }
}

impl std::fmt::Display for CalendarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for CalendarError {}

/// A calendar day; the bucket key of the to-do board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayBucket(Date);

impl DayBucket {
    pub fn parse(value: &str) -> Result<Self, CalendarError> {
        Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| CalendarError::InvalidDate)
    }

    pub fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub fn date(self) -> Date {
        self.0
    }

    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn of_ms(ts_ms: i64) -> Result<Self, CalendarError> {
        OffsetDateTime::from_unix_timestamp(ts_ms.div_euclid(1000))
            .map(|dt| Self(dt.date()))
            .map_err(|_| CalendarError::OutOfRange)
    }

    pub fn start_ms(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp() * 1000
    }

    pub fn end_ms(self) -> i64 {
        self.start_ms() + MS_PER_DAY
    }

    pub fn add_days(self, days: i64) -> Result<Self, CalendarError> {
        self.0
            .checked_add(Duration::days(days))
            .map(Self)
            .ok_or(CalendarError::OutOfRange)
    }

    pub fn previous_day(self) -> Result<Self, CalendarError> {
        self.add_days(-1)
    }

    /// `Mon, Jun 10`
    pub fn short_label(self) -> String {
        format!(
            "{}, {} {}",
            weekday_short(self.0.weekday()),
            month_short(self.0.month()),
            self.0.day()
        )
    }
}

impl std::fmt::Display for DayBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

fn month_short(month: time::Month) -> &'static str {
    use time::Month::*;
    match month {
        January => "Jan",
        February => "Feb",
        March => "Mar",
        April => "Apr",
        May => "May",
        June => "Jun",
        July => "Jul",
        August => "Aug",
        September => "Sep",
        October => "Oct",
        November => "Nov",
        December => "Dec",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowDay {
    pub bucket: DayBucket,
    pub label: String,
    pub is_today: bool,
}

pub fn rolling_window(today: DayBucket, days: usize) -> Result<Vec<WindowDay>, CalendarError> {
    let mut out = Vec::with_capacity(days);
    for offset in 0..days {
        let bucket = today.add_days(offset as i64)?;
        let label = match offset {
            0 => "Today".to_string(),
            1 => "Tomorrow".to_string(),
            _ => bucket.short_label(),
        };
        out.push(WindowDay {
            bucket,
            label,
            is_today: offset == 0,
        });
    }
    Ok(out)
}

/// Monday of the week containing `day`.
pub fn week_start(day: DayBucket) -> Result<DayBucket, CalendarError> {
    let back = i64::from(day.date().weekday().number_days_from_monday());
    day.add_days(-back)
}

pub fn week_days(day: DayBucket) -> Result<Vec<DayBucket>, CalendarError> {
    let start = week_start(day)?;
    (0..7).map(|offset| start.add_days(offset)).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSlot {
    start_ms: i64,
    end_ms: i64,
}

impl TimeSlot {
    pub fn try_new(start_ms: i64, end_ms: i64) -> Result<Self, CalendarError> {
        if end_ms <= start_ms {
            return Err(CalendarError::EmptySlot);
        }
        Ok(Self { start_ms, end_ms })
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    /// Half-open intervals: back-to-back slots do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    pub fn position(&self) -> SlotPosition {
        SlotPosition {
            top_minutes: self.start_ms.rem_euclid(MS_PER_DAY) / MS_PER_MINUTE,
            height_minutes: (self.end_ms - self.start_ms) / MS_PER_MINUTE,
        }
    }
}

/// Grid geometry of a slot: one minute per unit, midnight at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotPosition {
    pub top_minutes: i64,
    pub height_minutes: i64,
}

/// The one-hour slot behind a click on `hour` in the day grid.
pub fn default_slot(day: DayBucket, hour: u8) -> Result<TimeSlot, CalendarError> {
    if hour > 23 {
        return Err(CalendarError::InvalidHour);
    }
    let start = day.start_ms() + i64::from(hour) * 60 * MS_PER_MINUTE;
    TimeSlot::try_new(start, start + 60 * MS_PER_MINUTE)
}

pub fn parse_clock(value: &str) -> Result<i64, CalendarError> {
    let (hours, minutes) = value
        .trim()
        .split_once(':')
        .ok_or(CalendarError::InvalidClock)?;
    let hours = hours
        .parse::<i64>()
        .map_err(|_| CalendarError::InvalidClock)?;
    let minutes = minutes
        .parse::<i64>()
        .map_err(|_| CalendarError::InvalidClock)?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(CalendarError::InvalidClock);
    }
    Ok(hours * 60 + minutes)
}

pub fn slot_from_clock(day: DayBucket, start: &str, end: &str) -> Result<TimeSlot, CalendarError> {
    let base = day.start_ms();
    TimeSlot::try_new(
        base + parse_clock(start)? * MS_PER_MINUTE,
        base + parse_clock(end)? * MS_PER_MINUTE,
    )
}

/// The one-hour demo slot a visitor picked on the public booking page.
pub fn booking_slot(today: DayBucket, day: DayBucket, time: &str) -> Result<TimeSlot, CalendarError> {
    if day < today {
        return Err(CalendarError::PastDate);
    }
    if day > today.add_days(BOOKING_HORIZON_DAYS)? {
        return Err(CalendarError::BeyondHorizon);
    }
    let start_minutes = parse_clock(time)?;
    if !BOOKING_HOURS.contains(&(start_minutes / 60)) {
        return Err(CalendarError::OutsideBookingHours);
    }
    let start = day.start_ms() + start_minutes * MS_PER_MINUTE;
    TimeSlot::try_new(start, start + 60 * MS_PER_MINUTE)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub id: ItemId,
    pub slot: TimeSlot,
    pub lane: usize,
    pub lanes: usize,
}

/// Side-by-side layout for one day column.
///
/// Events are grouped into clusters of transitively overlapping slots. Inside a cluster each event
/// takes the lowest lane that is free at its start, and every member reports the cluster's lane
/// count so the column can be split evenly.
pub fn layout_day(events: impl IntoIterator<Item = (ItemId, TimeSlot)>) -> Vec<Placement> {
    let mut events = events.into_iter().collect::<Vec<_>>();
    events.sort_by(|(a_id, a), (b_id, b)| {
        a.start_ms
            .cmp(&b.start_ms)
            .then(b.end_ms.cmp(&a.end_ms))
            .then(a_id.cmp(b_id))
    });

    let mut out: Vec<Placement> = Vec::with_capacity(events.len());
    let mut lane_ends: Vec<i64> = Vec::new();
    let mut cluster_start = 0usize;
    let mut cluster_end = i64::MIN;

    for (id, slot) in events {
        if slot.start_ms >= cluster_end && !lane_ends.is_empty() {
            close_cluster(&mut out[cluster_start..], lane_ends.len());
            lane_ends.clear();
            cluster_start = out.len();
        }

        let lane = match lane_ends.iter().position(|end| *end <= slot.start_ms) {
            Some(lane) => {
                lane_ends[lane] = slot.end_ms;
                lane
            }
            None => {
                lane_ends.push(slot.end_ms);
                lane_ends.len() - 1
            }
        };
        cluster_end = cluster_end.max(slot.end_ms);
        out.push(Placement {
            id,
            slot,
            lane,
            lanes: 0,
        });
    }
    let lanes = lane_ends.len();
    close_cluster(&mut out[cluster_start..], lanes);
    out
}

fn close_cluster(members: &mut [Placement], lanes: usize) {
    for placement in members {
        placement.lanes = lanes;
    }
}

#[cfg(test)]
mod tests;
