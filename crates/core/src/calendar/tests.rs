use super::*;

fn day(value: &str) -> DayBucket {
    DayBucket::parse(value).expect("day")
}

fn id(value: &str) -> ItemId {
    ItemId::try_new(value).expect("item id")
}

fn clock(d: DayBucket, start: &str, end: &str) -> TimeSlot {
    slot_from_clock(d, start, end).expect("slot")
}

#[test]
fn day_bucket_round_trips_iso_text() {
    let d = day("2024-06-10");
    assert_eq!(d.to_string(), "2024-06-10");
    assert_eq!(d.short_label(), "Mon, Jun 10");
    assert_eq!(DayBucket::parse("2024-6-1"), Err(CalendarError::InvalidDate));
    assert_eq!(DayBucket::parse("tomorrow"), Err(CalendarError::InvalidDate));
    assert_eq!(d.previous_day().expect("prev").to_string(), "2024-06-09");
    assert_eq!(DayBucket::of_ms(d.start_ms() + 5 * MS_PER_MINUTE), Ok(d));
}

#[test]
fn rolling_window_labels_first_two_days() {
    let window = rolling_window(day("2024-06-29"), DEFAULT_WINDOW_DAYS).expect("window");
    assert_eq!(window.len(), 7);
    assert_eq!(window[0].label, "Today");
    assert!(window[0].is_today);
    assert_eq!(window[1].label, "Tomorrow");
    assert_eq!(window[2].bucket.to_string(), "2024-07-01");
    assert_eq!(window[2].label, "Mon, Jul 1");
    assert!(window.iter().skip(1).all(|d| !d.is_today));
}

#[test]
fn weeks_start_on_monday() {
    assert_eq!(week_start(day("2024-06-16")).expect("sunday"), day("2024-06-10"));
    assert_eq!(week_start(day("2024-06-10")).expect("monday"), day("2024-06-10"));
    let days = week_days(day("2024-06-13")).expect("week");
    assert_eq!(days.first(), Some(&day("2024-06-10")));
    assert_eq!(days.last(), Some(&day("2024-06-16")));
}

#[test]
fn slots_validate_and_position() {
    let d = day("2024-06-10");
    let slot = clock(d, "09:30", "11:00");
    assert_eq!(
        slot.position(),
        SlotPosition {
            top_minutes: 570,
            height_minutes: 90
        }
    );
    assert_eq!(
        slot_from_clock(d, "10:00", "10:00"),
        Err(CalendarError::EmptySlot)
    );
    assert_eq!(
        slot_from_clock(d, "25:00", "26:00"),
        Err(CalendarError::InvalidClock)
    );

    let clicked = default_slot(d, 14).expect("slot");
    assert_eq!(clicked.position().top_minutes, 14 * 60);
    assert_eq!(clicked.position().height_minutes, 60);
    assert_eq!(default_slot(d, 24), Err(CalendarError::InvalidHour));
}

#[test]
fn back_to_back_slots_do_not_overlap() {
    let d = day("2024-06-10");
    let a = clock(d, "09:00", "10:00");
    let b = clock(d, "10:00", "11:00");
    let c = clock(d, "09:30", "10:30");
    assert!(!a.overlaps(&b));
    assert!(a.overlaps(&c));
    assert!(c.overlaps(&b));
}

#[test]
fn layout_assigns_lanes_per_overlap_cluster() {
    let d = day("2024-06-10");
    let placements = layout_day(vec![
        (id("late"), clock(d, "15:00", "16:00")),
        (id("b"), clock(d, "09:30", "10:30")),
        (id("a"), clock(d, "09:00", "10:00")),
        (id("c"), clock(d, "10:00", "11:00")),
    ]);

    let summary = placements
        .iter()
        .map(|p| (p.id.as_str(), p.lane, p.lanes))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![("a", 0, 2), ("b", 1, 2), ("c", 0, 2), ("late", 0, 1)]
    );
}

#[test]
fn layout_of_nothing_is_empty() {
    assert!(layout_day(Vec::new()).is_empty());
}

#[test]
fn booking_slots_stay_inside_office_hours_and_horizon() {
    let today = day("2024-06-10");
    let slot = booking_slot(today, day("2024-06-12"), "14:00").expect("slot");
    assert_eq!(slot.position().top_minutes, 14 * 60);
    assert_eq!(slot.position().height_minutes, 60);
    assert!(booking_slot(today, today, "09:00").is_ok());
    assert!(booking_slot(today, today, "16:30").is_ok());

    assert_eq!(
        booking_slot(today, day("2024-06-09"), "10:00"),
        Err(CalendarError::PastDate)
    );
    assert!(booking_slot(today, day("2024-08-09"), "10:00").is_ok());
    assert_eq!(
        booking_slot(today, day("2024-08-10"), "10:00"),
        Err(CalendarError::BeyondHorizon)
    );
    assert_eq!(
        booking_slot(today, today, "08:59"),
        Err(CalendarError::OutsideBookingHours)
    );
    assert_eq!(
        booking_slot(today, today, "17:00"),
        Err(CalendarError::OutsideBookingHours)
    );
    assert_eq!(booking_slot(today, today, "noon"), Err(CalendarError::InvalidClock));
}
