use chrono::{Datelike, NaiveDate};

use zonecal::calendar::{Calendar, CalendarResult, Event, RecurrenceRule, WeekdaySet};

pub fn add_sample_events(calendar: &mut Calendar, today: NaiveDate) -> CalendarResult<()> {
    let Some(tomorrow) = today.succ_opt() else { return Ok(()) };
    let Some(yesterday) = today.pred_opt() else { return Ok(()) };

    let events = vec![
        ("Morning Standup", today, 9, 0, 9, 30, None),
        ("Team Sync", today, 14, 0, 15, 0, Some("Conference Room A")),
        ("Code Review", tomorrow, 10, 0, 11, 0, None),
        ("Sprint Planning", tomorrow, 15, 0, 16, 30, Some("Zoom")),
        ("1-on-1 with Manager", yesterday, 11, 0, 11, 30, None),
        ("Lunch with Team", yesterday, 12, 30, 13, 30, Some("Downtown Cafe")),
    ];

    for (subject, date, start_h, start_m, end_h, end_m, location) in events {
        let Some(start) = date.and_hms_opt(start_h, start_m, 0) else { continue };
        let Some(end) = date.and_hms_opt(end_h, end_m, 0) else { continue };

        let mut event = Event::new(subject, start, end)?.with_description("Sample event for testing");
        if let Some(location) = location {
            event = event.with_location(location);
        }
        calendar.create_event(event)?;
    }

    if let (Some(start), Some(end)) = (today.and_hms_opt(16, 0, 0), today.and_hms_opt(16, 45, 0)) {
        let weekdays = WeekdaySet::new([today.weekday()])?;
        let review = Event::new("Weekly Review", start, end)?;
        calendar.create_series(review, RecurrenceRule::count(weekdays, 6)?)?;
    }

    Ok(())
}
