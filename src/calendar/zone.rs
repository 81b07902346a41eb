use chrono::{NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;

use super::error::{CalendarError, CalendarResult};

pub fn resolve_zone(id: &str) -> CalendarResult<Tz> {
    id.trim()
        .parse::<Tz>()
        .map_err(|_| CalendarError::InvalidFormat(format!("unknown timezone '{}'", id)))
}

/// Re-expresses a wall-clock time of `from` as the wall-clock time in `to` at the same instant.
///
/// Ambiguous local times resolve to the earlier instant; times inside a DST gap are
/// pushed forward by an hour before conversion.
pub fn convert_wall_clock(local: NaiveDateTime, from: Tz, to: Tz) -> NaiveDateTime {
    if from == to {
        return local;
    }

    let instant = from
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| from.from_local_datetime(&(local + TimeDelta::hours(1))).earliest())
        .unwrap_or_else(|| from.from_utc_datetime(&local));

    instant.with_timezone(&to).naive_local()
}
