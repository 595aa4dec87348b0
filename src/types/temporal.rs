//! Parsing and rendering of the temporal literal formats accepted by the
//! `date`, `time`, `date and time` and `duration` built-ins.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

pub(crate) fn parse_date(text: &str) -> Result<NaiveDate, String> {
    text.trim()
        .parse::<NaiveDate>()
        .map_err(|e| format!("invalid date '{text}': {e}"))
}

pub(crate) fn parse_time(text: &str) -> Result<NaiveTime, String> {
    let trimmed = text.trim();
    trimmed
        .parse::<NaiveTime>()
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|e| format!("invalid time '{text}': {e}"))
}

pub(crate) fn parse_date_time(text: &str) -> Result<NaiveDateTime, String> {
    let trimmed = text.trim();
    if let Ok(dt) = trimmed.parse::<NaiveDateTime>() {
        return Ok(dt);
    }
    // A bare date is midnight on that date.
    parse_date(trimmed)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("invalid date and time '{text}'"))
}

pub(crate) fn format_date_time(dt: &NaiveDateTime) -> String {
    format!("{}T{}", dt.date(), dt.time())
}

/// Parse an ISO-8601 day-time duration such as `P1DT2H30M`, `PT0.5S`, `P2W`
/// or `-P3D`.
pub(crate) fn parse_duration(text: &str) -> Result<TimeDelta, String> {
    let invalid = || format!("invalid duration '{text}'");
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos: i128 = 0;
    let mut in_time = false;
    let mut components = 0;
    let mut number = String::new();

    for ch in rest.chars() {
        match ch {
            '0'..='9' | '.' => number.push(ch),
            'T' if !in_time && number.is_empty() => in_time = true,
            'Y' | 'M' if !in_time => {
                return Err(format!(
                    "year-month durations are not supported: '{text}'"
                ));
            }
            unit => {
                let scale: i128 = match (in_time, unit) {
                    (false, 'W') => 7 * 86_400,
                    (false, 'D') => 86_400,
                    (true, 'H') => 3_600,
                    (true, 'M') => 60,
                    (true, 'S') => 1,
                    _ => return Err(invalid()),
                };
                if number.is_empty() {
                    return Err(invalid());
                }
                nanos = component_nanos(&number, scale, unit == 'S')
                    .and_then(|component| nanos.checked_add(component))
                    .ok_or_else(invalid)?;
                number.clear();
                components += 1;
            }
        }
    }

    if !number.is_empty() || components == 0 {
        return Err(invalid());
    }
    if negative {
        nanos = -nanos;
    }

    let secs = i64::try_from(nanos / i128::from(NANOS_PER_SECOND)).map_err(|_| invalid())?;
    let sub = nanos % i128::from(NANOS_PER_SECOND);
    #[allow(clippy::cast_possible_truncation)]
    let delta = TimeDelta::try_seconds(secs)
        .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(sub as i64)))
        .ok_or_else(invalid)?;
    Ok(delta)
}

/// Nanoseconds for one `<number><unit>` component. Only seconds may be
/// fractional.
fn component_nanos(number: &str, scale: i128, fractional_allowed: bool) -> Option<i128> {
    match number.split_once('.') {
        None => number
            .parse::<i128>()
            .ok()
            .and_then(|n| n.checked_mul(scale * i128::from(NANOS_PER_SECOND))),
        Some((whole, frac)) if fractional_allowed && !frac.is_empty() && !whole.is_empty() => {
            let whole = whole.parse::<i128>().ok()?;
            let mut digits: String = frac.chars().take(9).collect();
            while digits.len() < 9 {
                digits.push('0');
            }
            let frac = digits.parse::<i128>().ok()?;
            whole
                .checked_mul(i128::from(NANOS_PER_SECOND))
                .and_then(|w| w.checked_add(frac))
        }
        Some(_) => None,
    }
}

/// Render a duration in the ISO-8601 form accepted by [`parse_duration`].
pub(crate) fn format_duration(delta: &TimeDelta) -> String {
    let negative = *delta < TimeDelta::zero();
    let abs = delta.abs();
    let days = abs.num_days();
    let hours = abs.num_hours() % 24;
    let minutes = abs.num_minutes() % 60;
    let seconds = abs.num_seconds() % 60;
    let nanos = abs.subsec_nanos();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('P');
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if nanos > 0 {
            let frac = format!("{nanos:09}");
            out.push_str(&format!("{seconds}.{}S", frac.trim_end_matches('0')));
        } else if seconds > 0 || (days == 0 && hours == 0 && minutes == 0) {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_day_time_duration() {
        let d = parse_duration("P1DT2H30M").unwrap();
        assert_eq!(d.num_minutes(), 24 * 60 + 150);
    }

    #[test]
    fn parse_weeks_and_fractional_seconds() {
        assert_eq!(parse_duration("P2W").unwrap().num_days(), 14);
        assert_eq!(parse_duration("PT1.5S").unwrap().num_milliseconds(), 1500);
    }

    #[test]
    fn parse_negative_duration() {
        assert_eq!(parse_duration("-P3D").unwrap().num_days(), -3);
    }

    #[test]
    fn reject_year_month_duration() {
        let err = parse_duration("P1Y2M").unwrap_err();
        assert!(err.contains("year-month"));
    }

    #[test]
    fn reject_malformed_duration() {
        for text in ["", "P", "PT", "1D", "P1H", "PT1D", "P1.5D", "PTS"] {
            assert!(parse_duration(text).is_err(), "accepted {text:?}");
        }
    }

    #[test]
    fn reject_duration_overflowing_the_component_sum() {
        let text = "P1969226660422097589487121DT47261439850130342147690917H";
        assert_eq!(parse_duration(text).unwrap_err(), format!("invalid duration '{text}'"));
    }

    #[test]
    fn format_round_trips() {
        for text in ["P1DT2H30M", "PT0S", "P3D", "-PT45M", "PT1.25S", "P1DT1S"] {
            let d = parse_duration(text).unwrap();
            assert_eq!(format_duration(&d), text);
            assert_eq!(parse_duration(&format_duration(&d)).unwrap(), d);
        }
    }

    #[test]
    fn parse_temporal_literals() {
        assert_eq!(parse_date("2024-02-29").unwrap().to_string(), "2024-02-29");
        assert!(parse_date("2023-02-29").is_err());
        assert_eq!(parse_time("10:30").unwrap().to_string(), "10:30:00");
        assert_eq!(
            format_date_time(&parse_date_time("2024-01-05T10:30:00").unwrap()),
            "2024-01-05T10:30:00"
        );
    }
}
