use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use super::{integer_arg, string_arg, Arity, FunctionRegistry};
use crate::types::temporal;
use crate::Value;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(&["date"], Arity::Between(1, 3), |args, _| match args {
        [Value::Date(d)] => Ok(Value::Date(*d)),
        [Value::DateTime(dt)] => Ok(Value::Date(dt.date())),
        [_] => temporal::parse_date(string_arg(args, 0)?).map(Value::Date),
        [_, _, _] => {
            let (year, month, day) = (
                integer_arg(args, 0)?,
                integer_arg(args, 1)?,
                integer_arg(args, 2)?,
            );
            i32::try_from(year)
                .ok()
                .zip(u32::try_from(month).ok())
                .zip(u32::try_from(day).ok())
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
                .map(Value::Date)
                .ok_or_else(|| format!("invalid date {year}-{month}-{day}"))
        }
        _ => Err("expected a string, a date and time, or year, month and day".to_owned()),
    });

    registry.register(&["time"], Arity::Between(1, 3), |args, _| match args {
        [Value::Time(t)] => Ok(Value::Time(*t)),
        [Value::DateTime(dt)] => Ok(Value::Time(dt.time())),
        [_] => temporal::parse_time(string_arg(args, 0)?).map(Value::Time),
        [_, _, _] => {
            let (hour, minute, second) = (
                integer_arg(args, 0)?,
                integer_arg(args, 1)?,
                integer_arg(args, 2)?,
            );
            u32::try_from(hour)
                .ok()
                .zip(u32::try_from(minute).ok())
                .zip(u32::try_from(second).ok())
                .and_then(|((h, m), s)| NaiveTime::from_hms_opt(h, m, s))
                .map(Value::Time)
                .ok_or_else(|| format!("invalid time {hour}:{minute}:{second}"))
        }
        _ => Err("expected a string, a date and time, or hour, minute and second".to_owned()),
    });

    registry.register(&["date and time"], Arity::Between(1, 2), |args, _| match args {
        [Value::DateTime(dt)] => Ok(Value::DateTime(*dt)),
        [_] => temporal::parse_date_time(string_arg(args, 0)?).map(Value::DateTime),
        [Value::Date(d), Value::Time(t)] => Ok(Value::DateTime(NaiveDateTime::new(*d, *t))),
        [Value::DateTime(dt), Value::Time(t)] => {
            Ok(Value::DateTime(NaiveDateTime::new(dt.date(), *t)))
        }
        [first, second] => Err(format!(
            "expected a date and a time, found {} and {}",
            first.kind(),
            second.kind()
        )),
        _ => Err("expected one or two arguments".to_owned()),
    });

    registry.register(&["duration"], Arity::Exact(1), |args, _| match &args[0] {
        Value::Duration(d) => Ok(Value::Duration(*d)),
        _ => temporal::parse_duration(string_arg(args, 0)?).map(Value::Duration),
    });

    registry.register(&["day of week"], Arity::Exact(1), |args, _| {
        let date = date_arg(&args[0])?;
        Ok(Value::from(weekday_name(date.weekday())))
    });

    registry.register(&["month of year"], Arity::Exact(1), |args, _| {
        let date = date_arg(&args[0])?;
        Ok(Value::from(month_name(date.month())))
    });
}

fn date_arg(value: &Value) -> Result<NaiveDate, String> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::DateTime(dt) => Ok(dt.date()),
        other => Err(format!(
            "argument 1 must be a date, found {}",
            other.kind()
        )),
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .copied()
        .unwrap_or("")
}
