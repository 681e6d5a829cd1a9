//! Record timestamp capture, text encoding and display.
//!
//! # Invariants
//! - Captured timestamps are truncated to microseconds, the precision of the
//!   stored text form, so a flushed-then-loaded value compares equal.
//! - The stored text form is fixed width and sorts chronologically.

use chrono::{Datelike, Local, NaiveDateTime, SubsecRound, Timelike};

/// Record timestamp type. Local wall-clock time without zone information.
pub type Timestamp = NaiveDateTime;

/// Store encoding, e.g. `2017-09-28T21:05:54.119427`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

// `%.f` also accepts a missing fractional part.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const STORED_SUBSEC_DIGITS: u16 = 6;

/// Current local time at stored precision.
pub fn now() -> Timestamp {
    Local::now()
        .naive_local()
        .trunc_subsecs(STORED_SUBSEC_DIGITS)
}

pub fn format_timestamp(value: &Timestamp) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_PARSE_FORMAT)
}

/// Renders `value` as Python's `repr()` of a `datetime.datetime`.
///
/// A zero microsecond is dropped, and then a zero second.
pub fn py_datetime_repr(value: &Timestamp) -> String {
    let micros = value.nanosecond() / 1_000;
    let mut rendered = format!(
        "datetime.datetime({}, {}, {}, {}, {}",
        value.year(),
        value.month(),
        value.day(),
        value.hour(),
        value.minute()
    );
    if micros != 0 {
        rendered.push_str(&format!(", {}, {}", value.second(), micros));
    } else if value.second() != 0 {
        rendered.push_str(&format!(", {}", value.second()));
    }
    rendered.push(')');
    rendered
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, now, parse_timestamp, py_datetime_repr};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, micro: u32) -> super::Timestamp {
        NaiveDate::from_ymd_opt(2017, 9, 28)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    #[test]
    fn format_is_fixed_width_microseconds() {
        assert_eq!(format_timestamp(&at(21, 5, 54, 119_427)), "2017-09-28T21:05:54.119427");
        assert_eq!(format_timestamp(&at(21, 5, 54, 0)), "2017-09-28T21:05:54.000000");
    }

    #[test]
    fn parse_accepts_missing_fraction() {
        assert_eq!(parse_timestamp("2017-09-28T21:05:54").unwrap(), at(21, 5, 54, 0));
        assert_eq!(
            parse_timestamp("2017-09-28T21:05:54.000042").unwrap(),
            at(21, 5, 54, 42)
        );
        assert!(parse_timestamp("28/09/2017").is_err());
    }

    #[test]
    fn captured_time_survives_text_round_trip() {
        let captured = now();
        assert_eq!(parse_timestamp(&format_timestamp(&captured)).unwrap(), captured);
    }

    #[test]
    fn python_repr_drops_trailing_zero_components() {
        assert_eq!(
            py_datetime_repr(&at(21, 5, 54, 119_427)),
            "datetime.datetime(2017, 9, 28, 21, 5, 54, 119427)"
        );
        assert_eq!(
            py_datetime_repr(&at(21, 5, 54, 0)),
            "datetime.datetime(2017, 9, 28, 21, 5, 54)"
        );
        assert_eq!(
            py_datetime_repr(&at(21, 5, 0, 0)),
            "datetime.datetime(2017, 9, 28, 21, 5)"
        );
        assert_eq!(
            py_datetime_repr(&at(21, 5, 0, 7)),
            "datetime.datetime(2017, 9, 28, 21, 5, 0, 7)"
        );
    }
}
