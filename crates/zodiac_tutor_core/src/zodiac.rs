//! crates/zodiac_tutor_core/src/zodiac.rs
//!
//! Maps a birth date onto the western zodiac. Resolution is total: every
//! valid calendar date lands on exactly one sign, and unparseable input
//! resolves to the `Unknown` sentinel instead of an error, so prompt
//! construction downstream never sees a missing sign.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the twelve zodiac categories, plus a sentinel for dates that
/// could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
    Unknown,
}

impl ZodiacSign {
    /// Resolves the sign for a calendar date. Boundary days are inclusive
    /// on both ends of each range.
    pub fn from_date(date: NaiveDate) -> Self {
        let m = date.month();
        let d = date.day();
        match (m, d) {
            (3, 21..) | (4, ..=19) => ZodiacSign::Aries,
            (4, 20..) | (5, ..=20) => ZodiacSign::Taurus,
            (5, 21..) | (6, ..=21) => ZodiacSign::Gemini,
            (6, 22..) | (7, ..=22) => ZodiacSign::Cancer,
            (7, 23..) | (8, ..=22) => ZodiacSign::Leo,
            (8, 23..) | (9, ..=22) => ZodiacSign::Virgo,
            (9, 23..) | (10, ..=23) => ZodiacSign::Libra,
            (10, 24..) | (11, ..=22) => ZodiacSign::Scorpio,
            (11, 23..) | (12, ..=21) => ZodiacSign::Sagittarius,
            (12, 22..) | (1, ..=19) => ZodiacSign::Capricorn,
            (1, 20..) | (2, ..=18) => ZodiacSign::Aquarius,
            _ => ZodiacSign::Pisces,
        }
    }

    /// Resolves the sign from the wire form of a birth date. The browser
    /// client sends a full RFC 3339 timestamp (`Date.toISOString()`), but a
    /// bare `YYYY-MM-DD` is accepted too. Month and day are taken in UTC to
    /// avoid timezone skew at range boundaries. Garbage input yields
    /// `Unknown` rather than an error.
    pub fn from_iso(iso: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
            return Self::from_date(dt.with_timezone(&Utc).date_naive());
        }
        match NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
            Ok(date) => Self::from_date(date),
            Err(_) => ZodiacSign::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
            ZodiacSign::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(y: i32, m: u32, d: u32) -> ZodiacSign {
        ZodiacSign::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn boundary_days_resolve_to_the_correct_side() {
        assert_eq!(sign(2000, 3, 20), ZodiacSign::Pisces);
        assert_eq!(sign(2000, 3, 21), ZodiacSign::Aries);
        assert_eq!(sign(2000, 4, 19), ZodiacSign::Aries);
        assert_eq!(sign(2000, 4, 20), ZodiacSign::Taurus);
        assert_eq!(sign(2000, 6, 21), ZodiacSign::Gemini);
        assert_eq!(sign(2000, 6, 22), ZodiacSign::Cancer);
        assert_eq!(sign(2000, 10, 23), ZodiacSign::Libra);
        assert_eq!(sign(2000, 10, 24), ZodiacSign::Scorpio);
        assert_eq!(sign(2000, 12, 21), ZodiacSign::Sagittarius);
        assert_eq!(sign(2000, 12, 22), ZodiacSign::Capricorn);
        assert_eq!(sign(2000, 1, 19), ZodiacSign::Capricorn);
        assert_eq!(sign(2000, 1, 20), ZodiacSign::Aquarius);
        assert_eq!(sign(2000, 2, 18), ZodiacSign::Aquarius);
        assert_eq!(sign(2000, 2, 19), ZodiacSign::Pisces);
    }

    #[test]
    fn every_day_of_a_leap_year_maps_to_a_real_sign() {
        let mut day = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        while day < end {
            assert_ne!(ZodiacSign::from_date(day), ZodiacSign::Unknown, "{day}");
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn iso_datetime_and_bare_date_both_parse() {
        assert_eq!(ZodiacSign::from_iso("1990-01-23"), ZodiacSign::Aquarius);
        assert_eq!(
            ZodiacSign::from_iso("1990-01-23T00:00:00.000Z"),
            ZodiacSign::Aquarius
        );
    }

    #[test]
    fn unparseable_input_yields_unknown_without_panicking() {
        assert_eq!(ZodiacSign::from_iso(""), ZodiacSign::Unknown);
        assert_eq!(ZodiacSign::from_iso("not a date"), ZodiacSign::Unknown);
        assert_eq!(ZodiacSign::from_iso("1990-13-45"), ZodiacSign::Unknown);
    }
}
