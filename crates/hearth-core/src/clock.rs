//! Wall-clock time: POSIX time-zone rules, civil calendar conversion and a
//! clock anchored to an SNTP sample.
//!
//! The device only learns the time from the network, so every consumer must
//! cope with the clock being unavailable ([`WallClock::local_time`] returns
//! `None` until the first successful sync).

use crate::error::AppError;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i32 = 3_600;

/// Default transition time for POSIX rules without an explicit `/time`
const DEFAULT_TRANSITION_SECS: i32 = 2 * SECS_PER_HOUR;

/// Source of local calendar time.
pub trait WallClock {
    /// Current local time, or `None` while the time source is not ready.
    fn local_time(&mut self) -> Option<LocalTime>;
}

/// Broken-down local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub year: i32,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 0 = Sunday
    pub weekday: u8,
    pub is_dst: bool,
}

impl LocalTime {
    /// Hour on a 12-hour dial (1-12)
    pub const fn hour12(&self) -> u8 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    pub const fn is_pm(&self) -> bool {
        self.hour >= 12
    }

    pub const fn meridiem(&self) -> &'static str {
        if self.is_pm() { "PM" } else { "AM" }
    }

    #[cfg(test)]
    pub(crate) const fn sample() -> Self {
        Self {
            year: 2025,
            month: 8,
            day: 19,
            hour: 14,
            minute: 5,
            second: 0,
            weekday: 2,
            is_dst: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Civil calendar
// ---------------------------------------------------------------------------

/// Days since 1970-01-01 for a proleptic Gregorian date.
pub fn days_from_civil(year: i32, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year as i64 - 1 } else { year as i64 };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
pub fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year as i32, month, day)
}

/// 0 = Sunday
pub fn weekday_from_days(days: i64) -> u8 {
    // 1970-01-01 was a Thursday
    (days + 4).rem_euclid(7) as u8
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Break a unix timestamp down after applying a UTC offset in seconds.
pub fn civil_from_unix(unix_secs: i64, offset_secs: i32) -> LocalTime {
    let local = unix_secs + offset_secs as i64;
    let days = local.div_euclid(SECS_PER_DAY);
    let secs_of_day = local.rem_euclid(SECS_PER_DAY);
    let (year, month, day) = civil_from_days(days);

    LocalTime {
        year,
        month,
        day,
        hour: (secs_of_day / 3_600) as u8,
        minute: (secs_of_day % 3_600 / 60) as u8,
        second: (secs_of_day % 60) as u8,
        weekday: weekday_from_days(days),
        is_dst: false,
    }
}

// ---------------------------------------------------------------------------
// POSIX TZ rules
// ---------------------------------------------------------------------------

/// `Mm.w.d[/time]` transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub month: u8,
    /// 1-5, where 5 means "last"
    pub week: u8,
    /// 0 = Sunday
    pub weekday: u8,
    /// Seconds after local midnight
    pub time_secs: i32,
}

impl TransitionRule {
    /// Day of month this rule selects in `year`.
    pub fn day_in(&self, year: i32) -> u8 {
        let first = weekday_from_days(days_from_civil(year, self.month, 1));
        let mut day = 1 + (7 + self.weekday as i32 - first as i32) % 7 + 7 * (self.week as i32 - 1);
        let dim = days_in_month(year, self.month) as i32;
        while day > dim {
            day -= 7;
        }
        day as u8
    }

    /// UTC instant of the transition in `year`, given the UTC offset in
    /// force just before it.
    fn utc_instant(&self, year: i32, offset_before: i32) -> i64 {
        let day = self.day_in(year);
        days_from_civil(year, self.month, day) * SECS_PER_DAY + self.time_secs as i64
            - offset_before as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstRule {
    /// Seconds east of UTC while daylight time is in force
    pub offset_secs: i32,
    pub start: TransitionRule,
    pub end: TransitionRule,
}

/// Time zone parsed from a POSIX `TZ` string.
///
/// Supported form: `STDoffset[DST[offset][,Mm.w.d[/time],Mm.w.d[/time]]]`
/// with alphabetic or `<...>` quoted names. Julian-day rules are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZone {
    /// Seconds east of UTC for standard time
    pub std_offset_secs: i32,
    pub dst: Option<DstRule>,
}

impl TimeZone {
    pub const UTC: TimeZone = TimeZone {
        std_offset_secs: 0,
        dst: None,
    };

    pub fn parse(rule: &str) -> Result<Self, AppError> {
        TzParser::new(rule).parse()
    }

    /// Offset from UTC in force at `unix_secs`, and whether it is daylight time.
    pub fn offset_at(&self, unix_secs: i64) -> (i32, bool) {
        let Some(dst) = self.dst else {
            return (self.std_offset_secs, false);
        };

        let (year, _, _) =
            civil_from_days((unix_secs + self.std_offset_secs as i64).div_euclid(SECS_PER_DAY));
        let start = dst.start.utc_instant(year, self.std_offset_secs);
        let end = dst.end.utc_instant(year, dst.offset_secs);

        let in_dst = if start < end {
            (start..end).contains(&unix_secs)
        } else {
            // Southern hemisphere: daylight time spans the new year
            unix_secs >= start || unix_secs < end
        };

        if in_dst {
            (dst.offset_secs, true)
        } else {
            (self.std_offset_secs, false)
        }
    }

    pub fn to_local(&self, unix_secs: i64) -> LocalTime {
        let (offset, is_dst) = self.offset_at(unix_secs);
        LocalTime {
            is_dst,
            ..civil_from_unix(unix_secs, offset)
        }
    }
}

struct TzParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TzParser<'a> {
    fn new(rule: &'a str) -> Self {
        Self {
            bytes: rule.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), AppError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(AppError::InvalidTimeZone)
        }
    }

    fn parse(mut self) -> Result<TimeZone, AppError> {
        self.name()?;
        let std_offset_secs = -self.offset()?;

        if self.peek().is_none() {
            return Ok(TimeZone {
                std_offset_secs,
                dst: None,
            });
        }

        self.name()?;
        let dst_offset_secs = match self.peek() {
            Some(b',') | None => std_offset_secs + SECS_PER_HOUR,
            Some(_) => -self.offset()?,
        };

        let (start, end) = if self.eat(b',') {
            let start = self.rule()?;
            self.expect(b',')?;
            let end = self.rule()?;
            (start, end)
        } else {
            // Same fallback glibc uses when a DST name has no rules
            (
                TransitionRule {
                    month: 3,
                    week: 2,
                    weekday: 0,
                    time_secs: DEFAULT_TRANSITION_SECS,
                },
                TransitionRule {
                    month: 11,
                    week: 1,
                    weekday: 0,
                    time_secs: DEFAULT_TRANSITION_SECS,
                },
            )
        };

        if self.peek().is_some() {
            return Err(AppError::InvalidTimeZone);
        }

        Ok(TimeZone {
            std_offset_secs,
            dst: Some(DstRule {
                offset_secs: dst_offset_secs,
                start,
                end,
            }),
        })
    }

    fn name(&mut self) -> Result<(), AppError> {
        let start = self.pos;
        if self.eat(b'<') {
            while let Some(b) = self.peek() {
                self.pos += 1;
                if b == b'>' {
                    return if self.pos - start >= 5 {
                        Ok(())
                    } else {
                        Err(AppError::InvalidTimeZone)
                    };
                }
            }
            return Err(AppError::InvalidTimeZone);
        }

        while self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos - start >= 3 {
            Ok(())
        } else {
            Err(AppError::InvalidTimeZone)
        }
    }

    fn number(&mut self, max_digits: usize) -> Result<i32, AppError> {
        let start = self.pos;
        let mut value: i32 = 0;
        while let Some(b) = self.peek().filter(u8::is_ascii_digit) {
            if self.pos - start == max_digits {
                return Err(AppError::InvalidTimeZone);
            }
            value = value * 10 + (b - b'0') as i32;
            self.pos += 1;
        }
        if self.pos == start {
            Err(AppError::InvalidTimeZone)
        } else {
            Ok(value)
        }
    }

    /// `[+-]hh[:mm[:ss]]` in seconds, POSIX sign (positive = west of UTC)
    fn offset(&mut self) -> Result<i32, AppError> {
        let sign = if self.eat(b'-') {
            -1
        } else {
            self.eat(b'+');
            1
        };
        Ok(sign * self.clock_time()?)
    }

    fn clock_time(&mut self) -> Result<i32, AppError> {
        let hours = self.number(3)?;
        let mut secs = hours * SECS_PER_HOUR;
        if self.eat(b':') {
            secs += self.number(2)? * 60;
            if self.eat(b':') {
                secs += self.number(2)?;
            }
        }
        Ok(secs)
    }

    fn rule(&mut self) -> Result<TransitionRule, AppError> {
        self.expect(b'M')?;
        let month = self.number(2)?;
        self.expect(b'.')?;
        let week = self.number(1)?;
        self.expect(b'.')?;
        let weekday = self.number(1)?;

        if !(1..=12).contains(&month) || !(1..=5).contains(&week) || weekday > 6 {
            return Err(AppError::InvalidTimeZone);
        }

        let time_secs = if self.eat(b'/') {
            let sign = if self.eat(b'-') { -1 } else { 1 };
            sign * self.clock_time()?
        } else {
            DEFAULT_TRANSITION_SECS
        };

        Ok(TransitionRule {
            month: month as u8,
            week: week as u8,
            weekday: weekday as u8,
            time_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Synced clock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Anchor {
    unix_secs: u64,
    mono_ms: u64,
}

/// Wall clock derived from one SNTP sample plus the monotonic counter.
#[derive(Debug, Clone, Copy)]
pub struct SyncedClock {
    zone: TimeZone,
    anchor: Option<Anchor>,
}

impl SyncedClock {
    pub const fn new(zone: TimeZone) -> Self {
        Self { zone, anchor: None }
    }

    pub fn zone(&self) -> &TimeZone {
        &self.zone
    }

    pub fn is_synced(&self) -> bool {
        self.anchor.is_some()
    }

    /// Record that `unix_secs` was current when the monotonic counter read `mono_ms`.
    pub fn sync(&mut self, unix_secs: u64, mono_ms: u64) {
        self.anchor = Some(Anchor { unix_secs, mono_ms });
    }

    pub fn unix_at(&self, mono_ms: u64) -> Option<u64> {
        self.anchor
            .map(|a| a.unix_secs + mono_ms.saturating_sub(a.mono_ms) / 1_000)
    }

    pub fn local_at(&self, mono_ms: u64) -> Option<LocalTime> {
        self.unix_at(mono_ms)
            .map(|unix| self.zone.to_local(unix as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eastern() -> TimeZone {
        TimeZone::parse("EST5EDT,M3.2.0,M11.1.0").unwrap()
    }

    #[test]
    fn test_civil_round_trip_known_dates() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(days_from_civil(2000, 3, 1), 11_017);
        assert_eq!(civil_from_days(11_017), (2000, 3, 1));
        assert_eq!(civil_from_days(days_from_civil(2024, 2, 29)), (2024, 2, 29));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
    }

    #[test]
    fn test_weekday() {
        assert_eq!(weekday_from_days(0), 4);
        // 2025-08-19 was a Tuesday
        assert_eq!(weekday_from_days(days_from_civil(2025, 8, 19)), 2);
    }

    #[test]
    fn test_parse_eastern() {
        let tz = eastern();
        assert_eq!(tz.std_offset_secs, -5 * 3600);
        let dst = tz.dst.unwrap();
        assert_eq!(dst.offset_secs, -4 * 3600);
        assert_eq!(
            dst.start,
            TransitionRule {
                month: 3,
                week: 2,
                weekday: 0,
                time_secs: 7200
            }
        );
        assert_eq!(dst.end.month, 11);
        assert_eq!(dst.end.week, 1);
    }

    #[test]
    fn test_parse_plain_and_quoted_zones() {
        assert_eq!(TimeZone::parse("UTC0").unwrap(), TimeZone::UTC);

        let ist = TimeZone::parse("IST-5:30").unwrap();
        assert_eq!(ist.std_offset_secs, 5 * 3600 + 30 * 60);
        assert!(ist.dst.is_none());

        let quoted = TimeZone::parse("<+03>-3").unwrap();
        assert_eq!(quoted.std_offset_secs, 3 * 3600);
    }

    #[test]
    fn test_parse_explicit_times_and_defaults() {
        let tz = TimeZone::parse("CET-1CEST,M3.5.0,M10.5.0/3").unwrap();
        let dst = tz.dst.unwrap();
        assert_eq!(dst.offset_secs, 2 * 3600);
        assert_eq!(dst.start.time_secs, 7200);
        assert_eq!(dst.end.time_secs, 3 * 3600);

        let no_rules = TimeZone::parse("EST5EDT").unwrap();
        assert_eq!(no_rules.dst.unwrap().start.month, 3);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(TimeZone::parse(""), Err(AppError::InvalidTimeZone));
        assert_eq!(TimeZone::parse("E5"), Err(AppError::InvalidTimeZone));
        assert_eq!(TimeZone::parse("EST"), Err(AppError::InvalidTimeZone));
        assert_eq!(
            TimeZone::parse("EST5EDT,J60,J300"),
            Err(AppError::InvalidTimeZone)
        );
        assert_eq!(
            TimeZone::parse("EST5EDT,M13.2.0,M11.1.0"),
            Err(AppError::InvalidTimeZone)
        );
        assert_eq!(
            TimeZone::parse("EST5EDT,M3.2.0,M11.1.0junk"),
            Err(AppError::InvalidTimeZone)
        );
    }

    #[test]
    fn test_rule_day_selection() {
        let second_sunday_march = TransitionRule {
            month: 3,
            week: 2,
            weekday: 0,
            time_secs: 7200,
        };
        assert_eq!(second_sunday_march.day_in(2025), 9);
        assert_eq!(second_sunday_march.day_in(2024), 10);

        let last_sunday_october = TransitionRule {
            month: 10,
            week: 5,
            weekday: 0,
            time_secs: 3600,
        };
        assert_eq!(last_sunday_october.day_in(2025), 26);
    }

    #[test]
    fn test_eastern_dst_transitions_2025() {
        let tz = eastern();
        // 2025-03-09 06:59:59 UTC = 01:59:59 EST
        let before = days_from_civil(2025, 3, 9) * 86_400 + 6 * 3600 + 59 * 60 + 59;
        let local = tz.to_local(before);
        assert!(!local.is_dst);
        assert_eq!((local.hour, local.minute), (1, 59));

        // One second later the clocks jump to 03:00 EDT
        let local = tz.to_local(before + 1);
        assert!(local.is_dst);
        assert_eq!((local.hour, local.minute), (3, 0));

        // 2025-11-02 05:59:59 UTC = 01:59:59 EDT, then back to 01:00 EST
        let end = days_from_civil(2025, 11, 2) * 86_400 + 6 * 3600;
        assert!(tz.to_local(end - 1).is_dst);
        let local = tz.to_local(end);
        assert!(!local.is_dst);
        assert_eq!((local.hour, local.minute), (1, 0));
    }

    #[test]
    fn test_southern_hemisphere_rule() {
        let tz = TimeZone::parse("AEST-10AEDT,M10.1.0,M4.1.0/3").unwrap();
        let january = days_from_civil(2025, 1, 15) * 86_400;
        let june = days_from_civil(2025, 6, 15) * 86_400;
        assert_eq!(tz.offset_at(january), (11 * 3600, true));
        assert_eq!(tz.offset_at(june), (10 * 3600, false));
    }

    #[test]
    fn test_twelve_hour_helpers() {
        let mut t = LocalTime::sample();
        assert_eq!((t.hour12(), t.meridiem()), (2, "PM"));
        t.hour = 0;
        assert_eq!((t.hour12(), t.meridiem()), (12, "AM"));
        t.hour = 12;
        assert_eq!((t.hour12(), t.meridiem()), (12, "PM"));
    }

    #[test]
    fn test_synced_clock_advances_with_monotonic_counter() {
        let mut clock = SyncedClock::new(TimeZone::UTC);
        assert!(clock.local_at(1_000).is_none());

        // 2025-08-19 18:05:00 UTC
        let unix = (days_from_civil(2025, 8, 19) * 86_400 + 18 * 3600 + 5 * 60) as u64;
        clock.sync(unix, 10_000);
        assert!(clock.is_synced());

        let t = clock.local_at(10_000 + 90_500).unwrap();
        assert_eq!((t.hour, t.minute, t.second), (18, 6, 30));

        // Readings taken before the anchor never run the clock backwards
        assert_eq!(clock.unix_at(0), Some(unix));
    }
}
