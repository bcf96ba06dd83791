//! 32-bit packed calendar time.
//!
//! ```text
//!  31  30 29  28    24  23  20  19   14  13 11  10   6  5     0
//! [ - ][flags][ year ][month ][ day  ][wday ][hours ][minutes ]
//! ```
//!
//! Each field stores `value - min`; a field whose raw bits are all ones is
//! unset. The whole word `-1` is [`PackedTime::INFINITY`] and `0` is
//! [`PackedTime::ZERO`].

use crate::error::{BridgeError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// One bit-field of a packed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Minutes,
    Hours,
    Weekday,
    Day,
    Month,
    Year,
    Flags,
}

#[derive(Debug, Clone, Copy)]
struct BitField {
    name: &'static str,
    mask: i32,
    shift: u32,
    min: i32,
    max: i32,
}

const MINUTES: BitField = BitField { name: "minutes", mask: 0x3F, shift: 0, min: 0, max: 59 };
const HOURS: BitField = BitField { name: "hours", mask: 0x1F, shift: 6, min: 0, max: 23 };
const WEEKDAY: BitField = BitField { name: "weekday", mask: 0x7, shift: 11, min: 0, max: 6 };
const DAY: BitField = BitField { name: "day", mask: 0x3F, shift: 14, min: 1, max: 31 };
const MONTH: BitField = BitField { name: "month", mask: 0xF, shift: 20, min: 1, max: 12 };
const YEAR: BitField = BitField { name: "year", mask: 0x1F, shift: 24, min: 2000, max: 2030 };
const FLAGS: BitField = BitField { name: "flags", mask: 0x3, shift: 29, min: 0, max: 2 };

const ALL_FIELDS: [BitField; 7] = [MINUTES, HOURS, WEEKDAY, DAY, MONTH, YEAR, FLAGS];

impl Field {
    fn bits(self) -> BitField {
        match self {
            Field::Minutes => MINUTES,
            Field::Hours => HOURS,
            Field::Weekday => WEEKDAY,
            Field::Day => DAY,
            Field::Month => MONTH,
            Field::Year => YEAR,
            Field::Flags => FLAGS,
        }
    }

    pub fn name(self) -> &'static str {
        self.bits().name
    }

    /// Inclusive valid range of the field.
    pub fn bounds(self) -> (i32, i32) {
        let bits = self.bits();
        (bits.min, bits.max)
    }
}

impl BitField {
    #[inline]
    fn get(&self, data: i32) -> Option<i32> {
        let raw = (data >> self.shift) & self.mask;
        if raw == self.mask {
            None
        } else {
            Some(raw + self.min)
        }
    }

    #[inline]
    fn set(&self, data: i32, value: Option<i32>) -> Result<i32> {
        let raw = match value {
            None => self.mask,
            Some(value) if (self.min..=self.max).contains(&value) => value - self.min,
            Some(value) => return Err(BridgeError::range(self.name, value)),
        };
        Ok((data & !(self.mask << self.shift)) | ((raw & self.mask) << self.shift))
    }
}

/// Unpacked field values; `None` marks an unset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedFields {
    pub year: Option<u16>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub weekday: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub flags: Option<u8>,
}

/// How a reconstructed civil time should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeKind {
    #[default]
    Unspecified,
    Utc,
    Local,
}

/// Calendar date-time tagged with its interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilDateTime {
    pub value: NaiveDateTime,
    pub kind: TimeKind,
}

impl CivilDateTime {
    pub fn is_min(&self) -> bool {
        self.value == NaiveDateTime::MIN
    }

    pub fn is_max(&self) -> bool {
        self.value == NaiveDateTime::MAX
    }
}

/// Validated 32-bit packed calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedTime(i32);

impl Default for PackedTime {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PackedTime {
    /// Minimum civil time sentinel.
    pub const ZERO: PackedTime = PackedTime(0);

    /// "Never" or "unspecified"; every field reads as unset.
    pub const INFINITY: PackedTime = PackedTime(-1);

    /// Wrap a raw word, rejecting any set field outside its range.
    pub fn from_raw(raw: i32) -> Result<Self> {
        if raw == -1 {
            return Ok(Self::INFINITY);
        }
        for field in &ALL_FIELDS {
            if let Some(value) = field.get(raw) {
                if value > field.max {
                    return Err(BridgeError::range(field.name, value));
                }
            }
        }
        Ok(Self(raw))
    }

    /// True if every set field of `raw` is within range.
    pub fn check(raw: i32) -> bool {
        Self::from_raw(raw).is_ok()
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    pub fn is_infinity(self) -> bool {
        self == Self::INFINITY
    }

    /// Pack field values, rejecting any set value outside its bounds.
    pub fn pack(fields: &PackedFields) -> Result<Self> {
        let mut data = 0;
        data = MINUTES.set(data, fields.minute.map(i32::from))?;
        data = HOURS.set(data, fields.hour.map(i32::from))?;
        data = WEEKDAY.set(data, fields.weekday.map(i32::from))?;
        data = DAY.set(data, fields.day.map(i32::from))?;
        data = MONTH.set(data, fields.month.map(i32::from))?;
        data = YEAR.set(data, fields.year.map(i32::from))?;
        data = FLAGS.set(data, fields.flags.map(i32::from))?;
        Ok(Self(data))
    }

    /// Exact inverse of [`PackedTime::pack`].
    pub fn unpack(self) -> PackedFields {
        let narrow = |field: &BitField| field.get(self.0).map(|v| v as u8);
        PackedFields {
            year: YEAR.get(self.0).map(|v| v as u16),
            month: narrow(&MONTH),
            day: narrow(&DAY),
            weekday: narrow(&WEEKDAY),
            hour: narrow(&HOURS),
            minute: narrow(&MINUTES),
            flags: narrow(&FLAGS),
        }
    }

    /// Value of one field, `None` when unset.
    pub fn get(self, field: Field) -> Option<i32> {
        field.bits().get(self.0)
    }

    /// Copy with one field replaced.
    pub fn with(self, field: Field, value: Option<i32>) -> Result<Self> {
        Ok(Self(field.bits().set(self.0, value)?))
    }

    pub fn year(self) -> Option<i32> {
        self.get(Field::Year)
    }

    pub fn month(self) -> Option<i32> {
        self.get(Field::Month)
    }

    pub fn day(self) -> Option<i32> {
        self.get(Field::Day)
    }

    pub fn weekday(self) -> Option<i32> {
        self.get(Field::Weekday)
    }

    pub fn hours(self) -> Option<i32> {
        self.get(Field::Hours)
    }

    pub fn minutes(self) -> Option<i32> {
        self.get(Field::Minutes)
    }

    pub fn flags(self) -> Option<i32> {
        self.get(Field::Flags)
    }

    /// Pack a civil date-time. The minimum and maximum representable
    /// date-times map to [`ZERO`](Self::ZERO) and [`INFINITY`](Self::INFINITY);
    /// any other year outside 2000..=2030 is rejected. Flags are stored as 0.
    pub fn from_civil(value: NaiveDateTime) -> Result<Self> {
        if value == NaiveDateTime::MAX {
            return Ok(Self::INFINITY);
        }
        if value == NaiveDateTime::MIN {
            return Ok(Self::ZERO);
        }

        let mut data = YEAR.set(0, Some(value.year()))?;
        data = MONTH.set(data, Some(value.month() as i32))?;
        data = DAY.set(data, Some(value.day() as i32))?;
        data = WEEKDAY.set(data, Some(value.weekday().num_days_from_sunday() as i32))?;
        data = HOURS.set(data, Some(value.hour() as i32))?;
        data = MINUTES.set(data, Some(value.minute() as i32))?;
        Ok(Self(data))
    }

    /// Rebuild a civil date-time from year, month, day, hours and minutes.
    /// Weekday and flags are ignored; any other unset field is an error.
    pub fn to_civil(self, kind: TimeKind) -> Result<CivilDateTime> {
        let value = if self.is_infinity() {
            NaiveDateTime::MAX
        } else if self.is_zero() {
            NaiveDateTime::MIN
        } else {
            let year = self.year().ok_or_else(|| BridgeError::range(YEAR.name, -1))?;
            let month = self.month().ok_or_else(|| BridgeError::range(MONTH.name, -1))?;
            let day = self.day().ok_or_else(|| BridgeError::range(DAY.name, -1))?;
            let hour = self.hours().ok_or_else(|| BridgeError::range(HOURS.name, -1))?;
            let minute = self.minutes().ok_or_else(|| BridgeError::range(MINUTES.name, -1))?;

            NaiveDate::from_ymd_opt(year, month as u32, day as u32)
                .ok_or_else(|| BridgeError::range(DAY.name, day))?
                .and_hms_opt(hour as u32, minute as u32, 0)
                .ok_or_else(|| BridgeError::range(HOURS.name, hour))?
        };
        Ok(CivilDateTime { value, kind })
    }
}

impl TryFrom<i32> for PackedTime {
    type Error = BridgeError;

    fn try_from(raw: i32) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<PackedTime> for i32 {
    fn from(time: PackedTime) -> i32 {
        time.0
    }
}

/// Renders the word as unsigned, the form used in data files.
impl fmt::Display for PackedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as u32)
    }
}

impl FromStr for PackedTime {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = s
            .trim()
            .parse::<u32>()
            .map_err(|_| BridgeError::range("packed time", -1))?;
        Self::from_raw(parsed as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(year: u16, month: u8, day: u8, hour: u8, minute: u8) -> PackedFields {
        PackedFields {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            weekday: None,
            hour: Some(hour),
            minute: Some(minute),
            flags: Some(0),
        }
    }

    #[test]
    fn test_pack_layout_matches_bit_table() {
        let packed = PackedTime::pack(&PackedFields {
            year: Some(2008),
            month: Some(11),
            day: Some(13),
            weekday: Some(4),
            hour: Some(12),
            minute: Some(30),
            flags: Some(0),
        })
        .unwrap();
        let expected = (8 << 24) | (10 << 20) | (12 << 14) | (4 << 11) | (12 << 6) | 30;
        assert_eq!(packed.raw(), expected);
    }

    #[test]
    fn test_year_out_of_range_rejected() {
        let result = PackedTime::pack(&fields(2031, 1, 1, 0, 0));
        assert!(matches!(
            result,
            Err(BridgeError::Range { field: "year", value: 2031 })
        ));
        assert!(PackedTime::pack(&fields(1999, 1, 1, 0, 0)).is_err());
    }

    #[test]
    fn test_each_field_rejects_its_bounds() {
        assert!(PackedTime::ZERO.with(Field::Minutes, Some(60)).is_err());
        assert!(PackedTime::ZERO.with(Field::Hours, Some(24)).is_err());
        assert!(PackedTime::ZERO.with(Field::Weekday, Some(7)).is_err());
        assert!(PackedTime::ZERO.with(Field::Day, Some(0)).is_err());
        assert!(PackedTime::ZERO.with(Field::Month, Some(13)).is_err());
        assert!(PackedTime::ZERO.with(Field::Flags, Some(3)).is_err());
        assert!(PackedTime::ZERO.with(Field::Flags, Some(2)).is_ok());
    }

    #[test]
    fn test_infinity_unpacks_to_all_unset() {
        let fields = PackedTime::from_raw(-1).unwrap().unpack();
        assert_eq!(fields, PackedFields::default());
    }

    #[test]
    fn test_unset_field_reads_none_regardless_of_others() {
        let packed = PackedTime::pack(&PackedFields {
            year: None,
            ..fields(2010, 3, 4, 5, 6)
        })
        .unwrap();
        assert_eq!(packed.year(), None);
        assert_eq!(packed.month(), Some(3));
        assert_eq!(packed.minutes(), Some(6));
    }

    #[test]
    fn test_raw_with_impossible_month_rejected() {
        // Month raw 12 would read as 13.
        let raw = 12 << 20;
        assert!(matches!(
            PackedTime::from_raw(raw),
            Err(BridgeError::Range { field: "month", value: 13 })
        ));
        assert!(!PackedTime::check(raw));
    }

    #[test]
    fn test_civil_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2009, 4, 14)
            .unwrap()
            .and_hms_opt(20, 15, 0)
            .unwrap();
        let packed = PackedTime::from_civil(dt).unwrap();
        assert_eq!(packed.weekday(), Some(2));
        assert_eq!(packed.flags(), Some(0));

        let back = packed.to_civil(TimeKind::Utc).unwrap();
        assert_eq!(back.value, dt);
        assert_eq!(back.kind, TimeKind::Utc);
    }

    #[test]
    fn test_civil_sentinels() {
        assert_eq!(
            PackedTime::from_civil(NaiveDateTime::MIN).unwrap(),
            PackedTime::ZERO
        );
        assert_eq!(
            PackedTime::from_civil(NaiveDateTime::MAX).unwrap(),
            PackedTime::INFINITY
        );
        assert!(PackedTime::ZERO.to_civil(TimeKind::Local).unwrap().is_min());
        assert!(PackedTime::INFINITY.to_civil(TimeKind::Local).unwrap().is_max());
    }

    #[test]
    fn test_civil_outside_year_range_rejected() {
        let dt = NaiveDate::from_ymd_opt(2042, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(PackedTime::from_civil(dt).is_err());
    }

    #[test]
    fn test_to_civil_requires_date_fields() {
        let yearly = PackedTime::pack(&PackedFields {
            year: None,
            ..fields(2010, 12, 25, 6, 0)
        })
        .unwrap();
        assert!(matches!(
            yearly.to_civil(TimeKind::Unspecified),
            Err(BridgeError::Range { field: "year", .. })
        ));

        let feb_30 = PackedTime::pack(&fields(2010, 2, 30, 0, 0)).unwrap();
        assert!(feb_30.to_civil(TimeKind::Unspecified).is_err());
    }

    #[test]
    fn test_to_civil_requires_time_of_day() {
        let no_hour = PackedTime::pack(&PackedFields {
            hour: None,
            ..fields(2010, 12, 25, 6, 0)
        })
        .unwrap();
        assert!(matches!(
            no_hour.to_civil(TimeKind::Local),
            Err(BridgeError::Range { field: "hours", .. })
        ));

        let no_minute = PackedTime::pack(&PackedFields {
            minute: None,
            ..fields(2010, 12, 25, 6, 0)
        })
        .unwrap();
        assert!(matches!(
            no_minute.to_civil(TimeKind::Local),
            Err(BridgeError::Range { field: "minutes", .. })
        ));
    }

    #[test]
    fn test_display_and_parse_use_unsigned_form() {
        assert_eq!(PackedTime::INFINITY.to_string(), "4294967295");
        assert_eq!("4294967295".parse::<PackedTime>().unwrap(), PackedTime::INFINITY);
        assert!("not a time".parse::<PackedTime>().is_err());
    }
}
