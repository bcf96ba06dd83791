//! Interpretations layered over [`PackedTime`].

use super::packed::{Field, PackedTime, TimeKind};
use crate::error::{BridgeError, Result};
use chrono::NaiveDateTime;

fn require(time: PackedTime, fields: &[Field]) -> Result<()> {
    for &field in fields {
        if time.get(field).is_none() {
            return Err(BridgeError::range(field.name(), -1));
        }
    }
    Ok(())
}

/// A concrete server-calendar moment. Every field except the weekday must
/// be set, unless the value is [`PackedTime::INFINITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WowTime(PackedTime);

impl WowTime {
    const REQUIRED: [Field; 6] = [
        Field::Flags,
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Hours,
        Field::Minutes,
    ];

    pub const ZERO: WowTime = WowTime(PackedTime::ZERO);
    pub const INFINITY: WowTime = WowTime(PackedTime::INFINITY);

    pub fn new(time: PackedTime) -> Result<Self> {
        if !time.is_infinity() {
            require(time, &Self::REQUIRED)?;
        }
        Ok(Self(time))
    }

    pub fn from_raw(raw: i32) -> Result<Self> {
        Self::new(PackedTime::from_raw(raw)?)
    }

    pub fn from_civil(value: NaiveDateTime) -> Result<Self> {
        Self::new(PackedTime::from_civil(value)?)
    }

    pub fn to_civil(self, kind: TimeKind) -> Result<NaiveDateTime> {
        Ok(self.0.to_civil(kind)?.value)
    }

    pub fn packed(self) -> PackedTime {
        self.0
    }

    pub fn raw(self) -> i32 {
        self.0.raw()
    }
}

/// A calendar-feature time. Flags, day, hours and minutes must be set; an
/// unset year marks an event recurring on the same date every year.
/// [`PackedTime::INFINITY`] is accepted as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HolidayTime(PackedTime);

impl HolidayTime {
    const REQUIRED: [Field; 4] = [Field::Flags, Field::Day, Field::Hours, Field::Minutes];

    pub const ZERO: HolidayTime = HolidayTime(PackedTime::ZERO);
    pub const INFINITY: HolidayTime = HolidayTime(PackedTime::INFINITY);

    pub fn new(time: PackedTime) -> Result<Self> {
        if !time.is_infinity() {
            require(time, &Self::REQUIRED)?;
        }
        Ok(Self(time))
    }

    pub fn from_raw(raw: i32) -> Result<Self> {
        Self::new(PackedTime::from_raw(raw)?)
    }

    /// Civil times map through [`PackedTime::from_civil`], so the civil
    /// extremes become [`ZERO`](Self::ZERO) and [`INFINITY`](Self::INFINITY).
    pub fn from_civil(value: NaiveDateTime) -> Result<Self> {
        Ok(Self(PackedTime::from_civil(value)?))
    }

    pub fn is_yearly(self) -> bool {
        !self.is_sentinel() && self.0.year().is_none()
    }

    fn is_sentinel(self) -> bool {
        self.0.is_zero() || self.0.is_infinity()
    }

    /// Resolve to a concrete date in `year`, using the stored year when set.
    /// The sentinels resolve to the civil minimum and maximum.
    pub fn in_year(self, year: i32, kind: TimeKind) -> Result<NaiveDateTime> {
        let time = if self.is_yearly() {
            self.0.with(Field::Year, Some(year))?
        } else {
            self.0
        };
        Ok(time.to_civil(kind)?.value)
    }

    pub fn packed(self) -> PackedTime {
        self.0
    }

    pub fn raw(self) -> i32 {
        self.0.raw()
    }
}
