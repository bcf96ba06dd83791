//! Duration units and Unix timestamps with explicit, checked conversions.
//!
//! Durations convert through milliseconds. Converting to a coarser unit
//! truncates toward zero; any result that does not fit the target's integer
//! width is a [`BridgeError::Range`] rather than a wrapped value.
//!
//! Timestamps reserve `-1` for "infinity" and `0` for "zero"; every other
//! negative value is rejected.
//!
//! [`RelativeTime`] is an unsigned millisecond tick that wraps after about
//! 49.7 days; differences between ticks are taken modulo 2^32.

use crate::error::{BridgeError, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Common behaviour of the duration newtypes.
pub trait TimeUnit: Sized + Copy {
    /// Milliseconds in one tick of this unit.
    const MILLIS_PER_TICK: i64;

    /// Name used in range errors.
    const NAME: &'static str;

    fn ticks(self) -> i64;

    fn from_ticks(ticks: i64) -> Result<Self>;

    fn as_millis(self) -> i64 {
        self.ticks() * Self::MILLIS_PER_TICK
    }

    /// Convert to another unit, truncating toward zero.
    fn convert<U: TimeUnit>(self) -> Result<U> {
        U::from_ticks(self.as_millis() / U::MILLIS_PER_TICK)
    }

    fn to_delta(self) -> Result<TimeDelta> {
        TimeDelta::try_milliseconds(self.as_millis())
            .ok_or_else(|| BridgeError::range(Self::NAME, self.ticks()))
    }
}

macro_rules! time_unit {
    ($(#[$doc:meta])* $name:ident, $repr:ty, $millis:expr, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub $repr);

        impl $name {
            pub const ZERO: $name = $name(0);
            pub const MAX: $name = $name(<$repr>::MAX);
            pub const MIN: $name = $name(<$repr>::MIN);

            pub fn checked_add(self, other: Self) -> Result<Self> {
                self.0
                    .checked_add(other.0)
                    .map($name)
                    .ok_or_else(|| BridgeError::range($label, i64::from(self.0).saturating_add(i64::from(other.0))))
            }

            pub fn checked_sub(self, other: Self) -> Result<Self> {
                self.0
                    .checked_sub(other.0)
                    .map($name)
                    .ok_or_else(|| BridgeError::range($label, i64::from(self.0).saturating_sub(i64::from(other.0))))
            }
        }

        impl TimeUnit for $name {
            const MILLIS_PER_TICK: i64 = $millis;
            const NAME: &'static str = $label;

            fn ticks(self) -> i64 {
                i64::from(self.0)
            }

            fn from_ticks(ticks: i64) -> Result<Self> {
                <$repr>::try_from(ticks)
                    .map($name)
                    .map_err(|_| BridgeError::range($label, ticks))
            }
        }
    };
}

time_unit!(
    /// Millisecond count.
    Milliseconds, i64, 1, "milliseconds"
);
time_unit!(
    /// Second count.
    Seconds, i32, 1_000, "seconds"
);
time_unit!(Minutes, i32, 60_000, "minutes");
time_unit!(Hours, i32, 3_600_000, "hours");
time_unit!(Days, i32, 86_400_000, "days");
time_unit!(Weeks, i32, 604_800_000, "weeks");

// i32 ticks of any unit up to weeks fit comfortably in i64 milliseconds.
macro_rules! into_millis {
    ($($name:ident),*) => {
        $(impl From<$name> for Milliseconds {
            fn from(value: $name) -> Self {
                Milliseconds(value.as_millis())
            }
        })*
    };
}

into_millis!(Seconds, Minutes, Hours, Days, Weeks);

/// Unsigned millisecond tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RelativeTime(u32);

impl RelativeTime {
    pub const ZERO: RelativeTime = RelativeTime(0);
    pub const MAX: RelativeTime = RelativeTime(u32::MAX);
    pub const MIN: RelativeTime = RelativeTime(u32::MIN);

    pub fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    /// Tick for a non-negative duration of any unit.
    pub fn from_unit<U: TimeUnit>(value: U) -> Result<Self> {
        let millis = value.as_millis();
        u32::try_from(millis)
            .map(Self)
            .map_err(|_| BridgeError::range("relative time", millis))
    }

    /// Tick for a duration, reduced modulo 2^32.
    pub fn wrapping_from(value: Milliseconds) -> Self {
        Self(value.0.rem_euclid(1 << 32) as u32)
    }

    pub fn millis(self) -> u32 {
        self.0
    }

    pub fn to_unit<U: TimeUnit>(self) -> Result<U> {
        Milliseconds(i64::from(self.0)).convert()
    }

    pub fn checked_add(self, offset: Milliseconds) -> Result<Self> {
        Self::from_unit(Milliseconds(i64::from(self.0) + offset.0))
    }

    pub fn checked_sub(self, offset: Milliseconds) -> Result<Self> {
        Self::from_unit(Milliseconds(i64::from(self.0) - offset.0))
    }

    /// Ticks elapsed from `earlier` to `self`, across at most one wrap.
    pub fn since(self, earlier: RelativeTime) -> Milliseconds {
        Milliseconds(i64::from(self.0.wrapping_sub(earlier.0)))
    }
}

impl From<RelativeTime> for Milliseconds {
    fn from(value: RelativeTime) -> Self {
        Milliseconds(i64::from(value.0))
    }
}

impl TryFrom<Milliseconds> for RelativeTime {
    type Error = BridgeError;

    fn try_from(value: Milliseconds) -> Result<Self> {
        Self::from_unit(value)
    }
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl FromStr for RelativeTime {
    type Err = ParseIntError;

    /// Millisecond count, with or without an `ms` suffix.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_suffix("ms").unwrap_or(s).trim_end().parse().map(Self)
    }
}

fn check_timestamp(field: &'static str, value: i64) -> Result<()> {
    if value < 0 && value != -1 {
        return Err(BridgeError::range(field, value));
    }
    Ok(())
}

fn civil_from_seconds(field: &'static str, seconds: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| BridgeError::range(field, seconds))
}

fn seconds_from_civil(field: &'static str, value: NaiveDateTime) -> Result<i64> {
    let seconds = value.and_utc().timestamp();
    if seconds < 0 {
        return Err(BridgeError::range(field, seconds));
    }
    Ok(seconds)
}

/// Seconds since the Unix epoch, 32-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnixTime(i32);

impl UnixTime {
    pub const ZERO: UnixTime = UnixTime(0);
    pub const INFINITY: UnixTime = UnixTime(-1);

    pub fn new(seconds: i32) -> Result<Self> {
        check_timestamp("unix time", i64::from(seconds))?;
        Ok(Self(seconds))
    }

    pub fn seconds(self) -> i32 {
        self.0
    }

    pub fn is_infinity(self) -> bool {
        self == Self::INFINITY
    }

    /// Civil UTC time; zero and infinity map to the civil minimum and maximum.
    pub fn to_civil(self) -> Result<NaiveDateTime> {
        match self {
            Self::INFINITY => Ok(NaiveDateTime::MAX),
            Self::ZERO => Ok(NaiveDateTime::MIN),
            _ => civil_from_seconds("unix time", i64::from(self.0)),
        }
    }

    pub fn from_civil(value: NaiveDateTime) -> Result<Self> {
        if value == NaiveDateTime::MAX {
            return Ok(Self::INFINITY);
        }
        if value == NaiveDateTime::MIN {
            return Ok(Self::ZERO);
        }
        let seconds = seconds_from_civil("unix time", value)?;
        i32::try_from(seconds)
            .map(Self)
            .map_err(|_| BridgeError::range("unix time", seconds))
    }

    pub fn checked_add(self, offset: Seconds) -> Result<Self> {
        let sum = i64::from(self.0) + i64::from(offset.0);
        let seconds = i32::try_from(sum).map_err(|_| BridgeError::range("unix time", sum))?;
        Self::new(seconds)
    }

    /// Signed distance `self - earlier`.
    pub fn since(self, earlier: UnixTime) -> Result<Seconds> {
        Seconds::from_ticks(i64::from(self.0) - i64::from(earlier.0))
    }
}

impl TryFrom<UnixTime64> for UnixTime {
    type Error = BridgeError;

    fn try_from(value: UnixTime64) -> Result<Self> {
        i32::try_from(value.0)
            .map(UnixTime)
            .map_err(|_| BridgeError::range("unix time", value.0))
    }
}

impl TryFrom<UnixTimeMs> for UnixTime {
    type Error = BridgeError;

    fn try_from(value: UnixTimeMs) -> Result<Self> {
        UnixTime::try_from(UnixTime64::from(value))
    }
}

/// Seconds since the Unix epoch, 64-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnixTime64(i64);

impl UnixTime64 {
    pub const ZERO: UnixTime64 = UnixTime64(0);
    pub const INFINITY: UnixTime64 = UnixTime64(-1);

    pub fn new(seconds: i64) -> Result<Self> {
        check_timestamp("unix time", seconds)?;
        Ok(Self(seconds))
    }

    pub fn seconds(self) -> i64 {
        self.0
    }

    pub fn to_civil(self) -> Result<NaiveDateTime> {
        match self {
            Self::INFINITY => Ok(NaiveDateTime::MAX),
            Self::ZERO => Ok(NaiveDateTime::MIN),
            _ => civil_from_seconds("unix time", self.0),
        }
    }

    pub fn from_civil(value: NaiveDateTime) -> Result<Self> {
        if value == NaiveDateTime::MAX {
            return Ok(Self::INFINITY);
        }
        if value == NaiveDateTime::MIN {
            return Ok(Self::ZERO);
        }
        seconds_from_civil("unix time", value).map(Self)
    }
}

impl From<UnixTime> for UnixTime64 {
    fn from(value: UnixTime) -> Self {
        UnixTime64(i64::from(value.0))
    }
}

impl From<UnixTimeMs> for UnixTime64 {
    fn from(value: UnixTimeMs) -> Self {
        if value == UnixTimeMs::INFINITY {
            return UnixTime64::INFINITY;
        }
        UnixTime64(value.0 / 1_000)
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnixTimeMs(i64);

impl UnixTimeMs {
    pub const ZERO: UnixTimeMs = UnixTimeMs(0);
    pub const INFINITY: UnixTimeMs = UnixTimeMs(-1);

    pub fn new(millis: i64) -> Result<Self> {
        check_timestamp("unix time ms", millis)?;
        Ok(Self(millis))
    }

    pub fn millis(self) -> i64 {
        self.0
    }
}

impl TryFrom<UnixTime64> for UnixTimeMs {
    type Error = BridgeError;

    fn try_from(value: UnixTime64) -> Result<Self> {
        if value == UnixTime64::INFINITY {
            return Ok(UnixTimeMs::INFINITY);
        }
        value
            .0
            .checked_mul(1_000)
            .map(UnixTimeMs)
            .ok_or_else(|| BridgeError::range("unix time ms", value.0))
    }
}
