//! Realm time zones and the two civil clocks built on them.
//!
//! [`ServerTime`] is UTC civil time. [`RealmTime`] is the same instant
//! expressed in the realm's local zone. Packed times on the wire are
//! realm-local. Both clocks keep the civil minimum and maximum as the
//! Zero and Infinity sentinels through every conversion.

use super::kinds::WowTime;
use super::packed::TimeKind;
use super::units::{Minutes, TimeUnit, UnixTime, UnixTime64};
use crate::error::{BridgeError, Result};
use chrono::{NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Largest accepted distance from UTC, in minutes.
pub const MAX_OFFSET_MINUTES: i32 = 24 * 60;

/// Realm category codes advertised by the realm list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealmZone {
    None = 0,
    Development = 1,
    UnitedStates = 2,
    Oceanic = 3,
    LatinAmerica = 4,
    Tournament = 5,
    Korea = 6,
    Tournament2 = 7,
    English = 8,
    German = 9,
    French = 10,
    Spanish = 11,
    Russian = 12,
    Tournament3 = 13,
    Taiwan = 14,
    Tournament4 = 15,
    China = 16,
    Cn1 = 17,
    Cn2 = 18,
    Cn3 = 19,
    Cn4 = 20,
    Cn5 = 21,
    Cn6 = 22,
    Cn7 = 23,
    Cn8 = 24,
    Tournament5 = 25,
    TestServer = 26,
    Tournament6 = 27,
    QaServer = 28,
    Cn9 = 29,
}

impl RealmZone {
    const ALL: [RealmZone; 30] = [
        RealmZone::None,
        RealmZone::Development,
        RealmZone::UnitedStates,
        RealmZone::Oceanic,
        RealmZone::LatinAmerica,
        RealmZone::Tournament,
        RealmZone::Korea,
        RealmZone::Tournament2,
        RealmZone::English,
        RealmZone::German,
        RealmZone::French,
        RealmZone::Spanish,
        RealmZone::Russian,
        RealmZone::Tournament3,
        RealmZone::Taiwan,
        RealmZone::Tournament4,
        RealmZone::China,
        RealmZone::Cn1,
        RealmZone::Cn2,
        RealmZone::Cn3,
        RealmZone::Cn4,
        RealmZone::Cn5,
        RealmZone::Cn6,
        RealmZone::Cn7,
        RealmZone::Cn8,
        RealmZone::Tournament5,
        RealmZone::TestServer,
        RealmZone::Tournament6,
        RealmZone::QaServer,
        RealmZone::Cn9,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Fixed UTC offset used for this zone.
    pub fn offset(self) -> Minutes {
        match self {
            RealmZone::UnitedStates => Minutes(-480),
            RealmZone::Oceanic => Minutes(600),
            RealmZone::LatinAmerica => Minutes(-180),
            RealmZone::Korea => Minutes(540),
            RealmZone::German | RealmZone::French | RealmZone::Spanish => Minutes(60),
            RealmZone::Russian => Minutes(180),
            RealmZone::Taiwan | RealmZone::China => Minutes(480),
            _ => Minutes(0),
        }
    }
}

/// The realm's distance from UTC. Built once from configuration and
/// handed to every conversion that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone {
    offset: Minutes,
}

impl Default for Timezone {
    fn default() -> Self {
        Self::UTC
    }
}

impl Timezone {
    pub const UTC: Timezone = Timezone { offset: Minutes(0) };

    pub fn new(offset: Minutes) -> Result<Self> {
        if offset.0.abs() > MAX_OFFSET_MINUTES {
            return Err(BridgeError::range("timezone offset", offset.0));
        }
        Ok(Self { offset })
    }

    pub fn from_realm_zone(zone: RealmZone) -> Self {
        Self {
            offset: zone.offset(),
        }
    }

    pub fn offset(&self) -> Minutes {
        self.offset
    }

    fn delta(&self) -> Result<TimeDelta> {
        self.offset.to_delta()
    }
}

fn is_sentinel(value: NaiveDateTime) -> bool {
    value == NaiveDateTime::MIN || value == NaiveDateTime::MAX
}

fn shift(value: NaiveDateTime, delta: TimeDelta) -> Result<NaiveDateTime> {
    if is_sentinel(value) {
        return Ok(value);
    }
    value
        .checked_add_signed(delta)
        .ok_or_else(|| BridgeError::range("civil time", delta.num_minutes()))
}

/// UTC civil time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerTime(NaiveDateTime);

impl ServerTime {
    pub const ZERO: ServerTime = ServerTime(NaiveDateTime::MIN);
    pub const INFINITY: ServerTime = ServerTime(NaiveDateTime::MAX);

    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    pub fn now() -> Self {
        Self(Utc::now().naive_utc())
    }

    pub fn from_unix(time: UnixTime) -> Result<Self> {
        time.to_civil().map(Self)
    }

    pub fn from_unix64(time: UnixTime64) -> Result<Self> {
        time.to_civil().map(Self)
    }

    pub fn to_unix(self) -> Result<UnixTime> {
        UnixTime::from_civil(self.0)
    }

    pub fn to_realm(self, zone: &Timezone) -> Result<RealmTime> {
        shift(self.0, zone.delta()?).map(RealmTime)
    }

    pub fn value(self) -> NaiveDateTime {
        self.0
    }
}

/// Realm-local civil time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RealmTime(NaiveDateTime);

impl RealmTime {
    pub const ZERO: RealmTime = RealmTime(NaiveDateTime::MIN);
    pub const INFINITY: RealmTime = RealmTime(NaiveDateTime::MAX);

    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    pub fn to_server(self, zone: &Timezone) -> Result<ServerTime> {
        shift(self.0, -zone.delta()?).map(ServerTime)
    }

    /// Interpret a Unix timestamp in the realm's zone.
    pub fn from_unix64(time: UnixTime64, zone: &Timezone) -> Result<Self> {
        ServerTime::from_unix64(time)?.to_realm(zone)
    }

    pub fn from_wow_time(time: WowTime) -> Result<Self> {
        time.to_civil(TimeKind::Local).map(Self)
    }

    pub fn to_wow_time(self) -> Result<WowTime> {
        WowTime::from_civil(self.0)
    }

    pub fn value(self) -> NaiveDateTime {
        self.0
    }
}
