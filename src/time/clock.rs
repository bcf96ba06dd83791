//! Per-iteration clock snapshot.
//!
//! A [`LoopTime`] is captured once at the start of each pump and holds the
//! same instant in every representation handlers need, so one message sees
//! one consistent "now".

use super::kinds::WowTime;
use super::units::{Milliseconds, RelativeTime, UnixTime};
use super::zone::{RealmTime, ServerTime, Timezone};
use crate::error::{BridgeError, Result};
use chrono::TimeDelta;

/// One instant in every clock representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTime {
    server: ServerTime,
    realm: RealmTime,
    wow_server: WowTime,
    wow_realm: WowTime,
    unix_server: UnixTime,
    unix_realm: UnixTime,
    uptime: Milliseconds,
    tick: RelativeTime,
}

impl LoopTime {
    /// Snapshot of `now` for a process that started at `started`.
    ///
    /// `now` must be a real instant, not a sentinel. A `now` earlier than
    /// `started` yields zero uptime.
    pub fn capture(started: ServerTime, now: ServerTime, zone: &Timezone) -> Result<Self> {
        if now == ServerTime::ZERO {
            return Err(BridgeError::range("loop time", 0));
        }
        if now == ServerTime::INFINITY {
            return Err(BridgeError::range("loop time", -1));
        }

        let realm = now.to_realm(zone)?;
        let elapsed = now
            .value()
            .signed_duration_since(started.value())
            .max(TimeDelta::zero());
        let uptime = Milliseconds(elapsed.num_milliseconds());

        Ok(Self {
            server: now,
            realm,
            wow_server: WowTime::from_civil(now.value())?,
            wow_realm: realm.to_wow_time()?,
            unix_server: now.to_unix()?,
            unix_realm: UnixTime::from_civil(realm.value())?,
            uptime,
            tick: RelativeTime::wrapping_from(uptime),
        })
    }

    pub fn server(&self) -> ServerTime {
        self.server
    }

    pub fn realm(&self) -> RealmTime {
        self.realm
    }

    pub fn wow_server(&self) -> WowTime {
        self.wow_server
    }

    pub fn wow_realm(&self) -> WowTime {
        self.wow_realm
    }

    pub fn unix_server(&self) -> UnixTime {
        self.unix_server
    }

    /// Realm-local civil time read as if it were UTC.
    pub fn unix_realm(&self) -> UnixTime {
        self.unix_realm
    }

    pub fn uptime(&self) -> Milliseconds {
        self.uptime
    }

    /// Uptime as a wrapping millisecond tick.
    pub fn tick(&self) -> RelativeTime {
        self.tick
    }

    /// Milliseconds from tick `old` to this snapshot.
    pub fn diff(&self, old: RelativeTime) -> Milliseconds {
        self.tick.since(old)
    }

    /// Civil distance from `old` to this snapshot.
    pub fn since(&self, old: ServerTime) -> TimeDelta {
        self.server.value().signed_duration_since(old.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::units::Minutes;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 5, 20)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_capture_expresses_one_instant() {
        let zone = Timezone::new(Minutes(60)).unwrap();
        let started = ServerTime::new(at(8, 0, 0));
        let now = ServerTime::new(at(8, 30, 15));
        let clock = LoopTime::capture(started, now, &zone).unwrap();

        assert_eq!(clock.server(), now);
        assert_eq!(clock.realm().value(), at(9, 30, 15));
        assert_eq!(clock.unix_server().seconds(), 1_274_344_215);
        assert_eq!(clock.unix_realm().seconds(), 1_274_344_215 + 3_600);
        assert_eq!(clock.wow_realm(), WowTime::from_civil(at(9, 30, 0)).unwrap());
        assert_eq!(clock.wow_server(), WowTime::from_civil(at(8, 30, 0)).unwrap());
        assert_eq!(clock.uptime(), Milliseconds(1_815_000));
        assert_eq!(clock.tick().millis(), 1_815_000);
    }

    #[test]
    fn test_diff_between_snapshots() {
        let started = ServerTime::new(at(8, 0, 0));
        let first = LoopTime::capture(started, ServerTime::new(at(8, 0, 1)), &Timezone::UTC).unwrap();
        let second = LoopTime::capture(started, ServerTime::new(at(8, 0, 4)), &Timezone::UTC).unwrap();

        assert_eq!(second.diff(first.tick()), Milliseconds(3_000));
        assert_eq!(second.since(first.server()), TimeDelta::seconds(3));
    }

    #[test]
    fn test_clock_behind_start_has_zero_uptime() {
        let started = ServerTime::new(at(9, 0, 0));
        let clock = LoopTime::capture(started, ServerTime::new(at(8, 0, 0)), &Timezone::UTC).unwrap();
        assert_eq!(clock.uptime(), Milliseconds::ZERO);
        assert_eq!(clock.tick(), RelativeTime::ZERO);
    }

    #[test]
    fn test_sentinel_now_rejected() {
        let started = ServerTime::new(at(8, 0, 0));
        assert!(LoopTime::capture(started, ServerTime::ZERO, &Timezone::UTC).is_err());
        assert!(LoopTime::capture(started, ServerTime::INFINITY, &Timezone::UTC).is_err());
    }
}
