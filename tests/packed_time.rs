//! Packed calendar time and time unit conversions.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use protocol_bridge::error::BridgeError;
use protocol_bridge::time::{
    Days, HolidayTime, Milliseconds, Minutes, PackedFields, PackedTime, RealmTime, Seconds,
    ServerTime, TimeKind, TimeUnit, Timezone, UnixTime, UnixTime64, WowTime,
};
use proptest::prelude::*;

fn fields_strategy() -> impl Strategy<Value = PackedFields> {
    (
        prop::option::of(2000u16..=2030),
        prop::option::of(1u8..=12),
        prop::option::of(1u8..=31),
        prop::option::of(0u8..=6),
        prop::option::of(0u8..=23),
        prop::option::of(0u8..=59),
        prop::option::of(0u8..=2),
    )
        .prop_map(|(year, month, day, weekday, hour, minute, flags)| PackedFields {
            year,
            month,
            day,
            weekday,
            hour,
            minute,
            flags,
        })
}

fn civil_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (2000i32..=2030, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60).prop_map(|(y, mo, d, h, mi)| {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    })
}

// Property: unpack is the exact inverse of pack
proptest! {
    #[test]
    fn prop_pack_unpack_roundtrip(fields in fields_strategy()) {
        let packed = PackedTime::pack(&fields).expect("in-range fields pack");
        prop_assert_eq!(packed.unpack(), fields);
    }
}

// Property: civil date-times in 2000..=2030 survive packing
proptest! {
    #[test]
    fn prop_civil_roundtrip(value in civil_strategy()) {
        let packed = PackedTime::from_civil(value).unwrap();
        let civil = packed.to_civil(TimeKind::Utc).unwrap();
        prop_assert_eq!(civil.value, value);
        prop_assert_eq!(civil.kind, TimeKind::Utc);
        prop_assert_eq!(
            packed.weekday(),
            Some(value.weekday().num_days_from_sunday() as i32)
        );
    }
}

// Property: from_raw accepts exactly what it can unpack back
proptest! {
    #[test]
    fn prop_from_raw_never_panics(raw in any::<i32>()) {
        if let Ok(time) = PackedTime::from_raw(raw) {
            prop_assert_eq!(time.raw(), raw);
        }
    }
}

#[test]
fn test_year_2031_rejected() {
    let fields = PackedFields {
        year: Some(2031),
        month: Some(1),
        day: Some(1),
        ..PackedFields::default()
    };
    let err = PackedTime::pack(&fields).unwrap_err();
    assert!(matches!(err, BridgeError::Range { field: "year", value: 2031 }));
}

#[test]
fn test_minus_one_unpacks_to_all_unset() {
    let time = PackedTime::from_raw(-1).unwrap();
    assert!(time.is_infinity());
    assert_eq!(time.unpack(), PackedFields::default());
}

#[test]
fn test_sentinels_map_to_civil_extremes() {
    let max = PackedTime::INFINITY.to_civil(TimeKind::Local).unwrap();
    assert!(max.is_max());
    let min = PackedTime::ZERO.to_civil(TimeKind::Local).unwrap();
    assert!(min.is_min());

    assert_eq!(PackedTime::from_civil(NaiveDateTime::MAX).unwrap(), PackedTime::INFINITY);
    assert_eq!(PackedTime::from_civil(NaiveDateTime::MIN).unwrap(), PackedTime::ZERO);
}

#[test]
fn test_to_civil_needs_concrete_date() {
    let yearly = PackedTime::pack(&PackedFields {
        year: None,
        month: Some(12),
        day: Some(25),
        hour: Some(0),
        minute: Some(0),
        ..PackedFields::default()
    })
    .unwrap();
    assert!(yearly.to_civil(TimeKind::Local).is_err());

    let holiday = HolidayTime::new(yearly.with(protocol_bridge::time::Field::Flags, Some(0)).unwrap())
        .unwrap();
    assert!(holiday.is_yearly());
    let christmas = holiday.in_year(2012, TimeKind::Local).unwrap();
    assert_eq!(christmas.date(), NaiveDate::from_ymd_opt(2012, 12, 25).unwrap());
}

#[test]
fn test_wow_time_requires_every_field_but_weekday() {
    let no_minutes = PackedTime::pack(&PackedFields {
        year: Some(2010),
        month: Some(5),
        day: Some(20),
        hour: Some(8),
        minute: None,
        flags: Some(0),
        ..PackedFields::default()
    })
    .unwrap();
    assert!(WowTime::new(no_minutes).is_err());
    assert!(WowTime::from_raw(0x0A44_E21E).is_ok());
}

#[test]
fn test_holiday_sentinels_bypass_field_checks() {
    let infinity = HolidayTime::from_raw(-1).unwrap();
    assert_eq!(infinity, HolidayTime::INFINITY);
    assert_eq!(infinity.raw(), -1);
    assert_eq!(HolidayTime::new(PackedTime::INFINITY).unwrap(), HolidayTime::INFINITY);

    let zero = HolidayTime::from_raw(0).unwrap();
    assert_eq!(zero, HolidayTime::ZERO);
    assert_eq!(zero.raw(), 0);
}

#[test]
fn test_holiday_sentinels_round_trip_through_civil() {
    assert_eq!(HolidayTime::from_civil(NaiveDateTime::MAX).unwrap(), HolidayTime::INFINITY);
    assert_eq!(HolidayTime::from_civil(NaiveDateTime::MIN).unwrap(), HolidayTime::ZERO);

    assert_eq!(
        HolidayTime::INFINITY.in_year(2012, TimeKind::Local).unwrap(),
        NaiveDateTime::MAX
    );
    assert_eq!(
        HolidayTime::ZERO.in_year(2012, TimeKind::Local).unwrap(),
        NaiveDateTime::MIN
    );
}

#[test]
fn test_holiday_still_requires_time_of_day() {
    let no_minutes = PackedTime::pack(&PackedFields {
        month: Some(12),
        day: Some(25),
        hour: Some(6),
        minute: None,
        flags: Some(0),
        ..PackedFields::default()
    })
    .unwrap();
    assert!(matches!(
        HolidayTime::new(no_minutes),
        Err(BridgeError::Range { field: "minutes", .. })
    ));
}

#[test]
fn test_realm_and_server_clocks_shift_by_offset() {
    let zone = Timezone::new(Minutes(-300)).unwrap();
    let local = NaiveDate::from_ymd_opt(2010, 5, 20)
        .unwrap()
        .and_hms_opt(22, 0, 0)
        .unwrap();

    let server = RealmTime::new(local).to_server(&zone).unwrap();
    assert_eq!(server.value().date(), NaiveDate::from_ymd_opt(2010, 5, 21).unwrap());
    assert_eq!(server.to_realm(&zone).unwrap().value(), local);

    assert_eq!(RealmTime::INFINITY.to_server(&zone).unwrap(), ServerTime::INFINITY);
    assert_eq!(RealmTime::ZERO.to_server(&zone).unwrap(), ServerTime::ZERO);
}

#[test]
fn test_timezone_offset_bounded() {
    assert!(Timezone::new(Minutes(24 * 60)).is_ok());
    assert!(Timezone::new(Minutes(24 * 60 + 1)).is_err());
}

#[test]
fn test_unit_conversions_checked() {
    let week_ms: Milliseconds = Days(7).into();
    assert_eq!(week_ms, Milliseconds(604_800_000));

    let seconds: Seconds = Milliseconds(1_999).convert().unwrap();
    assert_eq!(seconds, Seconds(1));

    let too_many: Result<Seconds, _> = Milliseconds(i64::MAX).convert();
    assert!(too_many.is_err());
}

#[test]
fn test_unix_timestamps_reserve_minus_one() {
    assert!(UnixTime::new(-1).unwrap().is_infinity());
    assert!(UnixTime::new(-2).is_err());

    let wide = UnixTime64::new(i64::from(i32::MAX) + 1).unwrap();
    assert!(UnixTime::try_from(wide).is_err());
}
