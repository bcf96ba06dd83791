//! Identifier widening/narrowing and enumeration mapping across generations.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use protocol_bridge::error::BridgeError;
use protocol_bridge::identity::{
    narrow, widen, widen_detected, Canonical, EnumerationMapper, HighGuidKind, NarrowGuid,
    ObjectKind, RealmId, UpdateKind, WideGuid,
};
use protocol_bridge::protocol::Generation;
use proptest::prelude::*;
use std::collections::HashSet;

const LEGACY: [Generation; 3] = [Generation::Vanilla, Generation::Tbc, Generation::Wotlk];

fn legacy_kinds(generation: Generation) -> Vec<HighGuidKind> {
    HighGuidKind::ALL
        .into_iter()
        .filter(|kind| *kind != HighGuidKind::Null && kind.legacy_high(generation).is_some())
        .collect()
}

// Property: widening then narrowing returns the same identifier
proptest! {
    #[test]
    fn prop_widen_narrow_roundtrip(
        generation in prop::sample::select(LEGACY.to_vec()),
        pick in any::<prop::sample::Index>(),
        entry in 0u32..(1 << 24),
        counter in 1u64..(1 << 24),
        realm in any::<u16>(),
    ) {
        let kinds = legacy_kinds(generation);
        let kind = kinds[pick.index(kinds.len())];
        let entry = if kind.has_entry() { entry } else { 0 };

        let narrow_id = NarrowGuid::compose(kind, generation, entry, counter).unwrap();
        let wide = widen(narrow_id, kind, RealmId(realm));
        prop_assert_eq!(wide.kind(), Some(kind));
        prop_assert_eq!(wide.realm(), RealmId(realm));
        prop_assert_eq!(narrow(wide, generation).unwrap(), narrow_id);

        let detected = widen_detected(narrow_id, generation, RealmId(realm)).unwrap();
        prop_assert_eq!(detected, wide);
    }
}

#[test]
fn test_modern_only_kinds_never_narrow() {
    for kind in [
        HighGuidKind::AreaTrigger,
        HighGuidKind::SceneObject,
        HighGuidKind::Conversation,
    ] {
        let wide = WideGuid::new(kind, RealmId(1), 12, 34);
        for generation in LEGACY {
            let err = narrow(wide, generation).unwrap_err();
            assert!(matches!(err, BridgeError::DataLoss { .. }), "{kind:?} in {generation}");
        }
    }
}

#[test]
fn test_vehicle_only_narrows_in_wotlk() {
    let vehicle = WideGuid::new(HighGuidKind::Vehicle, RealmId(1), 100, 5);
    assert!(narrow(vehicle, Generation::Wotlk).is_ok());
    assert!(narrow(vehicle, Generation::Tbc).is_err());
}

#[test]
fn test_wide_counter_too_large_is_data_loss() {
    let player = WideGuid::new(HighGuidKind::Player, RealmId(1), 0, 1 << 48);
    assert!(matches!(
        narrow(player, Generation::Wotlk),
        Err(BridgeError::DataLoss { .. })
    ));

    let creature = WideGuid::new(HighGuidKind::Creature, RealmId(1), 7, 1 << 24);
    assert!(narrow(creature, Generation::Wotlk).is_err());
}

#[test]
fn test_empty_identifier_stays_empty() {
    let wide = widen(NarrowGuid::EMPTY, HighGuidKind::Player, RealmId(9));
    assert!(wide.is_empty());
    assert_eq!(narrow(WideGuid::EMPTY, Generation::Vanilla).unwrap(), NarrowGuid::EMPTY);
}

#[test]
fn test_unknown_high_type_reported() {
    let odd = NarrowGuid::new(0x7777_0000_0000_0001);
    let err = widen_detected(odd, Generation::Wotlk, RealmId(1)).unwrap_err();
    assert!(matches!(err, BridgeError::UnknownCode { code: 0x7777, .. }));
}

fn assert_injective<T: Canonical + std::hash::Hash>() {
    for generation in Generation::ALL {
        let table = T::native_table(generation);
        let distinct: HashSet<_> = table.iter().copied().collect();
        assert_eq!(distinct.len(), table.len(), "{} in {generation}", T::TABLE);
    }
}

#[test]
fn test_enum_tables_injective() {
    assert_injective::<ObjectKind>();
    assert_injective::<UpdateKind>();
}

#[test]
fn test_codes_round_trip_through_canonical() {
    for generation in Generation::ALL {
        for code in 0..ObjectKind::native_table(generation).len() as u32 {
            let kind: ObjectKind = EnumerationMapper::to_canonical(code, generation).unwrap();
            assert_eq!(EnumerationMapper::from_canonical(kind, generation).unwrap(), code);
        }
    }
}

#[test]
fn test_unmapped_code_is_an_error() {
    let err = EnumerationMapper::to_canonical::<ObjectKind>(200, Generation::Tbc).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnknownCode {
            table: "object kind",
            code: 200,
            ..
        }
    ));
}

#[test]
fn test_far_objects_become_out_of_range() {
    let kind: UpdateKind = EnumerationMapper::to_canonical(4, Generation::Wotlk).unwrap();
    assert_eq!(kind, UpdateKind::OutOfRangeObjects);
    assert_eq!(
        EnumerationMapper::from_canonical(UpdateKind::OutOfRangeObjects, Generation::ClassicEra)
            .unwrap(),
        3
    );
    assert!(EnumerationMapper::from_canonical(UpdateKind::NearObjects, Generation::ClassicEra).is_err());
}

#[test]
fn test_azerite_items_only_in_era_numbering() {
    assert!(EnumerationMapper::from_canonical(ObjectKind::AzeriteItem, Generation::ClassicEra).is_ok());
    assert!(EnumerationMapper::from_canonical(ObjectKind::AzeriteItem, Generation::ClassicWotlk).is_err());
    assert!(EnumerationMapper::from_canonical(ObjectKind::AreaTrigger, Generation::Wotlk).is_err());
}
