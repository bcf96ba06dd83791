//! Narrow (64-bit) and wide (128-bit) object identifiers.
//!
//! ```text
//! narrow, no entry:  [high(16)] [counter(48)]
//! narrow, entry:     [high(16)] [entry(24)] [counter(24)]
//!
//! wide high:         [type(6)] [realm(16)] [entry(36)] [subtype(6)]
//! wide low:          [counter(64)]
//! ```
//!
//! Widening never fails. Narrowing fails with [`BridgeError::DataLoss`]
//! whenever the legacy form cannot hold the identifier exactly.

use crate::error::{constants, BridgeError, Result};
use crate::protocol::generation::Generation;
use std::fmt;

const NARROW_COUNTER_BITS: u32 = 48;
const NARROW_ENTRY_COUNTER_BITS: u32 = 24;
const NARROW_ENTRY_BITS: u32 = 24;

const WIDE_TYPE_SHIFT: u32 = 58;
const WIDE_REALM_SHIFT: u32 = 42;
const WIDE_ENTRY_SHIFT: u32 = 6;
const WIDE_ENTRY_MASK: u64 = (1 << 36) - 1;
const WIDE_SUBTYPE_MASK: u64 = 0x3F;

const fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Canonical identifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighGuidKind {
    Null,
    Player,
    Item,
    Transport,
    MoTransport,
    Conversation,
    Creature,
    Vehicle,
    Pet,
    GameObject,
    DynamicObject,
    AreaTrigger,
    Corpse,
    SceneObject,
}

impl HighGuidKind {
    pub const ALL: [HighGuidKind; 14] = [
        HighGuidKind::Null,
        HighGuidKind::Player,
        HighGuidKind::Item,
        HighGuidKind::Transport,
        HighGuidKind::MoTransport,
        HighGuidKind::Conversation,
        HighGuidKind::Creature,
        HighGuidKind::Vehicle,
        HighGuidKind::Pet,
        HighGuidKind::GameObject,
        HighGuidKind::DynamicObject,
        HighGuidKind::AreaTrigger,
        HighGuidKind::Corpse,
        HighGuidKind::SceneObject,
    ];

    /// Type code and subtype stored in the wide high part.
    fn wide_code(self) -> (u64, u64) {
        match self {
            HighGuidKind::Null => (0, 0),
            HighGuidKind::Player => (2, 0),
            HighGuidKind::Item => (3, 0),
            HighGuidKind::Transport => (6, 0),
            HighGuidKind::MoTransport => (6, 1),
            HighGuidKind::Conversation => (7, 0),
            HighGuidKind::Creature => (8, 0),
            HighGuidKind::Vehicle => (9, 0),
            HighGuidKind::Pet => (10, 0),
            HighGuidKind::GameObject => (11, 0),
            HighGuidKind::DynamicObject => (12, 0),
            HighGuidKind::AreaTrigger => (13, 0),
            HighGuidKind::Corpse => (14, 0),
            HighGuidKind::SceneObject => (16, 0),
        }
    }

    /// High 16 bits of the narrow form, if `generation` has one.
    pub fn legacy_high(self, generation: Generation) -> Option<u16> {
        match self {
            HighGuidKind::Player => Some(0x0000),
            HighGuidKind::Item => Some(0x4000),
            HighGuidKind::GameObject => Some(0xF110),
            HighGuidKind::Transport => Some(0xF120),
            HighGuidKind::Creature => Some(0xF130),
            HighGuidKind::Pet => Some(0xF140),
            HighGuidKind::Vehicle if generation == Generation::Wotlk => Some(0xF150),
            HighGuidKind::DynamicObject => Some(0xF100),
            HighGuidKind::Corpse => Some(0xF101),
            HighGuidKind::MoTransport => Some(0x1FC0),
            _ => None,
        }
    }

    /// Whether the narrow form splits its low bits into entry and counter.
    pub fn has_entry(self) -> bool {
        matches!(
            self,
            HighGuidKind::GameObject
                | HighGuidKind::Transport
                | HighGuidKind::Creature
                | HighGuidKind::Pet
                | HighGuidKind::Vehicle
        )
    }
}

/// Realm identifier carried in wide identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RealmId(pub u16);

impl RealmId {
    /// The low 16 bits of a virtual realm address name the realm.
    pub fn from_address(address: u32) -> Self {
        RealmId((address & 0xFFFF) as u16)
    }
}

/// 64-bit legacy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NarrowGuid(u64);

impl NarrowGuid {
    pub const EMPTY: NarrowGuid = NarrowGuid(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn high(self) -> u16 {
        (self.0 >> 48) as u16
    }

    /// Build a narrow identifier, failing if a part exceeds its width.
    pub fn compose(
        kind: HighGuidKind,
        generation: Generation,
        entry: u32,
        counter: u64,
    ) -> Result<Self> {
        let high = kind.legacy_high(generation).ok_or(BridgeError::DataLoss {
            reason: constants::ERR_KIND_NOT_IN_GENERATION,
        })?;
        let high = u64::from(high) << 48;

        if kind.has_entry() {
            if counter > mask(NARROW_ENTRY_COUNTER_BITS) {
                return Err(BridgeError::DataLoss {
                    reason: constants::ERR_COUNTER_TOO_WIDE,
                });
            }
            if u64::from(entry) > mask(NARROW_ENTRY_BITS) {
                return Err(BridgeError::DataLoss {
                    reason: constants::ERR_ENTRY_TOO_WIDE,
                });
            }
            Ok(Self(high | (u64::from(entry) << NARROW_ENTRY_COUNTER_BITS) | counter))
        } else {
            if counter > mask(NARROW_COUNTER_BITS) {
                return Err(BridgeError::DataLoss {
                    reason: constants::ERR_COUNTER_TOO_WIDE,
                });
            }
            Ok(Self(high | counter))
        }
    }

    /// Identifier kind according to the legacy high bits.
    pub fn kind(self, generation: Generation) -> Option<HighGuidKind> {
        if self.is_empty() {
            return Some(HighGuidKind::Null);
        }
        let high = self.high();
        HighGuidKind::ALL
            .into_iter()
            .find(|kind| kind.legacy_high(generation) == Some(high))
    }

    pub fn entry(self, kind: HighGuidKind) -> u32 {
        if kind.has_entry() {
            ((self.0 >> NARROW_ENTRY_COUNTER_BITS) & mask(NARROW_ENTRY_BITS)) as u32
        } else {
            0
        }
    }

    pub fn counter(self, kind: HighGuidKind) -> u64 {
        if kind.has_entry() {
            self.0 & mask(NARROW_ENTRY_COUNTER_BITS)
        } else {
            self.0 & mask(NARROW_COUNTER_BITS)
        }
    }
}

impl fmt::Display for NarrowGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

/// 128-bit modern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WideGuid {
    high: u64,
    low: u64,
}

impl WideGuid {
    pub const EMPTY: WideGuid = WideGuid { high: 0, low: 0 };

    pub const fn from_parts(low: u64, high: u64) -> Self {
        Self { high, low }
    }

    /// Assemble from parts. `entry` is truncated to its 36-bit field.
    pub fn new(kind: HighGuidKind, realm: RealmId, entry: u64, counter: u64) -> Self {
        if kind == HighGuidKind::Null {
            return Self::EMPTY;
        }
        let (code, subtype) = kind.wide_code();
        let high = (code << WIDE_TYPE_SHIFT)
            | (u64::from(realm.0) << WIDE_REALM_SHIFT)
            | ((entry & WIDE_ENTRY_MASK) << WIDE_ENTRY_SHIFT)
            | (subtype & WIDE_SUBTYPE_MASK);
        Self { high, low: counter }
    }

    pub fn low(self) -> u64 {
        self.low
    }

    pub fn high(self) -> u64 {
        self.high
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    pub fn kind(self) -> Option<HighGuidKind> {
        if self.is_empty() {
            return Some(HighGuidKind::Null);
        }
        let code = (self.high >> WIDE_TYPE_SHIFT, self.high & WIDE_SUBTYPE_MASK);
        HighGuidKind::ALL
            .into_iter()
            .filter(|kind| *kind != HighGuidKind::Null)
            .find(|kind| kind.wide_code() == code)
    }

    pub fn realm(self) -> RealmId {
        RealmId(((self.high >> WIDE_REALM_SHIFT) & 0xFFFF) as u16)
    }

    pub fn entry(self) -> u64 {
        (self.high >> WIDE_ENTRY_SHIFT) & WIDE_ENTRY_MASK
    }

    pub fn counter(self) -> u64 {
        self.low
    }
}

impl fmt::Display for WideGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}{:016X}", self.high, self.low)
    }
}

/// Expand a narrow identifier of the given kind into wide form.
pub fn widen(narrow: NarrowGuid, kind: HighGuidKind, realm: RealmId) -> WideGuid {
    if narrow.is_empty() {
        return WideGuid::EMPTY;
    }
    WideGuid::new(
        kind,
        realm,
        u64::from(narrow.entry(kind)),
        narrow.counter(kind),
    )
}

/// Widen using the kind named by the narrow identifier's own high bits.
pub fn widen_detected(
    narrow: NarrowGuid,
    generation: Generation,
    realm: RealmId,
) -> Result<WideGuid> {
    let kind = narrow.kind(generation).ok_or(BridgeError::UnknownCode {
        table: "guid high type",
        generation,
        code: u32::from(narrow.high()),
    })?;
    Ok(widen(narrow, kind, realm))
}

/// Collapse a wide identifier into the narrow form of `generation`.
pub fn narrow(wide: WideGuid, generation: Generation) -> Result<NarrowGuid> {
    if wide.is_empty() {
        return Ok(NarrowGuid::EMPTY);
    }
    let kind = wide.kind().ok_or(BridgeError::DataLoss {
        reason: constants::ERR_KIND_NOT_IN_GENERATION,
    })?;
    let entry = u32::try_from(wide.entry()).map_err(|_| BridgeError::DataLoss {
        reason: constants::ERR_ENTRY_TOO_WIDE,
    })?;
    if !kind.has_entry() && entry != 0 {
        return Err(BridgeError::DataLoss {
            reason: constants::ERR_ENTRY_TOO_WIDE,
        });
    }
    NarrowGuid::compose(kind, generation, entry, wide.counter())
}
