//! # Enumeration Mapping
//!
//! Cross-generation enumerations are modelled once as a canonical value
//! set. Every generation owns a static, dense table from its native codes
//! to canonical values, indexed directly by the native code, and its
//! inverse, indexed by canonical ordinal and built at compile time.
//!
//! ```rust
//! use protocol_bridge::identity::enums::{EnumerationMapper, ObjectKind};
//! use protocol_bridge::protocol::generation::Generation;
//!
//! let kind: ObjectKind = EnumerationMapper::to_canonical(3, Generation::Wotlk).unwrap();
//! assert_eq!(kind, ObjectKind::Unit);
//! assert_eq!(EnumerationMapper::from_canonical(kind, Generation::ClassicEra).unwrap(), 5);
//! ```

use super::guid::HighGuidKind;
use crate::error::{BridgeError, Result};
use crate::protocol::generation::Generation;
use std::fmt::Debug;

/// A canonical enumeration with a native code table per generation.
pub trait Canonical: Copy + Eq + Debug + 'static {
    /// Table name used in error reports.
    const TABLE: &'static str;

    fn name(self) -> &'static str;

    /// Position of the value in the canonical set.
    fn ordinal(self) -> usize;

    /// Native codes of `generation`; position is the native code.
    fn native_table(generation: Generation) -> &'static [Self];

    /// Inverse of [`Canonical::native_table`]; position is the ordinal.
    fn native_codes(generation: Generation) -> &'static [Option<u32>];
}

/// Invert a native table into ordinal order.
macro_rules! native_codes {
    ($table:expr, $count:expr) => {{
        let table = &$table;
        let mut codes = [None; $count];
        let mut code = 0;
        while code < table.len() {
            codes[table[code] as usize] = Some(code as u32);
            code += 1;
        }
        codes
    }};
}

/// Canonical object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Object,
    Item,
    Container,
    AzeriteEmpoweredItem,
    AzeriteItem,
    Unit,
    Player,
    ActivePlayer,
    GameObject,
    DynamicObject,
    Corpse,
    AreaTrigger,
    SceneObject,
    Conversation,
}

const OBJECT_KINDS_LEGACY: [ObjectKind; 11] = [
    ObjectKind::Object,
    ObjectKind::Item,
    ObjectKind::Container,
    ObjectKind::Unit,
    ObjectKind::Player,
    ObjectKind::GameObject,
    ObjectKind::DynamicObject,
    ObjectKind::Corpse,
    ObjectKind::AreaTrigger,
    ObjectKind::SceneObject,
    ObjectKind::Conversation,
];

const OBJECT_KINDS_ERA: [ObjectKind; 14] = [
    ObjectKind::Object,
    ObjectKind::Item,
    ObjectKind::Container,
    ObjectKind::AzeriteEmpoweredItem,
    ObjectKind::AzeriteItem,
    ObjectKind::Unit,
    ObjectKind::Player,
    ObjectKind::ActivePlayer,
    ObjectKind::GameObject,
    ObjectKind::DynamicObject,
    ObjectKind::Corpse,
    ObjectKind::AreaTrigger,
    ObjectKind::SceneObject,
    ObjectKind::Conversation,
];

const OBJECT_KINDS_PROGRESSION: [ObjectKind; 12] = [
    ObjectKind::Object,
    ObjectKind::Item,
    ObjectKind::Container,
    ObjectKind::Unit,
    ObjectKind::Player,
    ObjectKind::ActivePlayer,
    ObjectKind::GameObject,
    ObjectKind::DynamicObject,
    ObjectKind::Corpse,
    ObjectKind::AreaTrigger,
    ObjectKind::SceneObject,
    ObjectKind::Conversation,
];

const OBJECT_CODES_LEGACY: [Option<u32>; ObjectKind::COUNT] =
    native_codes!(OBJECT_KINDS_LEGACY, ObjectKind::COUNT);
const OBJECT_CODES_ERA: [Option<u32>; ObjectKind::COUNT] =
    native_codes!(OBJECT_KINDS_ERA, ObjectKind::COUNT);
const OBJECT_CODES_PROGRESSION: [Option<u32>; ObjectKind::COUNT] =
    native_codes!(OBJECT_KINDS_PROGRESSION, ObjectKind::COUNT);

impl ObjectKind {
    pub const COUNT: usize = 14;

    /// Identifier kind used when widening a reference to this object.
    pub fn guid_kind(self) -> HighGuidKind {
        match self {
            ObjectKind::Object => HighGuidKind::Null,
            ObjectKind::Item
            | ObjectKind::Container
            | ObjectKind::AzeriteEmpoweredItem
            | ObjectKind::AzeriteItem => HighGuidKind::Item,
            ObjectKind::Unit => HighGuidKind::Creature,
            ObjectKind::Player | ObjectKind::ActivePlayer => HighGuidKind::Player,
            ObjectKind::GameObject => HighGuidKind::GameObject,
            ObjectKind::DynamicObject => HighGuidKind::DynamicObject,
            ObjectKind::Corpse => HighGuidKind::Corpse,
            ObjectKind::AreaTrigger => HighGuidKind::AreaTrigger,
            ObjectKind::SceneObject => HighGuidKind::SceneObject,
            ObjectKind::Conversation => HighGuidKind::Conversation,
        }
    }
}

impl Canonical for ObjectKind {
    const TABLE: &'static str = "object kind";

    fn name(self) -> &'static str {
        match self {
            ObjectKind::Object => "Object",
            ObjectKind::Item => "Item",
            ObjectKind::Container => "Container",
            ObjectKind::AzeriteEmpoweredItem => "AzeriteEmpoweredItem",
            ObjectKind::AzeriteItem => "AzeriteItem",
            ObjectKind::Unit => "Unit",
            ObjectKind::Player => "Player",
            ObjectKind::ActivePlayer => "ActivePlayer",
            ObjectKind::GameObject => "GameObject",
            ObjectKind::DynamicObject => "DynamicObject",
            ObjectKind::Corpse => "Corpse",
            ObjectKind::AreaTrigger => "AreaTrigger",
            ObjectKind::SceneObject => "SceneObject",
            ObjectKind::Conversation => "Conversation",
        }
    }

    fn ordinal(self) -> usize {
        self as usize
    }

    fn native_table(generation: Generation) -> &'static [Self] {
        match generation {
            Generation::Vanilla | Generation::Tbc | Generation::Wotlk => &OBJECT_KINDS_LEGACY,
            Generation::ClassicEra => &OBJECT_KINDS_ERA,
            Generation::ClassicBcc | Generation::ClassicWotlk => &OBJECT_KINDS_PROGRESSION,
        }
    }

    fn native_codes(generation: Generation) -> &'static [Option<u32>] {
        match generation {
            Generation::Vanilla | Generation::Tbc | Generation::Wotlk => &OBJECT_CODES_LEGACY,
            Generation::ClassicEra => &OBJECT_CODES_ERA,
            Generation::ClassicBcc | Generation::ClassicWotlk => &OBJECT_CODES_PROGRESSION,
        }
    }
}

/// Canonical update block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Values,
    Movement,
    CreateObject1,
    CreateObject2,
    OutOfRangeObjects,
    NearObjects,
}

const UPDATE_KINDS_LEGACY: [UpdateKind; 6] = [
    UpdateKind::Values,
    UpdateKind::Movement,
    UpdateKind::CreateObject1,
    UpdateKind::CreateObject2,
    UpdateKind::OutOfRangeObjects,
    UpdateKind::NearObjects,
];

const UPDATE_KINDS_MODERN: [UpdateKind; 4] = [
    UpdateKind::Values,
    UpdateKind::CreateObject1,
    UpdateKind::CreateObject2,
    UpdateKind::OutOfRangeObjects,
];

const UPDATE_CODES_LEGACY: [Option<u32>; UpdateKind::COUNT] =
    native_codes!(UPDATE_KINDS_LEGACY, UpdateKind::COUNT);
const UPDATE_CODES_MODERN: [Option<u32>; UpdateKind::COUNT] =
    native_codes!(UPDATE_KINDS_MODERN, UpdateKind::COUNT);

impl UpdateKind {
    pub const COUNT: usize = 6;
}

impl Canonical for UpdateKind {
    const TABLE: &'static str = "update kind";

    fn name(self) -> &'static str {
        match self {
            UpdateKind::Values => "Values",
            UpdateKind::Movement => "Movement",
            UpdateKind::CreateObject1 => "CreateObject1",
            UpdateKind::CreateObject2 => "CreateObject2",
            UpdateKind::OutOfRangeObjects => "OutOfRangeObjects",
            UpdateKind::NearObjects => "NearObjects",
        }
    }

    fn ordinal(self) -> usize {
        self as usize
    }

    fn native_table(generation: Generation) -> &'static [Self] {
        if generation.is_legacy() {
            &UPDATE_KINDS_LEGACY
        } else {
            &UPDATE_KINDS_MODERN
        }
    }

    fn native_codes(generation: Generation) -> &'static [Option<u32>] {
        if generation.is_legacy() {
            &UPDATE_CODES_LEGACY
        } else {
            &UPDATE_CODES_MODERN
        }
    }
}

/// Stateless lookups over the static tables.
pub struct EnumerationMapper;

impl EnumerationMapper {
    pub fn to_canonical<T: Canonical>(code: u32, generation: Generation) -> Result<T> {
        usize::try_from(code)
            .ok()
            .and_then(|index| T::native_table(generation).get(index).copied())
            .ok_or(BridgeError::UnknownCode {
                table: T::TABLE,
                generation,
                code,
            })
    }

    pub fn from_canonical<T: Canonical>(value: T, generation: Generation) -> Result<u32> {
        T::native_codes(generation)
            .get(value.ordinal())
            .copied()
            .flatten()
            .ok_or(BridgeError::NoNativeCode {
                table: T::TABLE,
                generation,
                canonical: value.name(),
            })
    }
}
