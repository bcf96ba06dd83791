//! Canonical opcodes and their native numbers per generation.
//!
//! Native numbering differs between every legacy and modern generation, and
//! some messages only exist in some generations (achievements arrived with
//! Wotlk). A message absent from a generation's table cannot be received
//! from, or sent to, that generation.

use super::generation::{Direction, Generation};
use std::fmt;

/// Messages the bridge knows how to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    PlayerLogin,
    LearnTalent,
    ConfirmRespecWipe,
    LoginSetTimeSpeed,
    UpdateObject,
    DestroyObject,
    RespecWipeConfirm,
    AchievementEarned,
    CriteriaUpdate,
    AllAchievementData,
    TalentData,
}

const VANILLA: &[(Opcode, u32)] = &[
    (Opcode::PlayerLogin, 0x03D),
    (Opcode::LoginSetTimeSpeed, 0x042),
    (Opcode::UpdateObject, 0x0A9),
    (Opcode::DestroyObject, 0x0AA),
    (Opcode::LearnTalent, 0x251),
    (Opcode::RespecWipeConfirm, 0x2AA),
    (Opcode::ConfirmRespecWipe, 0x2AA),
];

const WOTLK: &[(Opcode, u32)] = &[
    (Opcode::PlayerLogin, 0x03D),
    (Opcode::LoginSetTimeSpeed, 0x042),
    (Opcode::UpdateObject, 0x0A9),
    (Opcode::DestroyObject, 0x0AA),
    (Opcode::LearnTalent, 0x251),
    (Opcode::RespecWipeConfirm, 0x2AA),
    (Opcode::ConfirmRespecWipe, 0x2AA),
    (Opcode::AchievementEarned, 0x468),
    (Opcode::CriteriaUpdate, 0x46A),
    (Opcode::AllAchievementData, 0x47D),
    (Opcode::TalentData, 0x4C0),
];

const MODERN: &[(Opcode, u32)] = &[
    (Opcode::PlayerLogin, 0x35EA),
    (Opcode::LearnTalent, 0x3557),
    (Opcode::ConfirmRespecWipe, 0x3215),
    (Opcode::LoginSetTimeSpeed, 0x2704),
    (Opcode::UpdateObject, 0x27CA),
    (Opcode::RespecWipeConfirm, 0x261E),
    (Opcode::AchievementEarned, 0x2662),
    (Opcode::CriteriaUpdate, 0x26F9),
    (Opcode::AllAchievementData, 0x2570),
    (Opcode::TalentData, 0x25D0),
];

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::PlayerLogin,
        Opcode::LearnTalent,
        Opcode::ConfirmRespecWipe,
        Opcode::LoginSetTimeSpeed,
        Opcode::UpdateObject,
        Opcode::DestroyObject,
        Opcode::RespecWipeConfirm,
        Opcode::AchievementEarned,
        Opcode::CriteriaUpdate,
        Opcode::AllAchievementData,
        Opcode::TalentData,
    ];

    /// Which way this message travels.
    pub fn direction(self) -> Direction {
        match self {
            Opcode::PlayerLogin | Opcode::LearnTalent | Opcode::ConfirmRespecWipe => {
                Direction::ClientToServer
            }
            _ => Direction::ServerToClient,
        }
    }

    fn table(generation: Generation) -> &'static [(Opcode, u32)] {
        match generation {
            Generation::Vanilla | Generation::Tbc => VANILLA,
            Generation::Wotlk => WOTLK,
            Generation::ClassicEra | Generation::ClassicBcc | Generation::ClassicWotlk => MODERN,
        }
    }

    /// Native number of this message in `generation`.
    pub fn native(self, generation: Generation) -> Option<u32> {
        Self::table(generation)
            .iter()
            .find(|(opcode, _)| *opcode == self)
            .map(|(_, code)| *code)
    }

    /// Canonical opcode for a native number seen travelling in `direction`.
    ///
    /// Legacy talent wipe confirmation uses one number for both directions.
    pub fn from_native(generation: Generation, direction: Direction, code: u32) -> Option<Self> {
        Self::table(generation)
            .iter()
            .find(|(opcode, native)| *native == code && opcode.direction() == direction)
            .map(|(opcode, _)| *opcode)
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::PlayerLogin => "PlayerLogin",
            Opcode::LearnTalent => "LearnTalent",
            Opcode::ConfirmRespecWipe => "ConfirmRespecWipe",
            Opcode::LoginSetTimeSpeed => "LoginSetTimeSpeed",
            Opcode::UpdateObject => "UpdateObject",
            Opcode::DestroyObject => "DestroyObject",
            Opcode::RespecWipeConfirm => "RespecWipeConfirm",
            Opcode::AchievementEarned => "AchievementEarned",
            Opcode::CriteriaUpdate => "CriteriaUpdate",
            Opcode::AllAchievementData => "AllAchievementData",
            Opcode::TalentData => "TalentData",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
