//! Canonical messages produced by the translation handlers.
//!
//! These structures carry the generation-independent meaning of a message:
//! wide identifiers, canonical enumerations and validated times. Encoders
//! turn them into a destination generation's layout.

use super::opcode::Opcode;
use crate::identity::{UpdateKind, WideGuid};
use crate::time::WowTime;

/// Number of glyph slots a modern talent group always carries.
pub const MAX_GLYPH_SLOTS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct EarnedAchievement {
    pub id: i32,
    pub date: WowTime,
    pub owner: WideGuid,
    pub virtual_realm: u32,
    pub native_realm: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaProgress {
    pub id: i32,
    pub quantity: i64,
    pub player: WideGuid,
    pub flags: u32,
    pub date: WowTime,
    pub time_from_start: i64,
    pub time_from_create: i64,
    pub raf_acceptance: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllAchievements {
    pub earned: Vec<EarnedAchievement>,
    pub progress: Vec<CriteriaProgress>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementEarned {
    pub sender: WideGuid,
    pub earner: WideGuid,
    pub id: i32,
    pub time: WowTime,
    pub native_realm: u32,
    pub virtual_realm: u32,
    pub initial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TalentEntry {
    pub id: u32,
    pub rank: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TalentGroup {
    pub spec_id: u8,
    pub talents: Vec<TalentEntry>,
    pub glyphs: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TalentData {
    pub unspent_points: u32,
    pub active_group: u8,
    pub groups: Vec<TalentGroup>,
}

/// One block of an object update. Only identifier-list blocks are modelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBlock {
    pub kind: UpdateKind,
    pub guids: Vec<WideGuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectUpdate {
    pub map_id: u16,
    pub blocks: Vec<UpdateBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpeed {
    pub server_time: WowTime,
    pub game_time: WowTime,
    pub speed: f32,
    pub holiday_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLogin {
    pub player: WideGuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnTalent {
    pub talent_id: u32,
    pub rank: u16,
}

/// Client accepting a talent reset offered by `master`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmRespecWipe {
    pub master: WideGuid,
    pub respec_type: u8,
}

/// Server offering a talent reset for `cost` copper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespecWipeConfirm {
    pub master: WideGuid,
    pub cost: u32,
    pub respec_type: i8,
}

/// Every message the bridge translates.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalMessage {
    PlayerLogin(PlayerLogin),
    LearnTalent(LearnTalent),
    ConfirmRespecWipe(ConfirmRespecWipe),
    LoginSetTimeSpeed(TimeSpeed),
    ObjectUpdate(ObjectUpdate),
    RespecWipeConfirm(RespecWipeConfirm),
    AchievementEarned(AchievementEarned),
    CriteriaUpdate(CriteriaProgress),
    AllAchievementData(AllAchievements),
    TalentData(TalentData),
}

impl CanonicalMessage {
    /// Opcode this message is sent under.
    pub fn opcode(&self) -> Opcode {
        match self {
            CanonicalMessage::PlayerLogin(_) => Opcode::PlayerLogin,
            CanonicalMessage::LearnTalent(_) => Opcode::LearnTalent,
            CanonicalMessage::ConfirmRespecWipe(_) => Opcode::ConfirmRespecWipe,
            CanonicalMessage::LoginSetTimeSpeed(_) => Opcode::LoginSetTimeSpeed,
            CanonicalMessage::ObjectUpdate(_) => Opcode::UpdateObject,
            CanonicalMessage::RespecWipeConfirm(_) => Opcode::RespecWipeConfirm,
            CanonicalMessage::AchievementEarned(_) => Opcode::AchievementEarned,
            CanonicalMessage::CriteriaUpdate(_) => Opcode::CriteriaUpdate,
            CanonicalMessage::AllAchievementData(_) => Opcode::AllAchievementData,
            CanonicalMessage::TalentData(_) => Opcode::TalentData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.opcode().name()
    }
}
