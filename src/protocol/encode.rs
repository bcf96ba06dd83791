//! Canonical message encoders.
//!
//! The modern encoder writes server messages for modern clients; the legacy
//! encoder writes client messages for legacy servers. Either returns a
//! per-message error for anything it has no layout or native code for.

use super::generation::Generation;
use super::message::{
    AchievementEarned, AllAchievements, CanonicalMessage, CriteriaProgress, EarnedAchievement,
    ObjectUpdate, TalentData, TimeSpeed, MAX_GLYPH_SLOTS,
};
use crate::core::{Frame, PacketWriter};
use crate::error::{constants, BridgeError, Result};
use crate::identity::{narrow, EnumerationMapper, UpdateKind};

/// Turns canonical messages into frames of one generation.
pub trait MessageEncoder: Send + Sync {
    fn generation(&self) -> Generation;

    fn encode(&self, message: &CanonicalMessage) -> Result<Frame>;

    /// Native opcode for `message`, or an error if the generation lacks it.
    fn opcode_for(&self, message: &CanonicalMessage) -> Result<u32> {
        message
            .opcode()
            .native(self.generation())
            .ok_or(BridgeError::NoLayout(message.name(), constants::ERR_NO_LAYOUT))
    }
}

/// Build the encoder writing in `generation`'s layouts.
pub fn encoder_for(generation: Generation) -> Box<dyn MessageEncoder> {
    if generation.is_legacy() {
        Box::new(LegacyEncoder::new(generation))
    } else {
        Box::new(ModernEncoder::new(generation))
    }
}

/// Server messages in modern layouts.
#[derive(Debug, Clone, Copy)]
pub struct ModernEncoder {
    generation: Generation,
}

impl ModernEncoder {
    pub fn new(generation: Generation) -> Self {
        Self { generation }
    }

    fn write_earned(w: &mut PacketWriter, earned: &EarnedAchievement) {
        w.write_i32(earned.id);
        w.write_i32(earned.date.raw());
        w.write_packed_guid128(earned.owner);
        w.write_u32(earned.virtual_realm);
        w.write_u32(earned.native_realm);
    }

    fn write_progress(w: &mut PacketWriter, progress: &CriteriaProgress) {
        w.write_i32(progress.id);
        w.write_i64(progress.quantity);
        w.write_packed_guid128(progress.player);
        w.write_u32(0);
        w.write_u32(progress.flags);
        w.write_i32(progress.date.raw());
        w.write_i64(progress.time_from_start);
        w.write_i64(progress.time_from_create);
        w.write_bit(progress.raf_acceptance.is_some());
        w.flush_bits();
        if let Some(raf) = progress.raf_acceptance {
            w.write_i64(raf);
        }
    }

    fn write_all_achievements(w: &mut PacketWriter, data: &AllAchievements) -> Result<()> {
        w.write_i32(count(data.earned.len())?);
        w.write_i32(count(data.progress.len())?);
        for earned in &data.earned {
            Self::write_earned(w, earned);
        }
        for progress in &data.progress {
            Self::write_progress(w, progress);
        }
        Ok(())
    }

    fn write_achievement_earned(w: &mut PacketWriter, earned: &AchievementEarned) {
        w.write_packed_guid128(earned.sender);
        w.write_packed_guid128(earned.earner);
        w.write_i32(earned.id);
        w.write_i32(earned.time.raw());
        w.write_u32(earned.native_realm);
        w.write_u32(earned.virtual_realm);
        w.write_bit(earned.initial);
        w.flush_bits();
    }

    fn write_talents(w: &mut PacketWriter, data: &TalentData) -> Result<()> {
        w.write_i32(i32::try_from(data.unspent_points)
            .map_err(|_| BridgeError::range("unspent talent points", i64::from(data.unspent_points)))?);
        w.write_u8(data.active_group);
        w.write_i32(count(data.groups.len())?);

        for group in &data.groups {
            if group.glyphs.len() > MAX_GLYPH_SLOTS {
                return Err(BridgeError::range("glyph count", count(group.glyphs.len())?));
            }
            let talents = u8::try_from(group.talents.len())
                .map_err(|_| BridgeError::range("talent count", count(group.talents.len()).unwrap_or(i32::MAX)))?;

            w.write_u8(talents);
            w.write_u32(u32::from(talents));
            w.write_u8(MAX_GLYPH_SLOTS as u8);
            w.write_u32(MAX_GLYPH_SLOTS as u32);
            w.write_u8(group.spec_id);
            for talent in &group.talents {
                w.write_i32(talent.id as i32);
                w.write_u8(talent.rank);
            }
            for slot in 0..MAX_GLYPH_SLOTS {
                w.write_u16(group.glyphs.get(slot).copied().unwrap_or(0));
            }
        }

        w.write_bit(false); // pet talents
        w.flush_bits();
        Ok(())
    }

    fn write_object_update(&self, w: &mut PacketWriter, update: &ObjectUpdate) -> Result<()> {
        let mut out_of_range = Vec::new();
        for block in &update.blocks {
            EnumerationMapper::from_canonical(block.kind, self.generation)?;
            if block.kind != UpdateKind::OutOfRangeObjects {
                return Err(BridgeError::NoLayout(
                    "UpdateObject",
                    constants::ERR_UNSUPPORTED_BLOCK,
                ));
            }
            out_of_range.extend_from_slice(&block.guids);
        }

        w.write_u32(0); // object blocks
        w.write_u16(update.map_id);
        w.write_bit(!out_of_range.is_empty());
        w.flush_bits();
        if !out_of_range.is_empty() {
            w.write_u16(0); // destroyed
            w.write_i32(count(out_of_range.len())?);
            for guid in out_of_range {
                w.write_packed_guid128(guid);
            }
        }
        w.write_u32(0); // object data size
        Ok(())
    }

    fn write_time_speed(w: &mut PacketWriter, speed: &TimeSpeed) {
        w.write_i32(speed.server_time.raw());
        w.write_i32(speed.game_time.raw());
        w.write_f32(speed.speed);
        w.write_u32(speed.holiday_offset);
        w.write_u32(speed.holiday_offset);
    }
}

impl MessageEncoder for ModernEncoder {
    fn generation(&self) -> Generation {
        self.generation
    }

    fn encode(&self, message: &CanonicalMessage) -> Result<Frame> {
        let opcode = self.opcode_for(message)?;
        let mut w = PacketWriter::new();

        match message {
            CanonicalMessage::AllAchievementData(data) => Self::write_all_achievements(&mut w, data)?,
            CanonicalMessage::AchievementEarned(earned) => {
                Self::write_achievement_earned(&mut w, earned)
            }
            CanonicalMessage::CriteriaUpdate(progress) => Self::write_progress(&mut w, progress),
            CanonicalMessage::TalentData(data) => Self::write_talents(&mut w, data)?,
            CanonicalMessage::ObjectUpdate(update) => self.write_object_update(&mut w, update)?,
            CanonicalMessage::LoginSetTimeSpeed(speed) => Self::write_time_speed(&mut w, speed),
            CanonicalMessage::RespecWipeConfirm(offer) => {
                w.write_i8(offer.respec_type);
                w.write_u32(offer.cost);
                w.write_packed_guid128(offer.master);
            }
            CanonicalMessage::PlayerLogin(_)
            | CanonicalMessage::LearnTalent(_)
            | CanonicalMessage::ConfirmRespecWipe(_) => {
                return Err(BridgeError::NoLayout(message.name(), constants::ERR_NO_LAYOUT))
            }
        }

        Ok(Frame::new(opcode, w.into_bytes()))
    }
}

/// Client messages in legacy layouts.
#[derive(Debug, Clone, Copy)]
pub struct LegacyEncoder {
    generation: Generation,
}

impl LegacyEncoder {
    pub fn new(generation: Generation) -> Self {
        Self { generation }
    }
}

impl MessageEncoder for LegacyEncoder {
    fn generation(&self) -> Generation {
        self.generation
    }

    fn encode(&self, message: &CanonicalMessage) -> Result<Frame> {
        let opcode = self.opcode_for(message)?;
        let mut w = PacketWriter::new();

        match message {
            CanonicalMessage::PlayerLogin(login) => {
                w.write_guid64(narrow(login.player, self.generation)?);
            }
            CanonicalMessage::ConfirmRespecWipe(confirm) => {
                w.write_guid64(narrow(confirm.master, self.generation)?);
            }
            CanonicalMessage::LearnTalent(learn) => {
                w.write_u32(learn.talent_id);
                w.write_u32(u32::from(learn.rank));
            }
            _ => return Err(BridgeError::NoLayout(message.name(), constants::ERR_NO_LAYOUT)),
        }

        Ok(Frame::new(opcode, w.into_bytes()))
    }
}

fn count(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| BridgeError::range("element count", i64::MAX))
}
