//! Talent data, talent learning and talent reset messages.

use super::widen_legacy;
use crate::core::PacketReader;
use crate::error::{constants, BridgeError, Result};
use crate::identity::{narrow, WideGuid};
use crate::protocol::context::HandlerContext;
use crate::protocol::message::{
    CanonicalMessage, ConfirmRespecWipe, LearnTalent, RespecWipeConfirm, TalentData, TalentEntry,
    TalentGroup,
};
use tracing::warn;

/// Respec type of a talent reset.
const RESPEC_TALENTS: i8 = 0;

/// Legacy talent data. Pet talents are not translated.
pub fn handle_talent_data(
    reader: &mut PacketReader<'_>,
    _ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    if reader.read_u8()? != 0 {
        return Err(BridgeError::NoLayout("TalentData", constants::ERR_PET_TALENTS));
    }

    let unspent_points = reader.read_u32()?;
    let group_count = reader.read_u8()?;
    let active_group = reader.read_u8()?;

    let mut data = TalentData {
        unspent_points,
        active_group,
        groups: Vec::with_capacity(usize::from(group_count)),
    };

    for spec_id in 0..group_count {
        let talent_count = reader.read_u8()?;
        let mut talents = Vec::with_capacity(usize::from(talent_count));
        for _ in 0..talent_count {
            let id = reader.read_u32()?;
            let rank = reader.read_u8()?;
            talents.push(TalentEntry { id, rank });
        }

        let glyph_count = reader.read_u8()?;
        let glyphs = (0..glyph_count)
            .map(|_| reader.read_u16())
            .collect::<Result<Vec<_>>>()?;

        data.groups.push(TalentGroup {
            spec_id,
            talents,
            glyphs,
        });
    }

    Ok(vec![CanonicalMessage::TalentData(data)])
}

/// Legacy talent reset offer: trainer identifier and cost.
pub fn handle_respec_wipe_confirm(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let master = widen_legacy(ctx, reader.read_guid64()?)?;
    let cost = reader.read_u32()?;
    Ok(vec![CanonicalMessage::RespecWipeConfirm(RespecWipeConfirm {
        master,
        cost,
        respec_type: RESPEC_TALENTS,
    })])
}

/// Modern client accepting a reset.
///
/// A trainer the legacy server cannot name is replaced by the empty
/// identifier; the legacy server then resolves the trainer itself.
pub fn handle_confirm_respec_wipe(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let wide = reader.read_packed_guid128()?;
    let respec_type = reader.read_u8()?;

    let master = match narrow(wide, ctx.bridge.legacy()) {
        Ok(_) => wide,
        Err(BridgeError::DataLoss { reason }) => {
            warn!(guid = %wide, reason, "respec trainer not representable, sending empty identifier");
            WideGuid::EMPTY
        }
        Err(err) => return Err(err),
    };

    Ok(vec![CanonicalMessage::ConfirmRespecWipe(ConfirmRespecWipe {
        master,
        respec_type,
    })])
}

pub fn handle_learn_talent(
    reader: &mut PacketReader<'_>,
    _ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let talent_id = reader.read_i32()?;
    let rank = reader.read_u16()?;
    let talent_id =
        u32::try_from(talent_id).map_err(|_| BridgeError::range("talent id", talent_id))?;
    Ok(vec![CanonicalMessage::LearnTalent(LearnTalent { talent_id, rank })])
}
