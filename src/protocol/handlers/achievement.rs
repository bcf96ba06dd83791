//! Achievement and criteria messages from legacy servers.
//!
//! Legacy lists are not counted; each ends at an identifier of -1.

use super::widen_legacy;
use crate::core::PacketReader;
use crate::error::{BridgeError, Result};
use crate::protocol::context::HandlerContext;
use crate::protocol::message::{
    AchievementEarned, AllAchievements, CanonicalMessage, CriteriaProgress, EarnedAchievement,
};
use crate::time::WowTime;
use tracing::debug;

const LIST_END: i32 = -1;

/// Legacy criteria quantities travel as packed 64-bit values.
fn quantity(raw: u64) -> Result<i64> {
    i64::try_from(raw).map_err(|_| BridgeError::range("criteria quantity", i64::MAX))
}

/// Legacy flags and timers are consumed but not forwarded; modern clients
/// receive zero for each.
fn read_progress(
    reader: &mut PacketReader<'_>,
    ctx: &HandlerContext<'_>,
    id: i32,
) -> Result<CriteriaProgress> {
    let counter = reader.read_packed_guid64()?;
    let player = reader.read_packed_guid64()?;
    let _flags = reader.read_u32()?;
    let date = WowTime::new(reader.read_packed_time()?)?;
    let _time_from_start = reader.read_u32()?;
    let _time_from_create = reader.read_u32()?;

    Ok(CriteriaProgress {
        id,
        quantity: quantity(counter.raw())?,
        player: widen_legacy(ctx, player)?,
        flags: 0,
        date,
        time_from_start: 0,
        time_from_create: 0,
        raf_acceptance: None,
    })
}

pub fn handle_all_achievement_data(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let owner = ctx.session.player_or_empty();
    let realm = ctx.bridge.realm_address();
    let mut data = AllAchievements::default();

    let mut id = reader.read_i32()?;
    while id > LIST_END {
        let date = WowTime::new(reader.read_packed_time()?)?;
        data.earned.push(EarnedAchievement {
            id,
            date,
            owner,
            virtual_realm: realm,
            native_realm: realm,
        });
        id = reader.read_i32()?;
    }

    let mut id = reader.read_i32()?;
    while id > LIST_END {
        let progress = read_progress(reader, ctx, id)?;
        data.progress.push(progress);
        id = reader.read_i32()?;
    }

    debug!(
        earned = data.earned.len(),
        progress = data.progress.len(),
        "translated achievement data"
    );
    Ok(vec![CanonicalMessage::AllAchievementData(data)])
}

pub fn handle_achievement_earned(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let player = widen_legacy(ctx, reader.read_packed_guid64()?)?;
    let id = reader.read_i32()?;
    let time = WowTime::new(reader.read_packed_time()?)?;
    let _unused = reader.read_u32()?;
    let realm = ctx.bridge.realm_address();

    Ok(vec![CanonicalMessage::AchievementEarned(AchievementEarned {
        sender: player,
        earner: player,
        id,
        time,
        native_realm: realm,
        virtual_realm: realm,
        initial: false,
    })])
}

pub fn handle_criteria_update(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let id = reader.read_i32()?;
    let progress = read_progress(reader, ctx, id)?;
    Ok(vec![CanonicalMessage::CriteriaUpdate(progress)])
}
