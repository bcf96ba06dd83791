//! World login messages.

use crate::core::PacketReader;
use crate::error::Result;
use crate::protocol::context::HandlerContext;
use crate::protocol::generation::Generation;
use crate::protocol::message::{CanonicalMessage, PlayerLogin, TimeSpeed};
use crate::time::{RealmTime, WowTime};
use tracing::{debug, info};

/// Modern client entering the world. Records the chosen player.
pub fn handle_player_login(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let player = reader.read_packed_guid128()?;
    let far_clip = reader.read_f32()?;

    info!(%player, far_clip, "player entering world");
    ctx.session.current_player = Some(player);
    Ok(vec![CanonicalMessage::PlayerLogin(PlayerLogin { player })])
}

/// Legacy game clock announcement. The packed game time is realm-local;
/// the server time is the same instant in UTC.
pub fn handle_login_set_time_speed(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let game_time = WowTime::new(reader.read_packed_time()?)?;
    let speed = reader.read_f32()?;
    let holiday_offset = if ctx.source == Generation::Vanilla {
        0
    } else {
        reader.read_u32()?
    };

    let server = RealmTime::from_wow_time(game_time)?.to_server(ctx.bridge.timezone())?;
    let server_time = WowTime::from_civil(server.value())?;
    debug!(game_time = game_time.raw(), speed, "game clock announced");

    Ok(vec![CanonicalMessage::LoginSetTimeSpeed(TimeSpeed {
        server_time,
        game_time,
        speed,
        holiday_offset,
    })])
}
