//! Translation handlers.
//!
//! Each handler reads one native layout and returns canonical messages.
//! Legacy generations register their server messages, modern generations
//! their client messages; [`install`] wires whichever of them a generation
//! actually has an opcode for.

pub mod achievement;
pub mod login;
pub mod object;
pub mod talent;

use super::context::HandlerContext;
use super::dispatcher::DispatcherBuilder;
use super::generation::{Direction, Generation};
use super::message::CanonicalMessage;
use super::opcode::Opcode;
use crate::core::PacketReader;
use crate::error::Result;
use crate::identity::{widen_detected, NarrowGuid, WideGuid};

type Handler = fn(&mut PacketReader<'_>, &mut HandlerContext<'_>) -> Result<Vec<CanonicalMessage>>;

const LEGACY_HANDLERS: &[(Opcode, Handler)] = &[
    (Opcode::AllAchievementData, achievement::handle_all_achievement_data),
    (Opcode::AchievementEarned, achievement::handle_achievement_earned),
    (Opcode::CriteriaUpdate, achievement::handle_criteria_update),
    (Opcode::TalentData, talent::handle_talent_data),
    (Opcode::RespecWipeConfirm, talent::handle_respec_wipe_confirm),
    (Opcode::DestroyObject, object::handle_destroy_object),
    (Opcode::UpdateObject, object::handle_update_object),
    (Opcode::LoginSetTimeSpeed, login::handle_login_set_time_speed),
];

const MODERN_HANDLERS: &[(Opcode, Handler)] = &[
    (Opcode::PlayerLogin, login::handle_player_login),
    (Opcode::ConfirmRespecWipe, talent::handle_confirm_respec_wipe),
    (Opcode::LearnTalent, talent::handle_learn_talent),
];

/// Register every built-in handler `generation` has an opcode for.
pub fn install(mut builder: DispatcherBuilder, generation: Generation) -> Result<DispatcherBuilder> {
    let (handlers, direction) = if generation.is_legacy() {
        (LEGACY_HANDLERS, Direction::ServerToClient)
    } else {
        (MODERN_HANDLERS, Direction::ClientToServer)
    };

    for &(opcode, handler) in handlers {
        debug_assert_eq!(opcode.direction(), direction);
        if opcode.native(generation).is_some() {
            builder = builder.register(generation, opcode, handler)?;
        }
    }
    Ok(builder)
}

/// Widen a legacy identifier read from the message being handled.
pub(crate) fn widen_legacy(ctx: &HandlerContext<'_>, guid: NarrowGuid) -> Result<WideGuid> {
    widen_detected(guid, ctx.source, ctx.bridge.realm_id())
}
