//! Object visibility messages from legacy servers.
//!
//! Modern clients have no destroy message; a destroyed object is reported
//! as leaving range instead.

use super::widen_legacy;
use crate::core::PacketReader;
use crate::error::{constants, BridgeError, Result};
use crate::identity::{EnumerationMapper, UpdateKind};
use crate::protocol::context::HandlerContext;
use crate::protocol::generation::Generation;
use crate::protocol::message::{CanonicalMessage, ObjectUpdate, UpdateBlock};
use tracing::trace;

pub fn handle_destroy_object(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let guid = widen_legacy(ctx, reader.read_guid64()?)?;
    if ctx.source == Generation::Wotlk {
        let on_death = reader.read_bool()?;
        trace!(%guid, on_death, "object destroyed");
    }

    Ok(vec![CanonicalMessage::ObjectUpdate(ObjectUpdate {
        map_id: 0,
        blocks: vec![UpdateBlock {
            kind: UpdateKind::OutOfRangeObjects,
            guids: vec![guid],
        }],
    })])
}

/// Legacy object update. Only identifier-list blocks are translated;
/// a block carrying object fields drops the whole message.
pub fn handle_update_object(
    reader: &mut PacketReader<'_>,
    ctx: &mut HandlerContext<'_>,
) -> Result<Vec<CanonicalMessage>> {
    let block_count = reader.read_u32()?;
    if matches!(ctx.source, Generation::Vanilla | Generation::Tbc) {
        let _has_transport = reader.read_u8()?;
    }

    let mut update = ObjectUpdate::default();
    for _ in 0..block_count {
        let kind: UpdateKind = EnumerationMapper::to_canonical(u32::from(reader.read_u8()?), ctx.source)?;
        match kind {
            UpdateKind::OutOfRangeObjects | UpdateKind::NearObjects => {
                let count = reader.read_u32()?;
                let guids = (0..count)
                    .map(|_| widen_legacy(ctx, reader.read_packed_guid64()?))
                    .collect::<Result<Vec<_>>>()?;
                update.blocks.push(UpdateBlock { kind, guids });
            }
            _ => {
                return Err(BridgeError::NoLayout(
                    "UpdateObject",
                    constants::ERR_UNSUPPORTED_BLOCK,
                ))
            }
        }
    }

    Ok(vec![CanonicalMessage::ObjectUpdate(update)])
}
