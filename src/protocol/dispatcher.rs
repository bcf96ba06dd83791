//! Opcode dispatch.
//!
//! The table maps `(generation, native opcode)` to a handler. It is built
//! once with [`DispatcherBuilder`], then shared read-only by every
//! connection, so lookups take no lock.

use super::context::HandlerContext;
use super::generation::Generation;
use super::handlers;
use super::message::CanonicalMessage;
use super::opcode::Opcode;
use crate::core::{Frame, PacketReader};
use crate::error::{BridgeError, Result};
use crate::utils::DropReason;
use std::collections::HashMap;
use tracing::{error, trace, warn};

/// Signature shared by every translation handler.
pub type HandlerFn = dyn Fn(&mut PacketReader<'_>, &mut HandlerContext<'_>) -> Result<Vec<CanonicalMessage>>
    + Send
    + Sync
    + 'static;

/// Outcome of dispatching one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The handler produced these canonical messages.
    Translated(Vec<CanonicalMessage>),
    /// The message was discarded; the connection continues.
    Dropped(DropReason),
}

/// Collects handler registrations.
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<(Generation, u32), Box<HandlerFn>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `opcode` as received from `generation`.
    ///
    /// Fails if the generation has no number for the opcode or the number
    /// is already taken.
    pub fn register<F>(mut self, generation: Generation, opcode: Opcode, handler: F) -> Result<Self>
    where
        F: Fn(&mut PacketReader<'_>, &mut HandlerContext<'_>) -> Result<Vec<CanonicalMessage>>
            + Send
            + Sync
            + 'static,
    {
        let code = opcode.native(generation).ok_or(BridgeError::NoNativeCode {
            table: "opcode",
            generation,
            canonical: opcode.name(),
        })?;
        if self.handlers.contains_key(&(generation, code)) {
            return Err(BridgeError::Config(format!(
                "duplicate handler for {opcode} ({code:#x}) in {generation}"
            )));
        }
        self.handlers.insert((generation, code), Box::new(handler));
        Ok(self)
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            handlers: self.handlers,
        }
    }
}

/// Read-only dispatch table.
pub struct Dispatcher {
    handlers: HashMap<(Generation, u32), Box<HandlerFn>>,
}

impl Dispatcher {
    /// Table with every built-in handler for every supported generation.
    pub fn standard() -> Result<Self> {
        let mut builder = DispatcherBuilder::new();
        for generation in Generation::ALL {
            builder = handlers::install(builder, generation)?;
        }
        Ok(builder.build())
    }

    pub fn is_registered(&self, generation: Generation, code: u32) -> bool {
        self.handlers.contains_key(&(generation, code))
    }

    /// Native opcodes with a handler for `generation`, ascending.
    pub fn opcodes(&self, generation: Generation) -> Vec<u32> {
        let mut codes: Vec<u32> = self
            .handlers
            .keys()
            .filter(|(g, _)| *g == generation)
            .map(|(_, code)| *code)
            .collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler for `frame`.
    ///
    /// Unknown opcodes and non-fatal handler errors become
    /// [`Dispatch::Dropped`] with a single warning; fatal errors propagate.
    pub fn dispatch(&self, frame: &Frame, ctx: &mut HandlerContext<'_>) -> Result<Dispatch> {
        let generation = ctx.source;
        let metrics = ctx.bridge.metrics();

        let Some(handler) = self.handlers.get(&(generation, frame.opcode)) else {
            warn!(
                generation = %generation,
                opcode = frame.opcode,
                body_len = frame.body.len(),
                "dropping message with unknown opcode"
            );
            metrics.message_dropped(DropReason::UnknownOpcode);
            return Ok(Dispatch::Dropped(DropReason::UnknownOpcode));
        };

        let mut reader = PacketReader::new(frame.opcode, &frame.body);
        match handler(&mut reader, ctx) {
            Ok(messages) => {
                if !reader.is_empty() {
                    trace!(
                        generation = %generation,
                        opcode = frame.opcode,
                        unread = reader.remaining(),
                        "handler left trailing bytes"
                    );
                }
                metrics.messages_translated(messages.len() as u64);
                Ok(Dispatch::Translated(messages))
            }
            Err(err) if err.is_fatal() => {
                error!(generation = %generation, opcode = frame.opcode, error = %err, "fatal framing error");
                metrics.fatal_error();
                Err(err)
            }
            Err(err) => {
                warn!(
                    generation = %generation,
                    opcode = frame.opcode,
                    error = %err,
                    "dropping message rejected by handler"
                );
                metrics.message_dropped(DropReason::HandlerRejected);
                Ok(Dispatch::Dropped(DropReason::HandlerRejected))
            }
        }
    }
}
