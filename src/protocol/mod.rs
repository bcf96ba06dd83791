//! # Protocol Translation
//!
//! Everything between a decoded frame and an encoded one.
//!
//! ## Components
//! - **Generation**: protocol versions and their fixed properties
//! - **Opcode**: canonical opcodes and their native numbers per generation
//! - **Message**: canonical, generation-neutral message values
//! - **Context**: process-wide bridge context and per-connection session state
//! - **Dispatcher**: `(generation, opcode)` to handler table
//! - **Handlers**: native layouts read into canonical messages
//! - **Encode**: canonical messages written in a destination layout
//! - **Session**: the per-connection pipeline tying it together

pub mod context;
pub mod dispatcher;
pub mod encode;
pub mod generation;
pub mod handlers;
pub mod message;
pub mod opcode;
pub mod session;

pub use context::{BridgeContext, HandlerContext, SessionState};
pub use dispatcher::{Dispatch, Dispatcher, DispatcherBuilder};
pub use encode::{encoder_for, LegacyEncoder, MessageEncoder, ModernEncoder};
pub use generation::{Direction, Generation};
pub use message::CanonicalMessage;
pub use opcode::Opcode;
pub use session::{Codecs, Connection, ConnectionParts, PumpReport, Translated, Translator};
