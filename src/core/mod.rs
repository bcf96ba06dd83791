//! # Core Wire Components
//!
//! Frame layouts, tokio codecs and body cursors.
//!
//! This module turns a ciphered byte stream into discrete frames and gives
//! handlers a bounds-checked view of each frame body.
//!
//! ## Components
//! - **Frame**: per-direction header layout (length and opcode widths, byte order)
//! - **Codec**: tokio `Decoder`/`Encoder` pair that deciphers and enciphers headers
//! - **Cursor**: little-endian readers and writers, packed identifiers, bit fields
//!
//! ## Wire Format
//! ```text
//! [Length(2|4)] [Opcode(2|4)] [Body(Length)]
//! ```
//!
//! ## Safety Limits
//! - Declared body length is checked against the configured maximum before
//!   any buffering
//! - Reads past the body end are reported, never padded

pub mod codec;
pub mod cursor;
pub mod frame;

pub use codec::{DecodeState, FrameDecoder, FrameEncoder};
pub use cursor::{PacketReader, PacketWriter};
pub use frame::{ByteOrder, Frame, FrameHeader, FrameLayout};
