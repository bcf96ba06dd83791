//! Tokio codecs turning ciphered byte streams into [`Frame`]s and back.
//!
//! The decoder deciphers each frame header exactly once. Stream cipher state
//! is positional, so a header that arrived but whose body is still in flight
//! is remembered rather than re-read on the next call.

use crate::core::frame::{Frame, FrameHeader, FrameLayout};
use crate::crypto::CipherDirection;
use crate::error::{BridgeError, Result};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// Per-message decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Waiting for a full header.
    AwaitingHeader,
    /// Header deciphered; waiting for `body_len` more bytes.
    HeaderRead(FrameHeader),
}

/// Inbound half: deciphers headers and splits bodies off the buffer.
pub struct FrameDecoder {
    layout: FrameLayout,
    cipher: Box<dyn CipherDirection>,
    max_body: usize,
    state: DecodeState,
}

impl FrameDecoder {
    pub fn new(layout: FrameLayout, cipher: Box<dyn CipherDirection>, max_body: usize) -> Self {
        Self {
            layout,
            cipher,
            max_body,
            state: DecodeState::AwaitingHeader,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }
}

impl Decoder for FrameDecoder {
    type Item = Frame;
    type Error = BridgeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        let header = match self.state {
            DecodeState::HeaderRead(header) => header,
            DecodeState::AwaitingHeader => {
                let header_len = self.layout.header_len();
                if src.len() < header_len {
                    return Ok(None);
                }

                let mut raw = src.split_to(header_len);
                self.cipher.apply(&mut raw);
                let header = self.layout.decode_header(&raw)?;

                if header.body_len > self.max_body {
                    return Err(BridgeError::OversizedFrame(header.body_len));
                }

                trace!(opcode = header.opcode, body_len = header.body_len, "Frame header read");
                self.state = DecodeState::HeaderRead(header);
                header
            }
        };

        if src.len() < header.body_len {
            src.reserve(header.body_len - src.len());
            return Ok(None);
        }

        let body = src.split_to(header.body_len).freeze();
        self.state = DecodeState::AwaitingHeader;
        Ok(Some(Frame {
            opcode: header.opcode,
            body,
        }))
    }
}

/// Outbound half: writes and enciphers headers, appends bodies in clear.
pub struct FrameEncoder {
    layout: FrameLayout,
    cipher: Box<dyn CipherDirection>,
}

impl FrameEncoder {
    pub fn new(layout: FrameLayout, cipher: Box<dyn CipherDirection>) -> Self {
        Self { layout, cipher }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }
}

impl Encoder<Frame> for FrameEncoder {
    type Error = BridgeError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        let header = FrameHeader {
            opcode: frame.opcode,
            body_len: frame.body.len(),
        };

        let mut raw = BytesMut::with_capacity(self.layout.header_len());
        self.layout.encode_header(&header, &mut raw)?;
        self.cipher.apply(&mut raw);

        dst.reserve(raw.len() + frame.body.len());
        dst.put_slice(&raw);
        dst.put_slice(&frame.body);
        Ok(())
    }
}
