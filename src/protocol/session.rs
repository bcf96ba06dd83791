//! # Connection Pipeline
//!
//! One [`Connection`] per proxied client. It owns both directions:
//!
//! ```text
//! downstream: server bytes -> decipher/decode -> dispatch -> modern encode -> client bytes
//! upstream:   client bytes -> decode -> dispatch -> legacy encode -> encipher -> server bytes
//! ```
//!
//! Unknown opcodes and untranslatable messages are dropped with a warning;
//! only fatal framing errors escape, and after one of those the connection
//! must be closed.

use super::context::{BridgeContext, HandlerContext, SessionState};
use super::dispatcher::{Dispatch, Dispatcher};
use super::encode::{LegacyEncoder, MessageEncoder, ModernEncoder};
use super::generation::Direction;
use crate::core::{Frame, FrameDecoder, FrameEncoder, FrameLayout};
use crate::crypto::{new_cipher, CipherStatus, StreamCipher};
use crate::error::{constants, BridgeError, Result};
use crate::time::ServerTime;
use crate::utils::{DropReason, UpdateTimeStats};
use bytes::BytesMut;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, error, instrument, trace, warn};

/// Frames a single inbound frame turned into.
#[derive(Debug, Default)]
pub struct Translated {
    pub frames: Vec<Frame>,
    /// Messages discarded along the way
    pub dropped: usize,
}

/// What one pump call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub frames_in: usize,
    pub frames_out: usize,
    pub dropped: usize,
}

/// Dispatch and re-encode, without any framing.
pub struct Translator {
    bridge: Arc<BridgeContext>,
    dispatcher: Arc<Dispatcher>,
    session: SessionState,
    modern: ModernEncoder,
    legacy: LegacyEncoder,
    update_times: UpdateTimeStats,
}

impl Translator {
    pub fn new(bridge: Arc<BridgeContext>, dispatcher: Arc<Dispatcher>) -> Self {
        bridge.metrics().connection_opened();
        Self {
            modern: ModernEncoder::new(bridge.modern()),
            legacy: LegacyEncoder::new(bridge.legacy()),
            bridge,
            dispatcher,
            session: SessionState::new(),
            update_times: UpdateTimeStats::new(),
        }
    }

    pub fn bridge(&self) -> &BridgeContext {
        &self.bridge
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn update_times(&self) -> &UpdateTimeStats {
        &self.update_times
    }

    /// Snapshot the clocks handlers will see until the next refresh. A
    /// `now` the packed calendar cannot express leaves the clock unset.
    pub fn refresh_clock(&mut self, now: ServerTime) {
        self.session.clock = match self.bridge.loop_time(now) {
            Ok(clock) => Some(clock),
            Err(err) => {
                trace!(error = %err, "clock snapshot unavailable");
                None
            }
        };
    }

    /// Record how long one pump took.
    pub fn record_update(&mut self, started: Instant) {
        self.update_times.record_elapsed(started.elapsed());
    }

    /// Translate one frame travelling in `direction`.
    #[instrument(level = "trace", skip(self, frame), fields(opcode = frame.opcode))]
    pub fn translate(&mut self, direction: Direction, frame: &Frame) -> Result<Translated> {
        let (source, encoder): (_, &dyn MessageEncoder) = match direction {
            Direction::ServerToClient => (self.bridge.legacy(), &self.modern),
            Direction::ClientToServer => (self.bridge.modern(), &self.legacy),
        };

        let mut ctx = HandlerContext::new(&self.bridge, &mut self.session, source);
        let messages = match self.dispatcher.dispatch(frame, &mut ctx)? {
            Dispatch::Translated(messages) => messages,
            Dispatch::Dropped(_) => {
                return Ok(Translated {
                    frames: Vec::new(),
                    dropped: 1,
                })
            }
        };

        let mut out = Translated {
            frames: Vec::with_capacity(messages.len()),
            dropped: 0,
        };
        for message in &messages {
            match encoder.encode(message) {
                Ok(frame) => out.frames.push(frame),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(
                        generation = %encoder.generation(),
                        message = message.name(),
                        error = %err,
                        "dropping message the destination cannot express"
                    );
                    self.bridge.metrics().message_dropped(DropReason::EncoderRejected);
                    out.dropped += 1;
                }
            }
        }
        Ok(out)
    }
}

impl Drop for Translator {
    fn drop(&mut self) {
        self.update_times.log_summary();
        self.bridge.metrics().connection_closed();
    }
}

/// The four frame codecs of one connection.
pub struct Codecs {
    pub server_decoder: FrameDecoder,
    pub server_encoder: FrameEncoder,
    pub client_decoder: FrameDecoder,
    pub client_encoder: FrameEncoder,
}

impl Codecs {
    /// Codecs for `bridge`'s layouts, with the keyed `server_cipher` split
    /// between the server decoder and encoder.
    pub fn new(bridge: &BridgeContext, server_cipher: Box<dyn StreamCipher>) -> Result<Self> {
        if server_cipher.kind() != bridge.legacy().cipher_kind() {
            return Err(BridgeError::Config(constants::ERR_CIPHER_MISMATCH.to_string()));
        }
        if server_cipher.status() != CipherStatus::Ready {
            return Err(BridgeError::Config(constants::ERR_CIPHER_NOT_READY.to_string()));
        }

        let (server_recv, server_send) = server_cipher.into_halves();
        let (client_recv, client_send) = new_cipher(bridge.modern().cipher_kind()).into_halves();
        let layouts = bridge.layouts();
        let max_body = bridge.max_frame_body();

        Ok(Self {
            server_decoder: FrameDecoder::new(layouts.server_inbound, server_recv, max_body),
            server_encoder: FrameEncoder::new(layouts.server_outbound, server_send),
            client_decoder: FrameDecoder::new(layouts.client_inbound, client_recv, max_body),
            client_encoder: FrameEncoder::new(layouts.client_outbound, client_send),
        })
    }
}

/// Pieces of a [`Connection`] for driving it from async I/O.
pub struct ConnectionParts {
    pub translator: Translator,
    pub codecs: Codecs,
    /// Server bytes received but not yet framed
    pub server_pending: BytesMut,
    /// Client bytes received but not yet framed
    pub client_pending: BytesMut,
}

/// Byte-level pipeline for both directions of one proxied client.
pub struct Connection {
    translator: Translator,
    codecs: Codecs,
    server_inbound: BytesMut,
    client_inbound: BytesMut,
}

impl Connection {
    pub fn new(
        bridge: Arc<BridgeContext>,
        dispatcher: Arc<Dispatcher>,
        server_cipher: Box<dyn StreamCipher>,
    ) -> Result<Self> {
        let codecs = Codecs::new(&bridge, server_cipher)?;
        debug!(legacy = %bridge.legacy(), modern = %bridge.modern(), "connection opened");
        Ok(Self {
            translator: Translator::new(bridge, dispatcher),
            codecs,
            server_inbound: BytesMut::new(),
            client_inbound: BytesMut::new(),
        })
    }

    pub fn session(&self) -> &SessionState {
        self.translator.session()
    }

    pub fn update_times(&self) -> &UpdateTimeStats {
        self.translator.update_times()
    }

    /// Consume bytes from the legacy server; client-bound bytes go to `out`.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_server(&mut self, bytes: &[u8], out: &mut BytesMut) -> Result<PumpReport> {
        self.pump(Direction::ServerToClient, bytes, out)
    }

    /// Consume bytes from the modern client; server-bound bytes go to `out`.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_client(&mut self, bytes: &[u8], out: &mut BytesMut) -> Result<PumpReport> {
        self.pump(Direction::ClientToServer, bytes, out)
    }

    pub fn into_parts(self) -> ConnectionParts {
        ConnectionParts {
            translator: self.translator,
            codecs: self.codecs,
            server_pending: self.server_inbound,
            client_pending: self.client_inbound,
        }
    }

    fn pump(&mut self, direction: Direction, bytes: &[u8], out: &mut BytesMut) -> Result<PumpReport> {
        let started = Instant::now();
        self.translator.refresh_clock(ServerTime::now());
        let report = self.pump_frames(direction, bytes, out)?;
        self.translator.record_update(started);
        Ok(report)
    }

    fn pump_frames(
        &mut self,
        direction: Direction,
        bytes: &[u8],
        out: &mut BytesMut,
    ) -> Result<PumpReport> {
        let Connection {
            translator,
            codecs,
            server_inbound,
            client_inbound,
        } = self;
        let (inbound, decoder, encoder) = match direction {
            Direction::ServerToClient => {
                (server_inbound, &mut codecs.server_decoder, &mut codecs.client_encoder)
            }
            Direction::ClientToServer => {
                (client_inbound, &mut codecs.client_decoder, &mut codecs.server_encoder)
            }
        };
        inbound.extend_from_slice(bytes);

        let mut report = PumpReport::default();
        while let Some(frame) = decode_frame(translator.bridge(), decoder, inbound)? {
            report.frames_in += 1;
            let translated = translator.translate(direction, &frame)?;
            report.dropped += translated.dropped;
            for frame in translated.frames {
                if encode_frame(translator.bridge(), encoder, frame, out) {
                    report.frames_out += 1;
                } else {
                    report.dropped += 1;
                }
            }
        }
        Ok(report)
    }
}

/// Wire size of `frame` under `layout`.
pub(crate) fn wire_len(layout: &FrameLayout, frame: &Frame) -> u64 {
    (layout.header_len() + frame.body.len()) as u64
}

/// Next complete frame off `inbound`. Errors are fatal and counted.
pub(crate) fn decode_frame(
    bridge: &BridgeContext,
    decoder: &mut FrameDecoder,
    inbound: &mut BytesMut,
) -> Result<Option<Frame>> {
    match decoder.decode(inbound) {
        Ok(Some(frame)) => {
            bridge.metrics().frame_decoded(wire_len(decoder.layout(), &frame));
            Ok(Some(frame))
        }
        Ok(None) => Ok(None),
        Err(err) => {
            error!(error = %err, "fatal framing error, closing connection");
            bridge.metrics().fatal_error();
            Err(err)
        }
    }
}

/// Append `frame` to `out`. A frame the outbound layout cannot carry is
/// dropped and `false` returned; nothing is written for it.
pub(crate) fn encode_frame(
    bridge: &BridgeContext,
    encoder: &mut FrameEncoder,
    frame: Frame,
    out: &mut BytesMut,
) -> bool {
    let opcode = frame.opcode;
    let len = wire_len(encoder.layout(), &frame);
    match encoder.encode(frame, out) {
        Ok(()) => {
            bridge.metrics().frame_encoded(len);
            true
        }
        Err(err) => {
            warn!(opcode, error = %err, "dropping frame the outbound layout cannot carry");
            bridge.metrics().message_dropped(DropReason::EncoderRejected);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PacketReader, PacketWriter};
    use crate::crypto::{keyed_cipher, CipherKind, SessionKey};
    use crate::identity::{HighGuidKind, NarrowGuid, RealmId, WideGuid};
    use crate::protocol::generation::Generation;
    use crate::time::Timezone;

    // A zero keytable reduces variant A to a running sum.
    fn zero_key() -> SessionKey {
        SessionKey::new(vec![0u8; 16]).unwrap()
    }

    fn server_encrypt(header: &mut [u8], feedback: &mut u8) {
        for byte in header {
            *byte = byte.wrapping_add(*feedback);
            *feedback = *byte;
        }
    }

    fn connection() -> Connection {
        connection_with_limit(1024)
    }

    fn connection_with_limit(max_body: usize) -> Connection {
        let bridge = Arc::new(
            BridgeContext::new(Generation::Vanilla, Generation::ClassicEra, 1, Timezone::UTC)
                .unwrap()
                .with_max_frame_body(max_body),
        );
        let dispatcher = Arc::new(Dispatcher::standard().unwrap());
        let cipher = keyed_cipher(CipherKind::RawKeyFeedback, &zero_key()).unwrap();
        Connection::new(bridge, dispatcher, cipher).unwrap()
    }

    fn server_frame(opcode: u16, body: &[u8], feedback: &mut u8) -> Vec<u8> {
        let mut header = Vec::new();
        header.extend_from_slice(&(body.len() as u16).to_be_bytes());
        header.extend_from_slice(&opcode.to_le_bytes());
        server_encrypt(&mut header, feedback);
        header.extend_from_slice(body);
        header
    }

    #[test]
    fn test_rejects_unkeyed_or_mismatched_cipher() {
        let bridge = Arc::new(
            BridgeContext::new(Generation::Vanilla, Generation::ClassicEra, 1, Timezone::UTC)
                .unwrap(),
        );
        let dispatcher = Arc::new(Dispatcher::standard().unwrap());

        let unkeyed = new_cipher(CipherKind::RawKeyFeedback);
        assert!(Connection::new(bridge.clone(), dispatcher.clone(), unkeyed).is_err());

        let wrong = keyed_cipher(CipherKind::Arc4Drop1024, &zero_key()).unwrap();
        assert!(Connection::new(bridge, dispatcher, wrong).is_err());
    }

    #[test]
    fn test_destroy_object_reaches_client_as_out_of_range() {
        let mut conn = connection();
        let mut feedback = 0u8;
        let mut body = PacketWriter::new();
        body.write_guid64(NarrowGuid::new(0x4000_0000_0000_0009));
        let wire = server_frame(0x0AA, &body.into_bytes(), &mut feedback);

        let mut out = BytesMut::new();
        let report = conn.from_server(&wire, &mut out).unwrap();
        assert_eq!(
            report,
            PumpReport {
                frames_in: 1,
                frames_out: 1,
                dropped: 0
            }
        );

        // modern client header: u32 LE length, u16 LE opcode
        let len = u32::from_le_bytes([out[0], out[1], out[2], out[3]]) as usize;
        let opcode = u16::from_le_bytes([out[4], out[5]]);
        assert_eq!(opcode, 0x27CA);
        assert_eq!(out.len(), 6 + len);

        let mut r = PacketReader::new(u32::from(opcode), &out[6..]);
        assert_eq!(r.read_u32().unwrap(), 0);
        assert_eq!(r.read_u16().unwrap(), 0);
        assert!(r.read_bit().unwrap());
        assert_eq!(r.read_u16().unwrap(), 0);
        assert_eq!(r.read_i32().unwrap(), 1);
        let guid = r.read_packed_guid128().unwrap();
        assert_eq!(guid.kind(), Some(HighGuidKind::Item));
        assert_eq!(guid.counter(), 9);
    }

    #[test]
    fn test_split_delivery_deciphers_header_once() {
        let mut conn = connection();
        let mut feedback = 0u8;
        let mut body = PacketWriter::new();
        body.write_guid64(NarrowGuid::new(3));
        let wire = server_frame(0x0AA, &body.into_bytes(), &mut feedback);

        let mut out = BytesMut::new();
        let first = conn.from_server(&wire[..5], &mut out).unwrap();
        assert_eq!(first.frames_in, 0);
        assert!(out.is_empty());

        let second = conn.from_server(&wire[5..], &mut out).unwrap();
        assert_eq!(second.frames_out, 1);
    }

    #[test]
    fn test_unknown_opcode_dropped_connection_survives() {
        let mut conn = connection();
        let mut feedback = 0u8;
        let mut wire = server_frame(0x1FF, &[1, 2, 3], &mut feedback);
        let mut body = PacketWriter::new();
        body.write_guid64(NarrowGuid::new(3));
        wire.extend(server_frame(0x0AA, &body.into_bytes(), &mut feedback));

        let mut out = BytesMut::new();
        let report = conn.from_server(&wire, &mut out).unwrap();
        assert_eq!(report.frames_in, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.frames_out, 1);
    }

    #[test]
    fn test_player_login_goes_upstream_narrowed() {
        let mut conn = connection();
        let player = WideGuid::new(HighGuidKind::Player, RealmId(1), 0, 0x42);
        let mut body = PacketWriter::new();
        body.write_packed_guid128(player);
        body.write_f32(1000.0);
        let body = body.into_bytes();

        let mut wire = BytesMut::new();
        wire.extend_from_slice(&(body.len() as u32).to_le_bytes());
        wire.extend_from_slice(&0x35EAu16.to_le_bytes());
        wire.extend_from_slice(&body);

        let mut out = BytesMut::new();
        conn.from_client(&wire, &mut out).unwrap();
        assert_eq!(conn.session().current_player, Some(player));
        assert!(conn.session().clock.is_some());

        // legacy server header: u16 BE length, u32 LE opcode, enciphered
        let mut header = out[..6].to_vec();
        let mut feedback = 0u8;
        for byte in &mut header {
            let cipher = *byte;
            *byte = cipher.wrapping_sub(feedback);
            feedback = cipher;
        }
        assert_eq!(u16::from_be_bytes([header[0], header[1]]), 8);
        assert_eq!(u32::from_le_bytes([header[2], header[3], header[4], header[5]]), 0x03D);
        assert_eq!(&out[6..], &0x42u64.to_le_bytes());
    }

    #[test]
    fn test_each_pump_refreshes_clock_and_records_duration() {
        let mut conn = connection();
        assert!(conn.session().clock.is_none());

        let mut feedback = 0u8;
        let mut body = PacketWriter::new();
        body.write_guid64(NarrowGuid::new(3));
        let wire = server_frame(0x0AA, &body.into_bytes(), &mut feedback);
        let mut out = BytesMut::new();

        conn.from_server(&wire[..3], &mut out).unwrap();
        let first = conn.session().clock.unwrap();
        conn.from_server(&wire[3..], &mut out).unwrap();
        let second = conn.session().clock.unwrap();

        assert!(second.server() >= first.server());
        assert!(second.tick() >= first.tick());
        assert!(conn.update_times().max() < crate::time::Milliseconds(60_000));
        assert!(conn.update_times().average() <= conn.update_times().max());
    }

    #[test]
    fn test_unrepresentable_clock_is_cleared() {
        let mut conn = connection();
        conn.translator.refresh_clock(ServerTime::now());
        assert!(conn.session().clock.is_some());

        conn.translator.refresh_clock(ServerTime::INFINITY);
        assert!(conn.session().clock.is_none());
    }

    #[test]
    fn test_oversized_frame_is_fatal() {
        let mut conn = connection_with_limit(16);
        let mut feedback = 0u8;
        let mut header = vec![0x00, 0x40, 0xAA, 0x00];
        server_encrypt(&mut header, &mut feedback);

        let err = conn.from_server(&header, &mut BytesMut::new()).unwrap_err();
        assert!(matches!(err, BridgeError::OversizedFrame(64)));
        assert_eq!(conn.translator.bridge().metrics().snapshot().fatal_errors, 1);
    }
}
