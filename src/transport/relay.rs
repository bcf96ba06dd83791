//! Async adapter driving a [`Connection`] between two byte streams.
//!
//! Both directions run in one task: frames are pulled off whichever side
//! is readable first, translated, and written to the other side. The relay
//! returns when either side closes or a fatal framing error occurs.

use crate::core::{Frame, FrameDecoder, FrameEncoder};
use crate::error::Result;
use crate::protocol::generation::Direction;
use crate::protocol::session::{encode_frame, wire_len, Connection, ConnectionParts, PumpReport, Translator};
use crate::time::ServerTime;
use bytes::BytesMut;
use std::time::Instant;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, error, instrument};

/// Totals for both directions of one relayed connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub server_to_client: PumpReport,
    pub client_to_server: PumpReport,
}

/// Relay `connection` between a legacy `server` stream and a modern
/// `client` stream until either closes.
///
/// Bytes already buffered inside `connection` are processed first.
#[instrument(skip_all)]
pub async fn relay<S, C>(connection: Connection, server: S, client: C) -> Result<RelayReport>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: AsyncRead + AsyncWrite + Unpin,
{
    let ConnectionParts {
        mut translator,
        codecs,
        server_pending,
        client_pending,
    } = connection.into_parts();

    let (server_rd, mut server_wr) = tokio::io::split(server);
    let (client_rd, mut client_wr) = tokio::io::split(client);

    let mut from_server = FramedRead::new(server_rd, codecs.server_decoder);
    from_server.read_buffer_mut().unsplit(server_pending);
    let mut from_client = FramedRead::new(client_rd, codecs.client_decoder);
    from_client.read_buffer_mut().unsplit(client_pending);

    let mut to_client = codecs.client_encoder;
    let mut to_server = codecs.server_encoder;
    let mut report = RelayReport::default();

    loop {
        tokio::select! {
            frame = from_server.next() => {
                let Some(frame) = frame else {
                    debug!("server closed the stream");
                    break;
                };
                let frame = checked(&translator, from_server.decoder(), frame)?;
                let bytes = forward(
                    &mut translator,
                    Direction::ServerToClient,
                    frame,
                    &mut to_client,
                    &mut report.server_to_client,
                )?;
                client_wr.write_all(&bytes).await?;
            }
            frame = from_client.next() => {
                let Some(frame) = frame else {
                    debug!("client closed the stream");
                    break;
                };
                let frame = checked(&translator, from_client.decoder(), frame)?;
                let bytes = forward(
                    &mut translator,
                    Direction::ClientToServer,
                    frame,
                    &mut to_server,
                    &mut report.client_to_server,
                )?;
                server_wr.write_all(&bytes).await?;
            }
        }
    }

    client_wr.flush().await?;
    server_wr.flush().await?;
    debug!(?report, "relay finished");
    Ok(report)
}

fn checked(translator: &Translator, decoder: &FrameDecoder, frame: Result<Frame>) -> Result<Frame> {
    let metrics = translator.bridge().metrics();
    match frame {
        Ok(frame) => {
            metrics.frame_decoded(wire_len(decoder.layout(), &frame));
            Ok(frame)
        }
        Err(err) => {
            error!(error = %err, "fatal framing error, closing connection");
            metrics.fatal_error();
            Err(err)
        }
    }
}

fn forward(
    translator: &mut Translator,
    direction: Direction,
    frame: Frame,
    encoder: &mut FrameEncoder,
    report: &mut PumpReport,
) -> Result<BytesMut> {
    let started = Instant::now();
    translator.refresh_clock(ServerTime::now());
    report.frames_in += 1;
    let translated = translator.translate(direction, &frame)?;
    report.dropped += translated.dropped;

    let mut out = BytesMut::new();
    for frame in translated.frames {
        if encode_frame(translator.bridge(), encoder, frame, &mut out) {
            report.frames_out += 1;
        } else {
            report.dropped += 1;
        }
    }
    translator.record_update(started);
    Ok(out)
}
