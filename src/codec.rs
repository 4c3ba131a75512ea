// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the serial frame codec

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::constants::{ACK, NAK, SOM};
use crate::error::{ConcordError, RejectReason, Result};

/// Largest payload `encode_payload` accepts; the length byte also counts the checksum.
pub const MAX_PAYLOAD_LEN: usize = 254;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Compute the frame checksum: the sum of all bytes, modulo 256.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

fn push_hex(out: &mut Vec<u8>, data: &[u8]) {
    for &b in data {
        out.push(HEX_DIGITS[(b >> 4) as usize]);
        out.push(HEX_DIGITS[(b & 0x0F) as usize]);
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Decode pairs of ASCII hex characters into raw bytes.
///
/// Returns `None` on an odd length or any non-hex character.
pub fn hex_decode(src: &[u8]) -> Option<Vec<u8>> {
    if src.len() % 2 != 0 {
        return None;
    }
    src.chunks_exact(2)
        .map(|pair| Some((hex_value(pair[0])? << 4) | hex_value(pair[1])?))
        .collect()
}

/// Encode a length-prefixed message for transmission.
///
/// `message` starts with its own length byte, exactly as the panel protocol
/// documents requests (e.g. `[0x02, 0x20]`). The checksum of the message is
/// appended and everything after SOM is sent as ASCII hex.
pub fn encode_frame(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 * message.len() + 3);
    out.push(SOM);
    push_hex(&mut out, message);
    push_hex(&mut out, &[checksum(message)]);
    out
}

/// Encode a payload (command byte onward), computing the length byte.
pub fn encode_payload(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ConcordError::PayloadTooLong { len: payload.len() });
    }
    let mut message = Vec::with_capacity(payload.len() + 1);
    message.push((payload.len() + 1) as u8);
    message.extend_from_slice(payload);
    Ok(encode_frame(&message))
}

/// Outcome of one read attempt on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Nothing arrived within the poll timeout; the link is quiet.
    Idle,
    /// A byte other than SOM was discarded while looking for a frame.
    Noise(u8),
    /// The link went quiet part way through a frame. Nothing was written back.
    Incomplete,
    /// The frame was refused and a NAK written back.
    Rejected(RejectReason),
    /// A valid frame. The payload starts at the command byte; the length and
    /// checksum bytes are stripped. An ACK has been written back.
    Frame(Vec<u8>),
}

/// Reads frames from the link and acknowledges them.
///
/// Every individual read is bounded by the poll timeout, so a frame that
/// trickles in over a slow link is accepted as long as the gap between
/// bytes stays below the timeout.
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    poll_timeout: Duration,
}

impl FrameDecoder {
    pub fn new(poll_timeout: Duration) -> Self {
        Self { poll_timeout }
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Attempt to read one frame.
    ///
    /// I/O errors (including the link closing) are returned as `Err`;
    /// everything the protocol can recover from is a [`Decoded`] variant.
    pub async fn decode<R, W>(&self, reader: &mut R, writer: &mut W) -> io::Result<Decoded>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut first = [0u8; 1];
        if !self.read_exact(reader, &mut first).await? {
            return Ok(Decoded::Idle);
        }
        if first[0] != SOM {
            return Ok(Decoded::Noise(first[0]));
        }

        let mut len_hex = [0u8; 2];
        if !self.read_exact(reader, &mut len_hex).await? {
            return Ok(Decoded::Incomplete);
        }
        let len = match hex_decode(&len_hex) {
            Some(v) if v[0] > 0 => v[0],
            _ => {
                debug!("Invalid frame length {:02X?}", len_hex);
                reply(writer, NAK).await?;
                return Ok(Decoded::Rejected(RejectReason::Malformed));
            }
        };

        let mut body_hex = vec![0u8; 2 * len as usize];
        if !self.read_exact(reader, &mut body_hex).await? {
            return Ok(Decoded::Incomplete);
        }
        let Some(mut raw) = hex_decode(&body_hex) else {
            debug!("Non-hex characters in frame body");
            reply(writer, NAK).await?;
            return Ok(Decoded::Rejected(RejectReason::Malformed));
        };

        let received = raw.pop().unwrap_or_default();
        let computed = checksum(&raw).wrapping_add(len);
        if computed != received {
            debug!("Checksum mismatch (expected {computed:02X}, got {received:02X})");
            reply(writer, NAK).await?;
            return Ok(Decoded::Rejected(RejectReason::BadChecksum));
        }

        reply(writer, ACK).await?;
        trace!("Frame: {:02X?}", raw);
        Ok(Decoded::Frame(raw))
    }

    /// Fill `buf` completely. Returns `false` if the link went quiet first.
    async fn read_exact<R>(&self, reader: &mut R, buf: &mut [u8]) -> io::Result<bool>
    where
        R: AsyncRead + Unpin,
    {
        let mut filled = 0;
        while filled < buf.len() {
            match timeout(self.poll_timeout, reader.read(&mut buf[filled..])).await {
                Err(_) => return Ok(false),
                Ok(Ok(0)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "serial link closed",
                    ));
                }
                Ok(Ok(n)) => filled += n,
                Ok(Err(e)) => return Err(e),
            }
        }
        Ok(true)
    }
}

async fn reply<W>(writer: &mut W, byte: u8) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&[byte]).await?;
    writer.flush().await
}
