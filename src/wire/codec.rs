//! Length-prefixed framing.
//!
//! A frame is a 4-byte big-endian length `L` followed by `L` payload bytes.
//! The codec treats `L == 0` as an ordinary empty payload; giving the zero
//! word a meaning is up to the worker and client.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::queue::Message;

/// Size of the length prefix.
pub const PREFIX_LEN: usize = 4;

const INITIAL_PAYLOAD_CAPACITY: usize = 64 * 1024;

/// Encodes `payload` as a standalone frame.
pub fn encode(payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(PREFIX_LEN + payload.len());
    put_frame(&mut buf, payload)?;
    Ok(buf.freeze())
}

/// Appends one frame to `buf`.
pub fn put_frame(buf: &mut BytesMut, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge(payload.len()))?;
    buf.reserve(PREFIX_LEN + payload.len());
    buf.put_u32(len);
    buf.put_slice(payload);
    Ok(())
}

/// Splits the first frame off the front of `buf`.
///
/// Returns `Ok(None)` when `buf` is empty. A record that is only partially
/// present is reported as [`Error::CorruptFrame`] and `buf` is left intact.
pub fn take_frame(buf: &mut BytesMut) -> Result<Option<Message>> {
    if buf.is_empty() {
        return Ok(None);
    }
    if buf.len() < PREFIX_LEN {
        return Err(Error::CorruptFrame {
            declared: PREFIX_LEN,
            available: buf.len(),
        });
    }

    let declared = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let available = buf.len() - PREFIX_LEN;
    if declared > available {
        return Err(Error::CorruptFrame {
            declared,
            available,
        });
    }

    buf.advance(PREFIX_LEN);
    Ok(Some(Message::from(buf.split_to(declared).freeze())))
}

/// Reads a 4-byte control word.
///
/// `Ok(None)` means the peer closed the stream cleanly before sending
/// anything; EOF after a partial word is [`Error::TruncatedFrame`].
pub async fn read_control_word<R>(reader: &mut R) -> Result<Option<u32>>
where
    R: AsyncRead + Unpin,
{
    let mut word = [0u8; PREFIX_LEN];
    let mut filled = 0;
    while filled < PREFIX_LEN {
        let n = reader.read(&mut word[filled..]).await?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(Error::TruncatedFrame)
            };
        }
        filled += n;
    }
    Ok(Some(u32::from_be_bytes(word)))
}

/// Reads exactly `len` payload bytes.
///
/// The buffer grows with the bytes that actually arrive, so a declared
/// length alone never reserves memory.
pub async fn read_payload<R>(reader: &mut R, len: usize) -> Result<Message>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::with_capacity(len.min(INITIAL_PAYLOAD_CAPACITY));
    (&mut *reader)
        .take(len as u64)
        .read_to_end(&mut payload)
        .await?;
    if payload.len() < len {
        return Err(Error::TruncatedFrame);
    }
    Ok(Message::from(payload))
}

/// Reads one complete frame.
pub async fn decode<R>(reader: &mut R) -> Result<Message>
where
    R: AsyncRead + Unpin,
{
    let len = read_control_word(reader)
        .await?
        .ok_or(Error::TruncatedFrame)?;
    read_payload(reader, len as usize).await
}
