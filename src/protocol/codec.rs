//! Frame codec
//!
//! Frame layout:
//! ```text
//! +-------------+---------+--------+-----------+
//! | Length (4)  | Ver (1) | Op (1) | Payload   |
//! +-------------+---------+--------+-----------+
//!   big-endian    \______ Length bytes ______/
//! ```
//!
//! Strings inside payloads are a 16-bit big-endian length followed by UTF-8.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::constants::{FRAME_HEADER_SIZE, MAX_FRAME_SIZE, PROTOCOL_VERSION};

/// Errors raised while framing or decoding messages
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of frame")]
    UnexpectedEof,
    #[error("frame of {0} bytes exceeds the maximum")]
    FrameTooLarge(usize),
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),
    #[error("unknown command code {0}")]
    UnknownCommand(u8),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("string of {0} bytes is too long to encode")]
    StringTooLong(usize),
    #[error("unexpected {0} response")]
    UnexpectedResponse(&'static str),
}

/// Start a frame body with the version byte and opcode
pub(crate) fn begin_body(opcode: u8) -> BytesMut {
    let mut buf = BytesMut::with_capacity(32);
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u8(opcode);
    buf
}

/// Split a frame body into its opcode and payload
pub(crate) fn open_body(mut body: Bytes) -> Result<(u8, Bytes), CodecError> {
    if body.remaining() < 2 {
        return Err(CodecError::UnexpectedEof);
    }
    let version = body.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let opcode = body.get_u8();
    Ok((opcode, body))
}

pub(crate) fn put_string(buf: &mut BytesMut, s: &str) -> Result<(), CodecError> {
    let len = s.len();
    if len > u16::MAX as usize {
        return Err(CodecError::StringTooLong(len));
    }
    buf.put_u16(len as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

pub(crate) fn get_string(buf: &mut Bytes) -> Result<String, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::UnexpectedEof);
    }
    let len = buf.get_u16() as usize;
    if buf.remaining() < len {
        return Err(CodecError::UnexpectedEof);
    }
    let raw = buf.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

pub(crate) fn get_u8(buf: &mut Bytes) -> Result<u8, CodecError> {
    if !buf.has_remaining() {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(buf.get_u8())
}

pub(crate) fn get_u16(buf: &mut Bytes) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(buf.get_u16())
}

/// Write one frame (length prefix + body)
pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
{
    if body.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge(body.len()));
    }

    let mut frame = BytesMut::with_capacity(FRAME_HEADER_SIZE + body.len());
    frame.put_u32(body.len() as u32);
    frame.put_slice(body);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame body
///
/// Returns `Ok(None)` when the peer closed the connection cleanly between
/// frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Bytes>, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_SIZE];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge(len));
    }

    let mut body = BytesMut::zeroed(len);
    reader.read_exact(&mut body).await?;
    Ok(Some(body.freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_encoding() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "theatre").unwrap();
        assert_eq!(&buf[..2], &[0x00, 0x07]);

        let mut bytes = buf.freeze();
        assert_eq!(get_string(&mut bytes).unwrap(), "theatre");
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_truncated_string() {
        let mut bytes = Bytes::from_static(&[0x00, 0x05, b'a', b'b']);
        assert!(matches!(
            get_string(&mut bytes),
            Err(CodecError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut bytes = Bytes::from_static(&[0x00, 0x02, 0xC3, 0x28]);
        assert!(matches!(get_string(&mut bytes), Err(CodecError::InvalidUtf8)));
    }

    #[test]
    fn test_open_body_rejects_version() {
        let body = Bytes::from_static(&[0x09, 0x01]);
        assert!(matches!(
            open_body(body),
            Err(CodecError::UnsupportedVersion(9))
        ));
    }

    #[tokio::test]
    async fn test_frame_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(1024);

        write_frame(&mut a, &[PROTOCOL_VERSION, 0x01]).await.unwrap();
        drop(a);

        let body = read_frame(&mut b).await.unwrap().unwrap();
        assert_eq!(&body[..], &[PROTOCOL_VERSION, 0x01]);

        // Clean close between frames
        assert!(read_frame(&mut b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let len = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes();
        a.write_all(&len).await.unwrap();

        assert!(matches!(
            read_frame(&mut b).await,
            Err(CodecError::FrameTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_io_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&[0, 0, 0, 8, 1, 2]).await.unwrap();
        drop(a);

        assert!(matches!(read_frame(&mut b).await, Err(CodecError::Io(_))));
    }
}
