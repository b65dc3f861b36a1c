//! Wire codec
//!
//! Every frame, in both directions, is
//!
//! ```text
//! length: u32 little-endian || payload: `length` bytes
//! ```
//!
//! where the payload is one JSON object tagged by its `type` field. Decoding
//! distinguishes two failures: a payload that is not a tagged JSON object of
//! the expected shape is `MalformedFrame`; a well-formed object whose tag is
//! not one of the recognized variants is `UnknownType`. The latter leaves the
//! stream on a frame boundary, so callers may answer it and keep reading.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::transport::channel::{ChannelReader, ChannelWriter};
use crate::utils::{BrokerError, Result};

/// Size of the length prefix.
pub const HEADER_LEN: usize = 4;

/// A value that travels as the payload of one frame.
pub trait WireMessage: Serialize + DeserializeOwned + Send + 'static {
    /// Every `type` tag the decoder accepts for this message family.
    const TAGS: &'static [&'static str];
}

/// Serialize `message` into a complete frame, length prefix included.
pub fn encode<T: WireMessage>(message: &T) -> Result<Vec<u8>> {
    let payload =
        serde_json::to_vec(message).map_err(|e| BrokerError::MalformedFrame(e.to_string()))?;
    let length = u32::try_from(payload.len()).map_err(|_| {
        BrokerError::MalformedFrame(format!(
            "payload of {} bytes does not fit a frame",
            payload.len()
        ))
    })?;

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode one complete frame. The declared length must match the bytes given.
pub fn decode<T: WireMessage>(frame: &[u8]) -> Result<T> {
    if frame.len() < HEADER_LEN {
        return Err(BrokerError::MalformedFrame(format!(
            "frame of {} bytes is shorter than its header",
            frame.len()
        )));
    }
    let (header, payload) = frame.split_at(HEADER_LEN);
    let declared = frame_length(header)?;
    if declared != payload.len() {
        return Err(BrokerError::MalformedFrame(format!(
            "header declares {declared} bytes but {} follow",
            payload.len()
        )));
    }
    decode_payload(payload)
}

/// Decode a frame payload (the bytes after the length prefix).
pub fn decode_payload<T: WireMessage>(payload: &[u8]) -> Result<T> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| BrokerError::MalformedFrame(e.to_string()))?;

    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| BrokerError::MalformedFrame("missing type tag".to_string()))?;
    if !T::TAGS.contains(&tag) {
        return Err(BrokerError::UnknownType(tag.to_string()));
    }

    serde_json::from_value(value).map_err(|e| BrokerError::MalformedFrame(e.to_string()))
}

fn frame_length(header: &[u8]) -> Result<usize> {
    let bytes: [u8; HEADER_LEN] = header
        .try_into()
        .map_err(|_| BrokerError::MalformedFrame("short frame header".to_string()))?;
    Ok(u32::from_le_bytes(bytes) as usize)
}

/// Read exactly one frame and decode it.
///
/// Waits until the whole payload has arrived. A stream that ends before
/// the first header byte yields `ConnectionClosed`; one that ends anywhere
/// inside a frame, header included, yields `MalformedFrame`. Payloads
/// larger than `max_frame_bytes` are refused before anything is allocated
/// for them.
pub async fn read_message<T, R>(reader: &mut ChannelReader<R>, max_frame_bytes: usize) -> Result<T>
where
    T: WireMessage,
    R: AsyncRead + Unpin,
{
    let header = reader.read_up_to(HEADER_LEN).await?;
    if header.is_empty() {
        return Err(BrokerError::ConnectionClosed);
    }
    if header.len() < HEADER_LEN {
        return Err(BrokerError::MalformedFrame(format!(
            "stream closed after {} of {HEADER_LEN} header bytes",
            header.len()
        )));
    }
    let length = frame_length(&header)?;
    if length > max_frame_bytes {
        return Err(BrokerError::MalformedFrame(format!(
            "frame of {length} bytes exceeds the {max_frame_bytes} byte limit"
        )));
    }

    let payload = match reader.read_exact(length).await {
        Ok(payload) => payload,
        Err(BrokerError::ConnectionClosed) => {
            return Err(BrokerError::MalformedFrame(format!(
                "stream closed before {length} payload bytes arrived"
            )));
        }
        Err(err) => return Err(err),
    };
    decode_payload(&payload)
}

/// Encode `message` and write it as a single frame.
pub async fn write_message<T, W>(writer: &mut ChannelWriter<W>, message: &T) -> Result<()>
where
    T: WireMessage,
    W: AsyncWrite + Unpin,
{
    let frame = encode(message)?;
    writer.write(&frame).await
}
