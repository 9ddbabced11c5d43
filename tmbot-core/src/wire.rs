//! Framing: every write is one UTF-8 JSON document.
//!
//! Inbound:
//!   {"type":"begin","msgId":<id>,"total":<int>,"bytes":<int>}
//!   {"type":"chunk","msgId":<id>,"seq":<int>,"data":"<base64>"}
//!   {"type":"end","msgId":<id>}
//!   [[...],[...],...]   one-shot grid, no envelope
//!
//! Outbound acknowledgments are serialized from `Ack`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use crate::protocol::{Ack, Frame, Grid, MsgId};

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Envelope {
    Begin {
        #[serde(rename = "msgId")]
        msg_id: MsgId,
        total: i64,
        bytes: i64,
    },
    Chunk {
        #[serde(rename = "msgId")]
        msg_id: MsgId,
        seq: i64,
        data: String,
    },
    End {
        #[serde(rename = "msgId")]
        msg_id: MsgId,
    },
}

/// Decode one inbound write. Objects carrying a `type` key are envelopes; arrays are one-shot grids.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, FrameDecodeError> {
    let text = std::str::from_utf8(bytes)?;
    let value: serde_json::Value = serde_json::from_str(text)?;

    let is_envelope = value
        .as_object()
        .map_or(false, |obj| obj.contains_key("type"));
    if is_envelope {
        let frame = match Envelope::deserialize(value)? {
            Envelope::Begin {
                msg_id,
                total,
                bytes,
            } => Frame::Begin {
                msg_id,
                total_chunks: total,
                total_bytes: bytes,
            },
            Envelope::Chunk { msg_id, seq, data } => Frame::Chunk { msg_id, seq, data },
            Envelope::End { msg_id } => Frame::End { msg_id },
        };
        return Ok(frame);
    }

    if value.is_array() {
        let grid = Grid::deserialize(value).map_err(|_| FrameDecodeError::UnknownShape)?;
        return Ok(Frame::OneShot { grid });
    }
    Err(FrameDecodeError::UnknownShape)
}

/// Decode the base64 payload of a chunk. Called after the transfer lookup, so an unknown
/// msgId is reported even when its data is garbage.
pub fn decode_chunk_data(data: &str) -> Result<Vec<u8>, FrameDecodeError> {
    Ok(STANDARD.decode(data)?)
}

/// Error decoding an inbound write. The write is dropped; nothing is acknowledged.
#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    #[error("write is not UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("chunk data is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is neither an envelope nor a grid")]
    UnknownShape,
}

/// Encode an acknowledgment as the bytes of one notification.
pub fn encode_ack(ack: &Ack) -> Result<Vec<u8>, AckEncodeError> {
    Ok(serde_json::to_vec(ack)?)
}

#[derive(Debug, thiserror::Error)]
pub enum AckEncodeError {
    #[error("encode error: {0}")]
    Json(#[from] serde_json::Error),
}
