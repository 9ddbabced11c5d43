//! TMbot wire protocol: inbound frames, outbound acknowledgments, GATT identifiers.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Name the device advertises under.
pub const DEVICE_NAME: &str = "TMbot";

/// Primary GATT service carrying the transfer protocol.
pub const SERVICE_UUID: &str = "12345678-1234-5678-1234-56789abc0000";

/// Notify characteristic: acknowledgments to the peer.
pub const TX_UUID: &str = "12345678-1234-5678-1234-56789abc0001";

/// Write / write-without-response characteristic: frames from the peer.
pub const RX_UUID: &str = "12345678-1234-5678-1234-56789abc0002";

/// Transfer identifier chosen by the peer. Opaque; echoed back with its original JSON type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum MsgId {
    /// Any JSON number, integer or not; serialized back as received.
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsgId::Number(n) => write!(f, "{}", n),
            MsgId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MsgId {
    fn from(s: &str) -> Self {
        MsgId::Text(s.to_owned())
    }
}

/// Rows of tiles. Element values are not interpreted, only counted.
pub type Grid = Vec<Vec<serde_json::Value>>;

/// One inbound write, decoded. See wire module for the JSON shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Open (or reopen) a transfer. Declared sizes are taken as-is.
    Begin {
        msg_id: MsgId,
        total_chunks: i64,
        total_bytes: i64,
    },
    /// One fragment of the payload. `data` is the base64 text as written; it is
    /// decoded only once the transfer is known.
    Chunk {
        msg_id: MsgId,
        seq: i64,
        data: String,
    },
    /// Close the transfer: verify, reassemble, decode.
    End { msg_id: MsgId },
    /// Small grid written without an envelope.
    OneShot { grid: Grid },
}

/// One outbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    BeginAck {
        msg_id: MsgId,
    },
    ChunkAck {
        msg_id: MsgId,
        seq: i64,
    },
    /// `msg_id` is `None` only for one-shot grids.
    Success {
        msg_id: Option<MsgId>,
        tiles: u64,
    },
    Failure {
        msg_id: Option<MsgId>,
        error: String,
    },
}

impl Ack {
    pub fn failure(msg_id: MsgId, error: impl fmt::Display) -> Self {
        Ack::Failure {
            msg_id: Some(msg_id),
            error: error.to_string(),
        }
    }
}

// Key order and the optional msgId follow the wire format exactly.
impl Serialize for Ack {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ack::BeginAck { msg_id } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "begin-ack")?;
                map.serialize_entry("msgId", msg_id)?;
                map.end()
            }
            Ack::ChunkAck { msg_id, seq } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("status", "chunk-ack")?;
                map.serialize_entry("msgId", msg_id)?;
                map.serialize_entry("seq", seq)?;
                map.end()
            }
            Ack::Success { msg_id, tiles } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("ok", &true)?;
                if let Some(id) = msg_id {
                    map.serialize_entry("msgId", id)?;
                }
                map.serialize_entry("tiles", tiles)?;
                map.end()
            }
            Ack::Failure { msg_id, error } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("ok", &false)?;
                map.serialize_entry("error", error)?;
                if let Some(id) = msg_id {
                    map.serialize_entry("msgId", id)?;
                }
                map.end()
            }
        }
    }
}
