//! TMbot transfer protocol reference implementation.
//! Host-driven: no I/O; host passes inbound writes and receives acknowledgments through a sink.

pub mod protocol;
pub mod wire;

pub use protocol::{Ack, Frame, Grid, MsgId, DEVICE_NAME, RX_UUID, SERVICE_UUID, TX_UUID};
pub use reassembler::{TransferError, TransferReassembler, DEFAULT_TRANSFER_TIMEOUT_TICKS};
pub use session::{NotifySink, Session};
pub use wire::{decode_chunk_data, decode_frame, encode_ack, AckEncodeError, FrameDecodeError};

pub mod grid;
pub mod reassembler;
pub mod session;
pub mod transfer;
