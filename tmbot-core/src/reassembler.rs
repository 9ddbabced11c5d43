//! Host-driven API: TransferReassembler receives frames from host, returns acknowledgments.

use std::collections::HashMap;

use crate::grid::{self, PayloadError};
use crate::protocol::{Ack, Frame, Grid, MsgId};
use crate::transfer::Transfer;
use crate::wire;

/// Default idle time in ticks before an unfinished transfer is dropped.
pub const DEFAULT_TRANSFER_TIMEOUT_TICKS: u64 = 60;

/// Owns the transfer table. Every frame runs to completion and yields at most one acknowledgment.
pub struct TransferReassembler {
    transfers: HashMap<MsgId, Transfer>,
    tick_count: u64,
    transfer_timeout_ticks: u64,
}

impl TransferReassembler {
    pub fn new() -> Self {
        Self {
            transfers: HashMap::new(),
            tick_count: 0,
            transfer_timeout_ticks: DEFAULT_TRANSFER_TIMEOUT_TICKS,
        }
    }

    /// Set idle timeout in ticks. 0 disables expiry.
    pub fn set_transfer_timeout(&mut self, ticks: u64) {
        self.transfer_timeout_ticks = ticks;
    }

    /// Decode and apply one inbound write. Undecodable writes are logged and dropped.
    pub fn on_inbound_write(&mut self, bytes: &[u8]) -> Option<Ack> {
        match wire::decode_frame(bytes) {
            Ok(frame) => self.apply(frame),
            Err(e) => {
                tracing::warn!(error = %e, len = bytes.len(), "dropping malformed write");
                None
            }
        }
    }

    /// Apply one frame to the transfer table.
    pub fn apply(&mut self, frame: Frame) -> Option<Ack> {
        let ack = match frame {
            Frame::Begin {
                msg_id,
                total_chunks,
                total_bytes,
            } => {
                self.on_begin(msg_id.clone(), total_chunks, total_bytes);
                Ack::BeginAck { msg_id }
            }
            Frame::Chunk { msg_id, seq, data } => {
                if !self.transfers.contains_key(&msg_id) {
                    return Some(Ack::failure(msg_id, TransferError::UnknownTransfer));
                }
                let data = match wire::decode_chunk_data(&data) {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::warn!(msg_id = %msg_id, seq, error = %e, "dropping chunk");
                        return None;
                    }
                };
                match self.on_chunk(&msg_id, seq, data) {
                    Ok(()) => Ack::ChunkAck { msg_id, seq },
                    Err(e) => Ack::failure(msg_id, e),
                }
            }
            Frame::End { msg_id } => match self.on_end(&msg_id) {
                Ok(tiles) => Ack::Success {
                    msg_id: Some(msg_id),
                    tiles,
                },
                Err(e) => {
                    tracing::warn!(msg_id = %msg_id, error = %e, "transfer failed");
                    Ack::failure(msg_id, e)
                }
            },
            Frame::OneShot { grid } => Ack::Success {
                msg_id: None,
                tiles: self.on_one_shot(&grid),
            },
        };
        Some(ack)
    }

    /// Open a transfer. A stale entry under the same msgId is replaced.
    pub fn on_begin(&mut self, msg_id: MsgId, total_chunks: i64, total_bytes: i64) {
        tracing::debug!(msg_id = %msg_id, total_chunks, total_bytes, "transfer begin");
        let transfer = Transfer::new(total_chunks, total_bytes, self.tick_count);
        if self.transfers.insert(msg_id, transfer).is_some() {
            tracing::debug!("replaced unfinished transfer");
        }
    }

    /// Store a chunk. Repeated seqs are accepted without changing state.
    pub fn on_chunk(
        &mut self,
        msg_id: &MsgId,
        seq: i64,
        data: Vec<u8>,
    ) -> Result<(), TransferError> {
        let transfer = self
            .transfers
            .get_mut(msg_id)
            .ok_or(TransferError::UnknownTransfer)?;
        let len = data.len();
        if transfer.insert_chunk(seq, data, self.tick_count) {
            tracing::debug!(
                msg_id = %msg_id,
                seq,
                len,
                received_bytes = transfer.received_bytes(),
                "chunk stored"
            );
        } else {
            tracing::debug!(msg_id = %msg_id, seq, "duplicate chunk");
        }
        Ok(())
    }

    /// Close a transfer and return its tile count. The transfer is removed on every path.
    pub fn on_end(&mut self, msg_id: &MsgId) -> Result<u64, TransferError> {
        let transfer = self
            .transfers
            .remove(msg_id)
            .ok_or(TransferError::UnknownTransfer)?;
        if !transfer.is_complete() {
            tracing::debug!(
                msg_id = %msg_id,
                chunks = transfer.chunk_count(),
                total_chunks = transfer.total_chunks(),
                received_bytes = transfer.received_bytes(),
                total_bytes = transfer.total_bytes(),
                "transfer incomplete"
            );
            return Err(TransferError::IncompleteTransfer);
        }
        let bytes = transfer
            .reassemble()
            .ok_or(TransferError::IncompleteTransfer)?;
        let grid = grid::decode_grid(&bytes)?;
        let tiles = grid::tile_count(&grid);
        tracing::info!(msg_id = %msg_id, tiles, bytes = bytes.len(), "grid received");
        Ok(tiles)
    }

    /// Count tiles of a grid written without an envelope.
    pub fn on_one_shot(&self, grid: &Grid) -> u64 {
        let tiles = grid::tile_count(grid);
        tracing::info!(tiles, "one-shot grid received");
        tiles
    }

    /// Periodic tick: drop transfers idle longer than the timeout. Returns their msgIds.
    pub fn tick(&mut self) -> Vec<MsgId> {
        self.tick_count = self.tick_count.saturating_add(1);
        if self.transfer_timeout_ticks == 0 {
            return Vec::new();
        }
        let expired: Vec<MsgId> = self
            .transfers
            .iter()
            .filter(|(_, t)| t.idle_ticks(self.tick_count) > self.transfer_timeout_ticks)
            .map(|(id, _)| id.clone())
            .collect();
        for msg_id in &expired {
            self.transfers.remove(msg_id);
            tracing::warn!(msg_id = %msg_id, "transfer expired");
        }
        expired
    }

    /// In-flight transfer for `msg_id`, if any.
    pub fn transfer(&self, msg_id: &MsgId) -> Option<&Transfer> {
        self.transfers.get(msg_id)
    }

    pub fn in_flight(&self) -> usize {
        self.transfers.len()
    }
}

impl Default for TransferReassembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure reported to the peer. Display is the wire error string.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("unknown msgId")]
    UnknownTransfer,
    #[error("incomplete")]
    IncompleteTransfer,
    #[error("bad JSON: {0}")]
    MalformedPayload(#[from] PayloadError),
}
