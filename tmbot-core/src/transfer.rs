//! Per-transfer reassembly state: declared sizes, received chunks, byte tally.

use std::collections::HashMap;

/// One in-flight transfer, keyed by msgId in the reassembler.
#[derive(Debug)]
pub struct Transfer {
    total_chunks: i64,
    total_bytes: i64,
    /// Chunk payloads by seq. First arrival wins.
    chunks: HashMap<i64, Vec<u8>>,
    received_bytes: u64,
    /// Tick of the last Begin or Chunk touching this transfer.
    last_activity: u64,
}

impl Transfer {
    pub fn new(total_chunks: i64, total_bytes: i64, tick: u64) -> Self {
        Self {
            total_chunks,
            total_bytes,
            chunks: HashMap::new(),
            received_bytes: 0,
            last_activity: tick,
        }
    }

    /// Store a chunk unless its seq is already present. Returns true if stored.
    pub fn insert_chunk(&mut self, seq: i64, data: Vec<u8>, tick: u64) -> bool {
        self.last_activity = tick;
        if self.chunks.contains_key(&seq) {
            return false;
        }
        self.received_bytes += data.len() as u64;
        self.chunks.insert(seq, data);
        true
    }

    /// Chunk count and byte tally match the declaration and every seq in `0..total_chunks` is present.
    pub fn is_complete(&self) -> bool {
        self.chunks.len() as i64 == self.total_chunks
            && i64::try_from(self.received_bytes) == Ok(self.total_bytes)
            && (0..self.total_chunks).all(|seq| self.chunks.contains_key(&seq))
    }

    /// Concatenate chunks in seq order `0..total_chunks`. `None` if any seq is missing.
    pub fn reassemble(&self) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(self.received_bytes as usize);
        for seq in 0..self.total_chunks {
            out.extend_from_slice(self.chunks.get(&seq)?);
        }
        Some(out)
    }

    pub fn total_chunks(&self) -> i64 {
        self.total_chunks
    }

    pub fn total_bytes(&self) -> i64 {
        self.total_bytes
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }

    pub fn idle_ticks(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_activity)
    }
}
