//! Grid payload: decode reassembled bytes and count tiles.

use crate::protocol::Grid;

/// Total element count across all rows.
pub fn tile_count(grid: &Grid) -> u64 {
    grid.iter().map(|row| row.len() as u64).sum()
}

/// Decode a reassembled payload as a grid.
pub fn decode_grid(bytes: &[u8]) -> Result<Grid, PayloadError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(serde_json::from_str(text)?)
}

/// Reassembled payload is not a grid. Display is the detail reported to the peer.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("{0}")]
    NotUtf8(#[from] std::str::Utf8Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
