use crate::detection::InferredEvent;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tile {position} is outside a board of {tile_count} tiles")]
pub struct TileOutOfRange {
    pub position: u64,
    pub tile_count: u64,
}

/// Last inferred event per board tile of the active run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileEventLog {
    tile_count: u64,
    entries: HashMap<u64, InferredEvent>,
}

impl TileEventLog {
    pub fn new(tile_count: u64) -> Self {
        Self {
            tile_count,
            entries: HashMap::new(),
        }
    }

    /// Forget every tile and size the log for a fresh board.
    pub fn reset(&mut self, tile_count: u64) {
        self.tile_count = tile_count;
        self.entries.clear();
    }

    /// Upserts `event` at `position`, returning what was there before.
    pub fn record(
        &mut self,
        position: u64,
        event: InferredEvent,
    ) -> Result<Option<InferredEvent>, TileOutOfRange> {
        if position >= self.tile_count {
            return Err(TileOutOfRange {
                position,
                tile_count: self.tile_count,
            });
        }
        Ok(self.entries.insert(position, event))
    }

    pub fn get(&self, position: u64) -> Option<&InferredEvent> {
        self.entries.get(&position)
    }

    pub fn tile_count(&self) -> u64 {
        self.tile_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
