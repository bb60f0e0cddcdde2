use std::io;

use thiserror::Error;

/// Errors reported by [`Heap`](crate::Heap) operations.
///
/// Every variant is recoverable: misuse is rejected and leaves the block
/// directory untouched.
#[derive(Debug, Error)]
pub enum HeapError {
  #[error("no suitable free block for {requested} bytes, try freeing memory")]
  OutOfMemory { requested: usize },

  #[error("handle {offset:#x} is null or was not returned by this heap")]
  InvalidPointer { offset: usize },

  #[error("handle {offset:#x} is already free")]
  DoubleFree { offset: usize },

  #[error("capacity of {capacity} bytes cannot hold a single block header")]
  CapacityTooSmall { capacity: usize },

  #[error("failed to map arena: {0}")]
  ArenaMap(#[from] io::Error),

  #[error("block directory is corrupted: {reason}")]
  Corrupted { reason: String },
}

pub type Result<T> = core::result::Result<T, HeapError>;
