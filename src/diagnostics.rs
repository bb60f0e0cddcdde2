//! Read-only views of a heap's block directory.

use std::fmt;

use crate::{
  block::{BlockInfo, HEADER_SIZE},
  error::{HeapError, Result},
  heap::Heap,
};

/// Aggregate figures over the block directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
  pub capacity: usize,
  pub block_count: usize,
  pub free_blocks: usize,
  /// Payload bytes held by free blocks.
  pub free_bytes: usize,
  /// Payload bytes held by allocated blocks.
  pub used_bytes: usize,
  /// Size of the largest free block, 0 when every block is allocated.
  pub largest_free: usize,
}

impl HeapStats {
  /// Bytes taken by block headers.
  pub fn overhead_bytes(&self) -> usize {
    self.block_count * HEADER_SIZE
  }
}

impl Heap {
  /// Every block in physical order.
  pub fn list_blocks(&self) -> Vec<BlockInfo> {
    self
      .directory
      .iter()
      .map(|(_, block)| block.info())
      .collect()
  }

  pub fn stats(&self) -> HeapStats {
    let mut stats = HeapStats {
      capacity: self.capacity(),
      block_count: 0,
      free_blocks: 0,
      free_bytes: 0,
      used_bytes: 0,
      largest_free: 0,
    };

    for (_, block) in self.directory.iter() {
      stats.block_count += 1;

      if block.is_free {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.used_bytes += block.size;
      }
    }

    stats
  }

  /// Whether the heap is back to its initial state: one free block
  /// spanning the whole arena.
  pub fn is_pristine(&self) -> bool {
    let head = self.directory.get(self.directory.head());

    head.is_free && head.next.is_none() && head.size == self.capacity() - HEADER_SIZE
  }

  /// Walks the directory and verifies its structural invariants: blocks
  /// tile the arena from offset 0 to the capacity without gaps, back links
  /// mirror forward links, and no two neighbours are both free.
  pub fn check_integrity(&self) -> Result<()> {
    let corrupted = |reason: String| Err(HeapError::Corrupted { reason });

    let mut expected_offset = 0;
    let mut prev = None;
    let mut prev_free = false;
    let mut count = 0;
    let mut payload_bytes = 0;

    for (id, block) in self.directory.iter() {
      if block.offset != expected_offset {
        return corrupted(format!(
          "block at {:#x} should start at {:#x}",
          block.offset, expected_offset
        ));
      }

      if block.prev != prev {
        return corrupted(format!(
          "block at {:#x} links back to {:?} instead of {:?}",
          block.offset, block.prev, prev
        ));
      }

      if prev_free && block.is_free {
        return corrupted(format!(
          "free block at {:#x} follows another free block",
          block.offset
        ));
      }

      expected_offset = block.end();
      prev = Some(id);
      prev_free = block.is_free;
      count += 1;
      payload_bytes += block.size;
    }

    if count != self.directory.len() {
      return corrupted(format!(
        "walked {} blocks but the directory holds {}",
        count,
        self.directory.len()
      ));
    }

    if expected_offset != self.capacity() {
      return corrupted(format!(
        "last block ends at {:#x}, arena ends at {:#x}",
        expected_offset,
        self.capacity()
      ));
    }

    if payload_bytes + count * HEADER_SIZE != self.capacity() {
      return corrupted(format!(
        "{} payload bytes in {} blocks do not add up to {}",
        payload_bytes,
        count,
        self.capacity()
      ));
    }

    Ok(())
  }
}

/// Renders one `Free: <0|1>, Size: <bytes>` line per block.
impl fmt::Display for Heap {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "Total Heap info:")?;

    for (_, block) in self.directory.iter() {
      write!(f, "\nFree: {}, Size: {}", u8::from(block.is_free), block.size)?;
    }

    Ok(())
  }
}
