use std::{collections::BTreeSet, ops::Range};

use log::trace;

use crate::block::{Block, BlockId, HEADER_SIZE};

/// Doubly-linked list of block descriptors in physical (offset) order.
///
/// Descriptors live in a table and link to each other by index. Slots of
/// descriptors destroyed by a merge are recycled by later splits.
pub(crate) struct Directory {
  blocks: Vec<Block>,
  vacant: Vec<BlockId>,
  /// Header offsets of blocks merged away into a free block, until the
  /// space is handed out again.
  merged: BTreeSet<usize>,
  head: BlockId,
  len: usize,
}

impl Directory {
  /// A single free block spanning an arena of `capacity` bytes.
  ///
  /// `capacity` must be larger than [`HEADER_SIZE`].
  pub fn new(capacity: usize) -> Self {
    Self {
      blocks: vec![Block::new(0, capacity - HEADER_SIZE, true, None, None)],
      vacant: Vec::new(),
      merged: BTreeSet::new(),
      head: 0,
      len: 1,
    }
  }

  pub fn head(&self) -> BlockId {
    self.head
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn get(
    &self,
    id: BlockId,
  ) -> &Block {
    &self.blocks[id]
  }

  pub fn get_mut(
    &mut self,
    id: BlockId,
  ) -> &mut Block {
    &mut self.blocks[id]
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      directory: self,
      current: Some(self.head),
      remaining: self.len,
    }
  }

  /// The block whose header or payload covers `offset`.
  pub fn find_containing(
    &self,
    offset: usize,
  ) -> Option<BlockId> {
    self
      .iter()
      .find(|(_, block)| block.contains(offset))
      .map(|(id, _)| id)
  }

  /// Whether a block header stood at `offset` before a merge folded it into
  /// the free block now covering it.
  pub fn was_merged(
    &self,
    offset: usize,
  ) -> bool {
    self.merged.contains(&offset)
  }

  /// Forgets merged headers inside block `id`, whose span is being handed
  /// out.
  pub fn claim(
    &mut self,
    id: BlockId,
  ) {
    let block = self.blocks[id];
    self.forget_merged(block.offset..block.end());
  }

  fn forget_merged(
    &mut self,
    span: Range<usize>,
  ) {
    let stale: Vec<usize> = self.merged.range(span).copied().collect();

    for offset in stale {
      self.merged.remove(&offset);
    }
  }

  /// Carves `size` payload bytes off the front of block `id`. The rest
  /// becomes a new free block linked right after it, whose id is returned.
  ///
  /// The caller guarantees `block.size > size + HEADER_SIZE`.
  pub fn split(
    &mut self,
    id: BlockId,
    size: usize,
  ) -> BlockId {
    let block = self.blocks[id];
    let remainder = Block::new(
      block.offset + HEADER_SIZE + size,
      block.size - size - HEADER_SIZE,
      true,
      Some(id),
      block.next,
    );

    let remainder_id = self.insert(remainder);
    self.forget_merged(remainder.offset..remainder.payload_offset());

    if let Some(next) = block.next {
      self.blocks[next].prev = Some(remainder_id);
    }

    let block = &mut self.blocks[id];
    block.size = size;
    block.next = Some(remainder_id);

    trace!(
      "split block at {:#x}: {} bytes kept, {} bytes free at {:#x}",
      block.offset, size, remainder.size, remainder.offset
    );

    remainder_id
  }

  /// Folds the successor of block `id` into it, header included, and
  /// destroys the successor's descriptor. Returns `false` at the tail.
  pub fn absorb_next(
    &mut self,
    id: BlockId,
  ) -> bool {
    let Some(next_id) = self.blocks[id].next else {
      return false;
    };
    let next = self.blocks[next_id];

    let block = &mut self.blocks[id];
    block.size += HEADER_SIZE + next.size;
    block.next = next.next;

    trace!(
      "merged block at {:#x} into {:#x}, now {} bytes",
      next.offset, block.offset, block.size
    );

    if let Some(after) = next.next {
      self.blocks[after].prev = Some(id);
    }

    self.merged.insert(next.offset);
    self.vacant.push(next_id);
    self.len -= 1;

    true
  }

  fn insert(
    &mut self,
    block: Block,
  ) -> BlockId {
    self.len += 1;

    match self.vacant.pop() {
      Some(id) => {
        self.blocks[id] = block;
        id
      }
      None => {
        self.blocks.push(block);
        self.blocks.len() - 1
      }
    }
  }
}

/// Head-to-tail walk over `(id, block)` pairs.
///
/// Stops after `len` steps even if the links form a cycle.
pub(crate) struct Iter<'a> {
  directory: &'a Directory,
  current: Option<BlockId>,
  remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
  type Item = (BlockId, &'a Block);

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }

    let id = self.current?;
    let block = self.directory.get(id);

    self.current = block.next;
    self.remaining -= 1;

    Some((id, block))
  }
}
