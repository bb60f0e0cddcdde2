use log::{debug, trace, warn};

use crate::{
  arena::Arena,
  block::{BlockId, HEADER_SIZE},
  config::HeapConfig,
  directory::Directory,
  error::{HeapError, Result},
  handle::Handle,
};

/// First-fit heap over a fixed-capacity arena.
pub struct Heap {
  pub(crate) arena: Arena,
  pub(crate) directory: Directory,
}

impl Heap {
  /// Maps an arena of `capacity` bytes holding one free block of
  /// `capacity - HEADER_SIZE` bytes.
  pub fn new(capacity: usize) -> Result<Self> {
    if capacity <= HEADER_SIZE {
      return Err(HeapError::CapacityTooSmall { capacity });
    }

    let arena = Arena::map(capacity)?;
    let directory = Directory::new(capacity);

    debug!("initialized heap of {} bytes", capacity);

    Ok(Self { arena, directory })
  }

  pub fn with_config(config: &HeapConfig) -> Result<Self> {
    Self::new(config.capacity)
  }

  pub fn capacity(&self) -> usize {
    self.arena.capacity()
  }

  fn find_free_block(
    &self,
    size: usize,
  ) -> Option<BlockId> {
    self
      .directory
      .iter()
      .inspect(|(_, block)| {
        trace!("visit block at {:#x}: free={}, size={}", block.offset, block.is_free, block.size)
      })
      .find(|(_, block)| block.fits(size))
      .map(|(id, _)| id)
  }

  /// Reserves `size` bytes in the first eligible free block.
  ///
  /// A free block is eligible when its size equals `size` exactly, or when it
  /// exceeds `size + HEADER_SIZE` so the rest can become a free block of its
  /// own. Blocks in between are passed over even if they are large enough.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Handle> {
    let Some(id) = self.find_free_block(size) else {
      warn!("no suitable free block for {} bytes", size);
      return Err(HeapError::OutOfMemory { requested: size });
    };

    if self.directory.get(id).size != size {
      self.directory.split(id, size);
    }

    self.directory.claim(id);

    let block = self.directory.get_mut(id);
    block.is_free = false;

    let handle = Handle::from_offset(block.payload_offset());
    debug!("allocated {} bytes at {}", size, handle);

    Ok(handle)
  }

  /// Releases the block behind `handle` and merges adjacent free blocks.
  pub fn free(
    &mut self,
    handle: Handle,
  ) -> Result<()> {
    let id = self.find_block(handle)?;
    let block = self.directory.get_mut(id);

    if block.is_free {
      warn!("memory at {} is already free", handle);
      return Err(HeapError::DoubleFree {
        offset: handle.offset(),
      });
    }

    block.is_free = true;
    debug!("freed {} bytes at {}", block.size, handle);

    self.coalesce();

    Ok(())
  }

  /// Payload bytes of a live allocation.
  pub fn payload(
    &self,
    handle: Handle,
  ) -> Result<&[u8]> {
    let id = self.find_live_block(handle)?;
    let block = self.directory.get(id);

    Ok(self.arena.bytes(block.payload_offset()..block.end()))
  }

  pub fn payload_mut(
    &mut self,
    handle: Handle,
  ) -> Result<&mut [u8]> {
    let id = self.find_live_block(handle)?;
    let block = *self.directory.get(id);

    Ok(self.arena.bytes_mut(block.payload_offset()..block.end()))
  }

  /// Resolves `handle` to the block whose header sits right before it.
  ///
  /// A handle whose block was merged away into a free neighbour resolves to
  /// that free block, so freeing it again is reported as a double free. Any
  /// other offset that is not a block header is an invalid pointer.
  fn find_block(
    &self,
    handle: Handle,
  ) -> Result<BlockId> {
    let invalid = || {
      warn!("memory at {} is either null or was not allocated by this heap", handle);
      HeapError::InvalidPointer {
        offset: handle.offset(),
      }
    };

    if handle.is_null() || !self.arena.contains(handle.offset()) {
      return Err(invalid());
    }

    let header = handle.offset().checked_sub(HEADER_SIZE).ok_or_else(invalid)?;
    let id = self.directory.find_containing(header).ok_or_else(invalid)?;
    let block = self.directory.get(id);

    if block.offset == header || (block.is_free && self.directory.was_merged(header)) {
      Ok(id)
    } else {
      Err(invalid())
    }
  }

  fn find_live_block(
    &self,
    handle: Handle,
  ) -> Result<BlockId> {
    let id = self.find_block(handle)?;
    let block = self.directory.get(id);

    if block.is_free || block.payload_offset() != handle.offset() {
      return Err(HeapError::InvalidPointer {
        offset: handle.offset(),
      });
    }

    Ok(id)
  }

  /// One pass over the whole directory folding every run of adjacent free
  /// blocks into its first block. The cursor stays put after a merge so a
  /// run of any length collapses in a single pass.
  fn coalesce(&mut self) {
    let mut current = Some(self.directory.head());

    while let Some(id) = current {
      let block = *self.directory.get(id);

      match block.next {
        Some(next) if block.is_free && self.directory.get(next).is_free => {
          self.directory.absorb_next(id);
        }
        next => current = next,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn layout(heap: &Heap) -> Vec<(bool, usize)> {
    heap
      .list_blocks()
      .into_iter()
      .map(|info| (info.free, info.size))
      .collect()
  }

  #[test]
  fn test_new() {
    let heap = Heap::new(1000).unwrap();

    assert_eq!(heap.capacity(), 1000);
    assert_eq!(layout(&heap), vec![(true, 968)]);
  }

  #[test]
  fn test_new_too_small() {
    assert!(matches!(
      Heap::new(32),
      Err(HeapError::CapacityTooSmall { capacity: 32 })
    ));
    assert!(matches!(
      Heap::new(0),
      Err(HeapError::CapacityTooSmall { capacity: 0 })
    ));
    assert_eq!(layout(&Heap::new(33).unwrap()), vec![(true, 1)]);
  }

  #[test]
  fn test_alloc() {
    let mut heap = Heap::new(1000).unwrap();

    let first = heap.allocate(1).unwrap();
    let second = heap.allocate(4).unwrap();

    assert_eq!(first.offset(), 32);
    assert_eq!(second.offset(), 65);
    assert_eq!(layout(&heap), vec![(false, 1), (false, 4), (true, 899)]);
  }

  #[test]
  fn test_alloc_exact_fit() {
    let mut heap = Heap::new(1000).unwrap();

    let handle = heap.allocate(968).unwrap();

    assert_eq!(handle.offset(), 32);
    assert_eq!(layout(&heap), vec![(false, 968)]);
    assert!(matches!(
      heap.allocate(0),
      Err(HeapError::OutOfMemory { requested: 0 })
    ));
  }

  #[test]
  fn test_alloc_reuses_freed_block() {
    let mut heap = Heap::new(1000).unwrap();

    let first = heap.allocate(8).unwrap();
    let _second = heap.allocate(8).unwrap();

    heap.free(first).unwrap();

    let third = heap.allocate(8).unwrap();

    assert_eq!(first, third);
  }

  #[test]
  fn test_free_merges_triple_run() {
    let mut heap = Heap::new(1000).unwrap();

    let a = heap.allocate(10).unwrap();
    let b = heap.allocate(10).unwrap();
    let c = heap.allocate(10).unwrap();
    let _d = heap.allocate(10).unwrap();

    heap.free(a).unwrap();
    heap.free(c).unwrap();
    assert_eq!(
      layout(&heap),
      vec![(true, 10), (false, 10), (true, 10), (false, 10), (true, 800)]
    );

    heap.free(b).unwrap();
    assert_eq!(layout(&heap), vec![(true, 94), (false, 10), (true, 800)]);
  }

  #[test]
  fn test_coalesce_collapses_long_run_in_one_pass() {
    let mut heap = Heap::new(1000).unwrap();
    let head = heap.directory.head();

    heap.directory.split(head, 1);
    let second = heap.directory.get(head).next.unwrap();
    heap.directory.split(second, 1);
    let third = heap.directory.get(second).next.unwrap();
    heap.directory.split(third, 1);

    assert_eq!(heap.directory.len(), 4);

    heap.coalesce();

    assert_eq!(layout(&heap), vec![(true, 968)]);
    assert_eq!(heap.directory.get(head).next, None);
  }

  #[test]
  fn test_find_block_rejects_payload_interior() {
    let mut heap = Heap::new(1000).unwrap();

    let handle = heap.allocate(100).unwrap();
    let inside = Handle::from_offset(handle.offset() + 50);

    assert!(matches!(
      heap.free(inside),
      Err(HeapError::InvalidPointer { .. })
    ));
    assert!(matches!(
      heap.free(Handle::from_offset(8)),
      Err(HeapError::InvalidPointer { offset: 8 })
    ));
  }

  #[test]
  fn test_find_block_in_free_space() {
    let mut heap = Heap::new(1000).unwrap();

    assert!(matches!(
      heap.free(Handle::from_offset(500)),
      Err(HeapError::InvalidPointer { offset: 500 })
    ));

    let handle = heap.allocate(100).unwrap();
    assert_eq!(handle.offset(), 32);

    assert!(matches!(
      heap.free(Handle::from_offset(232)),
      Err(HeapError::InvalidPointer { offset: 232 })
    ));
  }

  #[test]
  fn test_merged_handle_forgotten_once_reallocated() {
    let mut heap = Heap::new(1000).unwrap();

    let a = heap.allocate(10).unwrap();
    let b = heap.allocate(10).unwrap();
    let _c = heap.allocate(10).unwrap();

    heap.free(b).unwrap();
    heap.free(a).unwrap();
    assert!(matches!(heap.free(b), Err(HeapError::DoubleFree { .. })));

    heap.allocate(52).unwrap();
    assert!(matches!(heap.free(b), Err(HeapError::InvalidPointer { .. })));
  }

  #[test]
  fn test_payload_roundtrip() {
    let mut heap = Heap::new(1000).unwrap();

    let handle = heap.allocate(2).unwrap();
    heap.payload_mut(handle).unwrap().copy_from_slice(b"BC");

    assert_eq!(heap.payload(handle).unwrap(), b"BC");
  }

  #[test]
  fn test_payload_of_freed_handle() {
    let mut heap = Heap::new(1000).unwrap();

    let handle = heap.allocate(4).unwrap();
    heap.free(handle).unwrap();

    assert!(matches!(
      heap.payload(handle),
      Err(HeapError::InvalidPointer { .. })
    ));
  }
}
