/// Bytes reserved in front of every payload for the block header.
///
/// Matches a `{ int free; size_t size; prev; next }` header on a 64-bit target.
pub const HEADER_SIZE: usize = 32;

/// Index of a descriptor inside the directory's table.
pub(crate) type BlockId = usize;

/// Descriptor of one contiguous arena span: a header followed by `size`
/// payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
  pub offset: usize,
  pub size: usize,
  pub is_free: bool,
  pub prev: Option<BlockId>,
  pub next: Option<BlockId>,
}

impl Block {
  pub fn new(
    offset: usize,
    size: usize,
    is_free: bool,
    prev: Option<BlockId>,
    next: Option<BlockId>,
  ) -> Self {
    Self { offset, size, is_free, prev, next }
  }

  pub fn payload_offset(&self) -> usize {
    self.offset + HEADER_SIZE
  }

  /// First byte past the payload.
  pub fn end(&self) -> usize {
    self.payload_offset() + self.size
  }

  pub fn contains(
    &self,
    offset: usize,
  ) -> bool {
    self.offset <= offset && offset < self.end()
  }

  /// First-fit eligibility: an exact match, or room for `size` bytes plus
  /// the header of the free remainder and at least one byte of it.
  pub fn fits(
    &self,
    size: usize,
  ) -> bool {
    self.is_free
      && (self.size == size
        || size
          .checked_add(HEADER_SIZE)
          .is_some_and(|needed| self.size > needed))
  }

  pub fn info(&self) -> BlockInfo {
    BlockInfo {
      offset: self.offset,
      free: self.is_free,
      size: self.size,
    }
  }
}

/// Read-only snapshot of a block, as reported by
/// [`Heap::list_blocks`](crate::Heap::list_blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockInfo {
  /// Offset of the block header from the arena base.
  pub offset: usize,
  pub free: bool,
  /// Payload bytes, header excluded.
  pub size: usize,
}
