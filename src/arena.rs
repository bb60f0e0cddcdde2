use std::{io, ops::Range, ptr::{self, NonNull}, slice};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};
use log::{debug, warn};

use crate::error::Result;

/// Fixed-size byte region backing every block of a heap.
///
/// The region is requested from the kernel once with an anonymous `mmap`
/// and handed back with `munmap` when the arena is dropped. It never grows.
pub struct Arena {
  base: NonNull<u8>,
  capacity: usize,
}

impl Arena {
  /// Maps `capacity` zeroed bytes.
  ///
  /// `capacity` must be non-zero.
  pub fn map(capacity: usize) -> Result<Self> {
    let address = unsafe {
      mmap(
        ptr::null_mut(),
        capacity,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(io::Error::last_os_error().into());
    }

    let base = NonNull::new(address as *mut u8)
      .ok_or_else(|| io::Error::other("mmap returned a null address"))?;

    debug!("mapped arena of {} bytes at {:?}", capacity, base);

    Ok(Self { base, capacity })
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Whether `offset` lies inside `[0, capacity)`.
  pub fn contains(
    &self,
    offset: usize,
  ) -> bool {
    offset < self.capacity
  }

  pub fn bytes(
    &self,
    range: Range<usize>,
  ) -> &[u8] {
    debug_assert!(range.start <= range.end && range.end <= self.capacity);
    unsafe { slice::from_raw_parts(self.base.as_ptr().add(range.start), range.len()) }
  }

  pub fn bytes_mut(
    &mut self,
    range: Range<usize>,
  ) -> &mut [u8] {
    debug_assert!(range.start <= range.end && range.end <= self.capacity);
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr().add(range.start), range.len()) }
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    let status = unsafe { munmap(self.base.as_ptr() as *mut c_void, self.capacity) };

    if status != 0 {
      warn!("munmap of arena at {:?} failed: {}", self.base, io::Error::last_os_error());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_map_zeroed() {
    let arena = Arena::map(1000).unwrap();

    assert_eq!(arena.capacity(), 1000);
    assert!(arena.bytes(0..1000).iter().all(|byte| *byte == 0));
  }

  #[test]
  fn test_contains() {
    let arena = Arena::map(64).unwrap();

    assert!(arena.contains(0));
    assert!(arena.contains(63));
    assert!(!arena.contains(64));
  }

  #[test]
  fn test_write_read() {
    let mut arena = Arena::map(128).unwrap();

    arena.bytes_mut(32..36).copy_from_slice(&[1, 2, 3, 4]);

    assert_eq!(arena.bytes(32..36), &[1, 2, 3, 4]);
    assert_eq!(arena.bytes(36..40), &[0, 0, 0, 0]);
  }

  #[test]
  fn test_full_range() {
    let mut arena = Arena::map(64).unwrap();

    arena.bytes_mut(0..64).fill(7);

    assert_eq!(arena.bytes(0..64).len(), 64);
    assert!(arena.bytes(64..64).is_empty());
  }

  #[test]
  #[cfg(debug_assertions)]
  #[should_panic]
  fn test_bytes_past_end() {
    let arena = Arena::map(64).unwrap();

    arena.bytes(60..65);
  }

  #[test]
  fn test_independent_arenas() {
    let mut first = Arena::map(64).unwrap();
    let second = Arena::map(64).unwrap();

    first.bytes_mut(0..8).fill(0xAB);

    assert!(second.bytes(0..8).iter().all(|byte| *byte == 0));
  }
}
