use std::fmt;

/// Opaque reference to an allocated payload: its byte offset from the
/// arena base.
///
/// The block header sits [`HEADER_SIZE`](crate::HEADER_SIZE) bytes before
/// the payload, so no payload can start at offset 0. That offset is
/// reserved for [`Handle::NULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
  pub const NULL: Handle = Handle(0);

  pub fn from_offset(offset: usize) -> Self {
    Self(offset)
  }

  pub fn offset(self) -> usize {
    self.0
  }

  pub fn is_null(self) -> bool {
    self.0 == 0
  }
}

impl fmt::Display for Handle {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{:#x}", self.0)
  }
}
