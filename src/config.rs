use std::env;

use log::warn;

/// Capacity used when none is configured: a 1 KB heap.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Environment variable holding the arena capacity in bytes.
pub const CAPACITY_ENV: &str = "RFIRSTFIT_CAPACITY";

/// Construction-time settings of a [`Heap`](crate::Heap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  pub capacity: usize,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
    }
  }
}

impl HeapConfig {
  pub fn new(capacity: usize) -> Self {
    Self { capacity }
  }

  /// Reads [`CAPACITY_ENV`], falling back to [`DEFAULT_CAPACITY`] when the
  /// variable is unset or not a decimal byte count.
  pub fn from_env() -> Self {
    Self::from_value(env::var(CAPACITY_ENV).ok().as_deref())
  }

  fn from_value(value: Option<&str>) -> Self {
    let Some(value) = value else {
      return Self::default();
    };

    match value.trim().parse::<usize>() {
      Ok(capacity) => Self { capacity },
      Err(err) => {
        warn!(
          "ignoring {}={:?} ({}), using {} bytes",
          CAPACITY_ENV, value, err, DEFAULT_CAPACITY
        );
        Self::default()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default() {
    assert_eq!(HeapConfig::default().capacity, 1000);
  }

  #[test]
  fn test_from_value() {
    assert_eq!(HeapConfig::from_value(None), HeapConfig::default());
    assert_eq!(HeapConfig::from_value(Some("4096")).capacity, 4096);
    assert_eq!(HeapConfig::from_value(Some(" 64\n")).capacity, 64);
  }

  #[test]
  fn test_from_env() {
    unsafe { env::set_var(CAPACITY_ENV, "2048") };
    let configured = HeapConfig::from_env();

    unsafe { env::remove_var(CAPACITY_ENV) };
    let unset = HeapConfig::from_env();

    assert_eq!(configured.capacity, 2048);
    assert_eq!(unset, HeapConfig::default());
  }

  #[test]
  fn test_from_value_invalid() {
    assert_eq!(HeapConfig::from_value(Some("1KB")), HeapConfig::default());
    assert_eq!(HeapConfig::from_value(Some("-1")), HeapConfig::default());
    assert_eq!(HeapConfig::from_value(Some("")), HeapConfig::default());
  }
}
