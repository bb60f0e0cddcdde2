//! # rfirstfit - A First-Fit Heap over a Fixed Arena
//!
//! This crate provides a **first-fit heap** that hands out and takes back
//! pieces of one fixed-capacity memory region. Allocation splits free blocks,
//! deallocation merges neighbouring free blocks back together.
//!
//! ## Overview
//!
//! The arena is carved into blocks. Each block is a header followed by its
//! payload, and the blocks tile the arena from its first to its last byte:
//!
//! ```text
//!   Arena (capacity C):
//!
//!   ┌────────┬─────┬────────┬───────┬────────┬─────────────────────────────┐
//!   │ Header │  A  │ Header │   B   │ Header │          Free               │
//!   │  32 B  │ 1 B │  32 B  │  4 B  │  32 B  │         899 B               │
//!   └────────┴─────┴────────┴───────┴────────┴─────────────────────────────┘
//!   ▲        ▲
//!   │        └── Handle returned to the caller (payload offset)
//!   └── Offset 0                                              Offset C ──▲
//! ```
//!
//! The headers are kept in a separate directory of descriptors linked by
//! index, in physical order. The bytes they occupy in the arena are
//! reserved but never written, so a handle is just a payload offset and the
//! header is found `HEADER_SIZE` bytes before it.
//!
//! ## Crate Structure
//!
//! ```text
//!   rfirstfit
//!   ├── arena        - mmap-backed fixed byte region (internal)
//!   ├── block        - Block descriptor, HEADER_SIZE, BlockInfo
//!   ├── config       - HeapConfig, capacity from the environment
//!   ├── diagnostics  - list_blocks, stats, integrity check, heap report
//!   ├── directory    - Linked descriptor table (internal)
//!   ├── error        - HeapError
//!   ├── handle       - Handle
//!   └── heap         - Heap: allocate, free, coalescing
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rfirstfit::Heap;
//!
//! let mut heap = Heap::new(1000).unwrap();
//!
//! let handle = heap.allocate(4).unwrap();
//! heap.payload_mut(handle).unwrap().copy_from_slice(&42u32.to_le_bytes());
//!
//! heap.free(handle).unwrap();
//! assert!(heap.is_pristine());
//! ```
//!
//! ## How It Works
//!
//! `allocate(size)` walks the directory from the head and takes the first
//! free block whose size is either exactly `size` or larger than
//! `size + HEADER_SIZE`. A larger block is split in two:
//!
//! ```text
//!   Before:  ┌────────┬──────────────────────────────────────┐
//!            │ Header │            Free (968)                │
//!            └────────┴──────────────────────────────────────┘
//!
//!   After allocate(4):
//!            ┌────────┬─────┬────────┬───────────────────────┐
//!            │ Header │  4  │ Header │      Free (932)       │
//!            └────────┴─────┴────────┴───────────────────────┘
//! ```
//!
//! A free block sized between `size` and `size + HEADER_SIZE` cannot be
//! split and is not an exact match, so it is skipped for that request.
//!
//! `free(handle)` marks the block free and then makes one pass over the
//! whole directory, folding every run of adjacent free blocks into the first
//! block of the run.
//!
//! ## Errors
//!
//! Misuse never corrupts the heap. `allocate` reports
//! [`HeapError::OutOfMemory`], `free` reports [`HeapError::InvalidPointer`]
//! for null or foreign handles and [`HeapError::DoubleFree`] for handles whose
//! memory is already free. None of them change the directory.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: a `Heap` is neither `Send` nor `Sync`
//! - **Fixed capacity**: the arena never grows
//! - **No alignment guarantees**: payloads start right after their header
//! - **Unix-only**: the arena is mapped with `mmap` through `libc`

mod arena;
mod block;
mod config;
mod diagnostics;
mod directory;
mod error;
mod handle;
mod heap;

pub use block::{BlockInfo, HEADER_SIZE};
pub use config::{CAPACITY_ENV, DEFAULT_CAPACITY, HeapConfig};
pub use diagnostics::HeapStats;
pub use error::{HeapError, Result};
pub use handle::Handle;
pub use heap::Heap;
