//! A `#[global_allocator]`-compatible adapter over [`Allocator`].
//!
//! The design this crate implements only ever ran as a librarian the test
//! harness linked against directly; registering it as the process's actual
//! allocator is an idiomatic Rust extension, not something in the original
//! design. It's opt-in: constructing one does nothing until a binary writes
//! `#[global_allocator] static ALLOC: GlobalSegAlloc = GlobalSegAlloc::new();`.

use std::alloc::{GlobalAlloc, Layout};
use std::sync::Mutex;

use crate::alloc::Allocator;
use crate::backend::VecHeapBackend;

/// Wraps an `Allocator<VecHeapBackend>` behind a mutex so it can implement
/// `GlobalAlloc`, which requires `Sync` and interior mutability. Lazily
/// initialized on first use rather than at construction, since `init`
/// allocates and `GlobalAlloc` statics must be built with a const fn.
pub struct GlobalSegAlloc {
  inner: Mutex<Option<Allocator<VecHeapBackend>>>,
}

impl GlobalSegAlloc {
  pub const fn new() -> Self {
    Self { inner: Mutex::new(None) }
  }
}

impl Default for GlobalSegAlloc {
  fn default() -> Self {
    Self::new()
  }
}

// SAFETY: every method locks `inner` before touching the allocator, and the
// allocator itself never holds a reference across the lock boundary.
unsafe impl GlobalAlloc for GlobalSegAlloc {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    // This allocator only ever hands out 8-byte-aligned blocks; reject
    // anything stricter rather than silently misaligning it.
    if layout.align() > std::mem::size_of::<usize>() {
      return std::ptr::null_mut();
    }
    let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    let allocator = guard.get_or_insert_with(|| {
      Allocator::with_defaults().expect("initial heap extension for the global allocator failed")
    });
    allocator.raw_allocate(layout.size())
  }

  unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
    let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(allocator) = guard.as_mut() {
      // SAFETY: forwarded from the caller's GlobalAlloc contract.
      unsafe { allocator.raw_free(ptr) };
    }
  }

  unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
    if layout.align() > std::mem::size_of::<usize>() {
      return std::ptr::null_mut();
    }
    let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    match guard.as_mut() {
      // SAFETY: forwarded from the caller's GlobalAlloc contract.
      Some(allocator) => unsafe { allocator.raw_resize(ptr, new_size) },
      None => std::ptr::null_mut(),
    }
  }
}
