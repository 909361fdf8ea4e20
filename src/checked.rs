//! A debug heap walker, compiled only with the `checked` feature.
//!
//! Walks every block from the first real payload to the epilogue and
//! verifies the invariants the block encoding and free-list index are
//! supposed to maintain. Intended for tests and the demo, not hot paths —
//! it's `O(heap size)` and does a second `O(free list size)` scan per call to
//! cross-check free-block membership.

use std::collections::HashSet;

use crate::alloc::Allocator;
use crate::backend::HeapBackend;
use crate::block;

/// Walks `allocator`'s heap and returns `Err` describing the first invariant
/// violation found, or `Ok(())` if the heap is consistent.
pub fn check_heap<B: HeapBackend>(allocator: &Allocator<B>) -> Result<(), String> {
  let mem = allocator.backend().as_slice();
  if mem.is_empty() {
    return Err("heap has not been initialized".into());
  }

  let index = allocator.index();
  let mut free_payloads = HashSet::new();
  for (bucket, head) in index.buckets() {
    let mut cursor = head;
    while let Some(payload) = cursor {
      if !free_payloads.insert(payload) {
        return Err(format!("block at {payload} appears twice in the free list (bucket {bucket})"));
      }
      if block::is_allocated(mem, block::header_of(payload)) {
        return Err(format!("block at {payload} is in the free list but marked allocated"));
      }
      let expected_bucket = index.bucket_for(block::size_of(mem, block::header_of(payload)));
      if expected_bucket != bucket {
        return Err(format!(
          "block at {payload} (size class {expected_bucket}) is filed under bucket {bucket}"
        ));
      }
      cursor = block::get_pred(mem, payload);
    }
  }

  // The first real block's payload sits right after the 4-word
  // padding/prologue/epilogue setup `Allocator::init` writes at heap offset 0.
  let mut payload = 4 * block::WSIZE;
  let mut prev_was_free = false;

  loop {
    let header = block::header_of(payload);
    let size = block::size_of(mem, header);
    if size == 0 {
      break; // epilogue
    }

    if payload % block::DSIZE != 0 {
      return Err(format!("block at {payload} is not 8-byte aligned"));
    }

    // Compare ignoring bit 1 (the reallocation tag), which only the header
    // ever carries.
    let footer = block::footer_of(mem, payload);
    if block::get_word(mem, header) & !0x2 != block::get_word(mem, footer) & !0x2 {
      return Err(format!("block at {payload} has mismatched header/footer (ignoring the tag bit)"));
    }

    let allocated = block::is_allocated(mem, header);
    if !allocated {
      if prev_was_free {
        return Err(format!("block at {payload} is free and follows another free block uncoalesced"));
      }
      if !free_payloads.contains(&payload) {
        return Err(format!("block at {payload} is marked free but absent from the free list"));
      }
    }
    prev_was_free = !allocated;

    payload = block::next_physical(mem, payload);
    if payload > mem.len() {
      return Err(format!("block overruns the heap at offset {payload}"));
    }
  }

  Ok(())
}
