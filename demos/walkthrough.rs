//! Narrates a sequence of allocate/free/resize calls against the
//! segregated free-list allocator, logging the resulting free-list/heap
//! state at each step instead of pausing for a keypress.
//!
//! Run with `RUST_LOG=trace cargo run --example walkthrough --features checked`
//! to see every extend/coalesce/place decision as it happens.

use segalloc::{Allocator, HeapBackend, VecHeapBackend};

fn main() {
  env_logger::init();

  let mut allocator = Allocator::<VecHeapBackend>::with_defaults().expect("initial heap extension failed");

  log::info!("[1] allocate 4 bytes (u32)");
  let first = allocator.allocate(4).expect("allocation failed");
  allocator.payload_slice_mut(first)[..4].copy_from_slice(&0xDEADBEEFu32.to_ne_bytes());
  log::info!("    payload offset = {first}, wrote 0xDEADBEEF");

  log::info!("[2] allocate 12 bytes");
  let second = allocator.allocate(12).expect("allocation failed");
  allocator.payload_slice_mut(second)[..12].fill(0xAB);
  log::info!("    payload offset = {second}, filled with 0xAB");

  log::info!("[3] allocate 8 bytes (u64), check alignment");
  let third = allocator.allocate(8).expect("allocation failed");
  log::info!("    payload offset = {third}, offset % 8 = {}", third % 8);

  log::info!("[4] allocate 32 bytes ([u16; 16])");
  let fourth = allocator.allocate(32).expect("allocation failed");
  for (i, word) in allocator.payload_slice_mut(fourth)[..32].chunks_exact_mut(2).enumerate() {
    word.copy_from_slice(&(i as u16).to_ne_bytes());
  }
  log::info!("    payload offset = {fourth}, wrote 0..16 as u16 words");

  log::info!("[5] free the first block (offset {first})");
  allocator.free(first);

  log::info!("[6] allocate 2 bytes, see whether the freed block gets reused");
  let fifth = allocator.allocate(2).expect("allocation failed");
  if fifth == first {
    log::info!("    offset {fifth}: reused the freed block");
  } else {
    log::info!("    offset {fifth}: placed elsewhere");
  }

  log::info!("[7] allocate 64 KiB to force the heap to extend");
  let big = allocator.allocate(64 * 1024).expect("allocation failed");
  log::info!("    payload offset = {big}, heap is now {} bytes", allocator.backend().len());

  log::info!("[8] resize the 32-byte block up to 256 bytes");
  let grown = allocator.resize(fourth, 256).expect("resize failed");
  log::info!("    offset {grown} ({})", if grown == fourth { "grew in place" } else { "moved" });

  #[cfg(feature = "checked")]
  match segalloc::check_heap(&allocator) {
    Ok(()) => log::info!("[9] heap invariants hold"),
    Err(e) => log::error!("[9] heap invariant violation: {e}"),
  }

  log::info!("end of walkthrough; process exit reclaims the whole heap");
}
