//! Public operations: `init`, `allocate`, `free`, `resize`, and the private
//! coalescing/placement helpers they're built from.
//!
//! This is the orchestration layer the design calls out as its own
//! component; unlike the free-standing C functions it's modeled on
//! (`mm_malloc`, `mm_free`, `mm_realloc`, `coalesce`, `place`, all working
//! through a single process-wide `segregated_free_lists` global), every
//! operation here is a method on an owned [`Allocator`] value.

use crate::backend::HeapBackend;
use crate::block;
use crate::config::AllocatorConfig;
use crate::error::AllocError;
use crate::index::FreeListIndex;
use crate::align8;

/// A segregated-fit allocator over a heap supplied by `B`.
pub struct Allocator<B: HeapBackend> {
  backend: B,
  index: FreeListIndex,
  config: AllocatorConfig,
}

impl<B: HeapBackend> Allocator<B> {
  /// Constructs an allocator over `backend`. Callers must still call
  /// [`Allocator::init`] before any other operation; idempotency of `init`
  /// is not guaranteed.
  pub fn new(backend: B, config: AllocatorConfig) -> Self {
    let index = FreeListIndex::new(config.list_limit);
    Self { backend, index, config }
  }

  pub fn config(&self) -> &AllocatorConfig {
    &self.config
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn backend_mut(&mut self) -> &mut B {
    &mut self.backend
  }

  /// Lays down the padding/prologue/epilogue sentinels and performs the
  /// first heap extension.
  pub fn init(&mut self) -> Result<(), AllocError> {
    self.index = FreeListIndex::new(self.config.list_limit);

    let off = self.backend.grow(4 * block::WSIZE).map_err(|_| AllocError::OutOfMemory)?;
    let mem = self.backend.as_mut_slice();
    block::put_untagged(mem, off, 0); // alignment padding
    block::put_untagged(mem, off + block::WSIZE, block::pack(block::DSIZE, true)); // prologue header
    block::put_untagged(mem, off + 2 * block::WSIZE, block::pack(block::DSIZE, true)); // prologue footer
    block::put_untagged(mem, off + 3 * block::WSIZE, block::pack(0, true)); // epilogue header

    self.extend(self.config.init_chunk)?;
    log::debug!("allocator initialized");
    Ok(())
  }

  /// `asize = 16` for requests of 8 bytes or fewer; otherwise the request
  /// plus header/footer overhead, rounded up to 8 bytes.
  fn adjusted_size(size: usize) -> usize {
    if size <= block::DSIZE { 2 * block::DSIZE } else { align8!(size + block::DSIZE) }
  }

  /// Extends the heap by `requested_bytes` (rounded up to 8 bytes),
  /// installs the new free block and epilogue, indexes it, and coalesces
  /// it with whatever free block preceded the old epilogue.
  fn extend(&mut self, requested_bytes: usize) -> Result<usize, AllocError> {
    let asize = align8!(requested_bytes);
    let off = self.backend.grow(asize).map_err(|_| AllocError::OutOfMemory)?;

    let mem = self.backend.as_mut_slice();
    block::put_untagged(mem, block::header_of(off), block::pack(asize, false));
    block::put_untagged(mem, block::footer_of(mem, off), block::pack(asize, false));
    let new_epilogue = block::header_of(block::next_physical(mem, off));
    block::put_untagged(mem, new_epilogue, block::pack(0, true));
    self.index.insert(mem, off, asize);

    log::trace!("extended heap by {asize} bytes at offset {off}");
    Ok(self.coalesce(off))
  }

  /// Merges `payload` with whichever of its physical neighbors are free.
  /// Returns the payload offset of the resulting block.
  fn coalesce(&mut self, payload: usize) -> usize {
    let mem = self.backend.as_mut_slice();
    let prev = block::prev_physical(mem, payload);
    let next = block::next_physical(mem, payload);
    let prev_alloc = block::is_allocated(mem, block::header_of(prev));
    let next_alloc = block::is_allocated(mem, block::header_of(next));
    let mut size = block::size_of(mem, block::header_of(payload));

    // The reallocation tag is tracked for observability only: a tagged
    // neighbor still merges normally. See `retag_if_thin`.
    if (!prev_alloc && block::tag_of(mem, block::header_of(prev))) || (!next_alloc && block::tag_of(mem, block::header_of(next))) {
      log::trace!("coalescing block at {payload} absorbs a tagged neighbor");
    }

    let merged = match (prev_alloc, next_alloc) {
      (true, true) => payload,
      (true, false) => {
        self.index.delete(mem, payload);
        self.index.delete(mem, next);
        size += block::size_of(mem, block::header_of(next));
        block::put_untagged(mem, block::header_of(payload), block::pack(size, false));
        block::put_untagged(mem, block::footer_of(mem, payload), block::pack(size, false));
        self.index.insert(mem, payload, size);
        payload
      }
      (false, true) => {
        self.index.delete(mem, payload);
        self.index.delete(mem, prev);
        size += block::size_of(mem, block::header_of(prev));
        block::put_untagged(mem, block::footer_of(mem, payload), block::pack(size, false));
        block::put_untagged(mem, block::header_of(prev), block::pack(size, false));
        self.index.insert(mem, prev, size);
        prev
      }
      (false, false) => {
        self.index.delete(mem, payload);
        self.index.delete(mem, prev);
        self.index.delete(mem, next);
        size += block::size_of(mem, block::header_of(prev)) + block::size_of(mem, block::header_of(next));
        block::put_untagged(mem, block::header_of(prev), block::pack(size, false));
        block::put_untagged(mem, block::footer_of(mem, next), block::pack(size, false));
        self.index.insert(mem, prev, size);
        prev
      }
    };

    if merged != payload {
      log::trace!("coalesced block at {payload} into {merged} ({size} bytes)");
    }
    merged
  }

  /// Scans the segregated index, starting at `asize`'s own bucket and
  /// moving to larger buckets, for the first free block big enough.
  fn find_fit(&self, asize: usize) -> Option<usize> {
    let mem = self.backend.as_slice();
    let start = self.index.bucket_for(asize);
    for list in start..self.index.list_limit() {
      let mut candidate = self.index.head(list);
      while let Some(c) = candidate {
        if block::size_of(mem, block::header_of(c)) >= asize {
          return Some(c);
        }
        candidate = block::get_pred(mem, c);
      }
    }
    None
  }

  /// Carves `asize` bytes out of the free block at `payload`, splitting it
  /// if the remainder is big enough to stay a valid free block, and
  /// directing small allocations to the low side of a large split / large
  /// allocations to the high side (see `AllocatorConfig::split_threshold`).
  fn place(&mut self, payload: usize, asize: usize) -> usize {
    let mem = self.backend.as_mut_slice();
    let block_size = block::size_of(mem, block::header_of(payload));
    self.index.delete(mem, payload);
    let remainder = block_size - asize;

    // A free block needs room for header + pred + succ + footer (16 bytes);
    // anything smaller can't be split off and is handed out whole.
    if remainder <= 2 * block::DSIZE {
      block::put_untagged(mem, block::header_of(payload), block::pack(block_size, true));
      block::put_untagged(mem, block::footer_of(mem, payload), block::pack(block_size, true));
      return payload;
    }

    if asize >= self.config.split_threshold {
      block::put_untagged(mem, block::header_of(payload), block::pack(remainder, false));
      block::put_untagged(mem, block::footer_of(mem, payload), block::pack(remainder, false));
      let alloc_payload = block::next_physical(mem, payload);
      block::put_untagged(mem, block::header_of(alloc_payload), block::pack(asize, true));
      block::put_untagged(mem, block::footer_of(mem, alloc_payload), block::pack(asize, true));
      self.index.insert(mem, payload, remainder);
      alloc_payload
    } else {
      block::put_untagged(mem, block::header_of(payload), block::pack(asize, true));
      block::put_untagged(mem, block::footer_of(mem, payload), block::pack(asize, true));
      let free_payload = block::next_physical(mem, payload);
      block::put_untagged(mem, block::header_of(free_payload), block::pack(remainder, false));
      block::put_untagged(mem, block::footer_of(mem, free_payload), block::pack(remainder, false));
      self.index.insert(mem, free_payload, remainder);
      payload
    }
  }

  /// Allocates `size` bytes, returning `Err` only on heap exhaustion.
  /// `size == 0` is handled by [`Allocator::allocate`], not here.
  pub fn try_allocate(&mut self, size: usize) -> Result<usize, AllocError> {
    let asize = Self::adjusted_size(size);

    let payload = match self.find_fit(asize) {
      Some(found) => found,
      None => {
        let extend_size = asize.max(self.config.chunk);
        self.extend(extend_size)?
      }
    };

    Ok(self.place(payload, asize))
  }

  /// Allocates `size` bytes. Returns `None` for `size == 0` or on heap
  /// exhaustion alike; use [`Allocator::try_allocate`] to distinguish them.
  pub fn allocate(&mut self, size: usize) -> Option<usize> {
    if size == 0 {
      return None;
    }
    self.try_allocate(size).ok()
  }

  /// Frees the block at `payload` unconditionally. `payload` must be a
  /// value this allocator previously returned from `allocate`/`resize` and
  /// not yet freed; violating that is undefined behavior (see the
  /// `checked` feature for a cheap, opt-in guard).
  pub fn free(&mut self, payload: usize) {
    let mem = self.backend.as_mut_slice();
    let size = block::size_of(mem, block::header_of(payload));
    block::put_untagged(mem, block::header_of(payload), block::pack(size, false));
    block::put_untagged(mem, block::footer_of(mem, payload), block::pack(size, false));
    self.index.insert(mem, payload, size);
    self.coalesce(payload);
  }

  /// Resizes the block at `payload` to hold at least `new_size` bytes,
  /// with a tuned overallocation buffer so repeated small growths can stay
  /// in place. `new_size == 0` returns `None` without freeing `payload` —
  /// see `DESIGN.md` for why this diverges from libc `realloc(p, 0)`.
  pub fn try_resize(&mut self, payload: usize, new_size: usize) -> Result<usize, AllocError> {
    let target = Self::adjusted_size(new_size) + self.config.realloc_buffer;
    let avail = block::size_of(self.backend.as_slice(), block::header_of(payload));

    let result = if avail >= target {
      payload
    } else {
      let mem = self.backend.as_slice();
      let mut next = block::next_physical(mem, payload);
      let next_header = block::header_of(next);
      let next_is_free_or_epilogue = !block::is_allocated(mem, next_header) || block::size_of(mem, next_header) == 0;

      if next_is_free_or_epilogue {
        let mut combined = avail + block::size_of(self.backend.as_slice(), next_header);
        if target > combined {
          let deficit = target - combined;
          self.extend(deficit.max(self.config.chunk))?;
          let mem = self.backend.as_slice();
          next = block::next_physical(mem, payload);
          combined = avail + block::size_of(mem, block::header_of(next));
        }

        let mem = self.backend.as_mut_slice();
        self.index.delete(mem, next);
        block::put_untagged(mem, block::header_of(payload), block::pack(combined, true));
        block::put_untagged(mem, block::footer_of(mem, payload), block::pack(combined, true));
        log::trace!("resized block at {payload} in place to {combined} bytes");
        payload
      } else {
        let new_payload = self.try_allocate(target.saturating_sub(block::DSIZE))?;
        let copy_len = new_size.min(target).min(avail);
        let mem = self.backend.as_mut_slice();
        mem.copy_within(payload..payload + copy_len, new_payload);
        self.free(payload);
        log::trace!("resized block at {payload} by reallocating to {new_payload}");
        new_payload
      }
    };

    self.retag_if_thin(result, target);
    Ok(result)
  }

  /// Resizes to `new_size` bytes, or returns `None` for `new_size == 0`
  /// or on heap exhaustion alike.
  pub fn resize(&mut self, payload: usize, new_size: usize) -> Option<usize> {
    if new_size == 0 {
      return None;
    }
    self.try_resize(payload, new_size).ok()
  }

  /// Tags the block physically after `result` when the buffer this resize
  /// left behind is thin. Tracked for observability only: `coalesce` never
  /// consults this tag to veto a merge, matching the behavior of the
  /// design this is modeled on (whose own tag-setting call sites were
  /// themselves disabled).
  fn retag_if_thin(&mut self, result: usize, target: usize) {
    let mem = self.backend.as_slice();
    let final_size = block::size_of(mem, block::header_of(result));
    let buffer = final_size.saturating_sub(target);
    if buffer >= 2 * self.config.realloc_buffer {
      return;
    }
    let next = block::next_physical(mem, result);
    let next_header = block::header_of(next);
    if block::is_allocated(mem, next_header) {
      return;
    }
    let mem = self.backend.as_mut_slice();
    block::set_tag(mem, next_header);
    log::trace!("tagged block at {next} after thin resize buffer ({buffer} bytes)");
  }

  /// Read-only view of an allocated block's usable payload bytes.
  pub fn payload_slice(&self, payload: usize) -> &[u8] {
    let mem = self.backend.as_slice();
    let usable = block::size_of(mem, block::header_of(payload)) - block::DSIZE;
    &mem[payload..payload + usable]
  }

  /// Mutable view of an allocated block's usable payload bytes.
  pub fn payload_slice_mut(&mut self, payload: usize) -> &mut [u8] {
    let mem = self.backend.as_mut_slice();
    let usable = block::size_of(mem, block::header_of(payload)) - block::DSIZE;
    &mut mem[payload..payload + usable]
  }

  /// `init() -> 0 | -1`, matching the distilled spec's external-interface
  /// wording exactly for callers that want the raw sentinel instead of
  /// `Result`.
  pub fn raw_init(&mut self) -> i32 {
    match self.init() {
      Ok(()) => 0,
      Err(_) => -1,
    }
  }

  /// `allocate(size) -> pointer | NULL`.
  pub fn raw_allocate(&mut self, size: usize) -> *mut u8 {
    match self.allocate(size) {
      // SAFETY: `offset` came from `allocate`, which only ever returns
      // offsets within the backend's current length.
      Some(offset) => unsafe { self.backend.base_ptr().add(offset) },
      None => std::ptr::null_mut(),
    }
  }

  /// `free(ptr)`.
  ///
  /// # Safety
  /// `ptr` must be null, or a value previously returned by
  /// [`Allocator::raw_allocate`]/[`Allocator::raw_resize`] on this
  /// allocator and not yet freed.
  pub unsafe fn raw_free(&mut self, ptr: *mut u8) {
    if ptr.is_null() {
      return;
    }
    let base = self.backend.base_ptr() as usize;
    let offset = ptr as usize - base;
    self.free(offset);
  }

  /// `resize(ptr, new_size) -> pointer | NULL`.
  ///
  /// # Safety
  /// Same contract as [`Allocator::raw_free`] for a non-null `ptr`.
  pub unsafe fn raw_resize(&mut self, ptr: *mut u8, new_size: usize) -> *mut u8 {
    let offset = if ptr.is_null() {
      return self.raw_allocate(new_size);
    } else {
      let base = self.backend.base_ptr() as usize;
      ptr as usize - base
    };
    match self.resize(offset, new_size) {
      // SAFETY: see raw_allocate.
      Some(new_offset) => unsafe { self.backend.base_ptr().add(new_offset) },
      None => std::ptr::null_mut(),
    }
  }
}

#[cfg(feature = "checked")]
impl<B: HeapBackend> Allocator<B> {
  /// Read-only access to the segregated index, for the debug heap walker.
  pub fn index(&self) -> &FreeListIndex {
    &self.index
  }

  /// Cheap, opt-in validation of an offset before mutating the heap:
  /// in-range, header-aligned, and currently marked allocated.
  fn is_valid_allocation(&self, payload: usize) -> bool {
    let mem = self.backend.as_slice();
    if payload < 4 * block::WSIZE || payload % block::DSIZE != 0 {
      return false;
    }
    if payload + block::WSIZE > mem.len() {
      return false;
    }
    block::is_allocated(mem, block::header_of(payload))
  }

  /// `free`, but returns `Err(AllocError::InvalidPointer)` instead of
  /// corrupting the heap when `payload` fails the cheap checks above.
  pub fn try_free(&mut self, payload: usize) -> Result<(), AllocError> {
    if !self.is_valid_allocation(payload) {
      return Err(AllocError::InvalidPointer { offset: payload });
    }
    self.free(payload);
    Ok(())
  }
}

impl<B: HeapBackend + Default> Allocator<B> {
  /// Builds an allocator with default tuning over a freshly constructed
  /// backend and initializes it.
  pub fn with_defaults() -> Result<Self, AllocError> {
    let mut allocator = Self::new(B::default(), AllocatorConfig::default());
    allocator.init()?;
    Ok(allocator)
  }
}
