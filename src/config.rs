//! Tunable constants for the allocator, gathered into one struct instead of
//! the bare `#define`s of the source this design is modeled on.

/// Allocator tuning parameters. `Default` reproduces the historical
/// constants of the design this crate implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
  /// Number of segregated-list size-class buckets.
  pub list_limit: usize,
  /// Heap extension requested by `init` after the prologue/epilogue setup.
  pub init_chunk: usize,
  /// Minimum heap extension requested when no free block fits a request.
  pub chunk: usize,
  /// Extra slack added to every `resize` target size.
  pub realloc_buffer: usize,
  /// Minimum adjusted size that takes the free-remainder-first split branch.
  pub split_threshold: usize,
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self {
      list_limit: 20,
      init_chunk: 1 << 6,
      chunk: 1 << 12,
      realloc_buffer: 1 << 7,
      split_threshold: 73,
    }
  }
}
