//! Error types returned by the fallible public operations.

use thiserror::Error;

/// The two failure modes this allocator can report: heap exhaustion, and
/// (only with the `checked` feature) a caller contract violation cheap
/// enough to detect in `free`/`resize`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  /// The heap backend's `grow` call failed; no heap state was mutated.
  #[error("heap backend failed to extend")]
  OutOfMemory,

  /// `free`/`resize` was asked to operate on an offset that is out of
  /// range, misaligned, or not currently marked allocated. Only ever
  /// returned when the `checked` feature is enabled.
  #[error("invalid pointer at offset {offset}")]
  InvalidPointer { offset: usize },
}
