//! # segalloc - a segregated free-list allocator
//!
//! A dynamic memory allocator built around an explicit free-list design:
//! header/footer boundary tags, size-class buckets of doubly-linked free
//! blocks, immediate coalescing on free, and a split/no-split heuristic that
//! chooses which side of a split block to hand back depending on the
//! request size.
//!
//! ## Crate structure
//!
//! ```text
//!   segalloc
//!   ├── align    - alignment macros (align8!, align_to!)
//!   ├── block    - header/footer encoding and boundary-tag navigation
//!   ├── config   - tunable constants
//!   ├── error    - AllocError
//!   ├── backend  - HeapBackend trait, VecHeapBackend, SbrkHeapBackend
//!   ├── index    - segregated free-list buckets (insert/delete)
//!   ├── alloc    - Allocator<B>: init/allocate/free/resize
//!   ├── global   - GlobalSegAlloc, a GlobalAlloc adapter
//!   └── checked  - debug heap walker (feature = "checked")
//! ```
//!
//! ## Quick start
//!
//! ```
//! use segalloc::{Allocator, VecHeapBackend};
//!
//! let mut allocator = Allocator::<VecHeapBackend>::with_defaults().unwrap();
//! let p = allocator.allocate(64).unwrap();
//! allocator.payload_slice_mut(p)[0] = 0xAB;
//! assert_eq!(allocator.payload_slice(p)[0], 0xAB);
//! allocator.free(p);
//! ```
//!
//! Every offset-taking method assumes it is only ever called with offsets
//! this allocator itself produced via `allocate`/`resize`; passing an
//! arbitrary `usize` is undefined behavior unless noted otherwise (the
//! `checked` feature narrows this for `free`/`resize`, at the cost of a
//! bounds/alignment/allocated-bit check on every call).
//!
//! ## Limitations
//!
//! - Single-threaded by design: `Allocator<B>` has no internal locking.
//!   [`GlobalSegAlloc`] adds a mutex only at the `GlobalAlloc` seam.
//! - Never shrinks the backing heap; freed memory is only ever reused, not
//!   returned to the backend.
//! - `resize(ptr, 0)` returns `None` without freeing `ptr`, matching the
//!   behavior of the source this design is modeled on rather than libc
//!   `realloc(p, 0)`. See `DESIGN.md`.

pub mod align;
mod alloc;
mod backend;
mod block;
#[cfg(feature = "checked")]
mod checked;
mod config;
mod error;
mod global;
mod index;

pub use alloc::Allocator;
pub use backend::{HeapBackend, VecHeapBackend};
#[cfg(feature = "libc-sbrk")]
pub use backend::SbrkHeapBackend;
#[cfg(feature = "checked")]
pub use checked::check_heap;
pub use config::AllocatorConfig;
pub use error::AllocError;
pub use global::GlobalSegAlloc;
