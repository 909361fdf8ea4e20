//! Segregated free-list index: an array of size-class buckets, each a
//! doubly-linked, size-ascending list of free blocks.
//!
//! The insertion and deletion algorithms are a direct translation of
//! `insert_node`/`delete_node` from the design this crate is modeled on,
//! with raw `void *` list pointers replaced by `Option<usize>` payload
//! offsets into the allocator's heap slice.

use crate::block;

/// Segregated free-list buckets. Bucket `k` nominally holds free blocks
/// whose size falls in `[2^k, 2^(k+1))`; the last bucket absorbs overflow.
pub struct FreeListIndex {
  heads: Vec<Option<usize>>,
}

impl FreeListIndex {
  pub fn new(list_limit: usize) -> Self {
    Self { heads: vec![None; list_limit] }
  }

  pub fn list_limit(&self) -> usize {
    self.heads.len()
  }

  /// `k = min(list_limit - 1, floor(log2(size)))`.
  pub fn bucket_for(&self, mut size: usize) -> usize {
    let limit = self.heads.len();
    let mut list = 0;
    while list < limit - 1 && size > 1 {
      size >>= 1;
      list += 1;
    }
    list
  }

  pub fn head(&self, bucket: usize) -> Option<usize> {
    self.heads[bucket]
  }

  pub fn buckets(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
    self.heads.iter().copied().enumerate()
  }

  /// Inserts `payload` (a free block of `size` bytes) into its bucket,
  /// preserving ascending-size order when the bucket is walked via PRED.
  pub fn insert(&mut self, mem: &mut [u8], payload: usize, size: usize) {
    let list = self.bucket_for(size);

    // Walk toward larger blocks until we either run off the end of the
    // bucket or find one at least as big as `size`.
    let mut search = self.heads[list];
    let mut smaller_neighbor = None;
    while let Some(candidate) = search {
      if size > block::size_of(mem, block::header_of(candidate)) {
        smaller_neighbor = Some(candidate);
        search = block::get_pred(mem, candidate);
      } else {
        break;
      }
    }

    match (search, smaller_neighbor) {
      (Some(larger), Some(smaller)) => {
        // Insert strictly between `smaller` and `larger`.
        block::set_pred(mem, payload, Some(larger));
        block::set_succ(mem, larger, Some(payload));
        block::set_succ(mem, payload, Some(smaller));
        block::set_pred(mem, smaller, Some(payload));
      }
      (Some(larger), None) => {
        // `larger` was the bucket head; `payload` becomes the new smallest.
        block::set_pred(mem, payload, Some(larger));
        block::set_succ(mem, larger, Some(payload));
        block::set_succ(mem, payload, None);
        self.heads[list] = Some(payload);
      }
      (None, Some(smaller)) => {
        // Walked off the large end; `payload` becomes the new largest.
        block::set_pred(mem, payload, None);
        block::set_succ(mem, payload, Some(smaller));
        block::set_pred(mem, smaller, Some(payload));
      }
      (None, None) => {
        // Bucket was empty.
        block::set_pred(mem, payload, None);
        block::set_succ(mem, payload, None);
        self.heads[list] = Some(payload);
      }
    }
  }

  /// Removes `payload` from whichever bucket its current size maps to.
  pub fn delete(&mut self, mem: &mut [u8], payload: usize) {
    let size = block::size_of(mem, block::header_of(payload));
    let list = self.bucket_for(size);

    let pred = block::get_pred(mem, payload);
    let succ = block::get_succ(mem, payload);

    match (pred, succ) {
      (Some(p), Some(s)) => {
        block::set_succ(mem, p, Some(s));
        block::set_pred(mem, s, Some(p));
      }
      (Some(p), None) => {
        block::set_succ(mem, p, None);
        self.heads[list] = Some(p);
      }
      (None, Some(s)) => {
        block::set_pred(mem, s, None);
      }
      (None, None) => {
        self.heads[list] = None;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn block_at(mem: &mut [u8], payload: usize, size: usize) {
    block::put_untagged(mem, block::header_of(payload), block::pack(size, false));
    block::put_untagged(mem, block::footer_of(mem, payload), block::pack(size, false));
  }

  #[test]
  fn bucket_for_matches_log2_size_classes() {
    let index = FreeListIndex::new(20);
    assert_eq!(index.bucket_for(1), 0);
    assert_eq!(index.bucket_for(2), 1);
    assert_eq!(index.bucket_for(16), 4);
    assert_eq!(index.bucket_for(1 << 19), 19);
    assert_eq!(index.bucket_for(1 << 25), 19, "overflow must land in the last bucket");
  }

  #[test]
  fn insert_keeps_ascending_order_within_a_bucket() {
    let mut mem = vec![0u8; 512];
    let mut index = FreeListIndex::new(20);

    // All three of these land in the same bucket (size class for 32..64).
    block_at(&mut mem, 32, 32);
    block_at(&mut mem, 96, 48);
    block_at(&mut mem, 176, 40);

    index.insert(&mut mem, 32, 32);
    index.insert(&mut mem, 96, 48);
    index.insert(&mut mem, 176, 40);

    let bucket = index.bucket_for(32);
    // Head is the smallest; walking PRED climbs toward larger blocks.
    let head = index.head(bucket).unwrap();
    assert_eq!(block::size_of(&mem, block::header_of(head)), 32);
    let mid = block::get_pred(&mem, head).unwrap();
    assert_eq!(block::size_of(&mem, block::header_of(mid)), 40);
    let top = block::get_pred(&mem, mid).unwrap();
    assert_eq!(block::size_of(&mem, block::header_of(top)), 48);
    assert_eq!(block::get_pred(&mem, top), None);
  }

  #[test]
  fn delete_unlinks_head_middle_and_tail() {
    let mut mem = vec![0u8; 512];
    let mut index = FreeListIndex::new(20);

    block_at(&mut mem, 32, 32);
    block_at(&mut mem, 96, 48);
    block_at(&mut mem, 176, 40);
    index.insert(&mut mem, 32, 32);
    index.insert(&mut mem, 96, 48);
    index.insert(&mut mem, 176, 40);

    // Remove the middle element (40 bytes).
    index.delete(&mut mem, 176);
    let bucket = index.bucket_for(32);
    let head = index.head(bucket).unwrap();
    assert_eq!(block::size_of(&mem, block::header_of(head)), 32);
    let top = block::get_pred(&mem, head).unwrap();
    assert_eq!(block::size_of(&mem, block::header_of(top)), 48);
    assert_eq!(block::get_pred(&mem, top), None);

    // Remove the head.
    index.delete(&mut mem, 32);
    let head = index.head(bucket).unwrap();
    assert_eq!(block::size_of(&mem, block::header_of(head)), 48);
    assert_eq!(block::get_succ(&mem, head), None);

    // Remove the last remaining block; bucket empties out.
    index.delete(&mut mem, 96);
    assert_eq!(index.head(bucket), None);
  }
}
