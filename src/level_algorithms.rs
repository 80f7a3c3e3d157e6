// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The level algorithms: pure functions turning (def, rep) level streams into
//! list offsets and/or validity bitmaps. Everything in the nested reader and
//! writer is built out of these three primitives.

use crate::errors::{ParquetError, Result};

/// Anchors a reconstruction frame at some schema node: the definition level at
/// which the node's value is present, the node's own repetition level, and
/// the definition level at which its nearest repeated ancestor is non-empty.
///
/// `def_level` and `repeated_ancestor_def_level` coincide for a list's own
/// reconstruction frame (both mark "this list's repeated slot is non-empty");
/// they diverge once [`def_rep_to_bitmap`] bumps `def_level` by one to derive
/// struct validity from the level streams of a repeated descendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
  pub def_level: i16,
  pub rep_level: i16,
  pub repeated_ancestor_def_level: i16,
}

impl LevelInfo {
  pub fn new(def_level: i16, rep_level: i16, repeated_ancestor_def_level: i16) -> Self {
    LevelInfo { def_level, rep_level, repeated_ancestor_def_level }
  }

  /// The `LevelInfo` used by [`def_rep_to_bitmap`] to derive struct validity
  /// from a repeated descendant's level streams: `def_level`/`rep_level`
  /// bumped by one relative to the struct's own frame, `repeated_ancestor_def_level`
  /// unchanged.
  fn bumped(&self) -> LevelInfo {
    LevelInfo {
      def_level: self.def_level + 1,
      rep_level: self.rep_level + 1,
      repeated_ancestor_def_level: self.repeated_ancestor_def_level,
    }
  }
}

/// Result of a level-algorithm run: per-slot validity, how many logical slots
/// were produced, and how many of those were NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidityOutput {
  pub valid_bits: Vec<bool>,
  pub values_read: usize,
  pub null_count: usize,
}

/// `def_rep_to_list_info` — §4.3.1. Walks `def_levels`/`rep_levels` in lock
/// step, filtering to the frame described by `level_info`, and optionally
/// materializes list offsets. Returns the slots' validity and count.
///
/// `offsets`, if supplied, must already contain at least one entry (the
/// running total so far); a fresh run starts the caller off with `vec![0]`.
pub fn def_rep_to_list_info(
  def_levels: &[i16],
  rep_levels: &[i16],
  level_info: &LevelInfo,
  mut offsets: Option<&mut Vec<i32>>,
  values_read_upper_bound: usize,
) -> Result<ValidityOutput> {
  if def_levels.len() != rep_levels.len() {
    return Err(internal_err!(
      "def_levels and rep_levels must have equal length ({} vs {})",
      def_levels.len(),
      rep_levels.len()
    ));
  }
  if let Some(off) = offsets.as_deref_mut() {
    if off.is_empty() {
      off.push(0);
    }
  }

  let mut valid_bits = Vec::new();
  let mut null_count = 0usize;
  let mut values_read = 0usize;

  for i in 0..def_levels.len() {
    let def = def_levels[i];
    let rep = rep_levels[i];

    if rep > level_info.rep_level {
      // Belongs to a deeper repeated descendant; not this frame's concern.
      continue;
    } else if rep == level_info.rep_level {
      // Continuation of the list/struct instance already started.
      if def >= level_info.repeated_ancestor_def_level {
        bump_last_offset(offsets.as_deref_mut())?;
      }
    } else {
      // rep < level_info.rep_level: a new instance starts at this frame.
      if let Some(off) = offsets.as_deref_mut() {
        let prev = *off.last().expect("offsets always non-empty here");
        off.push(prev);
      }

      let valid = def >= level_info.def_level - 1;
      if valid {
        if def >= level_info.def_level {
          bump_last_offset(offsets.as_deref_mut())?;
        }
      } else {
        null_count += 1;
      }
      valid_bits.push(valid);
      values_read += 1;

      if values_read > values_read_upper_bound {
        return Err(internal_err!(
          "values_read ({}) exceeded upper bound ({}); input is malformed",
          values_read,
          values_read_upper_bound
        ));
      }
    }
  }

  if let Some(off) = offsets.as_deref() {
    if off.iter().any(|&o| o == i32::MAX) {
      return Err(internal_err!("list offset overflowed i32"));
    }
  }

  Ok(ValidityOutput { valid_bits, values_read, null_count })
}

fn bump_last_offset(offsets: Option<&mut Vec<i32>>) -> Result<()> {
  if let Some(off) = offsets {
    let last = off.last_mut().expect("offsets always non-empty here");
    *last = last.checked_add(1).ok_or_else(|| internal_err!("list offset overflowed i32"))?;
  }
  Ok(())
}

/// `def_rep_to_bitmap` — §4.3.2. Struct validity in the presence of a
/// repeated descendant: delegate to [`def_rep_to_list_info`] with no offsets
/// and a frame bumped by one level.
pub fn def_rep_to_bitmap(
  def_levels: &[i16],
  rep_levels: &[i16],
  level_info: &LevelInfo,
  values_read_upper_bound: usize,
) -> Result<ValidityOutput> {
  def_rep_to_list_info(def_levels, rep_levels, &level_info.bumped(), None, values_read_upper_bound)
}

/// `def_to_bitmap` — §4.3.3. Struct validity (or leaf nullability) when there
/// is no repeated descendant to worry about: a value is present iff its
/// definition level reaches `level_info.def_level`.
pub fn def_to_bitmap(def_levels: &[i16], level_info: &LevelInfo) -> ValidityOutput {
  let mut valid_bits = Vec::with_capacity(def_levels.len());
  let mut null_count = 0usize;
  for &def in def_levels {
    let valid = def >= level_info.def_level;
    if !valid {
      null_count += 1;
    }
    valid_bits.push(valid);
  }
  ValidityOutput { values_read: def_levels.len(), null_count, valid_bits }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// S1 — single-level list, mixed shapes.
  /// Schema: `optional list<int32>` (2-level: repeated element is required).
  /// Leaf: max_def_level=2, max_rep_level=1, repeated_ancestor_def_level=2.
  #[test]
  fn test_s1_single_level_list_mixed_shapes() {
    let level_info = LevelInfo::new(2, 1, 2);
    let def_levels = [2i16, 2, 0, 1, 2];
    let rep_levels = [0i16, 1, 0, 0, 0];
    let mut offsets = vec![0i32];

    let validity =
      def_rep_to_list_info(&def_levels, &rep_levels, &level_info, Some(&mut offsets), 100).unwrap();

    // Four logical list slots: [Some([1,2]), None, Some([]), Some([3])].
    assert_eq!(validity.valid_bits, vec![true, false, true, true]);
    assert_eq!(validity.null_count, 1);
    assert_eq!(validity.values_read, 4);
    assert_eq!(offsets, vec![0, 2, 2, 2, 3]);
  }

  /// S2 — two-level nested list, outer frame (k=1).
  /// Leaf: max_def_level=4, max_rep_level=2.
  /// repeated_ancestor_def_levels = [2, 4] (1-indexed by list depth).
  #[test]
  fn test_s2_two_level_list_outer_frame() {
    let outer = LevelInfo::new(2, 1, 2);
    let def_levels = [4i16, 4, 4, 4];
    let rep_levels = [0i16, 2, 1, 0];
    let mut offsets = vec![0i32];

    let validity =
      def_rep_to_list_info(&def_levels, &rep_levels, &outer, Some(&mut offsets), 100).unwrap();

    // Two outer-list slots: row0 has 2 inner lists, row1 has 1.
    assert_eq!(validity.values_read, 2);
    assert_eq!(validity.null_count, 0);
    assert_eq!(offsets, vec![0, 2, 3]);
  }

  #[test]
  fn test_s2_two_level_list_inner_frame() {
    let inner = LevelInfo::new(4, 2, 4);
    let def_levels = [4i16, 4, 4, 4];
    let rep_levels = [0i16, 2, 1, 0];
    let mut offsets = vec![0i32];

    let validity =
      def_rep_to_list_info(&def_levels, &rep_levels, &inner, Some(&mut offsets), 100).unwrap();

    // Three inner lists total: [1,2], [3], [4].
    assert_eq!(validity.values_read, 3);
    assert_eq!(offsets, vec![0, 2, 3, 4]);
  }

  #[test]
  fn test_def_to_bitmap_simple_optional() {
    let level_info = LevelInfo::new(1, 0, 0);
    let validity = def_to_bitmap(&[1, 0, 1, 1, 0], &level_info);
    assert_eq!(validity.valid_bits, vec![true, false, true, true, false]);
    assert_eq!(validity.null_count, 2);
    assert_eq!(validity.values_read, 5);
  }

  #[test]
  fn test_def_rep_to_bitmap_bumps_frame() {
    // Struct with a repeated descendant: struct's own frame is (def=1, rep=0),
    // bumped to (def=2, rep=1) to read validity off the descendant's levels.
    let struct_level_info = LevelInfo::new(1, 0, 1);
    let def_levels = [2i16, 2, 0, 2];
    let rep_levels = [0i16, 1, 0, 0];
    let validity = def_rep_to_bitmap(&def_levels, &rep_levels, &struct_level_info, 100).unwrap();
    assert_eq!(validity.values_read, 3);
    assert_eq!(validity.valid_bits, vec![true, false, true]);
  }

  #[test]
  fn test_offsets_non_decreasing() {
    let level_info = LevelInfo::new(2, 1, 2);
    let def_levels = [2i16, 2, 2, 0, 2];
    let rep_levels = [0i16, 1, 1, 0, 0];
    let mut offsets = vec![0i32];
    def_rep_to_list_info(&def_levels, &rep_levels, &level_info, Some(&mut offsets), 100).unwrap();
    for w in offsets.windows(2) {
      assert!(w[1] >= w[0]);
    }
  }

  #[test]
  fn test_values_read_upper_bound_enforced() {
    let level_info = LevelInfo::new(1, 0, 1);
    let def_levels = [1i16, 1, 1];
    let rep_levels = [0i16, 0, 0];
    let err = def_rep_to_list_info(&def_levels, &rep_levels, &level_info, None, 2).unwrap_err();
    match err {
      ParquetError::Internal(_) => {},
      other => panic!("expected Internal error, got {:?}", other),
    }
  }

  #[test]
  fn test_no_repeated_ancestor_uses_def_to_bitmap_only() {
    // max_rep_level == 0: rep_levels are irrelevant, def_to_bitmap suffices.
    let level_info = LevelInfo::new(1, 0, 0);
    let validity = def_to_bitmap(&[0, 1, 1], &level_info);
    assert_eq!(validity.null_count, 1);
  }
}
