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

//! Derives [`LevelInfo`] values for a column descriptor's reconstruction
//! frames: one per list-nesting depth, plus the struct frame at the leaf
//! itself (before any repeated-descendant bump).

use crate::level_algorithms::LevelInfo;
use crate::schema::types::ColumnDescriptor;

/// Every reconstruction frame a reader walking from the schema root down to
/// one leaf column will need, derived once at schema-open time.
#[derive(Debug, Clone)]
pub struct LevelInfoBuilder {
  max_def_level: i16,
  max_rep_level: i16,
  repeated_ancestor_def_levels: Vec<i16>,
}

impl LevelInfoBuilder {
  pub fn from_column(descr: &ColumnDescriptor) -> Self {
    LevelInfoBuilder {
      max_def_level: descr.max_def_level(),
      max_rep_level: descr.max_rep_level(),
      repeated_ancestor_def_levels: descr.repeated_ancestor_def_levels().to_vec(),
    }
  }

  /// The `LevelInfo` for the list reconstruction frame at nesting depth `k`
  /// (1-indexed: `k=1` is the outermost list, `k=max_rep_level` the
  /// innermost). `def_level` and `repeated_ancestor_def_level` coincide here
  /// by construction (§4.1): both mark "this list's repeated slot is
  /// non-empty".
  pub fn list_level(&self, k: i16) -> LevelInfo {
    assert!(k >= 1 && k as usize <= self.repeated_ancestor_def_levels.len(), "list depth out of range");
    let def = self.repeated_ancestor_def_levels[(k - 1) as usize];
    LevelInfo::new(def, k, def)
  }

  /// The `LevelInfo` for the leaf's own scalar reconstruction frame, i.e.
  /// "is the leaf value itself present at `max_def_level`". Used directly by
  /// the scalar reader, and as the un-bumped input to
  /// [`crate::level_algorithms::def_rep_to_bitmap`] when a struct ancestor
  /// needs validity derived from this leaf's levels.
  pub fn leaf_level(&self) -> LevelInfo {
    LevelInfo::new(
      self.max_def_level,
      self.max_rep_level,
      self.repeated_ancestor_def_levels.last().copied().unwrap_or(0),
    )
  }

  /// The `LevelInfo` for a struct node reached after `cur_def`/`cur_rep`
  /// optional/repeated ancestors have been crossed (not counting the struct
  /// itself, which per §4.1 is never optional/repeated on its own -- only its
  /// *path* to this point can be). `repeated_ancestor_def_level` is whichever
  /// list-level frame is innermost at `cur_rep`, or 0 if none yet.
  pub fn struct_level(&self, cur_def: i16, cur_rep: i16) -> LevelInfo {
    let repeated_ancestor_def_level = if cur_rep == 0 {
      0
    } else {
      self.repeated_ancestor_def_levels[(cur_rep - 1) as usize]
    };
    LevelInfo::new(cur_def, cur_rep, repeated_ancestor_def_level)
  }

  pub fn max_def_level(&self) -> i16 {
    self.max_def_level
  }

  pub fn max_rep_level(&self) -> i16 {
    self.max_rep_level
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Repetition, Type};
  use crate::schema::types::{ParquetType, SchemaDescriptor};
  use std::rc::Rc;

  #[test]
  fn test_single_level_list_builder() {
    let element = Rc::new(ParquetType::new_primitive(
      "element",
      Repetition::REPEATED,
      Type::INT32,
      LogicalType::NONE,
      -1,
    ));
    let l = Rc::new(ParquetType::new_group("l", Repetition::OPTIONAL, LogicalType::LIST, vec![element]));
    let root = Rc::new(ParquetType::new_group("schema", Repetition::REQUIRED, LogicalType::NONE, vec![l]));
    let descr = SchemaDescriptor::new(root);
    let builder = LevelInfoBuilder::from_column(descr.column(0));

    let level_info = builder.list_level(1);
    assert_eq!(level_info.def_level, 2);
    assert_eq!(level_info.rep_level, 1);
    assert_eq!(level_info.repeated_ancestor_def_level, 2);
  }

  #[test]
  fn test_two_level_list_builder() {
    let list2 = Rc::new(ParquetType::new_primitive(
      "list2",
      Repetition::REPEATED,
      Type::INT32,
      LogicalType::NONE,
      -1,
    ));
    let l2 = Rc::new(ParquetType::new_group("l2", Repetition::OPTIONAL, LogicalType::LIST, vec![list2]));
    let list1 =
      Rc::new(ParquetType::new_group("list1", Repetition::REPEATED, LogicalType::NONE, vec![l2]));
    let l1 = Rc::new(ParquetType::new_group("l1", Repetition::OPTIONAL, LogicalType::LIST, vec![list1]));
    let root =
      Rc::new(ParquetType::new_group("schema", Repetition::REQUIRED, LogicalType::NONE, vec![l1]));
    let descr = SchemaDescriptor::new(root);
    let builder = LevelInfoBuilder::from_column(descr.column(0));

    let outer = builder.list_level(1);
    assert_eq!((outer.def_level, outer.rep_level, outer.repeated_ancestor_def_level), (2, 1, 2));
    let inner = builder.list_level(2);
    assert_eq!((inner.def_level, inner.rep_level, inner.repeated_ancestor_def_level), (4, 2, 4));
  }

  #[test]
  fn test_struct_level_no_repeated_ancestor() {
    let field = Rc::new(ParquetType::new_primitive(
      "age",
      Repetition::OPTIONAL,
      Type::INT32,
      LogicalType::NONE,
      -1,
    ));
    let s = Rc::new(ParquetType::new_group("s", Repetition::OPTIONAL, LogicalType::NONE, vec![field]));
    let root = Rc::new(ParquetType::new_group("schema", Repetition::REQUIRED, LogicalType::NONE, vec![s]));
    let descr = SchemaDescriptor::new(root);
    let builder = LevelInfoBuilder::from_column(descr.column(0));

    // struct `s` itself sits at cur_def=1 (optional), cur_rep=0.
    let level_info = builder.struct_level(1, 0);
    assert_eq!(level_info.repeated_ancestor_def_level, 0);
  }
}
