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

//! The nested array reader (§4.4): a polymorphic reader dispatched over
//! schema node shape, built directly on the three level algorithms and on
//! [`LevelInfoBuilder`]. Operates over a whole row group's worth of already
//! page-decoded `(values, def_levels, rep_levels)` per leaf column -- streaming
//! those out of pages is [`crate::column::reader::ColumnReaderImpl`]'s job.

use std::collections::HashMap;

use crate::basic::Repetition;
use crate::errors::Result;
use crate::level_algorithms::{def_rep_to_bitmap, def_rep_to_list_info, def_to_bitmap};
use crate::nested::value::{LeafColumn, LogicalOutput, MapKey, StructValue};
use crate::schema::levels::LevelInfoBuilder;
use crate::schema::types::{ParquetType, SchemaDescriptor};

/// Reconstructs one top-level field at a time from a row group's decoded leaf
/// columns. `leaves` is keyed by the leaf's dot-joined [`crate::schema::types::ColumnPath`].
pub struct NestedReader<'a> {
  schema: &'a SchemaDescriptor,
  leaves: &'a HashMap<String, LeafColumn>,
}

impl<'a> NestedReader<'a> {
  pub fn new(schema: &'a SchemaDescriptor, leaves: &'a HashMap<String, LeafColumn>) -> Self {
    NestedReader { schema, leaves }
  }

  /// Reconstructs a whole top-level field, one `LogicalOutput` per row.
  pub fn read_all(&self, field_name: &str) -> Result<Vec<LogicalOutput>> {
    let root = self.schema.root_schema();
    let field = root
      .get_fields()
      .iter()
      .find(|f| f.name() == field_name)
      .ok_or_else(|| schema_mismatch_err!("no top-level field named '{}'", field_name))?;
    let (def, rep) = child_levels(0, 0, field.repetition());
    let mut path = vec![root.name().to_owned(), field.name().to_owned()];
    self.read_node(field, &mut path, def, rep)
  }

  fn read_node(&self, node: &ParquetType, path: &mut Vec<String>, def: i16, rep: i16) -> Result<Vec<LogicalOutput>> {
    if node.is_list() {
      self.read_list(node, path, def, rep)
    } else if node.is_map() {
      self.read_map(node, path, def, rep)
    } else {
      match node {
        ParquetType::Primitive { .. } => self.read_scalar(path),
        ParquetType::Group { .. } => self.read_struct(node, path, def, rep),
      }
    }
  }

  /// Scalar leaf reader (§4.4 "Scalar leaf reader"). Entirely determined by
  /// the leaf's own descriptor: required leaves produce values 1:1; optional
  /// ones filter out list/struct-level absence markers
  /// (`def < repeated_ancestor_def_level`) before interleaving NULLs.
  fn read_scalar(&self, path: &[String]) -> Result<Vec<LogicalOutput>> {
    let path_str = path.join(".");
    let descr = self
      .schema
      .column_by_path(&path_str)
      .ok_or_else(|| schema_mismatch_err!("no column descriptor for leaf '{}'", path_str))?;
    let leaf = self
      .leaves
      .get(&path_str)
      .ok_or_else(|| schema_mismatch_err!("no column data supplied for leaf '{}'", path_str))?;

    let repeated_ancestor = descr.repeated_ancestor_def_level();
    let max_def = descr.max_def_level();

    // No optionality of the leaf's own beyond whatever its nearest repeated
    // ancestor already accounts for (this also covers a bare top-level
    // REQUIRED leaf, where `max_def == repeated_ancestor == 0` and no level
    // stream was ever written): every surviving slot is a definite value.
    if max_def == repeated_ancestor {
      if leaf.def_levels.is_empty() {
        return Ok(leaf.values.to_scalar_vec().into_iter().map(LogicalOutput::Scalar).collect());
      }
      let mut out = Vec::new();
      let mut value_idx = 0usize;
      for &def in &leaf.def_levels {
        if def < repeated_ancestor {
          continue;
        }
        let scalar = leaf
          .values
          .scalar_at(value_idx)
          .ok_or_else(|| internal_err!("value index {} out of range for leaf '{}'", value_idx, path_str))?;
        out.push(LogicalOutput::Scalar(scalar));
        value_idx += 1;
      }
      return Ok(out);
    }

    let mut out = Vec::new();
    let mut value_idx = 0usize;
    for &def in &leaf.def_levels {
      if def < repeated_ancestor {
        continue;
      }
      if def >= max_def {
        let scalar = leaf
          .values
          .scalar_at(value_idx)
          .ok_or_else(|| internal_err!("value index {} out of range for leaf '{}'", value_idx, path_str))?;
        out.push(LogicalOutput::NullableScalar(Some(scalar)));
        value_idx += 1;
      } else {
        out.push(LogicalOutput::NullableScalar(None));
      }
    }
    Ok(out)
  }

  fn read_struct(&self, node: &ParquetType, path: &mut Vec<String>, def: i16, rep: i16) -> Result<Vec<LogicalOutput>> {
    let base = path[..path.len() - 1].to_vec();
    let repr_path_str = representative_leaf_path(node, base);
    let repr_descr = self
      .schema
      .column_by_path(&repr_path_str)
      .ok_or_else(|| schema_mismatch_err!("no column descriptor for '{}'", repr_path_str))?;
    let repr_leaf = self
      .leaves
      .get(&repr_path_str)
      .ok_or_else(|| schema_mismatch_err!("no column data supplied for '{}'", repr_path_str))?;

    let builder = LevelInfoBuilder::from_column(repr_descr);
    let level_info = builder.struct_level(def, rep);

    let validity = if has_repeated_descendant(node) {
      def_rep_to_bitmap(&repr_leaf.def_levels, &repr_leaf.rep_levels, &level_info, repr_leaf.def_levels.len())?
    } else {
      // No repeated descendant of its own, but the struct may still be an
      // element of an enclosing list: the representative leaf's levels then
      // carry that list's absence/empty-list placeholders too, which
      // `def_to_bitmap` has no way to tell apart from a real struct slot.
      // Drop them first, exactly as the scalar reader does.
      let filtered: Vec<i16> =
        repr_leaf.def_levels.iter().copied().filter(|&d| d >= level_info.repeated_ancestor_def_level).collect();
      def_to_bitmap(&filtered, &level_info)
    };

    let fields = node.get_fields();
    let mut field_outputs = Vec::with_capacity(fields.len());
    for field in fields {
      let (fdef, frep) = child_levels(def, rep, field.repetition());
      path.push(field.name().to_owned());
      let out = self.read_node(field, path, fdef, frep)?;
      path.pop();
      field_outputs.push((field.name().to_owned(), out));
    }

    let mut out = Vec::with_capacity(validity.values_read);
    for i in 0..validity.values_read {
      if !validity.valid_bits[i] {
        out.push(LogicalOutput::Struct(None));
        continue;
      }
      let mut sf = Vec::with_capacity(field_outputs.len());
      for (name, vals) in &field_outputs {
        let v = vals
          .get(i)
          .ok_or_else(|| internal_err!("field '{}' produced fewer slots than struct validity", name))?;
        sf.push((name.clone(), v.clone()));
      }
      out.push(LogicalOutput::Struct(Some(StructValue { fields: sf })));
    }
    Ok(out)
  }

  fn read_list(&self, node: &ParquetType, path: &mut Vec<String>, def: i16, rep: i16) -> Result<Vec<LogicalOutput>> {
    let middle = node
      .list_repeated_group()
      .ok_or_else(|| internal_err!("is_list() implied list_repeated_group()"))?;
    let element = middle
      .get_fields()
      .first()
      .ok_or_else(|| internal_err!("list middle group '{}' is missing its element field", middle.name()))?;

    let (mid_def, mid_rep) = child_levels(def, rep, middle.repetition());
    let k = mid_rep;
    path.push(middle.name().to_owned());

    let (el_def, el_rep) = child_levels(mid_def, mid_rep, element.repetition());

    let repr_path_str = representative_leaf_path(element, path.clone());
    let repr_descr = self
      .schema
      .column_by_path(&repr_path_str)
      .ok_or_else(|| schema_mismatch_err!("no column descriptor for '{}'", repr_path_str))?;
    let repr_leaf = self
      .leaves
      .get(&repr_path_str)
      .ok_or_else(|| schema_mismatch_err!("no column data supplied for '{}'", repr_path_str))?;

    let builder = LevelInfoBuilder::from_column(repr_descr);
    let level_info = builder.list_level(k);

    let mut offsets = vec![0i32];
    let upper_bound = repr_leaf.def_levels.len();
    let validity =
      def_rep_to_list_info(&repr_leaf.def_levels, &repr_leaf.rep_levels, &level_info, Some(&mut offsets), upper_bound)?;

    path.push(element.name().to_owned());
    let inner_values = self.read_node(element, path, el_def, el_rep)?;
    path.pop();
    path.pop();

    let mut out = Vec::with_capacity(validity.values_read);
    for i in 0..validity.values_read {
      if !validity.valid_bits[i] {
        out.push(LogicalOutput::List(None));
        continue;
      }
      let start = offsets[i] as usize;
      let end = offsets[i + 1] as usize;
      if end > inner_values.len() || start > end {
        return Err(internal_err!("list offsets inconsistent with inner reader output length"));
      }
      out.push(LogicalOutput::List(Some(inner_values[start..end].to_vec())));
    }
    Ok(out)
  }

  fn read_map(&self, node: &ParquetType, path: &mut Vec<String>, def: i16, rep: i16) -> Result<Vec<LogicalOutput>> {
    let kv = node
      .map_key_value_group()
      .ok_or_else(|| internal_err!("is_map() implied map_key_value_group()"))?;
    let fields = kv.get_fields();
    if fields.len() != 2 {
      return Err(schema_mismatch_err!("map key_value group '{}' must have exactly 2 fields", kv.name()));
    }
    let key_field = &fields[0];
    let value_field = &fields[1];

    let (kv_def, kv_rep) = child_levels(def, rep, kv.repetition());
    let k = kv_rep;
    path.push(kv.name().to_owned());

    let (key_def, key_rep) = child_levels(kv_def, kv_rep, key_field.repetition());
    let (val_def, val_rep) = child_levels(kv_def, kv_rep, value_field.repetition());

    let repr_path_str = representative_leaf_path(key_field, path.clone());
    let repr_descr = self
      .schema
      .column_by_path(&repr_path_str)
      .ok_or_else(|| schema_mismatch_err!("no column descriptor for '{}'", repr_path_str))?;
    let repr_leaf = self
      .leaves
      .get(&repr_path_str)
      .ok_or_else(|| schema_mismatch_err!("no column data supplied for '{}'", repr_path_str))?;

    let builder = LevelInfoBuilder::from_column(repr_descr);
    let level_info = builder.list_level(k);

    let mut offsets = vec![0i32];
    let upper_bound = repr_leaf.def_levels.len();
    let validity =
      def_rep_to_list_info(&repr_leaf.def_levels, &repr_leaf.rep_levels, &level_info, Some(&mut offsets), upper_bound)?;

    path.push(key_field.name().to_owned());
    let key_outputs = self.read_node(key_field, path, key_def, key_rep)?;
    path.pop();

    path.push(value_field.name().to_owned());
    let value_outputs = self.read_node(value_field, path, val_def, val_rep)?;
    path.pop();
    path.pop();

    let mut out = Vec::with_capacity(validity.values_read);
    for i in 0..validity.values_read {
      if !validity.valid_bits[i] {
        out.push(LogicalOutput::Map(None));
        continue;
      }
      let start = offsets[i] as usize;
      let end = offsets[i + 1] as usize;
      if end > key_outputs.len() || end > value_outputs.len() || start > end {
        return Err(internal_err!("map offsets inconsistent with key/value reader output length"));
      }
      let mut entries = Vec::with_capacity(end - start);
      for j in start..end {
        let key = logical_output_to_map_key(&key_outputs[j])?;
        let value = logical_output_to_optional(&value_outputs[j]);
        entries.push((key, value));
      }
      out.push(LogicalOutput::Map(Some(entries)));
    }
    Ok(out)
  }
}

fn child_levels(parent_def: i16, parent_rep: i16, repetition: Repetition) -> (i16, i16) {
  match repetition {
    Repetition::OPTIONAL => (parent_def + 1, parent_rep),
    Repetition::REPEATED => (parent_def + 1, parent_rep + 1),
    Repetition::REQUIRED => (parent_def, parent_rep),
  }
}

fn has_repeated_descendant(node: &ParquetType) -> bool {
  match node {
    ParquetType::Primitive { .. } => false,
    ParquetType::Group { fields, .. } => {
      fields.iter().any(|f| f.repetition() == Repetition::REPEATED || has_repeated_descendant(f))
    },
  }
}

/// Picks one descendant leaf to drive a struct/list/map node's `LevelInfo`,
/// preferring a child with no repeated descendant of its own (§4.4 "Struct
/// reader", step 2). `path` must already contain every ancestor up to but not
/// including `node`; `node`'s own name is pushed here.
fn representative_leaf_path(node: &ParquetType, mut path: Vec<String>) -> String {
  path.push(node.name().to_owned());
  match node {
    ParquetType::Primitive { .. } => path.join("."),
    ParquetType::Group { fields, .. } => {
      let chosen = fields
        .iter()
        .find(|f| f.repetition() != Repetition::REPEATED && !has_repeated_descendant(f))
        .or_else(|| fields.first())
        .expect("group node must have at least one field");
      representative_leaf_path(chosen, path)
    },
  }
}

fn logical_output_to_map_key(output: &LogicalOutput) -> Result<MapKey> {
  let scalar = match output {
    LogicalOutput::Scalar(s) => s.clone(),
    LogicalOutput::NullableScalar(Some(s)) => s.clone(),
    LogicalOutput::NullableScalar(None) => return Err(schema_mismatch_err!("map key must not be NULL")),
    other => return Err(schema_mismatch_err!("map key must be a scalar value, got {:?}", other)),
  };
  MapKey::from_scalar(scalar)
}

fn logical_output_to_optional(output: &LogicalOutput) -> Option<LogicalOutput> {
  match output {
    LogicalOutput::NullableScalar(None) => None,
    LogicalOutput::List(None) => None,
    LogicalOutput::Struct(None) => None,
    LogicalOutput::Map(None) => None,
    other => Some(other.clone()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Type};
  use crate::nested::value::ScalarValue;
  use std::rc::Rc;

  fn single_level_list_schema() -> SchemaDescriptor {
    let element =
      Rc::new(ParquetType::new_primitive("element", Repetition::REQUIRED, Type::INT32, LogicalType::NONE, -1));
    let list_group = Rc::new(ParquetType::new_group("list", Repetition::REPEATED, LogicalType::NONE, vec![element]));
    let my_list =
      Rc::new(ParquetType::new_group("my_list", Repetition::OPTIONAL, LogicalType::LIST, vec![list_group]));
    let root = Rc::new(ParquetType::new_group("schema", Repetition::REQUIRED, LogicalType::NONE, vec![my_list]));
    SchemaDescriptor::new(root)
  }

  /// S1 from §4.3.4, driven through the full nested reader.
  #[test]
  fn test_s1_single_level_list_reader() {
    let descr = single_level_list_schema();
    let leaf_path = "schema.my_list.list.element".to_owned();
    let mut leaves = HashMap::new();
    leaves.insert(
      leaf_path,
      LeafColumn {
        values: {
          let mut v = crate::nested::value::LeafValues::empty_for(Type::INT32);
          for x in [1, 2, 3] {
            v.push_scalar(ScalarValue::Int32(x)).unwrap();
          }
          v
        },
        def_levels: vec![2, 2, 0, 1, 2],
        rep_levels: vec![0, 1, 0, 0, 0],
      },
    );

    let reader = NestedReader::new(&descr, &leaves);
    let rows = reader.read_all("my_list").unwrap();

    assert_eq!(rows.len(), 4);
    assert_eq!(
      rows[0],
      LogicalOutput::List(Some(vec![
        LogicalOutput::Scalar(ScalarValue::Int32(1)),
        LogicalOutput::Scalar(ScalarValue::Int32(2)),
      ]))
    );
    assert_eq!(rows[1], LogicalOutput::List(None));
    assert_eq!(rows[2], LogicalOutput::List(Some(vec![])));
    assert_eq!(rows[3], LogicalOutput::List(Some(vec![LogicalOutput::Scalar(ScalarValue::Int32(3))])));
  }

  #[test]
  fn test_struct_with_optional_scalar_field() {
    let age = Rc::new(ParquetType::new_primitive("age", Repetition::OPTIONAL, Type::INT32, LogicalType::NONE, -1));
    let person = Rc::new(ParquetType::new_group("person", Repetition::OPTIONAL, LogicalType::NONE, vec![age]));
    let root = Rc::new(ParquetType::new_group("schema", Repetition::REQUIRED, LogicalType::NONE, vec![person]));
    let descr = SchemaDescriptor::new(root);

    let mut leaves = HashMap::new();
    let mut values = crate::nested::value::LeafValues::empty_for(Type::INT32);
    values.push_scalar(ScalarValue::Int32(30)).unwrap();
    leaves.insert(
      "schema.person.age".to_owned(),
      LeafColumn { values, def_levels: vec![2, 0, 1], rep_levels: vec![] },
    );

    let reader = NestedReader::new(&descr, &leaves);
    let rows = reader.read_all("person").unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
      rows[0],
      LogicalOutput::Struct(Some(StructValue {
        fields: vec![("age".to_owned(), LogicalOutput::NullableScalar(Some(ScalarValue::Int32(30))))]
      }))
    );
    assert_eq!(rows[1], LogicalOutput::Struct(None));
    assert_eq!(
      rows[2],
      LogicalOutput::Struct(Some(StructValue { fields: vec![("age".to_owned(), LogicalOutput::NullableScalar(None))] }))
    );
  }
}
