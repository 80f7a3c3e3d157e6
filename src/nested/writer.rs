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

//! The writer-side Level Computer (§4.5): the inverse of
//! [`crate::nested::reader::NestedReader`]. Walks a [`LogicalOutput`] tree
//! alongside the schema, producing one `(values, def_levels, rep_levels)`
//! stream per leaf column.

use std::collections::HashMap;

use crate::basic::Repetition;
use crate::errors::Result;
use crate::nested::value::{LeafColumn, LogicalOutput};
use crate::schema::types::{ParquetType, SchemaDescriptor};

/// Accumulates per-leaf `(values, def_levels, rep_levels)` across however
/// many rows are fed to it via [`write_row`](NestedWriter::write_row).
pub struct NestedWriter<'a> {
  schema: &'a SchemaDescriptor,
  buffers: HashMap<String, LeafColumn>,
}

impl<'a> NestedWriter<'a> {
  pub fn new(schema: &'a SchemaDescriptor) -> Self {
    let mut buffers = HashMap::new();
    for col in schema.columns() {
      buffers.insert(col.path().to_string(), LeafColumn::empty_for(col.physical_type()));
    }
    NestedWriter { schema, buffers }
  }

  /// Flattens one row's worth of a top-level field into its leaf columns'
  /// level streams.
  pub fn write_row(&mut self, field_name: &str, value: &LogicalOutput) -> Result<()> {
    let root = self.schema.root_schema();
    let field = root
      .get_fields()
      .iter()
      .find(|f| f.name() == field_name)
      .ok_or_else(|| schema_mismatch_err!("no top-level field named '{}'", field_name))?
      .clone();
    let (def, rep) = child_levels(0, 0, field.repetition());
    let mut path = vec![root.name().to_owned(), field.name().to_owned()];
    self.write_node(&field, &mut path, value, def, rep)
  }

  pub fn into_buffers(self) -> HashMap<String, LeafColumn> {
    self.buffers
  }

  fn write_node(&mut self, node: &ParquetType, path: &mut Vec<String>, value: &LogicalOutput, def: i16, rep: i16) -> Result<()> {
    if node.is_list() {
      self.write_list(node, path, value, def, rep)
    } else if node.is_map() {
      self.write_map(node, path, value, def, rep)
    } else {
      match node {
        ParquetType::Primitive { .. } => self.write_scalar(path, value, def, rep),
        ParquetType::Group { .. } => self.write_struct(node, path, value, def, rep),
      }
    }
  }

  fn write_scalar(&mut self, path: &[String], value: &LogicalOutput, def: i16, rep: i16) -> Result<()> {
    let path_str = path.join(".");
    let descr = self
      .schema
      .column_by_path(&path_str)
      .ok_or_else(|| schema_mismatch_err!("no column descriptor for leaf '{}'", path_str))?;
    let buf = self
      .buffers
      .get_mut(&path_str)
      .ok_or_else(|| internal_err!("no output buffer allocated for leaf '{}'", path_str))?;

    match value {
      LogicalOutput::Scalar(s) => {
        buf.values.push_scalar(s.clone())?;
        if descr.max_def_level() > 0 {
          buf.def_levels.push(def);
        }
        if descr.max_rep_level() > 0 {
          buf.rep_levels.push(rep);
        }
      },
      LogicalOutput::NullableScalar(Some(s)) => {
        buf.values.push_scalar(s.clone())?;
        buf.def_levels.push(def);
        if descr.max_rep_level() > 0 {
          buf.rep_levels.push(rep);
        }
      },
      LogicalOutput::NullableScalar(None) => {
        buf.def_levels.push(def - 1);
        if descr.max_rep_level() > 0 {
          buf.rep_levels.push(rep);
        }
      },
      other => return Err(schema_mismatch_err!("expected a scalar value at '{}', got {:?}", path_str, other)),
    }
    Ok(())
  }

  fn write_struct(&mut self, node: &ParquetType, path: &mut Vec<String>, value: &LogicalOutput, def: i16, rep: i16) -> Result<()> {
    let struct_opt = match value {
      LogicalOutput::Struct(opt) => opt,
      other => return Err(schema_mismatch_err!("expected a struct value at '{}', got {:?}", path.join("."), other)),
    };

    match struct_opt {
      None => {
        for field in node.get_fields() {
          path.push(field.name().to_owned());
          self.write_absent(field, path, def - 1, rep)?;
          path.pop();
        }
      },
      Some(sv) => {
        for field in node.get_fields() {
          let fval = sv
            .get(field.name())
            .ok_or_else(|| schema_mismatch_err!("struct value is missing field '{}'", field.name()))?;
          let (fdef, frep) = child_levels(def, rep, field.repetition());
          path.push(field.name().to_owned());
          self.write_node(field, path, fval, fdef, frep)?;
          path.pop();
        }
      },
    }
    Ok(())
  }

  /// Single-level and multi-level list algorithm (§4.5): NULL list emits one
  /// placeholder at `repeated_ancestor_def_level - 1`, empty list at
  /// `repeated_ancestor_def_level`, and a non-empty list emits one
  /// `(value, def, rep)` per element with `rep = 0`-relative-to-this-frame for
  /// the first element and `k` (this list's own depth) for every continuation.
  fn write_list(&mut self, node: &ParquetType, path: &mut Vec<String>, value: &LogicalOutput, def: i16, rep: i16) -> Result<()> {
    let middle = node
      .list_repeated_group()
      .ok_or_else(|| internal_err!("is_list() implied list_repeated_group()"))?;
    let element = middle
      .get_fields()
      .first()
      .ok_or_else(|| internal_err!("list middle group '{}' is missing its element field", middle.name()))?
      .clone();

    let list_opt = match value {
      LogicalOutput::List(opt) => opt,
      other => return Err(schema_mismatch_err!("expected a list value at '{}', got {:?}", path.join("."), other)),
    };

    let (mid_def, mid_rep) = child_levels(def, rep, middle.repetition());
    let (el_def, el_rep) = child_levels(mid_def, mid_rep, element.repetition());

    path.push(middle.name().to_owned());
    path.push(element.name().to_owned());

    match list_opt {
      None => self.write_absent(&element, path, def - 1, rep)?,
      Some(items) if items.is_empty() => self.write_absent(&element, path, mid_def - 1, rep)?,
      Some(items) => {
        for (j, item) in items.iter().enumerate() {
          let item_rep = if j == 0 { rep } else { mid_rep };
          self.write_node(&element, path, item, el_def, item_rep)?;
        }
      },
    }

    path.pop();
    path.pop();
    Ok(())
  }

  fn write_map(&mut self, node: &ParquetType, path: &mut Vec<String>, value: &LogicalOutput, def: i16, rep: i16) -> Result<()> {
    let kv = node
      .map_key_value_group()
      .ok_or_else(|| internal_err!("is_map() implied map_key_value_group()"))?;
    let fields = kv.get_fields();
    if fields.len() != 2 {
      return Err(schema_mismatch_err!("map key_value group '{}' must have exactly 2 fields", kv.name()));
    }
    let key_field = fields[0].clone();
    let value_field = fields[1].clone();

    let map_opt = match value {
      LogicalOutput::Map(opt) => opt,
      other => return Err(schema_mismatch_err!("expected a map value at '{}', got {:?}", path.join("."), other)),
    };

    let (kv_def, kv_rep) = child_levels(def, rep, kv.repetition());
    let (key_def, key_rep) = child_levels(kv_def, kv_rep, key_field.repetition());
    let (val_def, val_rep) = child_levels(kv_def, kv_rep, value_field.repetition());

    path.push(kv.name().to_owned());

    match map_opt {
      None => {
        path.push(key_field.name().to_owned());
        self.write_absent(&key_field, path, def - 1, rep)?;
        path.pop();
        path.push(value_field.name().to_owned());
        self.write_absent(&value_field, path, def - 1, rep)?;
        path.pop();
      },
      Some(entries) if entries.is_empty() => {
        path.push(key_field.name().to_owned());
        self.write_absent(&key_field, path, kv_def - 1, rep)?;
        path.pop();
        path.push(value_field.name().to_owned());
        self.write_absent(&value_field, path, kv_def - 1, rep)?;
        path.pop();
      },
      Some(entries) => {
        for (j, (key, val)) in entries.iter().enumerate() {
          let item_rep = if j == 0 { rep } else { kv_rep };

          let key_output = LogicalOutput::Scalar(key.to_scalar());
          path.push(key_field.name().to_owned());
          self.write_node(&key_field, path, &key_output, key_def, item_rep)?;
          path.pop();

          path.push(value_field.name().to_owned());
          match val {
            Some(v) => self.write_node(&value_field, path, v, val_def, item_rep)?,
            None => self.write_node(&value_field, path, &absent_output_for(&value_field), val_def, item_rep)?,
          }
          path.pop();
        }
      },
    }

    path.pop();
    Ok(())
  }

  /// Propagates a NULL/empty-container placeholder to every leaf beneath
  /// `node`, since Parquet stores each leaf column independently: an absent
  /// struct or list must still advance every descendant leaf's level stream
  /// by one slot so all columns in a row group stay aligned.
  fn write_absent(&mut self, node: &ParquetType, path: &mut Vec<String>, def: i16, rep: i16) -> Result<()> {
    match node {
      ParquetType::Primitive { .. } => {
        let path_str = path.join(".");
        let descr = self
          .schema
          .column_by_path(&path_str)
          .ok_or_else(|| schema_mismatch_err!("no column descriptor for leaf '{}'", path_str))?;
        let buf = self
          .buffers
          .get_mut(&path_str)
          .ok_or_else(|| internal_err!("no output buffer allocated for leaf '{}'", path_str))?;
        if descr.max_def_level() > 0 {
          buf.def_levels.push(def);
        }
        if descr.max_rep_level() > 0 {
          buf.rep_levels.push(rep);
        }
        Ok(())
      },
      ParquetType::Group { .. } if node.is_list() => {
        let middle = node.list_repeated_group().expect("is_list() implied list_repeated_group()");
        let element = middle.get_fields().first().expect("list middle group has an element field").clone();
        path.push(middle.name().to_owned());
        path.push(element.name().to_owned());
        self.write_absent(&element, path, def, rep)?;
        path.pop();
        path.pop();
        Ok(())
      },
      ParquetType::Group { .. } if node.is_map() => {
        let kv = node.map_key_value_group().expect("is_map() implied map_key_value_group()");
        let fields: Vec<_> = kv.get_fields().to_vec();
        path.push(kv.name().to_owned());
        for field in &fields {
          path.push(field.name().to_owned());
          self.write_absent(field, path, def, rep)?;
          path.pop();
        }
        path.pop();
        Ok(())
      },
      ParquetType::Group { fields, .. } => {
        for field in fields {
          path.push(field.name().to_owned());
          self.write_absent(field, path, def, rep)?;
          path.pop();
        }
        Ok(())
      },
    }
  }
}

fn child_levels(parent_def: i16, parent_rep: i16, repetition: Repetition) -> (i16, i16) {
  match repetition {
    Repetition::OPTIONAL => (parent_def + 1, parent_rep),
    Repetition::REPEATED => (parent_def + 1, parent_rep + 1),
    Repetition::REQUIRED => (parent_def, parent_rep),
  }
}

fn absent_output_for(node: &ParquetType) -> LogicalOutput {
  if node.is_list() {
    LogicalOutput::List(None)
  } else if node.is_map() {
    LogicalOutput::Map(None)
  } else {
    match node {
      ParquetType::Primitive { .. } => LogicalOutput::NullableScalar(None),
      ParquetType::Group { .. } => LogicalOutput::Struct(None),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Type};
  use crate::nested::reader::NestedReader;
  use crate::nested::value::{ScalarValue, StructValue};
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

  /// The round-trip property of §4.3.4 / §4.5: writing a nested value and
  /// reading it back through the same schema reproduces the original.
  #[test]
  fn test_single_level_list_round_trip() {
    let descr = single_level_list_schema();
    let rows = vec![
      LogicalOutput::List(Some(vec![
        LogicalOutput::Scalar(ScalarValue::Int32(1)),
        LogicalOutput::Scalar(ScalarValue::Int32(2)),
      ])),
      LogicalOutput::List(None),
      LogicalOutput::List(Some(vec![])),
      LogicalOutput::List(Some(vec![LogicalOutput::Scalar(ScalarValue::Int32(3))])),
    ];

    let mut writer = NestedWriter::new(&descr);
    for row in &rows {
      writer.write_row("my_list", row).unwrap();
    }
    let leaves = writer.into_buffers();

    let reader = NestedReader::new(&descr, &leaves);
    let read_back = reader.read_all("my_list").unwrap();
    assert_eq!(read_back, rows);
  }

  #[test]
  fn test_struct_round_trip_with_null_and_present() {
    let age = Rc::new(ParquetType::new_primitive("age", Repetition::OPTIONAL, Type::INT32, LogicalType::NONE, -1));
    let person = Rc::new(ParquetType::new_group("person", Repetition::OPTIONAL, LogicalType::NONE, vec![age]));
    let root = Rc::new(ParquetType::new_group("schema", Repetition::REQUIRED, LogicalType::NONE, vec![person]));
    let descr = SchemaDescriptor::new(root);

    let rows = vec![
      LogicalOutput::Struct(Some(StructValue {
        fields: vec![("age".to_owned(), LogicalOutput::NullableScalar(Some(ScalarValue::Int32(30))))],
      })),
      LogicalOutput::Struct(None),
      LogicalOutput::Struct(Some(StructValue { fields: vec![("age".to_owned(), LogicalOutput::NullableScalar(None))] })),
    ];

    let mut writer = NestedWriter::new(&descr);
    for row in &rows {
      writer.write_row("person", row).unwrap();
    }
    let leaves = writer.into_buffers();

    let reader = NestedReader::new(&descr, &leaves);
    let read_back = reader.read_all("person").unwrap();
    assert_eq!(read_back, rows);
  }

  fn single_level_map_schema() -> SchemaDescriptor {
    let key = Rc::new(ParquetType::new_primitive("key", Repetition::REQUIRED, Type::INT32, LogicalType::NONE, -1));
    let value = Rc::new(ParquetType::new_primitive("value", Repetition::OPTIONAL, Type::INT32, LogicalType::NONE, -1));
    let key_value =
      Rc::new(ParquetType::new_group("key_value", Repetition::REPEATED, LogicalType::NONE, vec![key, value]));
    let my_map =
      Rc::new(ParquetType::new_group("my_map", Repetition::OPTIONAL, LogicalType::MAP, vec![key_value]));
    let root = Rc::new(ParquetType::new_group("schema", Repetition::REQUIRED, LogicalType::NONE, vec![my_map]));
    SchemaDescriptor::new(root)
  }

  #[test]
  fn test_map_round_trip_with_null_value_and_null_map() {
    use crate::nested::value::MapKey;

    let descr = single_level_map_schema();
    let rows = vec![
      LogicalOutput::Map(Some(vec![
        (MapKey::Int32(1), Some(LogicalOutput::NullableScalar(Some(ScalarValue::Int32(100))))),
        (MapKey::Int32(2), None),
      ])),
      LogicalOutput::Map(None),
      LogicalOutput::Map(Some(vec![])),
    ];

    let mut writer = NestedWriter::new(&descr);
    for row in &rows {
      writer.write_row("my_map", row).unwrap();
    }
    let leaves = writer.into_buffers();

    let reader = NestedReader::new(&descr, &leaves);
    let read_back = reader.read_all("my_map").unwrap();
    assert_eq!(read_back, rows);
  }
}
