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

//! `Row`/`RowField`: a logical-type-aware view over a [`LogicalOutput`] tree,
//! for callers who want a `Display`-able record rather than the raw scalar
//! union the nested reconstruction engine produces.

use std::fmt;

use crate::basic::LogicalType;
use crate::data_type::ByteArray;
use crate::nested::value::{LogicalOutput, MapKey, ScalarValue, StructValue};
use crate::schema::types::ParquetType;

/// Shortcut to generate a "not yet implemented" panic for a physical/logical
/// type combination this crate does not know how to interpret.
macro_rules! nyi {
  ($logical_type:expr, $value:expr) => {{
    unimplemented!("conversion for logical type {}, value {:?}", $logical_type, $value);
  }};
}

/// A nested Parquet record: field name to value, in schema declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
  fields: Vec<(String, RowField)>,
}

impl Row {
  pub fn new(fields: Vec<(String, RowField)>) -> Self {
    Row { fields }
  }

  pub fn fields(&self) -> &[(String, RowField)] {
    &self.fields
  }

  pub fn get(&self, name: &str) -> Option<&RowField> {
    self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
  }

  /// Builds a `Row` from a decoded struct value, using `schema_node`'s fields
  /// to look up each member's logical type. `schema_node` must be the group
  /// type the struct value was reconstructed against.
  pub fn from_struct_value(schema_node: &ParquetType, value: &StructValue) -> Self {
    let fields = value
      .fields
      .iter()
      .map(|(name, output)| {
        let child = child_schema(schema_node, name);
        (name.clone(), RowField::from_logical_output(child, output))
      })
      .collect();
    Row::new(fields)
  }
}

fn child_schema<'a>(schema_node: &'a ParquetType, name: &str) -> &'a ParquetType {
  schema_node
    .get_fields()
    .iter()
    .map(|f| f.as_ref())
    .find(|f| f.name() == name)
    .unwrap_or_else(|| panic!("no field named '{}' in group '{}'", name, schema_node.name()))
}

impl fmt::Display for Row {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in self.fields.iter().enumerate() {
      key.fmt(f)?;
      write!(f, ": ")?;
      value.fmt(f)?;
      if i < self.fields.len() - 1 {
        write!(f, ", ")?;
      }
    }
    write!(f, "}}")
  }
}

/// A single field in a `Row`.
#[derive(Clone, Debug, PartialEq)]
pub enum RowField {
  // Primitive types
  Null,
  Bool(bool),
  Byte(i8),
  Short(i16),
  Int(i32),
  Long(i64),
  Float(f32),
  Double(f64),
  Str(String),
  Bytes(ByteArray),
  Timestamp(u64), // milliseconds since the Unix epoch
  // Complex types
  Group(Row),
  List(Vec<RowField>),
  Map(Vec<(RowField, RowField)>),
}

impl RowField {
  /// Converts one decoded scalar into a `RowField`, interpreting it against
  /// `logical_type` the way the physical encoding intends (e.g. an INT32
  /// annotated `INT_8` becomes `RowField::Byte`, not `RowField::Int`).
  pub fn from_scalar(logical_type: LogicalType, value: ScalarValue) -> Self {
    match value {
      ScalarValue::Bool(v) => RowField::Bool(v),
      ScalarValue::Int32(v) => match logical_type {
        LogicalType::INT_8 => RowField::Byte(v as i8),
        LogicalType::INT_16 => RowField::Short(v as i16),
        LogicalType::INT_32 | LogicalType::NONE => RowField::Int(v),
        other => nyi!(other, v),
      },
      ScalarValue::Int64(v) => match logical_type {
        LogicalType::INT_64 | LogicalType::NONE => RowField::Long(v),
        other => nyi!(other, v),
      },
      ScalarValue::Int96(v) => {
        let julian_to_unix_epoch_days: u64 = 2_440_588;
        let milli_seconds_in_a_day: u64 = 86_400_000;
        let nano_seconds_in_a_day: u64 = milli_seconds_in_a_day * 1_000_000;

        let days_since_epoch = v.data()[2] as u64 - julian_to_unix_epoch_days;
        let nanoseconds: u64 = ((v.data()[1] as u64) << 32) + v.data()[0] as u64;
        let nanos = days_since_epoch * nano_seconds_in_a_day + nanoseconds;
        RowField::Timestamp(nanos / 1_000_000)
      },
      ScalarValue::Float(v) => RowField::Float(v),
      ScalarValue::Double(v) => RowField::Double(v),
      ScalarValue::ByteArray(v) => match logical_type {
        LogicalType::UTF8 | LogicalType::ENUM | LogicalType::JSON => {
          let value = unsafe { String::from_utf8_unchecked(v.data().to_vec()) };
          RowField::Str(value)
        },
        LogicalType::BSON | LogicalType::NONE => RowField::Bytes(v),
        other => nyi!(other, v),
      },
    }
  }

  /// Recursively converts a decoded [`LogicalOutput`] tree into a `RowField`,
  /// walking `schema_node` in lockstep to resolve each leaf's logical type.
  pub fn from_logical_output(schema_node: &ParquetType, output: &LogicalOutput) -> Self {
    match output {
      LogicalOutput::Scalar(value) => Self::from_scalar(schema_node.basic_info().logical_type(), value.clone()),
      LogicalOutput::NullableScalar(None) => RowField::Null,
      LogicalOutput::NullableScalar(Some(value)) => {
        Self::from_scalar(schema_node.basic_info().logical_type(), value.clone())
      },
      LogicalOutput::List(None) => RowField::Null,
      LogicalOutput::List(Some(items)) => {
        let repeated = schema_node
          .list_repeated_group()
          .unwrap_or_else(|| panic!("'{}' is not a three-level LIST group", schema_node.name()));
        let element = repeated
          .get_fields()
          .first()
          .unwrap_or_else(|| panic!("LIST repeated group '{}' has no element field", repeated.name()));
        RowField::List(items.iter().map(|item| Self::from_logical_output(element, item)).collect())
      },
      LogicalOutput::Struct(None) => RowField::Null,
      LogicalOutput::Struct(Some(struct_value)) => RowField::Group(Row::from_struct_value(schema_node, struct_value)),
      LogicalOutput::Map(None) => RowField::Null,
      LogicalOutput::Map(Some(entries)) => {
        let key_value = schema_node
          .map_key_value_group()
          .unwrap_or_else(|| panic!("'{}' is not a three-level MAP group", schema_node.name()));
        let fields = key_value.get_fields();
        let key_schema = fields.first().unwrap_or_else(|| panic!("MAP key-value group '{}' has no key field", key_value.name()));
        let value_schema = fields.get(1).unwrap_or_else(|| panic!("MAP key-value group '{}' has no value field", key_value.name()));

        let pairs = entries
          .iter()
          .map(|(key, value)| {
            let key_field = Self::from_scalar(key_schema.basic_info().logical_type(), key.to_scalar());
            let value_field = match value {
              Some(v) => Self::from_logical_output(value_schema, v),
              None => RowField::Null,
            };
            (key_field, value_field)
          })
          .collect();
        RowField::Map(pairs)
      },
    }
  }
}

impl fmt::Display for RowField {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      RowField::Null => write!(f, "null"),
      RowField::Bool(value) => write!(f, "{}", value),
      RowField::Byte(value) => write!(f, "{}", value),
      RowField::Short(value) => write!(f, "{}", value),
      RowField::Int(value) => write!(f, "{}", value),
      RowField::Long(value) => write!(f, "{}", value),
      RowField::Float(value) => write!(f, "{:?}", value),
      RowField::Double(value) => write!(f, "{:?}", value),
      RowField::Str(ref value) => write!(f, "\"{}\"", value),
      RowField::Bytes(ref value) => write!(f, "{:?}", value.data()),
      RowField::Timestamp(value) => write!(f, "{}", value),
      RowField::Group(ref row) => write!(f, "{}", row),
      RowField::List(ref fields) => {
        write!(f, "[")?;
        for (i, field) in fields.iter().enumerate() {
          field.fmt(f)?;
          if i < fields.len() - 1 {
            write!(f, ", ")?;
          }
        }
        write!(f, "]")
      },
      RowField::Map(ref pairs) => {
        write!(f, "{{")?;
        for (i, (key, value)) in pairs.iter().enumerate() {
          key.fmt(f)?;
          write!(f, " -> ")?;
          value.fmt(f)?;
          if i < pairs.len() - 1 {
            write!(f, ", ")?;
          }
        }
        write!(f, "}}")
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{Repetition, Type};
  use crate::data_type::Int96;

  #[test]
  fn test_row_field_from_scalar_bool() {
    let row = RowField::from_scalar(LogicalType::NONE, ScalarValue::Bool(true));
    assert_eq!(row, RowField::Bool(true));
  }

  #[test]
  fn test_row_field_from_scalar_int32_variants() {
    assert_eq!(RowField::from_scalar(LogicalType::INT_8, ScalarValue::Int32(111)), RowField::Byte(111));
    assert_eq!(RowField::from_scalar(LogicalType::INT_16, ScalarValue::Int32(222)), RowField::Short(222));
    assert_eq!(RowField::from_scalar(LogicalType::INT_32, ScalarValue::Int32(333)), RowField::Int(333));
    assert_eq!(RowField::from_scalar(LogicalType::NONE, ScalarValue::Int32(444)), RowField::Int(444));
  }

  #[test]
  fn test_row_field_from_scalar_int64() {
    assert_eq!(RowField::from_scalar(LogicalType::INT_64, ScalarValue::Int64(1111)), RowField::Long(1111));
    assert_eq!(RowField::from_scalar(LogicalType::NONE, ScalarValue::Int64(2222)), RowField::Long(2222));
  }

  #[test]
  fn test_row_field_from_scalar_int96_timestamp() {
    let value = Int96::from(vec![0, 0, 2454923]);
    let row = RowField::from_scalar(LogicalType::NONE, ScalarValue::Int96(value));
    assert_eq!(row, RowField::Timestamp(1238544000000));
  }

  #[test]
  fn test_row_field_from_scalar_byte_array_utf8() {
    let value = ByteArray::from(vec![b'A', b'B', b'C', b'D']);
    let row = RowField::from_scalar(LogicalType::UTF8, ScalarValue::ByteArray(value));
    assert_eq!(row, RowField::Str("ABCD".to_string()));
  }

  #[test]
  fn test_row_field_from_scalar_byte_array_plain() {
    let value = ByteArray::from(vec![1, 2, 3, 4, 5]);
    let row = RowField::from_scalar(LogicalType::NONE, ScalarValue::ByteArray(value.clone()));
    assert_eq!(row, RowField::Bytes(value));
  }

  #[test]
  fn test_row_display() {
    assert_eq!(format!("{}", RowField::Null), "null");
    assert_eq!(format!("{}", RowField::Bool(true)), "true");
    assert_eq!(format!("{}", RowField::Float(5.0)), "5.0");
    assert_eq!(format!("{}", RowField::Str("abc".to_string())), "\"abc\"");

    let row = Row::new(vec![
      ("x".to_string(), RowField::Null),
      ("y".to_string(), RowField::Int(2)),
      ("z".to_string(), RowField::Str("abc".to_string())),
    ]);
    assert_eq!(format!("{}", row), "{x: null, y: 2, z: \"abc\"}");

    let list = RowField::List(vec![RowField::Int(2), RowField::Int(1), RowField::Null]);
    assert_eq!(format!("{}", list), "[2, 1, null]");

    let map = RowField::Map(vec![(RowField::Int(1), RowField::Float(1.2)), (RowField::Int(2), RowField::Float(4.5))]);
    assert_eq!(format!("{}", map), "{1 -> 1.2, 2 -> 4.5}");
  }

  #[test]
  fn test_row_from_logical_output_nested_list_of_struct() {
    // message schema { REQUIRED group points (LIST) { REPEATED group list { REQUIRED group element { REQUIRED INT32 x; } } } }
    let x_field = ParquetType::new_primitive("x", Repetition::REQUIRED, Type::INT32, LogicalType::NONE, -1);
    let element = ParquetType::new_group("element", Repetition::REQUIRED, LogicalType::NONE, vec![std::rc::Rc::new(x_field)]);
    let list_group = ParquetType::new_group("list", Repetition::REPEATED, LogicalType::NONE, vec![std::rc::Rc::new(element)]);
    let points = ParquetType::new_group("points", Repetition::REQUIRED, LogicalType::LIST, vec![std::rc::Rc::new(list_group)]);

    assert!(points.is_list());

    let struct_value = StructValue { fields: vec![("x".to_string(), LogicalOutput::Scalar(ScalarValue::Int32(7)))] };
    let output = LogicalOutput::List(Some(vec![LogicalOutput::Struct(Some(struct_value))]));

    let field = RowField::from_logical_output(&points, &output);
    match field {
      RowField::List(items) => {
        assert_eq!(items.len(), 1);
        match &items[0] {
          RowField::Group(row) => assert_eq!(row.get("x"), Some(&RowField::Int(7))),
          other => panic!("expected group, got {:?}", other),
        }
      },
      other => panic!("expected list, got {:?}", other),
    }
  }

  #[test]
  fn test_row_from_logical_output_map() {
    let key = ParquetType::new_primitive("key", Repetition::REQUIRED, Type::INT32, LogicalType::NONE, -1);
    let value = ParquetType::new_primitive("value", Repetition::OPTIONAL, Type::INT64, LogicalType::NONE, -1);
    let key_value = ParquetType::new_group(
      "key_value",
      Repetition::REPEATED,
      LogicalType::NONE,
      vec![std::rc::Rc::new(key), std::rc::Rc::new(value)],
    );
    let map_node = ParquetType::new_group("m", Repetition::REQUIRED, LogicalType::MAP, vec![std::rc::Rc::new(key_value)]);
    assert!(map_node.is_map());

    let output = LogicalOutput::Map(Some(vec![(MapKey::Int32(1), Some(LogicalOutput::NullableScalar(Some(ScalarValue::Int64(9)))))]));
    let field = RowField::from_logical_output(&map_node, &output);
    match field {
      RowField::Map(pairs) => {
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, RowField::Int(1));
        assert_eq!(pairs[0].1, RowField::Long(9));
      },
      other => panic!("expected map, got {:?}", other),
    }
  }
}
