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

//! Logical values the nested reader produces and the nested writer consumes
//! (§4.1 "Logical output"), plus the per-leaf column storage shared by both.

use crate::basic::Type;
use crate::data_type::{ByteArray, Int96};
use crate::errors::Result;

/// A single decoded value of one of the eight physical types.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
  Bool(bool),
  Int32(i32),
  Int64(i64),
  Int96(Int96),
  Float(f32),
  Double(f64),
  ByteArray(ByteArray),
}

/// A tagged nested value, mirroring the shape of a schema subtree.
/// `List`/`Struct`/`Map` wrap an `Option` at their own level: `None` means the
/// container itself is NULL, `Some` with an empty collection means present
/// but empty.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOutput {
  Scalar(ScalarValue),
  NullableScalar(Option<ScalarValue>),
  List(Option<Vec<LogicalOutput>>),
  Struct(Option<StructValue>),
  Map(Option<Vec<(MapKey, Option<LogicalOutput>)>>),
}

/// A struct instance: field name to value, in schema declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
  pub fields: Vec<(String, LogicalOutput)>,
}

impl StructValue {
  pub fn get(&self, name: &str) -> Option<&LogicalOutput> {
    self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
  }
}

/// A map key, restricted to the subset of physical types with a lossless
/// `Eq`/`Hash` (§9 "Map key types" -- INT96 and IEEE floats are excluded so a
/// decoded key never silently collides with a different key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
  Bool(bool),
  Int32(i32),
  Int64(i64),
  ByteArray(Vec<u8>),
}

impl MapKey {
  pub fn from_scalar(value: ScalarValue) -> Result<MapKey> {
    match value {
      ScalarValue::Bool(b) => Ok(MapKey::Bool(b)),
      ScalarValue::Int32(i) => Ok(MapKey::Int32(i)),
      ScalarValue::Int64(i) => Ok(MapKey::Int64(i)),
      ScalarValue::ByteArray(b) => Ok(MapKey::ByteArray(b.data().to_vec())),
      other => Err(schema_mismatch_err!("physical type of {:?} cannot be used as a map key", other)),
    }
  }

  pub fn to_scalar(&self) -> ScalarValue {
    match self {
      MapKey::Bool(b) => ScalarValue::Bool(*b),
      MapKey::Int32(i) => ScalarValue::Int32(*i),
      MapKey::Int64(i) => ScalarValue::Int64(*i),
      MapKey::ByteArray(b) => ScalarValue::ByteArray(ByteArray::from(b.clone())),
    }
  }
}

/// Per-physical-type value storage for one leaf column, shared by the reader
/// (populated from decoded pages) and the writer (populated row by row).
#[derive(Debug, Clone)]
pub enum LeafValues {
  Bool(Vec<bool>),
  Int32(Vec<i32>),
  Int64(Vec<i64>),
  Int96(Vec<Int96>),
  Float(Vec<f32>),
  Double(Vec<f64>),
  ByteArray(Vec<ByteArray>),
}

impl LeafValues {
  pub fn empty_for(physical_type: Type) -> Self {
    match physical_type {
      Type::BOOLEAN => LeafValues::Bool(Vec::new()),
      Type::INT32 => LeafValues::Int32(Vec::new()),
      Type::INT64 => LeafValues::Int64(Vec::new()),
      Type::INT96 => LeafValues::Int96(Vec::new()),
      Type::FLOAT => LeafValues::Float(Vec::new()),
      Type::DOUBLE => LeafValues::Double(Vec::new()),
      Type::BYTE_ARRAY | Type::FIXED_LEN_BYTE_ARRAY => LeafValues::ByteArray(Vec::new()),
    }
  }

  pub fn len(&self) -> usize {
    match self {
      LeafValues::Bool(v) => v.len(),
      LeafValues::Int32(v) => v.len(),
      LeafValues::Int64(v) => v.len(),
      LeafValues::Int96(v) => v.len(),
      LeafValues::Float(v) => v.len(),
      LeafValues::Double(v) => v.len(),
      LeafValues::ByteArray(v) => v.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn scalar_at(&self, idx: usize) -> Option<ScalarValue> {
    match self {
      LeafValues::Bool(v) => v.get(idx).copied().map(ScalarValue::Bool),
      LeafValues::Int32(v) => v.get(idx).copied().map(ScalarValue::Int32),
      LeafValues::Int64(v) => v.get(idx).copied().map(ScalarValue::Int64),
      LeafValues::Int96(v) => v.get(idx).cloned().map(ScalarValue::Int96),
      LeafValues::Float(v) => v.get(idx).copied().map(ScalarValue::Float),
      LeafValues::Double(v) => v.get(idx).copied().map(ScalarValue::Double),
      LeafValues::ByteArray(v) => v.get(idx).cloned().map(ScalarValue::ByteArray),
    }
  }

  pub fn to_scalar_vec(&self) -> Vec<ScalarValue> {
    (0..self.len()).map(|i| self.scalar_at(i).expect("index within len")).collect()
  }

  /// Appends one value, failing if `value`'s physical type does not match
  /// this buffer's (a schema/value mismatch from the caller).
  pub fn push_scalar(&mut self, value: ScalarValue) -> Result<()> {
    match (self, value) {
      (LeafValues::Bool(v), ScalarValue::Bool(x)) => v.push(x),
      (LeafValues::Int32(v), ScalarValue::Int32(x)) => v.push(x),
      (LeafValues::Int64(v), ScalarValue::Int64(x)) => v.push(x),
      (LeafValues::Int96(v), ScalarValue::Int96(x)) => v.push(x),
      (LeafValues::Float(v), ScalarValue::Float(x)) => v.push(x),
      (LeafValues::Double(v), ScalarValue::Double(x)) => v.push(x),
      (LeafValues::ByteArray(v), ScalarValue::ByteArray(x)) => v.push(x),
      (_, value) => return Err(schema_mismatch_err!("value {:?} does not match this column's physical type", value)),
    }
    Ok(())
  }
}

/// One leaf column's worth of `(values, def_levels, rep_levels)`: the shared
/// currency between per-page decoding/encoding and the nested reconstruction
/// engine, which operates over a whole row group's concatenated streams.
#[derive(Debug, Clone)]
pub struct LeafColumn {
  pub values: LeafValues,
  pub def_levels: Vec<i16>,
  pub rep_levels: Vec<i16>,
}

impl LeafColumn {
  pub fn empty_for(physical_type: Type) -> Self {
    LeafColumn { values: LeafValues::empty_for(physical_type), def_levels: Vec::new(), rep_levels: Vec::new() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_leaf_values_push_and_read_back() {
    let mut values = LeafValues::empty_for(Type::INT32);
    values.push_scalar(ScalarValue::Int32(5)).unwrap();
    values.push_scalar(ScalarValue::Int32(-3)).unwrap();
    assert_eq!(values.to_scalar_vec(), vec![ScalarValue::Int32(5), ScalarValue::Int32(-3)]);
  }

  #[test]
  fn test_leaf_values_push_type_mismatch() {
    let mut values = LeafValues::empty_for(Type::INT32);
    assert!(values.push_scalar(ScalarValue::Bool(true)).is_err());
  }

  #[test]
  fn test_map_key_round_trip() {
    let key = MapKey::Int64(42);
    let scalar = key.to_scalar();
    assert_eq!(MapKey::from_scalar(scalar).unwrap(), key);
  }

  #[test]
  fn test_map_key_rejects_float() {
    assert!(MapKey::from_scalar(ScalarValue::Double(1.5)).is_err());
  }
}
