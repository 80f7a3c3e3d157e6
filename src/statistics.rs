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

//! Column chunk statistics: `null_count` plus type-specific `min`/`max`
//! (§4.6 "Statistics"). NaN never updates min/max and is never counted as
//! NULL; comparisons are byte-wise for byte arrays.

use ordered_float::OrderedFloat;

use crate::data_type::{
  BoolType, ByteArray, ByteArrayType, DataType, DoubleType, FixedLenByteArrayType, FloatType, Int32Type,
  Int64Type, Int96, Int96Type,
};

/// Serializes a single value the same way `PLAIN` encodes it, so statistics
/// bytes are in the format readers (including other implementations) expect.
pub trait StatBytes {
  fn stat_bytes(&self) -> Vec<u8>;
}

impl StatBytes for bool {
  fn stat_bytes(&self) -> Vec<u8> {
    vec![*self as u8]
  }
}
impl StatBytes for i32 {
  fn stat_bytes(&self) -> Vec<u8> {
    self.to_le_bytes().to_vec()
  }
}
impl StatBytes for i64 {
  fn stat_bytes(&self) -> Vec<u8> {
    self.to_le_bytes().to_vec()
  }
}
impl StatBytes for f32 {
  fn stat_bytes(&self) -> Vec<u8> {
    self.to_le_bytes().to_vec()
  }
}
impl StatBytes for f64 {
  fn stat_bytes(&self) -> Vec<u8> {
    self.to_le_bytes().to_vec()
  }
}
impl StatBytes for ByteArray {
  fn stat_bytes(&self) -> Vec<u8> {
    self.data().to_vec()
  }
}

/// Per-marker-type hook the column writer uses to accumulate chunk-level
/// min/max without requiring every physical type to have an ordering:
/// `Int96Type` returns `None` unconditionally (§9 "Statistics" — INT96 has
/// no natural ordering), so only `null_count` is ever tracked for it.
pub trait StatBytesType: DataType {
  fn value_stat_bytes(value: &Self::T) -> Option<Vec<u8>>;
}

macro_rules! impl_stat_bytes_type {
  ($marker:ty) => {
    impl StatBytesType for $marker {
      fn value_stat_bytes(value: &<$marker as DataType>::T) -> Option<Vec<u8>> {
        Some(value.stat_bytes())
      }
    }
  };
}

impl_stat_bytes_type!(BoolType);
impl_stat_bytes_type!(Int32Type);
impl_stat_bytes_type!(Int64Type);
impl_stat_bytes_type!(FloatType);
impl_stat_bytes_type!(DoubleType);
impl_stat_bytes_type!(ByteArrayType);
impl_stat_bytes_type!(FixedLenByteArrayType);

impl StatBytesType for Int96Type {
  fn value_stat_bytes(_value: &Int96) -> Option<Vec<u8>> {
    None
  }
}

/// A typed accumulator, one per column chunk being written. Merging page
/// statistics into the chunk accumulator is just repeated `update` calls.
pub trait TypedStatistics<V> {
  fn update(&mut self, values: &[V], num_nulls: usize);
  fn min(&self) -> Option<&V>;
  fn max(&self) -> Option<&V>;
  fn null_count(&self) -> u64;

  fn min_bytes(&self) -> Option<Vec<u8>>
  where
    V: StatBytes,
  {
    self.min().map(StatBytes::stat_bytes)
  }

  fn max_bytes(&self) -> Option<Vec<u8>>
  where
    V: StatBytes,
  {
    self.max().map(StatBytes::stat_bytes)
  }
}

/// Generic accumulator for types with a total order (`Ord`): booleans,
/// integers, byte arrays (compared byte-wise, matching UTF-8 byte order).
pub struct OrdStatistics<V: PartialOrd + Clone> {
  min: Option<V>,
  max: Option<V>,
  null_count: u64,
}

impl<V: PartialOrd + Clone> OrdStatistics<V> {
  pub fn new() -> Self {
    OrdStatistics { min: None, max: None, null_count: 0 }
  }
}

impl<V: PartialOrd + Clone> Default for OrdStatistics<V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V: PartialOrd + Clone> TypedStatistics<V> for OrdStatistics<V> {
  fn update(&mut self, values: &[V], num_nulls: usize) {
    self.null_count += num_nulls as u64;
    for v in values {
      if self.min.as_ref().map_or(true, |m| v < m) {
        self.min = Some(v.clone());
      }
      if self.max.as_ref().map_or(true, |m| v > m) {
        self.max = Some(v.clone());
      }
    }
  }

  fn min(&self) -> Option<&V> {
    self.min.as_ref()
  }

  fn max(&self) -> Option<&V> {
    self.max.as_ref()
  }

  fn null_count(&self) -> u64 {
    self.null_count
  }
}

pub type BoolStatistics = OrdStatistics<bool>;
pub type Int32Statistics = OrdStatistics<i32>;
pub type Int64Statistics = OrdStatistics<i64>;
pub type ByteArrayStatistics = OrdStatistics<ByteArray>;

/// Accumulator for IEEE floats: comparisons exclude NaN (a NaN value never
/// updates min/max, and is not counted as a null either). Ordering is done
/// through `OrderedFloat` rather than hand-rolled `partial_cmp` handling.
pub struct FloatStatistics<V> {
  min: Option<OrderedFloat<V>>,
  max: Option<OrderedFloat<V>>,
  null_count: u64,
}

impl<V: num_traits_float::Float> FloatStatistics<V> {
  pub fn new() -> Self {
    FloatStatistics { min: None, max: None, null_count: 0 }
  }
}

impl<V: num_traits_float::Float> Default for FloatStatistics<V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V: num_traits_float::Float> TypedStatistics<V> for FloatStatistics<V> {
  fn update(&mut self, values: &[V], num_nulls: usize) {
    self.null_count += num_nulls as u64;
    for &v in values {
      if v.is_nan() {
        continue;
      }
      let wrapped = OrderedFloat(v);
      if self.min.map_or(true, |m| wrapped < m) {
        self.min = Some(wrapped);
      }
      if self.max.map_or(true, |m| wrapped > m) {
        self.max = Some(wrapped);
      }
    }
  }

  fn min(&self) -> Option<&V> {
    self.min.as_ref().map(|m| &m.0)
  }

  fn max(&self) -> Option<&V> {
    self.max.as_ref().map(|m| &m.0)
  }

  fn null_count(&self) -> u64 {
    self.null_count
  }
}

pub type Float32Statistics = FloatStatistics<f32>;
pub type Float64Statistics = FloatStatistics<f64>;

/// Just enough of a `Float` bound to compare and detect NaN, without pulling
/// in the full `num-traits` crate for one method.
mod num_traits_float {
  pub trait Float: PartialOrd + Copy {
    fn is_nan(self) -> bool;
  }
  impl Float for f32 {
    fn is_nan(self) -> bool {
      f32::is_nan(self)
    }
  }
  impl Float for f64 {
    fn is_nan(self) -> bool {
      f64::is_nan(self)
    }
  }
}

/// INT96 has no natural ordering in this crate (it is a legacy timestamp
/// encoding); only `null_count` is tracked, treating INT96 as opaque outside
/// of explicit timestamp conversion.
#[derive(Default)]
pub struct Int96Statistics {
  null_count: u64,
}

impl Int96Statistics {
  pub fn new() -> Self {
    Int96Statistics::default()
  }

  pub fn update(&mut self, _values: &[Int96], num_nulls: usize) {
    self.null_count += num_nulls as u64;
  }

  pub fn null_count(&self) -> u64 {
    self.null_count
  }
}

/// The serialized form of a column chunk's statistics, as it would be
/// written into `ColumnChunkMetaData`. Populated only when the encoded size
/// stays within `max_statistics_size`; dropped entirely otherwise (§4.6,
/// Open Question: legacy and modern fields rise and fall together).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
  pub null_count: u64,
  pub min: Option<Vec<u8>>,
  pub max: Option<Vec<u8>>,
  pub min_value: Option<Vec<u8>>,
  pub max_value: Option<Vec<u8>>,
}

impl Statistics {
  /// Builds the wire representation from raw min/max bytes, dropping both
  /// (and logging) if the combined encoded size exceeds `max_statistics_size`.
  pub fn from_min_max(null_count: u64, min: Option<Vec<u8>>, max: Option<Vec<u8>>, max_statistics_size: usize) -> Self {
    let encoded_size = min.as_ref().map_or(0, |m| m.len()) + max.as_ref().map_or(0, |m| m.len());
    if encoded_size > max_statistics_size {
      log::warn!(
        "statistics encoded size {} exceeds max_statistics_size {}; dropping min/max",
        encoded_size,
        max_statistics_size
      );
      return Statistics { null_count, min: None, max: None, min_value: None, max_value: None };
    }
    Statistics { null_count, min: min.clone(), max: max.clone(), min_value: min, max_value: max }
  }

  pub fn only_null_count(null_count: u64) -> Self {
    Statistics { null_count, min: None, max: None, min_value: None, max_value: None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ord_statistics_int32() {
    let mut stats = Int32Statistics::new();
    stats.update(&[5, -3, 10, 2], 1);
    assert_eq!(stats.min(), Some(&-3));
    assert_eq!(stats.max(), Some(&10));
    assert_eq!(stats.null_count(), 1);
  }

  #[test]
  fn test_float_statistics_excludes_nan() {
    let mut stats = Float64Statistics::new();
    stats.update(&[1.0, f64::NAN, -2.0, 3.0], 0);
    assert_eq!(stats.min(), Some(&-2.0));
    assert_eq!(stats.max(), Some(&3.0));
    assert_eq!(stats.null_count(), 0);
  }

  #[test]
  fn test_byte_array_statistics_byte_wise_order() {
    let mut stats = ByteArrayStatistics::new();
    stats.update(&[ByteArray::from("banana"), ByteArray::from("apple"), ByteArray::from("cherry")], 0);
    assert_eq!(stats.min().unwrap().data(), b"apple");
    assert_eq!(stats.max().unwrap().data(), b"cherry");
  }

  #[test]
  fn test_statistics_dropped_when_oversize() {
    let stats = Statistics::from_min_max(0, Some(vec![0u8; 10]), Some(vec![1u8; 10]), 8);
    assert!(stats.min.is_none());
    assert!(stats.max.is_none());
    assert!(stats.min_value.is_none());
  }

  #[test]
  fn test_statistics_kept_when_within_budget() {
    let stats = Statistics::from_min_max(2, Some(vec![1, 2]), Some(vec![3, 4]), 16);
    assert_eq!(stats.min, Some(vec![1, 2]));
    assert_eq!(stats.max_value, Some(vec![3, 4]));
    assert_eq!(stats.null_count, 2);
  }
}
