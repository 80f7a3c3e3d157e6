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

//! Physical value types. Each marker type (`Int32Type`, `ByteArrayType`, ...)
//! implements [`DataType`] and is used to monomorphize decoders, encoders and
//! column readers/writers over the eight physical types Parquet supports.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::basic::Type;
use crate::util::memory::ByteBufferPtr;

/// A 12-byte value used by the (deprecated but still common) INT96 timestamp
/// representation: two `u32` words of nanoseconds-of-day followed by a Julian day.
#[derive(Clone, Debug, Default)]
pub struct Int96 {
  value: [u32; 3],
}

impl Int96 {
  pub fn new() -> Self {
    Int96 { value: [0; 3] }
  }

  pub fn data(&self) -> &[u32] {
    &self.value
  }

  pub fn set_data(&mut self, elements: Vec<u32>) {
    assert_eq!(elements.len(), 3);
    self.value.copy_from_slice(&elements);
  }
}

impl From<Vec<u32>> for Int96 {
  fn from(v: Vec<u32>) -> Self {
    let mut i = Int96::new();
    i.set_data(v);
    i
  }
}

impl PartialEq for Int96 {
  fn eq(&self, other: &Int96) -> bool {
    self.value == other.value
  }
}

/// A variable-length byte sequence, used for `BYTE_ARRAY` and
/// `FIXED_LEN_BYTE_ARRAY` physical types.
#[derive(Clone, Debug, Default)]
pub struct ByteArray {
  data: Option<ByteBufferPtr>,
}

impl ByteArray {
  pub fn new() -> Self {
    ByteArray { data: None }
  }

  pub fn data(&self) -> &[u8] {
    self.data.as_ref().map(|b| b.as_ref()).unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.data().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn set_data(&mut self, data: ByteBufferPtr) {
    self.data = Some(data);
  }
}

impl From<Vec<u8>> for ByteArray {
  fn from(v: Vec<u8>) -> Self {
    let mut b = ByteArray::new();
    b.set_data(ByteBufferPtr::new(v));
    b
  }
}

impl From<&str> for ByteArray {
  fn from(v: &str) -> Self {
    ByteArray::from(v.as_bytes().to_vec())
  }
}

impl PartialEq for ByteArray {
  fn eq(&self, other: &ByteArray) -> bool {
    self.data() == other.data()
  }
}

impl PartialOrd for ByteArray {
  fn partial_cmp(&self, other: &ByteArray) -> Option<Ordering> {
    self.data().partial_cmp(other.data())
  }
}

impl fmt::Display for ByteArray {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self.data())
  }
}

/// A Rust-native value of some physical Parquet type, plus the associated byte-
/// width (when fixed) and default used by decoders when pre-sizing buffers.
/// Deliberately does not require `PartialOrd`: `Int96` has no natural
/// ordering (§9 "Statistics"), so ordering is required explicitly wherever
/// it is actually needed (e.g. `OrdStatistics<V: PartialOrd>`) instead.
pub trait ParquetValueType: PartialEq + fmt::Debug + Default + Clone + Send + 'static {}

impl ParquetValueType for bool {}
impl ParquetValueType for i32 {}
impl ParquetValueType for i64 {}
impl ParquetValueType for Int96 {}
impl ParquetValueType for f32 {}
impl ParquetValueType for f64 {}
impl ParquetValueType for ByteArray {}

/// Associates a marker type with the Rust value type and physical type tag used
/// to decode/encode/store it. Mirrors the "type-class" pattern used throughout
/// this crate's encoding and column layers to avoid a single giant enum of values.
pub trait DataType: 'static {
  type T: ParquetValueType;

  fn get_physical_type() -> Type;

  /// Size in bytes of one value, for fixed-width types. `BYTE_ARRAY` is
  /// variable-length and has no fixed size.
  fn get_type_size() -> usize;
}

macro_rules! make_type {
  ($name:ident, $physical_ty:expr, $native_ty:ty, $size:expr) => {
    #[derive(Clone)]
    pub struct $name {}

    impl DataType for $name {
      type T = $native_ty;

      fn get_physical_type() -> Type {
        $physical_ty
      }

      fn get_type_size() -> usize {
        $size
      }
    }
  };
}

make_type!(BoolType, Type::BOOLEAN, bool, 1);
make_type!(Int32Type, Type::INT32, i32, 4);
make_type!(Int64Type, Type::INT64, i64, 8);
make_type!(Int96Type, Type::INT96, Int96, mem::size_of::<Int96>());
make_type!(FloatType, Type::FLOAT, f32, 4);
make_type!(DoubleType, Type::DOUBLE, f64, 8);
make_type!(ByteArrayType, Type::BYTE_ARRAY, ByteArray, mem::size_of::<ByteArray>());
make_type!(FixedLenByteArrayType, Type::FIXED_LEN_BYTE_ARRAY, ByteArray, mem::size_of::<ByteArray>());

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_byte_array_eq() {
    let a = ByteArray::from(vec![1, 2, 3]);
    let b = ByteArray::from(vec![1, 2, 3]);
    let c = ByteArray::from(vec![1, 2, 4]);
    assert_eq!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn test_int96_roundtrip() {
    let i = Int96::from(vec![1, 2, 3]);
    assert_eq!(i.data(), &[1, 2, 3]);
  }

  #[test]
  fn test_type_sizes() {
    assert_eq!(Int32Type::get_type_size(), 4);
    assert_eq!(DoubleType::get_type_size(), 8);
    assert_eq!(Int32Type::get_physical_type(), Type::INT32);
  }
}
