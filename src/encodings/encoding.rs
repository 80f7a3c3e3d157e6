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

//! Writer-side counterpart of `decoding.rs`: `PLAIN` encoding plus a
//! dictionary encoder that accumulates a deduplicated dictionary and an
//! index stream, falling back to `PLAIN` when the dictionary grows too large
//! (§4.6 "Adaptive dictionary/PLAIN column encoder").

use std::collections::HashMap;
use std::hash::Hash;

use crate::basic::Encoding;
use crate::data_type::*;
use crate::encodings::rle;
use crate::errors::Result;

/// Accumulates values for one page/column chunk and produces the encoded byte
/// stream for that physical type.
pub trait Encoder<T: DataType> {
  fn put(&mut self, values: &[T::T]) -> Result<()>;

  /// How many values are currently buffered, unflushed.
  fn num_buffered_values(&self) -> usize;

  /// Serializes the first `num_values` buffered values and keeps the rest
  /// buffered, so a page can be cut at a record boundary that falls short of
  /// everything put so far (§4.6 "Record boundaries").
  fn flush_buffer_prefix(&mut self, num_values: usize) -> Result<Vec<u8>>;

  /// Serializes everything buffered so far and resets internal state.
  fn flush_buffer(&mut self) -> Result<Vec<u8>> {
    let n = self.num_buffered_values();
    self.flush_buffer_prefix(n)
  }

  fn encoding(&self) -> Encoding;

  fn estimated_data_encoded_size(&self) -> usize;
}

// ----------------------------------------------------------------------
// PLAIN encoding
//
// Values are kept raw (not pre-encoded) so `flush_buffer_prefix` can encode
// just the leading `num_values` of them and leave the rest buffered.

#[derive(Default)]
pub struct PlainEncoder<T: DataType> {
  values: Vec<T::T>,
}

impl<T: DataType> PlainEncoder<T> {
  pub fn new() -> Self {
    PlainEncoder { values: Vec::new() }
  }
}

macro_rules! impl_plain_encoder_fixed_width {
  ($marker:ty, $to_le:expr, $width:expr) => {
    impl Encoder<$marker> for PlainEncoder<$marker> {
      fn put(&mut self, values: &[<$marker as DataType>::T]) -> Result<()> {
        self.values.extend_from_slice(values);
        Ok(())
      }

      fn num_buffered_values(&self) -> usize {
        self.values.len()
      }

      fn flush_buffer_prefix(&mut self, num_values: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(num_values * $width);
        for v in self.values.drain(..num_values) {
          out.extend_from_slice(&$to_le(v));
        }
        Ok(out)
      }

      fn encoding(&self) -> Encoding {
        Encoding::PLAIN
      }

      fn estimated_data_encoded_size(&self) -> usize {
        self.values.len() * $width
      }
    }
  };
}

impl_plain_encoder_fixed_width!(Int32Type, i32::to_le_bytes, 4);
impl_plain_encoder_fixed_width!(Int64Type, i64::to_le_bytes, 8);
impl_plain_encoder_fixed_width!(FloatType, f32::to_le_bytes, 4);
impl_plain_encoder_fixed_width!(DoubleType, f64::to_le_bytes, 8);

impl Encoder<BoolType> for PlainEncoder<BoolType> {
  fn put(&mut self, values: &[bool]) -> Result<()> {
    self.values.extend_from_slice(values);
    Ok(())
  }

  fn num_buffered_values(&self) -> usize {
    self.values.len()
  }

  fn flush_buffer_prefix(&mut self, num_values: usize) -> Result<Vec<u8>> {
    let mut writer = crate::util::bit_util::BitWriter::new(crate::util::bit_util::ceil(num_values as i64, 8) as usize + 1);
    for v in self.values.drain(..num_values) {
      writer.put_value(v as u64, 1);
    }
    Ok(writer.consume())
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    crate::util::bit_util::ceil(self.values.len() as i64, 8) as usize
  }
}

impl Encoder<Int96Type> for PlainEncoder<Int96Type> {
  fn put(&mut self, values: &[Int96]) -> Result<()> {
    self.values.extend_from_slice(values);
    Ok(())
  }

  fn num_buffered_values(&self) -> usize {
    self.values.len()
  }

  fn flush_buffer_prefix(&mut self, num_values: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(num_values * 12);
    for v in self.values.drain(..num_values) {
      for word in v.data() {
        out.extend_from_slice(&word.to_le_bytes());
      }
    }
    Ok(out)
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.values.len() * 12
  }
}

impl Encoder<ByteArrayType> for PlainEncoder<ByteArrayType> {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    self.values.extend_from_slice(values);
    Ok(())
  }

  fn num_buffered_values(&self) -> usize {
    self.values.len()
  }

  fn flush_buffer_prefix(&mut self, num_values: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for v in self.values.drain(..num_values) {
      out.extend_from_slice(&(v.len() as u32).to_le_bytes());
      out.extend_from_slice(v.data());
    }
    Ok(out)
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.values.iter().map(|v| 4 + v.len()).sum()
  }
}

impl Encoder<FixedLenByteArrayType> for PlainEncoder<FixedLenByteArrayType> {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    self.values.extend_from_slice(values);
    Ok(())
  }

  fn num_buffered_values(&self) -> usize {
    self.values.len()
  }

  fn flush_buffer_prefix(&mut self, num_values: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for v in self.values.drain(..num_values) {
      out.extend_from_slice(v.data());
    }
    Ok(out)
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.values.iter().map(|v| v.len()).sum()
  }
}

// ----------------------------------------------------------------------
// Dictionary encoding

/// A hashable wrapper is needed because most `ParquetValueType`s do not
/// implement `Eq`/`Hash` (floats don't). The dictionary encoder compares by
/// the type's `Debug` representation, which is stable for the value types
/// this crate supports and avoids a second, float-specific code path.
fn dict_key<V: std::fmt::Debug>(v: &V) -> String {
  format!("{:?}", v)
}

/// Builds a deduplicated dictionary of values plus an RLE/bit-packed index
/// stream referencing it. Callers are expected to check
/// [`DictEncoder::dict_encoded_size`] against a configured threshold and fall
/// back to [`PlainEncoder`] if the dictionary grows too large (§4.6).
pub struct DictEncoder<T: DataType>
where
  T::T: std::fmt::Debug,
{
  dict_values: Vec<T::T>,
  index_of: HashMap<String, i32>,
  indices: Vec<i32>,
}

impl<T: DataType> DictEncoder<T>
where
  T::T: std::fmt::Debug,
{
  pub fn new() -> Self {
    DictEncoder { dict_values: Vec::new(), index_of: HashMap::new(), indices: Vec::new() }
  }

  pub fn num_entries(&self) -> usize {
    self.dict_values.len()
  }

  /// Estimated size (bytes) of the dictionary page this encoder would emit.
  pub fn dict_encoded_size(&self) -> usize {
    self.dict_values.len() * T::get_type_size().max(4)
  }

  /// Drains the accumulated dictionary values in insertion order, consuming them.
  pub fn write_dict(&self) -> Vec<T::T>
  where
    T::T: Clone,
  {
    self.dict_values.clone()
  }

  fn bit_width(&self) -> usize {
    let max_index = self.dict_values.len().saturating_sub(1) as u64;
    rle::bit_width_for_max_value(max_index)
  }
}

impl<T: DataType> Default for DictEncoder<T>
where
  T::T: std::fmt::Debug,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<T: DataType> Encoder<T> for DictEncoder<T>
where
  T::T: std::fmt::Debug + Clone,
{
  fn put(&mut self, values: &[T::T]) -> Result<()> {
    for v in values {
      let key = dict_key(v);
      let idx = match self.index_of.get(&key) {
        Some(idx) => *idx,
        None => {
          let idx = self.dict_values.len() as i32;
          self.dict_values.push(v.clone());
          self.index_of.insert(key, idx);
          idx
        },
      };
      self.indices.push(idx);
    }
    Ok(())
  }

  fn num_buffered_values(&self) -> usize {
    self.indices.len()
  }

  fn flush_buffer_prefix(&mut self, num_values: usize) -> Result<Vec<u8>> {
    let bit_width = self.bit_width();
    let mut out = vec![bit_width as u8];
    if bit_width > 0 {
      let indices_u32: Vec<u32> = self.indices.drain(..num_values).map(|i| i as u32).collect();
      out.extend_from_slice(&rle::encode(&indices_u32, bit_width));
    } else {
      self.indices.drain(..num_values);
    }
    Ok(out)
  }

  fn encoding(&self) -> Encoding {
    Encoding::RLE_DICTIONARY
  }

  fn estimated_data_encoded_size(&self) -> usize {
    let bit_width = self.bit_width().max(1);
    crate::util::bit_util::ceil((self.indices.len() * bit_width) as i64, 8) as usize + 1
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::encodings::decoding::{Decoder, DictDecoder, PlainDecoder};
  use crate::util::memory::ByteBufferPtr;
  use std::rc::Rc;

  #[test]
  fn test_plain_encoder_int32_round_trip() {
    let values = vec![1i32, -2, 3, 1000, -1000];
    let mut encoder = PlainEncoder::<Int32Type>::new();
    encoder.put(&values).unwrap();
    let bytes = encoder.flush_buffer().unwrap();

    let mut decoder = PlainDecoder::<Int32Type>::new(-1);
    decoder.set_data(ByteBufferPtr::new(bytes), values.len()).unwrap();
    let mut out = vec![0i32; values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_plain_encoder_bool_round_trip() {
    let values = vec![true, false, false, true, true];
    let mut encoder = PlainEncoder::<BoolType>::new();
    encoder.put(&values).unwrap();
    let bytes = encoder.flush_buffer().unwrap();

    let mut decoder = PlainDecoder::<BoolType>::new(-1);
    decoder.set_data(ByteBufferPtr::new(bytes), values.len()).unwrap();
    let mut out = vec![false; values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_dict_encoder_deduplicates_and_round_trips() {
    let values = vec![10i32, 20, 10, 10, 30, 20];
    let mut encoder: DictEncoder<Int32Type> = DictEncoder::new();
    encoder.put(&values).unwrap();
    assert_eq!(encoder.num_entries(), 3);

    let dict = Rc::new(encoder.write_dict());
    let index_bytes = encoder.flush_buffer().unwrap();

    let mut decoder: DictDecoder<Int32Type> = DictDecoder::new();
    decoder.set_dict(dict);
    decoder.set_data(ByteBufferPtr::new(index_bytes), values.len()).unwrap();
    let mut out = vec![0i32; values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_dict_encoder_single_distinct_value_zero_bit_width() {
    let values = vec![7i32; 5];
    let mut encoder: DictEncoder<Int32Type> = DictEncoder::new();
    encoder.put(&values).unwrap();
    let bytes = encoder.flush_buffer().unwrap();
    assert_eq!(bytes[0], 0);
  }
}
