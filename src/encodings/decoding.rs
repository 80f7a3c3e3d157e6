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

//! Value decoders for the two encodings this crate supports: `PLAIN` and
//! dictionary (`PLAIN_DICTIONARY`/`RLE_DICTIONARY`). Delta encodings are
//! explicitly out of scope (see `SPEC_FULL.md` §1) and are not implemented;
//! requesting one surfaces `UnsupportedFeature` from [`get_decoder`].
//!
//! Each physical type gets its own concrete `impl Decoder<...>` rather than a
//! single generic impl relying on specialization, so this compiles on stable.

use std::convert::TryInto;
use std::marker::PhantomData;

use crate::basic::Encoding;
use crate::data_type::*;
use crate::encodings::rle::RleDecoder;
use crate::errors::{ParquetError, Result};
use crate::util::bit_util::BitReader;
use crate::util::memory::ByteBufferPtr;

/// A decoder for one physical type, fed a page's worth of bytes at a time.
pub trait Decoder<T: DataType> {
  /// Sets the data to decode; `num_values` is the number of logical values
  /// this decoder is responsible for producing from `data`.
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()>;

  /// Fills as much of `buffer` as there are values remaining, returning the
  /// count actually written.
  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize>;

  fn values_left(&self) -> usize;

  fn encoding(&self) -> Encoding;
}

/// Returns a decoder for a non-dictionary encoding. Dictionary-encoded pages
/// use [`DictDecoder`] directly, since they need a dictionary injected after
/// construction.
pub fn get_decoder<T: DataType>(encoding: Encoding, type_length: i32) -> Result<Box<dyn Decoder<T>>>
where
  PlainDecoder<T>: Decoder<T> + 'static,
{
  match encoding {
    Encoding::PLAIN => Ok(Box::new(PlainDecoder::<T>::new(type_length))),
    Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => {
      Err(general_err!("dictionary encodings require get_dict_decoder, not get_decoder"))
    },
    Encoding::DELTA_BINARY_PACKED | Encoding::DELTA_LENGTH_BYTE_ARRAY | Encoding::DELTA_BYTE_ARRAY => {
      Err(nyi_err!("delta encodings are not implemented"))
    },
    e => Err(nyi_err!("encoding {} is not supported for value decoding", e)),
  }
}

// ----------------------------------------------------------------------
// PLAIN decoding

/// PLAIN decoding: fixed-width values back to back, little-endian; length-
/// prefixed for variable-length byte arrays; full `type_length` bytes for
/// fixed-length byte arrays.
pub struct PlainDecoder<T: DataType> {
  data: Option<ByteBufferPtr>,
  start: usize,
  num_values: usize,
  type_length: i32,
  bit_reader: Option<BitReader>,
  _phantom: PhantomData<T>,
}

impl<T: DataType> PlainDecoder<T> {
  pub fn new(type_length: i32) -> Self {
    PlainDecoder {
      data: None,
      start: 0,
      num_values: 0,
      type_length,
      bit_reader: None,
      _phantom: PhantomData,
    }
  }
}

macro_rules! impl_plain_decoder_fixed_width {
  ($marker:ty, $size:expr, $from_le:expr) => {
    impl Decoder<$marker> for PlainDecoder<$marker> {
      fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
        self.data = Some(data);
        self.start = 0;
        self.num_values = num_values;
        Ok(())
      }

      fn values_left(&self) -> usize {
        self.num_values
      }

      fn encoding(&self) -> Encoding {
        Encoding::PLAIN
      }

      fn get(&mut self, buffer: &mut [<$marker as DataType>::T]) -> Result<usize> {
        let data = self.data.clone().ok_or_else(|| general_err!("set_data must be called before get"))?;
        let raw = data.as_ref();
        let num_values = buffer.len().min(self.num_values);
        let bytes_needed = $size * num_values;
        if raw.len() < self.start + bytes_needed {
          return Err(eof_err!("not enough bytes to decode {} PLAIN values", num_values));
        }
        for i in 0..num_values {
          let off = self.start + i * $size;
          let arr: [u8; $size] = raw[off..off + $size].try_into().unwrap();
          buffer[i] = $from_le(arr);
        }
        self.start += bytes_needed;
        self.num_values -= num_values;
        Ok(num_values)
      }
    }
  };
}

impl_plain_decoder_fixed_width!(Int32Type, 4, i32::from_le_bytes);
impl_plain_decoder_fixed_width!(Int64Type, 8, i64::from_le_bytes);
impl_plain_decoder_fixed_width!(FloatType, 4, f32::from_le_bytes);
impl_plain_decoder_fixed_width!(DoubleType, 8, f64::from_le_bytes);

impl Decoder<BoolType> for PlainDecoder<BoolType> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.bit_reader = Some(BitReader::new(data));
    self.num_values = num_values;
    Ok(())
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn get(&mut self, buffer: &mut [bool]) -> Result<usize> {
    let reader =
      self.bit_reader.as_mut().ok_or_else(|| general_err!("set_data must be called before get"))?;
    let num_values = buffer.len().min(self.num_values);
    for slot in buffer.iter_mut().take(num_values) {
      *slot = reader.get_value::<bool>(1).ok_or_else(|| eof_err!("not enough bits to decode bool"))?;
    }
    self.num_values -= num_values;
    Ok(num_values)
  }
}

impl Decoder<Int96Type> for PlainDecoder<Int96Type> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.data = Some(data);
    self.start = 0;
    self.num_values = num_values;
    Ok(())
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn get(&mut self, buffer: &mut [Int96]) -> Result<usize> {
    let data = self.data.clone().ok_or_else(|| general_err!("set_data must be called before get"))?;
    let raw = data.as_ref();
    let num_values = buffer.len().min(self.num_values);
    let bytes_needed = 12 * num_values;
    if raw.len() < self.start + bytes_needed {
      return Err(eof_err!("not enough bytes to decode {} INT96 values", num_values));
    }
    for i in 0..num_values {
      let off = self.start + i * 12;
      let words = [
        u32::from_le_bytes(raw[off..off + 4].try_into().unwrap()),
        u32::from_le_bytes(raw[off + 4..off + 8].try_into().unwrap()),
        u32::from_le_bytes(raw[off + 8..off + 12].try_into().unwrap()),
      ];
      buffer[i] = Int96::from(words.to_vec());
    }
    self.start += bytes_needed;
    self.num_values -= num_values;
    Ok(num_values)
  }
}

impl Decoder<ByteArrayType> for PlainDecoder<ByteArrayType> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.data = Some(data);
    self.start = 0;
    self.num_values = num_values;
    Ok(())
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn get(&mut self, buffer: &mut [ByteArray]) -> Result<usize> {
    let data = self.data.clone().ok_or_else(|| general_err!("set_data must be called before get"))?;
    let num_values = buffer.len().min(self.num_values);
    for slot in buffer.iter_mut().take(num_values) {
      let raw = data.as_ref();
      if raw.len() < self.start + 4 {
        return Err(eof_err!("not enough bytes to decode BYTE_ARRAY length"));
      }
      let len = u32::from_le_bytes(raw[self.start..self.start + 4].try_into().unwrap()) as usize;
      if raw.len() < self.start + 4 + len {
        return Err(eof_err!("not enough bytes to decode a BYTE_ARRAY value"));
      }
      let mut array = ByteArray::new();
      array.set_data(data.range(self.start + 4, len));
      *slot = array;
      self.start += 4 + len;
    }
    self.num_values -= num_values;
    Ok(num_values)
  }
}

impl Decoder<FixedLenByteArrayType> for PlainDecoder<FixedLenByteArrayType> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    self.data = Some(data);
    self.start = 0;
    self.num_values = num_values;
    Ok(())
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn get(&mut self, buffer: &mut [ByteArray]) -> Result<usize> {
    let data = self.data.clone().ok_or_else(|| general_err!("set_data must be called before get"))?;
    let len = self.type_length as usize;
    let num_values = buffer.len().min(self.num_values);
    let bytes_needed = len * num_values;
    if data.len() < self.start + bytes_needed {
      return Err(eof_err!("not enough bytes to decode {} FIXED_LEN_BYTE_ARRAY values", num_values));
    }
    for (i, slot) in buffer.iter_mut().take(num_values).enumerate() {
      let mut array = ByteArray::new();
      array.set_data(data.range(self.start + i * len, len));
      *slot = array;
    }
    self.start += bytes_needed;
    self.num_values -= num_values;
    Ok(num_values)
  }
}

// ----------------------------------------------------------------------
// Dictionary decoding

/// Decodes dictionary-encoded values: a leading bit-width byte, then an
/// RLE/bit-packed-hybrid stream of indices into a dictionary built from the
/// column chunk's dictionary page. `bit_width == 0` is tolerated and treated
/// as a constant-zero index stream (open question, decided in `SPEC_FULL.md`).
pub struct DictDecoder<T: DataType> {
  dictionary: Option<std::rc::Rc<Vec<T::T>>>,
  rle_decoder: Option<RleDecoder>,
  num_values: usize,
}

impl<T: DataType> DictDecoder<T> {
  pub fn new() -> Self {
    DictDecoder { dictionary: None, rle_decoder: None, num_values: 0 }
  }

  pub fn set_dict(&mut self, dictionary: std::rc::Rc<Vec<T::T>>) {
    self.dictionary = Some(dictionary);
  }
}

impl<T: DataType> Default for DictDecoder<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: DataType> Decoder<T> for DictDecoder<T> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    if data.is_empty() {
      return Err(eof_err!("empty dictionary index stream"));
    }
    let bit_width = data.as_ref()[0] as usize;
    self.num_values = num_values;
    if bit_width == 0 {
      self.rle_decoder = None;
    } else {
      let mut decoder = RleDecoder::new(bit_width);
      decoder.set_data(data.start_from(1));
      self.rle_decoder = Some(decoder);
    }
    Ok(())
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::RLE_DICTIONARY
  }

  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    let dict = self
      .dictionary
      .clone()
      .ok_or_else(|| general_err!("DictDecoder::set_dict must be called before get"))?;
    let num_values = buffer.len().min(self.num_values);
    let mut indices = vec![0i32; num_values];

    match self.rle_decoder.as_mut() {
      Some(decoder) => {
        let read = decoder.get_batch(&mut indices)?;
        if read < num_values {
          return Err(eof_err!("dictionary index stream ended early"));
        }
      },
      None => { /* bit_width == 0: every index is implicitly 0 */ },
    }

    for (i, slot) in buffer.iter_mut().take(num_values).enumerate() {
      let idx = indices[i] as usize;
      *slot = dict
        .get(idx)
        .cloned()
        .ok_or_else(|| decode_err!("dictionary index {} out of bounds (dict size {})", idx, dict.len()))?;
    }

    self.num_values -= num_values;
    Ok(num_values)
  }
}
