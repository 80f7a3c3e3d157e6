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

//! Length-prefixed RLE encoding/decoding of a page's definition or repetition
//! level stream (§6 "Data Page V1 body layout").

use crate::encodings::rle;
use crate::errors::Result;
use crate::util::bit_util::num_required_bits;
use crate::util::memory::ByteBufferPtr;

/// Decodes a page's length-prefixed level stream. Constructed once per column
/// with the schema's `max_def_level`/`max_rep_level`; reused across pages via
/// [`set_data`](LevelDecoder::set_data).
pub struct LevelDecoder {
  bit_width: usize,
  rle: rle::RleDecoder,
}

impl LevelDecoder {
  pub fn new(max_level: i16) -> Self {
    let bit_width = num_required_bits(max_level as u64);
    LevelDecoder { bit_width, rle: rle::RleDecoder::new(bit_width) }
  }

  /// Consumes the 4-byte length prefix and the RLE body it announces out of
  /// `data`, returning the total number of bytes consumed so the caller can
  /// advance past this sub-stream (e.g. to the def-level stream, or to values).
  pub fn set_data(&mut self, data: &ByteBufferPtr) -> Result<usize> {
    if data.len() < 4 {
      return Err(eof_err!("truncated level stream length prefix"));
    }
    let raw = data.as_ref();
    let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    if data.len() < 4 + len {
      return Err(eof_err!("truncated level stream body"));
    }
    self.rle.set_data(data.range(4, len));
    Ok(4 + len)
  }

  pub fn get(&mut self, buffer: &mut [i16]) -> Result<usize> {
    self.rle.get_batch(buffer)
  }
}

/// Encodes a full batch of levels into the length-prefixed wire form.
pub fn encode_levels(values: &[i16], max_level: i16) -> Vec<u8> {
  let bit_width = num_required_bits(max_level as u64);
  let body = rle::encode(values, bit_width);
  let mut out = Vec::with_capacity(4 + body.len());
  out.extend_from_slice(&(body.len() as u32).to_le_bytes());
  out.extend_from_slice(&body);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_level_round_trip() {
    let levels = vec![0i16, 1, 1, 2, 2, 2, 0, 1];
    let encoded = encode_levels(&levels, 2);

    let mut decoder = LevelDecoder::new(2);
    let consumed = decoder.set_data(&ByteBufferPtr::new(encoded.clone())).unwrap();
    assert_eq!(consumed, encoded.len());

    let mut out = vec![0i16; levels.len()];
    let n = decoder.get(&mut out).unwrap();
    assert_eq!(n, levels.len());
    assert_eq!(out, levels);
  }

  #[test]
  fn test_zero_max_level_is_trivial() {
    // max_level == 0 means this stream need not even be present; bit_width is 0.
    let levels = vec![0i16; 10];
    let encoded = encode_levels(&levels, 0);
    let mut decoder = LevelDecoder::new(0);
    decoder.set_data(&ByteBufferPtr::new(encoded)).unwrap();
    let mut out = vec![1i16; 10];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, vec![0i16; 10]);
  }

  #[test]
  fn test_truncated_prefix_errors() {
    let mut decoder = LevelDecoder::new(3);
    let err = decoder.set_data(&ByteBufferPtr::new(vec![1, 2])).unwrap_err();
    assert!(format!("{}", err).contains("End of file"));
  }
}
