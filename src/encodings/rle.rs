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

//! RLE/bit-packed-hybrid codec (§4.2), shared by definition/repetition level
//! streams and dictionary index streams.

use crate::errors::Result;
use crate::util::bit_util::{ceil, num_required_bits, BitReader, BitWriter, FromU64};
use crate::util::memory::ByteBufferPtr;

/// Decodes a run-length/bit-packed-hybrid stream at a fixed bit-width.
pub struct RleDecoder {
  bit_reader: BitReader,
  bit_width: usize,
  rle_left: usize,
  current_value: u64,
  bit_packed_left: usize,
}

impl RleDecoder {
  pub fn new(bit_width: usize) -> Self {
    RleDecoder {
      bit_reader: BitReader::new(ByteBufferPtr::new(Vec::new())),
      bit_width,
      rle_left: 0,
      current_value: 0,
      bit_packed_left: 0,
    }
  }

  pub fn set_data(&mut self, data: ByteBufferPtr) {
    self.bit_reader.reset(data);
    self.rle_left = 0;
    self.bit_packed_left = 0;
  }

  fn read_header(&mut self) -> Result<bool> {
    match self.bit_reader.get_vlq_int() {
      Some(header) => {
        let header = header as u64;
        if header & 1 == 1 {
          let num_groups = (header >> 1) as usize;
          self.bit_packed_left = num_groups.saturating_mul(8);
        } else {
          let run_len = (header >> 1) as usize;
          self.rle_left = run_len;
          let nbytes = ceil(self.bit_width as i64, 8) as usize;
          self.current_value = if nbytes == 0 {
            0
          } else {
            self.bit_reader.get_aligned::<u64>(nbytes).ok_or_else(|| eof_err!("truncated RLE run value"))?
          };
        }
        Ok(true)
      },
      None => Ok(false),
    }
  }

  /// Fills `buffer` with up to `buffer.len()` decoded values, returning how
  /// many were actually produced (fewer than requested means the stream ran
  /// out of data).
  pub fn get_batch<T: FromU64>(&mut self, buffer: &mut [T]) -> Result<usize> {
    let mut idx = 0;
    while idx < buffer.len() {
      if self.rle_left > 0 {
        let n = self.rle_left.min(buffer.len() - idx);
        for slot in &mut buffer[idx..idx + n] {
          *slot = T::from_u64(self.current_value);
        }
        idx += n;
        self.rle_left -= n;
      } else if self.bit_packed_left > 0 {
        let n = self.bit_packed_left.min(buffer.len() - idx);
        let read = self.bit_reader.get_batch(&mut buffer[idx..idx + n], self.bit_width);
        idx += read;
        self.bit_packed_left -= read;
        if read < n {
          break;
        }
      } else if !self.read_header()? {
        break;
      }
    }
    Ok(idx)
  }
}

/// Encodes values as an RLE/bit-packed-hybrid stream, greedily preferring RLE
/// runs of 8 or more repeats and falling back to bit-packed groups (padded to
/// a multiple of 8) otherwise.
pub fn encode<T: FromU64>(values: &[T], bit_width: usize) -> Vec<u8> {
  let mut writer = BitWriter::new(values.len() + 16);
  let raw: Vec<u64> = values.iter().map(|v| v.to_u64()).collect();
  let n = raw.len();
  let mut i = 0;

  while i < n {
    let (run_len, _) = measure_run(&raw, i);
    if run_len >= 8 {
      writer.put_vlq_int((run_len as u64) << 1);
      let nbytes = ceil(bit_width as i64, 8) as usize;
      if nbytes > 0 {
        writer.put_aligned(raw[i], nbytes);
      }
      i += run_len;
    } else {
      let mut stretch = Vec::new();
      let mut j = i;
      loop {
        let (rl, rv) = measure_run(&raw, j);
        if rl >= 8 {
          break;
        }
        for _ in 0..rl {
          stretch.push(rv);
        }
        j += rl;
        if j >= n {
          break;
        }
      }
      while stretch.len() % 8 != 0 {
        stretch.push(0);
      }
      let num_groups = stretch.len() / 8;
      writer.put_vlq_int(((num_groups as u64) << 1) | 1);
      for v in &stretch {
        writer.put_value(*v, bit_width);
      }
      i = j;
    }
  }

  writer.consume()
}

/// Returns `(run_length, value)` for the constant-value run starting at `start`.
fn measure_run(values: &[u64], start: usize) -> (usize, u64) {
  let v = values[start];
  let mut len = 1;
  while start + len < values.len() && values[start + len] == v {
    len += 1;
  }
  (len, v)
}

/// Returns the bit width required to represent values up to `max_value`
/// (inclusive), used when encoding dictionary indices and levels.
pub fn bit_width_for_max_value(max_value: u64) -> usize {
  num_required_bits(max_value)
}
