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

//! Page-body compression codecs: `UNCOMPRESSED`, `SNAPPY`, `GZIP` (§6
//! "Codec interface"). Other codec identifiers surface as `UnsupportedFeature`.

use std::io::{Read, Write};

use crate::basic::Compression;
use crate::errors::Result;

pub trait Codec {
  fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>>;
  fn decompress(&mut self, src: &[u8], uncompressed_len: usize) -> Result<Vec<u8>>;
}

pub fn create_codec(codec: Compression) -> Result<Box<dyn Codec>> {
  match codec {
    Compression::UNCOMPRESSED => Ok(Box::new(UncompressedCodec)),
    Compression::SNAPPY => Ok(Box::new(SnappyCodec)),
    Compression::GZIP => Ok(Box::new(GzipCodec)),
  }
}

struct UncompressedCodec;

impl Codec for UncompressedCodec {
  fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>> {
    Ok(src.to_vec())
  }

  fn decompress(&mut self, src: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
    if src.len() != uncompressed_len {
      return Err(decode_err!(
        "uncompressed page body length {} did not match declared length {}",
        src.len(),
        uncompressed_len
      ));
    }
    Ok(src.to_vec())
  }
}

struct SnappyCodec;

impl Codec for SnappyCodec {
  fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = snap::raw::Encoder::new();
    encoder.compress_vec(src).map_err(|e| general_err!("snappy compression failed: {}", e))
  }

  fn decompress(&mut self, src: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
    let mut decoder = snap::raw::Decoder::new();
    let out = decoder.decompress_vec(src).map_err(|e| decode_err!("snappy decompression failed: {}", e))?;
    if out.len() != uncompressed_len {
      return Err(decode_err!(
        "snappy-decompressed length {} did not match declared length {}",
        out.len(),
        uncompressed_len
      ));
    }
    Ok(out)
  }
}

struct GzipCodec;

impl Codec for GzipCodec {
  fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(src)?;
    Ok(encoder.finish()?)
  }

  fn decompress(&mut self, src: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
    let mut decoder = flate2::read::GzDecoder::new(src);
    let mut out = Vec::with_capacity(uncompressed_len);
    decoder.read_to_end(&mut out)?;
    if out.len() != uncompressed_len {
      return Err(decode_err!(
        "gzip-decompressed length {} did not match declared length {}",
        out.len(),
        uncompressed_len
      ));
    }
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn round_trip(compression: Compression) {
    let mut codec = create_codec(compression).unwrap();
    let data = b"the quick brown fox jumps over the lazy dog, repeated, repeated, repeated".to_vec();
    let compressed = codec.compress(&data).unwrap();
    let decompressed = codec.decompress(&compressed, data.len()).unwrap();
    assert_eq!(decompressed, data);
  }

  #[test]
  fn test_uncompressed_round_trip() {
    round_trip(Compression::UNCOMPRESSED);
  }

  #[test]
  fn test_snappy_round_trip() {
    round_trip(Compression::SNAPPY);
  }

  #[test]
  fn test_gzip_round_trip() {
    round_trip(Compression::GZIP);
  }

  #[test]
  fn test_length_mismatch_errors() {
    let mut codec = create_codec(Compression::UNCOMPRESSED).unwrap();
    let compressed = codec.compress(b"hello").unwrap();
    assert!(codec.decompress(&compressed, 99).is_err());
  }
}
