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

//! Basic Parquet enums mirroring the on-disk format: physical types, repetitions,
//! logical type annotations, value encodings and compression codecs.

use std::fmt;
use std::str::FromStr;

use crate::errors::ParquetError;

/// Physical types supported by a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
  BOOLEAN,
  INT32,
  INT64,
  INT96,
  FLOAT,
  DOUBLE,
  BYTE_ARRAY,
  FIXED_LEN_BYTE_ARRAY,
}

/// Repetition of a schema node: whether a value must, may, or may repeatedly occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
  REQUIRED,
  OPTIONAL,
  REPEATED,
}

/// Logical type annotation on a group or leaf node.
///
/// Only the tags the reconstruction engine needs to recognize structurally are
/// modeled; most leaf annotations (`INT_8`, `UTF8`, ...) only affect conversion at
/// the record-API boundary, not level reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
  NONE,
  UTF8,
  MAP,
  MAP_KEY_VALUE,
  LIST,
  ENUM,
  DECIMAL,
  DATE,
  TIME_MILLIS,
  TIME_MICROS,
  TIMESTAMP_MILLIS,
  TIMESTAMP_MICROS,
  UINT_8,
  UINT_16,
  UINT_32,
  UINT_64,
  INT_8,
  INT_16,
  INT_32,
  INT_64,
  JSON,
  BSON,
  INTERVAL,
}

/// Value encodings used within a page.
///
/// `DELTA_BINARY_PACKED`, `DELTA_LENGTH_BYTE_ARRAY` and `DELTA_BYTE_ARRAY` are
/// recognized (so that files using them fail with `UnsupportedFeature` rather than
/// a generic parse error) but are not implemented; see `SPEC_FULL.md` §1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
  PLAIN,
  PLAIN_DICTIONARY,
  RLE,
  RLE_DICTIONARY,
  BIT_PACKED,
  DELTA_BINARY_PACKED,
  DELTA_LENGTH_BYTE_ARRAY,
  DELTA_BYTE_ARRAY,
}

/// Compression codec applied to a page body after encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
  UNCOMPRESSED,
  SNAPPY,
  GZIP,
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for Repetition {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for LogicalType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for Encoding {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl fmt::Display for Compression {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl FromStr for Compression {
  type Err = ParquetError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "uncompressed" => Ok(Compression::UNCOMPRESSED),
      "snappy" => Ok(Compression::SNAPPY),
      "gzip" => Ok(Compression::GZIP),
      other => Err(nyi_err!("Unsupported codec: {}", other)),
    }
  }
}

impl LogicalType {
  /// True for the handful of annotations the reconstruction engine treats
  /// structurally rather than just at value-conversion time.
  pub fn is_list(&self) -> bool {
    matches!(self, LogicalType::LIST)
  }

  pub fn is_map(&self) -> bool {
    matches!(self, LogicalType::MAP | LogicalType::MAP_KEY_VALUE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_compression_from_str() {
    assert_eq!(Compression::from_str("snappy").unwrap(), Compression::SNAPPY);
    assert_eq!(Compression::from_str("GZIP").unwrap(), Compression::GZIP);
    assert!(Compression::from_str("zstd").is_err());
  }

  #[test]
  fn test_display() {
    assert_eq!(format!("{}", Type::INT32), "INT32");
    assert_eq!(format!("{}", Repetition::OPTIONAL), "OPTIONAL");
    assert_eq!(format!("{}", Encoding::RLE_DICTIONARY), "RLE_DICTIONARY");
  }
}
