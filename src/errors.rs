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

//! Common error type and macros used throughout the crate.

use std::error::Error;
use std::fmt;
use std::io;

quick_error! {
  /// Set of errors that can be produced during different phases of Parquet reading
  /// or writing.
  #[derive(Debug, PartialEq, Clone)]
  pub enum ParquetError {
    /// General Parquet error.
    General(message: String) {
      display("Parquet error: {}", message)
    }
    /// The schema could not be parsed or is internally inconsistent.
    Schema(message: String) {
      display("Schema error: {}", message)
    }
    /// A page or level stream is malformed in a way the decoder cannot recover from.
    Decode(message: String) {
      display("Decode error: {}", message)
    }
    /// A caller asked for a schema path or shape that does not exist in this file.
    SchemaMismatch(message: String) {
      display("Schema mismatch: {}", message)
    }
    /// A feature that is explicitly out of scope (delta encodings, Data Page V2, ...).
    UnsupportedFeature(message: String) {
      display("Not yet implemented: {}", message)
    }
    /// An invariant that the decoder/encoder itself is responsible for was broken.
    Internal(message: String) {
      display("Internal error: {}", message)
    }
    /// A requested index was outside the valid range.
    IndexOutOfBound(index: usize, bound: usize) {
      display("Index {} out of bound, must be less than {}", index, bound)
    }
    /// Ran out of bytes while decoding.
    EOF(message: String) {
      display("End of file: {}", message)
    }
    /// Wraps an I/O error from the underlying reader/writer.
    Io(message: String) {
      display("IO error: {}", message)
    }
  }
}

impl From<io::Error> for ParquetError {
  fn from(e: io::Error) -> ParquetError {
    ParquetError::Io(format!("{}", e))
  }
}

impl From<Box<dyn Error>> for ParquetError {
  fn from(e: Box<dyn Error>) -> ParquetError {
    ParquetError::General(format!("{}", e))
  }
}

impl From<fmt::Error> for ParquetError {
  fn from(e: fmt::Error) -> ParquetError {
    ParquetError::General(format!("{}", e))
  }
}

/// A specialized `Result` for Parquet operations.
pub type Result<T> = ::std::result::Result<T, ParquetError>;

// ----------------------------------------------------------------------
// Error construction macros, kept close to what the original parquet-rs crate used.

macro_rules! general_err {
  ($fmt:expr) => (ParquetError::General($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::General(format!($fmt, $($args),*)));
}

macro_rules! nyi_err {
  ($fmt:expr) => (ParquetError::UnsupportedFeature($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::UnsupportedFeature(format!($fmt, $($args),*)));
}

macro_rules! decode_err {
  ($fmt:expr) => (ParquetError::Decode($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::Decode(format!($fmt, $($args),*)));
}

macro_rules! eof_err {
  ($fmt:expr) => (ParquetError::EOF($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::EOF(format!($fmt, $($args),*)));
}

macro_rules! internal_err {
  ($fmt:expr) => (ParquetError::Internal($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::Internal(format!($fmt, $($args),*)));
}

macro_rules! schema_mismatch_err {
  ($fmt:expr) => (ParquetError::SchemaMismatch($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (ParquetError::SchemaMismatch(format!($fmt, $($args),*)));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display() {
    assert_eq!(format!("{}", general_err!("oops {}", 1)), "Parquet error: oops 1");
    assert_eq!(format!("{}", nyi_err!("delta encodings")), "Not yet implemented: delta encodings");
    assert_eq!(format!("{}", eof_err!("truncated page")), "End of file: truncated page");
    assert_eq!(format!("{}", ParquetError::IndexOutOfBound(5, 3)), "Index 5 out of bound, must be less than 3");
  }

  #[test]
  fn test_io_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
    let pq_err: ParquetError = io_err.into();
    match pq_err {
      ParquetError::Io(_) => {},
      _ => panic!("expected Io variant"),
    }
  }
}
