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

//! A Parquet reader/writer library, built around a column-chunk encoding
//! engine (dictionary/PLAIN encoders, RLE/bit-packed level streams, page
//! compression) and a reconstruction engine that turns the flat leaf-column
//! definition/repetition level streams Parquet stores on disk back into
//! arbitrarily nested LIST/MAP/struct values, and back again on write.
//!
//! Thrift encoding/decoding of the file footer and page headers is outside
//! this crate's scope; [`file::reader`] and [`file::writer`] expose the seams
//! (`FileMetaData`, page byte ranges) a caller's Thrift codec plugs into.

#[macro_use]
pub mod errors;

pub mod basic;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod file;
pub mod level_algorithms;
pub mod nested;
pub mod record;
pub mod schema;
pub mod statistics;
pub mod util;

pub use errors::{ParquetError, Result};
