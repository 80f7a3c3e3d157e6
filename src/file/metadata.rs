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

//! In-memory footer metadata (§3 "File-level metadata (added)"): the plain
//! structs a Thrift-compact-binary codec would otherwise deserialize straight
//! from the trailing footer bytes. Decoding/encoding that wire format is
//! outside this crate's scope (§1); `decode_footer`/`encode_footer` are the
//! seam a caller supplies to bridge bytes to these structs and back.

use std::rc::Rc;

use crate::basic::{Compression, Encoding};
use crate::schema::types::{ColumnDescriptor, SchemaDescriptor};
use crate::statistics::Statistics;

pub type SchemaDescPtr = Rc<SchemaDescriptor>;
pub type ColumnDescPtr = Rc<ColumnDescriptor>;

/// One column chunk's worth of footer metadata: physical location within the
/// row group plus encodings, sizes and statistics a reader needs before it
/// can open the chunk's pages.
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
  column_descr: ColumnDescPtr,
  encodings: Vec<Encoding>,
  num_values: i64,
  compression: Compression,
  total_compressed_size: i64,
  total_uncompressed_size: i64,
  data_page_offset: i64,
  dictionary_page_offset: Option<i64>,
  statistics: Option<Statistics>,
}

impl ColumnChunkMetaData {
  pub fn builder(column_descr: ColumnDescPtr) -> ColumnChunkMetaDataBuilder {
    ColumnChunkMetaDataBuilder::new(column_descr)
  }

  pub fn column_descr(&self) -> &ColumnDescriptor {
    &self.column_descr
  }

  pub fn column_path(&self) -> String {
    self.column_descr.path().to_string()
  }

  pub fn encodings(&self) -> &[Encoding] {
    &self.encodings
  }

  pub fn num_values(&self) -> i64 {
    self.num_values
  }

  pub fn compression(&self) -> Compression {
    self.compression
  }

  pub fn total_compressed_size(&self) -> i64 {
    self.total_compressed_size
  }

  pub fn total_uncompressed_size(&self) -> i64 {
    self.total_uncompressed_size
  }

  pub fn data_page_offset(&self) -> i64 {
    self.data_page_offset
  }

  pub fn has_dictionary_page(&self) -> bool {
    self.dictionary_page_offset.is_some()
  }

  pub fn dictionary_page_offset(&self) -> Option<i64> {
    self.dictionary_page_offset
  }

  pub fn statistics(&self) -> Option<&Statistics> {
    self.statistics.as_ref()
  }
}

pub struct ColumnChunkMetaDataBuilder {
  column_descr: ColumnDescPtr,
  encodings: Vec<Encoding>,
  num_values: i64,
  compression: Compression,
  total_compressed_size: i64,
  total_uncompressed_size: i64,
  data_page_offset: i64,
  dictionary_page_offset: Option<i64>,
  statistics: Option<Statistics>,
}

impl ColumnChunkMetaDataBuilder {
  fn new(column_descr: ColumnDescPtr) -> Self {
    ColumnChunkMetaDataBuilder {
      column_descr,
      encodings: Vec::new(),
      num_values: 0,
      compression: Compression::UNCOMPRESSED,
      total_compressed_size: 0,
      total_uncompressed_size: 0,
      data_page_offset: 0,
      dictionary_page_offset: None,
      statistics: None,
    }
  }

  pub fn set_encodings(mut self, encodings: Vec<Encoding>) -> Self {
    self.encodings = encodings;
    self
  }

  pub fn set_num_values(mut self, value: i64) -> Self {
    self.num_values = value;
    self
  }

  pub fn set_compression(mut self, value: Compression) -> Self {
    self.compression = value;
    self
  }

  pub fn set_total_compressed_size(mut self, value: i64) -> Self {
    self.total_compressed_size = value;
    self
  }

  pub fn set_total_uncompressed_size(mut self, value: i64) -> Self {
    self.total_uncompressed_size = value;
    self
  }

  pub fn set_data_page_offset(mut self, value: i64) -> Self {
    self.data_page_offset = value;
    self
  }

  pub fn set_dictionary_page_offset(mut self, value: Option<i64>) -> Self {
    self.dictionary_page_offset = value;
    self
  }

  pub fn set_statistics(mut self, value: Option<Statistics>) -> Self {
    self.statistics = value;
    self
  }

  pub fn build(self) -> ColumnChunkMetaData {
    ColumnChunkMetaData {
      column_descr: self.column_descr,
      encodings: self.encodings,
      num_values: self.num_values,
      compression: self.compression,
      total_compressed_size: self.total_compressed_size,
      total_uncompressed_size: self.total_uncompressed_size,
      data_page_offset: self.data_page_offset,
      dictionary_page_offset: self.dictionary_page_offset,
      statistics: self.statistics,
    }
  }
}

/// A horizontal partition of a file: every column has the same row count
/// within one row group.
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
  columns: Vec<ColumnChunkMetaData>,
  num_rows: i64,
  total_byte_size: i64,
  schema_descr: SchemaDescPtr,
}

impl RowGroupMetaData {
  pub fn new(columns: Vec<ColumnChunkMetaData>, num_rows: i64, total_byte_size: i64, schema_descr: SchemaDescPtr) -> Self {
    RowGroupMetaData { columns, num_rows, total_byte_size, schema_descr }
  }

  pub fn columns(&self) -> &[ColumnChunkMetaData] {
    &self.columns
  }

  pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
    &self.columns[i]
  }

  pub fn num_columns(&self) -> usize {
    self.columns.len()
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }

  pub fn total_byte_size(&self) -> i64 {
    self.total_byte_size
  }

  pub fn schema_descr(&self) -> &SchemaDescriptor {
    &self.schema_descr
  }
}

/// The whole-file footer: schema plus one entry per row group, in file order.
#[derive(Debug, Clone)]
pub struct FileMetaData {
  version: i32,
  num_rows: i64,
  created_by: Option<String>,
  schema_descr: SchemaDescPtr,
  row_groups: Vec<RowGroupMetaData>,
}

impl FileMetaData {
  pub fn new(
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    schema_descr: SchemaDescPtr,
    row_groups: Vec<RowGroupMetaData>,
  ) -> Self {
    FileMetaData { version, num_rows, created_by, schema_descr, row_groups }
  }

  pub fn version(&self) -> i32 {
    self.version
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }

  pub fn created_by(&self) -> Option<&str> {
    self.created_by.as_deref()
  }

  pub fn schema_descr(&self) -> &SchemaDescriptor {
    &self.schema_descr
  }

  pub fn schema_descr_ptr(&self) -> SchemaDescPtr {
    self.schema_descr.clone()
  }

  pub fn row_groups(&self) -> &[RowGroupMetaData] {
    &self.row_groups
  }

  pub fn num_row_groups(&self) -> usize {
    self.row_groups.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Repetition, Type};
  use crate::schema::types::ParquetType;

  fn descr() -> SchemaDescPtr {
    let root = Rc::new(ParquetType::new_group(
      "schema",
      Repetition::REQUIRED,
      LogicalType::NONE,
      vec![Rc::new(ParquetType::new_primitive("a", Repetition::REQUIRED, Type::INT32, LogicalType::NONE, -1))],
    ));
    Rc::new(SchemaDescriptor::new(root))
  }

  fn column_descr(schema_descr: &SchemaDescPtr) -> ColumnDescPtr {
    Rc::new(schema_descr.column(0).clone())
  }

  #[test]
  fn test_column_chunk_metadata_builder() {
    let schema_descr = descr();
    let cd = column_descr(&schema_descr);
    let chunk = ColumnChunkMetaData::builder(cd)
      .set_encodings(vec![Encoding::PLAIN])
      .set_num_values(10)
      .set_compression(Compression::SNAPPY)
      .set_total_compressed_size(100)
      .set_total_uncompressed_size(200)
      .set_data_page_offset(4)
      .set_statistics(Some(Statistics::only_null_count(0)))
      .build();
    assert_eq!(chunk.num_values(), 10);
    assert_eq!(chunk.compression(), Compression::SNAPPY);
    assert!(!chunk.has_dictionary_page());
    assert_eq!(chunk.column_path(), "schema.a");
  }

  #[test]
  fn test_file_metadata_row_groups() {
    let schema_descr = descr();
    let cd = column_descr(&schema_descr);
    let chunk = ColumnChunkMetaData::builder(cd).set_num_values(3).build();
    let row_group = RowGroupMetaData::new(vec![chunk], 3, 42, schema_descr.clone());
    let file_meta = FileMetaData::new(1, 3, Some("test".to_owned()), schema_descr, vec![row_group]);
    assert_eq!(file_meta.num_row_groups(), 1);
    assert_eq!(file_meta.row_groups()[0].num_rows(), 3);
    assert_eq!(file_meta.created_by(), Some("test"));
  }
}
