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

//! Sequential file writing (§6 "Sequential writer sink", "File structure").
//! Serializing [`FileMetaData`] to Thrift bytes is an external concern (§1);
//! this module writes everything downstream of that: the leading magic,
//! column chunk byte ranges in file order, and the trailing
//! `[footer][length][magic]` suffix around a caller-supplied footer encoding.
//!
//! `Vec<u8>` (one of the two sinks §6 names) has no `Seek` impl, so byte
//! offsets are tracked by counting writes through [`TrackingWriter`] rather
//! than by querying the sink's own position.

use std::fs::File;
use std::io::{self, Write};

use crate::column::page::{Page, PageWriter};
use crate::compression::create_codec;
use crate::errors::Result;
use crate::file::metadata::{ColumnChunkMetaData, ColumnDescPtr, RowGroupMetaData, SchemaDescPtr};
use crate::file::properties::WriterProperties;
use crate::file::reader::FOOTER_MAGIC;

/// A sequential output sink a [`SerializedFileWriter`] can write a whole file
/// to (§6). Implemented for `Vec<u8>` and `std::fs::File`.
pub trait ParquetWriter: Write {}

impl ParquetWriter for Vec<u8> {}
impl ParquetWriter for File {}

/// Wraps a [`ParquetWriter`], counting bytes written so offsets into the
/// sink can be tracked without relying on `Seek` (which `Vec<u8>` lacks).
pub struct TrackingWriter<W: ParquetWriter> {
  inner: W,
  bytes_written: u64,
}

impl<W: ParquetWriter> TrackingWriter<W> {
  pub fn new(inner: W) -> Self {
    TrackingWriter { inner, bytes_written: 0 }
  }

  pub fn bytes_written(&self) -> u64 {
    self.bytes_written
  }

  pub fn into_inner(self) -> W {
    self.inner
  }
}

impl<W: ParquetWriter> Write for TrackingWriter<W> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    let n = self.inner.write(buf)?;
    self.bytes_written += n as u64;
    Ok(n)
  }

  fn flush(&mut self) -> io::Result<()> {
    self.inner.flush()
  }
}

/// Compresses finished page bodies and appends them to the underlying sink,
/// tracking byte offsets for the column chunk metadata that will reference
/// them. One instance is created per column chunk.
pub struct SerializedPageWriter<'a, W: ParquetWriter> {
  sink: &'a mut TrackingWriter<W>,
  compression: crate::basic::Compression,
  start_offset: u64,
  dictionary_page_offset: Option<u64>,
  data_page_offset: Option<u64>,
  total_compressed_size: u64,
  total_uncompressed_size: u64,
}

impl<'a, W: ParquetWriter> SerializedPageWriter<'a, W> {
  pub fn new(sink: &'a mut TrackingWriter<W>, compression: crate::basic::Compression) -> Self {
    let start_offset = sink.bytes_written();
    SerializedPageWriter {
      sink,
      compression,
      start_offset,
      dictionary_page_offset: None,
      data_page_offset: None,
      total_compressed_size: 0,
      total_uncompressed_size: 0,
    }
  }

  pub fn dictionary_page_offset(&self) -> Option<u64> {
    self.dictionary_page_offset
  }

  pub fn data_page_offset(&self) -> u64 {
    self.data_page_offset.unwrap_or(self.start_offset)
  }

  pub fn total_compressed_size(&self) -> u64 {
    self.total_compressed_size
  }

  pub fn total_uncompressed_size(&self) -> u64 {
    self.total_uncompressed_size
  }
}

impl<'a, W: ParquetWriter> PageWriter for SerializedPageWriter<'a, W> {
  /// Writes `[uncompressed_len: u32 LE][compressed_len: u32 LE][compressed body]`.
  /// A real Thrift `PageHeader` would carry these fields (and more); framing
  /// them this way keeps the seam with the external codec explicit while
  /// still letting this writer's own reads in tests round-trip without one.
  fn write_page(&mut self, page: Page) -> Result<()> {
    let offset = self.sink.bytes_written();
    if self.data_page_offset.is_none() {
      if let Page::DataPage { .. } = &page {
        self.data_page_offset = Some(offset);
      }
    }
    if let Page::DictionaryPage { .. } = &page {
      self.dictionary_page_offset = Some(offset);
    }

    let uncompressed = page.buffer().as_ref().to_vec();
    let mut codec = create_codec(self.compression)?;
    let compressed = codec.compress(&uncompressed)?;

    self.sink.write_all(&(uncompressed.len() as u32).to_le_bytes())?;
    self.sink.write_all(&(compressed.len() as u32).to_le_bytes())?;
    self.sink.write_all(&compressed)?;

    self.total_uncompressed_size += uncompressed.len() as u64;
    self.total_compressed_size += 8 + compressed.len() as u64;
    Ok(())
  }
}

/// Drives one row group's worth of column writers to completion, finishing
/// each into a [`ColumnChunkMetaData`] in column order.
pub struct SerializedRowGroupWriter {
  schema_descr: SchemaDescPtr,
  props: WriterProperties,
  columns: Vec<ColumnChunkMetaData>,
  num_rows: i64,
}

impl SerializedRowGroupWriter {
  pub fn new(schema_descr: SchemaDescPtr, props: WriterProperties) -> Self {
    SerializedRowGroupWriter { schema_descr, props, columns: Vec::new(), num_rows: 0 }
  }

  /// Finalizes one column's page writer into chunk metadata. `column_descr`
  /// must be the descriptor at `self.columns.len()` in the schema's leaf
  /// order; callers close columns left to right.
  pub fn append_column<W: ParquetWriter>(
    &mut self,
    column_descr: ColumnDescPtr,
    page_writer: SerializedPageWriter<W>,
    encodings: Vec<crate::basic::Encoding>,
    num_values: i64,
    statistics: Option<crate::statistics::Statistics>,
  ) -> Result<()> {
    let chunk = ColumnChunkMetaData::builder(column_descr)
      .set_encodings(encodings)
      .set_num_values(num_values)
      .set_compression(self.props.compression())
      .set_total_compressed_size(page_writer.total_compressed_size() as i64)
      .set_total_uncompressed_size(page_writer.total_uncompressed_size() as i64)
      .set_data_page_offset(page_writer.data_page_offset() as i64)
      .set_dictionary_page_offset(page_writer.dictionary_page_offset().map(|o| o as i64))
      .set_statistics(statistics)
      .build();
    self.columns.push(chunk);
    Ok(())
  }

  pub fn set_num_rows(&mut self, num_rows: i64) {
    self.num_rows = num_rows;
  }

  pub fn close(self) -> Result<RowGroupMetaData> {
    if self.columns.len() != self.schema_descr.num_columns() {
      return Err(general_err!(
        "row group has {} columns but schema declares {}",
        self.columns.len(),
        self.schema_descr.num_columns()
      ));
    }
    let total_byte_size = self.columns.iter().map(|c| c.total_compressed_size()).sum();
    Ok(RowGroupMetaData::new(self.columns, self.num_rows, total_byte_size, self.schema_descr))
  }
}

/// Drives a whole file: leading magic, then row groups in the order they are
/// appended, then the caller-encoded footer and trailing length/magic suffix.
pub struct SerializedFileWriter<W: ParquetWriter> {
  sink: TrackingWriter<W>,
  schema_descr: SchemaDescPtr,
  props: WriterProperties,
  row_groups: Vec<RowGroupMetaData>,
  started: bool,
}

impl<W: ParquetWriter> SerializedFileWriter<W> {
  pub fn new(sink: W, schema_descr: SchemaDescPtr, props: WriterProperties) -> Result<Self> {
    let mut sink = TrackingWriter::new(sink);
    sink.write_all(FOOTER_MAGIC)?;
    Ok(SerializedFileWriter { sink, schema_descr, props, row_groups: Vec::new(), started: true })
  }

  pub fn schema_descr(&self) -> &SchemaDescPtr {
    &self.schema_descr
  }

  pub fn properties(&self) -> &WriterProperties {
    &self.props
  }

  pub fn sink_mut(&mut self) -> &mut TrackingWriter<W> {
    &mut self.sink
  }

  pub fn new_row_group_writer(&self) -> SerializedRowGroupWriter {
    SerializedRowGroupWriter::new(self.schema_descr.clone(), self.props)
  }

  pub fn append_row_group(&mut self, row_group: RowGroupMetaData) {
    self.row_groups.push(row_group);
  }

  /// Writes the footer suffix: caller-encoded `FileMetaData` bytes (from an
  /// external Thrift codec, §1), then a 4-byte LE length, then the magic.
  /// Returns the finished `RowGroupMetaData` list so the caller can build the
  /// `FileMetaData` it encodes.
  pub fn close(mut self, encoded_footer: &[u8]) -> Result<Vec<RowGroupMetaData>> {
    if !self.started {
      return Err(internal_err!("file writer already closed"));
    }
    self.sink.write_all(encoded_footer)?;
    self.sink.write_all(&(encoded_footer.len() as u32).to_le_bytes())?;
    self.sink.write_all(FOOTER_MAGIC)?;
    self.started = false;
    Ok(std::mem::take(&mut self.row_groups))
  }

  /// Consumes the writer without finishing the file, handing back the
  /// underlying sink. Used by callers that need the raw bytes written so far
  /// (e.g. tests) after [`close`](Self::close) has already run.
  pub fn into_inner(self) -> W {
    self.sink.into_inner()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{Encoding, LogicalType, Repetition, Type};
  use crate::file::metadata::FileMetaData;
  use crate::file::reader::{footer_byte_range, SerializedFileReader};
  use crate::schema::types::{ParquetType, SchemaDescriptor};
  use std::rc::Rc;

  fn schema() -> SchemaDescPtr {
    let root = Rc::new(ParquetType::new_group(
      "schema",
      Repetition::REQUIRED,
      LogicalType::NONE,
      vec![Rc::new(ParquetType::new_primitive("a", Repetition::REQUIRED, Type::INT32, LogicalType::NONE, -1))],
    ));
    Rc::new(SchemaDescriptor::new(root))
  }

  fn write_one_column_file(schema_descr: SchemaDescPtr, footer: &[u8]) -> Vec<u8> {
    let props = WriterProperties::default();
    let mut writer = SerializedFileWriter::new(Vec::<u8>::new(), schema_descr.clone(), props).unwrap();

    let descr = Rc::new(schema_descr.column(0).clone());
    let mut row_group = writer.new_row_group_writer();
    let mut page_writer = SerializedPageWriter::new(writer.sink_mut(), props.compression());
    page_writer
      .write_page(Page::DataPage {
        buf: crate::util::memory::ByteBufferPtr::new(vec![1, 2, 3, 4]),
        num_values: 1,
        encoding: Encoding::PLAIN,
        def_level_encoding: Encoding::RLE,
        rep_level_encoding: Encoding::RLE,
      })
      .unwrap();
    row_group.append_column(descr, page_writer, vec![Encoding::PLAIN], 1, None).unwrap();
    row_group.set_num_rows(1);
    writer.append_row_group(row_group.close().unwrap());

    writer.close(footer).unwrap();
    writer.into_inner()
  }

  #[test]
  fn test_file_structure_has_leading_and_trailing_magic() {
    let bytes = write_one_column_file(schema(), b"pretend-encoded-footer");
    assert_eq!(&bytes[0..4], FOOTER_MAGIC);
    assert_eq!(&bytes[bytes.len() - 4..], FOOTER_MAGIC);
  }

  #[test]
  fn test_footer_round_trip_against_reader() {
    let schema_descr = schema();
    let bytes = write_one_column_file(schema_descr.clone(), b"footer-bytes");

    let (start, end) = footer_byte_range(&bytes).unwrap();
    assert_eq!(&bytes[start as usize..end as usize], b"footer-bytes");

    let file_meta = FileMetaData::new(1, 1, None, schema_descr, vec![]);
    let reader = SerializedFileReader::new(bytes, file_meta);
    assert_eq!(reader.num_row_groups(), 0);
  }
}
