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

//! Writes one primitive column chunk: buffers `(values, def_levels,
//! rep_levels)`, picks between dictionary and PLAIN encoding adaptively, cuts
//! pages on record boundaries, and accumulates chunk statistics (§4.6
//! "Writer: Column/Page Encoder").
//!
//! Mirrors `column::reader`'s tagged-variant dispatch over physical type,
//! rather than a trait object per column.

use std::fmt::Debug;
use std::rc::Rc;

use crate::basic::{Encoding, Type};
use crate::column::page::{Page, PageWriter};
use crate::data_type::*;
use crate::encodings::encoding::{DictEncoder, Encoder, PlainEncoder};
use crate::encodings::levels::encode_levels;
use crate::errors::Result;
use crate::file::properties::WriterProperties;
use crate::schema::types::ColumnDescriptor;
use crate::statistics::{StatBytesType, Statistics};

pub enum ColumnWriter {
  BoolColumnWriter(ColumnWriterImpl<BoolType>),
  Int32ColumnWriter(ColumnWriterImpl<Int32Type>),
  Int64ColumnWriter(ColumnWriterImpl<Int64Type>),
  Int96ColumnWriter(ColumnWriterImpl<Int96Type>),
  FloatColumnWriter(ColumnWriterImpl<FloatType>),
  DoubleColumnWriter(ColumnWriterImpl<DoubleType>),
  ByteArrayColumnWriter(ColumnWriterImpl<ByteArrayType>),
  FixedLenByteArrayColumnWriter(ColumnWriterImpl<FixedLenByteArrayType>),
}

pub fn get_column_writer(
  descr: Rc<ColumnDescriptor>,
  props: WriterProperties,
  page_writer: Box<dyn PageWriter>,
) -> ColumnWriter {
  match descr.physical_type() {
    Type::BOOLEAN => ColumnWriter::BoolColumnWriter(ColumnWriterImpl::new(descr, props, page_writer)),
    Type::INT32 => ColumnWriter::Int32ColumnWriter(ColumnWriterImpl::new(descr, props, page_writer)),
    Type::INT64 => ColumnWriter::Int64ColumnWriter(ColumnWriterImpl::new(descr, props, page_writer)),
    Type::INT96 => ColumnWriter::Int96ColumnWriter(ColumnWriterImpl::new(descr, props, page_writer)),
    Type::FLOAT => ColumnWriter::FloatColumnWriter(ColumnWriterImpl::new(descr, props, page_writer)),
    Type::DOUBLE => ColumnWriter::DoubleColumnWriter(ColumnWriterImpl::new(descr, props, page_writer)),
    Type::BYTE_ARRAY => ColumnWriter::ByteArrayColumnWriter(ColumnWriterImpl::new(descr, props, page_writer)),
    Type::FIXED_LEN_BYTE_ARRAY => {
      ColumnWriter::FixedLenByteArrayColumnWriter(ColumnWriterImpl::new(descr, props, page_writer))
    },
  }
}

macro_rules! get_typed_variant {
  ($writer:expr, $variant:ident) => {
    match $writer {
      ColumnWriter::$variant(w) => w,
      _ => panic!("column writer physical type mismatch"),
    }
  };
}

pub fn get_typed_column_writer_int32(writer: ColumnWriter) -> ColumnWriterImpl<Int32Type> {
  get_typed_variant!(writer, Int32ColumnWriter)
}
pub fn get_typed_column_writer_int64(writer: ColumnWriter) -> ColumnWriterImpl<Int64Type> {
  get_typed_variant!(writer, Int64ColumnWriter)
}
pub fn get_typed_column_writer_bool(writer: ColumnWriter) -> ColumnWriterImpl<BoolType> {
  get_typed_variant!(writer, BoolColumnWriter)
}
pub fn get_typed_column_writer_int96(writer: ColumnWriter) -> ColumnWriterImpl<Int96Type> {
  get_typed_variant!(writer, Int96ColumnWriter)
}
pub fn get_typed_column_writer_float(writer: ColumnWriter) -> ColumnWriterImpl<FloatType> {
  get_typed_variant!(writer, FloatColumnWriter)
}
pub fn get_typed_column_writer_double(writer: ColumnWriter) -> ColumnWriterImpl<DoubleType> {
  get_typed_variant!(writer, DoubleColumnWriter)
}
pub fn get_typed_column_writer_byte_array(writer: ColumnWriter) -> ColumnWriterImpl<ByteArrayType> {
  get_typed_variant!(writer, ByteArrayColumnWriter)
}
pub fn get_typed_column_writer_fixed_len_byte_array(
  writer: ColumnWriter,
) -> ColumnWriterImpl<FixedLenByteArrayType> {
  get_typed_variant!(writer, FixedLenByteArrayColumnWriter)
}

/// Switches between dictionary and PLAIN encoding for the values stream of
/// one column chunk. `Dictionary` is the starting state when dictionaries are
/// enabled; once the dictionary outgrows `dictionary_page_size_limit` the
/// writer falls back to `Plain` and never returns.
enum EncoderState<T: DataType>
where
  T::T: Debug + Clone,
{
  Dictionary(DictEncoder<T>),
  Plain(PlainEncoder<T>),
}

/// Buffered record: the levels and (if present) the value belonging to one
/// leaf position, kept around so `maybe_flush_page` can find the nearest
/// `rep_level == 0` cut point without re-deriving it from the encoder.
struct BufferedEntry {
  rep_level: i16,
  def_level: i16,
}

pub struct ColumnWriterImpl<T: DataType>
where
  T::T: Debug + Clone + Default,
{
  descr: Rc<ColumnDescriptor>,
  props: WriterProperties,
  page_writer: Box<dyn PageWriter>,

  encoder: EncoderState<T>,
  /// Preserves the dictionary built before a fallback to `Plain`, so the
  /// dictionary page can still be emitted (covering the data pages written
  /// while dictionary-encoded) even though later pages are PLAIN.
  frozen_dict: Option<DictEncoder<T>>,
  fell_back_to_plain: bool,

  rep_levels: Vec<i16>,
  def_levels: Vec<i16>,
  entries: Vec<BufferedEntry>,

  /// Pages are held back, not forwarded to `page_writer`, until
  /// `close_column` so the dictionary page (finalized last) can be written
  /// first.
  pending_pages: Vec<Page>,

  num_values_written: u64,
  num_rows_written: u64,

  chunk_null_count: u64,
  chunk_min_bytes: Option<Vec<u8>>,
  chunk_max_bytes: Option<Vec<u8>>,
}

impl<T: StatBytesType> ColumnWriterImpl<T>
where
  T::T: Debug + Clone + Default,
{
  pub fn new(descr: Rc<ColumnDescriptor>, props: WriterProperties, page_writer: Box<dyn PageWriter>) -> Self {
    let encoder = if props.dictionary_enabled() {
      EncoderState::Dictionary(DictEncoder::new())
    } else {
      EncoderState::Plain(PlainEncoder::new())
    };
    ColumnWriterImpl {
      descr,
      props,
      page_writer,
      encoder,
      frozen_dict: None,
      fell_back_to_plain: false,
      rep_levels: Vec::new(),
      def_levels: Vec::new(),
      entries: Vec::new(),
      pending_pages: Vec::new(),
      num_values_written: 0,
      num_rows_written: 0,
      chunk_null_count: 0,
      chunk_min_bytes: None,
      chunk_max_bytes: None,
    }
  }

  /// Appends one batch of leaf-level values plus their levels. `values` holds
  /// only the non-null entries; `def_levels`/`rep_levels` describe every
  /// logical slot (nulls included).
  pub fn write_batch(&mut self, values: &[T::T], def_levels: Option<&[i16]>, rep_levels: Option<&[i16]>) -> Result<usize> {
    let num_levels = match (def_levels, rep_levels) {
      (Some(d), _) => d.len(),
      (None, _) => values.len(),
    };

    if let Some(d) = def_levels {
      self.def_levels.extend_from_slice(d);
    } else {
      self.def_levels.extend(std::iter::repeat(self.descr.max_def_level()).take(num_levels));
    }
    if let Some(r) = rep_levels {
      self.rep_levels.extend_from_slice(r);
    } else {
      self.rep_levels.extend(std::iter::repeat(0i16).take(num_levels));
    }

    let rep_slice = &self.rep_levels[self.rep_levels.len() - num_levels..];
    let def_slice = &self.def_levels[self.def_levels.len() - num_levels..];
    for i in 0..num_levels {
      self.entries.push(BufferedEntry { rep_level: rep_slice[i], def_level: def_slice[i] });
      if rep_slice[i] == 0 {
        self.num_rows_written += 1;
      }
    }

    let num_nulls = def_slice.iter().filter(|&&d| d < self.descr.max_def_level()).count();
    self.chunk_null_count += num_nulls as u64;
    self.update_chunk_statistics(values);

    match &mut self.encoder {
      EncoderState::Dictionary(enc) => enc.put(values)?,
      EncoderState::Plain(enc) => enc.put(values)?,
    }
    self.num_values_written += num_levels as u64;

    self.maybe_fall_back_to_plain()?;
    self.maybe_flush_page()?;
    Ok(num_levels)
  }

  fn update_chunk_statistics(&mut self, values: &[T::T]) {
    for v in values {
      let bytes = match T::value_stat_bytes(v) {
        Some(b) => b,
        None => continue,
      };
      if self.chunk_min_bytes.as_ref().map_or(true, |m| &bytes < m) {
        self.chunk_min_bytes = Some(bytes.clone());
      }
      if self.chunk_max_bytes.as_ref().map_or(true, |m| &bytes > m) {
        self.chunk_max_bytes = Some(bytes);
      }
    }
  }

  /// Checks the dictionary size and, if it has grown past the configured
  /// limit, flushes everything buffered so far and switches to PLAIN. The
  /// outgoing dictionary is kept in `frozen_dict` so `close_column` can still
  /// emit its dictionary page ahead of the data pages already written.
  fn maybe_fall_back_to_plain(&mut self) -> Result<()> {
    if self.fell_back_to_plain {
      return Ok(());
    }
    let should_fall_back = match &self.encoder {
      EncoderState::Dictionary(enc) => enc.dict_encoded_size() > self.props.dictionary_page_size_limit(),
      EncoderState::Plain(_) => false,
    };
    if !should_fall_back {
      return Ok(());
    }

    log::warn!(
      "column {}: dictionary exceeded {} bytes, falling back to PLAIN",
      self.descr.path(),
      self.props.dictionary_page_size_limit()
    );

    self.flush_page(self.entries.len())?;
    if let EncoderState::Dictionary(enc) = std::mem::replace(&mut self.encoder, EncoderState::Plain(PlainEncoder::new())) {
      self.frozen_dict = Some(enc);
    }
    self.fell_back_to_plain = true;
    Ok(())
  }

  /// Flushes the current page if the buffered encoded size has reached
  /// `data_page_size_limit`, cutting backward to the nearest `rep_level == 0`
  /// boundary so no page splits a record.
  fn maybe_flush_page(&mut self) -> Result<()> {
    let estimated_size = match &self.encoder {
      EncoderState::Dictionary(enc) => enc.estimated_data_encoded_size(),
      EncoderState::Plain(enc) => enc.estimated_data_encoded_size(),
    };
    if estimated_size < self.props.data_page_size_limit() {
      return Ok(());
    }
    if self.descr.max_rep_level() == 0 {
      return self.flush_page(self.entries.len());
    }

    // The entry at `cut` starts the most recently begun record; everything
    // before it is complete and safe to flush, everything from `cut` on
    // stays buffered so that record isn't split across pages.
    match self.entries.iter().rposition(|e| e.rep_level == 0) {
      Some(0) | None => Ok(()),
      Some(cut) => self.flush_page(cut),
    }
  }

  /// Serializes the first `upto` buffered entries into a single `DataPage`,
  /// defers it to `pending_pages`, and retains `entries[upto..]` (and the
  /// matching level/value suffix) for the next page. Does not reset
  /// statistics, which are chunk-scoped.
  fn flush_page(&mut self, upto: usize) -> Result<()> {
    if upto == 0 {
      return Ok(());
    }

    let num_values = upto as u32;
    let rep_level_bytes = if self.descr.max_rep_level() > 0 {
      encode_levels(&self.rep_levels[..upto], self.descr.max_rep_level())
    } else {
      Vec::new()
    };
    let def_level_bytes = if self.descr.max_def_level() > 0 {
      encode_levels(&self.def_levels[..upto], self.descr.max_def_level())
    } else {
      Vec::new()
    };

    let num_values_in_page = self.entries[..upto].iter().filter(|e| e.def_level == self.descr.max_def_level()).count();
    let (value_bytes, encoding) = match &mut self.encoder {
      EncoderState::Dictionary(enc) => (enc.flush_buffer_prefix(num_values_in_page)?, Encoding::RLE_DICTIONARY),
      EncoderState::Plain(enc) => (enc.flush_buffer_prefix(num_values_in_page)?, Encoding::PLAIN),
    };

    let mut buf = rep_level_bytes;
    buf.extend_from_slice(&def_level_bytes);
    buf.extend_from_slice(&value_bytes);

    self.pending_pages.push(Page::DataPage {
      buf: crate::util::memory::ByteBufferPtr::new(buf),
      num_values,
      encoding,
      def_level_encoding: Encoding::RLE,
      rep_level_encoding: Encoding::RLE,
    });

    self.rep_levels.drain(..upto);
    self.def_levels.drain(..upto);
    self.entries.drain(..upto);
    Ok(())
  }

  /// Flushes any remaining buffered data, emits the dictionary page (if a
  /// dictionary was used at any point) ahead of the data pages, forwards
  /// every page to the underlying `PageWriter`, and returns the chunk's final
  /// statistics.
  pub fn close_column(mut self) -> Result<Statistics> {
    self.flush_page(self.entries.len())?;

    let dict_source = self.frozen_dict.take().or_else(|| match self.encoder {
      EncoderState::Dictionary(enc) => Some(enc),
      EncoderState::Plain(_) => None,
    });

    if let Some(dict) = dict_source {
      if dict.num_entries() > 0 {
        let dict_values = dict.write_dict();
        let mut plain = PlainEncoder::<T>::new();
        plain.put(&dict_values)?;
        let dict_bytes = plain.flush_buffer()?;
        self.page_writer.write_page(Page::DictionaryPage {
          buf: crate::util::memory::ByteBufferPtr::new(dict_bytes),
          num_values: dict_values.len() as u32,
          encoding: Encoding::PLAIN,
        })?;
      }
    }

    for page in self.pending_pages.drain(..) {
      self.page_writer.write_page(page)?;
    }

    Ok(Statistics::from_min_max(
      self.chunk_null_count,
      self.chunk_min_bytes,
      self.chunk_max_bytes,
      self.props.max_statistics_size(),
    ))
  }

  pub fn num_values_written(&self) -> u64 {
    self.num_values_written
  }

  pub fn num_rows_written(&self) -> u64 {
    self.num_rows_written
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Repetition};
  use crate::column::page::{InMemoryPageReader, InMemoryPageWriter};
  use crate::column::reader::ColumnReaderImpl;
  use crate::schema::types::{ColumnPath, ParquetType};
  use std::cell::RefCell;

  fn int32_descr(max_def: i16, max_rep: i16) -> Rc<ColumnDescriptor> {
    let t = Rc::new(ParquetType::new_primitive("a", Repetition::OPTIONAL, Type::INT32, LogicalType::NONE, -1));
    Rc::new(ColumnDescriptor::new(t, max_def, max_rep, vec![], ColumnPath::new(vec!["a".to_owned()])))
  }

  /// Lets a test observe the pages written after `close_column` consumes the
  /// `Box<dyn PageWriter>` the column writer owns.
  struct SharedPageWriter {
    pages: Rc<RefCell<Vec<Page>>>,
  }

  impl PageWriter for SharedPageWriter {
    fn write_page(&mut self, page: Page) -> Result<()> {
      self.pages.borrow_mut().push(page);
      Ok(())
    }
  }

  #[test]
  fn test_write_then_read_plain_round_trip() {
    let descr = int32_descr(1, 0);
    let props = WriterProperties::builder().with_dictionary_enabled(false).build();
    let page_writer = Box::new(InMemoryPageWriter::new());
    let mut writer = ColumnWriterImpl::<Int32Type>::new(descr.clone(), props, page_writer);

    let values = vec![1i32, 2, 3, 4, 5];
    let def_levels = vec![1i16; 5];
    writer.write_batch(&values, Some(&def_levels), None).unwrap();
    let stats = writer.close_column().unwrap();
    assert_eq!(stats.null_count, 0);
    assert_eq!(stats.min, Some(1i32.to_le_bytes().to_vec()));
    assert_eq!(stats.max, Some(5i32.to_le_bytes().to_vec()));
  }

  #[test]
  fn test_write_then_read_dictionary_round_trip() {
    let descr = int32_descr(0, 0);
    let props = WriterProperties::builder().build();
    let pages = Rc::new(RefCell::new(Vec::new()));
    let writer_pages = pages.clone();
    let mut writer = ColumnWriterImpl::<Int32Type>::new(descr.clone(), props, Box::new(SharedPageWriter { pages: writer_pages }));

    let values = vec![7i32, 7, 9, 11, 9, 7];
    writer.write_batch(&values, None, None).unwrap();
    writer.close_column().unwrap();

    let page_reader = Box::new(InMemoryPageReader::new(pages.borrow().clone()));
    let mut reader = ColumnReaderImpl::<Int32Type>::new(descr, page_reader);
    let mut out = vec![0i32; values.len()];
    let (values_read, _) = reader.read_batch(values.len(), None, None, &mut out).unwrap();
    assert_eq!(values_read, values.len());
    assert_eq!(out, values);
  }

  #[test]
  fn test_dictionary_fallback_on_size_limit() {
    let descr = int32_descr(0, 0);
    let props = WriterProperties::builder().with_dictionary_page_size_limit(32).build();
    let page_writer = Box::new(InMemoryPageWriter::new());
    let mut writer = ColumnWriterImpl::<Int32Type>::new(descr, props, page_writer);

    let values: Vec<i32> = (0..200).collect();
    writer.write_batch(&values, None, None).unwrap();
    assert!(writer.fell_back_to_plain);
    let _stats = writer.close_column().unwrap();
  }

  #[test]
  fn test_null_count_tracked() {
    let descr = int32_descr(1, 0);
    let props = WriterProperties::builder().build();
    let page_writer = Box::new(InMemoryPageWriter::new());
    let mut writer = ColumnWriterImpl::<Int32Type>::new(descr, props, page_writer);

    let values = vec![1i32, 2];
    let def_levels = vec![1i16, 0, 1, 0];
    writer.write_batch(&values, Some(&def_levels), None).unwrap();
    let stats = writer.close_column().unwrap();
    assert_eq!(stats.null_count, 2);
  }

  #[test]
  fn test_full_round_trip_through_page_writer() {
    let descr = int32_descr(1, 0);
    let props = WriterProperties::builder().with_dictionary_enabled(false).build();
    let pages = Rc::new(RefCell::new(Vec::new()));
    let writer_pages = pages.clone();
    let mut writer =
      ColumnWriterImpl::<Int32Type>::new(descr.clone(), props, Box::new(SharedPageWriter { pages: writer_pages }));

    let values = vec![10i32, 20, 30];
    let def_levels = vec![1i16, 1, 1];
    writer.write_batch(&values, Some(&def_levels), None).unwrap();
    writer.close_column().unwrap();

    let page_reader = Box::new(InMemoryPageReader::new(pages.borrow().clone()));
    let mut reader = ColumnReaderImpl::<Int32Type>::new(descr, page_reader);
    let mut out = vec![0i32; values.len()];
    let mut out_def = vec![0i16; values.len()];
    let (values_read, _) = reader.read_batch(values.len(), Some(&mut out_def), None, &mut out).unwrap();
    assert_eq!(values_read, values.len());
    assert_eq!(out, values);
    assert_eq!(out_def, def_levels);
  }
}
