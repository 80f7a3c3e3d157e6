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

//! Reads one primitive column chunk, page by page, producing batches of
//! `(values, def_levels, rep_levels)` (§4.2 "Page Decoder Pipeline").
//!
//! `ColumnReader` is a tagged variant over physical type, mirroring the
//! marker-type dispatch used throughout the encoding layer, instead of a
//! trait-object hierarchy.

use std::collections::HashMap;
use std::rc::Rc;

use crate::basic::{Encoding, Type};
use crate::column::page::{Page, PageReader};
use crate::data_type::*;
use crate::encodings::decoding::{get_decoder, Decoder, DictDecoder, PlainDecoder};
use crate::encodings::levels::LevelDecoder;
use crate::errors::Result;
use crate::schema::types::ColumnDescriptor;

pub enum ColumnReader {
  BoolColumnReader(ColumnReaderImpl<BoolType>),
  Int32ColumnReader(ColumnReaderImpl<Int32Type>),
  Int64ColumnReader(ColumnReaderImpl<Int64Type>),
  Int96ColumnReader(ColumnReaderImpl<Int96Type>),
  FloatColumnReader(ColumnReaderImpl<FloatType>),
  DoubleColumnReader(ColumnReaderImpl<DoubleType>),
  ByteArrayColumnReader(ColumnReaderImpl<ByteArrayType>),
  FixedLenByteArrayColumnReader(ColumnReaderImpl<FixedLenByteArrayType>),
}

pub fn get_column_reader(descr: Rc<ColumnDescriptor>, page_reader: Box<dyn PageReader>) -> ColumnReader {
  match descr.physical_type() {
    Type::BOOLEAN => ColumnReader::BoolColumnReader(ColumnReaderImpl::new(descr, page_reader)),
    Type::INT32 => ColumnReader::Int32ColumnReader(ColumnReaderImpl::new(descr, page_reader)),
    Type::INT64 => ColumnReader::Int64ColumnReader(ColumnReaderImpl::new(descr, page_reader)),
    Type::INT96 => ColumnReader::Int96ColumnReader(ColumnReaderImpl::new(descr, page_reader)),
    Type::FLOAT => ColumnReader::FloatColumnReader(ColumnReaderImpl::new(descr, page_reader)),
    Type::DOUBLE => ColumnReader::DoubleColumnReader(ColumnReaderImpl::new(descr, page_reader)),
    Type::BYTE_ARRAY => ColumnReader::ByteArrayColumnReader(ColumnReaderImpl::new(descr, page_reader)),
    Type::FIXED_LEN_BYTE_ARRAY => {
      ColumnReader::FixedLenByteArrayColumnReader(ColumnReaderImpl::new(descr, page_reader))
    },
  }
}

/// Extracts the typed reader out of a [`ColumnReader`]. The caller must know
/// (from the descriptor it built the reader from) that `T` matches.
macro_rules! get_typed_variant {
  ($reader:expr, $variant:ident) => {
    match $reader {
      ColumnReader::$variant(r) => r,
      _ => panic!("column reader physical type mismatch"),
    }
  };
}

pub fn get_typed_column_reader_int32(reader: ColumnReader) -> ColumnReaderImpl<Int32Type> {
  get_typed_variant!(reader, Int32ColumnReader)
}
pub fn get_typed_column_reader_int64(reader: ColumnReader) -> ColumnReaderImpl<Int64Type> {
  get_typed_variant!(reader, Int64ColumnReader)
}
pub fn get_typed_column_reader_bool(reader: ColumnReader) -> ColumnReaderImpl<BoolType> {
  get_typed_variant!(reader, BoolColumnReader)
}
pub fn get_typed_column_reader_int96(reader: ColumnReader) -> ColumnReaderImpl<Int96Type> {
  get_typed_variant!(reader, Int96ColumnReader)
}
pub fn get_typed_column_reader_float(reader: ColumnReader) -> ColumnReaderImpl<FloatType> {
  get_typed_variant!(reader, FloatColumnReader)
}
pub fn get_typed_column_reader_double(reader: ColumnReader) -> ColumnReaderImpl<DoubleType> {
  get_typed_variant!(reader, DoubleColumnReader)
}
pub fn get_typed_column_reader_byte_array(reader: ColumnReader) -> ColumnReaderImpl<ByteArrayType> {
  get_typed_variant!(reader, ByteArrayColumnReader)
}
pub fn get_typed_column_reader_fixed_len_byte_array(
  reader: ColumnReader,
) -> ColumnReaderImpl<FixedLenByteArrayType> {
  get_typed_variant!(reader, FixedLenByteArrayColumnReader)
}

/// A value reader for a single primitive column, driven page by page.
pub struct ColumnReaderImpl<T: DataType> {
  descr: Rc<ColumnDescriptor>,
  def_level_decoder: Option<LevelDecoder>,
  rep_level_decoder: Option<LevelDecoder>,
  page_reader: Box<dyn PageReader>,
  current_encoding: Option<Encoding>,

  num_buffered_values: u32,
  num_decoded_values: u32,

  decoders: HashMap<Encoding, Box<dyn Decoder<T>>>,
}

impl<T: DataType> ColumnReaderImpl<T>
where
  PlainDecoder<T>: Decoder<T> + 'static,
{
  pub fn new(descr: Rc<ColumnDescriptor>, page_reader: Box<dyn PageReader>) -> Self {
    ColumnReaderImpl {
      descr,
      def_level_decoder: None,
      rep_level_decoder: None,
      page_reader,
      current_encoding: None,
      num_buffered_values: 0,
      num_decoded_values: 0,
      decoders: HashMap::new(),
    }
  }

  /// Reads up to `batch_size` values, writing levels (if requested) and
  /// values, stopping at a page boundary or when the chunk is exhausted.
  /// Returns `(values_read, levels_read)`.
  pub fn read_batch(
    &mut self,
    batch_size: usize,
    mut def_levels: Option<&mut [i16]>,
    mut rep_levels: Option<&mut [i16]>,
    values: &mut [T::T],
  ) -> Result<(usize, usize)> {
    let mut values_read = 0;
    let mut levels_read = 0;

    while values_read < batch_size {
      if !self.has_next()? {
        break;
      }

      let mut values_to_read = 0;
      let mut num_def_levels = 0;

      let next_levels_read =
        levels_read + (batch_size - values_read).min((self.num_buffered_values - self.num_decoded_values) as usize);

      if self.descr.max_def_level() > 0 && def_levels.is_some() {
        if let Some(ref mut levels) = def_levels {
          num_def_levels = self.read_def_levels(&mut levels[levels_read..next_levels_read])?;
          for i in levels_read..levels_read + num_def_levels {
            if levels[i] == self.descr.max_def_level() {
              values_to_read += 1;
            }
          }
        }
      } else {
        values_to_read = batch_size - values_read;
      }

      if self.descr.max_rep_level() > 0 && rep_levels.is_some() {
        if let Some(ref mut levels) = rep_levels {
          let num_rep_levels = self.read_rep_levels(&mut levels[levels_read..next_levels_read])?;
          if num_rep_levels != num_def_levels && self.descr.max_def_level() > 0 {
            return Err(internal_err!(
              "decoded {} rep levels but {} def levels; they must match",
              num_rep_levels,
              num_def_levels
            ));
          }
          levels_read += num_rep_levels;
        }
      } else if self.descr.max_def_level() > 0 && def_levels.is_some() {
        levels_read += num_def_levels;
      }

      let curr_values_read = self.read_values(&mut values[values_read..values_read + values_to_read])?;
      self.num_decoded_values += num_def_levels.max(curr_values_read) as u32;
      values_read += curr_values_read;
    }

    Ok((values_read, levels_read))
  }

  fn read_new_page(&mut self) -> Result<bool> {
    loop {
      match self.page_reader.get_next_page()? {
        None => return Ok(false),
        Some(Page::DictionaryPage { buf, num_values, encoding }) => {
          self.configure_dictionary(buf, num_values, encoding)?;
          continue;
        },
        Some(Page::DataPage { buf, num_values, mut encoding, def_level_encoding: _, rep_level_encoding: _ }) => {
          self.num_buffered_values = num_values;
          self.num_decoded_values = 0;

          let mut buffer_ptr = buf;

          if self.descr.max_rep_level() > 0 {
            let mut rep_decoder = LevelDecoder::new(self.descr.max_rep_level());
            let consumed = rep_decoder.set_data(&buffer_ptr)?;
            buffer_ptr = buffer_ptr.start_from(consumed);
            self.rep_level_decoder = Some(rep_decoder);
          }

          if self.descr.max_def_level() > 0 {
            let mut def_decoder = LevelDecoder::new(self.descr.max_def_level());
            let consumed = def_decoder.set_data(&buffer_ptr)?;
            buffer_ptr = buffer_ptr.start_from(consumed);
            self.def_level_decoder = Some(def_decoder);
          }

          if encoding == Encoding::PLAIN_DICTIONARY {
            encoding = Encoding::RLE_DICTIONARY;
          }

          if encoding == Encoding::RLE_DICTIONARY {
            if !self.decoders.contains_key(&encoding) {
              return Err(general_err!("dictionary page must precede a RLE_DICTIONARY data page"));
            }
          } else if !self.decoders.contains_key(&encoding) {
            let data_decoder = get_decoder::<T>(encoding, self.descr.type_length())?;
            self.decoders.insert(encoding, data_decoder);
          }

          self.decoders.get_mut(&encoding).unwrap().set_data(buffer_ptr, num_values as usize)?;
          self.current_encoding = Some(encoding);

          log::trace!("read_new_page: {} values, encoding {}", num_values, encoding);
          return Ok(true);
        },
      }
    }
  }

  fn has_next(&mut self) -> Result<bool> {
    if self.num_buffered_values == 0 || self.num_buffered_values == self.num_decoded_values {
      if !self.read_new_page()? {
        Ok(false)
      } else {
        Ok(self.num_buffered_values != 0)
      }
    } else {
      Ok(true)
    }
  }

  fn read_rep_levels(&mut self, buffer: &mut [i16]) -> Result<usize> {
    self
      .rep_level_decoder
      .as_mut()
      .ok_or_else(|| internal_err!("rep_level_decoder not set but max_rep_level > 0"))?
      .get(buffer)
  }

  fn read_def_levels(&mut self, buffer: &mut [i16]) -> Result<usize> {
    self
      .def_level_decoder
      .as_mut()
      .ok_or_else(|| internal_err!("def_level_decoder not set but max_def_level > 0"))?
      .get(buffer)
  }

  fn read_values(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    let encoding = self.current_encoding.ok_or_else(|| internal_err!("current_encoding not set"))?;
    self.decoders.get_mut(&encoding).ok_or_else(|| internal_err!("decoder for {} not set", encoding))?.get(buffer)
  }

  fn configure_dictionary(&mut self, buf: crate::util::memory::ByteBufferPtr, num_values: u32, encoding: Encoding) -> Result<()> {
    let key = Encoding::RLE_DICTIONARY;
    if self.decoders.contains_key(&key) {
      return Err(general_err!("column cannot have more than one dictionary page"));
    }
    if encoding != Encoding::PLAIN && encoding != Encoding::PLAIN_DICTIONARY {
      return Err(nyi_err!("unsupported dictionary page encoding: {}", encoding));
    }

    let mut plain = PlainDecoder::<T>::new(self.descr.type_length());
    plain.set_data(buf, num_values as usize)?;
    let mut values = vec![T::T::default(); num_values as usize];
    plain.get(&mut values)?;

    log::trace!("configure_dictionary: {} entries", values.len());

    let mut dict_decoder: DictDecoder<T> = DictDecoder::new();
    dict_decoder.set_dict(Rc::new(values));
    self.decoders.insert(key, Box::new(dict_decoder));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Repetition};
  use crate::column::page::InMemoryPageReader;
  use crate::encodings::encoding::{DictEncoder, Encoder, PlainEncoder};
  use crate::encodings::levels::encode_levels;
  use crate::schema::types::{ColumnPath, ParquetType};
  use crate::util::memory::ByteBufferPtr;
  use crate::util::test_common::random_numbers_range;

  fn int32_descr(max_def: i16, max_rep: i16) -> Rc<ColumnDescriptor> {
    let t = Rc::new(ParquetType::new_primitive("a", Repetition::OPTIONAL, Type::INT32, LogicalType::NONE, -1));
    Rc::new(ColumnDescriptor::new(t, max_def, max_rep, vec![], ColumnPath::new(vec!["a".to_owned()])))
  }

  #[test]
  fn test_read_plain_values_round_trip() {
    let values = random_numbers_range::<i32>(50, -1000, 1000);
    let mut encoder = PlainEncoder::<Int32Type>::new();
    encoder.put(&values).unwrap();
    let value_bytes = encoder.flush_buffer().unwrap();

    let def_levels: Vec<i16> = vec![1; values.len()];
    let def_bytes = encode_levels(&def_levels, 1);

    let mut page_buf = def_bytes;
    page_buf.extend_from_slice(&value_bytes);

    let page = Page::DataPage {
      buf: ByteBufferPtr::new(page_buf),
      num_values: values.len() as u32,
      encoding: Encoding::PLAIN,
      def_level_encoding: Encoding::RLE,
      rep_level_encoding: Encoding::RLE,
    };

    let descr = int32_descr(1, 0);
    let page_reader = Box::new(InMemoryPageReader::new(vec![page]));
    let mut reader = ColumnReaderImpl::<Int32Type>::new(descr, page_reader);

    let mut out_values = vec![0i32; values.len()];
    let mut out_def = vec![0i16; values.len()];
    let (values_read, levels_read) =
      reader.read_batch(values.len(), Some(&mut out_def), None, &mut out_values).unwrap();
    assert_eq!(values_read, values.len());
    assert_eq!(levels_read, values.len());
    assert_eq!(out_values, values);
    assert_eq!(out_def, def_levels);
  }

  #[test]
  fn test_read_dictionary_values_round_trip() {
    let values = vec![7i32, 7, 9, 11, 9, 7];
    let mut dict_encoder: DictEncoder<Int32Type> = DictEncoder::new();
    dict_encoder.put(&values).unwrap();
    let dict_values = dict_encoder.write_dict();
    let index_bytes = dict_encoder.flush_buffer().unwrap();

    let mut plain_dict_encoder = PlainEncoder::<Int32Type>::new();
    plain_dict_encoder.put(&dict_values).unwrap();
    let dict_page_bytes = plain_dict_encoder.flush_buffer().unwrap();

    let dict_page = Page::DictionaryPage {
      buf: ByteBufferPtr::new(dict_page_bytes),
      num_values: dict_values.len() as u32,
      encoding: Encoding::PLAIN,
    };
    let data_page = Page::DataPage {
      buf: ByteBufferPtr::new(index_bytes),
      num_values: values.len() as u32,
      encoding: Encoding::RLE_DICTIONARY,
      def_level_encoding: Encoding::RLE,
      rep_level_encoding: Encoding::RLE,
    };

    let descr = int32_descr(0, 0);
    let page_reader = Box::new(InMemoryPageReader::new(vec![dict_page, data_page]));
    let mut reader = ColumnReaderImpl::<Int32Type>::new(descr, page_reader);

    let mut out_values = vec![0i32; values.len()];
    let (values_read, _) = reader.read_batch(values.len(), None, None, &mut out_values).unwrap();
    assert_eq!(values_read, values.len());
    assert_eq!(out_values, values);
  }
}
