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

//! Random-access file reading (§6 "Random-access reader", "File structure").
//! Parsing the footer's Thrift bytes into [`FileMetaData`] is an external
//! concern (§1); this module owns everything downstream of that: locating the
//! footer via the trailing magic/length, and handing out column chunk byte
//! ranges and page readers.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::rc::Rc;

use crate::column::page::{InMemoryPageReader, Page, PageReader};
use crate::compression::create_codec;
use crate::errors::Result;
use crate::file::metadata::{ColumnChunkMetaData, FileMetaData};
use crate::util::memory::ByteBufferPtr;

pub const FOOTER_MAGIC: &[u8; 4] = b"PAR1";
/// Trailing `[4-byte LE footer length][4-byte magic]` every file ends with.
pub const FOOTER_SUFFIX_LEN: usize = 8;

/// A random-access byte source over a complete Parquet file (§6). Implemented
/// for `Vec<u8>` and `std::fs::File`; sequential consumption is permitted but
/// not required of callers.
pub trait ChunkReader {
  fn len(&self) -> u64;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn get_read(&self, start: u64, length: usize) -> Result<Box<dyn Read + '_>>;
}

impl ChunkReader for Vec<u8> {
  fn len(&self) -> u64 {
    Vec::len(self) as u64
  }

  fn get_read(&self, start: u64, length: usize) -> Result<Box<dyn Read + '_>> {
    let start = start as usize;
    let end = start
      .checked_add(length)
      .filter(|&end| end <= self.len())
      .ok_or_else(|| eof_err!("requested range [{}, {}) is past end of buffer ({})", start, start + length, self.len()))?;
    Ok(Box::new(&self[start..end]))
  }
}

impl ChunkReader for File {
  fn len(&self) -> u64 {
    self.metadata().map(|m| m.len()).unwrap_or(0)
  }

  fn get_read(&self, start: u64, length: usize) -> Result<Box<dyn Read + '_>> {
    let mut file = self.try_clone()?;
    file.seek(SeekFrom::Start(start))?;
    Ok(Box::new(file.take(length as u64)))
  }
}

/// Reads the trailing 8 bytes of `source`, validates the `PAR1` magic, and
/// returns the byte range `[footer_start, footer_end)` of the serialized
/// `FileMetaData` the caller's Thrift codec should decode.
pub fn footer_byte_range<R: ChunkReader>(source: &R) -> Result<(u64, u64)> {
  let file_len = source.len();
  if file_len < (FOOTER_SUFFIX_LEN + FOOTER_MAGIC.len()) as u64 {
    return Err(eof_err!("file of length {} is too short to contain a Parquet footer", file_len));
  }

  let mut suffix = [0u8; FOOTER_SUFFIX_LEN];
  let mut reader = source.get_read(file_len - FOOTER_SUFFIX_LEN as u64, FOOTER_SUFFIX_LEN)?;
  reader.read_exact(&mut suffix)?;

  if &suffix[4..8] != FOOTER_MAGIC {
    return Err(general_err!("file does not end with the Parquet magic bytes"));
  }
  let footer_len = u32::from_le_bytes([suffix[0], suffix[1], suffix[2], suffix[3]]) as u64;

  let footer_end = file_len - FOOTER_SUFFIX_LEN as u64;
  let footer_start = footer_end
    .checked_sub(footer_len)
    .ok_or_else(|| general_err!("footer length {} exceeds file size", footer_len))?;
  Ok((footer_start, footer_end))
}

/// Reads the leading 4 bytes and checks they are the Parquet magic, per §6
/// ("Magic prefix"). Not required for parsing (the footer is authoritative)
/// but a cheap sanity check callers commonly want before trusting a file.
pub fn check_leading_magic<R: ChunkReader>(source: &R) -> Result<()> {
  let mut magic = [0u8; 4];
  let mut reader = source.get_read(0, 4)?;
  reader.read_exact(&mut magic)?;
  if &magic != FOOTER_MAGIC {
    return Err(general_err!("file does not start with the Parquet magic bytes"));
  }
  Ok(())
}

/// Splits one column chunk's decompressed bytes into the sequence of pages
/// the column reader expects, given the chunk's metadata. The chunk's page
/// headers are assumed already framed externally (§1): this function accepts
/// pre-split `(header, body)` pairs rather than parsing Thrift page headers
/// itself, mirroring the same external-framing seam as the file footer.
pub fn decompress_column_chunk(
  chunk: &ColumnChunkMetaData,
  raw_pages: Vec<RawPage>,
) -> Result<Box<dyn PageReader>> {
  let mut codec = create_codec(chunk.compression())?;
  let mut pages = Vec::with_capacity(raw_pages.len());
  for raw in raw_pages {
    let body = if chunk.compression() == crate::basic::Compression::UNCOMPRESSED {
      raw.buf
    } else {
      codec.decompress(&raw.buf, raw.uncompressed_len)?
    };
    let buf = ByteBufferPtr::new(body);
    pages.push(match raw.kind {
      RawPageKind::Dictionary => Page::DictionaryPage { buf, num_values: raw.num_values, encoding: raw.encoding },
      RawPageKind::Data { def_level_encoding, rep_level_encoding } => {
        Page::DataPage { buf, num_values: raw.num_values, encoding: raw.encoding, def_level_encoding, rep_level_encoding }
      },
    });
  }
  Ok(Box::new(InMemoryPageReader::new(pages)))
}

/// One page's compressed bytes plus the header fields needed to decompress
/// and tag it, handed in by the external page-header framer (§1, §6).
pub struct RawPage {
  pub buf: Vec<u8>,
  pub uncompressed_len: usize,
  pub num_values: u32,
  pub encoding: crate::basic::Encoding,
  pub kind: RawPageKind,
}

pub enum RawPageKind {
  Dictionary,
  Data { def_level_encoding: crate::basic::Encoding, rep_level_encoding: crate::basic::Encoding },
}

/// Owns a decoded [`FileMetaData`] plus the byte source backing its row
/// groups; the entry point for opening individual column chunks by row group
/// and column index.
pub struct SerializedFileReader<R: ChunkReader> {
  chunk_source: R,
  metadata: Rc<FileMetaData>,
}

impl<R: ChunkReader> SerializedFileReader<R> {
  /// `metadata` is supplied already decoded (§1): callers parse the footer's
  /// Thrift bytes externally, typically located via [`footer_byte_range`].
  pub fn new(chunk_source: R, metadata: FileMetaData) -> Self {
    SerializedFileReader { chunk_source, metadata: Rc::new(metadata) }
  }

  pub fn metadata(&self) -> &FileMetaData {
    &self.metadata
  }

  pub fn num_row_groups(&self) -> usize {
    self.metadata.num_row_groups()
  }

  /// Returns the raw bytes covering one column chunk, ready for the caller's
  /// page-header framer to split into [`RawPage`]s.
  pub fn get_column_chunk_bytes(&self, row_group_index: usize, column_index: usize) -> Result<Vec<u8>> {
    let row_group = self
      .metadata
      .row_groups()
      .get(row_group_index)
      .ok_or_else(|| general_err!("row group index {} out of range", row_group_index))?;
    let chunk = row_group
      .columns()
      .get(column_index)
      .ok_or_else(|| general_err!("column index {} out of range", column_index))?;

    let start = chunk.dictionary_page_offset().unwrap_or_else(|| chunk.data_page_offset()) as u64;
    let length = chunk.total_compressed_size() as usize;
    let mut buf = Vec::with_capacity(length);
    self.chunk_source.get_read(start, length)?.read_to_end(&mut buf)?;
    Ok(buf)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file_bytes_with_footer(footer: &[u8]) -> Vec<u8> {
    let mut out = b"PAR1".to_vec();
    out.extend_from_slice(footer);
    out.extend_from_slice(&(footer.len() as u32).to_le_bytes());
    out.extend_from_slice(b"PAR1");
    out
  }

  #[test]
  fn test_footer_byte_range_round_trip() {
    let footer = b"pretend-thrift-bytes";
    let bytes = file_bytes_with_footer(footer);
    let (start, end) = footer_byte_range(&bytes).unwrap();
    assert_eq!(&bytes[start as usize..end as usize], footer);
  }

  #[test]
  fn test_leading_magic_check() {
    let bytes = file_bytes_with_footer(b"x");
    assert!(check_leading_magic(&bytes).is_ok());
    let mut bad = bytes.clone();
    bad[0] = b'X';
    assert!(check_leading_magic(&bad).is_err());
  }

  #[test]
  fn test_footer_byte_range_rejects_bad_magic() {
    let mut bytes = file_bytes_with_footer(b"abc");
    let len = bytes.len();
    bytes[len - 1] = b'X';
    assert!(footer_byte_range(&bytes).is_err());
  }

  #[test]
  fn test_footer_byte_range_rejects_too_short_file() {
    let bytes = vec![0u8; 4];
    assert!(footer_byte_range(&bytes).is_err());
  }

  #[test]
  fn test_vec_chunk_reader_get_read() {
    let bytes = vec![1u8, 2, 3, 4, 5];
    let mut out = Vec::new();
    bytes.get_read(1, 3).unwrap().read_to_end(&mut out).unwrap();
    assert_eq!(out, vec![2, 3, 4]);
    assert!(bytes.get_read(3, 10).is_err());
  }
}
