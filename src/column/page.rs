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

//! The page abstraction sitting between a column chunk's compressed byte
//! range and the typed value/level decoders: dictionary pages and Data Page
//! V1 only (§1, Data Page V2 is out of scope).

use crate::basic::Encoding;
use crate::errors::Result;
use crate::util::memory::ByteBufferPtr;

/// One decompressed page body, tagged with the header fields the column
/// reader needs to configure its decoders.
#[derive(Clone, Debug)]
pub enum Page {
  DictionaryPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
  },
  DataPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    def_level_encoding: Encoding,
    rep_level_encoding: Encoding,
  },
}

impl Page {
  pub fn buffer(&self) -> &ByteBufferPtr {
    match self {
      Page::DictionaryPage { buf, .. } => buf,
      Page::DataPage { buf, .. } => buf,
    }
  }

  pub fn num_values(&self) -> u32 {
    match self {
      Page::DictionaryPage { num_values, .. } => *num_values,
      Page::DataPage { num_values, .. } => *num_values,
    }
  }

  pub fn encoding(&self) -> Encoding {
    match self {
      Page::DictionaryPage { encoding, .. } => *encoding,
      Page::DataPage { encoding, .. } => *encoding,
    }
  }
}

/// Yields the pages of one column chunk in file order. A dictionary page,
/// if present, always precedes the data pages it serves.
pub trait PageReader {
  fn get_next_page(&mut self) -> Result<Option<Page>>;
}

/// An in-memory `PageReader` over a pre-decoded list of pages, used by tests
/// and by the file reader once it has split a column chunk's bytes into
/// individually decompressed page bodies.
pub struct InMemoryPageReader {
  pages: std::collections::VecDeque<Page>,
}

impl InMemoryPageReader {
  pub fn new(pages: Vec<Page>) -> Self {
    InMemoryPageReader { pages: pages.into() }
  }
}

impl PageReader for InMemoryPageReader {
  fn get_next_page(&mut self) -> Result<Option<Page>> {
    Ok(self.pages.pop_front())
  }
}

/// Accepts finished page bodies from a column writer and is responsible for
/// framing + appending them to the column chunk's byte range. The file
/// writer implements this; tests use [`InMemoryPageWriter`].
pub trait PageWriter {
  fn write_page(&mut self, page: Page) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryPageWriter {
  pages: Vec<Page>,
}

impl InMemoryPageWriter {
  pub fn new() -> Self {
    InMemoryPageWriter { pages: Vec::new() }
  }

  pub fn into_pages(self) -> Vec<Page> {
    self.pages
  }
}

impl PageWriter for InMemoryPageWriter {
  fn write_page(&mut self, page: Page) -> Result<()> {
    self.pages.push(page);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_in_memory_page_reader_order() {
    let pages = vec![
      Page::DictionaryPage { buf: ByteBufferPtr::new(vec![1, 2]), num_values: 2, encoding: Encoding::PLAIN },
      Page::DataPage {
        buf: ByteBufferPtr::new(vec![3, 4]),
        num_values: 2,
        encoding: Encoding::RLE_DICTIONARY,
        def_level_encoding: Encoding::RLE,
        rep_level_encoding: Encoding::RLE,
      },
    ];
    let mut reader = InMemoryPageReader::new(pages);
    assert!(matches!(reader.get_next_page().unwrap(), Some(Page::DictionaryPage { .. })));
    assert!(matches!(reader.get_next_page().unwrap(), Some(Page::DataPage { .. })));
    assert!(reader.get_next_page().unwrap().is_none());
  }
}
