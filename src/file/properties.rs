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

//! Reader/writer configuration (§4.7). Both follow the same builder shape:
//! a `Builder` with chained `with_*` methods and a `build()` terminal.

use crate::basic::Compression;

pub const DEFAULT_WRITE_BATCH_SIZE: usize = 1024;
pub const DEFAULT_MAX_ROW_GROUP_SIZE: usize = 128 * 1024 * 1024;
pub const DEFAULT_DICTIONARY_ENABLED: bool = true;
pub const DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_DATA_PAGE_SIZE_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_MAX_STATISTICS_SIZE: usize = 4 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ReaderProperties {
  batch_size: usize,
}

impl ReaderProperties {
  pub fn builder() -> ReaderPropertiesBuilder {
    ReaderPropertiesBuilder::new()
  }

  pub fn batch_size(&self) -> usize {
    self.batch_size
  }
}

impl Default for ReaderProperties {
  fn default() -> Self {
    ReaderProperties::builder().build()
  }
}

pub struct ReaderPropertiesBuilder {
  batch_size: usize,
}

impl ReaderPropertiesBuilder {
  fn new() -> Self {
    ReaderPropertiesBuilder { batch_size: DEFAULT_WRITE_BATCH_SIZE }
  }

  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size;
    self
  }

  pub fn build(self) -> ReaderProperties {
    ReaderProperties { batch_size: self.batch_size }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct WriterProperties {
  write_batch_size: usize,
  max_row_group_size: usize,
  dictionary_enabled: bool,
  dictionary_page_size_limit: usize,
  data_page_size_limit: usize,
  max_statistics_size: usize,
  compression: Compression,
}

impl WriterProperties {
  pub fn builder() -> WriterPropertiesBuilder {
    WriterPropertiesBuilder::new()
  }

  pub fn write_batch_size(&self) -> usize {
    self.write_batch_size
  }

  pub fn max_row_group_size(&self) -> usize {
    self.max_row_group_size
  }

  pub fn dictionary_enabled(&self) -> bool {
    self.dictionary_enabled
  }

  pub fn dictionary_page_size_limit(&self) -> usize {
    self.dictionary_page_size_limit
  }

  pub fn data_page_size_limit(&self) -> usize {
    self.data_page_size_limit
  }

  pub fn max_statistics_size(&self) -> usize {
    self.max_statistics_size
  }

  pub fn compression(&self) -> Compression {
    self.compression
  }
}

impl Default for WriterProperties {
  fn default() -> Self {
    WriterProperties::builder().build()
  }
}

pub struct WriterPropertiesBuilder {
  write_batch_size: usize,
  max_row_group_size: usize,
  dictionary_enabled: bool,
  dictionary_page_size_limit: usize,
  data_page_size_limit: usize,
  max_statistics_size: usize,
  compression: Compression,
}

impl WriterPropertiesBuilder {
  fn new() -> Self {
    WriterPropertiesBuilder {
      write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
      max_row_group_size: DEFAULT_MAX_ROW_GROUP_SIZE,
      dictionary_enabled: DEFAULT_DICTIONARY_ENABLED,
      dictionary_page_size_limit: DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT,
      data_page_size_limit: DEFAULT_DATA_PAGE_SIZE_LIMIT,
      max_statistics_size: DEFAULT_MAX_STATISTICS_SIZE,
      compression: Compression::UNCOMPRESSED,
    }
  }

  pub fn with_write_batch_size(mut self, value: usize) -> Self {
    self.write_batch_size = value;
    self
  }

  pub fn with_max_row_group_size(mut self, value: usize) -> Self {
    self.max_row_group_size = value;
    self
  }

  pub fn with_dictionary_enabled(mut self, value: bool) -> Self {
    self.dictionary_enabled = value;
    self
  }

  pub fn with_dictionary_page_size_limit(mut self, value: usize) -> Self {
    self.dictionary_page_size_limit = value;
    self
  }

  pub fn with_data_page_size_limit(mut self, value: usize) -> Self {
    self.data_page_size_limit = value;
    self
  }

  pub fn with_max_statistics_size(mut self, value: usize) -> Self {
    self.max_statistics_size = value;
    self
  }

  pub fn with_compression(mut self, value: Compression) -> Self {
    self.compression = value;
    self
  }

  pub fn build(self) -> WriterProperties {
    WriterProperties {
      write_batch_size: self.write_batch_size,
      max_row_group_size: self.max_row_group_size,
      dictionary_enabled: self.dictionary_enabled,
      dictionary_page_size_limit: self.dictionary_page_size_limit,
      data_page_size_limit: self.data_page_size_limit,
      max_statistics_size: self.max_statistics_size,
      compression: self.compression,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reader_properties_defaults() {
    let props = ReaderProperties::default();
    assert_eq!(props.batch_size(), DEFAULT_WRITE_BATCH_SIZE);
  }

  #[test]
  fn test_writer_properties_defaults() {
    let props = WriterProperties::default();
    assert_eq!(props.max_row_group_size(), DEFAULT_MAX_ROW_GROUP_SIZE);
    assert!(props.dictionary_enabled());
    assert_eq!(props.compression(), Compression::UNCOMPRESSED);
  }

  #[test]
  fn test_writer_properties_builder_overrides() {
    let props = WriterProperties::builder()
      .with_dictionary_enabled(false)
      .with_max_statistics_size(128)
      .with_compression(Compression::SNAPPY)
      .build();
    assert!(!props.dictionary_enabled());
    assert_eq!(props.max_statistics_size(), 128);
    assert_eq!(props.compression(), Compression::SNAPPY);
  }
}
