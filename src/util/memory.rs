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

//! Reference-counted byte buffers shared between the page decoder pipeline and
//! the typed value decoders, so that slicing a page body never copies.

use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

/// An immutable, reference-counted, slice-able byte buffer.
///
/// Cloning is O(1): it bumps a reference count and adjusts a `(start, len)`
/// window rather than copying the underlying bytes.
#[derive(Clone, Debug)]
pub struct ByteBufferPtr {
  data: Arc<Vec<u8>>,
  start: usize,
  len: usize,
}

impl ByteBufferPtr {
  pub fn new(data: Vec<u8>) -> Self {
    let len = data.len();
    ByteBufferPtr { data: Arc::new(data), start: 0, len }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Returns a new `ByteBufferPtr` covering `[start, start + len)` of this window.
  pub fn range(&self, start: usize, len: usize) -> ByteBufferPtr {
    assert!(start + len <= self.len, "range out of bounds");
    ByteBufferPtr { data: self.data.clone(), start: self.start + start, len }
  }

  /// Returns a new `ByteBufferPtr` covering `[start, end)` of this window.
  pub fn start_from(&self, start: usize) -> ByteBufferPtr {
    self.range(start, self.len - start)
  }

  /// Returns the whole window as a new owning handle (same bytes, bumped refcount).
  pub fn all(&self) -> ByteBufferPtr {
    self.range(0, self.len)
  }

  pub fn as_range(&self) -> Range<usize> {
    self.start..self.start + self.len
  }
}

impl AsRef<[u8]> for ByteBufferPtr {
  fn as_ref(&self) -> &[u8] {
    &self.data[self.start..self.start + self.len]
  }
}

/// A small growable byte buffer, used for transient work (e.g. the per-page
/// scratch buffer accumulated by the level RLE decoder).
#[derive(Clone, Debug, Default)]
pub struct ByteBuffer {
  data: Vec<u8>,
}

impl ByteBuffer {
  pub fn new() -> Self {
    ByteBuffer { data: Vec::new() }
  }

  pub fn set_data(&mut self, data: Vec<u8>) {
    self.data = data;
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn size(&self) -> usize {
    self.data.len()
  }

  pub fn clear(&mut self) {
    self.data.clear();
  }
}

/// Tracks aggregate buffer allocation for a column reader/writer.
///
/// The original crate used this to enforce a global memory budget; this
/// implementation keeps the counter (useful for tests and diagnostics) without
/// enforcing a limit, since parallel/async memory governance is out of scope.
#[derive(Debug, Default)]
pub struct MemTracker {
  allocated: std::cell::Cell<i64>,
}

pub type MemTrackerPtr = Rc<MemTracker>;

impl MemTracker {
  pub fn new() -> Self {
    MemTracker { allocated: std::cell::Cell::new(0) }
  }

  pub fn new_ptr() -> MemTrackerPtr {
    Rc::new(MemTracker::new())
  }

  pub fn alloc(&self, delta: i64) {
    self.allocated.set(self.allocated.get() + delta);
  }

  pub fn memory_usage(&self) -> i64 {
    self.allocated.get()
  }
}
