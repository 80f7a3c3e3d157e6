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

//! Random value/level generators shared by unit and integration tests.

use rand::distributions::Standard;
use rand::prelude::Distribution;
use rand::Rng;

use crate::data_type::{ByteArray, Int96};

/// Generates `n` random values of type `T` using the standard distribution.
pub fn random_numbers<T>(n: usize) -> Vec<T>
where
  Standard: Distribution<T>,
{
  let mut rng = rand::thread_rng();
  (0..n).map(|_| rng.gen()).collect()
}

/// Generates `n` random values of type `T` in `[low, high)`.
pub fn random_numbers_range<T>(n: usize, low: T, high: T) -> Vec<T>
where
  T: PartialOrd + rand::distributions::uniform::SampleUniform + Copy,
{
  let mut rng = rand::thread_rng();
  (0..n).map(|_| rng.gen_range(low..high)).collect()
}

/// Generates `n` random booleans.
pub fn random_bools(n: usize) -> Vec<bool> {
  random_numbers::<bool>(n)
}

/// Generates `n` random byte arrays, each `len` bytes long.
pub fn random_byte_arrays(n: usize, len: usize) -> Vec<ByteArray> {
  let mut rng = rand::thread_rng();
  (0..n)
    .map(|_| {
      let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
      ByteArray::from(bytes)
    })
    .collect()
}

/// Generates `n` random `Int96` values.
pub fn random_int96s(n: usize) -> Vec<Int96> {
  let mut rng = rand::thread_rng();
  (0..n)
    .map(|_| Int96::from(vec![rng.gen(), rng.gen(), rng.gen()]))
    .collect()
}

/// Generates `n` random definition/repetition levels in `[0, max_level]`,
/// used to synthesize pages with nulls/repeats for decoder tests.
pub fn random_levels(n: usize, max_level: i16) -> Vec<i16> {
  if max_level == 0 {
    return vec![0; n];
  }
  random_numbers_range::<i16>(n, 0, max_level + 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_random_numbers_range() {
    let v = random_numbers_range::<i32>(100, 0, 10);
    assert_eq!(v.len(), 100);
    assert!(v.iter().all(|&x| (0..10).contains(&x)));
  }

  #[test]
  fn test_random_levels_bounds() {
    let v = random_levels(50, 3);
    assert!(v.iter().all(|&x| (0..=3).contains(&x)));
  }

  #[test]
  fn test_random_byte_arrays_len() {
    let v = random_byte_arrays(5, 8);
    assert_eq!(v.len(), 5);
    assert!(v.iter().all(|b| b.len() == 8));
  }
}
