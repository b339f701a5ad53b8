// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;
use siphasher::sip128::Hasher128;
use siphasher::sip128::SipHasher24;

use crate::predicate::Scalar;

const MAX_HASHES: u32 = 16;

/// Bloom style per column membership filter stored with a block.
///
/// `may_contain` has no false negatives, a `false` answer proves the value
/// is absent from the block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceFilter {
    num_hashes: u32,
    bits: Vec<u64>,
}

impl ExistenceFilter {
    pub fn with_capacity(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let p = false_positive_rate.clamp(1e-9, 0.5);
        let ln2 = std::f64::consts::LN_2;
        let num_bits = (-(n * p.ln()) / (ln2 * ln2)).ceil().max(64.0);
        let num_hashes = ((num_bits / n) * ln2).round().clamp(1.0, MAX_HASHES as f64) as u32;
        let words = (num_bits as usize).div_ceil(64);
        ExistenceFilter {
            num_hashes,
            bits: vec![0; words],
        }
    }

    pub fn from_values<'a>(
        values: impl IntoIterator<Item = &'a Scalar>,
        false_positive_rate: f64,
    ) -> Self {
        let values: Vec<&Scalar> = values.into_iter().collect();
        let mut filter = ExistenceFilter::with_capacity(values.len(), false_positive_rate);
        for value in values {
            filter.insert(value);
        }
        filter
    }

    pub fn insert(&mut self, value: &Scalar) {
        let num_bits = self.num_bits();
        if num_bits == 0 {
            return;
        }
        for pos in probe_positions(value, self.num_hashes, num_bits) {
            self.bits[pos / 64] |= 1u64 << (pos % 64);
        }
    }

    pub fn may_contain(&self, value: &Scalar) -> bool {
        let num_bits = self.num_bits();
        if num_bits == 0 {
            return true;
        }
        probe_positions(value, self.num_hashes, num_bits)
            .all(|pos| self.bits[pos / 64] & (1u64 << (pos % 64)) != 0)
    }

    pub fn num_bits(&self) -> usize {
        self.bits.len() * 64
    }
}

// Double hashing over the two halves of a 128 bit sip hash.
fn probe_positions(value: &Scalar, num_hashes: u32, num_bits: usize) -> impl Iterator<Item = usize> {
    let mut hasher = SipHasher24::new();
    hasher.write(&value.existence_key());
    let hash = hasher.finish128();
    let (h1, h2) = (hash.h1, hash.h2);
    (0..num_hashes as u64)
        .map(move |i| (h1.wrapping_add(i.wrapping_mul(h2)) % num_bits as u64) as usize)
}
