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

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::BlockDescriptor;

/// Blocks planned into one split, all stored on the same set of hosts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockGroup {
    pub hosts: Vec<String>,
    pub blocks: Vec<BlockDescriptor>,
}

impl BlockGroup {
    pub fn total_length(&self) -> u64 {
        self.blocks.iter().map(|b| b.length).sum()
    }
}

/// Groups blocks by their host set, cutting groups at the configured limits.
///
/// Groups come out in host set order and blocks inside a group by
/// `(file_path, offset)`, so the output only depends on the input set.
#[derive(Clone, Copy, Debug)]
pub struct LocalityGrouper {
    /// 0 means unbounded.
    max_blocks: usize,
    /// 0 means unbounded.
    max_bytes: u64,
}

impl LocalityGrouper {
    pub fn new(max_blocks: usize, max_bytes: u64) -> Self {
        LocalityGrouper {
            max_blocks,
            max_bytes,
        }
    }

    pub fn group(&self, blocks: Vec<BlockDescriptor>) -> Vec<BlockGroup> {
        let mut by_hosts: BTreeMap<Vec<String>, Vec<BlockDescriptor>> = BTreeMap::new();
        for block in blocks {
            let hosts = block.hosts.iter().cloned().sorted().dedup().collect();
            by_hosts.entry(hosts).or_default().push(block);
        }

        let mut groups = vec![];
        for (hosts, mut blocks) in by_hosts {
            blocks.sort_by(|a, b| {
                a.file_path
                    .cmp(&b.file_path)
                    .then_with(|| a.offset.cmp(&b.offset))
            });

            let mut current: Vec<BlockDescriptor> = vec![];
            let mut current_bytes = 0u64;
            for block in blocks {
                if !current.is_empty() && self.exceeds(current.len(), current_bytes, block.length) {
                    groups.push(BlockGroup {
                        hosts: hosts.clone(),
                        blocks: std::mem::take(&mut current),
                    });
                    current_bytes = 0;
                }
                current_bytes = current_bytes.saturating_add(block.length);
                current.push(block);
            }
            if !current.is_empty() {
                groups.push(BlockGroup {
                    hosts,
                    blocks: current,
                });
            }
        }
        groups
    }

    fn exceeds(&self, blocks: usize, bytes: u64, next_length: u64) -> bool {
        let too_many = self.max_blocks > 0 && blocks >= self.max_blocks;
        let too_large = self.max_bytes > 0 && bytes.saturating_add(next_length) > self.max_bytes;
        too_many || too_large
    }
}
