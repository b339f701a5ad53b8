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

use std::sync::Arc;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_query_config::InnerCarbonConfig;
use log::info;

use crate::pruning::BloomPrunerCreator;
use crate::pruning::LocalityGrouper;
use crate::pruning::RangePrunerCreator;
use crate::BlockDescriptor;
use crate::CarbonMultiBlockSplit;
use crate::CarbonTable;
use crate::CarbonTableReader;
use crate::FilterExpr;
use crate::QueryId;
use crate::ScanEnvironment;
use crate::TupleDomain;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruningStatistics {
    pub total_blocks: usize,
    pub pruned_by_range: usize,
    pub pruned_by_bloom: usize,
}

impl PruningStatistics {
    pub fn kept_blocks(&self) -> usize {
        self.total_blocks - self.pruned_by_range - self.pruned_by_bloom
    }
}

/// Lists the blocks of a carbon table, drops the ones the filter rules out
/// and packs the survivors into locality groups.
pub struct BlockPruner {
    reader: Arc<dyn CarbonTableReader>,
    grouper: LocalityGrouper,
}

impl BlockPruner {
    pub fn create(reader: Arc<dyn CarbonTableReader>, settings: &InnerCarbonConfig) -> Self {
        BlockPruner {
            reader,
            grouper: LocalityGrouper::new(settings.max_blocks_per_split, settings.max_split_size),
        }
    }

    #[async_backtrace::framed]
    pub async fn plan(
        &self,
        table: &CarbonTable,
        filter: &FilterExpr,
        predicate: &TupleDomain,
        query_id: &QueryId,
        env: &ScanEnvironment,
    ) -> Result<Vec<CarbonMultiBlockSplit>> {
        if filter.is_false() || predicate.is_none() {
            info!(
                "filter of carbon table {} matches nothing, no block listed",
                table.name
            );
            return Ok(vec![]);
        }

        let blocks = self
            .reader
            .list_blocks(table, env)
            .await
            .map_err(|e| match e.code() {
                ErrorCode::BLOCK_DISCOVERY_ERROR => e,
                _ => ErrorCode::BlockDiscoveryError(format!(
                    "cannot list blocks of carbon table {} at {}",
                    table.name, table.table_path
                ))
                .set_cause(e),
            })?;

        let (blocks, stats) = Self::prune(filter, blocks);
        info!(
            "carbon table {}: total blocks {}, pruned by range {}, pruned by bloom {}, kept {}, filter: {}",
            table.name,
            stats.total_blocks,
            stats.pruned_by_range,
            stats.pruned_by_bloom,
            stats.kept_blocks(),
            filter
        );

        let splits = self
            .grouper
            .group(blocks)
            .into_iter()
            .map(|group| CarbonMultiBlockSplit {
                blocks: group.blocks,
                locations: group.hosts,
                filter: filter.clone(),
                query_id: query_id.clone(),
            })
            .collect();
        Ok(splits)
    }

    /// Keeps the blocks that may hold a matching row, in input order.
    pub fn prune(
        filter: &FilterExpr,
        blocks: Vec<BlockDescriptor>,
    ) -> (Vec<BlockDescriptor>, PruningStatistics) {
        let range_pruner = RangePrunerCreator::try_create(filter);
        let bloom_pruner = BloomPrunerCreator::create(filter);

        let mut stats = PruningStatistics {
            total_blocks: blocks.len(),
            ..Default::default()
        };
        let mut kept = Vec::with_capacity(blocks.len());
        for block in blocks {
            if !range_pruner.should_keep(&block) {
                stats.pruned_by_range += 1;
                continue;
            }
            if let Some(bloom_pruner) = &bloom_pruner {
                if !bloom_pruner.should_keep(&block) {
                    stats.pruned_by_bloom += 1;
                    continue;
                }
            }
            kept.push(block);
        }
        (kept, stats)
    }
}
