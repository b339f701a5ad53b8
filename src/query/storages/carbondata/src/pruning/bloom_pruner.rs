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

use crate::pruning::FilterEvalResult;
use crate::BlockDescriptor;
use crate::FilterExpr;
use crate::Scalar;

pub trait BloomPruner {
    // returns true, if target should NOT be pruned (false positive allowed)
    fn should_keep(&self, block: &BlockDescriptor) -> bool;
}

/// Probes the per column existence filters of a block with the point
/// lookups (`=` and `IN`) of a filter.
pub struct BloomPrunerCreator {
    filter: FilterExpr,
}

impl BloomPrunerCreator {
    /// `None` when the filter contains no point lookup.
    pub fn create(filter: &FilterExpr) -> Option<Arc<dyn BloomPruner + Send + Sync>> {
        if has_point_lookup(filter) {
            Some(Arc::new(BloomPrunerCreator {
                filter: filter.clone(),
            }))
        } else {
            None
        }
    }

    pub fn eval(filter: &FilterExpr, block: &BlockDescriptor) -> FilterEvalResult {
        match filter {
            FilterExpr::Equals { column, value } => {
                FilterEvalResult::from_must_false(rejects(block, &column.name, [value]))
            }
            FilterExpr::In { column, values } => {
                FilterEvalResult::from_must_false(rejects(block, &column.name, values))
            }
            FilterExpr::And { children } => {
                FilterEvalResult::all(children.iter().map(|c| Self::eval(c, block)))
            }
            FilterExpr::Or { children } => {
                FilterEvalResult::any(children.iter().map(|c| Self::eval(c, block)))
            }
            FilterExpr::False => FilterEvalResult::MustFalse,
            _ => FilterEvalResult::Uncertain,
        }
    }
}

impl BloomPruner for BloomPrunerCreator {
    fn should_keep(&self, block: &BlockDescriptor) -> bool {
        Self::eval(&self.filter, block) != FilterEvalResult::MustFalse
    }
}

fn rejects<'a>(
    block: &BlockDescriptor,
    column: &str,
    values: impl IntoIterator<Item = &'a Scalar>,
) -> bool {
    match block.existence_filters.get(column) {
        Some(filter) => values.into_iter().all(|v| !filter.may_contain(v)),
        None => false,
    }
}

fn has_point_lookup(filter: &FilterExpr) -> bool {
    match filter {
        FilterExpr::Equals { .. } | FilterExpr::In { .. } => true,
        FilterExpr::And { children } | FilterExpr::Or { children } => {
            children.iter().any(has_point_lookup)
        }
        _ => false,
    }
}
