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

use std::cmp::Ordering;
use std::sync::Arc;

use crate::filter_expr::ColumnRef;
use crate::pruning::FilterEvalResult;
use crate::BlockDescriptor;
use crate::FilterExpr;
use crate::Scalar;

pub trait RangePruner {
    // returns true, if target should NOT be pruned (false positive allowed)
    fn should_keep(&self, block: &BlockDescriptor) -> bool;
}

struct KeepTrue;

impl RangePruner for KeepTrue {
    fn should_keep(&self, _block: &BlockDescriptor) -> bool {
        true
    }
}

struct KeepFalse;

impl RangePruner for KeepFalse {
    fn should_keep(&self, _block: &BlockDescriptor) -> bool {
        false
    }
}

/// Evaluates a filter against the min/max statistics of a block.
pub struct RangePrunerCreator {
    filter: FilterExpr,
}

impl RangePrunerCreator {
    pub fn try_create(filter: &FilterExpr) -> Arc<dyn RangePruner + Send + Sync> {
        match filter {
            FilterExpr::True => Arc::new(KeepTrue),
            FilterExpr::False => Arc::new(KeepFalse),
            _ => Arc::new(RangePrunerCreator {
                filter: filter.clone(),
            }),
        }
    }

    pub fn eval(filter: &FilterExpr, block: &BlockDescriptor) -> FilterEvalResult {
        match filter {
            FilterExpr::True => FilterEvalResult::Uncertain,
            FilterExpr::False => FilterEvalResult::MustFalse,
            FilterExpr::Equals { column, value } => eval_min_max(block, column, |min, max| {
                Some(
                    value.compare(min)? == Ordering::Less
                        || value.compare(max)? == Ordering::Greater,
                )
            }),
            FilterExpr::In { column, values } => eval_min_max(block, column, |min, max| {
                values.iter().try_fold(true, |acc, value| {
                    Some(
                        acc && (value.compare(min)? == Ordering::Less
                            || value.compare(max)? == Ordering::Greater),
                    )
                })
            }),
            FilterExpr::GreaterThan { column, value } => {
                eval_min_max(block, column, |_, max| {
                    Some(max.compare(value)? != Ordering::Greater)
                })
            }
            FilterExpr::GreaterThanEqual { column, value } => {
                eval_min_max(block, column, |_, max| {
                    Some(max.compare(value)? == Ordering::Less)
                })
            }
            FilterExpr::LessThan { column, value } => eval_min_max(block, column, |min, _| {
                Some(min.compare(value)? != Ordering::Less)
            }),
            FilterExpr::LessThanEqual { column, value } => {
                eval_min_max(block, column, |min, _| {
                    Some(min.compare(value)? == Ordering::Greater)
                })
            }
            FilterExpr::IsNull { column } => {
                let no_nulls = block
                    .column_statistics
                    .get(&column.name)
                    .is_some_and(|stats| stats.null_count == Some(0));
                FilterEvalResult::from_must_false(no_nulls)
            }
            FilterExpr::IsNotNull { column } => {
                FilterEvalResult::from_must_false(block.all_null(&column.name))
            }
            FilterExpr::And { children } => {
                FilterEvalResult::all(children.iter().map(|c| Self::eval(c, block)))
            }
            FilterExpr::Or { children } => {
                FilterEvalResult::any(children.iter().map(|c| Self::eval(c, block)))
            }
        }
    }
}

impl RangePruner for RangePrunerCreator {
    fn should_keep(&self, block: &BlockDescriptor) -> bool {
        Self::eval(&self.filter, block) != FilterEvalResult::MustFalse
    }
}

// Comparisons never hold on an all-null column. Otherwise `must_false`
// decides from min/max, `None` (values of another kind) keeps the block.
fn eval_min_max<F>(block: &BlockDescriptor, column: &ColumnRef, must_false: F) -> FilterEvalResult
where F: Fn(&Scalar, &Scalar) -> Option<bool> {
    if block.all_null(&column.name) {
        return FilterEvalResult::MustFalse;
    }
    let Some(stats) = block.column_statistics.get(&column.name) else {
        return FilterEvalResult::Uncertain;
    };
    match (&stats.min, &stats.max) {
        (Some(min), Some(max)) => {
            FilterEvalResult::from_must_false(must_false(min, max).unwrap_or(false))
        }
        _ => FilterEvalResult::Uncertain,
    }
}
