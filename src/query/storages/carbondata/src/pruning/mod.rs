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

mod block_pruner;
mod bloom_pruner;
mod locality;
mod range_pruner;

pub use block_pruner::BlockPruner;
pub use block_pruner::PruningStatistics;
pub use bloom_pruner::BloomPruner;
pub use bloom_pruner::BloomPrunerCreator;
pub use locality::BlockGroup;
pub use locality::LocalityGrouper;
pub use range_pruner::RangePruner;
pub use range_pruner::RangePrunerCreator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterEvalResult {
    /// No row of the block can match.
    MustFalse,
    Uncertain,
}

impl FilterEvalResult {
    pub(crate) fn from_must_false(must_false: bool) -> Self {
        if must_false {
            FilterEvalResult::MustFalse
        } else {
            FilterEvalResult::Uncertain
        }
    }

    // Conjunction: one impossible child is enough.
    pub(crate) fn all<I>(results: I) -> Self
    where I: IntoIterator<Item = FilterEvalResult> {
        let must_false = results
            .into_iter()
            .any(|r| r == FilterEvalResult::MustFalse);
        FilterEvalResult::from_must_false(must_false)
    }

    // Disjunction: every child must be impossible.
    pub(crate) fn any<I>(results: I) -> Self
    where I: IntoIterator<Item = FilterEvalResult> {
        let must_false = results
            .into_iter()
            .all(|r| r == FilterEvalResult::MustFalse);
        FilterEvalResult::from_must_false(must_false)
    }
}
