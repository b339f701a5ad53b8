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

use serde::Deserialize;
use serde::Serialize;

use crate::existence_filter::ExistenceFilter;
use crate::predicate::Scalar;

/// Min/max statistics of one column inside one block.
///
/// Each field is `None` when the writer did not record it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    #[serde(default)]
    pub min: Option<Scalar>,
    #[serde(default)]
    pub max: Option<Scalar>,
    #[serde(default)]
    pub null_count: Option<u64>,
}

impl ColumnStatistics {
    pub fn new(min: Scalar, max: Scalar, null_count: u64) -> Self {
        ColumnStatistics {
            min: Some(min),
            max: Some(max),
            null_count: Some(null_count),
        }
    }
}

/// A physically addressable block of a carbon table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    pub file_path: String,
    pub offset: u64,
    pub length: u64,
    pub row_count: u64,
    #[serde(default)]
    pub column_statistics: BTreeMap<String, ColumnStatistics>,
    #[serde(default)]
    pub existence_filters: BTreeMap<String, ExistenceFilter>,
    /// `host[:port]` of the data nodes holding a replica.
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl BlockDescriptor {
    pub fn new(file_path: impl Into<String>, offset: u64, length: u64, row_count: u64) -> Self {
        BlockDescriptor {
            file_path: file_path.into(),
            offset,
            length,
            row_count,
            column_statistics: BTreeMap::new(),
            existence_filters: BTreeMap::new(),
            hosts: vec![],
        }
    }

    pub fn with_statistics(mut self, column: impl Into<String>, stats: ColumnStatistics) -> Self {
        self.column_statistics.insert(column.into(), stats);
        self
    }

    pub fn with_existence_filter(
        mut self,
        column: impl Into<String>,
        filter: ExistenceFilter,
    ) -> Self {
        self.existence_filters.insert(column.into(), filter);
        self
    }

    pub fn with_hosts<S: Into<String>>(mut self, hosts: impl IntoIterator<Item = S>) -> Self {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Every row of `column` is null, according to the block statistics.
    pub fn all_null(&self, column: &str) -> bool {
        self.column_statistics
            .get(column)
            .and_then(|stats| stats.null_count)
            .is_some_and(|nulls| nulls >= self.row_count)
    }
}
