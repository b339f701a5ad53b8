// Copyright 2022 Datafuse Labs.
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

use std::fmt::Display;
use std::fmt::Formatter;

/// Key of a cached table handle.
///
/// The storage location is part of the key: once a table is relocated, the
/// lookup misses and the stale entry is left for eviction or invalidation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableCacheKey {
    pub schema_name: String,
    pub table_name: String,
    pub location: String,
}

impl TableCacheKey {
    pub fn new(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        TableCacheKey {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            location: location.into(),
        }
    }

    pub fn is_table(&self, schema_name: &str, table_name: &str) -> bool {
        self.schema_name == schema_name && self.table_name == table_name
    }
}

impl Display for TableCacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}@{}",
            self.schema_name, self.table_name, self.location
        )
    }
}
