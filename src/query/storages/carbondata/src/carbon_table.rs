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

use serde::Deserialize;
use serde::Serialize;

use crate::predicate::ColumnType;
use crate::SchemaTableName;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarbonColumn {
    pub name: String,
    pub column_type: ColumnType,
}

/// Parsed handle of a carbon table, shared through the table cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarbonTable {
    pub name: SchemaTableName,
    pub table_path: String,
    pub columns: Vec<CarbonColumn>,
    pub version: u64,
}

impl CarbonTable {
    pub fn column(&self, name: &str) -> Option<&CarbonColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}
