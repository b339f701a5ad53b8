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
use std::sync::Arc;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use log::debug;
use serde::Deserialize;
use serde::Serialize;

use crate::SchemaTableName;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub location: String,
    pub input_format: String,
    pub serde_parameters: BTreeMap<String, String>,
}

/// Physical table metadata as stored by the hive metastore.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub database_name: String,
    pub table_name: String,
    pub storage: Storage,
    pub parameters: BTreeMap<String, String>,
}

impl Table {
    pub fn schema_table_name(&self) -> SchemaTableName {
        SchemaTableName::new(&self.database_name, &self.table_name)
    }
}

/// Client of the hive metastore.
///
/// `Ok(None)` means the table does not exist, transport problems are
/// reported as [`ErrorCode::MetastoreUnavailable`].
#[async_trait::async_trait]
pub trait HiveMetastore: Send + Sync {
    async fn get_table(&self, database_name: &str, table_name: &str) -> Result<Option<Table>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageFormat {
    Carbon,
    Other(String),
}

impl StorageFormat {
    /// A table is carbon when its input format mentions `tag`, case insensitively.
    pub fn detect(input_format: &str, tag: &str) -> Self {
        if !tag.is_empty() && input_format.to_lowercase().contains(&tag.to_lowercase()) {
            StorageFormat::Carbon
        } else {
            StorageFormat::Other(input_format.to_string())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedTable {
    Generic(Table),
    Carbon(Table),
}

impl ResolvedTable {
    pub fn resolve(table: Table, format_tag: &str) -> Self {
        match StorageFormat::detect(&table.storage.input_format, format_tag) {
            StorageFormat::Carbon => ResolvedTable::Carbon(table),
            StorageFormat::Other(_) => ResolvedTable::Generic(table),
        }
    }
}

pub struct CatalogLookup {
    metastore: Arc<dyn HiveMetastore>,
}

impl CatalogLookup {
    pub fn new(metastore: Arc<dyn HiveMetastore>) -> Self {
        CatalogLookup { metastore }
    }

    #[async_backtrace::framed]
    pub async fn lookup(&self, name: &SchemaTableName) -> Result<Table> {
        let table = self
            .metastore
            .get_table(&name.schema_name, &name.table_name)
            .await
            .map_err(|e| match e.code() {
                ErrorCode::UNKNOWN_TABLE | ErrorCode::METASTORE_UNAVAILABLE => e,
                ErrorCode::UNKNOWN_DATABASE => {
                    ErrorCode::UnknownTable(format!("Table {} not found", name)).set_cause(e)
                }
                _ => ErrorCode::MetastoreUnavailable(format!("cannot get table {}", name))
                    .set_cause(e),
            })?;

        match table {
            Some(table) => {
                debug!(
                    "table {} located at {} with input format {}",
                    name, table.storage.location, table.storage.input_format
                );
                Ok(table)
            }
            None => Err(ErrorCode::UnknownTable(format!("Table {} not found", name))),
        }
    }
}
