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

use carbonsplit_common_exception::Result;
use carbonsplit_common_exception::ResultExt;

use crate::metastore::Table;
use crate::CarbonMultiBlockSplit;
use crate::HiveSplit;
use crate::HostAddress;
use crate::QueryContext;

pub const TABLE_PATH_KEY: &str = "tablePath";
pub const CARBON_SPLIT_KEY: &str = "carbonSplit";
pub const QUERY_ID_KEY: &str = "queryId";
pub const INDEX_KEY: &str = "index";

pub struct SplitPackager;

impl SplitPackager {
    /// Wraps one multi block split; `index` is 1-based.
    ///
    /// The table serde parameters are copied first, so the split keys win on
    /// a name clash.
    pub fn pack(
        split: &CarbonMultiBlockSplit,
        table: &Table,
        context: &QueryContext,
        index: usize,
    ) -> Result<HiveSplit> {
        let mut schema = table.storage.serde_parameters.clone();
        schema.insert(TABLE_PATH_KEY.to_string(), context.table_path.clone());
        schema.insert(CARBON_SPLIT_KEY.to_string(), split.to_json()?);
        schema.insert(QUERY_ID_KEY.to_string(), context.query_id.to_string());
        schema.insert(INDEX_KEY.to_string(), index.to_string());

        let addresses = split
            .locations
            .iter()
            .map(|host| host.parse::<HostAddress>())
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("split {} of {}", index, context.table_path))?;

        Ok(HiveSplit {
            database: table.database_name.clone(),
            table: table.table_name.clone(),
            partition_name: table.table_name.clone(),
            path: context.table_path.clone(),
            start: 0,
            length: 0,
            file_size: 0,
            file_modified_time: 0,
            schema,
            partition_keys: vec![],
            addresses,
            bucket_number: None,
            force_local_scheduling: false,
            s3_select_pushdown_enabled: false,
        })
    }

    pub fn pack_all(
        splits: &[CarbonMultiBlockSplit],
        table: &Table,
        context: &QueryContext,
    ) -> Result<Vec<HiveSplit>> {
        splits
            .iter()
            .enumerate()
            .map(|(i, split)| Self::pack(split, table, context, i + 1))
            .collect()
    }
}
