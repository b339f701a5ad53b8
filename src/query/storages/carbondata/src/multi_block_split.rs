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

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::BlockDescriptor;
use crate::FilterExpr;
use crate::QueryId;

/// Blocks sharing one host set, scanned together by one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarbonMultiBlockSplit {
    pub blocks: Vec<BlockDescriptor>,
    pub locations: Vec<String>,
    pub filter: FilterExpr,
    pub query_id: QueryId,
}

impl CarbonMultiBlockSplit {
    pub fn total_length(&self) -> u64 {
        self.blocks.iter().map(|b| b.length).sum()
    }

    pub fn to_payload(&self) -> CarbonSplitPayload {
        CarbonSplitPayload {
            query_id: self.query_id.clone(),
            filter: self.filter.clone(),
            locations: self.locations.clone(),
            blocks: self
                .blocks
                .iter()
                .map(|b| BlockLocation {
                    file_path: b.file_path.clone(),
                    offset: b.offset,
                    length: b.length,
                    row_count: b.row_count,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_payload()).map_err(|e| {
            ErrorCode::Internal("cannot serialize carbon split").set_cause(ErrorCode::from(e))
        })
    }
}

/// What a worker receives in the `carbonSplit` property of a split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarbonSplitPayload {
    pub query_id: QueryId,
    pub filter: FilterExpr,
    pub locations: Vec<String>,
    pub blocks: Vec<BlockLocation>,
}

impl CarbonSplitPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    pub file_path: String,
    pub offset: u64,
    pub length: u64,
    pub row_count: u64,
}
