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

use crate::BlockDescriptor;
use crate::CarbonTable;
use crate::ScanEnvironment;

/// Access to the carbon table layout on storage.
///
/// Errors of `list_blocks` are surfaced as `BlockDiscoveryError` by the
/// pruning engine.
#[async_trait::async_trait]
pub trait CarbonTableReader: Send + Sync {
    async fn open_table(&self, location: &str, env: &ScanEnvironment) -> Result<CarbonTable>;

    async fn list_blocks(
        &self,
        table: &CarbonTable,
        env: &ScanEnvironment,
    ) -> Result<Vec<BlockDescriptor>>;
}
