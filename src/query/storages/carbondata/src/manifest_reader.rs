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
use carbonsplit_query_config::InnerCarbonConfig;
use log::debug;
use log::info;
use opendal::Operator;
use serde::Deserialize;
use serde::Serialize;

use crate::BlockDescriptor;
use crate::CarbonColumn;
use crate::CarbonTable;
use crate::CarbonTableReader;
use crate::ScanEnvironment;

/// JSON document describing the schema and the blocks of a carbon table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableManifest {
    #[serde(default)]
    pub version: u64,
    /// Defaults to the location the manifest was read from when absent or empty.
    #[serde(default)]
    pub table_path: Option<String>,
    pub columns: Vec<CarbonColumn>,
    #[serde(default)]
    pub blocks: Vec<BlockDescriptor>,
}

/// Reads tables through an [`Operator`] from `<location>/<manifest_file>`.
///
/// The scheme and authority of a location are stripped, the remaining path
/// is resolved against the root of the operator.
pub struct ManifestTableReader {
    operator: Operator,
    manifest_file: String,
}

impl ManifestTableReader {
    pub fn create(operator: Operator, settings: &InnerCarbonConfig) -> Self {
        ManifestTableReader {
            operator,
            manifest_file: settings.manifest_file.clone(),
        }
    }

    pub fn manifest_path(&self, location: &str) -> String {
        let path = strip_scheme(location).trim_matches('/');
        if path.is_empty() {
            self.manifest_file.clone()
        } else {
            format!("{}/{}", path, self.manifest_file)
        }
    }

    #[async_backtrace::framed]
    async fn read_manifest(&self, location: &str) -> Result<TableManifest> {
        let path = self.manifest_path(location);
        let bytes = self.operator.read(&path).await.map_err(|e| {
            ErrorCode::BlockDiscoveryError(format!("cannot read carbon manifest {}", path))
                .set_cause(ErrorCode::from(e))
        })?;
        serde_json::from_slice(&bytes.to_vec()).map_err(|e| {
            ErrorCode::BlockDiscoveryError(format!("malformed carbon manifest {}", path))
                .set_cause(ErrorCode::from(e))
        })
    }
}

#[async_trait::async_trait]
impl CarbonTableReader for ManifestTableReader {
    #[async_backtrace::framed]
    async fn open_table(&self, location: &str, env: &ScanEnvironment) -> Result<CarbonTable> {
        let manifest = self.read_manifest(location).await?;
        info!(
            "opened carbon table {} at {}, manifest version {}",
            env.schema_table(),
            location,
            manifest.version
        );
        Ok(CarbonTable {
            name: env.schema_table().clone(),
            table_path: manifest
                .table_path
                .filter(|path| !path.is_empty())
                .unwrap_or_else(|| location.to_string()),
            columns: manifest.columns,
            version: manifest.version,
        })
    }

    #[async_backtrace::framed]
    async fn list_blocks(
        &self,
        table: &CarbonTable,
        env: &ScanEnvironment,
    ) -> Result<Vec<BlockDescriptor>> {
        let manifest = self.read_manifest(env.location()).await?;
        if manifest.version != table.version {
            debug!(
                "carbon table {} changed from version {} to {} since it was opened",
                table.name, table.version, manifest.version
            );
        }
        Ok(manifest.blocks)
    }
}

fn strip_scheme(location: &str) -> &str {
    match location.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
        None => location,
    }
}
