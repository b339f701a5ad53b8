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
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::time::Duration;

use carbonsplit_common_exception::Result;

use crate::mask::mask_string;
use crate::Config;

/// Inner config for the split planner.
///
/// All function should implement based on this Config.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InnerConfig {
    pub config_file: String,

    pub carbon: CarbonConfig,

    pub catalog: CatalogConfig,

    pub storage: StorageConfig,
}

impl InnerConfig {
    /// Load user's config via the wrapper [`Config`] and then convert it into [`InnerConfig`].
    ///
    /// The outer layout may change between releases, the inner one is what the planner uses.
    pub fn load(with_args: bool) -> Result<Self> {
        let cfg: Self = Config::load(with_args)?.try_into()?;
        log::info!("carbon split planner config loaded: {:?}", cfg);
        Ok(cfg)
    }

    pub fn into_config(self) -> Config {
        self.into()
    }
}

impl Debug for InnerConfig {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("InnerConfig")
            .field("config_file", &self.config_file)
            .field("carbon", &self.carbon)
            .field("catalog", &self.catalog)
            .field("storage", &self.storage)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarbonConfig {
    /// Lower-cased tag matched against the table's input format.
    pub format_tag: String,
    /// 0 means unbounded.
    pub max_blocks_per_split: usize,
    /// 0 means unbounded.
    pub max_split_size: u64,
    /// 0 means unbounded.
    pub table_cache_capacity: usize,
    pub manifest_file: String,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            format_tag: "carbon".to_string(),
            max_blocks_per_split: 32,
            max_split_size: 256 * 1024 * 1024,
            table_cache_capacity: 1024,
            manifest_file: "Metadata/manifest.json".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThriftProtocol {
    #[default]
    Binary,
    Compact,
}

/// Settings of the hive metastore client.
///
/// The client itself lives outside of this workspace, the planner only
/// forwards these values to whoever builds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub address: String,
    pub protocol: ThriftProtocol,
    pub timeout: Duration,
    pub socks_proxy: Option<String>,
    pub tls_enabled: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            address: "".to_string(),
            protocol: ThriftProtocol::Binary,
            timeout: Duration::from_secs(10),
            socks_proxy: None,
            tls_enabled: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageConfig {
    pub s3: Option<StorageS3Config>,
}

impl StorageConfig {
    /// Hadoop style properties overlaid on every scan environment.
    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();
        if let Some(s3) = &self.s3 {
            let pairs = [
                ("fs.s3a.endpoint", &s3.endpoint_url),
                ("fs.s3a.endpoint.region", &s3.region),
                ("fs.s3a.access.key", &s3.access_key_id),
                ("fs.s3a.secret.key", &s3.secret_access_key),
            ];
            for (key, value) in pairs {
                if !value.is_empty() {
                    properties.insert(key.to_string(), value.to_string());
                }
            }
        }
        properties
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageS3Config {
    pub endpoint_url: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Debug for StorageS3Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageS3Config")
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field("access_key_id", &mask_string(&self.access_key_id, 3))
            .field(
                "secret_access_key",
                &mask_string(&self.secret_access_key, 3),
            )
            .finish()
    }
}
