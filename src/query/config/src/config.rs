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

use std::env;
use std::fmt;
use std::fmt::Debug;
use std::time::Duration;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use clap::Args;
use clap::Parser;
use serde::Deserialize;
use serde::Serialize;
use serfig::collectors::from_env;
use serfig::collectors::from_file;
use serfig::collectors::from_self;
use serfig::parsers::Toml;

use crate::inner::CarbonConfig as InnerCarbonConfig;
use crate::inner::CatalogConfig as InnerCatalogConfig;
use crate::inner::InnerConfig;
use crate::inner::StorageConfig as InnerStorageConfig;
use crate::inner::StorageS3Config as InnerStorageS3Config;
use crate::inner::ThriftProtocol;
use crate::mask::mask_string;

/// Config for the carbondata split planner.
///
/// We will use this config to handle
///
/// - Args parse
/// - Env loading
/// - Config files serialize and deserialize
///
/// It's forbidden to do any breaking changes on this struct.
/// Only adding new fields is allowed.
/// This same rules should be applied to all fields of this struct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Parser)]
#[clap(name = "carbonsplit", about, version, author)]
#[serde(default)]
pub struct Config {
    #[clap(long, short = 'c', default_value_t)]
    pub config_file: String,

    // Split planning config.
    #[clap(flatten)]
    pub carbon: CarbonConfig,

    // Hive metastore client config.
    #[clap(flatten)]
    pub catalog: CatalogConfig,

    // Storage credentials handed to the table reader.
    #[clap(flatten)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        InnerConfig::default().into_config()
    }
}

impl Config {
    /// Load will load config from file, env and args.
    ///
    /// - Load from file as default.
    /// - Load from env, will override config from file.
    /// - Load from args as finally override
    ///
    /// # Notes
    ///
    /// with_args is to control whether we need to load from args or not.
    /// We should set this to false during tests because we don't want
    /// our test binary to parse cargo's args.
    pub fn load(with_args: bool) -> Result<Self> {
        let mut arg_conf = Self::default();

        if with_args {
            arg_conf = Self::parse();
        }

        let mut builder: serfig::Builder<Self> = serfig::Builder::default();

        // Load from config file first.
        {
            let config_file = if !arg_conf.config_file.is_empty() {
                arg_conf.config_file.clone()
            } else if let Ok(path) = env::var("CONFIG_FILE") {
                path
            } else {
                "".to_string()
            };

            if !config_file.is_empty() {
                builder = builder.collect(from_file(Toml, &config_file));
            }
        }

        // Then, load from env.
        builder = builder.collect(from_env());

        // Finally, load from args.
        if with_args {
            builder = builder.collect(from_self(arg_conf));
        }

        Ok(builder.build()?)
    }
}

impl From<InnerConfig> for Config {
    fn from(inner: InnerConfig) -> Self {
        Self {
            config_file: inner.config_file,
            carbon: inner.carbon.into(),
            catalog: inner.catalog.into(),
            storage: inner.storage.into(),
        }
    }
}

impl TryInto<InnerConfig> for Config {
    type Error = ErrorCode;

    fn try_into(self) -> Result<InnerConfig> {
        Ok(InnerConfig {
            config_file: self.config_file,
            carbon: self.carbon.try_into()?,
            catalog: self.catalog.try_into()?,
            storage: self.storage.try_into()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct CarbonConfig {
    /// Tables whose input format contains this tag are planned by the carbon split manager.
    #[clap(long = "carbon-format-tag", value_name = "VALUE", default_value = "carbon")]
    pub format_tag: String,

    /// Upper bound of blocks grouped into one split, 0 means unbounded.
    #[clap(
        long = "carbon-max-blocks-per-split",
        value_name = "VALUE",
        default_value = "32"
    )]
    pub max_blocks_per_split: u64,

    /// Upper bound of bytes grouped into one split, 0 means unbounded.
    #[clap(
        long = "carbon-max-split-size",
        value_name = "VALUE",
        default_value = "268435456"
    )]
    pub max_split_size: u64,

    /// Number of table handles kept in the table cache, 0 means unbounded.
    #[clap(
        long = "carbon-table-cache-capacity",
        value_name = "VALUE",
        default_value = "1024"
    )]
    pub table_cache_capacity: u64,

    /// Manifest path, relative to the table location.
    #[clap(
        long = "carbon-manifest-file",
        value_name = "VALUE",
        default_value = "Metadata/manifest.json"
    )]
    pub manifest_file: String,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        InnerCarbonConfig::default().into()
    }
}

impl From<InnerCarbonConfig> for CarbonConfig {
    fn from(inner: InnerCarbonConfig) -> Self {
        Self {
            format_tag: inner.format_tag,
            max_blocks_per_split: inner.max_blocks_per_split as u64,
            max_split_size: inner.max_split_size,
            table_cache_capacity: inner.table_cache_capacity as u64,
            manifest_file: inner.manifest_file,
        }
    }
}

impl TryInto<InnerCarbonConfig> for CarbonConfig {
    type Error = ErrorCode;

    fn try_into(self) -> Result<InnerCarbonConfig> {
        if self.format_tag.trim().is_empty() {
            return Err(ErrorCode::InvalidConfig(
                "carbon.format_tag must not be empty",
            ));
        }

        if self.manifest_file.trim().is_empty() {
            return Err(ErrorCode::InvalidConfig(
                "carbon.manifest_file must not be empty",
            ));
        }

        Ok(InnerCarbonConfig {
            format_tag: self.format_tag.to_lowercase(),
            max_blocks_per_split: self.max_blocks_per_split as usize,
            max_split_size: self.max_split_size,
            table_cache_capacity: self.table_cache_capacity as usize,
            manifest_file: self.manifest_file.trim_start_matches('/').to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct CatalogConfig {
    /// Hive metastore address, in `host:port` form.
    #[clap(long = "catalog-address", value_name = "VALUE", default_value_t)]
    pub address: String,

    #[clap(long = "catalog-protocol", value_name = "VALUE", default_value = "binary")]
    pub protocol: String,

    #[clap(long = "catalog-timeout-ms", value_name = "VALUE", default_value = "10000")]
    pub timeout_ms: u64,

    /// Optional socks proxy, in `host:port` form.
    #[clap(long = "catalog-socks-proxy", value_name = "VALUE", default_value_t)]
    pub socks_proxy: String,

    #[clap(long = "catalog-tls-enabled")]
    pub tls_enabled: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        InnerCatalogConfig::default().into()
    }
}

impl From<InnerCatalogConfig> for CatalogConfig {
    fn from(inner: InnerCatalogConfig) -> Self {
        Self {
            address: inner.address,
            protocol: inner.protocol.to_string(),
            timeout_ms: inner.timeout.as_millis() as u64,
            socks_proxy: inner.socks_proxy.unwrap_or_default(),
            tls_enabled: inner.tls_enabled,
        }
    }
}

impl TryInto<InnerCatalogConfig> for CatalogConfig {
    type Error = ErrorCode;

    fn try_into(self) -> Result<InnerCatalogConfig> {
        if !self.address.is_empty() {
            check_host_port("catalog.address", &self.address)?;
        }

        let socks_proxy = match self.socks_proxy.is_empty() {
            true => None,
            false => {
                check_host_port("catalog.socks_proxy", &self.socks_proxy)?;
                Some(self.socks_proxy)
            }
        };

        if self.timeout_ms == 0 {
            return Err(ErrorCode::InvalidConfig(
                "catalog.timeout_ms must be greater than 0",
            ));
        }

        Ok(InnerCatalogConfig {
            address: self.address,
            protocol: self.protocol.parse()?,
            timeout: Duration::from_millis(self.timeout_ms),
            socks_proxy,
            tls_enabled: self.tls_enabled,
        })
    }
}

fn check_host_port(field: &str, value: &str) -> Result<()> {
    let valid = match value.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    };

    match valid {
        true => Ok(()),
        false => Err(ErrorCode::InvalidConfig(format!(
            "{} expects `host:port`, got {:?}",
            field, value
        ))),
    }
}

/// Storage config group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct StorageConfig {
    // S3 storage backend config.
    #[clap(flatten)]
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        InnerStorageConfig::default().into()
    }
}

impl From<InnerStorageConfig> for StorageConfig {
    fn from(inner: InnerStorageConfig) -> Self {
        Self {
            s3: inner.s3.unwrap_or_default().into(),
        }
    }
}

impl TryInto<InnerStorageConfig> for StorageConfig {
    type Error = ErrorCode;

    fn try_into(self) -> Result<InnerStorageConfig> {
        let s3 = match self.s3.is_empty() {
            true => None,
            false => Some(self.s3.try_into()?),
        };
        Ok(InnerStorageConfig { s3 })
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Eq, Args)]
#[serde(default)]
pub struct S3StorageConfig {
    /// Region for S3 storage
    #[clap(long = "storage-s3-region", value_name = "VALUE", default_value_t)]
    pub region: String,

    /// Endpoint URL for S3 storage
    #[clap(long = "storage-s3-endpoint-url", value_name = "VALUE", default_value_t)]
    pub endpoint_url: String,

    /// Access key for S3 storage
    #[clap(long = "storage-s3-access-key-id", value_name = "VALUE", default_value_t)]
    pub access_key_id: String,

    /// Secret key for S3 storage
    #[clap(
        long = "storage-s3-secret-access-key",
        value_name = "VALUE",
        default_value_t
    )]
    pub secret_access_key: String,
}

impl S3StorageConfig {
    fn is_empty(&self) -> bool {
        self.region.is_empty()
            && self.endpoint_url.is_empty()
            && self.access_key_id.is_empty()
            && self.secret_access_key.is_empty()
    }
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        InnerStorageS3Config::default().into()
    }
}

impl Debug for S3StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("S3StorageConfig")
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

impl From<InnerStorageS3Config> for S3StorageConfig {
    fn from(inner: InnerStorageS3Config) -> Self {
        Self {
            region: inner.region,
            endpoint_url: inner.endpoint_url,
            access_key_id: inner.access_key_id,
            secret_access_key: inner.secret_access_key,
        }
    }
}

impl TryInto<InnerStorageS3Config> for S3StorageConfig {
    type Error = ErrorCode;

    fn try_into(self) -> Result<InnerStorageS3Config> {
        if self.access_key_id.is_empty() != self.secret_access_key.is_empty() {
            return Err(ErrorCode::InvalidConfig(
                "storage.s3 access_key_id and secret_access_key must be set together",
            ));
        }

        Ok(InnerStorageS3Config {
            endpoint_url: self.endpoint_url,
            region: self.region,
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
        })
    }
}

impl ThriftProtocol {
    fn as_str(&self) -> &'static str {
        match self {
            ThriftProtocol::Binary => "binary",
            ThriftProtocol::Compact => "compact",
        }
    }
}

impl fmt::Display for ThriftProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThriftProtocol {
    type Err = ErrorCode;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "binary" => Ok(ThriftProtocol::Binary),
            "compact" => Ok(ThriftProtocol::Compact),
            other => Err(ErrorCode::InvalidConfig(format!(
                "catalog.protocol expects `binary` or `compact`, got {:?}",
                other
            ))),
        }
    }
}
