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

use std::io::Write;
use std::time::Duration;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_query_config::mask_string;
use carbonsplit_query_config::Config;
use carbonsplit_query_config::InnerConfig;
use carbonsplit_query_config::ThriftProtocol;
use pretty_assertions::assert_eq;

#[test]
fn test_default_config_round_trip() -> Result<()> {
    let inner: InnerConfig = Config::default().try_into()?;
    assert_eq!(inner, InnerConfig::default());

    assert_eq!(inner.carbon.format_tag, "carbon");
    assert_eq!(inner.carbon.max_blocks_per_split, 32);
    assert_eq!(inner.carbon.max_split_size, 256 * 1024 * 1024);
    assert_eq!(inner.carbon.table_cache_capacity, 1024);
    assert_eq!(inner.carbon.manifest_file, "Metadata/manifest.json");
    assert_eq!(inner.catalog.timeout, Duration::from_secs(10));
    assert_eq!(inner.catalog.protocol, ThriftProtocol::Binary);
    assert!(inner.storage.s3.is_none());
    assert!(inner.storage.properties().is_empty());

    Ok(())
}

#[test]
fn test_invalid_config() {
    let mut conf = Config::default();
    conf.catalog.address = "no-port".to_string();
    let r: Result<InnerConfig> = conf.try_into();
    assert_eq!(r.unwrap_err().code(), ErrorCode::INVALID_CONFIG);

    let mut conf = Config::default();
    conf.catalog.protocol = "json".to_string();
    let r: Result<InnerConfig> = conf.try_into();
    assert_eq!(r.unwrap_err().code(), ErrorCode::INVALID_CONFIG);

    let mut conf = Config::default();
    conf.carbon.format_tag = " ".to_string();
    let r: Result<InnerConfig> = conf.try_into();
    assert_eq!(r.unwrap_err().code(), ErrorCode::INVALID_CONFIG);

    let mut conf = Config::default();
    conf.storage.s3.access_key_id = "AKIA".to_string();
    let r: Result<InnerConfig> = conf.try_into();
    assert_eq!(r.unwrap_err().code(), ErrorCode::INVALID_CONFIG);
}

#[test]
fn test_storage_properties_and_masking() -> Result<()> {
    let mut conf = Config::default();
    conf.storage.s3.endpoint_url = "http://127.0.0.1:9900".to_string();
    conf.storage.s3.access_key_id = "minioadmin".to_string();
    conf.storage.s3.secret_access_key = "secret-key".to_string();

    let debug = format!("{:?}", conf.storage.s3);
    assert!(!debug.contains("secret-key"));
    assert!(debug.contains("*******key"));

    let inner: InnerConfig = conf.try_into()?;
    let properties = inner.storage.properties();
    assert_eq!(
        properties.get("fs.s3a.endpoint").map(String::as_str),
        Some("http://127.0.0.1:9900")
    );
    assert_eq!(
        properties.get("fs.s3a.access.key").map(String::as_str),
        Some("minioadmin")
    );
    assert_eq!(
        properties.get("fs.s3a.secret.key").map(String::as_str),
        Some("secret-key")
    );
    assert!(!properties.contains_key("fs.s3a.endpoint.region"));

    Ok(())
}

#[test]
fn test_mask_string() {
    assert_eq!(mask_string("", 3), "");
    assert_eq!(mask_string("abc", 3), "abc");
    assert_eq!(mask_string("abcdef", 3), "***def");
}

#[test]
fn test_load_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(
        br#"
[carbon]
format_tag = "CarbonData"
max_blocks_per_split = 8
manifest_file = "/_manifest.json"

[catalog]
address = "127.0.0.1:9083"
protocol = "compact"
timeout_ms = 3000
socks_proxy = "10.0.0.1:1080"
"#,
    )?;

    let mut arg_conf = Config::default();
    arg_conf.config_file = file.path().to_string_lossy().to_string();

    let conf: Config = serfig_load(arg_conf)?;
    let inner: InnerConfig = conf.try_into()?;

    assert_eq!(inner.carbon.format_tag, "carbondata");
    assert_eq!(inner.carbon.max_blocks_per_split, 8);
    assert_eq!(inner.carbon.max_split_size, 256 * 1024 * 1024);
    assert_eq!(inner.carbon.manifest_file, "_manifest.json");
    assert_eq!(inner.catalog.address, "127.0.0.1:9083");
    assert_eq!(inner.catalog.protocol, ThriftProtocol::Compact);
    assert_eq!(inner.catalog.timeout, Duration::from_millis(3000));
    assert_eq!(inner.catalog.socks_proxy.as_deref(), Some("10.0.0.1:1080"));
    Ok(())
}

// Mirrors `Config::load` without touching process wide env vars.
fn serfig_load(arg_conf: Config) -> Result<Config> {
    let builder: serfig::Builder<Config> = serfig::Builder::default().collect(
        serfig::collectors::from_file(serfig::parsers::Toml, &arg_conf.config_file),
    );
    Ok(builder.build()?)
}
