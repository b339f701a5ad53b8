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

#![allow(clippy::uninlined_format_args)]

/// Config mods provide config support.
///
/// We are providing two config types:
///
/// - [`config::Config`] represents the options from command line , configuration files or environment vars.
/// - [`inner::InnerConfig`] "internal representation" of application settings, built from Config.
///
/// It's safe to refactor [`inner::InnerConfig`] in anyway, as long as it satisfied the following traits
///
/// - `TryInto<inner::InnerConfig> for config::Config`
/// - `From<inner::InnerConfig> for config::Config`
mod config;
mod inner;
mod mask;

pub use config::CarbonConfig;
pub use config::CatalogConfig;
pub use config::Config;
pub use config::S3StorageConfig;
pub use config::StorageConfig;
pub use inner::CarbonConfig as InnerCarbonConfig;
pub use inner::CatalogConfig as InnerCatalogConfig;
pub use inner::InnerConfig;
pub use inner::StorageConfig as InnerStorageConfig;
pub use inner::StorageS3Config as InnerStorageS3Config;
pub use inner::ThriftProtocol;
pub use mask::mask_string;
