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

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_query_config::mask_string;
use carbonsplit_query_config::InnerStorageConfig;

use crate::ConnectorSession;
use crate::SchemaTableName;

/// Session property prefix forwarded into the scan environment.
pub const STORAGE_PROPERTY_PREFIX: &str = "fs.";

/// Everything a storage reader needs to reach the files of one table during
/// one planning call. It is built before any I/O and dropped with the call.
#[derive(Clone, PartialEq, Eq)]
pub struct ScanEnvironment {
    user: String,
    schema_table: SchemaTableName,
    location: String,
    properties: BTreeMap<String, String>,
}

impl ScanEnvironment {
    pub fn new(
        user: impl Into<String>,
        schema_table: SchemaTableName,
        location: impl Into<String>,
        properties: BTreeMap<String, String>,
    ) -> Self {
        ScanEnvironment {
            user: user.into(),
            schema_table,
            location: location.into(),
            properties,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn schema_table(&self) -> &SchemaTableName {
        &self.schema_table
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

impl Debug for ScanEnvironment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let properties: BTreeMap<&str, String> = self
            .properties
            .iter()
            .map(|(k, v)| {
                let v = if is_secret(k) {
                    mask_string(v, 3)
                } else {
                    v.clone()
                };
                (k.as_str(), v)
            })
            .collect();
        f.debug_struct("ScanEnvironment")
            .field("user", &self.user)
            .field("schema_table", &self.schema_table)
            .field("location", &self.location)
            .field("properties", &properties)
            .finish()
    }
}

fn is_secret(key: &str) -> bool {
    key.ends_with(".key") || key.contains("secret") || key.contains("password")
}

pub trait HdfsEnvironment: Send + Sync {
    fn context(
        &self,
        session: &ConnectorSession,
        schema_table: &SchemaTableName,
        location: &str,
    ) -> Result<ScanEnvironment>;
}

/// Builds scan environments from the configured storage settings.
///
/// Session properties under `fs.` override the configured values.
pub struct DefaultHdfsEnvironment {
    storage_properties: BTreeMap<String, String>,
}

impl DefaultHdfsEnvironment {
    pub fn create(storage: &InnerStorageConfig) -> Self {
        DefaultHdfsEnvironment {
            storage_properties: storage.properties(),
        }
    }
}

impl HdfsEnvironment for DefaultHdfsEnvironment {
    fn context(
        &self,
        session: &ConnectorSession,
        schema_table: &SchemaTableName,
        location: &str,
    ) -> Result<ScanEnvironment> {
        if location.is_empty() {
            return Err(ErrorCode::BadArguments(format!(
                "table {} has no storage location",
                schema_table
            )));
        }

        let mut properties = self.storage_properties.clone();
        for (key, value) in &session.properties {
            if key.starts_with(STORAGE_PROPERTY_PREFIX) {
                properties.insert(key.clone(), value.clone());
            }
        }

        Ok(ScanEnvironment::new(
            session.user.clone(),
            schema_table.clone(),
            location,
            properties,
        ))
    }
}
