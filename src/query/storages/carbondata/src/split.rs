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
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use carbonsplit_common_exception::ErrorCode;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostAddress {
    pub host: String,
    pub port: Option<u16>,
}

impl HostAddress {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        HostAddress {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for HostAddress {
    type Err = ErrorCode;

    /// Accepts `host`, `host:port`, `[v6]`, `[v6]:port` and bare IPv6 literals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ErrorCode::BadArguments(format!("invalid host address '{}'", s));

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            match tail {
                "" => (host, None),
                _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else if s.matches(':').count() == 1 {
            let (host, port) = s.split_once(':').ok_or_else(invalid)?;
            (host, Some(port))
        } else {
            (s, None)
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            None => None,
            Some(port) => Some(port.parse::<u16>().map_err(|_| invalid())?),
        };
        Ok(HostAddress::new(host, port))
    }
}

impl Display for HostAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let bracketed = self.host.contains(':');
        match (bracketed, self.port) {
            (true, Some(port)) => write!(f, "[{}]:{}", self.host, port),
            (true, None) => write!(f, "[{}]", self.host),
            (false, Some(port)) => write!(f, "{}:{}", self.host, port),
            (false, None) => write!(f, "{}", self.host),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HivePartitionKey {
    pub name: String,
    pub value: Option<String>,
}

/// Unit of work handed to the scheduler.
///
/// Carbon splits leave the byte range fields at zero, the blocks to scan
/// travel in the `carbonSplit` schema property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiveSplit {
    pub database: String,
    pub table: String,
    pub partition_name: String,
    pub path: String,
    pub start: u64,
    pub length: u64,
    pub file_size: u64,
    pub file_modified_time: i64,
    pub schema: BTreeMap<String, String>,
    pub partition_keys: Vec<HivePartitionKey>,
    pub addresses: Vec<HostAddress>,
    pub bucket_number: Option<u32>,
    pub force_local_scheduling: bool,
    pub s3_select_pushdown_enabled: bool,
}

impl HiveSplit {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.schema.get(key).map(String::as_str)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitSchedulingStrategy {
    #[default]
    Ungrouped,
    Grouped,
}

/// A finite, already materialized sequence of splits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedSplitSource {
    splits: Vec<HiveSplit>,
}

impl FixedSplitSource {
    pub fn new(splits: Vec<HiveSplit>) -> Self {
        FixedSplitSource { splits }
    }

    pub fn splits(&self) -> &[HiveSplit] {
        &self.splits
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn into_splits(self) -> Vec<HiveSplit> {
        self.splits
    }
}
