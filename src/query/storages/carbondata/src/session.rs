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

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub id: Uuid,
}

impl TransactionHandle {
    pub fn create() -> Self {
        TransactionHandle { id: Uuid::new_v4() }
    }
}

/// The engine session a planning call runs in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSession {
    /// Engine side query id, unrelated to the planner's [`crate::QueryId`].
    pub query_id: String,
    pub user: String,
    pub properties: BTreeMap<String, String>,
}

impl ConnectorSession {
    pub fn create(query_id: impl Into<String>, user: impl Into<String>) -> Self {
        ConnectorSession {
            query_id: query_id.into(),
            user: user.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
