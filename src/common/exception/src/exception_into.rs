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

use std::sync::Arc;

use crate::exception::ErrorCode;

impl From<std::io::Error> for ErrorCode {
    fn from(error: std::io::Error) -> Self {
        ErrorCode::StorageOther(format!("io error: {}", error)).set_cause(error)
    }
}

impl From<serde_json::Error> for ErrorCode {
    fn from(error: serde_json::Error) -> Self {
        ErrorCode::BadBytes(format!("json error: {}", error)).set_cause(error)
    }
}

impl From<anyhow::Error> for ErrorCode {
    fn from(error: anyhow::Error) -> Self {
        ErrorCode::create(
            ErrorCode::INTERNAL,
            "Internal",
            format!("{:?}", error),
            None,
            None,
        )
    }
}

impl From<opendal::Error> for ErrorCode {
    fn from(error: opendal::Error) -> Self {
        match error.kind() {
            opendal::ErrorKind::NotFound => {
                ErrorCode::StorageNotFound(error.to_string()).set_cause(error)
            }
            opendal::ErrorKind::PermissionDenied => {
                ErrorCode::StoragePermissionDenied(error.to_string()).set_cause(error)
            }
            _ => ErrorCode::StorageOther(format!("{:?}", error)).set_cause(error),
        }
    }
}

/// A wire-friendly rendition of an [`ErrorCode`]. The cause chain is flattened
/// into the message.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SerializedError {
    pub code: u16,
    pub name: String,
    pub message: String,
}

impl From<&ErrorCode> for SerializedError {
    fn from(e: &ErrorCode) -> Self {
        SerializedError {
            code: e.code(),
            name: e.name(),
            message: e.message(),
        }
    }
}

impl From<&SerializedError> for ErrorCode {
    fn from(se: &SerializedError) -> Self {
        ErrorCode::create(se.code, se.name.clone(), se.message.clone(), None, None)
    }
}

impl From<Arc<ErrorCode>> for ErrorCode {
    fn from(error: Arc<ErrorCode>) -> Self {
        error.as_ref().clone()
    }
}
