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

use std::fmt::Display;

use crate::ErrorCode;
use crate::Result;

pub trait ResultExt<T> {
    /// Prepend a lazily built context line to the message of the error.
    fn with_context<D, F>(self, context_fn: F) -> Result<T>
    where
        D: Display,
        F: FnOnce() -> D;

    /// Replace the error by `wrap_fn(message)` keeping the original as cause.
    fn wrap_err<F>(self, wrap_fn: F, message: impl Into<String>) -> Result<T>
    where F: FnOnce(String) -> ErrorCode;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<D, F>(self, context_fn: F) -> Result<T>
    where
        D: Display,
        F: FnOnce() -> D,
    {
        self.map_err(|e| e.add_message(context_fn().to_string()))
    }

    fn wrap_err<F>(self, wrap_fn: F, message: impl Into<String>) -> Result<T>
    where F: FnOnce(String) -> ErrorCode {
        self.map_err(|e| wrap_fn(message.into()).set_cause(e))
    }
}
