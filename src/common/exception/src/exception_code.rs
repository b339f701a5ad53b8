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

#![allow(non_snake_case)]

use crate::exception::ErrorCode;

macro_rules! build_exceptions {
    ($($(#[$meta:meta])* $body:ident($code:expr)),*$(,)*) => {
        impl ErrorCode {
            $(
                paste::item! {
                    $(
                        #[$meta]
                    )*
                    pub const [< $body:snake:upper >]: u16 = $code;
                }
                $(
                    #[$meta]
                )*
                pub fn $body(display_text: impl Into<String>) -> ErrorCode {
                    ErrorCode::create(
                        $code,
                        stringify!($body),
                        display_text.into(),
                        None,
                        ErrorCode::capture(),
                    )
                }
            )*
        }
    }
}

// Internal errors [0, 2000].
build_exceptions! {
    Ok(0),
    Internal(1001),
    Unimplemented(1002),
    BadArguments(1006),
    BadBytes(1046),
    InvalidConfig(1047),
    /// A planning call failed; the originating error is attached as cause.
    GenericInternalError(1048),
}

// Catalog and metastore errors [2000, 3000].
build_exceptions! {
    UnknownDatabase(2001),
    UnknownTable(2002),
    /// The metastore could not be reached, or answered with a transport error.
    MetastoreUnavailable(2003),
    TableInfoError(2004),
}

// Storage errors [3000, 4000].
build_exceptions! {
    StorageNotFound(3001),
    StoragePermissionDenied(3002),
    StorageOther(3003),
    /// The table manifest could not be read or decoded.
    BlockDiscoveryError(3004),
}
